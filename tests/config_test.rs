use claude_limitline::config::{
    BarStyle, PROJECT_CONFIG_FILE, Settings, ViewMode, candidate_paths, load_file, load_settings,
};
use std::fs;
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_project_file_is_first_candidate() {
    let dir = TempDir::new().unwrap();
    let paths = candidate_paths(None, Some(dir.path()));
    assert_eq!(paths[0], dir.path().join(PROJECT_CONFIG_FILE));
    assert!(paths.len() <= 2);
}

#[test]
fn test_load_merges_over_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        PROJECT_CONFIG_FILE,
        r#"{
            "theme": "nord",
            "weekly": { "viewMode": "smart", "displayStyle": "bar" },
            "budget": { "warningThreshold": 70 },
            "segmentOrder": ["model", "weekly"]
        }"#,
    );
    let settings = load_settings(&[path]);
    assert_eq!(settings.theme, "nord");
    assert_eq!(settings.weekly.view_mode, ViewMode::Smart);
    assert_eq!(settings.weekly.display_style, BarStyle::Bar);
    assert_eq!(settings.weekly.bar_width, 10);
    assert_eq!(settings.budget.warning_threshold, 70.0);
    assert_eq!(settings.budget.poll_interval, 15);
    assert_eq!(settings.segment_order, vec!["model", "weekly"]);
    assert!(settings.show_trend);
}

#[test]
fn test_malformed_file_falls_through_to_next_candidate() {
    let dir = TempDir::new().unwrap();
    let broken = write(&dir, "broken.json", "{ not json");
    let good = write(&dir, "good.json", r#"{ "showTrend": false }"#);
    assert!(load_file(&broken).is_err());

    let settings = load_settings(&[broken, good]);
    assert!(!settings.show_trend);
}

#[test]
fn test_no_config_means_defaults() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.json");
    let broken = write(&dir, "broken.json", "[1, 2");
    assert_eq!(load_settings(&[missing, broken]), Settings::default());
}
