use serde::Deserialize;

#[derive(Deserialize, Debug, Default, Clone)]
pub struct HookModel {
    pub id: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct HookWorkspace {
    pub current_dir: Option<String>,
    pub project_dir: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct CurrentUsage {
    pub input_tokens: Option<u64>,
    pub cache_creation_input_tokens: Option<u64>,
    pub cache_read_input_tokens: Option<u64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct ContextWindow {
    pub context_window_size: Option<u64>,
    pub current_usage: Option<CurrentUsage>,
}

/// Status line payload written by Claude Code to stdin. Every field is optional
/// so partial or older payloads still deserialize.
#[derive(Deserialize, Debug, Default, Clone)]
pub struct HookJson {
    pub cwd: Option<String>,
    pub model: Option<HookModel>,
    pub workspace: Option<HookWorkspace>,
    pub context_window: Option<ContextWindow>,
}
