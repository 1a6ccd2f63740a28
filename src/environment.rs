//! Gathers the local facts a status line shows next to the usage metrics:
//! directory, git state, model name and context window fill.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::debug;

use crate::models::{EnvironmentInfo, GitInfo, HookJson};

/// Env vars consulted for the model when the hook payload names none.
pub const MODEL_ENV_VARS: [&str; 3] = ["CLAUDE_MODEL", "CLAUDE_CODE_MODEL", "ANTHROPIC_MODEL"];

/// Display names longer than this are replaced by a name derived from the id.
const MAX_DISPLAY_NAME_LEN: usize = 20;
const MAX_RAW_ID_LEN: usize = 15;

static CLAUDE_PREFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^claude\s*").unwrap());

const KNOWN_MODELS: &[(&str, &str)] = &[
    ("claude-opus-4-5-20251101", "Opus 4.5"),
    ("claude-opus-4-20250514", "Opus 4"),
    ("claude-sonnet-4-20250514", "Sonnet 4"),
    ("claude-3-5-sonnet-20241022", "Sonnet 3.5"),
    ("claude-3-5-sonnet-latest", "Sonnet 3.5"),
    ("claude-3-5-sonnet", "Sonnet 3.5"),
    ("claude-3-opus-20240229", "Opus 3"),
    ("claude-3-opus", "Opus 3"),
    ("claude-3-sonnet-20240229", "Sonnet 3"),
    ("claude-3-haiku-20240307", "Haiku 3"),
    ("claude-3-haiku", "Haiku 3"),
];

/// Short model name such as "Sonnet 4".
///
/// A short display name wins once its "Claude" prefix is removed. Otherwise
/// known ids map to fixed names, then the family and version are guessed from
/// the id, and unknown ids are cut to 15 characters.
pub fn format_model_name(model_id: &str, display_name: Option<&str>) -> String {
    if let Some(display) = display_name.filter(|d| d.chars().count() <= MAX_DISPLAY_NAME_LEN) {
        let clean = CLAUDE_PREFIX_RE.replace(display, "");
        let clean = clean.trim();
        if !clean.is_empty() {
            return clean.to_string();
        }
    }
    if let Some((_, name)) = KNOWN_MODELS.iter().find(|(id, _)| *id == model_id) {
        return (*name).to_string();
    }

    let lower = model_id.to_lowercase();
    let has = |s: &str| lower.contains(s);
    let guessed = if has("opus") {
        Some(if has("4-5") || has("4.5") {
            "Opus 4.5"
        } else if has("4") {
            "Opus 4"
        } else if has("3") {
            "Opus 3"
        } else {
            "Opus"
        })
    } else if has("sonnet") {
        Some(if has("4") {
            "Sonnet 4"
        } else if has("3-5") || has("3.5") {
            "Sonnet 3.5"
        } else if has("3") {
            "Sonnet 3"
        } else {
            "Sonnet"
        })
    } else if has("haiku") {
        Some(if has("3") { "Haiku 3" } else { "Haiku" })
    } else {
        None
    };
    match guessed {
        Some(name) => name.to_string(),
        None => model_id.chars().take(MAX_RAW_ID_LEN).collect(),
    }
}

/// Model from the hook payload, else from the first model env var set.
pub fn model_name(hook: &HookJson, env_lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    if let Some(model) = hook.model.as_ref() {
        if let Some(id) = model.id.as_deref().filter(|id| !id.is_empty()) {
            return Some(format_model_name(id, model.display_name.as_deref()));
        }
    }
    MODEL_ENV_VARS
        .iter()
        .filter_map(|var| env_lookup(var))
        .find(|v| !v.is_empty())
        .map(|id| format_model_name(&id, None))
}

/// Context window fill in percent, 0 when the payload lacks size or usage.
pub fn context_percent(hook: &HookJson) -> u32 {
    let Some(ctx) = hook.context_window.as_ref() else {
        return 0;
    };
    let (Some(size), Some(usage)) = (ctx.context_window_size, ctx.current_usage.as_ref()) else {
        return 0;
    };
    if size == 0 {
        return 0;
    }
    let tokens = usage.input_tokens.unwrap_or(0)
        + usage.cache_creation_input_tokens.unwrap_or(0)
        + usage.cache_read_input_tokens.unwrap_or(0);
    (tokens as f64 / size as f64 * 100.0).round() as u32
}

/// Project directory, else the hook's working directory, else the process one.
pub fn directory(hook: &HookJson) -> Option<String> {
    let workspace = hook.workspace.as_ref();
    workspace
        .and_then(|w| w.project_dir.clone())
        .or_else(|| hook.cwd.clone())
        .or_else(|| workspace.and_then(|w| w.current_dir.clone()))
        .filter(|d| !d.is_empty())
        .or_else(|| {
            std::env::current_dir()
                .ok()
                .map(|p| p.to_string_lossy().into_owned())
        })
}

/// Combine the hook payload with a git probe of the resolved directory.
pub fn gather(hook: &HookJson, probe_git: impl Fn(&Path) -> Option<GitInfo>) -> EnvironmentInfo {
    let directory = directory(hook);
    let git = directory.as_deref().and_then(|d| probe_git(Path::new(d)));
    let info = EnvironmentInfo {
        git_branch: git.as_ref().and_then(|g| g.branch.clone()),
        git_dirty: git.as_ref().and_then(|g| g.is_clean).is_some_and(|clean| !clean),
        model: model_name(hook, |var| std::env::var(var).ok()),
        context_percent: context_percent(hook),
        directory,
    };
    debug!(?info, "environment");
    info
}

/// [`gather`] with the gix probe when built with git support.
pub fn gather_with_git(hook: &HookJson) -> EnvironmentInfo {
    #[cfg(feature = "git")]
    {
        gather(hook, crate::git::read_git_info)
    }
    #[cfg(not(feature = "git"))]
    {
        gather(hook, |_| None)
    }
}
