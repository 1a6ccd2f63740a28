use serde::Serialize;

/// Local session facts gathered once per invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnvironmentInfo {
    pub directory: Option<String>,
    pub git_branch: Option<String>,
    pub git_dirty: bool,
    /// Short display name, e.g. "Sonnet 4"
    pub model: Option<String>,
    pub context_percent: u32,
}
