#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct GitInfo {
    /// Short branch name, or `HEAD` when detached
    pub branch: Option<String>,
    pub is_clean: Option<bool>,
}
