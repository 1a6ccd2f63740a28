use chrono::{DateTime, Utc};

/// One rolling usage budget as reported by the usage API.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageWindow {
    pub reset_at: DateTime<Utc>,
    /// Reported utilization; may exceed 100 when over the limit.
    pub percent_used: f64,
    pub is_over_limit: bool,
}

impl UsageWindow {
    pub fn new(reset_at: DateTime<Utc>, percent_used: f64) -> Self {
        UsageWindow {
            reset_at,
            percent_used,
            is_over_limit: percent_used >= 100.0,
        }
    }
}

/// A single successful usage fetch. Never mutated after construction.
#[derive(Debug, Clone, Default)]
pub struct UsageSnapshot {
    pub five_hour: Option<UsageWindow>,
    pub seven_day: Option<UsageWindow>,
    pub seven_day_opus: Option<UsageWindow>,
    pub seven_day_sonnet: Option<UsageWindow>,
    /// Untouched response body, kept for diagnostics
    pub raw: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Same,
}

/// Direction of change per tracked window between the two latest fetches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrendResult {
    pub five_hour: Option<Trend>,
    pub seven_day: Option<Trend>,
    pub seven_day_opus: Option<Trend>,
    pub seven_day_sonnet: Option<Trend>,
}
