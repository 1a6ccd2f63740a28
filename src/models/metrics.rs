use chrono::{DateTime, Utc};
use serde::Serialize;

/// Display-ready view of the five-hour window.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BlockDisplayInfo {
    pub percent_used: Option<f64>,
    pub reset_at: Option<DateTime<Utc>>,
    pub time_remaining_minutes: Option<i64>,
    pub is_realtime: bool,
}

/// Display-ready view of the seven-day window and its per-model sub-limits.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WeeklyDisplayInfo {
    pub percent_used: Option<f64>,
    pub reset_at: Option<DateTime<Utc>>,
    pub is_realtime: bool,
    /// Position within the current weekly cycle, always 0..=100
    pub week_progress_percent: u8,
    pub opus_percent_used: Option<f64>,
    pub sonnet_percent_used: Option<f64>,
    pub opus_reset_at: Option<DateTime<Utc>>,
    pub sonnet_reset_at: Option<DateTime<Utc>>,
}
