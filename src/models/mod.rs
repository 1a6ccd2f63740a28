pub mod environment;
pub mod git;
pub mod hook;
pub mod metrics;
pub mod usage;

pub use environment::EnvironmentInfo;
pub use git::GitInfo;
pub use hook::HookJson;
pub use metrics::{BlockDisplayInfo, WeeklyDisplayInfo};
pub use usage::{Trend, TrendResult, UsageSnapshot, UsageWindow};
