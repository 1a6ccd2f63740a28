//! # Window Module
//!
//! Turns cached usage snapshots into display-ready metrics for the five-hour
//! block and the seven-day week, with a schedule-based estimate for the week
//! when no realtime data is available.

use chrono::{DateTime, Datelike, Local, NaiveDateTime, TimeDelta, Timelike, Utc};
use tracing::debug;

use crate::cache::UsageCache;
use crate::models::{BlockDisplayInfo, UsageSnapshot, WeeklyDisplayInfo};

pub const WEEK_DAYS: i64 = 7;
const WEEK_HOURS: f64 = (WEEK_DAYS * 24) as f64;

/// Reset schedule used when the weekly window is not reported: Monday 00:00.
pub const DEFAULT_RESET_DAY: u8 = 1;
pub const DEFAULT_RESET_HOUR: u8 = 0;
pub const DEFAULT_RESET_MINUTE: u8 = 0;

#[derive(Debug, Clone, Copy, Default)]
pub struct BlockMetricProvider;

impl BlockMetricProvider {
    /// Five-hour window metrics. Without realtime data every field is empty: the
    /// block's reset cadence is not calendar aligned, so nothing is estimated.
    pub fn info(&self, cache: &mut UsageCache, poll_interval_minutes: u32) -> BlockDisplayInfo {
        let snapshot = cache.get_usage(poll_interval_minutes);
        let info = block_info(snapshot.as_ref(), cache.now());
        if !info.is_realtime {
            debug!("no realtime block usage data available");
        }
        info
    }
}

pub fn block_info(snapshot: Option<&UsageSnapshot>, now: DateTime<Utc>) -> BlockDisplayInfo {
    let Some(five_hour) = snapshot.and_then(|s| s.five_hour.as_ref()) else {
        return BlockDisplayInfo::default();
    };
    let time_remaining = minutes_until(five_hour.reset_at, now);
    debug!(
        percent = five_hour.percent_used,
        reset_at = %five_hour.reset_at,
        remaining_min = time_remaining,
        "block segment (realtime)"
    );
    BlockDisplayInfo {
        percent_used: Some(five_hour.percent_used),
        reset_at: Some(five_hour.reset_at),
        time_remaining_minutes: Some(time_remaining),
        is_realtime: true,
    }
}

/// Whole minutes until `reset_at`, never negative.
pub fn minutes_until(reset_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (reset_at - now).num_milliseconds() as f64;
    ((millis / 60_000.0).round() as i64).max(0)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WeeklyMetricProvider;

impl WeeklyMetricProvider {
    /// Seven-day window metrics, or a schedule-based week progress estimate when
    /// the snapshot has no `seven_day` window. Missing schedule parts default to
    /// Monday 00:00 local time.
    pub fn info(
        &self,
        cache: &mut UsageCache,
        reset_day: Option<u8>,
        reset_hour: Option<u8>,
        reset_minute: Option<u8>,
        poll_interval_minutes: u32,
    ) -> WeeklyDisplayInfo {
        let snapshot = cache.get_usage(poll_interval_minutes);
        let now = cache.now();
        if let Some(info) = realtime_weekly_info(snapshot.as_ref(), now) {
            return info;
        }
        debug!("realtime weekly data unavailable, estimating from reset schedule");
        let local = now.with_timezone(&Local).naive_local();
        WeeklyDisplayInfo {
            week_progress_percent: week_progress_from_schedule(
                local,
                reset_day.unwrap_or(DEFAULT_RESET_DAY),
                reset_hour.unwrap_or(DEFAULT_RESET_HOUR),
                reset_minute.unwrap_or(DEFAULT_RESET_MINUTE),
            ),
            ..WeeklyDisplayInfo::default()
        }
    }
}

pub fn realtime_weekly_info(
    snapshot: Option<&UsageSnapshot>,
    now: DateTime<Utc>,
) -> Option<WeeklyDisplayInfo> {
    let snapshot = snapshot?;
    let seven_day = snapshot.seven_day.as_ref()?;
    let opus = snapshot.seven_day_opus.as_ref();
    let sonnet = snapshot.seven_day_sonnet.as_ref();
    debug!(
        percent = seven_day.percent_used,
        reset_at = %seven_day.reset_at,
        opus = ?opus.map(|w| w.percent_used),
        sonnet = ?sonnet.map(|w| w.percent_used),
        "weekly segment (realtime)"
    );
    Some(WeeklyDisplayInfo {
        percent_used: Some(seven_day.percent_used),
        reset_at: Some(seven_day.reset_at),
        is_realtime: true,
        week_progress_percent: week_progress_from_reset(seven_day.reset_at, now),
        opus_percent_used: opus.map(|w| w.percent_used),
        sonnet_percent_used: sonnet.map(|w| w.percent_used),
        opus_reset_at: opus.map(|w| w.reset_at),
        sonnet_reset_at: sonnet.map(|w| w.reset_at),
    })
}

/// Position within the rolling week that ends at `reset_at`. A reset time that
/// already passed anchors the next week at it.
pub fn week_progress_from_reset(reset_at: DateTime<Utc>, now: DateTime<Utc>) -> u8 {
    let period = TimeDelta::days(WEEK_DAYS);
    let period_start = if now > reset_at {
        reset_at
    } else {
        reset_at - period
    };
    let elapsed = (now - period_start).num_milliseconds() as f64;
    let fraction = (elapsed / period.num_milliseconds() as f64).clamp(0.0, 1.0);
    (fraction * 100.0).round() as u8
}

/// Position within the week since the latest local `reset_day` (0 = Sunday)
/// at `reset_hour:reset_minute`. Before the reset time on the reset day itself,
/// the previous reset was a full week ago.
pub fn week_progress_from_schedule(
    now: NaiveDateTime,
    reset_day: u8,
    reset_hour: u8,
    reset_minute: u8,
) -> u8 {
    let weekday = i64::from(now.weekday().num_days_from_sunday());
    let hour = i64::from(now.hour());
    let minute = i64::from(now.minute());
    let target_hour = i64::from(reset_hour);
    let target_minute = i64::from(reset_minute);

    let mut days_since_reset = (weekday - i64::from(reset_day) + WEEK_DAYS).rem_euclid(WEEK_DAYS);
    if days_since_reset == 0 && hour * 60 + minute < target_hour * 60 + target_minute {
        days_since_reset = WEEK_DAYS;
    }

    let hours_into_week = (days_since_reset * 24 + hour - target_hour) as f64
        + (minute - target_minute) as f64 / 60.0;
    (hours_into_week / WEEK_HOURS * 100.0).clamp(0.0, 100.0).round() as u8
}
