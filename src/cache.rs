//! # Cache Module
//!
//! Holds the last two usage snapshots for the lifetime of its owner and decides
//! when a network fetch is needed.
//!
//! In the one-shot CLI every process starts with an empty cache, so the poll
//! interval never suppresses a fetch there. A long-lived host that keeps one
//! `UsageCache` around gets the full TTL behavior and should call
//! [`UsageCache::start_cycle`] before each render.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::credentials::TokenProvider;
use crate::models::{Trend, TrendResult, UsageSnapshot, UsageWindow};
use crate::usage_api::UsageClient;

/// Percent-point change below which a window counts as unchanged.
const TREND_DEAD_ZONE: f64 = 0.5;

/// Source of "now" for cache freshness and metric math.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub struct UsageCache {
    tokens: Box<dyn TokenProvider>,
    client: Box<dyn UsageClient>,
    clock: Box<dyn Clock>,
    current: Option<UsageSnapshot>,
    previous: Option<UsageSnapshot>,
    token: Option<String>,
    fetched_at: Option<DateTime<Utc>>,
    // outcome of this render cycle's token lookup and fetch, once attempted
    cycle_result: Option<Option<UsageSnapshot>>,
}

impl UsageCache {
    pub fn new(
        tokens: Box<dyn TokenProvider>,
        client: Box<dyn UsageClient>,
        clock: Box<dyn Clock>,
    ) -> Self {
        UsageCache {
            tokens,
            client,
            clock,
            current: None,
            previous: None,
            token: None,
            fetched_at: None,
            cycle_result: None,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Allow one more token lookup and network attempt. Snapshots and token
    /// are kept.
    pub fn start_cycle(&mut self) {
        self.cycle_result = None;
    }

    pub fn current(&self) -> Option<&UsageSnapshot> {
        self.current.as_ref()
    }

    pub fn previous(&self) -> Option<&UsageSnapshot> {
        self.previous.as_ref()
    }

    /// Latest usage snapshot, fetching at most once per render cycle.
    ///
    /// A cached snapshot younger than `poll_interval_minutes` is returned as is.
    /// Otherwise a token is discovered (if none is cached) and the client is
    /// called once. A failed fetch drops the cached token but keeps both
    /// snapshots, and returns `None`. Later calls in the same cycle get the
    /// outcome of that first attempt, including a failed token lookup.
    pub fn get_usage(&mut self, poll_interval_minutes: u32) -> Option<UsageSnapshot> {
        let now = self.clock.now();
        if let (Some(snapshot), Some(fetched_at)) = (self.current.as_ref(), self.fetched_at) {
            let age = now - fetched_at;
            if age < Duration::minutes(i64::from(poll_interval_minutes)) {
                debug!(age_secs = age.num_seconds(), "using cached usage data");
                return Some(snapshot.clone());
            }
        }

        if let Some(result) = self.cycle_result.as_ref() {
            debug!("usage already requested this cycle, not fetching again");
            return result.clone();
        }

        let result = self.fetch(now);
        self.cycle_result = Some(result.clone());
        result
    }

    fn fetch(&mut self, now: DateTime<Utc>) -> Option<UsageSnapshot> {
        if self.token.is_none() {
            self.token = self.tokens.token();
        }
        let Some(token) = self.token.as_deref() else {
            debug!("could not retrieve OAuth token for realtime usage");
            return None;
        };

        match self.client.fetch(token) {
            Ok(snapshot) => {
                self.previous = self.current.replace(snapshot.clone());
                self.fetched_at = Some(now);
                debug!("refreshed realtime usage cache");
                Some(snapshot)
            }
            Err(err) => {
                debug!(error = %err, "failed to fetch usage");
                self.token = None;
                None
            }
        }
    }

    /// Compare the two most recent snapshots window by window.
    pub fn trend(&self) -> TrendResult {
        let (Some(cur), Some(prev)) = (self.current.as_ref(), self.previous.as_ref()) else {
            return TrendResult::default();
        };
        TrendResult {
            five_hour: compare(cur.five_hour.as_ref(), prev.five_hour.as_ref()),
            seven_day: compare(cur.seven_day.as_ref(), prev.seven_day.as_ref()),
            seven_day_opus: compare(cur.seven_day_opus.as_ref(), prev.seven_day_opus.as_ref()),
            seven_day_sonnet: compare(
                cur.seven_day_sonnet.as_ref(),
                prev.seven_day_sonnet.as_ref(),
            ),
        }
    }
}

fn compare(current: Option<&UsageWindow>, previous: Option<&UsageWindow>) -> Option<Trend> {
    let diff = current?.percent_used - previous?.percent_used;
    Some(if diff > TREND_DEAD_ZONE {
        Trend::Up
    } else if diff < -TREND_DEAD_ZONE {
        Trend::Down
    } else {
        Trend::Same
    })
}
