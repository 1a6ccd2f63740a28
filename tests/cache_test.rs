use chrono::{DateTime, Duration, TimeZone, Utc};
use claude_limitline::cache::{Clock, UsageCache};
use claude_limitline::models::{BlockDisplayInfo, Trend, UsageSnapshot, UsageWindow};
use claude_limitline::usage_api::{FetchError, UsageClient};
use claude_limitline::window::{BlockMetricProvider, WeeklyMetricProvider};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

#[derive(Clone)]
struct FakeClock(Rc<Cell<DateTime<Utc>>>);

impl FakeClock {
    fn advance(&self, minutes: i64) {
        self.0.set(self.0.get() + Duration::minutes(minutes));
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        self.0.get()
    }
}

/// Replays queued responses and counts calls.
#[derive(Clone, Default)]
struct FakeClient {
    responses: Rc<RefCell<VecDeque<Result<UsageSnapshot, FetchError>>>>,
    calls: Rc<Cell<usize>>,
    tokens_seen: Rc<RefCell<Vec<String>>>,
}

impl FakeClient {
    fn push(&self, response: Result<UsageSnapshot, FetchError>) {
        self.responses.borrow_mut().push_back(response);
    }
}

impl UsageClient for FakeClient {
    fn fetch(&self, token: &str) -> Result<UsageSnapshot, FetchError> {
        self.calls.set(self.calls.get() + 1);
        self.tokens_seen.borrow_mut().push(token.to_string());
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or(Err(FetchError::Status(500)))
    }
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 4, 10, 0, 0).unwrap()
}

fn snapshot(now: DateTime<Utc>, five_hour: f64, seven_day: f64) -> UsageSnapshot {
    UsageSnapshot {
        five_hour: Some(UsageWindow::new(now + Duration::minutes(42), five_hour)),
        seven_day: Some(UsageWindow::new(now + Duration::days(2), seven_day)),
        ..UsageSnapshot::default()
    }
}

struct Harness {
    clock: FakeClock,
    client: FakeClient,
    token_lookups: Rc<Cell<usize>>,
    cache: UsageCache,
}

fn harness(token: Option<&'static str>) -> Harness {
    let clock = FakeClock(Rc::new(Cell::new(start())));
    let client = FakeClient::default();
    let token_lookups = Rc::new(Cell::new(0));
    let lookups = token_lookups.clone();
    let provider = move || -> Option<String> {
        lookups.set(lookups.get() + 1);
        token.map(String::from)
    };
    let cache = UsageCache::new(
        Box::new(provider),
        Box::new(client.clone()),
        Box::new(clock.clone()),
    );
    Harness {
        clock,
        client,
        token_lookups,
        cache,
    }
}

#[test]
fn test_fresh_snapshot_is_reused_within_poll_interval() {
    let mut h = harness(Some("sk-ant-oat01-test"));
    h.client.push(Ok(snapshot(start(), 20.0, 10.0)));
    h.client.push(Ok(snapshot(start(), 30.0, 11.0)));

    assert!(h.cache.get_usage(15).is_some());
    assert_eq!(h.client.calls.get(), 1);

    h.cache.start_cycle();
    h.clock.advance(14);
    let reused = h.cache.get_usage(15).expect("cached");
    assert_eq!(h.client.calls.get(), 1);
    assert_eq!(reused.five_hour.map(|w| w.percent_used), Some(20.0));

    h.cache.start_cycle();
    h.clock.advance(1);
    let refreshed = h.cache.get_usage(15).expect("refetched");
    assert_eq!(h.client.calls.get(), 2);
    assert_eq!(refreshed.five_hour.map(|w| w.percent_used), Some(30.0));
    let previous = h.cache.previous().and_then(|s| s.five_hour.as_ref());
    assert_eq!(previous.map(|w| w.percent_used), Some(20.0));
}

#[test]
fn test_at_most_one_fetch_per_cycle() {
    let mut h = harness(Some("sk-ant-oat01-test"));
    h.client.push(Ok(snapshot(start(), 20.0, 10.0)));

    // zero interval: nothing is ever fresh
    assert!(h.cache.get_usage(0).is_some());
    assert!(h.cache.get_usage(0).is_some());
    assert_eq!(h.client.calls.get(), 1);

    let mut h = harness(Some("sk-ant-oat01-test"));
    h.client.push(Err(FetchError::Transport("offline".into())));
    assert!(h.cache.get_usage(15).is_none());
    assert!(h.cache.get_usage(15).is_none());
    assert_eq!(h.client.calls.get(), 1);
}

#[test]
fn test_failed_fetch_drops_token_and_keeps_snapshots() {
    let mut h = harness(Some("sk-ant-oat01-test"));
    h.client.push(Ok(snapshot(start(), 20.0, 10.0)));
    h.client.push(Err(FetchError::Status(401)));

    assert!(h.cache.get_usage(0).is_some());
    assert_eq!(h.token_lookups.get(), 1);

    h.cache.start_cycle();
    assert!(h.cache.get_usage(0).is_none());
    assert!(h.cache.current().is_some());
    // the token was still cached for the failing attempt
    assert_eq!(h.token_lookups.get(), 1);

    h.cache.start_cycle();
    h.client.push(Ok(snapshot(start(), 25.0, 10.0)));
    assert!(h.cache.get_usage(0).is_some());
    assert_eq!(h.token_lookups.get(), 2);
    assert_eq!(h.client.tokens_seen.borrow().len(), 3);
}

#[test]
fn test_missing_token_skips_network() {
    let mut h = harness(None);
    assert!(h.cache.get_usage(15).is_none());
    assert_eq!(h.client.calls.get(), 0);
    assert_eq!(h.token_lookups.get(), 1);
}

#[test]
fn test_trend_across_fetches() {
    let mut h = harness(Some("sk-ant-oat01-test"));
    assert_eq!(h.cache.trend().five_hour, None);

    h.client.push(Ok(snapshot(start(), 20.0, 50.0)));
    h.client.push(Ok(snapshot(start(), 21.0, 50.3)));
    h.cache.get_usage(0);
    assert_eq!(h.cache.trend().five_hour, None);

    h.cache.start_cycle();
    h.cache.get_usage(0);
    let trend = h.cache.trend();
    assert_eq!(trend.five_hour, Some(Trend::Up));
    assert_eq!(trend.seven_day, Some(Trend::Same));
    assert_eq!(trend.seven_day_opus, None);
}

#[test]
fn test_block_then_weekly_share_one_fetch() {
    let mut h = harness(Some("sk-ant-oat01-test"));
    h.client.push(Ok(snapshot(start(), 85.0, 60.0)));

    let block = BlockMetricProvider.info(&mut h.cache, 0);
    let weekly = WeeklyMetricProvider.info(&mut h.cache, None, None, None, 0);
    assert_eq!(h.client.calls.get(), 1);

    assert_eq!(block.percent_used, Some(85.0));
    assert_eq!(block.time_remaining_minutes, Some(42));
    assert!(block.is_realtime);
    assert_eq!(weekly.percent_used, Some(60.0));
    assert_eq!(weekly.week_progress_percent, 71);
}

#[test]
fn test_providers_without_data() {
    let mut h = harness(None);
    let block = BlockMetricProvider.info(&mut h.cache, 15);
    assert_eq!(block, BlockDisplayInfo::default());

    let weekly = WeeklyMetricProvider.info(&mut h.cache, Some(1), Some(0), Some(0), 15);
    assert!(!weekly.is_realtime);
    assert_eq!(weekly.percent_used, None);
    assert!(weekly.week_progress_percent <= 100);
}

#[test]
fn test_failed_refresh_hides_stale_snapshot_from_every_segment() {
    let mut h = harness(Some("sk-ant-oat01-test"));
    h.client.push(Ok(snapshot(start(), 20.0, 10.0)));
    assert!(h.cache.get_usage(15).is_some());

    h.cache.start_cycle();
    h.clock.advance(30);
    h.client.push(Err(FetchError::Status(500)));
    let block = BlockMetricProvider.info(&mut h.cache, 15);
    let weekly = WeeklyMetricProvider.info(&mut h.cache, None, None, None, 15);

    assert_eq!(h.client.calls.get(), 2);
    assert_eq!(block.percent_used, None);
    assert!(!block.is_realtime);
    assert_eq!(weekly.percent_used, None);
    assert!(!weekly.is_realtime);
    // the stale snapshot is still kept for trends
    assert!(h.cache.current().is_some());
}

#[test]
fn test_one_token_lookup_per_cycle() {
    let mut h = harness(None);
    BlockMetricProvider.info(&mut h.cache, 15);
    WeeklyMetricProvider.info(&mut h.cache, None, None, None, 15);
    assert_eq!(h.token_lookups.get(), 1);
    assert_eq!(h.client.calls.get(), 0);

    h.cache.start_cycle();
    assert!(h.cache.get_usage(15).is_none());
    assert!(h.cache.get_usage(15).is_none());
    assert_eq!(h.token_lookups.get(), 2);
}
