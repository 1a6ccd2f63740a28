use anyhow::{Context, Result};
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use tracing::debug;

use claude_limitline::cache::{SystemClock, UsageCache};
use claude_limitline::cli::Args;
use claude_limitline::config::{self, SegmentKind, Settings};
use claude_limitline::credentials::platform_provider;
use claude_limitline::display::Compositor;
use claude_limitline::environment;
use claude_limitline::models::{BlockDisplayInfo, HookJson, WeeklyDisplayInfo};
use claude_limitline::usage_api::ApiUsageClient;
use claude_limitline::utils::{STDIN_TIMEOUT, init_logging, read_stdin, terminal_width};
use claude_limitline::window::{BlockMetricProvider, WeeklyMetricProvider};

fn main() {
    let args = Args::parse();
    init_logging(args.debug);
    if !args.debug {
        // the status line must never show a panic message
        panic::set_hook(Box::new(|_| {}));
    }

    let line = match panic::catch_unwind(AssertUnwindSafe(|| run(&args))) {
        Ok(Ok(line)) => line,
        Ok(Err(err)) => {
            debug!(error = ?err, "render failed");
            String::new()
        }
        Err(_) => {
            debug!("render panicked");
            String::new()
        }
    };

    if !line.is_empty() {
        let mut out = std::io::stdout().lock();
        let _ = out.write_all(line.as_bytes());
        let _ = out.flush();
    }
}

fn run(args: &Args) -> Result<String> {
    let cwd = std::env::current_dir().ok();
    let paths = config::candidate_paths(args.config.as_deref(), cwd.as_deref());
    let mut settings = config::load_settings(&paths);
    if let Some(compact) = args.compact {
        settings.display.compact_mode = compact.into();
    }

    let hook = hook_payload(read_stdin(STDIN_TIMEOUT).context("read hook payload"));
    let env = environment::gather_with_git(&hook);

    let mut cache = UsageCache::new(
        platform_provider(),
        Box::new(ApiUsageClient::default()),
        Box::new(SystemClock),
    );
    cache.start_cycle();

    let (block, weekly) = collect_metrics(&settings, &mut cache);
    let trend = cache.trend();
    let compositor = Compositor::new(&settings, terminal_width(), cache.now());
    Ok(compositor.render(&block, &weekly, &env, &trend))
}

/// Hook payload from stdin; a failed read renders as if nothing was piped.
fn hook_payload(stdin: Result<Vec<u8>>) -> HookJson {
    match stdin {
        Ok(bytes) => parse_hook(&bytes),
        Err(err) => {
            debug!(error = ?err, "falling back to an empty hook payload");
            HookJson::default()
        }
    }
}

fn parse_hook(stdin: &[u8]) -> HookJson {
    if stdin.iter().all(u8::is_ascii_whitespace) {
        debug!("no hook data received");
        return HookJson::default();
    }
    match serde_json::from_slice(stdin) {
        Ok(hook) => hook,
        Err(err) => {
            debug!(error = %err, "invalid hook json");
            HookJson::default()
        }
    }
}

/// Block first, then weekly, against one cache. Segments that will not be
/// shown do not touch the network.
fn collect_metrics(
    settings: &Settings,
    cache: &mut UsageCache,
) -> (BlockDisplayInfo, WeeklyDisplayInfo) {
    let segments = settings.segments();
    let budget = &settings.budget;
    let block = if settings.block.enabled && segments.contains(&SegmentKind::Block) {
        BlockMetricProvider.info(cache, budget.poll_interval)
    } else {
        BlockDisplayInfo::default()
    };
    let weekly = if settings.weekly.enabled && segments.contains(&SegmentKind::Weekly) {
        WeeklyMetricProvider.info(
            cache,
            budget.reset_day,
            budget.reset_hour,
            budget.reset_minute,
            budget.poll_interval,
        )
    } else {
        WeeklyDisplayInfo::default()
    };
    (block, weekly)
}
