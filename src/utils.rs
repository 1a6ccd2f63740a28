use std::io::{IsTerminal, Read};
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;
use tracing_subscriber::EnvFilter;

/// How long to wait for Claude Code to hand over the hook payload.
pub const STDIN_TIMEOUT: Duration = Duration::from_millis(100);
/// Upper bound for any credential helper subprocess.
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(5);
/// Width assumed when stdout is not attached to a terminal.
pub const DEFAULT_TERMINAL_WIDTH: u16 = 80;

/// Install a stderr subscriber. Without debug enabled nothing is installed and
/// all `tracing` events are dropped.
pub fn init_logging(debug: bool) {
    if !debug {
        return;
    }
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .try_init();
}

/// Read stdin to the end, giving up after `timeout`. An interactive terminal
/// never carries a hook payload, so it is not read at all.
pub fn read_stdin(timeout: Duration) -> anyhow::Result<Vec<u8>> {
    if std::io::stdin().is_terminal() {
        debug!("stdin is a terminal, no hook data");
        return Ok(Vec::new());
    }
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let result = std::io::stdin().read_to_end(&mut buf).map(|_| buf);
        let _ = tx.send(result);
    });
    match rx.recv_timeout(timeout) {
        Ok(result) => Ok(result?),
        Err(_) => {
            debug!(timeout_ms = timeout.as_millis() as u64, "timed out waiting for stdin");
            Ok(Vec::new())
        }
    }
}

/// Current terminal width, or [`DEFAULT_TERMINAL_WIDTH`] when unknown.
pub fn terminal_width() -> u16 {
    terminal_size::terminal_size()
        .map(|(terminal_size::Width(w), _)| w)
        .filter(|w| *w > 0)
        .unwrap_or(DEFAULT_TERMINAL_WIDTH)
}

/// Abbreviate the home directory prefix as `~`.
pub fn format_path(p: &str) -> String {
    if let Some(b) = directories::BaseDirs::new() {
        let home_s = b.home_dir().to_string_lossy();
        if let Some(rest) = p.strip_prefix(&*home_s) {
            if !home_s.is_empty() && (rest.is_empty() || rest.starts_with(std::path::MAIN_SEPARATOR)) {
                return format!("~{rest}");
            }
        }
    }
    p.to_owned()
}

/// Run a command and return its trimmed stdout when it exits successfully
/// within `timeout`. The child is killed on timeout.
pub fn command_stdout(cmd: &mut Command, timeout: Duration) -> Option<String> {
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| debug!(error = %e, "failed to spawn helper command"))
        .ok()?;

    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                if !status.success() {
                    debug!(%status, "helper command failed");
                    return None;
                }
                let mut out = String::new();
                child.stdout.take()?.read_to_string(&mut out).ok()?;
                let trimmed = out.trim();
                return (!trimmed.is_empty()).then(|| trimmed.to_string());
            }
            Ok(None) if Instant::now() >= deadline => {
                debug!("helper command timed out");
                let _ = child.kill();
                let _ = child.wait();
                return None;
            }
            Ok(None) => thread::sleep(Duration::from_millis(10)),
            Err(e) => {
                debug!(error = %e, "failed waiting for helper command");
                return None;
            }
        }
    }
}
