//! # Claude Limitline
//!
//! A single-line status bar for Claude Code sessions showing the working
//! directory, git branch, active model, context window fill, and the
//! realtime five-hour and weekly usage limits with their trend.
//!
//! ## Overview
//!
//! One invocation reads the hook JSON on stdin, resolves settings, fetches
//! usage at most once, and writes one escape-coded line to stdout:
//!
//! Settings + EnvironmentInfo + UsageCache -> metric providers ->
//! SegmentRenderer -> Compositor -> output.
//!
//! ## Features
//!
//! - `git` (default): Enables repository inspection via gix

/// Usage snapshot cache with freshness and trend tracking
pub mod cache;

/// Command-line argument parsing
pub mod cli;

/// Config file discovery and typed settings
pub mod config;

/// OAuth token discovery per platform
pub mod credentials;

/// Segment rendering and line composition
pub mod display;

/// Directory, git, model and context facts for the current session
pub mod environment;

/// Git repository inspection (feature-gated)
#[cfg(feature = "git")]
pub mod git;

/// Data models for hooks, usage windows and display metrics
pub mod models;

/// Color palettes, symbol sets and ANSI escapes
pub mod theme;

/// Realtime usage limits retrieved from the Claude OAuth API
pub mod usage_api;

/// Process helpers: logging, stdin, terminal, subprocesses
pub mod utils;

/// Five-hour block and weekly window metrics
pub mod window;
