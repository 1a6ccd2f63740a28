//! # Display Module
//!
//! Turns metrics and environment facts into colored [`Segment`]s and chains
//! them into the final status line.
//!
//! Two layouts exist: powerline, where arrow glyphs bridge the backgrounds of
//! neighboring segments, and a fallback for terminals without Nerd Fonts,
//! where segments are joined by a plain separator.

use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;
use tracing::debug;

use crate::config::{BarStyle, CompactMode, LayoutStyle, SegmentKind, Settings, ViewMode};
use crate::models::{BlockDisplayInfo, EnvironmentInfo, Trend, TrendResult, WeeklyDisplayInfo};
use crate::theme::{self, ColorSet, RESET, Symbols, ThemeColorSet};
use crate::utils::format_path;
use crate::window::minutes_until;

/// Width of the context window bar; not configurable.
const CONTEXT_BAR_WIDTH: usize = 10;
/// Compact mode shortens branch names longer than this.
const BRANCH_COMPACT_LIMIT: usize = 10;
const BRANCH_COMPACT_KEEP: usize = 8;
const EMPTY_BAR_RGB: (u8, u8, u8) = (100, 160, 200);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub colors: ColorSet,
}

/// Everything one render pass looks at.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub block: &'a BlockDisplayInfo,
    pub weekly: &'a WeeklyDisplayInfo,
    pub env: &'a EnvironmentInfo,
    pub trend: &'a TrendResult,
}

/// `critical` at or above 100 percent, `warning` at or above the threshold,
/// `base` otherwise.
pub fn color_for(
    percent: f64,
    base: ColorSet,
    theme: &ThemeColorSet,
    warning_threshold: f64,
) -> ColorSet {
    if percent >= 100.0 {
        theme.critical
    } else if percent >= warning_threshold {
        theme.warning
    } else {
        base
    }
}

/// Green to red gradient for a clamped percentage.
pub fn bar_color(percent: f64) -> (u8, u8, u8) {
    let p = percent.clamp(0.0, 100.0);
    if p < 50.0 {
        ((p / 50.0 * 255.0).round() as u8, 255, 0)
    } else {
        (255, ((1.0 - (p - 50.0) / 50.0) * 255.0).round() as u8, 0)
    }
}

/// `1d4h`, `3h12m`, `42m`; minutes are dropped once days are shown.
pub fn format_duration(minutes: i64) -> String {
    let minutes = minutes.max(0);
    let days = minutes / 1440;
    let hours = (minutes % 1440) / 60;
    let mins = minutes % 60;
    let mut out = String::new();
    if days > 0 {
        out.push_str(&format!("{days}d"));
    }
    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }
    if mins > 0 && days == 0 {
        out.push_str(&format!("{mins}m"));
    }
    if out.is_empty() {
        out.push_str("0m");
    }
    out
}

/// Compact decision for a terminal of `width` columns.
pub fn is_compact(mode: CompactMode, width: u16, compact_width: u16) -> bool {
    match mode {
        CompactMode::Always => true,
        CompactMode::Never => false,
        CompactMode::Auto => width < compact_width,
    }
}

fn rounded(percent: f64) -> i64 {
    percent.round() as i64
}

fn with_icon(icon: &str, text: &str) -> String {
    if icon.is_empty() {
        text.to_string()
    } else {
        format!("{icon} {text}")
    }
}

pub struct SegmentRenderer<'a> {
    settings: &'a Settings,
    theme: &'static ThemeColorSet,
    symbols: &'static Symbols,
    compact: bool,
    now: DateTime<Utc>,
}

impl<'a> SegmentRenderer<'a> {
    pub fn new(settings: &'a Settings, compact: bool, now: DateTime<Utc>) -> Self {
        SegmentRenderer {
            settings,
            theme: theme::theme(&settings.theme),
            symbols: theme::symbols(settings.display.use_nerd_fonts),
            compact,
            now,
        }
    }

    pub fn symbols(&self) -> &'static Symbols {
        self.symbols
    }

    pub fn color_for(&self, percent: f64, base: ColorSet) -> ColorSet {
        color_for(percent, base, self.theme, self.settings.budget.warning_threshold)
    }

    /// `width` glyphs, the first `round(p/100*width)` in the gradient color of
    /// the clamped percentage. `restore_fg` is appended so text after the bar
    /// keeps the segment foreground.
    pub fn progress_bar(&self, percent: f64, width: usize, restore_fg: &str) -> String {
        let p = percent.clamp(0.0, 100.0);
        let filled = ((p / 100.0 * width as f64).round() as usize).min(width);
        let empty = width - filled;
        let mut bar = String::new();
        if filled > 0 {
            let (r, g, b) = bar_color(p);
            let glyphs = self.symbols.progress_full.repeat(filled);
            bar.push_str(&glyphs.truecolor(r, g, b).to_string());
        }
        if empty > 0 {
            let (r, g, b) = EMPTY_BAR_RGB;
            let glyphs = self.symbols.progress_empty.repeat(empty);
            bar.push_str(&glyphs.truecolor(r, g, b).to_string());
        }
        bar.push_str(restore_fg);
        bar
    }

    pub fn trend_arrow(&self, trend: Option<Trend>) -> &'static str {
        if !self.settings.show_trend {
            return "";
        }
        match trend {
            Some(Trend::Up) => self.symbols.trend_up,
            Some(Trend::Down) => self.symbols.trend_down,
            Some(Trend::Same) | None => "",
        }
    }

    pub fn segment(&self, kind: SegmentKind, ctx: &RenderContext<'_>) -> Option<Segment> {
        match kind {
            SegmentKind::Directory => self.directory(ctx.env),
            SegmentKind::Git => self.git(ctx.env),
            SegmentKind::Model => self.model(ctx.env),
            SegmentKind::Block => self.block(ctx.block, ctx.trend),
            SegmentKind::Weekly => self.weekly(ctx.weekly, ctx.env, ctx.trend),
            SegmentKind::Context => self.context(ctx.env),
        }
    }

    pub fn directory(&self, env: &EnvironmentInfo) -> Option<Segment> {
        if !self.settings.directory.enabled {
            return None;
        }
        let dir = env.directory.as_deref()?;
        Some(Segment {
            text: format!(" {} ", format_path(dir)),
            colors: self.theme.directory,
        })
    }

    pub fn git(&self, env: &EnvironmentInfo) -> Option<Segment> {
        if !self.settings.git.enabled {
            return None;
        }
        let branch = env.git_branch.as_deref()?;
        let branch = if self.compact && branch.chars().count() > BRANCH_COMPACT_LIMIT {
            let head: String = branch.chars().take(BRANCH_COMPACT_KEEP).collect();
            format!("{head}{}", self.symbols.ellipsis)
        } else {
            branch.to_string()
        };
        let dirty = if env.git_dirty {
            format!(" {}", self.symbols.dirty)
        } else {
            String::new()
        };
        Some(Segment {
            text: format!(" {}{dirty} ", with_icon(self.symbols.branch, &branch)),
            colors: self.theme.git,
        })
    }

    pub fn model(&self, env: &EnvironmentInfo) -> Option<Segment> {
        if !self.settings.model.enabled {
            return None;
        }
        let model = env.model.as_deref()?;
        Some(Segment {
            text: format!(" {} ", with_icon(self.symbols.model, model)),
            colors: self.theme.model,
        })
    }

    pub fn block(&self, info: &BlockDisplayInfo, trend: &TrendResult) -> Option<Segment> {
        let cfg = &self.settings.block;
        if !cfg.enabled {
            return None;
        }
        let icon = self.symbols.block;
        let Some(percent) = info.percent_used else {
            return Some(Segment {
                text: format!(" {icon} -- "),
                colors: self.theme.block,
            });
        };
        let colors = self.color_for(percent, self.theme.block);
        let arrow = self.trend_arrow(trend.five_hour);
        let mut text = if cfg.display_style == BarStyle::Bar && !self.compact {
            let bar = self.progress_bar(percent, cfg.bar_width, &theme::fg(colors.fg));
            format!("{bar} {}%{arrow}", rounded(percent))
        } else {
            format!("{}%{arrow}", rounded(percent))
        };
        if let Some(minutes) = info.time_remaining_minutes {
            if cfg.show_time_remaining && !self.compact {
                text.push_str(&format!(" ({})", format_duration(minutes)));
            }
        }
        Some(Segment {
            text: format!(" {icon} {text} "),
            colors,
        })
    }

    pub fn weekly(
        &self,
        info: &WeeklyDisplayInfo,
        env: &EnvironmentInfo,
        trend: &TrendResult,
    ) -> Option<Segment> {
        if !self.settings.weekly.enabled {
            return None;
        }
        match self.settings.weekly.view_mode {
            ViewMode::Simple => Some(self.weekly_simple(info, trend)),
            ViewMode::Smart => Some(self.weekly_smart(info, env, trend)),
        }
    }

    fn weekly_simple(&self, info: &WeeklyDisplayInfo, trend: &TrendResult) -> Segment {
        let cfg = &self.settings.weekly;
        let icon = self.symbols.weekly;
        let colors = self.theme.weekly;
        let Some(percent) = info.percent_used else {
            return Segment {
                text: format!(" {icon} -- "),
                colors,
            };
        };
        let arrow = self.trend_arrow(trend.seven_day);
        let mut text = if cfg.display_style == BarStyle::Bar && !self.compact {
            let bar = self.progress_bar(percent, cfg.bar_width, &theme::fg(colors.fg));
            format!("{bar} {}%{arrow}", rounded(percent))
        } else {
            format!("{}%{arrow}", rounded(percent))
        };
        if cfg.show_week_progress && !self.compact {
            text.push_str(&format!(" (wk {}%)", info.week_progress_percent));
        }
        Segment {
            text: format!(" {icon} {text} "),
            colors,
        }
    }

    /// Overall weekly usage, or the per-model sub-limit side by side with it
    /// when the active model has one.
    fn weekly_smart(
        &self,
        info: &WeeklyDisplayInfo,
        env: &EnvironmentInfo,
        trend: &TrendResult,
    ) -> Segment {
        let width = self.settings.weekly.bar_width;
        let overall_icon = self.symbols.overall;
        let model = env.model.as_deref().unwrap_or_default().to_lowercase();
        let time_suffix = match info.reset_at {
            Some(reset_at) if !self.compact => {
                format!(" ({})", format_duration(minutes_until(reset_at, self.now)))
            }
            _ => String::new(),
        };

        let per_model = if model.contains("sonnet") {
            info.sonnet_percent_used
                .map(|p| (self.symbols.sonnet, p, trend.seven_day_sonnet))
        } else if model.contains("opus") {
            info.opus_percent_used
                .map(|p| (self.symbols.opus, p, trend.seven_day_opus))
        } else {
            None
        };

        let Some(overall) = info.percent_used else {
            return Segment {
                text: format!(" {overall_icon} -- "),
                colors: self.theme.weekly,
            };
        };
        let overall_arrow = self.trend_arrow(trend.seven_day);

        if let Some((model_icon, model_pct, model_trend)) = per_model {
            let worst = model_pct.max(overall);
            let colors = self.color_for(worst, self.theme.weekly);
            let bar = if self.compact {
                String::new()
            } else {
                format!("{} ", self.progress_bar(worst, width, &theme::fg(colors.fg)))
            };
            let text = format!(
                " {bar}{model_icon}{}%{} | {overall_icon}{}%{overall_arrow}{time_suffix} ",
                rounded(model_pct),
                self.trend_arrow(model_trend),
                rounded(overall),
            );
            return Segment { text, colors };
        }

        let colors = self.color_for(overall, self.theme.weekly);
        let bar = if self.compact {
            String::new()
        } else {
            format!("{} ", self.progress_bar(overall, width, &theme::fg(colors.fg)))
        };
        Segment {
            text: format!(
                " {overall_icon} {bar}{}%{overall_arrow}{time_suffix} ",
                rounded(overall)
            ),
            colors,
        }
    }

    pub fn context(&self, env: &EnvironmentInfo) -> Option<Segment> {
        if !self.settings.context.enabled {
            return None;
        }
        let percent = f64::from(env.context_percent);
        let colors = self.color_for(percent, self.theme.context);
        let bar = self.progress_bar(percent, CONTEXT_BAR_WIDTH, &theme::fg(colors.fg));
        Some(Segment {
            text: format!(" {} {bar} {}% ", self.symbols.context, env.context_percent),
            colors,
        })
    }
}

/// Arrow-chained layout: each arrow takes the left segment's background as its
/// foreground and the right segment's background as its own.
pub fn render_powerline(segments: &[Segment], symbols: &Symbols) -> String {
    if segments.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    for (i, seg) in segments.iter().enumerate() {
        out.push_str(&theme::bg(seg.colors.bg));
        out.push_str(&theme::fg(seg.colors.fg));
        out.push_str(&seg.text);
        out.push_str(RESET);
        out.push_str(&theme::fg(seg.colors.bg));
        if let Some(next) = segments.get(i + 1) {
            out.push_str(&theme::bg(next.colors.bg));
        }
        out.push_str(symbols.right_arrow);
    }
    out.push_str(RESET);
    out
}

pub fn render_fallback(segments: &[Segment], symbols: &Symbols) -> String {
    segments
        .iter()
        .map(|seg| {
            format!(
                "{}{}{}{RESET}",
                theme::bg(seg.colors.bg),
                theme::fg(seg.colors.fg),
                seg.text
            )
        })
        .collect::<Vec<_>>()
        .join(&format!(" {} ", symbols.separator))
}

pub struct Compositor<'a> {
    settings: &'a Settings,
    terminal_width: u16,
    now: DateTime<Utc>,
}

impl<'a> Compositor<'a> {
    pub fn new(settings: &'a Settings, terminal_width: u16, now: DateTime<Utc>) -> Self {
        Compositor {
            settings,
            terminal_width,
            now,
        }
    }

    pub fn is_compact(&self) -> bool {
        let display = &self.settings.display;
        is_compact(display.compact_mode, self.terminal_width, display.compact_width)
    }

    fn use_powerline(&self) -> bool {
        let display = &self.settings.display;
        display.style == LayoutStyle::Powerline && display.use_nerd_fonts
    }

    /// The complete status line, or an empty string when no segment applies.
    pub fn render(
        &self,
        block: &BlockDisplayInfo,
        weekly: &WeeklyDisplayInfo,
        env: &EnvironmentInfo,
        trend: &TrendResult,
    ) -> String {
        let compact = self.is_compact();
        let renderer = SegmentRenderer::new(self.settings, compact, self.now);
        let ctx = RenderContext {
            block,
            weekly,
            env,
            trend,
        };
        let segments: Vec<Segment> = self
            .settings
            .segments()
            .into_iter()
            .filter_map(|kind| renderer.segment(kind, &ctx))
            .collect();
        debug!(
            count = segments.len(),
            compact,
            width = self.terminal_width,
            "composed segments"
        );
        if self.use_powerline() {
            render_powerline(&segments, renderer.symbols())
        } else {
            render_fallback(&segments, renderer.symbols())
        }
    }
}
