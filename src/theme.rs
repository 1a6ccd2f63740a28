//! # Theme Module
//!
//! Named color palettes per segment kind, glyph sets for Nerd Font and plain
//! terminals, and the hex to xterm-256 conversion used for every escape the
//! compositor writes.

use tracing::debug;

pub const RESET: &str = "\x1b[0m";

/// Background and foreground of one segment, as `#rrggbb` hex strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorSet {
    pub bg: &'static str,
    pub fg: &'static str,
}

const fn cs(bg: &'static str, fg: &'static str) -> ColorSet {
    ColorSet { bg, fg }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeColorSet {
    pub directory: ColorSet,
    pub git: ColorSet,
    pub model: ColorSet,
    pub block: ColorSet,
    pub weekly: ColorSet,
    pub opus: ColorSet,
    pub sonnet: ColorSet,
    pub context: ColorSet,
    pub warning: ColorSet,
    pub critical: ColorSet,
}

pub const DARK: ThemeColorSet = ThemeColorSet {
    directory: cs("#8b4513", "#ffffff"),
    git: cs("#404040", "#ffffff"),
    model: cs("#2d2d2d", "#ffffff"),
    block: cs("#2a2a2a", "#87ceeb"),
    weekly: cs("#1a1a1a", "#98fb98"),
    opus: cs("#1a1a1a", "#c792ea"),
    sonnet: cs("#1a1a1a", "#89ddff"),
    context: cs("#2a2a2a", "#87ceeb"),
    warning: cs("#d75f00", "#ffffff"),
    critical: cs("#af0000", "#ffffff"),
};

pub const LIGHT: ThemeColorSet = ThemeColorSet {
    directory: cs("#ff6b47", "#ffffff"),
    git: cs("#4fb3d9", "#ffffff"),
    model: cs("#87ceeb", "#000000"),
    block: cs("#6366f1", "#ffffff"),
    weekly: cs("#10b981", "#ffffff"),
    opus: cs("#8b5cf6", "#ffffff"),
    sonnet: cs("#0ea5e9", "#ffffff"),
    context: cs("#6366f1", "#ffffff"),
    warning: cs("#f59e0b", "#000000"),
    critical: cs("#ef4444", "#ffffff"),
};

pub const NORD: ThemeColorSet = ThemeColorSet {
    directory: cs("#434c5e", "#d8dee9"),
    git: cs("#3b4252", "#a3be8c"),
    model: cs("#4c566a", "#81a1c1"),
    block: cs("#3b4252", "#81a1c1"),
    weekly: cs("#2e3440", "#8fbcbb"),
    opus: cs("#2e3440", "#b48ead"),
    sonnet: cs("#2e3440", "#88c0d0"),
    context: cs("#3b4252", "#81a1c1"),
    warning: cs("#d08770", "#2e3440"),
    critical: cs("#bf616a", "#eceff4"),
};

pub const GRUVBOX: ThemeColorSet = ThemeColorSet {
    directory: cs("#504945", "#ebdbb2"),
    git: cs("#3c3836", "#b8bb26"),
    model: cs("#665c54", "#83a598"),
    block: cs("#3c3836", "#83a598"),
    weekly: cs("#282828", "#fabd2f"),
    opus: cs("#282828", "#d3869b"),
    sonnet: cs("#282828", "#8ec07c"),
    context: cs("#3c3836", "#83a598"),
    warning: cs("#d79921", "#282828"),
    critical: cs("#cc241d", "#ebdbb2"),
};

pub const TOKYO_NIGHT: ThemeColorSet = ThemeColorSet {
    directory: cs("#2f334d", "#82aaff"),
    git: cs("#1e2030", "#c3e88d"),
    model: cs("#191b29", "#fca7ea"),
    block: cs("#2d3748", "#7aa2f7"),
    weekly: cs("#1a202c", "#4fd6be"),
    opus: cs("#1a202c", "#bb9af7"),
    sonnet: cs("#1a202c", "#7dcfff"),
    context: cs("#2d3748", "#7aa2f7"),
    warning: cs("#e0af68", "#1a1b26"),
    critical: cs("#f7768e", "#1a1b26"),
};

pub const ROSE_PINE: ThemeColorSet = ThemeColorSet {
    directory: cs("#26233a", "#c4a7e7"),
    git: cs("#1f1d2e", "#9ccfd8"),
    model: cs("#191724", "#ebbcba"),
    block: cs("#2a273f", "#eb6f92"),
    weekly: cs("#232136", "#9ccfd8"),
    opus: cs("#232136", "#c4a7e7"),
    sonnet: cs("#232136", "#31748f"),
    context: cs("#2a273f", "#9ccfd8"),
    warning: cs("#f6c177", "#191724"),
    critical: cs("#eb6f92", "#191724"),
};

/// Palette for a theme name; unknown names get the dark palette.
pub fn theme(name: &str) -> &'static ThemeColorSet {
    match name {
        "dark" => &DARK,
        "light" => &LIGHT,
        "nord" => &NORD,
        "gruvbox" => &GRUVBOX,
        "tokyo-night" => &TOKYO_NIGHT,
        "rose-pine" => &ROSE_PINE,
        other => {
            debug!(theme = other, "unknown theme, using dark");
            &DARK
        }
    }
}

/// Glyphs and icons used by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbols {
    pub right_arrow: &'static str,
    pub separator: &'static str,
    pub branch: &'static str,
    pub model: &'static str,
    pub block: &'static str,
    pub weekly: &'static str,
    /// Overall weekly figure next to a per-model figure
    pub overall: &'static str,
    pub opus: &'static str,
    pub sonnet: &'static str,
    pub context: &'static str,
    pub dirty: &'static str,
    pub progress_full: &'static str,
    pub progress_empty: &'static str,
    pub trend_up: &'static str,
    pub trend_down: &'static str,
    pub ellipsis: &'static str,
}

pub const NERD_SYMBOLS: Symbols = Symbols {
    right_arrow: "\u{e0b0}",
    separator: "\u{e0b1}",
    branch: "\u{e0a0}",
    model: "✱",
    block: "◫",
    weekly: "○",
    overall: "○",
    opus: "◈",
    sonnet: "◇",
    context: "◐",
    dirty: "●",
    progress_full: "█",
    progress_empty: "░",
    trend_up: "↑",
    trend_down: "↓",
    ellipsis: "…",
};

/// Set for terminals without Nerd Fonts. Branch and model carry no icon.
pub const TEXT_SYMBOLS: Symbols = Symbols {
    right_arrow: ">",
    separator: "|",
    branch: "",
    model: "",
    block: "BLK",
    weekly: "WK",
    overall: "All",
    opus: "Op",
    sonnet: "So",
    context: "CTX",
    dirty: "●",
    progress_full: "#",
    progress_empty: "-",
    trend_up: "↑",
    trend_down: "↓",
    ellipsis: "…",
};

pub fn symbols(use_nerd_fonts: bool) -> &'static Symbols {
    if use_nerd_fonts {
        &NERD_SYMBOLS
    } else {
        &TEXT_SYMBOLS
    }
}

fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

/// Nearest xterm-256 palette index for a `#rrggbb` color. Grays use the
/// 24-step ramp, everything else the 6x6x6 cube. Invalid input maps to 7.
pub fn hex_to_ansi256(hex: &str) -> u8 {
    let Some((r, g, b)) = parse_hex(hex) else {
        return 7;
    };
    if r == g && g == b {
        return match r {
            0..=7 => 16,
            249..=255 => 231,
            v => ((f64::from(v) - 8.0) / 247.0 * 24.0).round() as u8 + 232,
        };
    }
    let scale = |v: u8| (f64::from(v) / 255.0 * 5.0).round() as u8;
    16 + 36 * scale(r) + 6 * scale(g) + scale(b)
}

pub fn fg(hex: &str) -> String {
    format!("\x1b[38;5;{}m", hex_to_ansi256(hex))
}

pub fn bg(hex: &str) -> String {
    format!("\x1b[48;5;{}m", hex_to_ansi256(hex))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gray_ramp_edges() {
        assert_eq!(hex_to_ansi256("#000000"), 16);
        assert_eq!(hex_to_ansi256("#ffffff"), 231);
        assert_eq!(hex_to_ansi256("#808080"), 244);
        assert_eq!(hex_to_ansi256("#1a1a1a"), 234);
    }

    #[test]
    fn test_color_cube() {
        assert_eq!(hex_to_ansi256("#ff0000"), 196);
        assert_eq!(hex_to_ansi256("#00ff00"), 46);
        assert_eq!(hex_to_ansi256("#8b4513"), 130);
        assert_eq!(hex_to_ansi256("not-a-color"), 7);
    }

    #[test]
    fn test_escapes() {
        assert_eq!(fg("#ff0000"), "\x1b[38;5;196m");
        assert_eq!(bg("#000000"), "\x1b[48;5;16m");
    }

    #[test]
    fn test_unknown_theme_is_dark() {
        assert_eq!(theme("solarized"), &DARK);
        assert_eq!(theme("nord").git.fg, "#a3be8c");
    }

    #[test]
    fn test_symbol_sets() {
        assert_eq!(symbols(true).right_arrow, "\u{e0b0}");
        assert_eq!(symbols(false).separator, "|");
        assert_eq!(symbols(false).overall, "All");
    }
}
