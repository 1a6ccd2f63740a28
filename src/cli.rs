use std::path::PathBuf;

use clap::ArgAction;
use clap::builder::FalseyValueParser;
use clap::error::ErrorKind;

use crate::config::CompactMode;

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompactArg {
    /// Compact below the configured width
    Auto,
    Always,
    Never,
}

impl From<CompactArg> for CompactMode {
    fn from(arg: CompactArg) -> Self {
        match arg {
            CompactArg::Auto => CompactMode::Auto,
            CompactArg::Always => CompactMode::Always,
            CompactArg::Never => CompactMode::Never,
        }
    }
}

#[derive(clap::Parser, Debug, Default)]
#[command(name = "claude-limitline", version, about = "Usage-limit status line for Claude Code")]
pub struct Args {
    /// Config file to use instead of ./.claude-limitline.json and ~/.claude/claude-limitline.json
    #[arg(long, env = "CLAUDE_LIMITLINE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Compact rendering: auto|always|never (overrides the config file)
    #[arg(long, value_enum)]
    pub compact: Option<CompactArg>,

    /// Log diagnostics to stderr
    #[arg(
        long,
        env = "CLAUDE_LIMITLINE_DEBUG",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    pub debug: bool,
}

impl Args {
    /// Parse process arguments. Help and version requests are printed and exit;
    /// any other argument error falls back to defaults so the status line still
    /// renders.
    pub fn parse() -> Self {
        Self::parse_from(std::env::args_os())
    }

    pub fn parse_from<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        match <Args as clap::Parser>::try_parse_from(args) {
            Ok(args) => args,
            Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                let _ = err.print();
                std::process::exit(0);
            }
            Err(_) => Args::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_flags() {
        let args = Args::parse_from([
            "claude-limitline",
            "--config",
            "/tmp/c.json",
            "--compact",
            "always",
        ]);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/c.json")));
        assert_eq!(args.compact.map(CompactMode::from), Some(CompactMode::Always));
    }

    #[test]
    fn test_bad_arguments_fall_back_to_defaults() {
        let args = Args::parse_from(["claude-limitline", "--compact", "sideways"]);
        assert_eq!(args.compact, None);
        let args = Args::parse_from(["claude-limitline", "--no-such-flag"]);
        assert_eq!(args.compact, None);
    }

    #[test]
    #[serial]
    fn test_debug_env_accepts_common_spellings() {
        for (value, expected) in [("1", true), ("yes", true), ("true", true), ("0", false), ("off", false)] {
            unsafe { std::env::set_var("CLAUDE_LIMITLINE_DEBUG", value) };
            let args = Args::parse_from(["claude-limitline", "--config", "/tmp/c.json"]);
            assert_eq!(args.debug, expected, "CLAUDE_LIMITLINE_DEBUG={value}");
            assert_eq!(args.config, Some(PathBuf::from("/tmp/c.json")));
        }
        unsafe { std::env::remove_var("CLAUDE_LIMITLINE_DEBUG") };
        assert!(Args::parse_from(["claude-limitline", "--debug"]).debug);
    }
}
