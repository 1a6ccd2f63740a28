//! OAuth token discovery for the usage API.
//!
//! Every platform has its own [`TokenProvider`]; [`platform_provider`] picks the
//! right one once at startup and puts the `CLAUDE_CODE_OAUTH_TOKEN` override in
//! front of it. Providers never fail loudly: a missing or unreadable credential
//! simply yields `None` and a debug log line.

pub mod linux;
pub mod macos;
pub mod windows;

use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Prefix shared by all Claude OAuth access tokens.
pub const TOKEN_PREFIX: &str = "sk-ant-oat";

/// Environment variable that overrides platform storage everywhere.
pub const ENV_VAR_TOKEN: &str = "CLAUDE_CODE_OAUTH_TOKEN";

/// Top-level keys accepted in flat credential files.
const FLAT_TOKEN_KEYS: [&str; 3] = ["oauth_token", "token", "accessToken"];

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("credentials not found")]
    NotFound,
    #[error("credentials expired")]
    Expired,
    #[error("failed to parse credentials: {0}")]
    Parse(String),
    #[error("I/O error reading credentials: {0}")]
    Io(String),
}

/// Source of a bearer token for the usage API.
pub trait TokenProvider {
    fn token(&self) -> Option<String>;
}

impl<F> TokenProvider for F
where
    F: Fn() -> Option<String>,
{
    fn token(&self) -> Option<String> {
        self()
    }
}

/// Reads the token from an environment variable.
pub struct EnvTokenProvider {
    var: &'static str,
}

impl Default for EnvTokenProvider {
    fn default() -> Self {
        EnvTokenProvider { var: ENV_VAR_TOKEN }
    }
}

impl TokenProvider for EnvTokenProvider {
    fn token(&self) -> Option<String> {
        let value = std::env::var(self.var).ok()?;
        recognized_token(&value)
    }
}

/// Asks each provider in turn and returns the first token found.
pub struct ChainProvider {
    providers: Vec<Box<dyn TokenProvider>>,
}

impl ChainProvider {
    pub fn new(providers: Vec<Box<dyn TokenProvider>>) -> Self {
        ChainProvider { providers }
    }
}

impl TokenProvider for ChainProvider {
    fn token(&self) -> Option<String> {
        self.providers.iter().find_map(|p| p.token())
    }
}

/// Platforms without a known credential store.
pub struct UnsupportedPlatform;

impl TokenProvider for UnsupportedPlatform {
    fn token(&self) -> Option<String> {
        debug!(os = std::env::consts::OS, "no credential store for this platform");
        None
    }
}

/// Build the token provider for the platform this binary was compiled for.
pub fn platform_provider() -> Box<dyn TokenProvider> {
    let home = home_dir();
    debug!(os = std::env::consts::OS, "selecting credential provider");

    #[cfg(target_os = "linux")]
    let platform: Box<dyn TokenProvider> = Box::new(linux::LinuxTokenProvider::new(home));
    #[cfg(target_os = "macos")]
    let platform: Box<dyn TokenProvider> = Box::new(macos::MacTokenProvider::new(home));
    #[cfg(target_os = "windows")]
    let platform: Box<dyn TokenProvider> = Box::new(windows::WindowsTokenProvider::new(home));
    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    let platform: Box<dyn TokenProvider> = {
        let _ = home;
        Box::new(UnsupportedPlatform)
    };

    Box::new(ChainProvider::new(vec![
        Box::new(EnvTokenProvider::default()),
        platform,
    ]))
}

fn home_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().to_path_buf())
}

/// Trim and accept only values that look like an OAuth access token.
pub fn recognized_token(value: &str) -> Option<String> {
    let trimmed = value.trim();
    trimmed
        .starts_with(TOKEN_PREFIX)
        .then(|| trimmed.to_string())
}

/// Extract the access token from credential JSON.
///
/// Accepts the nested `claudeAiOauth.accessToken` layout written by Claude Code
/// as well as flat files keyed by `oauth_token`, `token` or `accessToken`.
/// A nested token whose `expiresAt` (epoch millis) has passed is rejected.
pub fn token_from_credentials_json(content: &str) -> Result<String, CredentialError> {
    let json: serde_json::Value =
        serde_json::from_str(content).map_err(|e| CredentialError::Parse(e.to_string()))?;

    if let Some(oauth) = json.get("claudeAiOauth").filter(|v| v.is_object()) {
        if let Some(expires_at) = oauth.get("expiresAt").and_then(|v| v.as_i64()) {
            if Utc::now().timestamp_millis() > expires_at {
                return Err(CredentialError::Expired);
            }
        }
        if let Some(token) = oauth
            .get("accessToken")
            .and_then(|v| v.as_str())
            .and_then(recognized_token)
        {
            return Ok(token);
        }
    }

    FLAT_TOKEN_KEYS
        .iter()
        .find_map(|key| json.get(*key).and_then(|v| v.as_str()).and_then(recognized_token))
        .ok_or(CredentialError::NotFound)
}

/// Read a credential file and extract its token.
pub fn token_from_file(path: &Path) -> Result<String, CredentialError> {
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => CredentialError::NotFound,
        _ => CredentialError::Io(e.to_string()),
    })?;
    token_from_credentials_json(&content)
}

/// First token found across candidate credential files, in order.
pub fn search_credential_files(paths: &[PathBuf]) -> Option<String> {
    for path in paths {
        match token_from_file(path) {
            Ok(token) => {
                debug!(path = %path.display(), "found OAuth token in credentials file");
                return Some(token);
            }
            Err(CredentialError::NotFound) => {}
            Err(err) => debug!(path = %path.display(), error = %err, "skipping credentials file"),
        }
    }
    None
}

/// Token from a JSON-or-raw secret store value.
pub(crate) fn token_from_secret(secret: &str) -> Option<String> {
    let trimmed = secret.trim();
    if trimmed.starts_with('{') {
        match token_from_credentials_json(trimmed) {
            Ok(token) => return Some(token),
            Err(err) => debug!(error = %err, "secret store value is not usable JSON"),
        }
    }
    recognized_token(trimmed)
}
