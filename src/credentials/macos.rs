//! macOS credential lookup via the login Keychain.
//!
//! Claude Code stores its credentials JSON as a generic password under the
//! service "Claude Code-credentials". When `CLAUDE_CONFIG_DIR` is set the
//! service name carries an 8-character SHA-256 suffix of that directory.

use std::path::PathBuf;
use std::process::Command;

use sha2::{Digest, Sha256};
use tracing::debug;

use super::{TokenProvider, search_credential_files, token_from_secret};
use crate::utils::{COMMAND_TIMEOUT, command_stdout};

pub const KEYCHAIN_SERVICE: &str = "Claude Code-credentials";

pub struct MacTokenProvider {
    home: Option<PathBuf>,
    config_dir: Option<String>,
}

impl MacTokenProvider {
    pub fn new(home: Option<PathBuf>) -> Self {
        MacTokenProvider {
            home,
            config_dir: std::env::var("CLAUDE_CONFIG_DIR").ok(),
        }
    }

    fn from_keychain(&self) -> Option<String> {
        let service = keychain_service_name(self.config_dir.as_deref());
        let secret = command_stdout(
            Command::new("security").args(["find-generic-password", "-s", service.as_str(), "-w"]),
            COMMAND_TIMEOUT,
        )?;
        let token = token_from_secret(&secret);
        if token.is_some() {
            debug!(%service, "found OAuth token in Keychain");
        }
        token
    }
}

impl TokenProvider for MacTokenProvider {
    fn token(&self) -> Option<String> {
        self.from_keychain().or_else(|| {
            let files: Vec<PathBuf> = self
                .home
                .iter()
                .map(|h| h.join(".claude").join(".credentials.json"))
                .collect();
            search_credential_files(&files)
        })
    }
}

/// Keychain service name, suffixed for non-default config directories.
pub fn keychain_service_name(config_dir: Option<&str>) -> String {
    let mut service_name = KEYCHAIN_SERVICE.to_string();
    if let Some(dir) = config_dir.filter(|d| !d.trim().is_empty()) {
        let hash = Sha256::digest(dir.as_bytes());
        let suffix = format!("{:x}", hash).chars().take(8).collect::<String>();
        service_name.push('-');
        service_name.push_str(&suffix);
    }
    service_name
}
