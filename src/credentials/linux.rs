//! Linux credential lookup: the Secret Service keyring via `secret-tool`, then
//! the credential files Claude Code writes under the home directory.

use std::path::PathBuf;
use std::process::Command;

use tracing::debug;

use super::{TokenProvider, search_credential_files, token_from_secret};
use crate::utils::{COMMAND_TIMEOUT, command_stdout};

pub struct LinuxTokenProvider {
    home: Option<PathBuf>,
}

impl LinuxTokenProvider {
    pub fn new(home: Option<PathBuf>) -> Self {
        LinuxTokenProvider { home }
    }

    /// Credential files in lookup order.
    pub fn credential_paths(&self) -> Vec<PathBuf> {
        let Some(home) = self.home.as_ref() else {
            return Vec::new();
        };
        vec![
            home.join(".claude").join(".credentials.json"),
            home.join(".claude").join("credentials.json"),
            home.join(".config").join("claude-code").join("credentials.json"),
        ]
    }

    fn from_keyring(&self) -> Option<String> {
        let secret = command_stdout(
            Command::new("secret-tool").args(["lookup", "service", "Claude Code"]),
            COMMAND_TIMEOUT,
        )?;
        let token = token_from_secret(&secret);
        if token.is_some() {
            debug!("found OAuth token in Secret Service keyring");
        }
        token
    }
}

impl TokenProvider for LinuxTokenProvider {
    fn token(&self) -> Option<String> {
        self.from_keyring()
            .or_else(|| search_credential_files(&self.credential_paths()))
    }
}
