//! Windows credential lookup: the Credential Manager through PowerShell, then
//! credential files in the profile and app-data directories.

use std::path::PathBuf;
use std::process::Command;

use tracing::debug;

use super::{TokenProvider, recognized_token, search_credential_files};
use crate::utils::{COMMAND_TIMEOUT, command_stdout};

const STORED_CREDENTIAL_SCRIPT: &str = "[System.Text.Encoding]::UTF8.GetString([System.Convert]::FromBase64String((Get-StoredCredential -Target 'Claude Code' -AsCredentialObject).Password))";

pub struct WindowsTokenProvider {
    home: Option<PathBuf>,
    app_data: Option<PathBuf>,
    local_app_data: Option<PathBuf>,
}

impl WindowsTokenProvider {
    pub fn new(home: Option<PathBuf>) -> Self {
        WindowsTokenProvider {
            home,
            app_data: std::env::var_os("APPDATA").map(PathBuf::from),
            local_app_data: std::env::var_os("LOCALAPPDATA").map(PathBuf::from),
        }
    }

    /// Credential files in lookup order.
    pub fn credential_paths(&self) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(home) = self.home.as_ref() {
            paths.push(home.join(".claude").join(".credentials.json"));
            paths.push(home.join(".claude").join("credentials.json"));
            paths.push(home.join(".config").join("claude-code").join("credentials.json"));
        }
        for base in [self.app_data.as_ref(), self.local_app_data.as_ref()]
            .into_iter()
            .flatten()
        {
            paths.push(base.join("Claude Code").join("credentials.json"));
        }
        paths
    }

    fn from_credential_manager(&self) -> Option<String> {
        let out = command_stdout(
            Command::new("powershell").args(["-NoProfile", "-Command", STORED_CREDENTIAL_SCRIPT]),
            COMMAND_TIMEOUT,
        )?;
        let token = recognized_token(&out);
        if token.is_some() {
            debug!("found OAuth token in Windows Credential Manager");
        }
        token
    }
}

impl TokenProvider for WindowsTokenProvider {
    fn token(&self) -> Option<String> {
        self.from_credential_manager()
            .or_else(|| search_credential_files(&self.credential_paths()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_data_paths_follow_profile_paths() {
        let provider = WindowsTokenProvider {
            home: Some(PathBuf::from("C:/Users/dev")),
            app_data: Some(PathBuf::from("C:/Users/dev/AppData/Roaming")),
            local_app_data: None,
        };
        let paths = provider.credential_paths();
        assert_eq!(paths.len(), 4);
        assert_eq!(
            paths[3],
            PathBuf::from("C:/Users/dev/AppData/Roaming")
                .join("Claude Code")
                .join("credentials.json")
        );
    }
}
