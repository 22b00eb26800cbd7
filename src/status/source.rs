//! Delegated scraper for the status portal.
//!
//! Logging into the portal takes a real browser, which stays outside this
//! crate: a user-configured command does the scraping and prints a
//! `LiveStatus` JSON document on stdout. Credentials are handed to the
//! command through its environment, never on the command line.

use crate::error::FetchError;
use crate::model::LiveStatus;
use std::path::PathBuf;
use std::process::Command;

/// Yields the current state of the live status page.
pub trait StatusSource {
    fn fetch(&self) -> Result<LiveStatus, FetchError>;
}

/// Portal login credentials passed through to the scrape command.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub uci: String,
    pub password: String,
}

pub struct CommandStatusSource {
    program: PathBuf,
    args: Vec<String>,
    credentials: Credentials,
}

impl CommandStatusSource {
    /// Split the configured command line and resolve the executable up
    /// front, so a bad configuration fails at startup instead of three
    /// hours later inside a scheduled cycle.
    pub fn new(command: &str, credentials: Credentials) -> Result<Self, FetchError> {
        let words =
            shell_words::split(command).map_err(|err| FetchError::Command(err.to_string()))?;
        let Some((program, args)) = words.split_first() else {
            return Err(FetchError::Command("empty scrape command".to_string()));
        };
        let program = which::which(program)
            .map_err(|err| FetchError::Command(format!("{program}: {err}")))?;
        Ok(Self {
            program,
            args: args.to_vec(),
            credentials,
        })
    }
}

impl StatusSource for CommandStatusSource {
    fn fetch(&self) -> Result<LiveStatus, FetchError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .env("CSTBOT_UCI", &self.credentials.uci)
            .env("CSTBOT_PASSWORD", &self.credentials.password)
            .output()
            .map_err(|err| FetchError::Command(err.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FetchError::Command(format!(
                "scrape command exited with {:?}: {}",
                output.status.code(),
                stderr.trim()
            )));
        }

        serde_json::from_slice(&output.stdout).map_err(|err| FetchError::Payload(err.to_string()))
    }
}
