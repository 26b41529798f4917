//! Client configuration.
//!
//! Sources, lowest priority first: built-in defaults, a TOML file, environment
//! variables, command-line flags (applied by the binary).

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::client::{ClientOptions, Participant};
use crate::error::ChatError;
use crate::history::HttpHistory;

pub const ENV_SERVER_URL: &str = "ORDER_CHAT_SERVER_URL";
pub const ENV_API_BASE: &str = "ORDER_CHAT_API_BASE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticipantConfig {
    pub name: String,
    pub is_admin: bool,
}

impl Default for ParticipantConfig {
    fn default() -> Self {
        Self {
            name: "Guest".to_string(),
            is_admin: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// WebSocket URL of the chat channel.
    pub server_url: String,
    /// Base URL for the history endpoint.
    pub api_base: String,
    /// Typing idle window in milliseconds.
    pub debounce_ms: u64,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub participant: ParticipantConfig,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            server_url: "ws://127.0.0.1:5000/ws/chat".to_string(),
            api_base: "http://127.0.0.1:5000".to_string(),
            debounce_ms: 2_000,
            connect_timeout_secs: 3,
            request_timeout_secs: 10,
            participant: ParticipantConfig::default(),
        }
    }
}

impl ChatConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ChatError> {
        toml::from_str(s).map_err(|e| ChatError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, ChatError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Apply `ORDER_CHAT_SERVER_URL` / `ORDER_CHAT_API_BASE` when set.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// [`apply_env`](Self::apply_env) with an injectable lookup.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_SERVER_URL).filter(|v| !v.trim().is_empty()) {
            self.server_url = url;
        }
        if let Some(base) = lookup(ENV_API_BASE).filter(|v| !v.trim().is_empty()) {
            self.api_base = base;
        }
    }

    pub fn validate(&self) -> Result<(), ChatError> {
        if self.server_url.trim().is_empty() {
            return Err(ChatError::Config("server_url must not be empty".into()));
        }
        if self.api_base.trim().is_empty() {
            return Err(ChatError::Config("api_base must not be empty".into()));
        }
        if self.debounce_ms == 0 {
            return Err(ChatError::Config("debounce_ms must be greater than zero".into()));
        }
        if self.participant.name.trim().is_empty() {
            return Err(ChatError::Config("participant.name must not be empty".into()));
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn participant(&self) -> Participant {
        Participant::new(self.participant.name.clone(), self.participant.is_admin)
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions::new(self.participant()).debounce(self.debounce())
    }

    pub fn history(&self) -> HttpHistory {
        HttpHistory::builder(self.api_base.clone())
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .request_timeout(Duration::from_secs(self.request_timeout_secs))
            .build()
    }
}
