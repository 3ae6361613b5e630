use std::env;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config/chat.json";

const DEFAULT_CLUSTER: &str = "mt1";
const DEFAULT_CHANNEL: &str = "chat-room";
const DEFAULT_INBOUND_EVENT: &str = "new-message";
const DEFAULT_OUTBOUND_EVENT: &str = "client-new-message";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no app key configured; set `app_key` in the config file or PUSHER_APP_KEY")]
    MissingAppKey,
    #[error("invalid channel name `{0}`")]
    InvalidChannel(String),
    #[error("outbound event `{0}` must start with `client-`")]
    InvalidOutboundEvent(String),
    #[error("inbound event name must not be empty")]
    EmptyInboundEvent,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChatConfig {
    pub app_key: String,
    pub cluster: String,
    /// Overrides `ws-{cluster}.pusher.com`, e.g. `127.0.0.1:6001` for a
    /// self-hosted compatible server.
    pub host: Option<String>,
    pub use_tls: bool,
    pub channel: String,
    pub inbound_event: String,
    pub outbound_event: String,
    pub reconnect_delay_secs: u64,
    pub pong_timeout_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            app_key: String::new(),
            cluster: DEFAULT_CLUSTER.to_string(),
            host: None,
            use_tls: true,
            channel: DEFAULT_CHANNEL.to_string(),
            inbound_event: DEFAULT_INBOUND_EVENT.to_string(),
            outbound_event: DEFAULT_OUTBOUND_EVENT.to_string(),
            reconnect_delay_secs: 3,
            pong_timeout_secs: 30,
        }
    }
}

/// Validated settings handed to the network task.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub app_key: String,
    pub host: String,
    pub use_tls: bool,
    pub channel: String,
    pub inbound_event: String,
    pub outbound_event: String,
    pub reconnect_delay: Duration,
    pub pong_timeout: Duration,
}

impl ChatConfig {
    /// Environment variables win over the file; `.env` is loaded by `main`.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("PUSHER_APP_KEY") {
            self.app_key = key;
        }
        if let Some(cluster) = lookup("PUSHER_CLUSTER") {
            self.cluster = cluster;
        }
        if let Some(host) = lookup("PUSHER_HOST") {
            self.host = Some(host);
        }
        if let Some(channel) = lookup("CHAT_CHANNEL") {
            self.channel = channel;
        }
    }

    pub fn validate(&self) -> Result<ClientSettings, ConfigError> {
        if self.app_key.trim().is_empty() {
            return Err(ConfigError::MissingAppKey);
        }
        if !is_valid_channel_name(&self.channel) {
            return Err(ConfigError::InvalidChannel(self.channel.clone()));
        }
        if !self.outbound_event.starts_with("client-") {
            return Err(ConfigError::InvalidOutboundEvent(self.outbound_event.clone()));
        }
        if self.inbound_event.is_empty() {
            return Err(ConfigError::EmptyInboundEvent);
        }

        let host = match &self.host {
            Some(host) if !host.trim().is_empty() => host.trim().to_string(),
            _ => format!("ws-{}.pusher.com", self.cluster),
        };

        Ok(ClientSettings {
            app_key: self.app_key.trim().to_string(),
            host,
            use_tls: self.use_tls,
            channel: self.channel.clone(),
            inbound_event: self.inbound_event.clone(),
            outbound_event: self.outbound_event.clone(),
            reconnect_delay: Duration::from_secs(self.reconnect_delay_secs),
            pong_timeout: Duration::from_secs(self.pong_timeout_secs.max(1)),
        })
    }
}

pub fn is_valid_channel_name(name: &str) -> bool {
    static CHANNEL_RE: OnceLock<Regex> = OnceLock::new();
    CHANNEL_RE
        .get_or_init(|| {
            Regex::new(r"^[A-Za-z0-9_\-=@,.;]{1,164}$").expect("channel name pattern is valid")
        })
        .is_match(name)
}

pub fn load_config(path: &str) -> ChatConfig {
    let path = Path::new(path);
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<ChatConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Failed to parse config file {}: {err}", path.display());
                ChatConfig::default()
            }
        },
        Err(err) => {
            log::info!(
                "Config file {} not found ({err}); using defaults",
                path.display()
            );
            ChatConfig::default()
        }
    }
}
