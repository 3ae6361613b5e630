//! Pusher protocol v7 frames as seen by a channel subscriber.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

use crate::common::ChatMessage;

pub const PROTOCOL_VERSION: u8 = 7;

const DEFAULT_ACTIVITY_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("event `{event}` is missing its data")]
    MissingData { event: String },
    #[error("event `{event}` is missing its channel")]
    MissingChannel { event: String },
}

/// Raw envelope shared by every frame in both directions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Frame {
    /// `data` is usually a JSON document encoded as a string; unwrap it so
    /// callers always see structured JSON.
    fn data_value(&self) -> Result<Value, ProtocolError> {
        match &self.data {
            Some(Value::String(encoded)) => Ok(serde_json::from_str(encoded)?),
            Some(value) => Ok(value.clone()),
            None => Err(ProtocolError::MissingData {
                event: self.event.clone(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectionEstablished {
    pub socket_id: String,
    #[serde(default = "default_activity_timeout")]
    pub activity_timeout: u64,
}

fn default_activity_timeout() -> u64 {
    DEFAULT_ACTIVITY_TIMEOUT_SECS
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorData {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub code: Option<u16>,
}

/// What the client should do after the service reports an error or closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectPolicy {
    /// 4000-4099: the request itself is wrong, retrying will not help.
    Never,
    /// 4100-4199 and unknown codes: retry after the configured delay.
    Backoff,
    /// 4200-4299: retry straight away.
    Immediately,
}

impl ErrorData {
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        match self.code {
            Some(4000..=4099) => ReconnectPolicy::Never,
            Some(4200..=4299) => ReconnectPolicy::Immediately,
            _ => ReconnectPolicy::Backoff,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    ConnectionEstablished(ConnectionEstablished),
    SubscriptionSucceeded { channel: String },
    Error(ErrorData),
    Ping,
    Pong,
    ChannelEvent {
        channel: String,
        event: String,
        data: Value,
    },
}

pub fn decode(text: &str) -> Result<ServerEvent, ProtocolError> {
    let frame: Frame = serde_json::from_str(text)?;
    match frame.event.as_str() {
        "pusher:connection_established" => Ok(ServerEvent::ConnectionEstablished(
            serde_json::from_value(frame.data_value()?)?,
        )),
        "pusher_internal:subscription_succeeded" => {
            let channel = frame.channel.ok_or_else(|| ProtocolError::MissingChannel {
                event: frame.event.clone(),
            })?;
            Ok(ServerEvent::SubscriptionSucceeded { channel })
        }
        "pusher:error" => Ok(ServerEvent::Error(serde_json::from_value(
            frame.data_value()?,
        )?)),
        "pusher:ping" => Ok(ServerEvent::Ping),
        "pusher:pong" => Ok(ServerEvent::Pong),
        _ => {
            let data = frame.data_value()?;
            let channel = frame.channel.ok_or_else(|| ProtocolError::MissingChannel {
                event: frame.event.clone(),
            })?;
            Ok(ServerEvent::ChannelEvent {
                channel,
                event: frame.event,
                data,
            })
        }
    }
}

/// Interpret a channel event payload as a chat message.
pub fn chat_message(data: Value) -> Result<ChatMessage, ProtocolError> {
    Ok(serde_json::from_value(data)?)
}

pub fn subscribe(channel: &str) -> String {
    json!({ "event": "pusher:subscribe", "data": { "channel": channel } }).to_string()
}

pub fn unsubscribe(channel: &str) -> String {
    json!({ "event": "pusher:unsubscribe", "data": { "channel": channel } }).to_string()
}

pub fn ping() -> String {
    json!({ "event": "pusher:ping", "data": {} }).to_string()
}

pub fn pong() -> String {
    json!({ "event": "pusher:pong", "data": {} }).to_string()
}

pub fn client_event(
    channel: &str,
    event: &str,
    message: &ChatMessage,
) -> Result<String, ProtocolError> {
    let frame = Frame {
        event: event.to_string(),
        channel: Some(channel.to_string()),
        data: Some(serde_json::to_value(message)?),
    };
    Ok(serde_json::to_string(&frame)?)
}
