use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Payload carried by both the outbound client event and the inbound
/// channel event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub user: String,
    pub text: String,
}

impl ChatMessage {
    pub fn new(user: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            text: text.into(),
        }
    }
}

/// Upper bound (exclusive) of the number appended to generated names.
pub const NAME_NUMBER_LIMIT: u32 = 1000;

/// Ephemeral name shown next to outgoing messages. Never persisted and not
/// unique across sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayName(String);

impl DisplayName {
    pub fn generate() -> Self {
        let number = rand::thread_rng().gen_range(0..NAME_NUMBER_LIMIT);
        Self(format!("User{number}"))
    }

    pub fn custom(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// True when `name` has the shape produced by [`DisplayName::generate`].
    pub fn is_generated(name: &str) -> bool {
        let Some(digits) = name.strip_prefix("User") else {
            return false;
        };
        if digits.is_empty() || digits.len() > 3 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
        digits
            .parse::<u32>()
            .map(|n| n < NAME_NUMBER_LIMIT)
            .unwrap_or(false)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_names_stay_in_range() {
        for _ in 0..2000 {
            let name = DisplayName::generate();
            assert!(DisplayName::is_generated(name.as_str()), "bad name {name}");
        }
    }

    #[test]
    fn rejects_names_outside_the_pattern() {
        assert!(DisplayName::is_generated("User0"));
        assert!(DisplayName::is_generated("User999"));
        assert!(!DisplayName::is_generated("User1000"));
        assert!(!DisplayName::is_generated("User"));
        assert!(!DisplayName::is_generated("user12"));
        assert!(!DisplayName::is_generated("User-1"));
    }

    #[test]
    fn message_serializes_to_user_and_text() {
        let json = serde_json::to_value(ChatMessage::new("Alice", "hi")).unwrap();
        assert_eq!(json, serde_json::json!({ "user": "Alice", "text": "hi" }));
    }
}
