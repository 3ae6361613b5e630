use chrono::{DateTime, Local};

use crate::common::{ChatMessage, DisplayName, NetworkEvent};

/// A message as shown in the chat area.
#[derive(Debug, Clone)]
pub struct ChatLine {
    pub message: ChatMessage,
    pub received_at: DateTime<Local>,
}

impl ChatLine {
    /// The paragraph rendered for this line. Plain text, never markup.
    pub fn paragraph(&self) -> String {
        format!("{}: {}", self.message.user, self.message.text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Connected { socket_id: String },
    Subscribed,
    Offline { reason: String },
}

/// Everything the window renders, owned by the UI thread.
pub struct AppState {
    pub display_name: DisplayName,
    pub channel: String,
    pub messages: Vec<ChatLine>,
    pub input_text: String,
    pub status: ConnectionStatus,
    pub last_error: Option<String>,
    /// Set whenever a line is appended; the chat area consumes it.
    pub scroll_to_bottom: bool,
}

impl AppState {
    pub fn new(display_name: DisplayName, channel: impl Into<String>) -> Self {
        Self {
            display_name,
            channel: channel.into(),
            messages: Vec::new(),
            input_text: String::new(),
            status: ConnectionStatus::Connecting,
            last_error: None,
            scroll_to_bottom: false,
        }
    }

    /// Turns the current input into one outgoing message and clears the
    /// input. Blank input is left alone and produces nothing.
    pub fn take_outgoing(&mut self) -> Option<ChatMessage> {
        if self.input_text.trim().is_empty() {
            return None;
        }
        let text = std::mem::take(&mut self.input_text);
        Some(ChatMessage::new(self.display_name.as_str(), text))
    }

    pub fn push_message(&mut self, message: ChatMessage) {
        self.messages.push(ChatLine {
            message,
            received_at: Local::now(),
        });
        self.scroll_to_bottom = true;
    }

    pub fn apply_event(&mut self, event: NetworkEvent) {
        match event {
            NetworkEvent::Connected { socket_id } => {
                self.status = ConnectionStatus::Connected { socket_id };
                self.last_error = None;
            }
            NetworkEvent::Subscribed { channel } => {
                self.channel = channel;
                self.status = ConnectionStatus::Subscribed;
            }
            NetworkEvent::MessageReceived(message) => self.push_message(message),
            NetworkEvent::Disconnected { reason } => {
                self.status = ConnectionStatus::Offline { reason };
            }
            NetworkEvent::Error { message } => self.last_error = Some(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        AppState::new(DisplayName::custom("User42"), "chat-room")
    }

    #[test]
    fn sending_hello_yields_one_message_and_clears_input() {
        let mut state = state();
        state.input_text = "hello".to_string();

        let outgoing = state.take_outgoing();
        assert_eq!(outgoing, Some(ChatMessage::new("User42", "hello")));
        assert_eq!(state.input_text, "");
        assert_eq!(state.take_outgoing(), None);
    }

    #[test]
    fn blank_input_is_not_sent() {
        let mut state = state();
        state.input_text = "   ".to_string();
        assert_eq!(state.take_outgoing(), None);
        assert_eq!(state.input_text, "   ");
    }

    #[test]
    fn received_message_appends_one_paragraph_and_scrolls() {
        let mut state = state();
        state.apply_event(NetworkEvent::MessageReceived(ChatMessage::new(
            "Alice", "hi",
        )));

        assert_eq!(state.messages.len(), 1);
        let paragraph = state.messages[0].paragraph();
        assert!(paragraph.contains("Alice"));
        assert!(paragraph.contains("hi"));
        assert!(state.scroll_to_bottom);
    }

    #[test]
    fn markup_is_kept_as_literal_text() {
        let mut state = state();
        state.push_message(ChatMessage::new("Eve", "<b>bold</b>"));
        assert_eq!(state.messages[0].paragraph(), "Eve: <b>bold</b>");
    }

    #[test]
    fn connection_events_update_status() {
        let mut state = state();
        state.apply_event(NetworkEvent::Error {
            message: "boom".to_string(),
        });
        assert_eq!(state.last_error.as_deref(), Some("boom"));

        state.apply_event(NetworkEvent::Connected {
            socket_id: "1.2".to_string(),
        });
        assert_eq!(
            state.status,
            ConnectionStatus::Connected {
                socket_id: "1.2".to_string()
            }
        );
        assert_eq!(state.last_error, None);

        state.apply_event(NetworkEvent::Subscribed {
            channel: "chat-room".to_string(),
        });
        assert_eq!(state.status, ConnectionStatus::Subscribed);

        state.apply_event(NetworkEvent::Disconnected {
            reason: "gone".to_string(),
        });
        assert!(matches!(state.status, ConnectionStatus::Offline { .. }));
    }
}
