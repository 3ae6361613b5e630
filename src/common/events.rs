use crate::common::types::ChatMessage;

/// Events the network task reports up to the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkEvent {
    Connected { socket_id: String },
    Subscribed { channel: String },
    MessageReceived(ChatMessage),
    Disconnected { reason: String },
    Error { message: String },
}
