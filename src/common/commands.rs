use crate::common::types::ChatMessage;

/// Commands the UI sends down to the network task.
#[derive(Debug, Clone)]
pub enum NetworkCommand {
    /// Publish a message as a client-triggered event on the channel.
    SendMessage(ChatMessage),
    /// The window is closing; leave the channel and stop reconnecting.
    Shutdown,
}
