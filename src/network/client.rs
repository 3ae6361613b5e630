use std::error::Error;
use std::time::Duration;

use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::{Instant, sleep, sleep_until};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;

use crate::common::{ChatMessage, NetworkCommand, NetworkEvent};
use crate::config::ClientSettings;

use super::protocol::{self, ErrorData, ReconnectPolicy, ServerEvent};
use super::transport::{Socket, open_socket};

type SocketSink = SplitSink<Socket, Message>;

/// How a single connection ended.
#[derive(Debug)]
enum SessionEnd {
    Shutdown,
    Reconnect(ReconnectPolicy),
    Fatal(String),
}

/// Per-connection bookkeeping, reset on every reconnect.
struct Session {
    subscribed: bool,
    activity_timeout: Duration,
    awaiting_pong: bool,
}

impl Session {
    fn new() -> Self {
        Self {
            subscribed: false,
            activity_timeout: Duration::from_secs(120),
            awaiting_pong: false,
        }
    }
}

pub struct PusherClient {
    settings: ClientSettings,
    event_sender: mpsc::Sender<NetworkEvent>,
    command_receiver: mpsc::Receiver<NetworkCommand>,
}

impl PusherClient {
    pub fn new(
        settings: ClientSettings,
        event_sender: mpsc::Sender<NetworkEvent>,
        command_receiver: mpsc::Receiver<NetworkCommand>,
    ) -> Self {
        Self {
            settings,
            event_sender,
            command_receiver,
        }
    }

    pub async fn run(mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        log::info!(
            "Network loop started for channel `{}` on {}",
            self.settings.channel,
            self.settings.host
        );

        loop {
            let end = match open_socket(&self.settings).await {
                Ok(socket) => self.run_session(socket).await,
                Err(err) => {
                    log::warn!("Connection to {} failed: {err}", self.settings.host);
                    self.notify(NetworkEvent::Disconnected {
                        reason: err.to_string(),
                    });
                    SessionEnd::Reconnect(ReconnectPolicy::Backoff)
                }
            };

            match end {
                SessionEnd::Shutdown => break,
                SessionEnd::Fatal(reason) => {
                    log::error!("Service refused the connection: {reason}");
                    self.notify(NetworkEvent::Error {
                        message: reason.clone(),
                    });
                    return Err(reason.into());
                }
                SessionEnd::Reconnect(ReconnectPolicy::Immediately) => {
                    log::info!("Reconnecting immediately");
                }
                SessionEnd::Reconnect(_) => {
                    log::info!("Reconnecting in {:?}", self.settings.reconnect_delay);
                    if self.wait_before_reconnect().await {
                        break;
                    }
                }
            }
        }

        log::info!("Network loop stopped");
        Ok(())
    }

    async fn run_session(&mut self, socket: Socket) -> SessionEnd {
        let (mut sink, mut stream) = socket.split();
        let mut session = Session::new();
        let mut deadline = Instant::now() + session.activity_timeout;

        loop {
            tokio::select! {
                command = self.command_receiver.recv() => {
                    match command {
                        Some(NetworkCommand::SendMessage(message)) => {
                            if let Err(err) = self.send_chat(&mut sink, &session, message).await {
                                log::warn!("Failed to write client event: {err}");
                                return SessionEnd::Reconnect(ReconnectPolicy::Backoff);
                            }
                        }
                        Some(NetworkCommand::Shutdown) | None => {
                            self.leave(&mut sink, &session).await;
                            return SessionEnd::Shutdown;
                        }
                    }
                }
                frame = stream.next() => {
                    let result = match frame {
                        Some(Ok(Message::Text(text))) => {
                            self.handle_text(&text, &mut sink, &mut session).await.map(|_| None)
                        }
                        Some(Ok(Message::Ping(payload))) => sink
                            .send(Message::Pong(payload))
                            .await
                            .map(|_| None)
                            .map_err(|err| err.to_string()),
                        Some(Ok(Message::Close(frame))) => Ok(Some(self.closed(frame))),
                        Some(Ok(_)) => Ok(None),
                        Some(Err(err)) => Err(err.to_string()),
                        None => Err("socket closed".to_string()),
                    };

                    match result {
                        Ok(Some(end)) => return end,
                        Ok(None) => {
                            session.awaiting_pong = false;
                            deadline = Instant::now() + session.activity_timeout;
                        }
                        Err(reason) => {
                            log::warn!("Connection lost: {reason}");
                            self.notify(NetworkEvent::Disconnected { reason });
                            return SessionEnd::Reconnect(ReconnectPolicy::Backoff);
                        }
                    }
                }
                _ = sleep_until(deadline) => {
                    if session.awaiting_pong {
                        let reason = "no pong from service".to_string();
                        log::warn!("{reason}; dropping connection");
                        self.notify(NetworkEvent::Disconnected { reason });
                        return SessionEnd::Reconnect(ReconnectPolicy::Backoff);
                    }
                    log::debug!("Connection idle, sending ping");
                    if let Err(err) = sink.send(Message::Text(protocol::ping())).await {
                        log::warn!("Failed to send ping: {err}");
                        return SessionEnd::Reconnect(ReconnectPolicy::Backoff);
                    }
                    session.awaiting_pong = true;
                    deadline = Instant::now() + self.settings.pong_timeout;
                }
            }
        }
    }

    /// An `Err` means the socket can no longer be written to.
    async fn handle_text(
        &mut self,
        text: &str,
        sink: &mut SocketSink,
        session: &mut Session,
    ) -> Result<(), String> {
        let event = match protocol::decode(text) {
            Ok(event) => event,
            Err(err) => {
                log::warn!("Skipping frame: {err}");
                return Ok(());
            }
        };

        match event {
            ServerEvent::ConnectionEstablished(established) => {
                log::info!("Connected with socket id {}", established.socket_id);
                session.activity_timeout = Duration::from_secs(established.activity_timeout.max(1));
                self.notify(NetworkEvent::Connected {
                    socket_id: established.socket_id,
                });
                sink.send(Message::Text(protocol::subscribe(&self.settings.channel)))
                    .await
                    .map_err(|err| err.to_string())?;
            }
            ServerEvent::SubscriptionSucceeded { channel } => {
                if channel == self.settings.channel {
                    log::info!("Subscribed to `{channel}`");
                    session.subscribed = true;
                    self.notify(NetworkEvent::Subscribed { channel });
                }
            }
            ServerEvent::Error(error) => {
                log::warn!("Service error {:?}: {}", error.code, error.message);
                self.notify(NetworkEvent::Error {
                    message: error.message,
                });
            }
            ServerEvent::Ping => {
                sink.send(Message::Text(protocol::pong()))
                    .await
                    .map_err(|err| err.to_string())?;
            }
            ServerEvent::Pong => {}
            ServerEvent::ChannelEvent {
                channel,
                event,
                data,
            } => {
                if channel != self.settings.channel || event != self.settings.inbound_event {
                    log::debug!("Ignoring `{event}` on `{channel}`");
                    return Ok(());
                }
                match protocol::chat_message(data) {
                    Ok(message) => self.notify(NetworkEvent::MessageReceived(message)),
                    Err(err) => log::warn!("Dropping malformed `{event}` payload: {err}"),
                }
            }
        }

        Ok(())
    }

    async fn send_chat(
        &mut self,
        sink: &mut SocketSink,
        session: &Session,
        message: ChatMessage,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        if !session.subscribed {
            log::warn!("Not subscribed yet; dropping outgoing message");
            self.notify(NetworkEvent::Error {
                message: "not connected to the channel yet; message was not sent".to_string(),
            });
            return Ok(());
        }

        let frame = protocol::client_event(
            &self.settings.channel,
            &self.settings.outbound_event,
            &message,
        )?;
        sink.send(Message::Text(frame)).await?;
        Ok(())
    }

    fn closed(&self, frame: Option<CloseFrame<'static>>) -> SessionEnd {
        let error = match frame {
            Some(frame) => ErrorData {
                message: frame.reason.into_owned(),
                code: Some(u16::from(frame.code)),
            },
            None => ErrorData {
                message: "closed by service".to_string(),
                code: None,
            },
        };
        log::info!("Service closed the socket ({:?}): {}", error.code, error.message);
        self.notify(NetworkEvent::Disconnected {
            reason: error.message.clone(),
        });

        match error.reconnect_policy() {
            ReconnectPolicy::Never => SessionEnd::Fatal(error.message),
            policy => SessionEnd::Reconnect(policy),
        }
    }

    async fn leave(&mut self, sink: &mut SocketSink, session: &Session) {
        if session.subscribed {
            let _ = sink
                .send(Message::Text(protocol::unsubscribe(&self.settings.channel)))
                .await;
        }
        let _ = sink.close().await;
    }

    /// Sleeps for the reconnect delay. Returns `true` if the UI asked to
    /// shut down meanwhile.
    async fn wait_before_reconnect(&mut self) -> bool {
        let delay = sleep(self.settings.reconnect_delay);
        tokio::pin!(delay);

        loop {
            tokio::select! {
                _ = &mut delay => return false,
                command = self.command_receiver.recv() => match command {
                    Some(NetworkCommand::SendMessage(_)) => {
                        self.notify(NetworkEvent::Error {
                            message: "offline; message was not sent".to_string(),
                        });
                    }
                    Some(NetworkCommand::Shutdown) | None => return true,
                }
            }
        }
    }

    /// Never waits on the UI; a full queue must not stall the socket.
    fn notify(&self, event: NetworkEvent) {
        match self.event_sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                log::warn!("UI is not keeping up; dropping event {event:?}");
            }
            Err(TrySendError::Closed(_)) => log::debug!("UI is gone, dropping event"),
        }
    }
}
