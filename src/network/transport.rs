use std::error::Error;

use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::config::ClientSettings;

use super::protocol::PROTOCOL_VERSION;

pub type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

const CLIENT_NAME: &str = "epg_chat";

pub fn socket_url(settings: &ClientSettings) -> String {
    let scheme = if settings.use_tls { "wss" } else { "ws" };
    format!(
        "{scheme}://{host}/app/{key}?protocol={PROTOCOL_VERSION}&client={CLIENT_NAME}&version={version}&flash=false",
        host = settings.host,
        key = settings.app_key,
        version = env!("CARGO_PKG_VERSION"),
    )
}

pub async fn open_socket(settings: &ClientSettings) -> Result<Socket, Box<dyn Error + Send + Sync>> {
    let url = socket_url(settings);
    log::debug!("Opening socket {url}");
    let (socket, response) = connect_async(url).await?;
    log::debug!("Socket handshake finished with status {}", response.status());
    Ok(socket)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn url_contains_key_protocol_and_scheme() {
        let mut settings = ClientSettings {
            app_key: "abc".to_string(),
            host: "ws-eu.pusher.com".to_string(),
            use_tls: true,
            channel: "chat-room".to_string(),
            inbound_event: "new-message".to_string(),
            outbound_event: "client-new-message".to_string(),
            reconnect_delay: Duration::from_secs(1),
            pong_timeout: Duration::from_secs(1),
        };
        let url = socket_url(&settings);
        assert!(url.starts_with("wss://ws-eu.pusher.com/app/abc?protocol=7&client=epg_chat"));
        assert!(url.ends_with("&flash=false"));

        settings.use_tls = false;
        settings.host = "127.0.0.1:6001".to_string();
        assert!(socket_url(&settings).starts_with("ws://127.0.0.1:6001/app/abc?"));
    }
}
