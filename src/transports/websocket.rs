//! WebSocket connections to relay servers, via `tokio-tungstenite`.
//!
//! The name server hands out a master address and the master hands out game
//! server addresses; [`WebSocketConnector`] treats every one of them as a
//! `ws://` or `wss://` URL and opens a [`WebSocketTransport`] to it.
//!
//! Only available with the `transport-websocket` feature (on by default).
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), relay_lobby_client::LobbyError> {
//! use relay_lobby_client::{Connector, WebSocketConnector};
//!
//! let connector = WebSocketConnector::new();
//! let mut name_server = connector.connect("wss://ns.example.com").await?;
//! name_server.send(r#"{"type":"JoinLobby"}"#.to_string()).await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::protocol::Message;

use crate::error::LobbyError;
use crate::transport::{Connector, Transport};

/// How long [`WebSocketConnector`] waits for a handshake by default.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// The stream type a [`WebSocketTransport`] wraps.
pub type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

fn handshake_error(address: &str, e: tokio_tungstenite::tungstenite::Error) -> LobbyError {
    let kind = match &e {
        tokio_tungstenite::tungstenite::Error::Io(io) => io.kind(),
        _ => std::io::ErrorKind::Other,
    };
    tracing::debug!(%address, error = %e, "relay handshake failed");
    LobbyError::Io(std::io::Error::new(kind, e))
}

/// One WebSocket connection to a name, master or game server.
///
/// Relay messages travel as text frames. Game servers that frame JSON as
/// binary are accepted too, as long as the payload is UTF-8.
///
/// [`recv`](Transport::recv) is cancel-safe.
#[derive(Debug)]
pub struct WebSocketTransport {
    stream: WsStream,
    address: String,
    closed: bool,
}

impl WebSocketTransport {
    /// Open a connection to `address`.
    ///
    /// # Errors
    ///
    /// [`LobbyError::Io`] if the URL is malformed or the handshake fails. The
    /// I/O [`ErrorKind`](std::io::ErrorKind) is kept when there is one.
    pub async fn open(address: &str) -> Result<Self, LobbyError> {
        let (stream, _response) = tokio_tungstenite::connect_async(address)
            .await
            .map_err(|e| handshake_error(address, e))?;
        tracing::debug!(%address, "relay socket open");
        Ok(Self::from_stream(address, stream))
    }

    /// Like [`open`](Self::open), giving up after `timeout`.
    ///
    /// # Errors
    ///
    /// [`LobbyError::Timeout`] when the deadline passes first.
    pub async fn open_within(address: &str, timeout: Duration) -> Result<Self, LobbyError> {
        tokio::time::timeout(timeout, Self::open(address))
            .await
            .map_err(|_| LobbyError::Timeout)?
    }

    /// Wrap a stream set up elsewhere (custom TLS, proxies, extra headers).
    pub fn from_stream(address: impl Into<String>, stream: WsStream) -> Self {
        Self {
            stream,
            address: address.into(),
            closed: false,
        }
    }

    /// The server this transport talks to.
    pub fn address(&self) -> &str {
        &self.address
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn send(&mut self, message: String) -> Result<(), LobbyError> {
        if self.closed {
            return Err(LobbyError::TransportClosed);
        }
        self.stream
            .send(Message::Text(message.into()))
            .await
            .map_err(|e| LobbyError::TransportSend(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<String, LobbyError>> {
        while let Some(frame) = self.stream.next().await {
            match frame {
                Ok(Message::Text(text)) => return Some(Ok(text.to_string())),
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => return Some(Ok(text)),
                    Err(_) => {
                        tracing::warn!(address = %self.address, "dropping non-UTF-8 binary frame");
                    }
                },
                Ok(Message::Close(reason)) => {
                    tracing::debug!(address = %self.address, ?reason, "server closed the socket");
                    return None;
                }
                // Control frames are answered by tungstenite.
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {}
                Err(e) => return Some(Err(LobbyError::TransportReceive(e.to_string()))),
            }
        }
        None
    }

    async fn close(&mut self) -> Result<(), LobbyError> {
        if std::mem::replace(&mut self.closed, true) {
            return Ok(());
        }
        self.stream
            .close(None)
            .await
            .map_err(|e| LobbyError::TransportSend(e.to_string()))
    }
}

/// Opens a [`WebSocketTransport`] for each relay server address.
#[derive(Debug, Clone, Copy)]
pub struct WebSocketConnector {
    timeout: Duration,
}

impl WebSocketConnector {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }

    /// Per-server handshake timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for WebSocketConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self, address: &str) -> Result<Box<dyn Transport>, LobbyError> {
        let transport = WebSocketTransport::open_within(address, self.timeout).await?;
        Ok(Box::new(transport))
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    type ServerSocket = tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>;

    /// Accept one relay connection on a random local port and hand it to
    /// `server`.
    async fn fake_relay<F, Fut>(server: F) -> String
    where
        F: FnOnce(ServerSocket) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            server(tokio_tungstenite::accept_async(tcp).await.unwrap()).await;
        });
        format!("ws://{addr}")
    }

    #[test]
    fn transport_can_move_into_the_relay_task() {
        fn assert_send<T: Send + std::fmt::Debug>() {}
        assert_send::<WebSocketTransport>();
    }

    #[tokio::test]
    async fn malformed_address_is_an_io_error() {
        let err = WebSocketTransport::open("master-eu").await.unwrap_err();
        assert!(matches!(err, LobbyError::Io(_)));
    }

    #[tokio::test]
    async fn unreachable_server_is_an_io_error() {
        let err = WebSocketTransport::open("ws://127.0.0.1:1")
            .await
            .unwrap_err();
        assert!(matches!(err, LobbyError::Io(_)));
    }

    #[tokio::test]
    async fn name_server_exchange() {
        let url = fake_relay(|mut ws| async move {
            let Some(Ok(Message::Text(_auth))) = ws.next().await else {
                panic!("expected Authenticate");
            };
            ws.send(Message::Text(
                r#"{"type":"MasterAddress","data":{"address":"ws://master"}}"#.into(),
            ))
            .await
            .unwrap();
            ws.close(None).await.unwrap();
        })
        .await;

        let mut transport = WebSocketConnector::new().connect(&url).await.unwrap();
        transport
            .send(r#"{"type":"Authenticate"}"#.to_string())
            .await
            .unwrap();
        let reply = transport.recv().await.unwrap().unwrap();
        assert!(reply.contains("MasterAddress"));
        assert!(transport.recv().await.is_none());
    }

    #[tokio::test]
    async fn binary_json_is_accepted_and_garbage_skipped() {
        let url = fake_relay(|mut ws| async move {
            ws.send(Message::Binary(vec![0xff, 0xfe].into()))
                .await
                .unwrap();
            ws.send(Message::Binary(br#"{"type":"LobbyJoined"}"#.to_vec().into()))
                .await
                .unwrap();
            ws.close(None).await.unwrap();
        })
        .await;

        let mut transport = WebSocketTransport::open(&url).await.unwrap();
        assert_eq!(transport.address(), url);
        let msg = transport.recv().await.unwrap().unwrap();
        assert_eq!(msg, r#"{"type":"LobbyJoined"}"#);
    }

    #[tokio::test]
    async fn closing_twice_then_sending_fails() {
        let url = fake_relay(|mut ws| async move { while let Some(Ok(_)) = ws.next().await {} })
            .await;

        let mut transport = WebSocketTransport::open(&url).await.unwrap();
        transport.close().await.unwrap();
        transport.close().await.unwrap();
        let err = transport.send("{}".to_string()).await.unwrap_err();
        assert!(matches!(err, LobbyError::TransportClosed));
        assert!(!matches!(transport.recv().await, Some(Ok(_))));
    }

    #[tokio::test]
    async fn wrapped_stream_reports_its_address() {
        let url = fake_relay(|mut ws| async move {
            ws.send(Message::Text(r#"{"type":"LobbyJoined"}"#.into()))
                .await
                .unwrap();
        })
        .await;

        let (stream, _) = tokio_tungstenite::connect_async(&url).await.unwrap();
        let mut transport = WebSocketTransport::from_stream("gs-1", stream);
        assert_eq!(transport.address(), "gs-1");
        assert!(transport.recv().await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn connector_gives_up_after_timeout() {
        let connector = WebSocketConnector::new().with_timeout(Duration::from_millis(50));
        match connector.connect("ws://192.0.2.1:1").await {
            Err(LobbyError::Timeout) => {}
            Err(other) => panic!("expected Timeout, got {other:?}"),
            Ok(_) => panic!("connected to a non-routable address"),
        }
    }
}
