use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use super::{Connector, Transport};
use crate::error::{ProtocolError, TransportError};
use crate::protocol::{ClientMessage, ServerMessage, TransportEvent};

/// JSON text frames over a WebSocket.
pub struct WsTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    closed: bool,
}

impl WsTransport {
    pub async fn connect(url: &str) -> Result<Self, TransportError> {
        let (stream, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        info!("Connected to {url}");
        Ok(Self {
            stream,
            closed: false,
        })
    }
}

impl Transport for WsTransport {
    async fn send(&mut self, message: ClientMessage) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        let frame = message.encode()?;
        debug!("-> {}", message.event_name());
        self.stream
            .send(Message::Text(frame.into()))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn recv(&mut self) -> TransportEvent {
        if self.closed {
            return TransportEvent::Disconnected;
        }
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => match ServerMessage::decode(text.as_str()) {
                    Ok(message) => return TransportEvent::Message(message),
                    Err(e) => warn!("Dropping frame: {e}"),
                },
                Some(Ok(Message::Binary(data))) => {
                    warn!("Dropping frame: {}", ProtocolError::BinaryFrame(data.len()));
                }
                Some(Ok(Message::Close(_))) | None => {
                    self.closed = true;
                    return TransportEvent::Disconnected;
                }
                // Ping/pong are answered by tungstenite itself
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("WebSocket error: {e}");
                    self.closed = true;
                    return TransportEvent::Disconnected;
                }
            }
        }
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            if let Err(e) = self.stream.close(None).await {
                debug!("Close handshake failed: {e}");
            }
        }
    }
}

/// Dials the configured server URL.
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Connector for WsConnector {
    type Transport = WsTransport;

    async fn connect(&mut self) -> Result<WsTransport, TransportError> {
        WsTransport::connect(&self.url).await
    }
}
