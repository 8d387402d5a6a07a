//! GraphQL-subscription implementation of the update source, speaking the
//! graphql-transport-ws subprotocol over a WebSocket connection.
//!
//! The bearer token is attached to the HTTP upgrade request; the server's
//! own 401 handling therefore rejects stale credentials at the handshake,
//! which surfaces as an unauthorized source error.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;
mod protocol;

pub use error::{Error, Result};

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use herald_source::{UpdateSource, UpdateStream};
use protocol::{ClientMessage, ServerMessage, SubscribePayload};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::{AUTHORIZATION, SEC_WEBSOCKET_PROTOCOL};
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

static SUBSCRIPTION_QUERY: &str = "\
subscription Updates {
  libraryUpdateStatusChanged(input: {}) {
    mangaUpdates {
      status
      manga {
        id
        title
        thumbnailUrl
        source {
          name
          lang
        }
        latestFetchedChapter {
          id
          chapterNumber
          name
          uploadDate
        }
      }
    }
  }
}";

const ACK_TIMEOUT: Duration = Duration::from_secs(30);

/// Update source subscribing to a library server's GraphQL endpoint.
#[derive(Clone, Debug)]
pub struct WsUpdateSource {
    endpoint: Url,
}

impl WsUpdateSource {
    /// Creates a new source for the given `ws://` or `wss://` endpoint.
    #[must_use]
    pub const fn new(endpoint: Url) -> Self {
        Self { endpoint }
    }
}

#[async_trait]
impl UpdateSource for WsUpdateSource {
    type Error = Error;

    async fn subscribe(
        &self,
        bearer_token: Option<&str>,
    ) -> Result<UpdateStream<Self::Error>> {
        let mut request = self.endpoint.as_str().into_client_request()?;
        request.headers_mut().insert(
            SEC_WEBSOCKET_PROTOCOL,
            HeaderValue::from_static("graphql-transport-ws"),
        );
        if let Some(token) = bearer_token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| Error::InvalidToken)?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }

        debug!("connecting to {}", self.endpoint);
        let (mut ws, _response) = connect_async(request).await?;

        send_frame(&mut ws, &ClientMessage::ConnectionInit).await?;
        wait_for_ack(&mut ws).await?;

        let operation_id = Uuid::new_v4().to_string();
        send_frame(
            &mut ws,
            &ClientMessage::Subscribe {
                id: operation_id,
                payload: SubscribePayload {
                    query: SUBSCRIPTION_QUERY,
                },
            },
        )
        .await?;

        info!("subscription open on {}", self.endpoint);

        let stream = async_stream::stream! {
            loop {
                let message = match ws.next().await {
                    Some(Ok(message)) => message,
                    Some(Err(e)) => {
                        yield Err(Error::WebSocket(e));
                        return;
                    }
                    None => return,
                };

                let text = match message {
                    Message::Text(text) => text,
                    Message::Close(frame) => {
                        debug!("server closed connection: {:?}", frame);
                        return;
                    }
                    // Transport-level pings are answered by tungstenite.
                    _ => continue,
                };

                let frame: ServerMessage = match serde_json::from_str(text.as_str()) {
                    Ok(frame) => frame,
                    Err(e) => {
                        yield Err(Error::Malformed(e));
                        return;
                    }
                };

                match frame {
                    ServerMessage::Next { payload } => {
                        if let Some(batch) = payload
                            .data
                            .and_then(|data| data.library_update_status_changed)
                        {
                            yield Ok(batch);
                        }
                    }
                    ServerMessage::Error { payload } => {
                        yield Err(Error::subscription(&payload));
                        return;
                    }
                    ServerMessage::Complete => {
                        info!("subscription completed by server");
                        return;
                    }
                    ServerMessage::Ping => {
                        if let Err(e) = send_frame(&mut ws, &ClientMessage::Pong).await {
                            warn!("failed to answer ping: {e}");
                            yield Err(e);
                            return;
                        }
                    }
                    ServerMessage::ConnectionAck | ServerMessage::Pong => {}
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

async fn send_frame(ws: &mut WsStream, frame: &ClientMessage<'_>) -> Result<()> {
    let text = serde_json::to_string(frame)?;
    ws.send(Message::text(text)).await?;
    Ok(())
}

/// Drains frames until the server acknowledges the protocol handshake.
async fn wait_for_ack(ws: &mut WsStream) -> Result<()> {
    let ack = tokio::time::timeout(ACK_TIMEOUT, async {
        while let Some(message) = ws.next().await {
            let text = match message? {
                Message::Text(text) => text,
                Message::Close(_) => return Err(Error::HandshakeClosed),
                _ => continue,
            };

            match serde_json::from_str(text.as_str())? {
                ServerMessage::ConnectionAck => return Ok(()),
                ServerMessage::Ping => send_frame(ws, &ClientMessage::Pong).await?,
                frame => debug!("ignoring pre-ack frame: {:?}", frame),
            }
        }

        Err(Error::HandshakeClosed)
    })
    .await;

    match ack {
        Ok(result) => result,
        Err(_) => Err(Error::AckTimeout),
    }
}
