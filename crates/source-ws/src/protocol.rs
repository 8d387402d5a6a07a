//! Frame types for the graphql-transport-ws subprotocol, reduced to the
//! subset a subscription client needs.

use herald_source::UpdateBatch;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Frames sent by the client.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage<'a> {
    /// Opens the protocol-level handshake after the socket is up.
    ConnectionInit,
    /// Starts a subscription operation.
    Subscribe {
        /// Client-chosen operation id.
        id: String,
        /// The operation to execute.
        payload: SubscribePayload<'a>,
    },
    /// Reply to a server ping.
    Pong,
}

/// The operation carried by a `subscribe` frame.
#[derive(Debug, Serialize)]
pub struct SubscribePayload<'a> {
    /// GraphQL document text.
    pub query: &'a str,
}

/// Frames received from the server. Ids and unknown fields are ignored; the
/// client runs a single operation per connection.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Handshake accepted.
    ConnectionAck,
    /// An execution result for the running operation.
    Next {
        /// The GraphQL execution result.
        payload: NextPayload,
    },
    /// The operation failed; the server will not send further results.
    Error {
        /// Raw GraphQL error payload, shape not guaranteed.
        payload: Value,
    },
    /// The operation finished normally.
    Complete,
    /// Keep-alive probe; must be answered with a pong.
    Ping,
    /// Reply to a client ping.
    Pong,
}

/// Execution result envelope of a `next` frame.
#[derive(Debug, Deserialize)]
pub struct NextPayload {
    /// The `data` member, absent on partial failures.
    #[serde(default)]
    pub data: Option<SubscriptionData>,
}

/// The single subscription field herald listens to.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionData {
    /// The update batch, if the server resolved the field.
    #[serde(default)]
    pub library_update_status_changed: Option<UpdateBatch>,
}

/// Whether a GraphQL error payload carries the server's "Unauthorized"
/// marker. The payload shape is not guaranteed (string, array of errors, or
/// object), so every nested string is checked.
pub fn mentions_unauthorized(payload: &Value) -> bool {
    match payload {
        Value::String(s) => s.contains("Unauthorized"),
        Value::Array(items) => items.iter().any(mentions_unauthorized),
        Value::Object(map) => map.values().any(mentions_unauthorized),
        _ => false,
    }
}
