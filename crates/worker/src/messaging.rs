//! Control messages and the client registry.
//!
//! Inbound: the foreground sends the worker exactly one message shape,
//! `{"type": "SKIP_WAITING"}`; anything else is ignored silently.
//! Outbound: connected clients receive lifecycle notices (a new version is
//! parked waiting, or an activated worker has taken control) over unbounded
//! channels.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

/// The one inbound message shape the worker recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ControlMessage {
    /// Promote the waiting worker now instead of waiting for tabs to close.
    #[serde(rename = "SKIP_WAITING")]
    SkipWaiting,
}

/// Parse an inbound message; unrecognized shapes yield `None`.
pub fn parse_control(value: &serde_json::Value) -> Option<ControlMessage> {
    serde_json::from_value(value.clone()).ok()
}

/// Identifier handed to a connected foreground client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(u64);

/// Notices pushed from the worker side to foreground clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientNotice {
    /// A newer worker finished installing and is parked waiting; the
    /// foreground decides whether to prompt the user and send SKIP_WAITING.
    UpdateReady { version: String },
    /// An activated worker took control of all clients.
    ControllerChange { version: String },
}

/// Registry of connected foreground clients.
#[derive(Debug, Default)]
pub struct Clients {
    next_id: AtomicU64,
    inner: Mutex<HashMap<u64, UnboundedSender<ClientNotice>>>,
}

impl Clients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect a client; notices arrive on the returned receiver.
    pub async fn connect(&self) -> (ClientId, UnboundedReceiver<ClientNotice>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = unbounded_channel();
        self.inner.lock().await.insert(id, tx);
        (ClientId(id), rx)
    }

    pub async fn disconnect(&self, id: ClientId) {
        self.inner.lock().await.remove(&id.0);
    }

    /// Send a notice to every connected client, pruning the gone ones.
    pub async fn broadcast(&self, notice: ClientNotice) {
        let mut clients = self.inner.lock().await;
        clients.retain(|_, tx| tx.send(notice.clone()).is_ok());
    }

    pub async fn count(&self) -> usize {
        self.inner.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_skip_waiting() {
        let msg = parse_control(&json!({"type": "SKIP_WAITING"}));
        assert_eq!(msg, Some(ControlMessage::SkipWaiting));
    }

    #[test]
    fn test_unknown_type_ignored() {
        assert_eq!(parse_control(&json!({"type": "REFRESH_NOW"})), None);
    }

    #[test]
    fn test_malformed_shapes_ignored() {
        assert_eq!(parse_control(&json!({"kind": "SKIP_WAITING"})), None);
        assert_eq!(parse_control(&json!("SKIP_WAITING")), None);
        assert_eq!(parse_control(&json!(null)), None);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_all_clients() {
        let clients = Clients::new();
        let (_a, mut rx_a) = clients.connect().await;
        let (_b, mut rx_b) = clients.connect().await;

        clients
            .broadcast(ClientNotice::UpdateReady { version: "v2".into() })
            .await;

        assert_eq!(rx_a.try_recv().unwrap(), ClientNotice::UpdateReady { version: "v2".into() });
        assert_eq!(rx_b.try_recv().unwrap(), ClientNotice::UpdateReady { version: "v2".into() });
    }

    #[tokio::test]
    async fn test_dropped_receiver_is_pruned() {
        let clients = Clients::new();
        let (_a, rx_a) = clients.connect().await;
        let (_b, _rx_b) = clients.connect().await;
        drop(rx_a);

        clients
            .broadcast(ClientNotice::ControllerChange { version: "v1".into() })
            .await;

        assert_eq!(clients.count().await, 1);
    }

    #[tokio::test]
    async fn test_disconnect() {
        let clients = Clients::new();
        let (id, _rx) = clients.connect().await;
        clients.disconnect(id).await;
        assert_eq!(clients.count().await, 0);
    }
}
