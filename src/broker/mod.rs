//! Boundary to the external event broker that carries room snapshots in and
//! navigation commands out.

pub mod channel;
pub mod stream;

pub use channel::*;
pub use stream::*;

use crate::protocol::Command;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

const HUB_CAPACITY: usize = 256;

#[async_trait]
pub trait Broker: Send + Sync {
    /// Deliver a command. Returns false when it was dropped; callers do not retry.
    async fn send(&self, command: &Command) -> bool;

    fn is_connected(&self) -> bool;

    /// Inbound state snapshots, as raw JSON objects.
    fn subscribe(&self) -> broadcast::Receiver<Value>;

    /// Commands that went out through this broker, from any sender.
    fn subscribe_outbound(&self) -> broadcast::Receiver<Command>;
}

/// Fan-out shared by broker implementations.
pub(crate) struct BrokerHub {
    inbound: broadcast::Sender<Value>,
    outbound: broadcast::Sender<Command>,
}

impl BrokerHub {
    pub(crate) fn new() -> Self {
        let (inbound, _) = broadcast::channel(HUB_CAPACITY);
        let (outbound, _) = broadcast::channel(HUB_CAPACITY);
        Self { inbound, outbound }
    }

    /// Returns the number of subscribers that received the message.
    pub(crate) fn publish_inbound(&self, message: Value) -> usize {
        self.inbound.send(message).unwrap_or(0)
    }

    pub(crate) fn publish_outbound(&self, command: Command) {
        let _ = self.outbound.send(command);
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<Value> {
        self.inbound.subscribe()
    }

    pub(crate) fn subscribe_outbound(&self) -> broadcast::Receiver<Command> {
        self.outbound.subscribe()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("Connection failed: {0}")]
    Connect(#[from] std::io::Error),
}
