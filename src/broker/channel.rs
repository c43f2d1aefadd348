use super::{Broker, BrokerHub};
use crate::protocol::Command;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;
use tracing::debug;

/// In-process broker. Commands are published to outbound subscribers, and
/// whatever sits on the other side feeds snapshots back with [`deliver`].
///
/// [`deliver`]: ChannelBroker::deliver
pub struct ChannelBroker {
    hub: BrokerHub,
    connected: AtomicBool,
}

impl ChannelBroker {
    pub fn new() -> Self {
        Self {
            hub: BrokerHub::new(),
            connected: AtomicBool::new(true),
        }
    }

    /// Push an inbound snapshot to all subscribers.
    pub fn deliver(&self, message: Value) -> usize {
        self.hub.publish_inbound(message)
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }
}

impl Default for ChannelBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Broker for ChannelBroker {
    async fn send(&self, command: &Command) -> bool {
        if !self.is_connected() {
            debug!("Dropping {:?}: not connected", command);
            return false;
        }
        self.hub.publish_outbound(*command);
        true
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn subscribe(&self) -> broadcast::Receiver<Value> {
        self.hub.subscribe()
    }

    fn subscribe_outbound(&self) -> broadcast::Receiver<Command> {
        self.hub.subscribe_outbound()
    }
}
