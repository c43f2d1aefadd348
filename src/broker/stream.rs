use super::{Broker, BrokerError, BrokerHub};
use crate::protocol::{CodecError, Command, JsonLineReader, JsonLineWriter};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Broker speaking newline-delimited JSON over a byte stream, e.g. a TCP
/// bridge to the game's websocket.
pub struct StreamBroker<W> {
    hub: Arc<BrokerHub>,
    writer: Mutex<JsonLineWriter<W>>,
    connected: Arc<AtomicBool>,
}

impl StreamBroker<OwnedWriteHalf> {
    pub async fn connect<A: ToSocketAddrs>(
        addr: A,
    ) -> Result<(Arc<Self>, InboundPump<OwnedReadHalf>), BrokerError> {
        let stream = TcpStream::connect(addr).await?;
        let (reader, writer) = stream.into_split();
        Ok(Self::new(reader, writer))
    }
}

impl<W: AsyncWrite + Unpin + Send + 'static> StreamBroker<W> {
    /// Wrap a stream pair. Nothing is read until the returned pump is
    /// spawned, so subscribers taken before that see the first line.
    pub fn new<R>(reader: R, writer: W) -> (Arc<Self>, InboundPump<R>)
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let hub = Arc::new(BrokerHub::new());
        let connected = Arc::new(AtomicBool::new(true));

        let pump = InboundPump {
            reader: JsonLineReader::new(reader),
            hub: hub.clone(),
            connected: connected.clone(),
        };

        let broker = Arc::new(Self {
            hub,
            writer: Mutex::new(JsonLineWriter::new(writer)),
            connected,
        });
        (broker, pump)
    }
}

/// Reader half of a [`StreamBroker`], publishing inbound lines to its subscribers.
pub struct InboundPump<R> {
    reader: JsonLineReader<R>,
    hub: Arc<BrokerHub>,
    connected: Arc<AtomicBool>,
}

impl<R: AsyncRead + Unpin + Send + 'static> InboundPump<R> {
    /// Start reading. The task ends when the stream closes or fails, leaving
    /// the broker disconnected.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        loop {
            match self.reader.read_message().await {
                Ok(Some(message)) => {
                    self.hub.publish_inbound(message);
                }
                Ok(None) => {
                    info!("Broker stream closed");
                    break;
                }
                Err(CodecError::Json(e)) => {
                    // Unparseable lines are ignored, like any other foreign payload
                    debug!("Skipping malformed inbound line: {}", e);
                }
                Err(CodecError::Io(e)) => {
                    error!("Broker read error: {}", e);
                    break;
                }
            }
        }
        self.connected.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send + 'static> Broker for StreamBroker<W> {
    async fn send(&self, command: &Command) -> bool {
        if !self.is_connected() {
            debug!("Dropping {:?}: not connected", command);
            return false;
        }

        let mut writer = self.writer.lock().await;
        match writer.write_message(command).await {
            Ok(()) => {
                self.hub.publish_outbound(*command);
                true
            }
            Err(e) => {
                warn!("Failed to send {:?}: {}", command, e);
                self.connected.store(false, Ordering::SeqCst);
                false
            }
        }
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
