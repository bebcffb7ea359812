//! WebSocket signaling connection
//!
//! The read half is handed to the relay loop as a stream; the write half is
//! owned by a sender task fed through an unbounded channel, so any part of the
//! session can queue outbound frames without holding the socket.

use crate::{Error, Result};
use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{Sink, SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info};

/// Client WebSocket stream
pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Read half of the signaling connection
pub type WsReader = SplitStream<WsStream>;

/// Write half of the signaling connection
pub type WsWriter = SplitSink<WsStream, Message>;

/// Outbound side of the signaling channel
#[async_trait]
pub trait SignalSink: Send + Sync {
    /// Send one text frame
    async fn send_text(&self, text: String) -> Result<()>;

    /// Ask the remote end to close the connection
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Handle for queuing frames onto the signaling WebSocket
#[derive(Clone, Debug)]
pub struct SignalingSender {
    tx: mpsc::UnboundedSender<Message>,
}

impl SignalingSender {
    /// Spawn the sender task over a WebSocket write half
    pub fn spawn<W>(write: W) -> (Self, JoinHandle<()>)
    where
        W: Sink<Message, Error = tungstenite::Error> + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(Self::sender_task(write, rx));
        (Self { tx }, handle)
    }

    /// Sender task: sends messages from channel to WebSocket
    async fn sender_task<W>(mut write: W, mut rx: mpsc::UnboundedReceiver<Message>)
    where
        W: Sink<Message, Error = tungstenite::Error> + Unpin,
    {
        while let Some(msg) = rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if let Err(e) = write.send(msg).await {
                error!("Failed to send WebSocket message: {}", e);
                break;
            }
            if closing {
                break;
            }
        }

        debug!("Sender task terminated");
    }

    fn queue(&self, msg: Message) -> Result<()> {
        self.tx
            .send(msg)
            .map_err(|e| Error::SignalingError(format!("Failed to send message: {}", e)))
    }
}

#[async_trait]
impl SignalSink for SignalingSender {
    async fn send_text(&self, text: String) -> Result<()> {
        debug!("Sending signaling message: {} bytes", text.len());
        self.queue(Message::Text(text))
    }

    async fn close(&self) -> Result<()> {
        self.queue(Message::Close(None))
    }
}

/// Connect to the signaling server
///
/// Returns the outbound sender (with its task already running) and the read
/// half for the relay loop.
pub async fn connect(url: &str) -> Result<(SignalingSender, WsReader)> {
    info!("Connecting to signaling server: {}", url);

    let (ws_stream, _) = connect_async(url)
        .await
        .map_err(|e| Error::WebSocketError(format!("Failed to connect: {}", e)))?;

    info!("Connected to signaling server");

    let (write, read) = ws_stream.split();
    let (sender, _task) = SignalingSender::spawn(write);

    Ok((sender, read))
}

/// Frame-level view of what arrived on the signaling socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// Text payload to interpret as a signaling message
    Text(String),
    /// Remote end closed the connection
    Close,
}

/// Reduce a WebSocket message to the frames the relay loop cares about
///
/// Binary frames are decoded as UTF-8. Ping, pong and raw frames yield
/// `None`; the WebSocket library answers pings itself.
pub fn classify(msg: Message) -> Result<Option<InboundFrame>> {
    match msg {
        Message::Text(text) => Ok(Some(InboundFrame::Text(text))),
        Message::Binary(data) => String::from_utf8(data)
            .map(|text| Some(InboundFrame::Text(text)))
            .map_err(|e| Error::InvalidMessage(format!("Binary frame is not UTF-8: {}", e))),
        Message::Close(frame) => {
            debug!("Close frame received: {:?}", frame);
            Ok(Some(InboundFrame::Close))
        }
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => Ok(None),
    }
}
