//! The relay loop
//!
//! Reads the signaling socket and the session event channel in one
//! `select!`, so signaling messages and library callbacks are handled one at a
//! time and never race on session state.

use super::events::{self, EventReceiver, SessionEvent};
use super::negotiation::Negotiation;
use crate::config::RelayClientConfig;
use crate::peer::{ChannelId, DataChannelHandle, Negotiator, RtcPeer};
use crate::signaling::{
    classify, connection, InboundFrame, InboundMessage, OutboundMessage, RemoteCandidate,
    SignalSink,
};
use crate::{Error, Result};
use futures::{Stream, StreamExt};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, error, info, instrument, warn};

/// One signaling connection driving one peer connection
pub struct RelaySession {
    id: String,
    config: RelayClientConfig,
    negotiator: Arc<dyn Negotiator>,
    sink: Arc<dyn SignalSink>,
    events: EventReceiver,
    negotiation: Negotiation,
    channels: HashMap<ChannelId, Arc<dyn DataChannelHandle>>,
}

impl RelaySession {
    /// Create a session
    ///
    /// # Arguments
    ///
    /// * `id` - Session identifier used in log fields
    /// * `config` - Framing, greetings and error policy
    /// * `negotiator` - The peer connection
    /// * `sink` - Outbound side of the signaling connection
    /// * `events` - Receiver for events raised by the peer connection
    pub fn new(
        id: String,
        config: RelayClientConfig,
        negotiator: Arc<dyn Negotiator>,
        sink: Arc<dyn SignalSink>,
        events: EventReceiver,
    ) -> Self {
        Self {
            id,
            config,
            negotiator,
            sink,
            events,
            negotiation: Negotiation::new(),
            channels: HashMap::new(),
        }
    }

    /// Get the session ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current offer/answer state
    pub fn negotiation(&self) -> &Negotiation {
        &self.negotiation
    }

    /// Run until the signaling connection closes, a fatal error occurs, or
    /// `shutdown` resolves
    ///
    /// The peer connection is closed on every exit path.
    #[instrument(skip_all, fields(session_id = %self.id))]
    pub async fn run<R, F>(mut self, reader: R, shutdown: F) -> Result<()>
    where
        R: Stream<Item = std::result::Result<Message, tungstenite::Error>> + Unpin,
        F: Future<Output = ()>,
    {
        let outcome = self.drive(reader, shutdown).await;

        if let Err(e) = self.negotiator.close().await {
            warn!("Failed to close peer connection: {}", e);
        }

        match &outcome {
            Ok(()) => info!("Relay session finished"),
            Err(e) => error!(kind = ?e.kind(), "Relay session failed: {}", e),
        }

        outcome
    }

    async fn drive<R, F>(&mut self, mut reader: R, shutdown: F) -> Result<()>
    where
        R: Stream<Item = std::result::Result<Message, tungstenite::Error>> + Unpin,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, closing signaling connection");
                    if let Err(e) = self.sink.close().await {
                        debug!("Signaling close failed: {}", e);
                    }
                    return Ok(());
                }
                frame = reader.next() => {
                    let Some(frame) = frame else {
                        info!("Signaling stream ended");
                        return Ok(());
                    };
                    let msg = frame
                        .map_err(|e| Error::WebSocketError(format!("Read failed: {}", e)))?;

                    match classify(msg)? {
                        Some(InboundFrame::Text(text)) => {
                            let result = self.handle_signal(&text).await;
                            self.apply_policy(result)?;
                        }
                        Some(InboundFrame::Close) => {
                            info!("WebSocket connection closed");
                            return Ok(());
                        }
                        None => {}
                    }
                }
                Some(event) = self.events.recv() => {
                    let result = self.handle_event(event).await;
                    self.apply_policy(result)?;
                }
            }
        }
    }

    /// Downgrade non-fatal errors to warnings
    fn apply_policy(&self, result: Result<()>) -> Result<()> {
        match result {
            Err(e) if !e.is_fatal(self.config.fail_on_negotiation_error) => {
                warn!(kind = ?e.kind(), "Continuing after failure: {}", e);
                Ok(())
            }
            other => other,
        }
    }

    async fn handle_signal(&mut self, text: &str) -> Result<()> {
        debug!("Received signaling message: {}", text);

        match InboundMessage::parse(text)? {
            InboundMessage::Offer { sdp } => self.handle_offer(sdp).await,
            InboundMessage::Candidate(candidate) => self.handle_remote_candidate(candidate).await,
            InboundMessage::Unrecognized(value) => {
                warn!(
                    "Ignoring signaling message with neither 'sdp' nor 'candidate': {}",
                    value
                );
                Ok(())
            }
        }
    }

    async fn handle_offer(&mut self, sdp: String) -> Result<()> {
        info!("Processing SDP offer ({} bytes)", sdp.len());

        self.negotiation.begin_offer()?;

        let answer = match self.negotiator.accept_offer(sdp).await {
            Ok(answer) => answer,
            Err(e) => {
                self.negotiation.abort_offer();
                return Err(e);
            }
        };

        self.send(OutboundMessage::Answer(answer)).await?;
        self.negotiation.complete_answer()?;
        info!("Sent SDP answer");

        self.flush_pending_candidates().await
    }

    async fn handle_remote_candidate(&mut self, candidate: RemoteCandidate) -> Result<()> {
        let line = candidate.line()?;
        debug!(
            kind = %line.kind,
            address = %line.address,
            port = line.port,
            mline = candidate.sdp_mline_index,
            "Processing ICE candidate"
        );

        if !self.negotiation.has_remote_description() {
            debug!("No remote description yet, queuing candidate");
            self.negotiation.queue_candidate(candidate);
            return Ok(());
        }

        self.add_candidate(&candidate).await
    }

    async fn flush_pending_candidates(&mut self) -> Result<()> {
        let pending = self.negotiation.take_pending();
        if !pending.is_empty() {
            debug!("Applying {} queued ICE candidates", pending.len());
        }

        for candidate in pending {
            let result = self.add_candidate(&candidate).await;
            self.apply_policy(result)?;
        }

        Ok(())
    }

    async fn add_candidate(&self, candidate: &RemoteCandidate) -> Result<()> {
        self.negotiator
            .add_remote_candidate(candidate.to_init())
            .await?;
        info!("Added ICE candidate");
        Ok(())
    }

    async fn handle_event(&mut self, event: SessionEvent) -> Result<()> {
        match event {
            SessionEvent::LocalCandidate(init) => {
                self.send(OutboundMessage::Candidate(init)).await?;
                info!("Sent ICE candidate");
            }
            SessionEvent::GatheringComplete => info!("ICE gathering complete"),
            SessionEvent::PeerStateChanged(state) => {
                info!(state = %state, "Peer connection state changed");
            }
            SessionEvent::ChannelCreated(channel) => {
                info!("Data channel '{}' created", channel.label());
                self.channels.insert(channel.id(), Arc::clone(&channel));

                if let Some(greeting) = &self.config.greetings.on_create {
                    channel.send_greeting(greeting).await?;
                }
            }
            SessionEvent::ChannelOpened(id) => {
                let Some(channel) = self.channels.get(&id).cloned() else {
                    warn!("Open reported for unknown data channel {}", id);
                    return Ok(());
                };
                info!("Data channel '{}' is open", channel.label());

                if let Some(greeting) = &self.config.greetings.on_open {
                    channel.send_greeting(greeting).await?;
                }
            }
            SessionEvent::ChannelMessage { id, payload } => {
                info!(channel = %id, "Received message: {}", payload);
            }
            SessionEvent::ChannelClosed(id) => match self.channels.remove(&id) {
                Some(channel) => info!("Data channel '{}' closed", channel.label()),
                None => debug!("Close reported for unknown data channel {}", id),
            },
            SessionEvent::ChannelError { id, message } => {
                warn!(channel = %id, "Data channel error: {}", message);
            }
        }

        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<()> {
        let body = msg.encode(self.config.framing)?;
        self.sink.send_text(body).await
    }
}

/// Connect to the configured signaling server and relay until it closes
///
/// Builds the peer connection, the WebSocket connection and the event channel
/// between them, then runs a [`RelaySession`].
pub async fn run_client<F>(config: RelayClientConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    config.validate()?;

    let session_id = uuid::Uuid::new_v4().to_string();
    let (events_tx, events_rx) = events::channel();

    let peer = RtcPeer::new(session_id.clone(), &config, events_tx).await?;
    let (sender, reader) = match connection::connect(&config.signaling_url).await {
        Ok(connected) => connected,
        Err(e) => {
            if let Err(close_err) = peer.close().await {
                warn!("Failed to close peer connection: {}", close_err);
            }
            return Err(e);
        }
    };

    RelaySession::new(session_id, config, Arc::new(peer), Arc::new(sender), events_rx)
        .run(reader, shutdown)
        .await
}
