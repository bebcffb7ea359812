//! Remote data channel wrapper

use super::ChannelId;
use crate::session::{ChannelPayload, EventSender, SessionEvent};
use crate::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use webrtc::data_channel::data_channel_state::RTCDataChannelState;
use webrtc::data_channel::RTCDataChannel;

/// What the relay loop needs from a data channel
#[async_trait]
pub trait DataChannelHandle: Send + Sync {
    /// Session-local identifier
    fn id(&self) -> ChannelId;

    /// Label chosen by the remote side
    fn label(&self) -> &str;

    /// Send a greeting over the channel
    async fn send_greeting(&self, text: &str) -> Result<()>;
}

/// A data channel opened by the remote peer
pub struct RtcDataChannel {
    id: ChannelId,
    label: String,
    rtc_channel: Arc<RTCDataChannel>,
}

impl RtcDataChannel {
    /// Wrap an incoming channel and forward its lifecycle to the session
    ///
    /// `ChannelCreated` is emitted before any handler is registered so the
    /// loop always sees creation ahead of open/message/close for the channel.
    pub fn attach(rtc_channel: Arc<RTCDataChannel>, id: ChannelId, events: EventSender) -> Arc<Self> {
        let channel = Arc::new(Self {
            id,
            label: rtc_channel.label().to_string(),
            rtc_channel,
        });

        if events
            .send(SessionEvent::ChannelCreated(channel.clone()))
            .is_err()
        {
            warn!("Session gone, data channel '{}' left unattended", channel.label);
            return channel;
        }

        channel.register_handlers(events);
        channel
    }

    fn register_handlers(&self, events: EventSender) {
        let id = self.id;

        let tx = events.clone();
        self.rtc_channel.on_open(Box::new(move || {
            let _ = tx.send(SessionEvent::ChannelOpened(id));
            Box::pin(async {})
        }));

        let tx = events.clone();
        self.rtc_channel.on_close(Box::new(move || {
            let _ = tx.send(SessionEvent::ChannelClosed(id));
            Box::pin(async {})
        }));

        let tx = events.clone();
        self.rtc_channel.on_message(Box::new(move |msg| {
            let payload = if msg.is_string {
                ChannelPayload::Text(String::from_utf8_lossy(&msg.data).into_owned())
            } else {
                ChannelPayload::Binary(msg.data.to_vec())
            };
            let _ = tx.send(SessionEvent::ChannelMessage { id, payload });
            Box::pin(async {})
        }));

        let tx = events;
        self.rtc_channel.on_error(Box::new(move |err| {
            let _ = tx.send(SessionEvent::ChannelError {
                id,
                message: err.to_string(),
            });
            Box::pin(async {})
        }));
    }

    /// Current library-level state
    pub fn ready_state(&self) -> RTCDataChannelState {
        self.rtc_channel.ready_state()
    }
}

#[async_trait]
impl DataChannelHandle for RtcDataChannel {
    fn id(&self) -> ChannelId {
        self.id
    }

    fn label(&self) -> &str {
        &self.label
    }

    /// Greetings go out as binary frames carrying UTF-8 text
    async fn send_greeting(&self, text: &str) -> Result<()> {
        let sent = self
            .rtc_channel
            .send(&Bytes::copy_from_slice(text.as_bytes()))
            .await
            .map_err(|e| {
                Error::DataChannelError(format!(
                    "Failed to send on '{}' (state: {}): {}",
                    self.label,
                    self.ready_state(),
                    e
                ))
            })?;

        debug!("Sent {} bytes on data channel '{}'", sent, self.label);
        Ok(())
    }
}

impl fmt::Debug for RtcDataChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RtcDataChannel")
            .field("id", &self.id)
            .field("label", &self.label)
            .finish()
    }
}
