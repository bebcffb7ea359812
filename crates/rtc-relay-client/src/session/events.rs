//! Events delivered from peer-connection callbacks into the relay loop

use crate::peer::{ChannelId, DataChannelHandle};
use std::fmt;
use std::sync::Arc;
use webrtc::ice_transport::ice_candidate::RTCIceCandidateInit;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;

/// Sender half handed to library callbacks
pub type EventSender = tokio::sync::mpsc::UnboundedSender<SessionEvent>;

/// Receiver half owned by the relay loop
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<SessionEvent>;

/// Create the event channel for one session
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// Something the WebRTC library reported
pub enum SessionEvent {
    /// A local ICE candidate was gathered
    LocalCandidate(RTCIceCandidateInit),

    /// Local ICE gathering finished
    GatheringComplete,

    /// Peer connection state transition
    PeerStateChanged(RTCPeerConnectionState),

    /// The remote side opened a data channel
    ChannelCreated(Arc<dyn DataChannelHandle>),

    /// A data channel reported "open"
    ChannelOpened(ChannelId),

    /// A message arrived on a data channel
    ChannelMessage {
        id: ChannelId,
        payload: ChannelPayload,
    },

    /// A data channel reported "close"
    ChannelClosed(ChannelId),

    /// A data channel reported an error
    ChannelError { id: ChannelId, message: String },
}

/// Data channel message body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelPayload {
    Text(String),
    Binary(Vec<u8>),
}

impl fmt::Display for ChannelPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelPayload::Text(text) => write!(f, "{}", text),
            ChannelPayload::Binary(data) => match std::str::from_utf8(data) {
                Ok(text) => write!(f, "b{:?}", text),
                Err(_) => write!(f, "<{} bytes>", data.len()),
            },
        }
    }
}

impl fmt::Debug for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionEvent::LocalCandidate(init) => {
                f.debug_tuple("LocalCandidate").field(&init.candidate).finish()
            }
            SessionEvent::GatheringComplete => f.write_str("GatheringComplete"),
            SessionEvent::PeerStateChanged(state) => {
                f.debug_tuple("PeerStateChanged").field(state).finish()
            }
            SessionEvent::ChannelCreated(channel) => f
                .debug_tuple("ChannelCreated")
                .field(&channel.id())
                .field(&channel.label())
                .finish(),
            SessionEvent::ChannelOpened(id) => f.debug_tuple("ChannelOpened").field(id).finish(),
            SessionEvent::ChannelMessage { id, payload } => f
                .debug_struct("ChannelMessage")
                .field("id", id)
                .field("payload", payload)
                .finish(),
            SessionEvent::ChannelClosed(id) => f.debug_tuple("ChannelClosed").field(id).finish(),
            SessionEvent::ChannelError { id, message } => f
                .debug_struct("ChannelError")
                .field("id", id)
                .field("message", message)
                .finish(),
        }
    }
}
