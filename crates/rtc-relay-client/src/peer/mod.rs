//! WebRTC peer connection and data channel wrappers
//!
//! Library callbacks are translated into [`SessionEvent`]s here; nothing in
//! this module touches session state directly.
//!
//! [`SessionEvent`]: crate::session::SessionEvent

pub mod connection;
pub mod data_channel;

use crate::Result;
use async_trait::async_trait;
use std::fmt;
use webrtc::ice_transport::ice_candidate::RTCIceCandidateInit;

pub use connection::RtcPeer;
pub use data_channel::{DataChannelHandle, RtcDataChannel};

/// Session-local identifier for a data channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(pub u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dc-{}", self.0)
    }
}

/// The negotiation surface of a peer connection
#[async_trait]
pub trait Negotiator: Send + Sync {
    /// Apply a remote offer and return the local answer SDP
    ///
    /// The answer is applied as the local description before returning.
    async fn accept_offer(&self, offer_sdp: String) -> Result<String>;

    /// Add a trickled remote ICE candidate
    async fn add_remote_candidate(&self, candidate: RTCIceCandidateInit) -> Result<()>;

    /// Close the underlying connection
    async fn close(&self) -> Result<()>;
}
