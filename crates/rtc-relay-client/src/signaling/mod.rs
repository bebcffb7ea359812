//! Signaling channel: WebSocket connection, wire format and candidate lines
//!
//! Inbound frames are JSON envelopes; outbound frames are raw text unless
//! envelope framing is configured.

pub mod candidate;
pub mod connection;
pub mod protocol;

pub use candidate::{parse_candidate, CandidateSummary};
pub use connection::{classify, connect, InboundFrame, SignalSink, SignalingSender, WsReader};
pub use protocol::{InboundMessage, OutboundMessage, RemoteCandidate};
