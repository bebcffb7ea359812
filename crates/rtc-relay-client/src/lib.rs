//! WebRTC signaling relay client
//!
//! Connects to a WebSocket signaling server, answers the SDP offer it relays,
//! trickles ICE candidates in both directions and greets every data channel
//! the remote peer opens.
//!
//! # Features
//!
//! - **Answer-only negotiation**: `Idle -> OfferReceived -> AnswerSent`, with
//!   renegotiation after an answer
//! - **Trickle ICE**: local candidates are forwarded as they are gathered;
//!   remote candidates arriving before the offer are held until it is answered
//! - **Data channel greetings**: one when the channel is reported, one when it
//!   opens; incoming messages are logged
//! - **Wire framing**: raw SDP/candidate text, or `type`-tagged JSON envelopes
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │  Signaling server (WebSocket)                        │
//! │  ↕ text frames                                       │
//! │  RelaySession (one select! loop)                     │
//! │  ├─ WsReader            inbound offers / candidates  │
//! │  ├─ SignalingSender     outbound answer / candidates │
//! │  ├─ Negotiation         offer/answer state machine   │
//! │  └─ EventReceiver  ←──  RtcPeer / RtcDataChannel     │
//! │                         (webrtc callbacks)           │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use rtc_relay_client::{Framing, RelayClientConfig};
//!
//! let config = RelayClientConfig {
//!     signaling_url: "ws://localhost:3000".to_string(),
//!     framing: Framing::Envelope,
//!     ..Default::default()
//! };
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.greetings.on_open.as_deref(), Some("Hello from Rust!"));
//! ```
//!
//! ## Async Usage
//!
//! ```no_run
//! use rtc_relay_client::{run_client, RelayClientConfig};
//!
//! # async fn example() -> rtc_relay_client::Result<()> {
//! let config = RelayClientConfig::default();
//!
//! // Runs until the server closes the socket or Ctrl+C
//! run_client(config, async {
//!     let _ = tokio::signal::ctrl_c().await;
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod peer;
pub mod session;
pub mod signaling;

// Re-exports for public API
pub use config::{
    Framing, GreetingConfig, RelayClientConfig, TurnServerConfig, DEFAULT_CREATE_GREETING,
    DEFAULT_OPEN_GREETING, DEFAULT_SIGNALING_URL, DEFAULT_STUN_SERVER,
};
pub use error::{Error, FailureKind, Result};
pub use peer::{ChannelId, DataChannelHandle, Negotiator, RtcPeer};
pub use session::{run_client, RelaySession, SessionEvent};
pub use signaling::SignalSink;

/// Library version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
