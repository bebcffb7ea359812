//! Relay session: one signaling connection, one peer connection
//!
//! Library callbacks arrive as [`SessionEvent`]s over a channel and are
//! handled in the same loop that reads the signaling socket.

pub mod events;
pub mod negotiation;
pub mod relay;

pub use events::{ChannelPayload, EventReceiver, EventSender, SessionEvent};
pub use negotiation::{Negotiation, NegotiationState};
pub use relay::{run_client, RelaySession};
