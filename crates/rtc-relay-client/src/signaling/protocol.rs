//! Signaling wire format
//!
//! Inbound messages are JSON objects carrying either an `sdp` offer or a
//! trickled `candidate`. Outbound messages default to raw text bodies; the
//! [`Framing::Envelope`] mode wraps them in a `type`-tagged JSON object
//! instead.

use super::candidate::{parse_candidate, CandidateSummary};
use crate::config::Framing;
use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use webrtc::ice_transport::ice_candidate::RTCIceCandidateInit;

/// A decoded inbound signaling message
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Remote SDP offer
    Offer {
        /// SDP text
        sdp: String,
    },

    /// Trickled remote ICE candidate
    Candidate(RemoteCandidate),

    /// Valid JSON object with neither `sdp` nor `candidate`
    Unrecognized(Value),
}

impl InboundMessage {
    /// Parse a text frame received from the signaling server
    ///
    /// `sdp` is checked before `candidate`; a null value counts as absent.
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| Error::InvalidMessage(format!("Malformed JSON: {}", e)))?;

        let Value::Object(map) = value else {
            return Err(Error::InvalidMessage(format!(
                "Signaling message must be a JSON object, got: {}",
                text
            )));
        };

        if let Some(sdp) = map.get("sdp").filter(|v| !v.is_null()) {
            let sdp = sdp.as_str().ok_or_else(|| {
                Error::InvalidMessage("Value of 'sdp' should be a string".to_string())
            })?;
            return Ok(InboundMessage::Offer {
                sdp: sdp.to_string(),
            });
        }

        if let Some(candidate) = map.get("candidate").filter(|v| !v.is_null()) {
            let candidate = RemoteCandidate::deserialize(candidate)
                .map_err(|e| Error::InvalidMessage(format!("Invalid candidate payload: {}", e)))?;
            return Ok(InboundMessage::Candidate(candidate));
        }

        Ok(InboundMessage::Unrecognized(Value::Object(map)))
    }
}

/// Remote ICE candidate as carried in the inbound envelope
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteCandidate {
    /// Candidate line
    pub candidate: String,

    /// SDP m-line index (coerced to an integer)
    #[serde(rename = "sdpMLineIndex", deserialize_with = "coerce_mline_index")]
    pub sdp_mline_index: u16,

    /// Media stream identification tag
    #[serde(rename = "sdpMid", default)]
    pub sdp_mid: Option<String>,
}

impl RemoteCandidate {
    /// Parse the candidate line
    pub fn line(&self) -> Result<CandidateSummary> {
        parse_candidate(&self.candidate)
    }

    /// Convert into the library's candidate type
    pub fn to_init(&self) -> RTCIceCandidateInit {
        RTCIceCandidateInit {
            candidate: self.candidate.clone(),
            sdp_mid: self.sdp_mid.clone(),
            sdp_mline_index: Some(self.sdp_mline_index),
            username_fragment: None,
        }
    }
}

/// Accepts integers, floats (truncated) and integer strings
fn coerce_mline_index<'de, D>(deserializer: D) -> std::result::Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as _;

    let value = Value::deserialize(deserializer)?;
    let index = match &value {
        // Floats truncate toward zero, like an integer cast on the sending side
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .map(f64::trunc)
                .filter(|f| (0.0..=f64::from(u16::MAX)).contains(f))
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };

    index
        .and_then(|i| u16::try_from(i).ok())
        .ok_or_else(|| D::Error::custom(format!("sdpMLineIndex is not a valid index: {}", value)))
}

/// A message this client sends to the signaling server
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    /// Local SDP answer
    Answer(String),

    /// Locally gathered ICE candidate
    Candidate(RTCIceCandidateInit),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Envelope<'a> {
    Answer { sdp: &'a str },
    Ice { candidate: &'a RTCIceCandidateInit },
}

impl OutboundMessage {
    /// Encode the message body for the given framing
    pub fn encode(&self, framing: Framing) -> Result<String> {
        match framing {
            Framing::Raw => Ok(match self {
                OutboundMessage::Answer(sdp) => sdp.clone(),
                OutboundMessage::Candidate(init) => init.candidate.clone(),
            }),
            Framing::Envelope => {
                let envelope = match self {
                    OutboundMessage::Answer(sdp) => Envelope::Answer { sdp },
                    OutboundMessage::Candidate(candidate) => Envelope::Ice { candidate },
                };
                serde_json::to_string(&envelope).map_err(|e| {
                    Error::SerializationError(format!(
                        "Failed to serialize signaling message: {}",
                        e
                    ))
                })
            }
        }
    }
}
