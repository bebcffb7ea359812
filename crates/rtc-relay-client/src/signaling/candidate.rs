//! ICE candidate line validation
//!
//! Inbound candidate lines go through the ICE agent's own parser before they
//! are handed to the peer connection, so a garbled line surfaces as a
//! message-format error rather than an opaque library rejection.

use crate::{Error, Result};
use webrtc::ice::candidate::candidate_base::unmarshal_candidate;
use webrtc::ice::candidate::{Candidate, CandidateType};

/// Attribute prefix carried by candidate lines in SDP and trickle messages
pub const CANDIDATE_PREFIX: &str = "candidate:";

/// The parts of a candidate line the relay logs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSummary {
    pub kind: CandidateType,
    /// IP address or mDNS hostname
    pub address: String,
    pub port: u16,
    pub priority: u32,
}

/// Parse a candidate line, with or without the `candidate:` prefix
pub fn parse_candidate(line: &str) -> Result<CandidateSummary> {
    let trimmed = line.trim();
    let body = trimmed.strip_prefix(CANDIDATE_PREFIX).unwrap_or(trimmed);

    let candidate = unmarshal_candidate(body)
        .map_err(|e| Error::InvalidMessage(format!("Invalid candidate '{}': {}", line, e)))?;

    Ok(CandidateSummary {
        kind: candidate.candidate_type(),
        address: candidate.address(),
        port: candidate.port(),
        priority: candidate.priority(),
    })
}
