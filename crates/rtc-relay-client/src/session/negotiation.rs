//! Offer/answer sequencing for the answering side
//!
//! The client only ever answers: `Idle -> OfferReceived -> AnswerSent`, with
//! `AnswerSent -> OfferReceived` allowed for renegotiation. Remote candidates
//! that arrive before any remote description has been applied are held and
//! handed back once the answer is in place.

use crate::signaling::RemoteCandidate;
use crate::{Error, Result};
use tracing::{debug, warn};

/// Upper bound on candidates held before the first offer
pub const MAX_PENDING_CANDIDATES: usize = 100;

/// Negotiation state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    /// No offer seen yet
    Idle,
    /// Offer being applied, answer not yet sent
    OfferReceived,
    /// Answer sent; remote description is in place
    AnswerSent,
}

/// Offer/answer state machine plus pending remote candidates
#[derive(Debug)]
pub struct Negotiation {
    state: NegotiationState,
    /// State to restore if the in-flight offer fails
    before_offer: NegotiationState,
    pending: Vec<RemoteCandidate>,
    completed_offers: u32,
}

impl Default for Negotiation {
    fn default() -> Self {
        Self::new()
    }
}

impl Negotiation {
    pub fn new() -> Self {
        Self {
            state: NegotiationState::Idle,
            before_offer: NegotiationState::Idle,
            pending: Vec::new(),
            completed_offers: 0,
        }
    }

    /// Current state
    pub fn state(&self) -> NegotiationState {
        self.state
    }

    /// Number of offers answered so far
    pub fn completed_offers(&self) -> u32 {
        self.completed_offers
    }

    /// A remote description has been applied and answered
    pub fn has_remote_description(&self) -> bool {
        self.state == NegotiationState::AnswerSent
    }

    /// Record that an offer arrived
    pub fn begin_offer(&mut self) -> Result<()> {
        match self.state {
            NegotiationState::Idle | NegotiationState::AnswerSent => {
                self.transition(NegotiationState::OfferReceived);
                Ok(())
            }
            NegotiationState::OfferReceived => Err(Error::IllegalTransition(
                "offer received while a previous offer is still unanswered".to_string(),
            )),
        }
    }

    /// Record that the answer for the in-flight offer was sent
    pub fn complete_answer(&mut self) -> Result<()> {
        match self.state {
            NegotiationState::OfferReceived => {
                self.state = NegotiationState::AnswerSent;
                self.completed_offers += 1;
                debug!("Negotiation: OfferReceived -> AnswerSent");
                Ok(())
            }
            other => Err(Error::IllegalTransition(format!(
                "answer completed in state {:?}",
                other
            ))),
        }
    }

    /// Roll back a failed offer
    pub fn abort_offer(&mut self) {
        if self.state == NegotiationState::OfferReceived {
            let restore = self.before_offer;
            debug!("Negotiation: offer aborted, back to {:?}", restore);
            self.state = restore;
        }
    }

    /// Hold a candidate until a remote description exists
    ///
    /// Returns `false` and drops the candidate once [`MAX_PENDING_CANDIDATES`]
    /// are already held.
    pub fn queue_candidate(&mut self, candidate: RemoteCandidate) -> bool {
        if self.pending.len() >= MAX_PENDING_CANDIDATES {
            warn!(
                pending = self.pending.len(),
                "Pending candidate buffer full, dropping candidate"
            );
            return false;
        }
        self.pending.push(candidate);
        debug!(pending = self.pending.len(), "Candidate queued");
        true
    }

    /// Number of held candidates
    pub fn pending_candidates(&self) -> usize {
        self.pending.len()
    }

    /// Take all held candidates in arrival order
    pub fn take_pending(&mut self) -> Vec<RemoteCandidate> {
        std::mem::take(&mut self.pending)
    }

    fn transition(&mut self, next: NegotiationState) {
        debug!("Negotiation: {:?} -> {:?}", self.state, next);
        self.before_offer = self.state;
        self.state = next;
    }
}
