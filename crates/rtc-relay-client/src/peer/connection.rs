//! WebRTC peer connection management

use super::{ChannelId, Negotiator, RtcDataChannel};
use crate::config::RelayClientConfig;
use crate::session::{EventSender, SessionEvent};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::setting_engine::SettingEngine;
use webrtc::api::APIBuilder;
use webrtc::ice_transport::ice_candidate::RTCIceCandidateInit;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::RTCPeerConnection as WebRTCPeerConnection;

/// WebRTC peer connection wrapper
///
/// Owns the single `RTCPeerConnection` of a relay session. Library callbacks
/// (local candidates, remote data channels, state changes) are forwarded to
/// the session as events.
pub struct RtcPeer {
    /// Session this peer belongs to (for log correlation)
    session_id: String,

    /// Actual WebRTC peer connection
    peer_connection: Arc<WebRTCPeerConnection>,
}

impl RtcPeer {
    /// Create the peer connection and wire its callbacks to `events`
    ///
    /// # Arguments
    ///
    /// * `session_id` - Identifier used in log fields
    /// * `config` - ICE server configuration
    /// * `events` - Sender half of the session event channel
    #[instrument(skip(config, events))]
    pub async fn new(
        session_id: String,
        config: &RelayClientConfig,
        events: EventSender,
    ) -> Result<Self> {
        let mut media_engine = MediaEngine::default();

        media_engine
            .register_default_codecs()
            .map_err(|e| Error::WebRtcError(format!("Failed to register codecs: {}", e)))?;

        let interceptor_registry =
            register_default_interceptors(Default::default(), &mut media_engine).map_err(|e| {
                Error::WebRtcError(format!("Failed to register interceptors: {}", e))
            })?;

        let mut setting_engine = SettingEngine::default();
        setting_engine.set_include_loopback_candidate(config.include_loopback_candidates);

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(interceptor_registry)
            .with_setting_engine(setting_engine)
            .build();

        let peer_connection = Arc::new(
            api.new_peer_connection(config.rtc_configuration())
                .await
                .map_err(|e| {
                    Error::WebRtcError(format!("Failed to create peer connection: {}", e))
                })?,
        );

        info!(
            ice_servers = config.stun_servers.len() + config.turn_servers.len(),
            loopback = config.include_loopback_candidates,
            "Peer connection created"
        );

        let peer = Self {
            session_id,
            peer_connection,
        };
        peer.register_handlers(events);

        Ok(peer)
    }

    fn register_handlers(&self, events: EventSender) {
        let tx = events.clone();
        self.peer_connection
            .on_ice_candidate(Box::new(move |candidate| {
                match candidate {
                    Some(candidate) => match candidate.to_json() {
                        Ok(init) => {
                            let _ = tx.send(SessionEvent::LocalCandidate(init));
                        }
                        Err(e) => warn!("Failed to convert ICE candidate to JSON: {}", e),
                    },
                    None => {
                        let _ = tx.send(SessionEvent::GatheringComplete);
                    }
                }
                Box::pin(async {})
            }));

        let tx = events.clone();
        let next_channel_id = Arc::new(AtomicU64::new(0));
        self.peer_connection
            .on_data_channel(Box::new(move |data_channel| {
                let id = ChannelId(next_channel_id.fetch_add(1, Ordering::SeqCst));
                debug!(
                    "Remote data channel: label={}, id={}",
                    data_channel.label(),
                    id
                );
                RtcDataChannel::attach(data_channel, id, tx.clone());
                Box::pin(async {})
            }));

        let tx = events;
        self.peer_connection
            .on_peer_connection_state_change(Box::new(move |state: RTCPeerConnectionState| {
                let _ = tx.send(SessionEvent::PeerStateChanged(state));
                Box::pin(async {})
            }));
    }

    /// Get the session ID
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Current library-level connection state
    pub fn connection_state(&self) -> RTCPeerConnectionState {
        self.peer_connection.connection_state()
    }

    /// Get the underlying WebRTC peer connection
    pub fn peer_connection(&self) -> &Arc<WebRTCPeerConnection> {
        &self.peer_connection
    }
}

#[async_trait]
impl Negotiator for RtcPeer {
    async fn accept_offer(&self, offer_sdp: String) -> Result<String> {
        let offer = RTCSessionDescription::offer(offer_sdp)
            .map_err(|e| Error::SdpError(format!("Failed to parse offer: {}", e)))?;

        self.peer_connection
            .set_remote_description(offer)
            .await
            .map_err(|e| Error::SdpError(format!("Failed to set remote description: {}", e)))?;

        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .map_err(|e| Error::SdpError(format!("Failed to create answer: {}", e)))?;

        self.peer_connection
            .set_local_description(answer)
            .await
            .map_err(|e| Error::SdpError(format!("Failed to set local description: {}", e)))?;

        let local_desc = self
            .peer_connection
            .local_description()
            .await
            .ok_or_else(|| {
                Error::SdpError("No local description after setting answer".to_string())
            })?;

        debug!("Created SDP answer for session {}", self.session_id);

        Ok(local_desc.sdp)
    }

    async fn add_remote_candidate(&self, candidate: RTCIceCandidateInit) -> Result<()> {
        debug!(
            "Adding ICE candidate for session {}: {}",
            self.session_id, candidate.candidate
        );

        self.peer_connection
            .add_ice_candidate(candidate)
            .await
            .map_err(|e| Error::IceCandidateError(format!("Failed to add ICE candidate: {}", e)))
    }

    async fn close(&self) -> Result<()> {
        info!("Closing peer connection for session {}", self.session_id);

        self.peer_connection
            .close()
            .await
            .map_err(|e| Error::WebRtcError(format!("Failed to close peer connection: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::events;

    fn loopback_config() -> RelayClientConfig {
        RelayClientConfig {
            stun_servers: Vec::new(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_peer_connection_creation() {
        let (tx, _rx) = events::channel();
        let peer = RtcPeer::new("session-test".to_string(), &loopback_config(), tx)
            .await
            .unwrap();

        assert_eq!(peer.session_id(), "session-test");
        assert_eq!(peer.connection_state(), RTCPeerConnectionState::New);
        peer.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_garbage_offer_is_sdp_error() {
        let (tx, _rx) = events::channel();
        let peer = RtcPeer::new("session-test".to_string(), &loopback_config(), tx)
            .await
            .unwrap();

        let err = peer.accept_offer("not an sdp".to_string()).await.unwrap_err();
        assert!(matches!(err, Error::SdpError(_)));
        assert!(err.is_negotiation_error());
        peer.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_candidate_before_offer_is_rejected() {
        let (tx, _rx) = events::channel();
        let peer = RtcPeer::new("session-test".to_string(), &loopback_config(), tx)
            .await
            .unwrap();

        let err = peer
            .add_remote_candidate(RTCIceCandidateInit {
                candidate: "candidate:1 1 udp 2130706431 127.0.0.1 5000 typ host".to_string(),
                sdp_mid: None,
                sdp_mline_index: Some(0),
                username_fragment: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::IceCandidateError(_)));
        peer.close().await.unwrap();
    }
}
