//! Configuration types for the relay client

use serde::{Deserialize, Serialize};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::peer_connection::configuration::RTCConfiguration;

/// Signaling endpoint used when nothing else is configured
pub const DEFAULT_SIGNALING_URL: &str = "ws://127.0.0.1:3000";

/// Default STUN server
pub const DEFAULT_STUN_SERVER: &str = "stun:stun.l.google.com:19302";

/// Greeting sent as soon as the remote data channel is reported
pub const DEFAULT_CREATE_GREETING: &str = "Hello from func!";

/// Greeting sent once the remote data channel reports "open"
pub const DEFAULT_OPEN_GREETING: &str = "Hello from Rust!";

/// Main configuration for the relay client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayClientConfig {
    /// WebSocket signaling server URL (ws:// or wss://)
    pub signaling_url: String,

    /// STUN server URLs (may be empty for loopback-only setups)
    pub stun_servers: Vec<String>,

    /// TURN server configurations (optional)
    pub turn_servers: Vec<TurnServerConfig>,

    /// How answers and local candidates are written to signaling
    pub framing: Framing,

    /// Greetings sent over remote data channels
    pub greetings: GreetingConfig,

    /// Treat negotiation failures as fatal instead of logging them
    pub fail_on_negotiation_error: bool,

    /// Gather candidates on loopback interfaces (same-host peers only)
    pub include_loopback_candidates: bool,
}

/// TURN server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnServerConfig {
    /// TURN server URL (turn: or turns:)
    pub url: String,

    /// Username for TURN authentication
    pub username: String,

    /// Credential for TURN authentication
    pub credential: String,
}

/// Outbound signaling framing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framing {
    /// Raw SDP / candidate text as the message body
    #[default]
    Raw,
    /// JSON envelope tagged with `type`
    Envelope,
}

/// Data channel greetings
///
/// `None` disables the corresponding greeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GreetingConfig {
    /// Sent when the channel is reported, before it is open
    pub on_create: Option<String>,

    /// Sent when the channel reports "open"
    pub on_open: Option<String>,
}

impl Default for GreetingConfig {
    fn default() -> Self {
        Self {
            on_create: Some(DEFAULT_CREATE_GREETING.to_string()),
            on_open: Some(DEFAULT_OPEN_GREETING.to_string()),
        }
    }
}

impl Default for RelayClientConfig {
    fn default() -> Self {
        Self {
            signaling_url: DEFAULT_SIGNALING_URL.to_string(),
            stun_servers: vec![DEFAULT_STUN_SERVER.to_string()],
            turn_servers: Vec::new(),
            framing: Framing::Raw,
            greetings: GreetingConfig::default(),
            fail_on_negotiation_error: false,
            include_loopback_candidates: false,
        }
    }
}

impl RelayClientConfig {
    /// Validate configuration parameters
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `signaling_url` is not a WebSocket URL
    /// - a STUN server URL does not use the `stun:`/`stuns:` scheme
    /// - a TURN server URL does not use the `turn:`/`turns:` scheme
    pub fn validate(&self) -> crate::Result<()> {
        use crate::Error;

        if !self.signaling_url.starts_with("ws://") && !self.signaling_url.starts_with("wss://") {
            return Err(Error::InvalidConfig(format!(
                "signaling_url must start with ws:// or wss://, got {}",
                self.signaling_url
            )));
        }

        if let Some(bad) = self
            .stun_servers
            .iter()
            .find(|url| !url.starts_with("stun:") && !url.starts_with("stuns:"))
        {
            return Err(Error::InvalidConfig(format!(
                "STUN server must start with stun: or stuns:, got {}",
                bad
            )));
        }

        if let Some(bad) = self
            .turn_servers
            .iter()
            .find(|turn| !turn.url.starts_with("turn:") && !turn.url.starts_with("turns:"))
        {
            return Err(Error::InvalidConfig(format!(
                "TURN server must start with turn: or turns:, got {}",
                bad.url
            )));
        }

        Ok(())
    }

    /// Build the library's peer connection configuration
    pub fn rtc_configuration(&self) -> RTCConfiguration {
        let ice_servers: Vec<RTCIceServer> = self
            .stun_servers
            .iter()
            .map(|url| RTCIceServer {
                urls: vec![url.clone()],
                ..Default::default()
            })
            .chain(self.turn_servers.iter().map(|turn| RTCIceServer {
                urls: vec![turn.url.clone()],
                username: turn.username.clone(),
                credential: turn.credential.clone(),
                ..Default::default()
            }))
            .collect();

        RTCConfiguration {
            ice_servers,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RelayClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.signaling_url, "ws://127.0.0.1:3000");
        assert_eq!(config.framing, Framing::Raw);
        assert!(!config.include_loopback_candidates);
    }

    #[test]
    fn test_empty_stun_servers_is_valid() {
        let mut config = RelayClientConfig::default();
        config.stun_servers.clear();
        assert!(config.validate().is_ok());
        assert!(config.rtc_configuration().ice_servers.is_empty());
    }

    #[test]
    fn test_invalid_signaling_url_fails() {
        let mut config = RelayClientConfig::default();
        config.signaling_url = "http://localhost:3000".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("ws://"));
    }

    #[test]
    fn test_invalid_ice_urls_fail() {
        let mut config = RelayClientConfig::default();
        config.stun_servers = vec!["stun.example.com:3478".to_string()];
        assert!(config.validate().is_err());

        let mut config = RelayClientConfig::default();
        config.turn_servers.push(TurnServerConfig {
            url: "stun:relay.example.com:3478".to_string(),
            username: "user".to_string(),
            credential: "pass".to_string(),
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rtc_configuration_includes_turn_credentials() {
        let mut config = RelayClientConfig::default();
        config.turn_servers.push(TurnServerConfig {
            url: "turn:relay.example.com:3478".to_string(),
            username: "user".to_string(),
            credential: "pass".to_string(),
        });

        let rtc = config.rtc_configuration();
        assert_eq!(rtc.ice_servers.len(), 2);
        assert_eq!(rtc.ice_servers[1].username, "user");
        assert_eq!(rtc.ice_servers[1].credential, "pass");
    }

    #[test]
    fn test_partial_config_deserializes_with_defaults() {
        let config: RelayClientConfig =
            serde_json::from_str(r#"{"framing": "envelope", "greetings": {"on_create": null}}"#)
                .unwrap();
        assert_eq!(config.framing, Framing::Envelope);
        assert_eq!(config.greetings.on_create, None);
        assert_eq!(config.greetings.on_open.as_deref(), Some(DEFAULT_OPEN_GREETING));
        assert_eq!(config.signaling_url, DEFAULT_SIGNALING_URL);
    }

    #[test]
    fn test_loopback_candidates_opt_in() {
        let config: RelayClientConfig =
            serde_json::from_str(r#"{"include_loopback_candidates": true}"#).unwrap();
        assert!(config.include_loopback_candidates);
        assert_eq!(config.stun_servers, vec![DEFAULT_STUN_SERVER.to_string()]);
    }
}
