//! Relay client binary entry point
//!
//! Connects to a signaling server, answers the relayed offer and greets every
//! data channel the remote peer opens.
//!
//! # Usage
//!
//! ```bash
//! # Local signaling server on the default port
//! cargo run --bin rtc_relay_client
//!
//! # Remote server, JSON envelopes on the wire
//! cargo run --bin rtc_relay_client -- \
//!   --signaling-url wss://signal.example.com/ws \
//!   --framing envelope
//!
//! # TURN relay, no greeting before the channel opens
//! cargo run --bin rtc_relay_client -- \
//!   --turn-servers turn:turn.example.com:3478:user:secret \
//!   --no-create-greeting
//! ```
//!
//! # Environment
//!
//! Every flag can also be set through an `RTC_RELAY_*` variable, e.g.
//! `RTC_RELAY_SIGNALING_URL`. Log verbosity follows `RUST_LOG` (default
//! `info`).

use clap::Parser;
use rtc_relay_client::{
    run_client, Framing, GreetingConfig, RelayClientConfig, TurnServerConfig,
    DEFAULT_CREATE_GREETING, DEFAULT_OPEN_GREETING, DEFAULT_SIGNALING_URL, DEFAULT_STUN_SERVER,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// WebRTC signaling relay client
///
/// Answers the SDP offer relayed by the signaling server and exchanges ICE
/// candidates over the same WebSocket.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// WebSocket signaling URL
    #[arg(long, default_value = DEFAULT_SIGNALING_URL, env = "RTC_RELAY_SIGNALING_URL")]
    signaling_url: String,

    /// STUN servers (comma-separated)
    #[arg(
        long,
        value_delimiter = ',',
        default_value = DEFAULT_STUN_SERVER,
        env = "RTC_RELAY_STUN_SERVERS"
    )]
    stun_servers: Vec<String>,

    /// TURN servers (format: turn:host:port:username:password, comma-separated)
    #[arg(long, value_delimiter = ',', env = "RTC_RELAY_TURN_SERVERS")]
    turn_servers: Vec<String>,

    /// Outbound framing: raw, envelope
    #[arg(long, default_value = "raw", env = "RTC_RELAY_FRAMING")]
    framing: FramingArg,

    /// Greeting sent when a data channel is reported
    #[arg(long, default_value = DEFAULT_CREATE_GREETING, env = "RTC_RELAY_CREATE_GREETING")]
    create_greeting: String,

    /// Greeting sent when a data channel opens
    #[arg(long, default_value = DEFAULT_OPEN_GREETING, env = "RTC_RELAY_OPEN_GREETING")]
    open_greeting: String,

    /// Only greet once the channel is open
    #[arg(long, env = "RTC_RELAY_NO_CREATE_GREETING")]
    no_create_greeting: bool,

    /// Exit on SDP/ICE/data channel failures instead of logging them
    #[arg(long, env = "RTC_RELAY_FAIL_ON_NEGOTIATION_ERROR")]
    fail_on_negotiation_error: bool,

    /// Also gather loopback candidates (peer on the same host)
    #[arg(long, env = "RTC_RELAY_INCLUDE_LOOPBACK_CANDIDATES")]
    include_loopback_candidates: bool,

    /// Emit logs as JSON lines
    #[arg(long, env = "RTC_RELAY_LOG_JSON")]
    log_json: bool,
}

/// Framing CLI argument wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum FramingArg {
    Raw,
    Envelope,
}

impl From<FramingArg> for Framing {
    fn from(arg: FramingArg) -> Self {
        match arg {
            FramingArg::Raw => Framing::Raw,
            FramingArg::Envelope => Framing::Envelope,
        }
    }
}

/// Parse TURN server string (format: turn:host:port:username:password or turns:host:port:username:password)
fn parse_turn_server(s: &str) -> Result<TurnServerConfig, String> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() < 5 {
        return Err(format!(
            "Invalid TURN server format: '{}'. Expected: turn:host:port:username:password",
            s
        ));
    }

    let scheme = parts[0];
    if scheme != "turn" && scheme != "turns" {
        return Err(format!(
            "Invalid TURN scheme: '{}'. Expected 'turn' or 'turns'",
            scheme
        ));
    }

    // Credential may contain colons
    Ok(TurnServerConfig {
        url: format!("{}:{}:{}", scheme, parts[1], parts[2]),
        username: parts[3].to_string(),
        credential: parts[4..].join(":"),
    })
}

fn build_config_from_args(args: &Args) -> Result<RelayClientConfig, String> {
    let turn_servers = args
        .turn_servers
        .iter()
        .map(|s| parse_turn_server(s))
        .collect::<Result<Vec<_>, _>>()?;

    for turn in &turn_servers {
        info!("Adding TURN server: {} (user: {})", turn.url, turn.username);
    }

    Ok(RelayClientConfig {
        signaling_url: args.signaling_url.clone(),
        stun_servers: args.stun_servers.clone(),
        turn_servers,
        framing: args.framing.into(),
        greetings: GreetingConfig {
            on_create: (!args.no_create_greeting).then(|| args.create_greeting.clone()),
            on_open: Some(args.open_greeting.clone()),
        },
        fail_on_negotiation_error: args.fail_on_negotiation_error,
        include_loopback_candidates: args.include_loopback_candidates,
    })
}

fn init_tracing(json: bool) {
    // RUST_LOG wins over the default
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        signaling_url = %args.signaling_url,
        framing = ?args.framing,
        "Relay client starting"
    );

    let config = build_config_from_args(&args).map_err(anyhow::Error::msg)?;

    run_client(config, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    })
    .await?;

    info!("Relay client stopped");
    Ok(())
}
