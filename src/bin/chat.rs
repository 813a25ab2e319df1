//! relaylink-chat - minimal terminal chat over the relay.
//!
//! Connects as one user, prints everything the relay delivers, and sends
//! each stdin line to a fixed peer. Mostly useful for poking at a relay
//! deployment by hand.
//!
//! Usage: `relaylink-chat [config.toml] <user-id> <peer-id>`
//! The bearer token is read from `RELAY_TOKEN`.

use std::sync::Arc;

use relaylink::{ClientOptions, EnvToken, InboundEvent, RelayClient, RelayConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let mut args = std::env::args().skip(1);
    let config_path = args.next().unwrap_or_else(|| "config.toml".to_string());
    let user_id = args
        .next()
        .ok_or_else(|| anyhow::anyhow!("usage: relaylink-chat [config.toml] <user-id> <peer-id>"))?;
    let peer_id = args
        .next()
        .ok_or_else(|| anyhow::anyhow!("usage: relaylink-chat [config.toml] <user-id> <peer-id>"))?;

    let config = RelayConfig::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    info!(
        relay = %config.relay.url(),
        user_id = %user_id,
        peer_id = %peer_id,
        "Starting relaylink-chat"
    );

    let options = ClientOptions::new(user_id.clone())
        .on_message(|event| match event {
            InboundEvent::Message(msg) => {
                println!("[{}] <{}> {}", msg.timestamp, msg.sender.name, msg.content);
            }
            InboundEvent::Ack(ack) => {
                println!("-- delivery: {}", ack.status);
            }
        })
        .on_connection_change(|connected| {
            if connected {
                println!("-- connected");
            } else {
                println!("-- disconnected");
            }
        });

    let client = RelayClient::new(&config, options, Arc::new(EnvToken::new("RELAY_TOKEN")));
    client.connect();

    // Forward stdin lines until EOF.
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if !client.send_message(&peer_id, line, None) {
            println!("-- not sent (disconnected?)");
        }
    }

    client.disconnect();
    info!("relaylink-chat exiting");
    Ok(())
}
