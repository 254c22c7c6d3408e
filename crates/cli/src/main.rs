use std::error::Error;
use std::sync::Arc;

use ledger_types::signing::Ed25519Oracle;
use node::{Failure, Peer, PeerConfig};
use tokio::io::{self, AsyncBufReadExt};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    // <port> [--sybil] [friend-url...]
    let mut config = PeerConfig::default();
    for arg in &args[1..] {
        if arg == "--sybil" {
            config.sybil = true;
        } else if let Ok(port) = arg.parse::<u16>() {
            config.port = port;
        } else {
            config.friends.push(arg.clone());
        }
    }

    let oracle = Arc::new(Ed25519Oracle::new());
    let peer = Peer::open(&config, oracle)?;
    peer.start();

    info!(
        port = config.port,
        sybil = config.sybil,
        friends = ?config.friends,
        "peer started"
    );
    info!("Commands:");
    info!("  submit <payload>  - sign and buffer a transaction");
    info!("  buffer            - show the unmined transactions");
    info!("  mine              - flush the buffer into a new block");
    info!("  clear             - discard the buffer");
    info!("  chain             - show the blocks, tip first");
    info!("  friends           - show the peers this node polls");
    info!("  quit              - stop the peer");

    let mut stdin = io::BufReader::new(io::stdin()).lines();

    while let Ok(Some(line)) = stdin.next_line().await {
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            ["submit", payload @ ..] if !payload.is_empty() => {
                match peer.submit_transaction(&payload.join(" ")) {
                    Ok(tx) => info!(id = tx.id(), "transaction buffered"),
                    Err(error) => warn!("{}", Failure::from(&error).user_message),
                }
            }

            ["buffer"] => {
                let buffer = peer.transaction_buffer();
                info!(pending = buffer.len(), "transaction buffer");
                for tx in buffer {
                    info!(id = tx.id(), payload = tx.payload(), "buffered");
                }
            }

            ["mine"] => match peer.request_mining() {
                None => info!("nothing to mine"),
                Some(handle) => match handle.await {
                    Ok(Ok(true)) => info!("mined a new block"),
                    Ok(Ok(false)) => info!("nothing to mine"),
                    Ok(Err(error)) => warn!("{}", Failure::from(&error).user_message),
                    Err(error) => warn!(%error, "mining task failed"),
                },
            },

            ["clear"] => match peer.clear_buffer() {
                Ok(buffer) => info!(pending = buffer.len(), "buffer cleared"),
                Err(error) => warn!("{}", Failure::from(&error).user_message),
            },

            ["chain"] => {
                for block in peer.blocks() {
                    info!(
                        id = block.id(),
                        nonce = block.nonce(),
                        hash = %block.hash(),
                        transactions = block.transactions().len(),
                        "block"
                    );
                }
            }

            ["friends"] => {
                for url in peer.friend_urls() {
                    info!(friend = %url, "polling");
                }
            }

            ["quit"] => break,

            _ => info!("unknown command"),
        }
    }

    peer.stop();
    Ok(())
}
