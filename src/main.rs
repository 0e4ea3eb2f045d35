use anyhow::{Context, Result};
use gossip_cluster::config::ProtocolConfig;
use gossip_cluster::membership::service::MembershipService;
use gossip_cluster::membership::types::PeerId;
use std::net::SocketAddr;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        eprintln!(
            "Usage: {} --bind <addr:port> [--rendezvous <addr:port>] [--config <file.json>]",
            args[0]
        );
        eprintln!("       [--t-fail <ticks>] [--t-cleanup <ticks>] [--tick-ms <millis>]");
        eprintln!(
            "Example (introducer): {} --bind 127.0.0.1:5000 --rendezvous 127.0.0.1:5000",
            args[0]
        );
        eprintln!(
            "Example (joiner):     {} --bind 127.0.0.1:5001 --rendezvous 127.0.0.1:5000",
            args[0]
        );

        std::process::exit(1);
    }

    let mut bind_addr: Option<SocketAddr> = None;
    let mut rendezvous: Option<PeerId> = None;
    let mut config_path: Option<String> = None;
    let mut t_fail: Option<u64> = None;
    let mut t_cleanup: Option<u64> = None;
    let mut tick_ms: u64 = 500;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bind" => {
                bind_addr = Some(args[i + 1].parse()?);
                i += 2;
            }
            "--rendezvous" => {
                rendezvous = Some(args[i + 1].parse()?);
                i += 2;
            }
            "--config" => {
                config_path = Some(args[i + 1].clone());
                i += 2;
            }
            "--t-fail" => {
                t_fail = Some(args[i + 1].parse()?);
                i += 2;
            }
            "--t-cleanup" => {
                t_cleanup = Some(args[i + 1].parse()?);
                i += 2;
            }
            "--tick-ms" => {
                tick_ms = args[i + 1].parse()?;
                i += 2;
            }
            _ => {
                i += 1;
            }
        }
    }

    let bind_addr = bind_addr.context("--bind is required")?;

    let mut config = match config_path {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config file {}", path))?;
            serde_json::from_str::<ProtocolConfig>(&raw)
                .with_context(|| format!("failed to parse config file {}", path))?
        }
        None => {
            let rendezvous = rendezvous.context("--rendezvous or --config is required")?;
            ProtocolConfig::new(rendezvous)
        }
    };

    // Flags override the config file.
    if let Some(rendezvous) = rendezvous {
        config.rendezvous = rendezvous;
    }
    if let Some(t_fail) = t_fail {
        config.t_fail = t_fail;
    }
    if let Some(t_cleanup) = t_cleanup {
        config.t_cleanup = t_cleanup;
    }

    tracing::info!("Starting node on {}", bind_addr);
    tracing::info!(
        "Rendezvous: {}, t_fail: {}, t_cleanup: {}, tick: {}ms",
        config.rendezvous,
        config.t_fail,
        config.t_cleanup,
        tick_ms
    );

    let service =
        MembershipService::new(bind_addr, config, Duration::from_millis(tick_ms)).await?;
    tracing::info!("Node ID: {}", service.local_id());

    service.run().await
}
