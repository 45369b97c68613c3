//! Standalone signaling server
//!
//! Run with: cargo run --example signal_server [BIND_ADDR]
//!
//! Examples:
//!   cargo run --example signal_server                  # 0.0.0.0:$PORT, or 0.0.0.0:8000
//!   cargo run --example signal_server localhost        # 127.0.0.1:8000
//!   cargo run --example signal_server 127.0.0.1:9000   # 127.0.0.1:9000
//!
//! Browsers connect with `new WebSocket("ws://localhost:8000")`, send
//! `{"event":"start"}` and exchange `sdp:send` / `ice:send` once a
//! `remote-socket` event names their stranger.

use std::net::SocketAddr;
use std::time::Duration;

use pairlink::server::config::DEFAULT_PORT;
use pairlink::{ServerConfig, SignalServer};

/// Parse bind address from command line argument.
///
/// Accepts `IP:PORT`, a bare `IP` (default port), or `localhost[:PORT]`.
fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    let normalized = arg.replace("localhost", "127.0.0.1");

    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }

    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(format!(
        "Invalid bind address: '{}'. Expected format: IP:PORT or IP or 'localhost'",
        arg
    ))
}

fn print_usage() {
    eprintln!("Usage: signal_server [BIND_ADDR]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  BIND_ADDR    Address to bind to (default: 0.0.0.0:$PORT or 0.0.0.0:{DEFAULT_PORT})");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let config = match args.get(1) {
        Some(addr_str) => match parse_bind_addr(addr_str) {
            Ok(addr) => ServerConfig::with_addr(addr),
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        },
        None => ServerConfig::from_env(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pairlink=debug".parse()?)
                .add_directive("signal_server=debug".parse()?),
        )
        .init();

    let server = std::sync::Arc::new(SignalServer::new(config));
    tracing::info!(addr = %server.bind_addr(), "Starting signaling server");

    // Periodic stats
    let reporter = std::sync::Arc::clone(&server);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(30));
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let stats = reporter.stats().await;
            tracing::info!(
                online = stats.active_connections,
                rooms = stats.rooms,
                waiting = stats.waiting_rooms,
                paired = stats.paired_rooms,
                relayed = stats.signals_relayed,
                "Server stats"
            );
        }
    });

    server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
