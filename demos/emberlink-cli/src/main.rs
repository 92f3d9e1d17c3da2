//! `emberlink`: text-mode demo client.
//!
//! Connects to a game server, logs in, prints the world every time it
//! changes, and walks the player in a square. Ctrl-C leaves cleanly.
//!
//! ## Configuration (flags / env)
//!
//! | Flag | Env | Default |
//! |---|---|---|
//! | `-s`, `--host` | `EMBERLINK_HOST` | `localhost` |
//! | `-p`, `--port` | `EMBERLINK_PORT` | `9190` |
//! | `-n`, `--name` | `EMBERLINK_NAME` | `rsClient` |
//! | `--tick-rate` | `EMBERLINK_TICK_RATE` | `20` |
//! | `-v`, `--verbose` | | off |
//!
//! `RUST_LOG` overrides the log filter chosen by `--verbose`.

mod render;
mod walk;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use emberlink::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::walk::SquareWalk;

/// Reason sent to the server when the player quits.
const QUIT_MESSAGE: &str = "Client disconnected";

/// How long the demo walks in one direction before turning.
const WALK_LEG: Duration = Duration::from_secs(1);

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "emberlink", about = "Emberlink demo game client", version)]
struct Args {
    /// Server hostname
    #[arg(short = 's', long, env = "EMBERLINK_HOST", default_value = "localhost")]
    host: String,

    /// Server port
    #[arg(short, long, env = "EMBERLINK_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Player name
    #[arg(short, long, env = "EMBERLINK_NAME", default_value = "rsClient")]
    name: String,

    /// Outbound input ticks per second (0 sends changes immediately)
    #[arg(long, env = "EMBERLINK_TICK_RATE", default_value_t = TickConfig::DEFAULT_TICK_RATE_HZ)]
    tick_rate: u32,

    /// Log protocol traffic and dispatch decisions
    #[arg(short, long)]
    verbose: bool,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let (client, handle) = ClientBuilder::new()
        .connect_to(&args.host, args.port)
        .name(&args.name)
        .tick_rate(args.tick_rate)
        .build()
        .await?;
    tracing::info!(peer = %client.peer_addr(), name = %args.name, "connected to server");

    tokio::spawn(report_state(handle.clone()));
    tokio::spawn(redraw_on_change(handle.clone()));
    tokio::spawn(walk_in_square(handle.clone()));
    tokio::spawn(quit_on_ctrl_c(handle));

    let end = client.run().await?;
    println!("{end}");
    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

async fn report_state(handle: ClientHandle) {
    let mut state = handle.state();
    while state.changed().await.is_ok() {
        let current = *state.borrow_and_update();
        tracing::debug!(state = %current, "connection state changed");
        if current.is_active() {
            println!("Connection established");
        }
    }
}

async fn redraw_on_change(handle: ClientHandle) {
    let mut world = handle.world();
    while world.changed().await.is_ok() {
        let snapshot = Arc::clone(&world.borrow_and_update());
        print!("{}", render::render(&snapshot));
    }
}

/// Stand-in for real input: turn left every [`WALK_LEG`].
async fn walk_in_square(handle: ClientHandle) {
    let mut walk = SquareWalk::default();
    let mut legs = tokio::time::interval(WALK_LEG);
    // The first tick completes immediately; start walking one leg in.
    legs.tick().await;
    loop {
        legs.tick().await;
        if handle.set_intent(walk.turn()).await.is_err() {
            break;
        }
    }
}

async fn quit_on_ctrl_c(handle: ClientHandle) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "can't listen for Ctrl-C");
        return;
    }
    if handle.disconnect(QUIT_MESSAGE).await.is_err() {
        tracing::debug!("client already stopped");
    }
}
