//! Headless Wayfare engine binary: a `clap` subcommand shape
//! (`serve`/`run`) over a "resolve a state dir, build an `AppState`,
//! dispatch" structure — the two commands a stateless planning service
//! needs.

use std::net::SocketAddr;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use uuid::Uuid;
use wayfare_agents::EngineConfig;
use wayfare_server::{serve, AppState};

#[derive(Parser, Debug)]
#[command(name = "wayfare-engine")]
#[command(about = "Headless Wayfare travel-planning engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Runs the HTTP server exposing the run/stream/resume/what-if API.
    Serve {
        #[arg(long, alias = "host", default_value = "127.0.0.1")]
        hostname: String,
        #[arg(long, default_value_t = 8080)]
        port: u16,
        #[arg(long)]
        state_dir: Option<String>,
    },
    /// Runs one trip-planning request to completion (or first
    /// suspension) from the command line, printing the final state.
    Run {
        query: String,
        #[arg(long)]
        state_dir: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").with_target(false).init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { hostname, port, state_dir } => {
            let state = build_state(state_dir).await?;
            let addr: SocketAddr = format!("{hostname}:{port}").parse().context("invalid hostname or port")?;
            info!(%addr, state_dir = %state.config.state_dir, "starting wayfare-engine");
            serve(addr, state).await?;
        }
        Command::Run { query, state_dir } => {
            let state = build_state(state_dir).await?;
            let session_id = Uuid::new_v4().to_string();
            let user_id = Uuid::new_v4().to_string();
            let run_id = Uuid::new_v4().to_string();
            let planner_state = wayfare_types::PlannerState::new(&session_id, &user_id, &query);
            let result = state.scheduler.run(&run_id, planner_state).await?;
            println!("{}", serde_json::to_string_pretty(&result.state)?);
        }
    }

    Ok(())
}

async fn build_state(state_dir_flag: Option<String>) -> anyhow::Result<AppState> {
    let mut config = EngineConfig::from_env();
    if let Some(dir) = state_dir_flag.filter(|d| !d.trim().is_empty()) {
        config.state_dir = dir;
    }
    AppState::bootstrap(config).await
}
