//! `tracker-cli` — the external collaborator that drives the `Proxy` from
//! the command line for manual inspection and spoiler-log replay, standing
//! in for the DOM UI which is out of scope for this workspace.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracker_client::{Proxy, ProxyConfig};
use tracker_protocol::PlayerInfo;

#[derive(Parser)]
#[command(name = "tracker-cli", about = "Drive the seed logic tracker engine from the command line")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Load a rules document and print the resulting snapshot.
    Inspect {
        #[arg(long)]
        rules: PathBuf,
        #[arg(long, default_value_t = 1)]
        player_id: u32,
        #[arg(long)]
        game_name: String,
    },
    /// Replay a spoiler log against a rules document, sphere by sphere.
    Replay {
        #[arg(long)]
        rules: PathBuf,
        #[arg(long)]
        spoiler: PathBuf,
        #[arg(long, default_value_t = 1)]
        player_id: u32,
        #[arg(long)]
        game_name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tracker_cli=info,tracker_engine=info,tracker_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match cli.command {
        CliCommand::Inspect { rules, player_id, game_name } => inspect(rules, player_id, game_name).await,
        CliCommand::Replay { rules, spoiler, player_id, game_name } => replay_spoiler(rules, spoiler, player_id, game_name).await,
    }
}

async fn inspect(rules_path: PathBuf, player_id: u32, game_name: String) -> anyhow::Result<()> {
    let proxy = Proxy::new(ProxyConfig::default());
    proxy.ensure_ready(Duration::from_secs(10)).await?;

    let rules_data = read_json(&rules_path)?;
    let snapshot = proxy.load_rules(rules_data, PlayerInfo { player_id, game_name }).await?;

    let reachable = snapshot.region_reachability.values().filter(|status| **status != tracker_domain::ReachabilityStatus::Unreachable).count();
    tracing::info!(regions_reachable = reachable, checked = snapshot.checked_locations.len(), "rules loaded");
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

async fn replay_spoiler(rules_path: PathBuf, spoiler_path: PathBuf, player_id: u32, game_name: String) -> anyhow::Result<()> {
    let proxy = Proxy::new(ProxyConfig::default());
    proxy.ensure_ready(Duration::from_secs(10)).await?;

    let rules_data = read_json(&rules_path)?;
    proxy.load_rules(rules_data, PlayerInfo { player_id, game_name }).await?;

    let spoiler_text = std::fs::read_to_string(&spoiler_path)?;
    let spheres = tracker_client::parse_sphere_log(&spoiler_text)?;

    let mismatches = tracker_client::replay(&proxy, &spheres).await?;
    if mismatches.is_empty() {
        println!("spoiler log replay matched the engine at every sphere ({} spheres)", spheres.len());
        Ok(())
    } else {
        for mismatch in &mismatches {
            println!("sphere {}: expected {:?}, engine computed {:?}", mismatch.sphere_index, mismatch.expected, mismatch.actual);
        }
        anyhow::bail!("{} sphere(s) diverged from the spoiler log", mismatches.len());
    }
}

fn read_json(path: &PathBuf) -> anyhow::Result<serde_json::Value> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}
