//! hopr-smoke - Operate the local smoke test cluster by hand
//!
//! Exposes the harness pieces outside of `cargo test`:
//! - topology dump and sanity check
//! - stress option resolution
//! - port probes
//! - setup / teardown through the bootstrap script

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use hopr_smoke_core::{check_topology_strict, nodes, StressArgs, StressConfig};
use hopr_smoke_harness::fixture::{FixtureConfig, DEFAULT_LOG_DIR};
use hopr_smoke_harness::{probe_cluster, wait_for_cluster, ClusterScript, ShellScript, DEFAULT_SCRIPT};

#[derive(Parser)]
#[command(name = "hopr-smoke")]
#[command(about = "Local 7 node cluster tooling for the HOPR smoke tests")]
struct Args {
    /// Enable verbose logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the cluster topology as JSON
    Topology,

    /// Check the topology for duplicate or malformed entries
    Sanity,

    /// Resolve the stress test options and print them as JSON
    StressOptions {
        #[command(flatten)]
        stress: StressArgs,
    },

    /// Report which node ports accept connections
    Probe,

    /// Wait until every node's API port accepts connections
    Wait {
        /// How long to wait, e.g. "90s" or "2m"
        #[arg(long, default_value = "60s", value_parser = humantime::parse_duration)]
        timeout: Duration,
    },

    /// Set the cluster up and leave it running
    Setup {
        /// Name used for the setup log file
        #[arg(long, default_value = "manual")]
        module: String,

        /// Directory for the setup log
        #[arg(long, default_value = DEFAULT_LOG_DIR)]
        log_dir: PathBuf,

        /// Bootstrap script
        #[arg(long, default_value = DEFAULT_SCRIPT)]
        script: PathBuf,
    },

    /// Tear a running cluster down
    Teardown {
        /// Bootstrap script
        #[arg(long, default_value = DEFAULT_SCRIPT)]
        script: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Commands::Topology => {
            println!("{}", serde_json::to_string_pretty(nodes())?);
        }

        Commands::Sanity => {
            check_topology_strict(nodes()).context("Topology sanity check failed")?;
            info!("Topology OK: {} nodes", nodes().len());
        }

        Commands::StressOptions { stress } => {
            let config = StressConfig::from(stress);
            println!("{}", serde_json::to_string_pretty(&config)?);
        }

        Commands::Probe => {
            let report = probe_cluster(nodes()).await;
            println!("{}", serde_json::to_string_pretty(&report)?);

            let down: Vec<&str> = report.iter().filter(|r| !r.is_up()).map(|r| r.id).collect();
            if !down.is_empty() {
                bail!("Nodes not reachable: {}", down.join(", "));
            }
        }

        Commands::Wait { timeout } => {
            info!(
                "Waiting up to {} for {} node APIs",
                humantime::format_duration(timeout),
                nodes().len()
            );
            wait_for_cluster(nodes(), timeout).await?;
            info!("All node APIs are reachable");
        }

        Commands::Setup {
            module,
            log_dir,
            script,
        } => {
            let log_path = FixtureConfig { log_dir }.log_path(&module);
            info!("Creating a 7 node cluster from source");
            info!("Setup log: {}", log_path.display());
            ShellScript::new(script).setup(&log_path)?;
            warn!("Cluster left running; use `hopr-smoke teardown` to stop it");
        }

        Commands::Teardown { script } => {
            info!("Tearing down the 7 node cluster from source");
            ShellScript::new(script).cleanup()?;
        }
    }

    Ok(())
}
