use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cmd;

#[derive(Parser)]
#[command(name = "planner")]
#[command(version, about = "Plan-review workflow sequencer with QR gates")]
#[command(subcommand_negates_reqs = true)]
pub struct Cli {
    /// Step to route: a number in 1..=total-steps, or 'review' for the checkpoint
    #[arg(long, required = true)]
    pub step: Option<String>,

    /// Total steps in the workflow (at least 13)
    #[arg(long, required = true)]
    pub total_steps: Option<u32>,

    /// Iteration of the current QR loop
    #[arg(long, default_value = "1")]
    pub qr_iteration: u32,

    /// The step is revisited to fix QR findings
    #[arg(long)]
    pub qr_fail: bool,

    /// QR outcome for gate steps: pass or fail
    #[arg(long)]
    pub qr_status: Option<String>,

    /// Number of findings the quality reviewer reported
    #[arg(long)]
    pub qr_findings: Option<u32>,

    /// Quality reviewer output to read the verdict and findings from
    #[arg(long)]
    pub qr_report: Option<PathBuf>,

    /// Confidence percentage below which QR results are flagged. Overrides planner.toml.
    #[arg(long)]
    pub qr_confidence_threshold: Option<f64>,

    /// Output format: xml, json. Overrides planner.toml.
    #[arg(long)]
    pub format: Option<String>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    /// Path to planner.toml (defaults to .planner/planner.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the workflow steps
    Steps,
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default planner.toml file
    Init,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env("PLANNER_LOG")
                .unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match &cli.command {
        None => cmd::cmd_route(&cli, project_dir)?,
        Some(Commands::Steps) => cmd::cmd_steps()?,
        Some(Commands::Config { command }) => {
            cmd::cmd_config(&project_dir, cli.config.as_deref(), command.clone())?
        }
    }

    Ok(())
}
