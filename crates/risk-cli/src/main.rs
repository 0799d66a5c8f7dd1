mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "risk")]
#[command(about = "risk-pricing orchestration CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database commands
    Db {
        #[command(subcommand)]
        cmd: DbCmd,
    },

    /// Run lifecycle commands
    Run {
        #[command(subcommand)]
        cmd: RunCmd,
    },

    /// Worker process commands
    Worker {
        #[command(subcommand)]
        cmd: WorkerCmd,
    },
}

#[derive(Subcommand)]
enum DbCmd {
    Status,
    Migrate,
}

#[derive(Subcommand)]
enum RunCmd {
    /// Submit a run request (JSON file) and fan it out into tasks.
    Submit {
        /// Path to a RunRequest JSON document.
        path: String,
    },
    /// Print a run's derived status and task counts.
    Status {
        run_id: String,
    },
}

#[derive(Subcommand)]
enum WorkerCmd {
    /// Start a worker loop, claiming and pricing tasks until shutdown.
    Run,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Db { cmd } => match cmd {
            DbCmd::Status => commands::db::status().await?,
            DbCmd::Migrate => commands::db::migrate().await?,
        },
        Commands::Run { cmd } => match cmd {
            RunCmd::Submit { path } => commands::run::submit(path).await?,
            RunCmd::Status { run_id } => commands::run::status(run_id).await?,
        },
        Commands::Worker { cmd } => match cmd {
            WorkerCmd::Run => commands::worker::run().await?,
        },
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
