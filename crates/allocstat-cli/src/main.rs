use clap::{Parser, Subcommand};

mod commands;

use commands::OutputFormat;

#[derive(Parser)]
#[command(
    name = "allocstat",
    about = "allocstat — classify job allocations and summarize job status",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bucket a snapshot's allocations by status, health, and canary.
    Classify {
        /// JSON snapshot with `job` and `allocations`
        #[arg(short, long)]
        snapshot: String,
        /// TOML file overriding per-job-type status priorities
        #[arg(short, long)]
        config: Option<String>,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Report the aggregate job status, canary promotion state, and counts.
    Status {
        #[arg(short, long)]
        snapshot: String,
        #[arg(short, long)]
        config: Option<String>,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Print the effective status priorities as TOML.
    ///
    /// Without --config this prints the built-in defaults, which makes a
    /// starting point for a custom priorities file.
    Config {
        #[arg(short, long)]
        config: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("allocstat=info".parse()?)
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Classify { snapshot, config, format } => {
            commands::classify::run(&snapshot, config.as_deref(), format)
        }
        Commands::Status { snapshot, config, format } => {
            commands::status::run(&snapshot, config.as_deref(), format)
        }
        Commands::Config { config } => {
            commands::config::run(config.as_deref())
        }
    }
}
