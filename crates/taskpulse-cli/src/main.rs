use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "taskpulse", version, about = "TaskPulse smart-scheduling CLI")]
struct Cli {
    /// Task file (JSON array). Defaults to tasks.json in the data directory
    #[arg(long, global = true)]
    tasks: Option<PathBuf>,
    /// Evaluate as of this instant instead of the current time (RFC 3339)
    #[arg(long, global = true)]
    now: Option<String>,
    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,
    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deadline pressure per task
    Pressure {
        /// Include completed tasks
        #[arg(long)]
        all: bool,
    },
    /// Overcommitted time windows
    Conflicts,
    /// Prioritization suggestions
    Suggest,
    /// Adjusted estimates, realistic deadlines and procrastination risk
    Estimate {
        /// Only this task
        id: Option<String>,
    },
    /// Learn from a completed task
    Learn {
        /// Task ID
        id: String,
    },
    /// Learned estimation patterns
    Patterns {
        #[command(subcommand)]
        action: commands::patterns::PatternsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Show the timers that would be armed for the current tasks
    Plan,
    /// Run the reminder loop until interrupted
    Watch,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let ctx = match commands::Context::new(cli.tasks, cli.now.as_deref(), cli.json) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Pressure { all } => commands::pressure::run(&ctx, all),
        Commands::Conflicts => commands::conflicts::run(&ctx),
        Commands::Suggest => commands::suggest::run(&ctx),
        Commands::Estimate { id } => commands::estimate::run(&ctx, id.as_deref()),
        Commands::Learn { id } => commands::learn::run(&ctx, &id),
        Commands::Patterns { action } => commands::patterns::run(&ctx, action),
        Commands::Config { action } => commands::config::run(&ctx, action),
        Commands::Plan => commands::plan::run(&ctx),
        Commands::Watch => commands::watch::run(&ctx),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
