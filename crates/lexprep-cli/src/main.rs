/// Lexprep CLI - adaptive LSAT practice backend.
///
/// The binary stays thin: argument parsing, a tracing subscriber, config
/// loading, and a dispatch into `lexprep-core` services per subcommand.
mod commands;

use clap::Parser;
use lexprep_core::config::Config;
use tracing_subscriber::EnvFilter;

/// Adaptive LSAT practice backend
#[derive(Parser)]
#[command(name = "lexprep")]
#[command(version)]
#[command(about = "Adaptive LSAT practice backend")]
#[command(after_help = "\
Quick start:
  1. lexprep init       — write a default configuration file
  2. lexprep generate   — generate one question batch
  3. lexprep drill      — serve an adaptive drill
  4. lexprep worker     — run the background generation worker")]
struct Cli {
    /// Path to config.toml
    #[arg(
        short = 'c',
        long,
        global = true,
        default_value = "~/.lexprep/config.toml"
    )]
    config: String,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init(commands::InitArgs),
    /// Generate one question batch
    Generate(commands::GenerateArgs),
    /// Serve an adaptive drill for a user
    Drill(commands::DrillArgs),
    /// Submit an answer for a user
    Answer(commands::AnswerArgs),
    /// Run the background generation worker until Ctrl+C
    Worker(commands::WorkerArgs),
    /// Show inventory, queue, and spend counters
    Status(commands::StatusArgs),
    /// Export the servable item set as JSON
    Export(commands::ExportArgs),
    /// Import items from a JSON export
    Import(commands::ImportArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG, when set, wins over the flags.
    let filter = match (std::env::var("RUST_LOG").is_ok(), cli.verbose, cli.quiet) {
        (true, _, _) => EnvFilter::from_default_env(),
        (_, true, _) => EnvFilter::new("lexprep=debug,lexprep_core=debug,info"),
        (_, _, true) => EnvFilter::new("error"),
        _ => EnvFilter::new("lexprep=info,lexprep_core=info,warn"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(cli.verbose)
        .compact()
        .init();

    // `init` manages its own config lifecycle.
    if let Commands::Init(args) = &cli.command {
        return commands::init::execute(args, &cli.config);
    }

    let config = Config::load(Some(&cli.config)).map_err(|e| {
        anyhow::anyhow!("could not load config: {e} ('lexprep init' writes a starter file)")
    })?;

    match cli.command {
        Commands::Init(_) => unreachable!("handled above"),
        Commands::Generate(args) => commands::generate::execute(args, config).await,
        Commands::Drill(args) => commands::drill::execute(args, config).await,
        Commands::Answer(args) => commands::answer::execute(args, config).await,
        Commands::Worker(args) => commands::worker::execute(args, config).await,
        Commands::Status(args) => commands::status::execute(args, config).await,
        Commands::Export(args) => commands::transfer::export(args, config).await,
        Commands::Import(args) => commands::transfer::import(args, config).await,
    }
}
