use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
use commands::analyze::AnalyzeArgs;

#[derive(Parser)]
#[command(name = "kasane")]
#[command(about = "Aggregated security analysis: static analyzers + LLM, one report")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a project directory and emit a merged report
    Analyze(AnalyzeArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "kasane_aggregator=debug,kasane=debug"
    } else {
        "kasane_aggregator=warn,kasane=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Analyze(args) => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(commands::analyze::execute(args, cli.verbose))
        }
    }
}
