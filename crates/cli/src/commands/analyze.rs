//! Full-pipeline command: discover files, run the static analyzers and the
//! batched model analysis, merge everything, and render one report.

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use kasane_aggregator::{
    collect_files,
    llm::{LlmProvider, MockProvider, OpenAiProvider},
    tools::{BanditRunner, SemgrepRunner},
    AnalysisEngine, DiscoveryConfig, EngineConfig, OutputFormat, ReportGenerator, RunError,
    Severity,
};

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Project directory to analyze
    #[arg(value_name = "PATH")]
    pub input: PathBuf,

    #[arg(short, long, default_value = "markdown")]
    pub format: OutputFormat,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Skip the language-model stage
    #[arg(long)]
    pub no_llm: bool,

    /// Skip the static analyzer stage
    #[arg(long)]
    pub no_analyzers: bool,

    #[arg(long, default_value = "gpt-4o")]
    pub model: String,

    #[arg(long)]
    pub openai_api_key: Option<String>,

    /// Maximum files per model batch
    #[arg(long, default_value = "10")]
    pub batch_files: usize,

    /// Maximum cumulative payload per model batch, in bytes
    #[arg(long, default_value = "200000")]
    pub batch_payload: u64,

    /// Use the built-in mock provider instead of a real model (dry runs)
    #[arg(long, hide = true)]
    pub mock_llm: bool,
}

pub async fn execute(args: AnalyzeArgs, verbose: bool) -> Result<()> {
    let start = Instant::now();

    println!(
        "{}",
        "🔍 Kasane: aggregated security analysis".bright_blue().bold()
    );
    println!("📁 Target: {}", args.input.display());

    let files = collect_files(&args.input, &DiscoveryConfig::default())
        .with_context(|| format!("failed to scan {}", args.input.display()))?;
    println!("   {} source file(s) discovered", files.len());

    let config = EngineConfig {
        max_batch_files: args.batch_files.max(1),
        max_batch_payload: args.batch_payload.max(1),
        ..EngineConfig::default()
    };

    let mut engine = AnalysisEngine::new(config);

    if !args.no_analyzers {
        engine = engine
            .with_semgrep(SemgrepRunner::new())
            .with_bandit(BanditRunner::new());
    }

    if !args.no_llm {
        if args.mock_llm {
            engine = engine.with_provider(Arc::new(MockProvider::new()));
        } else {
            let api_key = args
                .openai_api_key
                .clone()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());

            match api_key {
                Some(api_key) => {
                    let provider: Arc<dyn LlmProvider> = Arc::new(OpenAiProvider::with_config(
                        api_key,
                        args.model.clone(),
                        0.2,
                        16_000,
                    ));
                    engine = engine.with_provider(provider);
                }
                None => {
                    eprintln!(
                        "{}",
                        "⚠️  No OpenAI API key provided (use --openai-api-key or set \
                         OPENAI_API_KEY), skipping model analysis"
                            .yellow()
                    );
                }
            }
        }
    }

    let report = match engine.run(&args.input, files).await {
        Ok(report) => report,
        Err(RunError::AllSourcesFailed { outcomes }) => {
            eprintln!("{}", "❌ All analysis sources failed:".red().bold());
            for outcome in &outcomes {
                eprintln!(
                    "   - {}: {}",
                    outcome.source,
                    outcome.error.as_deref().unwrap_or("failed")
                );
            }
            anyhow::bail!("analysis produced no usable source results");
        }
        Err(e) => return Err(e.into()),
    };

    let rendered = ReportGenerator::generate(&report, args.format)?;
    match args.output {
        Some(ref path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("📄 Report written to {}", path.display());
        }
        None => println!("\n{rendered}"),
    }

    println!("{}", "✅ Analysis complete".green().bold());
    println!(
        "📊 {} finding(s): {} / {} / {} / {}",
        report.summary.total,
        format!("{} Critical", report.summary.count_for(Severity::Critical)).red(),
        format!("{} High", report.summary.count_for(Severity::High)).bright_red(),
        format!("{} Medium", report.summary.count_for(Severity::Medium)).yellow(),
        format!("{} Low", report.summary.count_for(Severity::Low)).green(),
    );
    println!(
        "🧩 Sources: {} succeeded, {} failed",
        report.sources_succeeded(),
        report.sources_failed()
    );
    if verbose {
        println!("⏱️  Time: {:.2}s", start.elapsed().as_secs_f64());
    }

    Ok(())
}
