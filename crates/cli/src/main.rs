use anyhow::Result;
use clap::{Parser, Subcommand};
use cli::output::{self, ComparisonView, NormalizedView};
use lexalign_core::config;
use lexalign_core::config::AppConfig;
use lexalign_core::pipeline;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build { json } => {
            let cfg = config::load(cli.config.as_deref())?;
            run_build(cfg, json).await
        }
        Commands::Normalize { text, json } => run_normalize(&text, json),
        Commands::Compare { a, b, no_fuzzy, json } => run_compare(&a, &b, !no_fuzzy, json),
    }
}

#[derive(Parser)]
#[command(name = "lexalign")]
#[command(about = "Align Strong's Hebrew entries with corpus lexemes", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the mapping and write its artifacts
    Build {
        /// Output JSON summary
        #[arg(long)]
        json: bool,
    },
    /// Print the consonantal skeleton of each argument
    Normalize {
        #[arg(required = true)]
        text: Vec<String>,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Score two lemmas against each other
    Compare {
        a: String,
        b: String,
        /// Disable the edit-distance tier
        #[arg(long)]
        no_fuzzy: bool,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
}

async fn run_build(cfg: AppConfig, json: bool) -> Result<()> {
    debug!("Building with inputs {:?}", cfg.inputs);
    let summary = pipeline::run(cfg).await?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::summary_json(&summary))?
        );
    } else {
        println!("{}", output::summary_line(&summary));
        if let Some(warning) = &summary.coverage_warning {
            println!("{warning}");
        }
        for path in &summary.artifacts {
            println!("  {}", path.display());
        }
    }
    Ok(())
}

fn run_normalize(texts: &[String], json: bool) -> Result<()> {
    let views: Vec<NormalizedView> = texts.iter().map(|t| NormalizedView::new(t)).collect();
    if json {
        println!("{}", serde_json::to_string_pretty(&views)?);
    } else {
        for view in &views {
            println!("{}", view.line());
        }
    }
    Ok(())
}

fn run_compare(a: &str, b: &str, fuzzy: bool, json: bool) -> Result<()> {
    let view = ComparisonView::new(a, b, fuzzy);
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        println!("{}", view.line());
    }
    Ok(())
}
