use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};

mod error;
mod filter;
mod loader;
mod models;
mod query;
mod report;
mod stats;
mod view;

use error::SignalDeckError;
use filter::FilterState;
use loader::DatasetCache;
use models::{IntentBucket, State, View};
use view::RenderRequest;

#[derive(Parser)]
#[command(name = "signaldeck")]
#[command(about = "Investor intent analytics over scored SEC Form D filings", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SelectionArgs {
    /// Root directory holding one folder per state
    #[arg(long, default_value = "Outputs")]
    data_dir: PathBuf,
    #[arg(long, value_enum, ignore_case = true, default_value = "ca")]
    state: State,
    #[arg(long, value_enum, default_value_t = View::Founder)]
    view: View,
    /// Sector filter; repeat for multiple sectors
    #[arg(long = "sector")]
    sectors: Vec<String>,
    /// Intent bucket filter; defaults to hot and warm
    #[arg(long = "intent", value_enum)]
    intents: Vec<IntentBucket>,
    /// Minimum investor intent score, inclusive
    #[arg(long, default_value_t = filter::DEFAULT_MIN_SCORE)]
    min_score: f64,
    /// Free-text instruction, e.g. "who is moving fastest in fintech"
    #[arg(long)]
    query: Option<String>,
}

impl SelectionArgs {
    fn request(&self) -> RenderRequest {
        let buckets = if self.intents.is_empty() {
            vec![IntentBucket::Hot, IntentBucket::Warm]
        } else {
            self.intents.clone()
        };
        RenderRequest {
            state: self.state,
            view: self.view,
            filter: FilterState {
                sectors: self.sectors.clone(),
                buckets,
                min_score: self.min_score,
            },
            query: self.query.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a dashboard view to stdout
    Show {
        #[command(flatten)]
        selection: SelectionArgs,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Write a markdown report for a view
    Report {
        #[command(flatten)]
        selection: SelectionArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Show { selection, format } => {
            let request = selection.request();
            let mut cache = DatasetCache::new(selection.data_dir.clone());
            match view::render(&mut cache, &request) {
                Ok(model) => match format {
                    OutputFormat::Text => print!("{}", report::render_text(&model)),
                    OutputFormat::Json => {
                        let json = serde_json::to_string_pretty(&model)
                            .context("serializing render model")?;
                        println!("{json}");
                    }
                },
                Err(SignalDeckError::EmptyResult) => {
                    println!("No investors matched the selected filters.");
                }
                Err(err) => return Err(err).context("rendering view"),
            }
        }
        Commands::Report { selection, out } => {
            let request = selection.request();
            let mut cache = DatasetCache::new(selection.data_dir.clone());
            let model = view::render(&mut cache, &request).context("building report")?;
            std::fs::write(&out, report::render_markdown(&model, &request))
                .with_context(|| format!("writing {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
