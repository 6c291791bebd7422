//! Supplier Risk CLI
//!
//! Usage:
//!   supply-risk upload demos/suppliers.json
//!   supply-risk refresh --articles demos/articles.json --gdelt
//!   supply-risk score
//!   supply-risk breakdown "Acme Electronics"
//!   supply-risk alternatives "Acme Electronics"
//!   supply-risk recommend "Acme Electronics"
//!   supply-risk predict "Acme Electronics"
//!   supply-risk export --output data/suppliers.geojson

use anyhow::Result;
use clap::{Parser, Subcommand};
use risk_engine::collector::{EventSource, FileSource};
use risk_engine::export::to_geojson;
use risk_engine::loader::load_suppliers;
use risk_engine::text::truncate_chars;
use risk_engine::{EngineConfig, RiskEngine};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "supply-risk",
    about = "Score suppliers against live disruption signals"
)]
struct Args {
    /// Data directory (overrides SUPPLY_RISK_DATA_DIR)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Never call the external geocoder; use the cache only
    #[arg(long)]
    offline: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replace the supplier set from a JSON file
    Upload { file: PathBuf },

    /// Collect, filter and store events
    Refresh {
        /// JSON article files to read
        #[arg(short, long)]
        articles: Vec<PathBuf>,

        /// Also query GDELT for every supplier city and country
        #[arg(long)]
        gdelt: bool,
    },

    /// Recompute every supplier's score
    Score,

    /// Show the scored events behind one supplier's score
    Breakdown { supplier: String },

    /// Suggest alternative sources for one supplier
    Alternatives { supplier: String },

    /// Rule-based response plan for one supplier
    Recommend { supplier: String },

    /// 72h / 7d / 30d disruption outlook for one supplier
    Predict { supplier: String },

    /// List live deadlines found in stored events
    Countdowns,

    /// Write scored suppliers as GeoJSON
    Export {
        #[arg(short, long, default_value = "suppliers.geojson")]
        output: PathBuf,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = EngineConfig::from_env();
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if args.offline {
        config.geocoder.enabled = false;
    }
    let engine = RiskEngine::from_config(config)?;

    match args.command {
        Command::Upload { file } => {
            let suppliers = load_suppliers(&file)?;
            let report = engine.upload_suppliers(suppliers).await?;
            info!(
                "Uploaded {} suppliers ({} geocoded)",
                report.suppliers, report.geocoded
            );
        }

        Command::Refresh { articles, gdelt } => {
            let mut sources: Vec<Arc<dyn EventSource>> = articles
                .into_iter()
                .map(|path| Arc::new(FileSource::new(path)) as Arc<dyn EventSource>)
                .collect();
            if gdelt {
                sources.extend(engine.default_sources().await?);
            }
            if sources.is_empty() {
                warn!("No sources given; stored events will be cleared");
            }

            let report = engine.refresh_events(sources).await?;
            info!(
                "Collected {} articles from {} sources ({} failed, {} timed out)",
                report.collection.articles,
                report.collection.sources,
                report.collection.failed,
                report.collection.timed_out
            );
            info!(
                "Filter: {} approved, rejected L1 {} / L2 {} / L3 {}, {} oracle calls",
                report.filter.approved,
                report.filter.rejected_l1,
                report.filter.rejected_l2,
                report.filter.rejected_l3,
                report.filter.oracle_calls
            );
            info!("Stored {} events ({} expired)", report.stored, report.expired);
        }

        Command::Score => {
            let mut suppliers = engine.recompute_all().await?;
            suppliers.sort_by(|a, b| b.risk_score.total_cmp(&a.risk_score));

            info!("{}", "=".repeat(60));
            for s in &suppliers {
                info!(
                    "  {:5.1} | {:6} | {:30} | {}",
                    s.risk_score,
                    s.risk_level.as_str(),
                    truncate_chars(&s.name, 30),
                    s.event_summary
                );
            }
            info!("{}", "=".repeat(60));
        }

        Command::Breakdown { supplier } => {
            print_json(&engine.breakdown(&supplier).await?)?;
        }

        Command::Alternatives { supplier } => {
            print_json(&engine.alternatives_for(&supplier).await?)?;
        }

        Command::Recommend { supplier } => {
            print_json(&engine.recommendations_for(&supplier).await?)?;
        }

        Command::Predict { supplier } => {
            print_json(&engine.predictions_for(&supplier).await?)?;
        }

        Command::Countdowns => {
            print_json(&engine.countdowns().await?)?;
        }

        Command::Export { output } => {
            let suppliers = engine.list_suppliers().await?;
            let collection = to_geojson(&suppliers);
            info!(
                "Writing {} of {} suppliers to {:?}",
                collection.features.len(),
                suppliers.len(),
                output
            );
            let writer = BufWriter::new(File::create(&output)?);
            serde_json::to_writer_pretty(writer, &collection)?;
        }
    }

    Ok(())
}
