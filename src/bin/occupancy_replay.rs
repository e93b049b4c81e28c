use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

use anyhow::Context;
use clap::Parser;
use log::info;
use occupancy_rs::OccupancyConfig;
use occupancy_rs::identity::{IdentitySeedLoader, JsonSeedFile};
use occupancy_rs::integration::{
    CsvLedgerSink, JsonLinesSource, NoopExtractor, OccupancyPipeline,
};

#[derive(Parser)]
#[command(author, version, about = "Replay recorded detections through the occupancy tracker")]
struct Args {
    /// JSON-lines file of tracked detections, one frame per line
    #[arg(long)]
    detections: PathBuf,
    /// Load a run config from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    /// JSON file of known identities to seed the registry with
    #[arg(long)]
    seeds: Option<PathBuf>,
    /// Where to write the entry/exit ledger
    #[arg(long, default_value = "occupancy.csv")]
    output: PathBuf,
    /// Override the config's frame sampling
    #[arg(long)]
    sample_every: Option<u32>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => OccupancyConfig::load(path)?,
        None => OccupancyConfig::default(),
    };
    if let Some(n) = args.sample_every {
        config.sample_every = n;
        config.validate()?;
    }

    let source = JsonLinesSource::open(&args.detections)
        .with_context(|| format!("opening {}", args.detections.display()))?;
    let sink = CsvLedgerSink::new(&args.output);
    let mut pipeline = OccupancyPipeline::from_config(source, NoopExtractor, sink, &config);
    if config.offload_extraction {
        pipeline = pipeline.offload_extraction();
    }

    if let Some(path) = &args.seeds {
        let pairs = JsonSeedFile::new(path).load()?;
        let registry = pipeline.registry().clone();
        let added = registry
            .seed(pairs)
            .with_context(|| format!("seeding registry from {}", path.display()))?;
        info!("loaded {} known identities", added);
    }

    let stop = AtomicBool::new(false);
    let summary = pipeline.run(&stop).context("replay failed")?;

    let m = summary.metrics;
    println!(
        "Replay done -> inside {}, frames {}/{}, entries {}, exits {}, dropped detections {}",
        summary.inside_count, m.frames_processed, m.frames_seen, m.entries, m.exits, m.detections_dropped
    );
    println!("Ledger written to {}", args.output.display());
    Ok(())
}
