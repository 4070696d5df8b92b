//! assorted-bricks - CLI tool to sort a LEGO inventory into storage bins.

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rand::Rng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use assorted_bricks::config::MAX_SEED;
use assorted_bricks::{
    parse_inventory_file, parse_seed, ClusteringResult, HierarchyCatalog, InputFormat, Pipeline,
    SetCache, SetSource, DEFAULT_CLUSTERS,
};

/// Cluster a LEGO part inventory into labelled storage bins.
#[derive(Parser, Debug)]
#[command(name = "assorted-bricks")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Hierarchy catalog (JSON)
    #[arg(short, long)]
    catalog: PathBuf,

    /// Inventory file (Rebrickable CSV, BrickStore XML, LDCad PBG or Rebrickable JSON)
    #[arg(short, long, required_unless_present = "set", conflicts_with = "set")]
    input: Option<PathBuf>,

    /// Set number to load from the set cache
    #[arg(long, requires = "set_dir")]
    set: Option<String>,

    /// Directory of cached set inventories (<set>.json)
    #[arg(long)]
    set_dir: Option<PathBuf>,

    /// Number of bins
    #[arg(short = 'k', long, default_value_t = DEFAULT_CLUSTERS)]
    clusters: usize,

    /// Seed for the clustering initialization (0-4294967295)
    #[arg(long, value_parser = seed_arg)]
    seed: Option<u64>,

    /// Draw a random seed and report it
    #[arg(long, conflicts_with = "seed")]
    random_seed: bool,

    /// Input format, inferred from the extension or content when omitted
    #[arg(short, long)]
    format: Option<InputFormat>,

    /// Write the full result as JSON
    #[arg(long)]
    json: bool,

    /// Output file path (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn seed_arg(s: &str) -> std::result::Result<u64, String> {
    parse_seed(s).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let catalog = HierarchyCatalog::from_path(&args.catalog)
        .with_context(|| format!("Failed to load catalog {}", args.catalog.display()))?;
    info!("Loaded {} hierarchy node(s)", catalog.len());

    let parsed = match (&args.input, &args.set, &args.set_dir) {
        (Some(input), _, _) => {
            info!("Processing: {}", input.display());
            parse_inventory_file(input, args.format)
                .with_context(|| format!("Failed to parse {}", input.display()))?
        }
        (None, Some(set), Some(dir)) => {
            info!("Processing set {}", set);
            SetCache::new(dir)
                .inventory(set)
                .with_context(|| format!("Failed to load set {}", set))?
        }
        _ => anyhow::bail!("Either --input or --set with --set-dir is required"),
    };

    let seed = if args.random_seed {
        let seed = rand::thread_rng().gen_range(0..=MAX_SEED);
        info!("Random seed: {}", seed);
        Some(seed)
    } else {
        args.seed
    };

    let result = Pipeline::new(&catalog)
        .run_parsed(parsed, args.clusters, seed)
        .context("Clustering failed")?;

    if result.effective_k < result.requested_k {
        warn!(
            "Only {} distinct part kind(s); {} bin(s) left empty",
            result.effective_k,
            result.requested_k - result.effective_k
        );
    }

    let report = if args.json {
        serde_json::to_string_pretty(&result)?
    } else {
        render_report(&result)
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, &report)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Generated: {}", path.display());
        }
        None => println!("{}", report),
    }

    Ok(())
}

/// Plain-text listing of every non-empty bin.
fn render_report(result: &ClusteringResult) -> String {
    let mut out = String::new();
    for (n, bin) in result.non_empty_clusters().enumerate() {
        let _ = writeln!(
            out,
            "Bin {}: {} ({} pieces, {} parts)",
            n + 1,
            bin.label,
            bin.quantity,
            bin.part_count
        );
        for record in result.members(bin) {
            let _ = writeln!(
                out,
                "  {} color {} x{}",
                record.catalog_id, record.color, record.quantity
            );
        }
    }
    let _ = write!(
        out,
        "seed {}, inertia {:.4}",
        result.seed, result.stats.inertia
    );
    if let Some(silhouette) = result.stats.silhouette {
        let _ = write!(out, ", silhouette {:.4}", silhouette);
    }
    out
}
