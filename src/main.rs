//! `spacetime` - run the space/time analysis from the command line

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use trueno_spacetime::config::HarnessConfig;
use trueno_spacetime::dataset::{generate_dataset, Dataset};
use trueno_spacetime::engine::StructuredEngine;
use trueno_spacetime::measurement::TimeAnalysis;
use trueno_spacetime::report::{aggregate, write_csv, write_json};
use trueno_spacetime::trace::{merge_space_analysis, profile_space_analysis};

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

/// Space/time analysis of the structured profiler
#[derive(Debug, Parser)]
#[command(name = "spacetime", version, about)]
struct Cli {
    /// JSON configuration file; flags below override it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// CSV or Parquet dataset (generated when omitted)
    #[arg(long, value_name = "FILE")]
    dataset: Option<PathBuf>,

    /// Sample sizes, comma separated
    #[arg(long, value_delimiter = ',', value_name = "N,..")]
    sizes: Option<Vec<usize>>,

    /// Base seed for sampling, nan injection, generation and the engine
    #[arg(long)]
    seed: Option<u64>,

    /// Percentage of cells to null before profiling
    #[arg(long, value_name = "PERCENT")]
    percent_to_nan: Option<f64>,

    /// Force one update per sample instead of engine-chosen batching
    #[arg(long)]
    no_subsampling: bool,

    /// Profile columns in parallel
    #[arg(long)]
    multiprocess: bool,

    /// Enable the data labeler
    #[arg(long)]
    data_labeler: bool,

    /// Skip the time analysis
    #[arg(long)]
    skip_time: bool,

    /// Skip the heap traces
    #[arg(long)]
    skip_space: bool,

    /// Timing records output (JSON)
    #[arg(long, value_name = "FILE")]
    times_json: Option<PathBuf>,

    /// Timing table output (CSV)
    #[arg(long, value_name = "FILE")]
    times_csv: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> Result<HarnessConfig> {
        let mut config = match &self.config {
            Some(path) => HarnessConfig::from_json_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => HarnessConfig::default(),
        };

        if let Some(dataset) = self.dataset {
            config.dataset = Some(dataset);
        }
        if let Some(sizes) = self.sizes {
            config.sample_sizes = sizes;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(percent) = self.percent_to_nan {
            config.percent_to_nan = percent;
        }
        if let Some(path) = self.times_json {
            config.output.times_json = path;
        }
        if let Some(path) = self.times_csv {
            config.output.times_csv = path;
        }
        config.allow_subsampling &= !self.no_subsampling;
        config.multiprocess |= self.multiprocess;
        config.data_labeler |= self.data_labeler;
        config.time_analysis &= !self.skip_time;
        config.space_analysis &= !self.skip_space;

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

fn load_dataset(config: &HarnessConfig) -> Result<Dataset> {
    match &config.dataset {
        Some(path) => {
            Dataset::load(path).with_context(|| format!("loading dataset {}", path.display()))
        }
        None => {
            let rows = config.generated_rows();
            tracing::info!(rows, "generating synthetic dataset");
            let mut rng = StdRng::seed_from_u64(config.seeds().generator);
            Ok(generate_dataset(&mut rng, rows)?)
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_config()?;
    let dataset = load_dataset(&config)?;
    let seeds = config.seeds();
    let options = config.profiler_options();
    let engine = StructuredEngine::new(seeds.engine);

    tracing::info!(
        rows = dataset.num_rows(),
        columns = dataset.num_columns(),
        sizes = ?config.sample_sizes,
        "starting analysis"
    );

    if config.time_analysis {
        let records = TimeAnalysis::builder(&engine)
            .options(options)
            .allow_subsampling(config.allow_subsampling)
            .percent_to_nan(config.percent_to_nan)
            .seed(seeds.sampling)
            .build()?
            .run(&config.sample_sizes, &dataset)
            .context("time analysis failed")?;

        let (records, table) = aggregate(records)?;
        write_json(&config.output.times_json, &records).with_context(|| {
            format!("writing {}", config.output.times_json.display())
        })?;
        write_csv(&config.output.times_csv, &table)
            .with_context(|| format!("writing {}", config.output.times_csv.display()))?;
    }

    if config.space_analysis {
        let profile = profile_space_analysis(
            &engine,
            &dataset,
            &options,
            config.percent_to_nan,
            seeds.sampling,
            &config.output.profile_trace,
        )
        .context("profile space analysis failed")?;

        merge_space_analysis(&engine, &profile, &config.output.merge_trace)
            .context("merge space analysis failed")?;
    }

    println!("Space/time analysis complete");
    if config.time_analysis {
        println!("  times: {}", config.output.times_json.display());
        println!("  table: {}", config.output.times_csv.display());
    }
    if config.space_analysis {
        println!("  profile trace: {}", config.output.profile_trace.display());
        println!("  merge trace:   {}", config.output.merge_trace.display());
    }
    Ok(())
}
