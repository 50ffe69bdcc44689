use clap::Parser;
use riskcast::{DEFAULT_HISTOGRAM_BINS, Overrides, RunRequest, init_logging, run};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "riskcast")]
#[command(about = "Monte Carlo risk forecasts for a weighted portfolio")]
struct Args {
    /// Request file (.json, .yaml or .yml)
    #[arg(short, long)]
    request: PathBuf,

    /// Trading days to simulate (overrides the request)
    #[arg(short, long)]
    days: Option<i64>,

    /// Number of Monte Carlo trials (overrides the request)
    #[arg(short = 'n', long)]
    simulations: Option<i64>,

    /// Random seed (overrides the request)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of sample paths kept for plotting (overrides the request)
    #[arg(long)]
    sample_paths: Option<usize>,

    /// Give every trial its own random stream and run them in parallel
    #[arg(long)]
    parallel: bool,

    /// Histogram bins over the trial returns
    #[arg(long, default_value_t = DEFAULT_HISTOGRAM_BINS)]
    bins: usize,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Append logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    init_logging(&args.log_level, args.log_file.as_deref())?;

    let request = RunRequest::load(&args.request)?;
    tracing::info!(
        request = %args.request.display(),
        instruments = request.instruments.len(),
        "loaded request"
    );

    let overrides = Overrides {
        days: args.days,
        simulations: args.simulations,
        seed: args.seed,
        sample_paths: args.sample_paths,
        per_trial_streams: args.parallel,
    };
    let report = run(&request, &overrides, args.bins)?;
    let json = serde_json::to_string_pretty(&report)?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, json)?;
            tracing::info!("report written to {}", path.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}
