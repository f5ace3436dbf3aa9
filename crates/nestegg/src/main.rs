use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::WrapErr;
use nestegg::{Overrides, Request, Settings, init_logging, run_to};

#[derive(Parser, Debug)]
#[command(name = "nestegg")]
#[command(about = "Portfolio optimization and Monte Carlo projections from request files")]
struct Args {
    /// Request file (YAML, or JSON by extension)
    request: PathBuf,

    /// Settings file (YAML, or JSON by extension)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Directory for daily-rolling log files
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Write the JSON result here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Master seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Monte Carlo paths per simulation
    #[arg(long)]
    simulations: Option<usize>,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let settings = Settings::load_or_default(args.config.as_deref())?.with_overrides(Overrides {
        log_level: args.log_level,
        log_dir: args.log_dir,
        output: args.output,
        seed: args.seed,
        simulations: args.simulations,
    });

    init_logging(settings.log_dir.as_deref(), &settings.log_level)?;

    let request = Request::load(&args.request)?;
    run_to(&request, &settings.engine, settings.output.as_deref())
        .wrap_err_with(|| format!("Request {} failed", args.request.display()))?;

    tracing::info!("Run complete");
    Ok(())
}
