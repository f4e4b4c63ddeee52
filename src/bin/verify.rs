//! dualcheck-verify: offline dual check or one-shot interactive verifier
//!
//! Loads the dataset and client files, then either recomputes `M^T r` and
//! compares it with `s`, or serves a single challenge-response exchange.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use eyre::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use dualcheck::audit::{bind, dual_check, serve_once, Model, VerificationReport};
use dualcheck::params::{Mode, ServerConfig, DEFAULT_IO_TIMEOUT_SECS, DEFAULT_PORT};

#[derive(Parser)]
#[command(name = "dualcheck-verify")]
#[command(about = "Verify M^T r = s offline, or answer one audit challenge")]
#[command(version)]
struct Args {
    /// Dataset file (m x n matrix, 7-byte little-endian entries)
    dataset: PathBuf,

    /// Client file (n, m, r, s as 8-byte little-endian values)
    client: PathBuf,

    /// Port to listen on in interactive mode
    #[arg(default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Which check to run
    #[arg(long, value_enum, default_value_t = Mode::Interactive)]
    mode: Mode,

    /// Address to bind in interactive mode
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,

    /// Read/write deadline on the connection in seconds (0 disables)
    #[arg(long, default_value_t = DEFAULT_IO_TIMEOUT_SECS)]
    io_timeout: u64,

    /// Compute matrix products on one thread
    #[arg(long)]
    sequential: bool,

    /// Also write the report as JSON to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("failed to install the log subscriber");
    }

    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(2)
        }
    }
}

fn run(args: Args) -> Result<bool> {
    let config = ServerConfig {
        mode: args.mode,
        bind: args.bind,
        port: args.port,
        io_timeout_secs: args.io_timeout,
        parallel: !args.sequential,
    };
    config.validate()?;

    info!("dualcheck verifier");
    info!("Dataset: {}", args.dataset.display());
    info!("Client file: {}", args.client.display());
    info!("Mode: {:?}", config.mode);

    let load_start = Instant::now();
    let model = load_model(&args.dataset, &args.client)?;
    info!("Load time: {:.2?}", load_start.elapsed());

    let report = match config.mode {
        Mode::Offline => run_offline(&model, &config)?,
        Mode::Interactive => run_interactive(&model, &config)?,
    };

    println!();
    println!("=== Verification Result ===");
    println!("{}", report);

    if let Some(path) = &args.report {
        report
            .save(path)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        info!("Report saved to {}", path.display());
    }

    Ok(report.passed)
}

fn load_model(dataset: &Path, client: &Path) -> Result<Model> {
    let pb = spinner("Loading dataset and client files...");
    let model = Model::load(dataset, client);
    pb.finish_and_clear();
    model.with_context(|| "Failed to load inputs")
}

fn run_offline(model: &Model, config: &ServerConfig) -> Result<VerificationReport> {
    let start = Instant::now();
    let pb = spinner("Computing M^T r...");
    let outcome = dual_check(model, config.parallel);
    pb.finish_and_clear();
    let outcome = outcome.with_context(|| "Dual check failed to run")?;

    let elapsed = start.elapsed();
    info!("Dual check time: {:.2?}", elapsed);
    Ok(VerificationReport::from_dual_check(
        model.n(),
        model.m(),
        &outcome,
        elapsed.as_millis() as u64,
    ))
}

fn run_interactive(model: &Model, config: &ServerConfig) -> Result<VerificationReport> {
    let listener = bind(config).with_context(|| "Failed to start listener")?;
    info!("Listening on {}", listener.local_addr()?);

    let start = Instant::now();
    let exchange = serve_once(listener, model, config).with_context(|| "Audit exchange failed")?;
    let elapsed = start.elapsed();

    info!("Exchange time: {:.2?}", elapsed);
    Ok(VerificationReport::from_exchange(
        model.n(),
        model.m(),
        &exchange,
        elapsed.as_millis() as u64,
    ))
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
