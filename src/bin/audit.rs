//! dualcheck-audit: challenge a running verifier
//!
//! Reads `r` and `s` from the client file, sends a uniform random challenge,
//! and checks the verifier's response against `s . c`.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use eyre::{Context, Result};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use dualcheck::audit::{connect_and_audit, ClientConfig, VerificationReport};
use dualcheck::params::{AuditorConfig, DEFAULT_IO_TIMEOUT_SECS, DEFAULT_PORT};

#[derive(Parser)]
#[command(name = "dualcheck-audit")]
#[command(about = "Audit a dualcheck verifier with a random challenge")]
#[command(version)]
struct Args {
    /// Client file (n, m, r, s as 8-byte little-endian values)
    client: PathBuf,

    /// Verifier host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Verifier port
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Seed for the challenge (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Read/write deadline on the connection in seconds (0 disables)
    #[arg(long, default_value_t = DEFAULT_IO_TIMEOUT_SECS)]
    io_timeout: u64,

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
    let config = AuditorConfig {
        host: args.host,
        port: args.port,
        io_timeout_secs: args.io_timeout,
        seed: args.seed,
    };
    config.validate()?;

    info!("dualcheck auditor");
    info!("Client file: {}", args.client.display());
    info!("Verifier: {}", config.server_addr());

    let client = ClientConfig::open(&args.client)
        .with_context(|| format!("Failed to load client file: {}", args.client.display()))?;
    info!("Dimensions: n={}, m={}", client.n, client.m);

    let start = Instant::now();
    let exchange = connect_and_audit(&config, &client).with_context(|| "Audit exchange failed")?;
    let elapsed = start.elapsed();
    info!("One-way communication time: {:.2?}", exchange.comm_time);
    info!("Audit time: {:.2?}", elapsed);

    let report =
        VerificationReport::from_audit(client.n, client.m, &exchange, elapsed.as_millis() as u64);

    println!();
    println!("=== Audit Result ===");
    println!("{}", report);

    if let Some(path) = &args.report {
        report
            .save(path)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        info!("Report saved to {}", path.display());
    }

    Ok(report.passed)
}
