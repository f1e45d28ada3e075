//! Remote I/O CLI Application
//!
//! Host-side harness for the remote I/O device library. It starts a
//! simulated device with its polling thread, talks to it over an in-process
//! bus exactly as a host would over the wire, and adds:
//! - Host test routines (echo, blink, configuration sweep)
//! - TOML configuration for the device, the simulated board and the session
//! - Session reports (TXT/JSON)

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::Parser;
use remote_io_device::{Device, DispatchMode, LoopbackBus, Poller, TransactionAssembler};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

mod config;
mod host;
mod report;

use config::{AppConfig, OutputFormat, SimulationConfig, TestKind};
use host::HostClient;
use report::SessionReport;

/// Remote I/O - Drive a simulated remote I/O device through host test routines
#[derive(Parser, Debug)]
#[command(name = "remote-io-cli")]
#[command(about = "Run host test routines against a simulated remote I/O device", long_about = None)]
#[command(version)]
struct Args {
    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Host routine to run (overrides [session].test)
    #[arg(short, long, value_enum)]
    test: Option<TestKind>,

    /// Configuration sweep iterations (overrides [session].loops)
    #[arg(long, value_name = "COUNT")]
    loops: Option<usize>,

    /// Output file for the session report (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Report format (overrides [session].output_format)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Remote I/O CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using device library v{}", remote_io_device::VERSION);

    let config = resolve_config(&args)?;
    let session = &config.session;

    let report = run_session(&config)?;

    match &session.output {
        Some(path) => report.write_to(path, session.output_format)?,
        None => write_report(&report, session.output_format, &mut io::stdout().lock())?,
    }

    if !args.quiet {
        print_summary(&report);
    }

    if !report.is_success() {
        bail!(
            "{} of {} checks failed",
            report.summary.failed,
            report.summary.exchanges
        );
    }

    Ok(())
}

/// Load the config file (or the bench defaults) and apply command line overrides
fn resolve_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            let config = config::load_config(path)?;
            log::debug!("Configuration loaded successfully");
            config
        }
        None => AppConfig {
            simulation: SimulationConfig::bench(),
            ..AppConfig::default()
        },
    };

    if let Some(test) = args.test {
        config.session.test = test;
    }
    if let Some(loops) = args.loops {
        config.session.loops = loops;
    }
    if let Some(format) = args.format {
        config.session.output_format = format;
    }
    if args.output.is_some() {
        config.session.output = args.output.clone();
    }

    // The echo routine is meaningless unless the device echoes.
    if config.session.test == TestKind::Echo && config.device.mode != DispatchMode::Echo {
        log::warn!("Echo test selected; switching the device to echo mode");
        config.device.mode = DispatchMode::Echo;
    }

    Ok(config)
}

/// Start the simulated device, run the selected routine and collect the report
fn run_session(config: &AppConfig) -> Result<SessionReport> {
    let session = &config.session;
    let pause = Duration::from_millis(session.pause_ms);

    eprintln!("═══════════════════════════════════════════════");
    eprintln!("  Remote I/O - {} test", session.test);
    eprintln!("═══════════════════════════════════════════════\n");

    let device = Device::new(config.simulation.build_pins(), config.device.clone())
        .context("Failed to start simulated device")?;
    let poller = Poller::new(device.clone()).spawn();
    let bus = LoopbackBus::new(TransactionAssembler::new(device.clone()));
    let mut host = HostClient::new(bus);

    let started = Local::now();
    let outcome = match session.test {
        TestKind::Echo => host.echo_test().map(|_| ()),
        TestKind::Blink => host
            .blink_test(session.blink_pin, session.blink_count, pause)
            .map(|_| ()),
        TestKind::Configuration => host.configuration_test(session.loops, pause),
    };

    poller.stop();
    log::debug!("{} exchanges recorded", host.records().len());
    outcome.with_context(|| format!("{} test aborted", session.test))?;

    Ok(SessionReport::new(
        session.test,
        config.device.bus_address,
        started,
        host.into_records(),
        device.snapshot(),
    ))
}

/// Write the rendered report; stdout carries nothing else
fn write_report(report: &SessionReport, format: OutputFormat, out: &mut impl Write) -> Result<()> {
    out.write_all(report.render(format)?.as_bytes())
        .context("Failed to write session report")?;
    out.flush().context("Failed to write session report")
}

fn print_summary(report: &SessionReport) {
    let summary = &report.summary;
    eprintln!("\n📊 Session:");
    eprintln!("  Exchanges: {}", summary.exchanges);
    eprintln!("  Passed:    {}", summary.passed);
    eprintln!("  Failed:    {}", summary.failed);
    if report.is_success() {
        eprintln!("\n✓ All checks passed");
    } else {
        eprintln!("\n✗ {} check(s) failed", summary.failed);
    }
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
