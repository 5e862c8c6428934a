//! Raw Protobuf Dump CLI Application
//!
//! Command-line interface over the rawpb-decoder library. It decodes a
//! binary protobuf message without a schema and prints every field:
//! - Field path (nested fields as `N.M`)
//! - Wire type
//! - Value (integers, UTF-8 text or hex bytes)

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

mod config;
mod dump;
mod report;

use config::{AppConfig, OutputFormat};
use rawpb_decoder::FieldNumber;

/// rawpb - Dump binary protobuf messages without a schema
#[derive(Parser, Debug)]
#[command(name = "rawpb-cli")]
#[command(about = "Dump binary protobuf messages without a schema", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the binary message to decode
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Output format (overrides config)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Top-level field to decode as a nested message (can be repeated)
    #[arg(short, long = "message", value_name = "FIELD")]
    messages: Vec<FieldNumber>,

    /// Maximum nesting depth (overrides config)
    #[arg(long, value_name = "DEPTH")]
    max_depth: Option<usize>,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

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

    log::info!("rawpb CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", rawpb_decoder::VERSION);

    let config = resolve_config(&args)?;

    let buf = fs::read(&args.input)
        .with_context(|| format!("Failed to read input file: {:?}", args.input))?;
    log::info!("Decoding {:?} ({} bytes)", args.input, buf.len());

    let records = dump::dump_message(&buf, &config.schema.messages, &config.decoder)
        .with_context(|| format!("Failed to decode {:?}", args.input))?;
    log::info!("Decoded {} fields", records.len());

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {:?}", path))?;
            let mut out = BufWriter::new(file);
            report::write_records(&records, config.output.format, &mut out)?;
            out.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            report::write_records(&records, config.output.format, &mut out)?;
        }
    }

    Ok(())
}

/// Merge the config file (if any) with command-line overrides
fn resolve_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    if let Some(format) = args.format {
        config.output.format = format;
    }
    if let Some(max_depth) = args.max_depth {
        config.decoder.max_depth = max_depth;
    }
    for &number in &args.messages {
        if !config.schema.messages.contains(&number) {
            config.schema.messages.push(number);
        }
    }

    config.validate()?;
    log::debug!("Effective configuration: {:?}", config);
    Ok(config)
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;

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
