//! Main binary entry point for sbom-bridge.

use clap::Parser;
use sbom_bridge::errors::ConverterError;
use sbom_bridge::{Config, SbomFormat};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    #[arg(short, long, value_name = "FILE", help = "Output file (stdout when omitted)")]
    output: Option<PathBuf>,

    #[arg(long, value_enum, help = "Target format")]
    to: SbomFormat,

    #[arg(long, value_enum, help = "Source format (detected when omitted)")]
    from: Option<SbomFormat>,

    #[arg(short, long)]
    verbose: bool,

    #[arg(long, help = "Exit with an error when the conversion reports failures")]
    strict: bool,

    #[arg(long, help = "Print diagnostics as JSON on stderr")]
    report_json: bool,
}

fn setup_logging(verbose: bool) {
    let filter_level = if verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Warn
    };

    env_logger::Builder::new()
        .filter(None, filter_level)
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn run_app() -> Result<bool, ConverterError> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let config = Config {
        input_file: cli.input,
        output_file: cli.output,
        source_format: cli.from,
        target_format: cli.to,
        strict: cli.strict,
        report_json: cli.report_json,
    };

    let result = sbom_bridge::run(&config)?;

    if config.report_json {
        match result.report_json() {
            Ok(report) => eprintln!("{}", report),
            Err(e) => log::error!("Failed to render report: {}", e),
        }
    } else {
        eprint!("{}", result.format_colored());
    }

    Ok(result.success() || !config.strict)
}

fn main() -> ExitCode {
    match run_app() {
        Ok(true) => {
            log::info!("Conversion completed successfully.");
            ExitCode::SUCCESS
        }
        Ok(false) => {
            log::error!("Conversion reported errors (--strict).");
            ExitCode::FAILURE
        }
        Err(e) => {
            log::error!("A fatal error occurred:");
            log::error!("{}", e);
            for recorded in e.errors() {
                eprint!("{}", recorded.format_colored());
            }
            let mut source = std::error::Error::source(&e);
            while let Some(s) = source {
                log::error!("  Caused by: {}", s);
                source = std::error::Error::source(s);
            }
            ExitCode::FAILURE
        }
    }
}
