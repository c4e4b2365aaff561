//! Main library for the SBOM bridge.
//!
//! This crate contains the core logic for the bi-directional conversion
//! between SPDX 2.x JSON and CycloneDX JSON. Conversions never stop at the
//! first problem: everything a run can survive is collected as graded
//! diagnostics in the returned [`ConversionResult`].

pub mod cdx_version;
pub mod converter;
pub mod converter_cdx_to_spdx;
pub mod converter_spdx_to_cdx;
pub mod diagnostics;
pub mod document;
pub mod errors;
pub mod factory;
pub mod mapping;
pub mod transformers;
pub mod validation;
pub mod version_detection;

pub use converter::Converter;
pub use diagnostics::{ConversionError, ConversionResult, Severity};
pub use errors::ConverterError;
pub use factory::{ConversionDirection, ConverterFactory};
pub use version_detection::SbomFormat;

use log::info;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

/// Top-level configuration for a conversion run.
#[derive(Debug, Clone)]
pub struct Config {
    pub input_file: PathBuf,
    /// Standard output when `None`.
    pub output_file: Option<PathBuf>,
    /// Detected from the input when `None`.
    pub source_format: Option<SbomFormat>,
    pub target_format: SbomFormat,
    /// Treat a result with `success == false` as a failed run.
    pub strict: bool,
    /// Print the diagnostics report as JSON instead of colored text.
    pub report_json: bool,
}

/// The main entry point for the conversion logic.
///
/// Reads the input file, picks the converter, converts, and writes the
/// converted content even when the result reports failures.
pub fn run(config: &Config) -> Result<ConversionResult, ConverterError> {
    let start_time = Instant::now();
    info!("  Input: {}", config.input_file.display());
    match &config.output_file {
        Some(path) => info!("  Output: {}", path.display()),
        None => info!("  Output: <stdout>"),
    }

    let text = fs::read_to_string(&config.input_file)
        .map_err(|e| ConverterError::Io(e, "Failed to read input file".to_string()))?;

    let factory = ConverterFactory::global();
    let converter = match config.source_format {
        Some(source) => factory.create_converter(source, config.target_format)?,
        None => factory.create_converter_from_text(&text, config.target_format)?,
    };
    info!(
        "Starting conversion: {} -> {}",
        converter.source_format(),
        converter.target_format()
    );

    let conversion_start = Instant::now();
    let result = converter.convert(&text)?;
    info!(
        "Conversion finished. (Took {:.2?})",
        conversion_start.elapsed()
    );

    match &config.output_file {
        Some(path) => fs::write(path, result.content())
            .map_err(|e| ConverterError::Io(e, "Failed to write output file".to_string()))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", result.content())
                .map_err(|e| ConverterError::Io(e, "Failed to write to stdout".to_string()))?;
        }
    }

    info!(
        "{} warnings, {} errors, success={}",
        result.warnings().len(),
        result.errors().len(),
        result.success()
    );
    info!("Total execution time: {:.2?}", start_time.elapsed());
    Ok(result)
}
