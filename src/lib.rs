/// Module for error handling
pub mod error;
/// Module for extracting encoding metadata from inspection reports
pub mod probe;
/// Module for moving converted output into place
pub mod replace;
/// Module for running the external audio tool
pub mod tool;

use crate::error::{Error, ToolError};
use crate::probe::{MetadataField, ProbeParser, SoxInfoParser};
use crate::replace::TempOutput;
pub use crate::replace::TEMP_FILE_PREFIX;
use crate::tool::{AudioTool, ConversionRequest, Sox};
use indicatif::{ProgressBar, ProgressIterator, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Suffix of the files that are processed (case-sensitive)
pub const AUDIO_EXTENSION: &str = ".wav";

/// Configuration options for the conversion process
#[derive(Debug, Clone)]
pub struct NormalizationOptions {
    /// Directory scanned recursively for wav files. Files are replaced in place.
    pub input_dir: PathBuf,
    /// Target sample rate in Hz
    pub sample_rate: u32,
    /// Target bit depth in bits
    pub bit_depth: u32,
    /// Disable dithering during conversion
    pub no_dither: bool,
    /// Log the raw inspection report of every file
    pub debug: bool,
    /// Program used for inspection and conversion
    pub sox_program: PathBuf,
}

impl Default for NormalizationOptions {
    fn default() -> Self {
        NormalizationOptions {
            input_dir: PathBuf::from("."),
            sample_rate: 48000,
            bit_depth: 24,
            no_dither: false,
            debug: false,
            sox_program: PathBuf::from("sox"),
        }
    }
}

impl NormalizationOptions {
    #[inline]
    fn conversion_request(&self) -> ConversionRequest {
        ConversionRequest {
            bit_depth: self.bit_depth,
            sample_rate: self.sample_rate,
            dither: !self.no_dither,
        }
    }
}

/// Why a file was left alone without attempting a conversion
#[derive(Debug)]
pub enum SkipReason {
    /// The inspection command could not be run or failed
    ProbeFailed(ToolError),
    /// The report lacked one or more fields
    MissingFields(Vec<MetadataField>),
}

/// Joins field names for diagnostics, e.g. "sample rate and bit depth"
pub fn describe_fields(fields: &[MetadataField]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" and ")
}

/// Final state of a single file
#[derive(Debug)]
pub enum Outcome {
    /// Already at the target sample rate and bit depth
    Compliant,
    /// Converted and replaced in place
    Converted,
    /// Encoding could not be determined, so the file was not touched
    Skipped(SkipReason),
    /// The conversion command failed; the original is untouched
    ConversionFailed(ToolError),
    /// The converted output could not be moved over the original
    ReplaceFailed(Error),
}

impl Outcome {
    #[inline]
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::ConversionFailed(_) | Outcome::ReplaceFailed(_))
    }

    #[inline]
    pub fn is_skipped(&self) -> bool {
        matches!(self, Outcome::Skipped(_))
    }
}

/// Result of processing one discovered file
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    /// Sample rate found by inspection, if any
    pub sample_rate: Option<u32>,
    /// Bit depth found by inspection, if any
    pub bit_depth: Option<u32>,
    pub outcome: Outcome,
}

/// Per-outcome counts of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub converted: usize,
    pub compliant: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl Summary {
    pub fn from_reports(reports: &[FileReport]) -> Self {
        reports
            .iter()
            .fold(Summary::default(), |mut acc, report| {
                match report.outcome {
                    Outcome::Compliant => acc.compliant += 1,
                    Outcome::Converted => acc.converted += 1,
                    Outcome::Skipped(_) => acc.skipped += 1,
                    Outcome::ConversionFailed(_) | Outcome::ReplaceFailed(_) => acc.failed += 1,
                }
                acc
            })
    }
}

/// Convert every wav file below `options.input_dir` with SoX.
///
/// Returns [`Error::Incomplete`] when any file was skipped or failed to convert;
/// the per-file diagnostics have been logged by then.
pub fn normalize_folder(options: &NormalizationOptions) -> Result<Summary, Error> {
    let sox = Sox::with_program(&options.sox_program);
    if let Err(e) = sox.check_available() {
        warn!("SoX does not seem to be available ({}), every file will be skipped.", e);
    }

    let reports = process_files(options, &sox, &SoxInfoParser)?;
    let summary = Summary::from_reports(&reports);
    info!(
        "Processing complete. {} converted, {} already compliant, {} skipped, {} failed.",
        summary.converted, summary.compliant, summary.skipped, summary.failed
    );

    if summary.failed > 0 || summary.skipped > 0 {
        Err(Error::Incomplete {
            failed: summary.failed,
            skipped: summary.skipped,
        })
    } else {
        Ok(summary)
    }
}

/// Inspect every discovered file with `tool` and convert the ones that do not match
/// the target, in discovery order.
///
/// Only invalid options or an unusable input directory abort the run; every other
/// problem is recorded in the file's [`FileReport`].
pub fn process_files(
    options: &NormalizationOptions,
    tool: &impl AudioTool,
    parser: &impl ProbeParser,
) -> Result<Vec<FileReport>, Error> {
    validate_options(options)?;

    info!("Discovering audio files in {:?}...", options.input_dir);
    let audio_files = find_audio_files(&options.input_dir)?;
    if audio_files.is_empty() {
        info!("No audio files found.");
        return Ok(Vec::new());
    }
    info!(
        "Found {} audio files. Target: {}-bit, {} Hz.",
        audio_files.len(),
        options.bit_depth,
        options.sample_rate
    );

    let pb = ProgressBar::new(audio_files.len() as u64);
    pb.set_style(ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}").expect("Internal Error: Failed to set progress bar style")
        .progress_chars("#>-"));
    pb.set_message("Processing files");

    let reports = audio_files
        .into_iter()
        .progress_with(pb.clone())
        .map(|path| process_single_file(path, options, tool, parser))
        .collect();
    pb.finish_with_message("Processing done");

    Ok(reports)
}

/// Runs one file through inspect, decide, convert and replace
pub fn process_single_file(
    path: PathBuf,
    options: &NormalizationOptions,
    tool: &impl AudioTool,
    parser: &impl ProbeParser,
) -> FileReport {
    let report = match tool.inspect(&path) {
        Ok(text) => {
            if options.debug {
                info!("Output for file {}:\n{}", path.display(), text);
            }
            parser.parse(&text)
        }
        Err(e) => {
            if let (true, ToolError::Failed { stdout, .. }) = (options.debug, &e) {
                info!("Output for file {}:\n{}", path.display(), stdout);
            }
            warn!(
                "Could not extract {} from {}: {}",
                describe_fields(&[MetadataField::SampleRate, MetadataField::BitDepth]),
                path.display(),
                e
            );
            return FileReport {
                path,
                sample_rate: None,
                bit_depth: None,
                outcome: Outcome::Skipped(SkipReason::ProbeFailed(e)),
            };
        }
    };

    let Some((sample_rate, bit_depth)) = report.known() else {
        let missing = report.missing_fields();
        warn!(
            "Could not extract {} from {}",
            describe_fields(&missing),
            path.display()
        );
        return FileReport {
            path,
            sample_rate: report.sample_rate,
            bit_depth: report.bit_depth,
            outcome: Outcome::Skipped(SkipReason::MissingFields(missing)),
        };
    };
    debug!("{}: {} Hz, {}-bit", path.display(), sample_rate, bit_depth);

    let outcome = if needs_conversion(sample_rate, bit_depth, options.sample_rate, options.bit_depth) {
        convert_in_place(&path, options, tool)
    } else {
        info!(
            "{} already meets the bit depth and sample rate requirements",
            path.display()
        );
        Outcome::Compliant
    };

    FileReport {
        path,
        sample_rate: Some(sample_rate),
        bit_depth: Some(bit_depth),
        outcome,
    }
}

/// Converts `path` into the temporary output and moves it over the original.
/// The success message is only logged once the original has been replaced.
fn convert_in_place(
    path: &Path,
    options: &NormalizationOptions,
    tool: &impl AudioTool,
) -> Outcome {
    let temp = match TempOutput::new_in(&options.input_dir) {
        Ok(temp) => temp,
        Err(e) => {
            let e = Error::Replace {
                path: path.to_path_buf(),
                source: e,
            };
            error!("Conversion failed for {}: {}", path.display(), e);
            return Outcome::ReplaceFailed(e);
        }
    };

    if let Err(e) = tool.convert(path, &options.conversion_request(), temp.path()) {
        error!("Conversion failed for {}: {}", path.display(), e);
        return Outcome::ConversionFailed(e);
    }

    if let Err(e) = temp.persist(path) {
        let e = Error::Replace {
            path: path.to_path_buf(),
            source: e,
        };
        error!("{}", e);
        return Outcome::ReplaceFailed(e);
    }

    info!(
        "Converted {} to {}-bit and {} Hz",
        path.display(),
        options.bit_depth,
        options.sample_rate
    );
    Outcome::Converted
}

/// Whether a file at `sample_rate`/`bit_depth` must be converted to reach the target
#[inline]
pub const fn needs_conversion(
    sample_rate: u32,
    bit_depth: u32,
    target_sample_rate: u32,
    target_bit_depth: u32,
) -> bool {
    sample_rate != target_sample_rate || bit_depth != target_bit_depth
}

/// Validates the normalization options
fn validate_options(options: &NormalizationOptions) -> Result<(), Error> {
    if options.sample_rate == 0 {
        return Err(Error::InvalidOptions(
            "Sample rate must be a positive number of Hz".to_string(),
        ));
    }
    if options.bit_depth == 0 {
        return Err(Error::InvalidOptions(
            "Bit depth must be a positive number of bits".to_string(),
        ));
    }
    Ok(())
}

/// Recursively collects the files below `input_dir` whose name ends with
/// [`AUDIO_EXTENSION`], sorted by path
pub fn find_audio_files(input_dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, Error> {
    let input_dir = input_dir.as_ref();
    if !input_dir.is_dir() {
        return Err(Error::NotFound(input_dir.to_path_buf()));
    }

    let mut audio_files = Vec::new();
    for entry in WalkDir::new(input_dir) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        // symlinked files count, symlinked directories are not followed
        if entry
            .file_name()
            .as_encoded_bytes()
            .ends_with(AUDIO_EXTENSION.as_bytes())
            && entry.path().is_file()
        {
            audio_files.push(entry.into_path());
        }
    }
    audio_files.sort();
    Ok(audio_files)
}
