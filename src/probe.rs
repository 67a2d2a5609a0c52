use regex::Regex;
use std::sync::LazyLock;
use strum_macros::Display;

static SAMPLE_RATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Sample Rate\s*:\s*(\d+)").expect("Internal Error: invalid sample rate pattern")
});
static SAMPLE_ENCODING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Sample Encoding\s*:\s*(\d+)-bit")
        .expect("Internal Error: invalid sample encoding pattern")
});
static PRECISION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Precision\s*:\s*(\d+)-bit").expect("Internal Error: invalid precision pattern")
});

/// A metadata field extracted from the inspection report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum MetadataField {
    #[strum(serialize = "sample rate")]
    SampleRate,
    #[strum(serialize = "bit depth")]
    BitDepth,
}

/// Encoding values recovered from an inspection report. A field is `None` when the
/// report did not contain it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeReport {
    pub sample_rate: Option<u32>,
    pub bit_depth: Option<u32>,
}

impl ProbeReport {
    /// Fields that could not be extracted, in a stable order
    pub fn missing_fields(&self) -> Vec<MetadataField> {
        let mut missing = Vec::new();
        if self.sample_rate.is_none() {
            missing.push(MetadataField::SampleRate);
        }
        if self.bit_depth.is_none() {
            missing.push(MetadataField::BitDepth);
        }
        missing
    }

    /// Both values, if both are known
    pub fn known(&self) -> Option<(u32, u32)> {
        Some((self.sample_rate?, self.bit_depth?))
    }
}

/// Turns the human-readable output of an inspection command into a [`ProbeReport`].
///
/// Implement this to support another tool, or another version of SoX whose
/// report layout differs.
pub trait ProbeParser {
    fn parse(&self, report: &str) -> ProbeReport;
}

/// Parser for the report printed by `sox --i`
#[derive(Debug, Default, Clone, Copy)]
pub struct SoxInfoParser;

impl ProbeParser for SoxInfoParser {
    fn parse(&self, report: &str) -> ProbeReport {
        ProbeReport {
            sample_rate: first_number(&SAMPLE_RATE, report),
            bit_depth: first_number(&SAMPLE_ENCODING, report)
                .or_else(|| first_number(&PRECISION, report)),
        }
    }
}

/// First capture of `pattern` in `text`, parsed as `u32`
fn first_number(pattern: &Regex, text: &str) -> Option<u32> {
    pattern.captures(text)?.get(1)?.as_str().parse().ok()
}
