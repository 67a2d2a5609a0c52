use crate::error::ToolError;
use log::debug;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Parameters of a single conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionRequest {
    /// Target bit depth in bits
    pub bit_depth: u32,
    /// Target sample rate in Hz
    pub sample_rate: u32,
    /// Whether the tool may dither when reducing bit depth
    pub dither: bool,
}

/// The external program used to inspect and convert audio files
pub trait AudioTool {
    /// Returns the human-readable encoding report for `path`
    fn inspect(&self, path: &Path) -> Result<String, ToolError>;

    /// Converts `source` according to `request`, writing the result to `dest`.
    /// `source` must not be modified.
    fn convert(
        &self,
        source: &Path,
        request: &ConversionRequest,
        dest: &Path,
    ) -> Result<(), ToolError>;
}

/// [`AudioTool`] backed by the SoX command line
#[derive(Debug, Clone)]
pub struct Sox {
    program: PathBuf,
}

impl Sox {
    /// Uses `program` to run SoX, e.g. `sox` to look it up on `PATH`
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Sox {
            program: program.into(),
        }
    }

    /// Checks that the program can be started at all
    pub fn check_available(&self) -> Result<(), ToolError> {
        self.run([OsString::from("--version")]).map(|_| ())
    }

    /// Arguments of the conversion command:
    /// `<source> -b <bits> -r <rate> [-D] <dest>`
    pub fn conversion_args(
        source: &Path,
        request: &ConversionRequest,
        dest: &Path,
    ) -> Vec<OsString> {
        let mut args = vec![
            source.as_os_str().to_owned(),
            "-b".into(),
            request.bit_depth.to_string().into(),
            "-r".into(),
            request.sample_rate.to_string().into(),
        ];
        if !request.dither {
            args.push("-D".into());
        }
        args.push(dest.as_os_str().to_owned());
        args
    }

    fn run(&self, args: impl IntoIterator<Item = OsString>) -> Result<Output, ToolError> {
        let args: Vec<OsString> = args.into_iter().collect();
        debug!("Running {:?} {:?}", self.program, args);
        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|e| ToolError::Spawn {
                program: self.program.clone(),
                source: e,
            })?;
        if !output.status.success() {
            return Err(ToolError::Failed {
                program: self.program.clone(),
                status: output.status,
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }
}

impl AudioTool for Sox {
    fn inspect(&self, path: &Path) -> Result<String, ToolError> {
        let output = self.run([OsString::from("--i"), path.as_os_str().to_owned()])?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn convert(
        &self,
        source: &Path,
        request: &ConversionRequest,
        dest: &Path,
    ) -> Result<(), ToolError> {
        self.run(Self::conversion_args(source, request, dest))
            .map(|_| ())
    }
}
