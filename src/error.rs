use std::path::PathBuf;
use std::process::ExitStatus;

/// Failure to run the external audio tool.
#[derive(thiserror::Error, Debug)]
pub enum ToolError {
    #[error("failed to run {program:?}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{program:?} exited with {status}: {stderr}")]
    Failed {
        program: PathBuf,
        status: ExitStatus,
        stdout: String,
        stderr: String,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Invalid options: {0}")]
    InvalidOptions(String),
    #[error("Input path is not an existing directory: {0:?}")]
    NotFound(PathBuf),
    #[error("Failed to replace {path:?} with converted output: {source}")]
    Replace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{failed} files failed and {skipped} files were skipped")]
    Incomplete { failed: usize, skipped: usize },
}
