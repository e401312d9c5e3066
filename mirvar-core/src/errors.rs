use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MirvarError {
    #[error("Required input file does not exist: {0}")]
    MissingInput(PathBuf),

    #[error("External tool `{program}` failed: {detail}")]
    ExternalTool { program: String, detail: String },

    #[error("Can't parse {path} (line {line}): {detail}")]
    Parse {
        path: PathBuf,
        line: usize,
        detail: String,
    },

    #[error("Alignment library error: {0}")]
    Library(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl MirvarError {
    /// Process exit status the CLI maps this error to. Missing inputs and
    /// external-tool failures keep their own codes so callers can tell them
    /// apart from generic failures.
    pub fn exit_code(&self) -> i32 {
        match self {
            MirvarError::MissingInput(_) => 4,
            MirvarError::ExternalTool { .. } => 3,
            _ => 1,
        }
    }
}
