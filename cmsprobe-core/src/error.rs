use std::path::PathBuf;
use thiserror::Error;

/// Failures that end a run: the input could not be read, or an export could
/// not be written.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed CSV in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Parse error in {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Failed to build lookup client: {0}")]
    Client(#[from] cmsprobe_scanner::ScanError),
}

impl CoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CoreError::Io {
            path: path.into(),
            source,
        }
    }

    /// Split a csv error into the IO and parse halves of the taxonomy.
    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        let path = path.into();
        if source.is_io_error() {
            CoreError::Io {
                path,
                source: source.into(),
            }
        } else {
            CoreError::Csv { path, source }
        }
    }

    /// True for errors caused by malformed content rather than the filesystem.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, CoreError::Csv { .. } | CoreError::Parse { .. })
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
