//! The crate error type.

use derive_more::Display;

#[derive(Debug, Display)]
pub enum Error {
    #[display(fmt = "io error: {}", _0)]
    Io(std::io::Error),
    /// The labeling worker has terminated; no further canonical labels can be
    /// produced for this run.
    #[display(fmt = "labeling worker is down")]
    LabelWorkerDown,
    #[display(fmt = "cannot decode adjacency pattern '{}'", _0)]
    BadPattern(String),
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
