use std::io::{Error as IoError, ErrorKind};
use std::path::PathBuf;

use thiserror::Error;
use warcio::{FinishError, InvalidRecord};

/// Reasons a deduplication pass can fail.
///
/// Failures split into two families that callers usually treat differently: the input is not a
/// valid WARC file (retrying cannot help), or a file could not be opened, read or written
/// (see [`is_format_error`](Self::is_format_error)).
#[derive(Debug, Error)]
pub enum DedupeError {
    /// A record header could not be parsed.
    #[error("input is not a valid WARC file: {0}")]
    Format(#[source] InvalidRecord),
    /// A record was not terminated properly.
    #[error("record {record_id:?} is malformed: {source}")]
    MalformedRecord {
        record_id: Option<String>,
        #[source]
        source: FinishError,
    },
    /// Reading the input failed, including corrupt compression and blocks shorter than their
    /// declared length.
    #[error("failed to read input: {0}")]
    Read(#[source] IoError),
    /// Writing the output failed.
    #[error("failed to write output: {0}")]
    Write(#[source] IoError),
    #[error("unable to open input file {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: IoError,
    },
    #[error("unable to create output for {path:?}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: IoError,
    },
    #[error("unable to move output into place at {path:?}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: IoError,
    },
}

impl From<InvalidRecord> for DedupeError {
    fn from(e: InvalidRecord) -> Self {
        match e {
            InvalidRecord::IoError(e) => DedupeError::Read(e),
            e => DedupeError::Format(e),
        }
    }
}

/// Errors the decompressor and record reader raise for malformed (rather than unreadable) data.
fn is_malformed_data(e: &IoError) -> bool {
    matches!(
        e.kind(),
        ErrorKind::UnexpectedEof | ErrorKind::InvalidData | ErrorKind::InvalidInput
    )
}

impl DedupeError {
    /// Returns `true` if this error means the input is not valid WARC data.
    ///
    /// Anything else is a failure to access a file.
    pub fn is_format_error(&self) -> bool {
        match self {
            DedupeError::Format(_) => true,
            DedupeError::MalformedRecord { source, .. } => match source {
                FinishError::MissingTail | FinishError::TrailingData => true,
                FinishError::Io(e) => is_malformed_data(e),
            },
            DedupeError::Read(e) => is_malformed_data(e),
            DedupeError::Write(_)
            | DedupeError::Open { .. }
            | DedupeError::Create { .. }
            | DedupeError::Persist { .. } => false,
        }
    }
}
