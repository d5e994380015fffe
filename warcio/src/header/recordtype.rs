use crate::RecordKind;
use std::cmp::Ordering;
use std::convert::TryFrom;
use uncased::AsUncased;

/// The type of a single WARC record.
///
/// Every record has a type in its [`WARC-Type`](crate::FieldKind::Type) field. Types defined by
/// the standard are represented by [`RecordKind`]; anything else (extensions, or future versions
/// of the format) is carried as [`Other`](RecordType::Other) so callers must decide explicitly
/// what to do with types they don't understand.
///
/// Parsing is case-insensitive. Known types normalize to the standard spelling, unknown ones
/// preserve their case.
///
/// ```
/// # use warcio::{RecordType, RecordKind};
/// let response_type = RecordType::from("Response");
///
/// assert_eq!(response_type, RecordKind::Response);
/// assert_eq!(response_type, "response");
/// assert_eq!(response_type.as_ref(), "response");
/// ```
#[derive(Debug, Clone)]
pub enum RecordType {
    /// A known (standardized) record type.
    Known(RecordKind),
    /// Any unrecognized record type.
    ///
    /// Software *shall* skip records of unknown type; in a rewriting tool that means copying
    /// them through untouched.
    Other(Box<str>),
}

impl RecordType {
    /// Get the standard kind of this record type, if it is one.
    pub fn kind(&self) -> Option<RecordKind> {
        match self {
            RecordType::Known(k) => Some(*k),
            RecordType::Other(_) => None,
        }
    }
}

impl AsRef<str> for RecordType {
    fn as_ref(&self) -> &str {
        match self {
            RecordType::Known(x) => x.as_ref(),
            RecordType::Other(s) => s,
        }
    }
}

impl From<&str> for RecordType {
    fn from(s: &str) -> Self {
        match RecordKind::try_from(s) {
            Ok(x) => RecordType::Known(x),
            Err(()) => RecordType::Other(s.into()),
        }
    }
}

impl From<RecordKind> for RecordType {
    fn from(kind: RecordKind) -> Self {
        RecordType::Known(kind)
    }
}

impl<T: AsRef<str>> PartialEq<T> for RecordType {
    fn eq(&self, other: &T) -> bool {
        self.as_uncased().eq(other.as_ref())
    }
}

impl Eq for RecordType {}

impl PartialOrd for RecordType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RecordType {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_uncased().cmp(other.as_uncased())
    }
}
