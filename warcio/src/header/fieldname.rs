use crate::FieldKind;
use std::cmp::Ordering;
use std::convert::TryFrom;
use std::hash::{Hash, Hasher};
use uncased::AsUncased;

/// The name of a WARC header field.
///
/// Field names are case-insensitive strings made up of one or more ASCII characters excluding
/// control characters (values 0-31 and 127) and separators (`()<>@,;:\"/[]?={} \t`). A `FieldName`
/// can be constructed from a string with [`From`], or a variant may be directly constructed. A
/// string representation of a name can be obtained through [`AsRef<str>`].
///
/// Standardized names are enumerated by [`FieldKind`], which converts to and compares with a
/// `FieldName` directly. Comparison, ordering and hashing are case-insensitive; standard names
/// normalize to the capitalization used by the standard while unrecognized names preserve the
/// case they were parsed with.
///
/// ```
/// # use warcio::{FieldName, FieldKind};
/// let parsed_id: FieldName = "warc-record-id".into();
///
/// assert_eq!(parsed_id, FieldKind::RecordId);
/// assert_eq!("WARC-Record-ID", parsed_id.as_ref());
///
/// let custom: FieldName = "X-Crawler-Note".into();
/// assert_eq!(custom, FieldName::from("x-crawler-note"));
/// assert_eq!(custom.as_ref(), "X-Crawler-Note");
/// ```
#[derive(Debug, Clone)]
pub enum FieldName {
    /// A field name defined by the WARC standard.
    Known(FieldKind),
    /// Any unrecognized field name.
    ///
    /// The WARC format permits arbitrarily-named extension fields, and specifies that software
    /// *shall* ignore fields with unrecognized names. They are carried through unmodified.
    Other(Box<str>),
}

impl AsRef<str> for FieldName {
    fn as_ref(&self) -> &str {
        match self {
            FieldName::Known(x) => x.as_ref(),
            FieldName::Other(s) => s,
        }
    }
}

impl From<&str> for FieldName {
    fn from(s: &str) -> Self {
        match FieldKind::try_from(s) {
            Ok(x) => FieldName::Known(x),
            Err(()) => FieldName::Other(s.into()),
        }
    }
}

impl From<String> for FieldName {
    fn from(s: String) -> Self {
        match FieldKind::try_from(s.as_str()) {
            Ok(x) => FieldName::Known(x),
            Err(()) => FieldName::Other(s.into_boxed_str()),
        }
    }
}

impl From<FieldKind> for FieldName {
    fn from(k: FieldKind) -> Self {
        FieldName::Known(k)
    }
}

impl From<&FieldKind> for FieldName {
    fn from(kind: &FieldKind) -> FieldName {
        kind.into_name()
    }
}

impl From<&FieldName> for FieldName {
    fn from(name: &FieldName) -> FieldName {
        name.clone()
    }
}

impl PartialEq<FieldKind> for FieldName {
    fn eq(&self, other: &FieldKind) -> bool {
        match self {
            FieldName::Known(k) => k == other,
            FieldName::Other(s) => s.as_uncased() == other.as_ref(),
        }
    }
}

impl FieldName {
    /// Returns `true` if a field's value consists of a bare URI.
    ///
    /// WARC 1.0 defines a URI as `"<" <'URI' per RFC3986> ">"`, while WARC 1.1 drops the angle
    /// brackets from the URI grammar and adds them explicitly to the fields that keep them. This
    /// returns `true` for the fields that are unbracketed in WARC 1.1: those are the fields whose
    /// values [`Header::get_field`](crate::Header::get_field) reads leniently, removing brackets
    /// that a writer may have added.
    pub fn value_is_bare_uri(&self) -> bool {
        let kind = match self {
            Self::Known(kind) => kind,
            Self::Other(_) => return false,
        };

        use crate::FieldKind::*;
        match kind {
            TargetURI | RefersToTargetURI | Profile => true,
            // "<" uri ">" regardless of WARC version
            RecordId | ConcurrentTo | RefersTo | InfoID | SegmentOriginID => false,
            ContentLength
            | Date
            | Type
            | ContentType
            | BlockDigest
            | PayloadDigest
            | IpAddress
            | RefersToDate
            | Truncated
            | Filename
            | IdentifiedPayloadType
            | SegmentNumber
            | SegmentTotalLength => false,
        }
    }
}

// Eq, Ord and Hash all go through the case-insensitive spelling so a Known name and an Other
// with the same spelling are indistinguishable as map keys.
impl PartialEq for FieldName {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldName::Known(l), FieldName::Known(r)) => l == r,
            _ => self.as_ref().as_uncased() == other.as_ref(),
        }
    }
}

impl Eq for FieldName {}

impl PartialOrd for FieldName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FieldName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_ref().as_uncased().cmp(other.as_ref().as_uncased())
    }
}

impl Hash for FieldName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_ref().as_uncased().hash(state)
    }
}
