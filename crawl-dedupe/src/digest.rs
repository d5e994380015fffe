use std::fmt;

use warcio::{FieldKind, Header};

/// A `labelled-digest` as found in `WARC-Payload-Digest`: `algorithm ":" digest-value`.
///
/// Digests are compared exactly as written by the capture tool. Two payloads are only considered
/// identical if the digest strings match byte-for-byte, so the same hash written with different
/// algorithm labels or encodings is never matched.
///
/// ```
/// # use crawl_dedupe::digest::LabelledDigest;
/// let digest = LabelledDigest::from("sha1:3I42H3S6NNFQ2MSVX7XZKYAYSCX5QBYJ");
/// assert_eq!(digest.algorithm(), Some("sha1"));
/// assert_eq!(digest.value(), "3I42H3S6NNFQ2MSVX7XZKYAYSCX5QBYJ");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelledDigest(Box<str>);

impl LabelledDigest {
    /// Get the payload digest of a record.
    ///
    /// Returns `None` if the header has no `WARC-Payload-Digest`, or if it is empty or not valid
    /// UTF-8.
    pub fn from_header(header: &Header) -> Option<Self> {
        let value = header.get_field(FieldKind::PayloadDigest)?.trim();
        if value.is_empty() {
            None
        } else {
            Some(value.into())
        }
    }

    /// The digest algorithm label, if the digest is labelled.
    pub fn algorithm(&self) -> Option<&str> {
        self.0.split_once(':').map(|(algorithm, _)| algorithm)
    }

    /// The encoded digest, excluding any label.
    pub fn value(&self) -> &str {
        match self.0.split_once(':') {
            Some((_, value)) => value,
            None => &self.0,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LabelledDigest {
    fn from(s: &str) -> Self {
        LabelledDigest(s.into())
    }
}

impl From<String> for LabelledDigest {
    fn from(s: String) -> Self {
        LabelledDigest(s.into_boxed_str())
    }
}

impl AsRef<str> for LabelledDigest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LabelledDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
