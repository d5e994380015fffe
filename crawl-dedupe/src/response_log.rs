use std::collections::hash_map::{Entry, HashMap};

use crate::digest::LabelledDigest;

/// Identification of the record that first carried a payload.
///
/// A revisit refers back to the capture through these values. Each is optional because a
/// malformed response may lack it, in which case the corresponding `WARC-Refers-To*` field is
/// omitted from revisits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    /// `WARC-Record-ID` of the original record, including angle brackets.
    pub record_id: Option<String>,
    /// `WARC-Date` of the original record.
    pub date: Option<String>,
    /// Bare `WARC-Target-URI` of the original record.
    pub target_uri: Option<String>,
}

/// Generic log for tracking seen responses.
///
/// The basic version of this is an in-memory mapping scoped to one pass. Deduplicating against
/// earlier crawls needs an implementation backed by a persistent index.
pub trait ResponseLog {
    /// Record a response with the given payload digest.
    ///
    /// Returns `None` if no response with that digest has been seen before, in which case
    /// `capture` is remembered as its first occurrence. Otherwise returns the first capture and
    /// leaves the log unchanged.
    fn add(&mut self, digest: LabelledDigest, capture: Capture) -> Option<&Capture>;
}

impl<L: ResponseLog + ?Sized> ResponseLog for &mut L {
    fn add(&mut self, digest: LabelledDigest, capture: Capture) -> Option<&Capture> {
        (**self).add(digest, capture)
    }
}

/// Basic implementation of a [`ResponseLog`].
#[derive(Debug, Default)]
pub struct InMemoryResponseLog(HashMap<LabelledDigest, Capture>);

impl InMemoryResponseLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the first capture recorded for a digest.
    pub fn get(&self, digest: &LabelledDigest) -> Option<&Capture> {
        self.0.get(digest)
    }

    /// The number of distinct digests seen.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl ResponseLog for InMemoryResponseLog {
    fn add(&mut self, digest: LabelledDigest, capture: Capture) -> Option<&Capture> {
        match self.0.entry(digest) {
            Entry::Occupied(first) => Some(first.into_mut()),
            Entry::Vacant(slot) => {
                slot.insert(capture);
                None
            }
        }
    }
}
