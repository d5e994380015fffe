//! Reading and writing WARC (Web ARChive) records.
//!
//! WARC files store the results of web crawls: the request a crawler sent for each resource, the
//! response it received, metadata about the capture and information about the file itself. The
//! format is standardized as ISO 28500 (WARC 1.0 in 2009, WARC 1.1 in 2017); the IIPC publishes
//! freely-available versions of the specifications at
//! <https://iipc.github.io/warc-specifications/>.
//!
//! ## WARC structure
//!
//! A WARC file is a concatenation of records. Each record looks much like an HTTP message: a
//! version line, a number of header fields, and a block of bytes whose length is declared by the
//! `Content-Length` field. A response captured by a crawler might look like this:
//!
//! ```text
//! WARC/1.0
//! WARC-Type: response
//! WARC-Target-URI: <http://example.com/>
//! WARC-Date: 2019-06-22T10:00:00Z
//! WARC-Payload-Digest: sha1:3I42H3S6NNFQ2MSVX7XZKYAYSCX5QBYJ
//! WARC-Record-ID: <urn:uuid:6f9d6b3e-2b1f-4f1b-9a53-2c6b0cbbd8a4>
//! Content-Type: application/http;msgtype=response
//! Content-Length: 60
//!
//! HTTP/1.1 200 OK
//! Content-Type: text/plain
//! Content-Length: 5
//!
//! hello
//!
//!
//! ```
//!
//! Everything up to the first empty line is the record header; the remainder is the record block
//! followed by two CRLF sequences that terminate the record. Compressed WARC files (`.warc.gz`)
//! compress each record as its own gzip member so a record can be read without decompressing the
//! ones before it.
//!
//! ## Library structure
//!
//! The [`Header`] type holds the record version and fields. To write a record, construct or
//! modify a header and call [`write_to`](Header::write_to), which returns a [`RecordWriter`]
//! accepting exactly the declared block. [`Record::read_from`] does the opposite, parsing a
//! header from an input and returning an adapter with read access to the block.
//! [`RecordReader`] reads every record in an input in order, one at a time, so arbitrarily
//! large files can be processed in bounded memory.

#[macro_use]
extern crate log;

use thiserror::Error;

pub mod compression;
mod header;
pub mod record;
#[cfg(test)]
mod tests;
mod version;

pub use compression::Compression;
pub use header::{unwrap_uri, FieldKind, FieldName, Header, RecordKind, RecordType};
pub use record::{FinishError, InvalidRecord, Record, RecordReader, RecordWriter};
pub use version::Version;

/// Reasons it may be impossible to parse a WARC header.
#[derive(Debug, Error)]
pub enum HeaderParseError {
    /// The WARC/m.n signature marking the start of a record is not present or invalid.
    ///
    /// The contained value is a UTF-8 interpretation of the data that was attempted to be parsed.
    #[error("WARC signature missing or invalid (near \"{0}\")")]
    InvalidSignature(String),
    /// A header field was malformed.
    #[error("header field is malformed")]
    MalformedField,
    /// An I/O error occured while trying to read the input.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    /// The parser reached the end of the input before the end of the WARC header.
    #[error("input ended before end of header")]
    Truncated,
}

impl std::cmp::PartialEq for HeaderParseError {
    fn eq(&self, other: &Self) -> bool {
        use HeaderParseError::*;

        match (self, other) {
            (MalformedField, MalformedField) | (Truncated, Truncated) => true,
            (InvalidSignature(x), InvalidSignature(y)) => x == y,
            (IoError(e1), IoError(e2)) => e1.kind() == e2.kind(),
            (_, _) => false,
        }
    }
}

impl HeaderParseError {
    fn invalid_signature(sig_bytes: &[u8]) -> Self {
        HeaderParseError::InvalidSignature(String::from_utf8_lossy(sig_bytes).into_owned())
    }
}

/// WARC EBNF "separators" class
const SEPARATORS: &[u8] = b"()<>@,;:\\\"/[]?={} \t";

/// Returns `true` for the WARC EBNF "CTL" class: ASCII chars 0-31 and DEL (127)
fn is_ctl(b: u8) -> bool {
    b < 0x20 || b == 0x7f
}

/// Returns `true` if `b` may appear in a `token` (and therefore a field name).
fn is_token_byte(b: u8) -> bool {
    b.is_ascii() && !is_ctl(b) && !SEPARATORS.contains(&b)
}
