//! Construction of revisit records.
//!
//! A revisit replaces a response whose payload was already captured. It keeps the original
//! record's fields, refers to the first capture through the `WARC-Refers-To` family of fields
//! and retains only the HTTP status line and headers of the original block; the payload itself
//! is elided.

use std::io::{self, BufRead, Read};

use uuid::Uuid;
use warcio::{FieldKind, Header, Record};

use crate::response_log::Capture;

/// `WARC-Profile` of revisits for identical payloads.
///
/// The WARC 1.0 URI is written regardless of the record version, which is what replay tools
/// recognize for every version.
pub const IDENTICAL_PAYLOAD_DIGEST_PROFILE: &str =
    "http://netpreserve.org/warc/1.0/revisit/identical-payload-digest";

/// Longest HTTP header block that will be retained in a revisit.
pub const MAX_HTTP_HEADER_LEN: u64 = 64 << 10;

const MAX_HTTP_HEADERS: usize = 128;

/// Build the header of a revisit record replacing `original`.
///
/// The result has every field of `original` with these changes:
///
///  * `WARC-Record-ID` is `new_record_id`,
///  * `WARC-Type` is `revisit`, `WARC-Truncated` is `length` and `WARC-Profile` is
///    the identical-payload-digest profile,
///  * `WARC-Refers-To`, `WARC-Refers-To-Date` and `WARC-Refers-To-Target-URI` identify
///    `refers_to` (each is removed if the capture lacks that detail),
///  * `WARC-Block-Digest` is removed, since it described the original block,
///  * `Content-Length` is replaced by `block_len`, the length of the retained HTTP header block.
///
/// `WARC-Date` is left alone so the revisit carries its own capture time.
pub fn revisit_header(
    original: &Header,
    refers_to: &Capture,
    new_record_id: &str,
    block_len: u64,
) -> Header {
    let mut header = original.clone();

    header.set_field(FieldKind::RecordId, new_record_id);
    match refers_to.record_id {
        Some(ref id) => header.set_field(FieldKind::RefersTo, id.as_str()),
        None => header.remove_field(FieldKind::RefersTo),
    };
    match refers_to.date {
        Some(ref date) => header.set_field(FieldKind::RefersToDate, date.as_str()),
        None => header.remove_field(FieldKind::RefersToDate),
    };
    match refers_to.target_uri {
        Some(ref uri) => header.set_field(FieldKind::RefersToTargetURI, uri.as_str()),
        None => header.remove_field(FieldKind::RefersToTargetURI),
    };
    header.set_field(FieldKind::Type, "revisit");
    header.set_field(FieldKind::Truncated, "length");
    header.set_field(FieldKind::Profile, IDENTICAL_PAYLOAD_DIGEST_PROFILE);

    header.remove_field(FieldKind::BlockDigest);
    header.remove_field(FieldKind::ContentLength);
    header.set_field(FieldKind::ContentLength, block_len.to_string());

    header
}

/// Returns `true` if a record's block is an HTTP message (`application/http`).
pub fn has_http_block(header: &Header) -> bool {
    header
        .get_field(FieldKind::ContentType)
        .and_then(|s| s.parse::<mime::Mime>().ok())
        .map(|m| m.type_() == mime::APPLICATION && m.subtype() == "http")
        .unwrap_or(false)
}

/// Read the HTTP status line and headers from the start of a record's block.
///
/// Returns the header block including its terminating empty line, or an empty vector if the
/// record does not contain an HTTP message or the header block cannot be found within
/// [`MAX_HTTP_HEADER_LEN`] bytes. The remainder of the block is left unread.
pub fn read_http_header_block<R: BufRead>(record: &mut Record<R>) -> io::Result<Vec<u8>> {
    if !has_http_block(&record.header) {
        debug!(
            "Record {:?} does not contain an HTTP message; revisit will have an empty block",
            record.header.record_id()
        );
        return Ok(vec![]);
    }

    let mut buf = Vec::new();
    record.by_ref().take(MAX_HTTP_HEADER_LEN).read_to_end(&mut buf)?;

    match http_header_len(&buf) {
        Some(len) => {
            buf.truncate(len);
            Ok(buf)
        }
        None => {
            warn!(
                "Unable to find HTTP headers in record {:?}; revisit will have an empty block",
                record.header.record_id()
            );
            Ok(vec![])
        }
    }
}

/// Find the length of the HTTP response header block at the start of `buf`.
fn http_header_len(buf: &[u8]) -> Option<usize> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HTTP_HEADERS];
    let mut response = httparse::Response::new(&mut headers);
    match response.parse(buf) {
        Ok(httparse::Status::Complete(len)) => return Some(len),
        Ok(httparse::Status::Partial) => return None,
        Err(e) => {
            debug!("HTTP response did not parse ({}), looking for end of headers", e);
        }
    }

    // Captured traffic is not always well-formed, but the headers still end at the first
    // empty line.
    buf.windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|idx| idx + 4)
}

/// A source of `WARC-Record-ID` values for new records.
///
/// Closures returning `String` are generators, which allows tests to produce predictable IDs.
pub trait RecordIdGenerator {
    /// Generate a new record ID, including angle brackets.
    fn next_id(&mut self) -> String;
}

/// Generates random UUID URNs, like `<urn:uuid:fd8ee2d1-1d6c-4d1b-a8a6-ca0b0a1ef0c4>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidRecordIds;

impl RecordIdGenerator for UuidRecordIds {
    fn next_id(&mut self) -> String {
        format!("<urn:uuid:{}>", Uuid::new_v4())
    }
}

impl<F: FnMut() -> String> RecordIdGenerator for F {
    fn next_id(&mut self) -> String {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;
    use warcio::{Compression, Version};

    fn original() -> Header {
        original_with_version(Version::WARC1_0)
    }

    fn original_with_version(version: Version) -> Header {
        let mut header = Header::new(version);
        header.set_field(FieldKind::Type, "response");
        header.set_field(FieldKind::RecordId, "<urn:uuid:3>");
        header.set_field(FieldKind::TargetURI, "http://example.com/c");
        header.set_field(FieldKind::Date, "2019-06-22T10:00:03Z");
        header.set_field(FieldKind::PayloadDigest, "sha1:A");
        header.set_field(FieldKind::BlockDigest, "sha1:BLOCK");
        header.set_field(FieldKind::ContentType, "application/http;msgtype=response");
        header.set_field(FieldKind::ContentLength, "1000");
        header
    }

    fn first() -> Capture {
        Capture {
            record_id: Some("<urn:uuid:1>".into()),
            date: Some("2019-06-22T10:00:01Z".into()),
            target_uri: Some("http://example.com/a".into()),
        }
    }

    #[test]
    fn revisit_fields() {
        let revisit = revisit_header(&original(), &first(), "<urn:uuid:new>", 42);

        let fields: Vec<(&str, &str)> = revisit
            .iter_field_bytes()
            .map(|(k, v)| (k.as_ref(), std::str::from_utf8(v).unwrap()))
            .collect();
        assert_eq!(
            fields,
            vec![
                ("WARC-Type", "revisit"),
                ("WARC-Record-ID", "<urn:uuid:new>"),
                ("WARC-Target-URI", "http://example.com/c"),
                ("WARC-Date", "2019-06-22T10:00:03Z"),
                ("WARC-Payload-Digest", "sha1:A"),
                ("Content-Type", "application/http;msgtype=response"),
                ("WARC-Refers-To", "<urn:uuid:1>"),
                ("WARC-Refers-To-Date", "2019-06-22T10:00:01Z"),
                ("WARC-Refers-To-Target-URI", "http://example.com/a"),
                ("WARC-Truncated", "length"),
                ("WARC-Profile", IDENTICAL_PAYLOAD_DIGEST_PROFILE),
                ("Content-Length", "42"),
            ]
        );
    }

    #[test]
    fn missing_capture_details_are_omitted() {
        let mut original = original();
        // Left over from some earlier tool
        original.set_field(FieldKind::RefersToDate, "stale");
        let capture = Capture {
            date: None,
            target_uri: None,
            ..first()
        };

        let revisit = revisit_header(&original, &capture, "<urn:uuid:new>", 0);
        assert!(!revisit.field_exists(FieldKind::RefersToDate));
        assert!(!revisit.field_exists(FieldKind::RefersToTargetURI));
        assert_eq!(revisit.get_field(FieldKind::RefersTo), Some("<urn:uuid:1>"));
    }

    #[test]
    fn profile_is_the_same_for_every_version() {
        for version in [Version::WARC1_0, Version::WARC1_1] {
            let original = original_with_version(version.clone());
            let revisit = revisit_header(&original, &first(), "<x>", 0);
            assert_eq!(
                revisit.get_field(FieldKind::Profile),
                Some(IDENTICAL_PAYLOAD_DIGEST_PROFILE)
            );
            assert_eq!(revisit.version(), &version);
        }
    }

    #[test]
    fn missing_capture_id_is_omitted() {
        let mut original = original();
        original.set_field(FieldKind::RefersTo, "<urn:uuid:stale>");
        let capture = Capture {
            record_id: None,
            ..first()
        };

        let revisit = revisit_header(&original, &capture, "<urn:uuid:new>", 0);
        assert!(!revisit.field_exists(FieldKind::RefersTo));
        assert_eq!(
            revisit.get_field(FieldKind::RefersToDate),
            Some("2019-06-22T10:00:01Z")
        );
    }

    #[test]
    fn reads_http_headers_only() {
        let input = b"WARC/1.0\r\n\
                      Content-Type: application/http; msgtype=response\r\n\
                      Content-Length: 56\r\n\
                      \r\n\
                      HTTP/1.1 200 OK\r\n\
                      Content-Type: text/plain\r\n\
                      \r\n\
                      hello world\
                      \r\n\r\n";
        let mut record = Record::read_from(Cursor::new(&input[..]), Compression::None).unwrap();

        let block = read_http_header_block(&mut record).unwrap();
        assert_eq!(
            String::from_utf8_lossy(&block),
            "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\r\n"
        );
        record.finish().expect("remaining block should be skipped");
    }

    #[test]
    fn non_http_block_is_dropped() {
        let input = b"WARC/1.0\r\n\
                      Content-Type: text/dns\r\n\
                      Content-Length: 4\r\n\
                      \r\n\
                      data\r\n\r\n";
        let mut record = Record::read_from(Cursor::new(&input[..]), Compression::None).unwrap();

        assert_eq!(read_http_header_block(&mut record).unwrap(), Vec::<u8>::new());
        record.finish().unwrap();
    }

    #[test]
    fn malformed_http_falls_back_to_blank_line() {
        assert_eq!(http_header_len(b"HTTP/1.1 200 OK\r\nBad Header\r\n\r\nbody"), Some(31));
        assert_eq!(http_header_len(b"HTTP/1.1 200 OK\r\nContent-Type: te"), None);
        assert_eq!(http_header_len(b"garbage"), None);
    }

    #[test]
    fn closures_generate_ids() {
        let mut n = 0;
        let mut ids = move || {
            n += 1;
            format!("<urn:test:{}>", n)
        };
        assert_eq!(RecordIdGenerator::next_id(&mut ids), "<urn:test:1>");
        assert_eq!(RecordIdGenerator::next_id(&mut ids), "<urn:test:2>");

        let uuid = UuidRecordIds.next_id();
        assert!(uuid.starts_with("<urn:uuid:") && uuid.ends_with('>'), "{}", uuid);
    }
}
