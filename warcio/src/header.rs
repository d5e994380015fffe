//! WARC record header data structures.

use std::io::{BufRead, Write};
use std::str;

use indexmap::map::IndexMap;

pub use fieldkind::FieldKind;
pub use fieldname::FieldName;
pub use recordkind::RecordKind;
pub use recordtype::RecordType;

use crate::compression::Compression;
use crate::record::RecordWriter;
use crate::version::Version;
use crate::{is_token_byte, HeaderParseError};

mod fieldkind;
mod fieldname;
mod recordkind;
mod recordtype;

/// Upper bound on the size of a single record header.
///
/// Real headers are a few hundred bytes; anything this large is not a WARC header and reading
/// further would only consume memory.
pub const MAX_HEADER_LEN: usize = 1 << 20;

// An IndexMap preserves the read order of fields when writing them back out. Each name maps to
// every value it appeared with, in order; the list is never empty.
type FieldMap = IndexMap<FieldName, Vec<Vec<u8>>>;

/// The header of a WARC record: a version and an ordered list of fields.
///
/// Fields are read with [`get_field`](Self::get_field) and its relatives or through typed
/// accessors like [`content_length`](Self::content_length), and changed with
/// [`set_field`](Self::set_field), [`append_field`](Self::append_field) and
/// [`remove_field`](Self::remove_field). Fields keep the order they were parsed or added in.
///
/// A field name is not expected to repeat (except `WARC-Concurrent-To`), but repeated fields
/// are kept rather than overwritten so rewriting a header never silently drops data. Getters
/// return the first value.
///
/// ```
/// # use warcio::{Header, Version, FieldKind};
/// let raw = b"\
/// WARC/1.0\r
/// WARC-Type: response\r
/// WARC-Target-URI: <http://example.com/>\r
/// Content-Length: 60\r
/// \r
/// ";
/// let (mut header, consumed) = Header::parse(raw).unwrap();
/// assert_eq!(consumed, raw.len());
/// assert_eq!(header.content_length(), Some(60));
///
/// // Bare-URI fields read without their brackets, but are stored as written
/// assert_eq!(header.target_uri(), Some("http://example.com/"));
/// assert_eq!(
///     header.get_field_bytes_raw(FieldKind::TargetURI),
///     Some(&b"<http://example.com/>"[..])
/// );
///
/// let mut expected = Header::new(Version::WARC1_0);
/// expected.set_field(FieldKind::Type, "response");
/// expected.set_field(FieldKind::TargetURI, "http://example.com/");
/// expected.set_field(FieldKind::ContentLength, "60");
/// header.unwrap_target_uri();
/// assert_eq!(header, expected);
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Header {
    version: Version,
    fields: FieldMap,
}

impl Header {
    /// Construct an empty header with the given version.
    pub fn new<V: Into<Version>>(version: V) -> Self {
        Header {
            version: version.into(),
            fields: Default::default(),
        }
    }

    /// Parse a header from bytes, returning the header and the number of bytes consumed.
    ///
    /// Returns [`HeaderParseError::Truncated`] if `bytes` ends before the blank line that
    /// terminates the header, in which case more input may make the parse succeed.
    pub fn parse(mut bytes: &[u8]) -> Result<(Header, usize), HeaderParseError> {
        let (version_consumed, version) = Version::parse(bytes)?;
        bytes = &bytes[version_consumed..];

        let mut header = Header::new(version);
        let mut headers_consumed = 0;
        loop {
            match bytes.get(..2) {
                Some(b"\r\n") => break,
                Some(_) => { /* Not end of headers, so probably a field */ }
                None => return Err(HeaderParseError::Truncated),
            }

            let (name, value, sz) = Self::parse_field(bytes)?;
            let name = str::from_utf8(name).map_err(|_| HeaderParseError::MalformedField)?;
            header.append_field(name, value);
            bytes = &bytes[sz..];
            headers_consumed += sz;
        }

        Ok((header, version_consumed + headers_consumed + 2))
    }

    /// Parse one `named-field`, returning the name, the unfolded value and the number of bytes
    /// consumed including the terminating CRLF.
    pub(crate) fn parse_field(bytes: &[u8]) -> Result<(&[u8], Vec<u8>, usize), HeaderParseError> {
        if bytes.is_empty() {
            return Err(HeaderParseError::Truncated);
        }

        // field-name: at least one token, which is an ASCII value excluding CTL or SEPARATORS
        let name_end = match bytes.iter().position(|&b| !is_token_byte(b)) {
            Some(0) => return Err(HeaderParseError::MalformedField),
            Some(i) => i,
            None => return Err(HeaderParseError::Truncated),
        };
        // literal colon must follow field-name
        if bytes[name_end] != b':' {
            return Err(HeaderParseError::MalformedField);
        }

        let mut chunk_start = name_end + 1;
        let mut value: Vec<u8> = vec![];
        let consumed = loop {
            // Trim leading whitespace
            chunk_start += match bytes[chunk_start..]
                .iter()
                .position(|&x| x != b' ' && x != b'\t')
            {
                None => return Err(HeaderParseError::Truncated),
                Some(idx) => idx,
            };

            // Take data until CRLF
            let chunk_end = match bytes[chunk_start..].windows(2).position(|s| s == b"\r\n") {
                Some(idx) => chunk_start + idx,
                None => return Err(HeaderParseError::Truncated),
            };
            let chunk = trim_trailing_lws(&bytes[chunk_start..chunk_end]);
            if !value.is_empty() && !chunk.is_empty() {
                // A folded line continues the value after a single space
                value.push(b' ');
            }
            value.extend_from_slice(chunk);

            match bytes.get(chunk_end + 2) {
                // LWS follows: this is a folded line. Advance to it.
                Some(b' ') | Some(b'\t') => {
                    chunk_start = chunk_end + 2;
                    continue;
                }
                // Non-LWS: end of this field
                Some(_) => break chunk_end + 2,
                // Absent: can't tell
                None => return Err(HeaderParseError::Truncated),
            }
        };

        Ok((&bytes[..name_end], value, consumed))
    }

    /// Write this header to the given output stream, returning an adapter for the record block.
    ///
    /// The returned [`RecordWriter`] accepts exactly as many bytes as the
    /// [`Content-Length`](FieldKind::ContentLength) field declares; further writes return `0`.
    /// [`RecordWriter::finish`] must be called to terminate the record. If the header has no
    /// valid `Content-Length` an [`InvalidInput`](std::io::ErrorKind::InvalidInput) error is
    /// returned without writing anything.
    ///
    /// Fields are written in their canonical form, which need not match the bytes a header was
    /// parsed from: standard field names get standard capitalization, folded values are written
    /// on one line and whitespace around values is normalized to a single space after the colon.
    /// Field order, values and extension names are written as parsed.
    pub fn write_to<W: Write>(
        &self,
        dest: W,
        compression: Compression,
    ) -> std::io::Result<RecordWriter<W>> {
        RecordWriter::new(dest, self, compression)
    }

    /// Serialize the version line, fields and terminating blank line.
    pub(crate) fn write_fields<W: Write>(&self, mut dest: W) -> std::io::Result<()> {
        write!(dest, "{}\r\n", self.version)?;
        for (name, value) in self.iter_field_bytes() {
            dest.write_all(name.as_ref().as_bytes())?;
            dest.write_all(b": ")?;
            dest.write_all(value)?;
            dest.write_all(b"\r\n")?;
        }
        dest.write_all(b"\r\n")
    }

    /// Get the value of a header field as bytes, or None if no such header exists.
    ///
    /// Although the WARC specification does not permit values that are not also valid Rust strings,
    /// users that wish to be lenient in accepting malformed records may wish to relax that
    /// requirement by using this function.
    ///
    /// For fields that are [defined to contain a bare URI](FieldName::value_is_bare_uri), this
    /// function will strip surrounding angle brackets from the value if present, hiding the
    /// difference between WARC 1.0 and 1.1 URIs (and writers that bracket values regardless of
    /// version).
    pub fn get_field_bytes<F: Into<FieldName>>(&self, field: F) -> Option<&[u8]> {
        let field = field.into();
        let value = self.get_field_bytes_raw(&field)?;
        if field.value_is_bare_uri() {
            Some(unwrap_uri(value))
        } else {
            Some(value)
        }
    }

    /// Get the value of a header field as bytes, without URI translation.
    pub fn get_field_bytes_raw<F: Into<FieldName>>(&self, field: F) -> Option<&[u8]> {
        let name: FieldName = field.into();
        self.fields
            .get(&name)
            .and_then(|values| values.first())
            .map(Vec::as_slice)
    }

    /// Get every value of a field, in the order they appeared.
    pub fn get_all_field_bytes<F: Into<FieldName>>(
        &self,
        field: F,
    ) -> impl Iterator<Item = &[u8]> {
        let name: FieldName = field.into();
        self.fields
            .get(&name)
            .into_iter()
            .flatten()
            .map(Vec::as_slice)
    }

    /// Get the value of a header field, or None if it does not exist or is not a valid Rust string.
    ///
    /// Bare URIs are unwrapped in the same way as [`get_field_bytes`](Header::get_field_bytes).
    pub fn get_field<F: Into<FieldName>>(&self, field: F) -> Option<&str> {
        str::from_utf8(self.get_field_bytes(field)?).ok()
    }

    /// Return `true` if a field with the given name currently exists in this header.
    pub fn field_exists<F: Into<FieldName>>(&self, field: F) -> bool {
        let name: FieldName = field.into();
        self.fields.contains_key(&name)
    }

    /// Set the value of a header field, returning the old value (if any).
    ///
    /// A field that already exists keeps its position in the header and has every existing value
    /// replaced by the new one; otherwise the field is added at the end. The value is stored
    /// exactly as given.
    ///
    /// Panics if the name contains characters that are not permitted in `field-name` context.
    pub fn set_field<N: Into<FieldName>, V: Into<Vec<u8>>>(
        &mut self,
        name: N,
        value: V,
    ) -> Option<Vec<u8>> {
        let name = checked_name(name.into());
        self.fields
            .insert(name, vec![value.into()])
            .and_then(|old| old.into_iter().next())
    }

    /// Add a value for a header field, keeping any values it already has.
    pub fn append_field<N: Into<FieldName>, V: Into<Vec<u8>>>(&mut self, name: N, value: V) {
        let name = checked_name(name.into());
        self.fields.entry(name).or_insert_with(Vec::new).push(value.into());
    }

    /// Remove every value of a header field, returning the first one (if any).
    ///
    /// Remaining fields keep their relative order.
    pub fn remove_field<N: Into<FieldName>>(&mut self, name: N) -> Option<Vec<u8>> {
        let name: FieldName = name.into();
        self.fields
            .shift_remove(&name)
            .and_then(|old| old.into_iter().next())
    }

    /// Get an iterator over the fields in this header.
    ///
    /// Values are raw: unlike [`get_field_bytes`](Self::get_field_bytes), bare URIs are yielded
    /// exactly as they will be written. A field with several values yields one item per value.
    pub fn iter_field_bytes(&self) -> impl Iterator<Item = (&FieldName, &[u8])> {
        self.fields
            .iter()
            .flat_map(|(k, values)| values.iter().map(move |v| (k, v.as_slice())))
    }

    /// Get the number of field values in this header.
    pub fn len(&self) -> usize {
        self.fields.values().map(Vec::len).sum()
    }

    /// Returns `true` if this header has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Get the WARC version of this record.
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Get the [`WARC-Record-ID`](FieldKind::RecordId) field value.
    ///
    /// `WARC-Record-ID` is mandatory, but to remain lenient with malformed input a record can be
    /// parsed without one, so this returns `None` if it is absent.
    pub fn record_id(&self) -> Option<&str> {
        self.get_field(FieldKind::RecordId)
    }

    /// Get the record [`Content-Length`](FieldKind::ContentLength), if present and valid.
    pub fn content_length(&self) -> Option<u64> {
        self.get_field(FieldKind::ContentLength)?.trim().parse().ok()
    }

    /// Get the [`WARC-Date`](FieldKind::Date) field value.
    pub fn warc_date(&self) -> Option<&str> {
        self.get_field(FieldKind::Date)
    }

    /// Get the [`WARC-Target-URI`](FieldKind::TargetURI) field value, without angle brackets.
    pub fn target_uri(&self) -> Option<&str> {
        self.get_field(FieldKind::TargetURI)
    }

    /// Get the [`WARC-Type`](FieldKind::Type) of this record.
    ///
    /// Returns `None` if the field is missing or not a valid string. Unknown types are returned
    /// as [`RecordType::Other`].
    pub fn record_type(&self) -> Option<RecordType> {
        self.get_field(FieldKind::Type)
            .map(|s| RecordType::from(s.trim()))
    }

    /// Rewrite the raw [`WARC-Target-URI`](FieldKind::TargetURI) value to a bare URI.
    ///
    /// Returns `true` if the value was changed. Records without a target URI are not modified.
    pub fn unwrap_target_uri(&mut self) -> bool {
        let name = FieldName::Known(FieldKind::TargetURI);
        let values = match self.fields.get_mut(&name) {
            Some(values) => values,
            None => return false,
        };

        let mut changed = false;
        for value in values.iter_mut() {
            let bare = unwrap_uri(value);
            if bare.len() != value.len() {
                trace!("Unwrapped target URI {:?}", String::from_utf8_lossy(bare));
                *value = bare.to_vec();
                changed = true;
            }
        }
        changed
    }
}

/// Strip angle brackets enclosing a URI.
///
/// WARC 1.0 writes URIs as `"<" uri ">"` and some tools keep doing so for fields that WARC 1.1
/// defines as bare. Every enclosing pair is removed, so unwrapping is idempotent: a bare value is
/// returned unchanged and unwrapping a result again has no further effect.
///
/// ```
/// # use warcio::unwrap_uri;
/// assert_eq!(unwrap_uri(b"<http://example.com/>"), b"http://example.com/");
/// assert_eq!(unwrap_uri(b"http://example.com/"), b"http://example.com/");
/// assert_eq!(unwrap_uri(unwrap_uri(b"<<x>>")), unwrap_uri(b"<<x>>"));
/// ```
pub fn unwrap_uri(mut value: &[u8]) -> &[u8] {
    while value.len() > 2 && value.first() == Some(&b'<') && value.last() == Some(&b'>') {
        value = &value[1..value.len() - 1];
    }
    value
}

fn trim_trailing_lws(mut chunk: &[u8]) -> &[u8] {
    while let Some(b' ') | Some(b'\t') = chunk.last() {
        chunk = &chunk[..chunk.len() - 1];
    }
    chunk
}

fn checked_name(name: FieldName) -> FieldName {
    let name_str: &str = name.as_ref();
    assert!(
        !name_str.is_empty() && name_str.bytes().all(is_token_byte),
        "field name {:?} contains illegal characters",
        name
    );
    name
}

/// Parse a WARC record header out of the provided `BufRead`.
///
/// Consumes the bytes that are parsed, leaving the reader at the beginning
/// of the record payload. In case of an error in parsing, some or all of the
/// input may be consumed.
pub(crate) fn get_record_header<R: BufRead>(mut reader: R) -> Result<Header, HeaderParseError> {
    enum FirstChanceOutcome {
        Success(usize, Header),
        KeepLooking(Vec<u8>),
    }

    // First-chance: without copying anything, operating only from the input's buffer
    let outcome = {
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            return Err(HeaderParseError::Truncated);
        }
        // Parse and consume are split because buf is borrowed from the reader
        match Header::parse(buf) {
            Ok((parsed, n)) => FirstChanceOutcome::Success(n, parsed),
            Err(HeaderParseError::Truncated) => FirstChanceOutcome::KeepLooking(buf.to_vec()),
            Err(e) => return Err(e),
        }
    };

    let mut owned_buf = match outcome {
        FirstChanceOutcome::Success(sz, header) => {
            trace!("Found complete header in buffer, {} bytes", sz);
            reader.consume(sz);
            return Ok(header);
        }
        FirstChanceOutcome::KeepLooking(buf) => {
            reader.consume(buf.len());
            buf
        }
    };
    trace!(
        "First-chance read unsuccessful yielding {} bytes",
        owned_buf.len()
    );

    // Second chance: copy out of the reader's buffer until the header is complete. Only the
    // bytes that belong to the header are consumed from the most recent fill.
    loop {
        let bytes_consumed = owned_buf.len();
        owned_buf.extend_from_slice(reader.fill_buf()?);
        if owned_buf.len() == bytes_consumed {
            // Read returned 0 bytes
            return Err(HeaderParseError::Truncated);
        }

        match Header::parse(&owned_buf) {
            Ok((parsed, n)) => {
                reader.consume(n - bytes_consumed);
                return Ok(parsed);
            }
            Err(HeaderParseError::Truncated) => {}
            Err(e) => return Err(e),
        }

        reader.consume(owned_buf.len() - bytes_consumed);
        if owned_buf.len() > MAX_HEADER_LEN {
            debug!("Giving up on header after {} bytes", owned_buf.len());
            return Err(HeaderParseError::MalformedField);
        }
    }
}
