//! Operations on complete WARC records.
use crate::compression::{self, Compression};
use crate::header::{get_record_header, Header};
use crate::HeaderParseError;
use buf_redux::BufReader;
use std::cmp;
use std::io::prelude::*;
use std::io::{Error as IoError, ErrorKind};

pub use buf_redux::Buffer;
use thiserror::Error;

/// The number of bytes to skip per read() call when closing a record.
///
/// Larger values require more memory but will reduce overhead.
const SKIP_BUF_LEN: usize = 4096;

/// Default size of the buffer used to decompress a record.
const DEFAULT_BUFFER_LEN: usize = 8 << 10;

/// An error in reading a record from an input stream.
#[derive(Debug, Error)]
pub enum InvalidRecord {
    /// The header of the record was malformed.
    ///
    /// This may mean the input doesn't actually contain WARC records.
    #[error("record header is not valid: {0}")]
    InvalidHeader(#[source] HeaderParseError),
    /// The length of the payload could not be determined.
    ///
    /// Contained value is the contents of the Content-Length header.
    #[error("Content-Length is not a valid integer (contained bytes {0:?})")]
    UnknownLength(Option<Vec<u8>>),
    /// Reached the end of the input in the middle of a record header.
    #[error("unexpected end of input")]
    EndOfStream,
    /// Other I/O error, including errors decompressing the input.
    #[error("I/O error: {0}")]
    IoError(#[source] IoError),
}

impl From<HeaderParseError> for InvalidRecord {
    fn from(e: HeaderParseError) -> Self {
        match e {
            HeaderParseError::IoError(e) => InvalidRecord::IoError(e),
            HeaderParseError::Truncated => InvalidRecord::EndOfStream,
            e => InvalidRecord::InvalidHeader(e),
        }
    }
}

#[derive(Debug)]
enum Input<R>
where
    R: BufRead,
{
    // The buffer is unused, stored only for uniformity so the input always owns the buffer.
    Plain(R, Buffer),
    Compressed(BufReader<flate2::bufread::GzDecoder<R>>),
}

impl<R> Input<R>
where
    R: BufRead,
{
    fn into_inner(self) -> (R, Buffer) {
        match self {
            Input::Plain(r, buf) => (r, buf),
            Input::Compressed(r) => {
                let (r, buf) = r.into_inner_with_buffer();
                (r.into_inner(), buf)
            }
        }
    }
}

impl<R> Read for Input<R>
where
    R: BufRead,
{
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Input::Plain(r, _) => r.read(buf),
            Input::Compressed(r) => r.read(buf),
        }
    }
}

impl<R> BufRead for Input<R>
where
    R: BufRead,
{
    fn fill_buf(&mut self) -> std::io::Result<&[u8]> {
        match self {
            Input::Plain(r, _) => r.fill_buf(),
            Input::Compressed(r) => r.fill_buf(),
        }
    }

    fn consume(&mut self, amt: usize) {
        match self {
            Input::Plain(r, _) => r.consume(amt),
            Input::Compressed(r) => r.consume(amt),
        }
    }
}

/// A streaming WARC record.
///
/// The header of the record is accessible via the public `header` field, and its block is
/// accessible through the [`Read`] and [`BufRead`] impls, which yield exactly `Content-Length`
/// bytes. If the input ends before that many bytes, reads fail with
/// [`UnexpectedEof`](ErrorKind::UnexpectedEof).
///
/// When done reading the block, call [`Self::finish`] to advance the underlying reader past this
/// record. Only one record's worth of data is ever buffered, regardless of the record's size.
#[derive(Debug)]
pub struct Record<R>
where
    R: BufRead,
{
    /// The parsed record header.
    pub header: Header,
    /// The record Content-Length in bytes
    content_length: u64,
    /// The number of bytes left to read in the record body
    bytes_remaining: u64,
    input: Input<R>,
}

fn truncated_block() -> IoError {
    IoError::new(ErrorKind::UnexpectedEof, "input ended before end of record block")
}

/// Read data from the record body.
impl<R> Read for Record<R>
where
    R: BufRead,
{
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, IoError> {
        if self.bytes_remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let limit = cmp::min(buf.len() as u64, self.bytes_remaining) as usize;

        let n = self.input.read(&mut buf[..limit])?;
        if n == 0 {
            return Err(truncated_block());
        }
        self.bytes_remaining -= n as u64;
        Ok(n)
    }
}

/// Read data from the record body, using the underlying input's buffer.
impl<R> BufRead for Record<R>
where
    R: BufRead,
{
    fn fill_buf(&mut self) -> Result<&[u8], IoError> {
        if self.bytes_remaining == 0 {
            return Ok(&[]);
        }
        let remaining = self.bytes_remaining;
        let buf = self.input.fill_buf()?;
        if buf.is_empty() {
            return Err(truncated_block());
        }
        let len = cmp::min(buf.len() as u64, remaining) as usize;
        Ok(&buf[..len])
    }

    fn consume(&mut self, n: usize) {
        debug_assert!(n as u64 <= self.bytes_remaining);
        self.input.consume(n);
        self.bytes_remaining -= n as u64;
    }
}

/// Errors that might occur when closing a record.
#[derive(Debug, Error)]
pub enum FinishError {
    /// The record tail (CRLF CRLF) was not present.
    ///
    /// This may be because the record is malformed and lacks the tail, or the
    /// input is truncated.
    #[error("Error closing WARC record: missing record tail")]
    MissingTail,
    /// The gzip member holding the record continues past the record tail.
    ///
    /// Compressed WARC files hold one record per gzip member; this usually means the whole
    /// file was compressed as a single member.
    #[error("Error closing WARC record: gzip member continues after the record")]
    TrailingData,
    /// An I/O error occurred.
    #[error("Error closing WARC record: I/O error: {0}")]
    Io(#[from] IoError),
}

impl<R> Record<R>
where
    R: BufRead,
{
    /// Read a record from an input stream.
    ///
    /// This allocates a new buffer on every invocation, which can be costly.
    /// If reading many records, prefer to use [`Self::read_buffered_from`] to reuse a
    /// buffer across records.
    pub fn read_from(reader: R, compression: Compression) -> Result<Self, InvalidRecord> {
        let buffer = Buffer::with_capacity(DEFAULT_BUFFER_LEN);
        Self::read_buffered_from(reader, buffer, compression)
    }

    /// Read a record from an input stream with a user-provided buffer.
    ///
    /// The provided buffer is returned by [`Self::finish`] so it can be reused by the caller.
    /// This needs to (slightly awkwardly) take ownership of the buffer because the buffering
    /// API does not accept a mutable reference to a buffer.
    pub fn read_buffered_from(
        reader: R,
        mut buffer: Buffer,
        compression: Compression,
    ) -> Result<Self, InvalidRecord> {
        let mut input = match compression {
            Compression::None => Input::Plain(reader, buffer),
            Compression::Gzip => {
                buffer.clear();
                Input::Compressed(BufReader::with_buffer(
                    buffer,
                    flate2::bufread::GzDecoder::new(reader),
                ))
            }
        };

        let header = get_record_header(&mut input)?;
        let len = match header.content_length() {
            None => {
                return Err(InvalidRecord::UnknownLength(
                    header.get_field_bytes_raw("Content-Length").map(|bytes| bytes.to_vec()),
                ));
            }
            Some(n) => n,
        };
        trace!(
            "Read header of {:?} record {:?} with {} byte block",
            header.get_field("WARC-Type"),
            header.record_id(),
            len
        );

        Ok(Record {
            content_length: len,
            bytes_remaining: len,
            header,
            input,
        })
    }

    /// Get the expected length of the record body.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> u64 {
        self.content_length
    }

    /// Advance the input reader past this record's payload and return the input.
    ///
    /// This method **must be called** if the caller wants to continue reading from
    /// the input following this record. If not, the input stream may be left somewhere in
    /// the middle of the record, and the exact location is not predictable.
    ///
    /// Expects there to be two newlines following the payload as specified by
    /// the WARC standard; if missing, `FinishError::MissingTail` is returned and some of the
    /// data following the record may have been consumed. A compressed record must be the only
    /// contents of its gzip member, or `FinishError::TrailingData` is returned.
    pub fn finish(mut self) -> Result<(R, Buffer), FinishError> {
        self.skip_block()?;

        let mut tail = [0u8; 4];
        if let Err(e) = self.input.read_exact(&mut tail[..]) {
            if e.kind() == ErrorKind::UnexpectedEof {
                return Err(FinishError::MissingTail);
            }
            return Err(e.into());
        }
        if &tail[..] != b"\r\n\r\n" {
            return Err(FinishError::MissingTail);
        }

        // The gzip member must end with the record, which also verifies its trailer. Anything
        // else in the member would be a following record that can never be reached, since the
        // next record is read from the next member.
        if let Input::Compressed(ref mut input) = self.input {
            if !input.fill_buf()?.is_empty() {
                return Err(FinishError::TrailingData);
            }
        }

        let Record { input, .. } = self;
        Ok(input.into_inner())
    }

    fn skip_block(&mut self) -> Result<(), IoError> {
        let mut buf = [0u8; SKIP_BUF_LEN];
        while self.bytes_remaining > 0 {
            let n = cmp::min(buf.len() as u64, self.bytes_remaining) as usize;
            self.input.read_exact(&mut buf[..n])?;
            self.bytes_remaining -= n as u64;
        }
        Ok(())
    }
}

/// Reads the records of a single input in order.
///
/// Records are produced one at a time and borrow the reader, so at most one record is live at
/// once. Each record must be [finished](Record::finish) before requesting the next one; handing
/// the buffer returned by `finish` back through [`recycle`](Self::recycle) lets the next record
/// reuse it instead of allocating.
///
/// ```
/// # use warcio::{Compression, RecordReader};
/// let input = b"WARC/1.1\r\nWARC-Type: resource\r\nContent-Length: 2\r\n\r\nhi\r\n\r\n";
/// let mut reader = RecordReader::new(&input[..], Compression::None);
///
/// let record = reader.next().unwrap().unwrap();
/// assert_eq!(record.header.record_type().unwrap(), "resource");
/// let (_, buffer) = record.finish().unwrap();
/// reader.recycle(buffer);
///
/// assert!(reader.next().is_none());
/// ```
pub struct RecordReader<R> {
    input: R,
    compression: Compression,
    buffer: Option<Buffer>,
}

impl<R: BufRead> RecordReader<R> {
    /// Construct a reader of records with the given compression from an input.
    pub fn new(input: R, compression: Compression) -> Self {
        RecordReader {
            input,
            compression,
            buffer: None,
        }
    }

    /// Construct a reader that starts out with the given record buffer.
    pub fn with_buffer(input: R, compression: Compression, buffer: Buffer) -> Self {
        RecordReader {
            input,
            compression,
            buffer: Some(buffer),
        }
    }

    /// Read the next record.
    ///
    /// Returns `None` when the input is exhausted at a record boundary. Input that ends partway
    /// through a record header is an [`InvalidRecord::EndOfStream`] error.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<Result<Record<&mut R>, InvalidRecord>> {
        match self.input.fill_buf() {
            Ok(buf) if buf.is_empty() => return None,
            Ok(_) => {}
            Err(e) => return Some(Err(InvalidRecord::IoError(e))),
        }

        let buffer = self
            .buffer
            .take()
            .unwrap_or_else(|| Buffer::with_capacity(DEFAULT_BUFFER_LEN));
        Some(Record::read_buffered_from(
            &mut self.input,
            buffer,
            self.compression,
        ))
    }

    /// Give back the buffer of a finished record for use by the next one.
    pub fn recycle(&mut self, buffer: Buffer) {
        self.buffer = Some(buffer);
    }

    /// Get the compression records are read with.
    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Return the underlying input and the buffer waiting to be reused, if any.
    pub fn into_inner(self) -> (R, Option<Buffer>) {
        (self.input, self.buffer)
    }
}

/// Write adapter for a record block, returned by [`Header::write_to`].
///
/// Accepts at most `Content-Length` bytes; writes beyond that return `0`. [`Self::finish`]
/// must be called once the block has been written to terminate the record.
pub struct RecordWriter<W: Write> {
    limit: u64,
    written: u64,
    writer: Option<compression::Writer<W>>,
}

impl<W: Write> RecordWriter<W> {
    pub(crate) fn new(dest: W, header: &Header, compression: Compression) -> std::io::Result<Self> {
        let limit = header.content_length().ok_or_else(|| {
            IoError::new(
                ErrorKind::InvalidInput,
                "record header has no valid Content-Length",
            )
        })?;

        let mut writer = compression::Writer::new(dest, compression);
        header.write_fields(&mut writer)?;
        Ok(RecordWriter {
            limit,
            written: 0,
            writer: Some(writer),
        })
    }

    /// Get the number of block bytes that may still be written.
    pub fn remaining(&self) -> u64 {
        self.limit - self.written
    }

    /// Terminate the record and return the output stream.
    ///
    /// Fails with [`InvalidData`](ErrorKind::InvalidData) if fewer than `Content-Length` bytes
    /// were written, leaving the output with an incomplete record.
    pub fn finish(mut self) -> std::io::Result<W> {
        let mut writer = match self.writer.take() {
            Some(w) => w,
            None => return Err(IoError::new(ErrorKind::Other, "record was already finished")),
        };
        if self.written < self.limit {
            return Err(IoError::new(
                ErrorKind::InvalidData,
                format!(
                    "record block has {} bytes but Content-Length is {}",
                    self.written, self.limit
                ),
            ));
        }

        // A record is always followed by CRLF2
        writer.write_all(b"\r\n\r\n")?;
        writer.finish()
    }
}

impl<W: Write> Write for RecordWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let writer = match self.writer.as_mut() {
            Some(w) => w,
            None => return Ok(0),
        };
        let take = cmp::min(buf.len() as u64, self.limit - self.written) as usize;
        if take == 0 {
            return Ok(0);
        }

        let written = writer.write(&buf[..take])?;
        self.written += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self.writer.as_mut() {
            Some(w) => w.flush(),
            None => Ok(()),
        }
    }
}

impl<W: Write> Drop for RecordWriter<W> {
    fn drop(&mut self) {
        if self.writer.is_some() {
            error!(
                "record writer dropped without finishing after {} of {} bytes",
                self.written, self.limit
            );
        }
    }
}
