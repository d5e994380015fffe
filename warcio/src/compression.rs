//! Handling of record compression.
//!
//! Records in a compressed WARC file are compressed individually, each as its own gzip member,
//! so a reader that knows the offset of a record can decompress it alone. A `.warc.gz` file is
//! therefore a concatenation of gzip members, one per record.

use std::io::{BufRead, Result as IoResult, Write};

use flate2::write::GzEncoder;

/// The first two bytes of every gzip member.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// The supported methods of compressing a single [`Record`](crate::Record).
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Compression {
    /// Uncompressed data
    None,
    /// `gzip` compression
    ///
    /// Each record has its own gzip header and trailer, the latter including a CRC32 of the
    /// uncompressed record that is verified on read.
    Gzip,
}

impl Compression {
    /// Determine the compression of an input by peeking at its first bytes.
    ///
    /// Nothing is consumed from the input. Empty input is reported as uncompressed.
    ///
    /// ```
    /// # use warcio::Compression;
    /// let mut input = &b"\x1f\x8b\x08\x00"[..];
    /// assert_eq!(Compression::detect(&mut input).unwrap(), Compression::Gzip);
    /// assert_eq!(input.len(), 4);
    /// ```
    pub fn detect<R: BufRead>(input: &mut R) -> IoResult<Compression> {
        let buf = input.fill_buf()?;
        let detected = if buf.len() >= 2 && buf[..2] == GZIP_MAGIC {
            Compression::Gzip
        } else {
            Compression::None
        };
        trace!("Detected input compression {:?}", detected);
        Ok(detected)
    }
}

/// Writes to an output stream with specified [`Compression`].
///
/// For [`Compression::Gzip`] each `Writer` produces exactly one gzip member, completed by
/// [`finish`](Self::finish).
pub enum Writer<W: Write> {
    /// Data is written through unchanged.
    Plain(W),
    /// Data is compressed into a single gzip member.
    Gzip(GzEncoder<W>),
}

impl<W: Write> Writer<W> {
    /// Construct a writer to the given adapter with the given compression mode.
    pub fn new(dest: W, mode: Compression) -> Self {
        match mode {
            Compression::None => Self::Plain(dest),
            Compression::Gzip => Self::Gzip(GzEncoder::new(dest, flate2::Compression::best())),
        }
    }

    /// Gracefully close the writer (terminating a compressed stream) and return the output stream.
    pub fn finish(self) -> IoResult<W> {
        match self {
            Self::Plain(w) => Ok(w),
            Self::Gzip(gz) => gz.finish(),
        }
    }
}

impl<W: Write> Write for Writer<W> {
    fn write(&mut self, buf: &[u8]) -> IoResult<usize> {
        match self {
            Writer::Plain(w) => w.write(buf),
            Writer::Gzip(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> IoResult<()> {
        match self {
            Writer::Plain(w) => w.flush(),
            Writer::Gzip(w) => w.flush(),
        }
    }
}
