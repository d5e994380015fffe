//! Deduplication of crawl captures stored as WARC.
//!
//! A crawler that downloads the same content from several URLs (or the same URL several times)
//! stores the payload again for every capture. [`Deduplicator`] rewrites a WARC file in a single
//! forward pass, replacing every `response` whose `WARC-Payload-Digest` was already seen earlier
//! in the pass with a `revisit` record that refers to the first capture. Records are written in
//! the order they were read and no record is dropped, so everything captured can still be
//! reconstructed from the output.
//!
//! Digests are taken from the records as written by the capture tool; they are compared as
//! strings and never computed here. Responses without a digest are copied through unchanged.

#[macro_use]
extern crate log;

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use warcio::record::Buffer;
use warcio::{Compression, FieldKind, Record, RecordKind, RecordReader};

pub use error::DedupeError;

use crate::digest::LabelledDigest;
use crate::response_log::{Capture, InMemoryResponseLog, ResponseLog};
use crate::revisit::{RecordIdGenerator, UuidRecordIds};

pub mod digest;
mod error;
pub mod item;
pub mod response_log;
pub mod revisit;

/// Size of the buffer used for record input.
const BUFFER_LEN: usize = 64 << 10;

/// What was written for a single input record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The record was copied unchanged, apart from unwrapping its target URI.
    ///
    /// The block is copied byte-for-byte. The header keeps its fields and values but is written
    /// in canonical form (see [`Header::write_to`](warcio::Header::write_to)), so its bytes may
    /// differ from the input's.
    Copied,
    /// The record was a duplicate response and was replaced with a revisit.
    Deduplicated,
    /// The record was a response without a payload digest, so it was copied unchanged.
    MissingDigest,
    /// The record was a warcinfo record and its `WARC-Filename` was rewritten.
    RewroteInfo,
}

/// Counts of records processed by [`Deduplicator::read_stream`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    /// Records read, which is equal to the number of records written.
    pub records: u64,
    /// Records written with their original type and block.
    pub copied: u64,
    /// Responses replaced with revisits.
    pub deduplicated: u64,
    /// Responses that could not be deduplicated because they lack a payload digest. These are
    /// also counted as copied.
    pub missing_digest: u64,
}

impl Stats {
    fn count(&mut self, disposition: Disposition) {
        self.records += 1;
        match disposition {
            Disposition::Deduplicated => self.deduplicated += 1,
            Disposition::MissingDigest => {
                self.missing_digest += 1;
                self.copied += 1;
            }
            Disposition::Copied | Disposition::RewroteInfo => self.copied += 1,
        }
    }
}

/// Rewrites WARC records, replacing repeated payloads with revisits.
///
/// Records are read from one or more inputs and written to `output` with the configured
/// compression. The [`ResponseLog`] remembers the first response carrying each payload digest;
/// later responses with the same digest become revisits referring to it.
pub struct Deduplicator<W, L, G = UuidRecordIds> {
    output: W,
    output_compression: Compression,
    output_filename: Option<String>,
    log: L,
    record_ids: G,
    buffer: Option<Buffer>,
}

impl<W, L> Deduplicator<W, L>
where
    W: Write,
    L: ResponseLog,
{
    /// Construct a deduplicator writing records to `output`.
    ///
    /// Revisit records get random UUID record IDs.
    pub fn new(output: W, log: L, output_compression: Compression) -> Self {
        Deduplicator {
            output,
            output_compression,
            output_filename: None,
            log,
            record_ids: UuidRecordIds,
            buffer: None,
        }
    }
}

impl<W, L, G> Deduplicator<W, L, G>
where
    W: Write,
    L: ResponseLog,
    G: RecordIdGenerator,
{
    /// Set the name written to `WARC-Filename` of warcinfo records.
    ///
    /// This should be the file name (not path) of the output. If not set, warcinfo records are
    /// copied unchanged.
    pub fn with_output_filename<S: Into<String>>(mut self, filename: S) -> Self {
        self.output_filename = Some(filename.into());
        self
    }

    /// Use a different source of record IDs for revisit records.
    pub fn with_record_ids<G2: RecordIdGenerator>(self, record_ids: G2) -> Deduplicator<W, L, G2> {
        Deduplicator {
            output: self.output,
            output_compression: self.output_compression,
            output_filename: self.output_filename,
            log: self.log,
            record_ids,
            buffer: self.buffer,
        }
    }

    /// Get the response log.
    pub fn log(&self) -> &L {
        &self.log
    }

    /// Return the output stream.
    pub fn into_inner(self) -> W {
        self.output
    }

    /// Read every record from `input` and write the results to the output.
    ///
    /// Stops at the first error. Records read before the error have already been written.
    pub fn read_stream<R: BufRead>(
        &mut self,
        input: R,
        compression: Compression,
    ) -> Result<Stats, DedupeError> {
        let mut records = RecordReader::with_buffer(input, compression, self.take_buffer());
        let mut stats = Stats::default();
        while let Some(record) = records.next() {
            let disposition = self.write_record(record?)?;
            stats.count(disposition);
            records.recycle(self.take_buffer());
        }

        info!(
            "Wrote {} records: {} copied ({} without digest) and {} deduplicated",
            stats.records, stats.copied, stats.missing_digest, stats.deduplicated
        );
        Ok(stats)
    }

    /// Read a single record from `input` and write it (or its revisit) to the output.
    ///
    /// The input is left at the start of the following record.
    pub fn read_record<R: BufRead>(
        &mut self,
        input: R,
        compression: Compression,
    ) -> Result<Disposition, DedupeError> {
        let record = Record::read_buffered_from(input, self.take_buffer(), compression)?;
        self.write_record(record)
    }

    fn take_buffer(&mut self) -> Buffer {
        self.buffer
            .take()
            .unwrap_or_else(|| Buffer::with_capacity(BUFFER_LEN))
    }

    fn write_record<R: BufRead>(
        &mut self,
        mut record: Record<R>,
    ) -> Result<Disposition, DedupeError> {
        // Every record is written with a bare target URI
        record.header.unwrap_target_uri();

        let kind = record.header.record_type().and_then(|t| t.kind());
        let disposition = match kind {
            Some(RecordKind::Response) => return self.read_response(record),
            Some(RecordKind::Info) => match self.output_filename {
                Some(ref filename) => {
                    record.header.set_field(FieldKind::Filename, filename.as_str());
                    Disposition::RewroteInfo
                }
                None => Disposition::Copied,
            },
            _ => Disposition::Copied,
        };

        self.copy_record(record)?;
        Ok(disposition)
    }

    fn read_response<R: BufRead>(&mut self, record: Record<R>) -> Result<Disposition, DedupeError> {
        let digest = match LabelledDigest::from_header(&record.header) {
            Some(d) => d,
            None => {
                warn!(
                    "Response {:?} for {:?} has no payload digest; copying it unchanged",
                    record.header.record_id(),
                    record.header.target_uri()
                );
                self.copy_record(record)?;
                return Ok(Disposition::MissingDigest);
            }
        };
        let record_id = record.header.record_id().map(str::to_owned);
        if record_id.is_none() {
            warn!(
                "Response for {:?} has no record ID; revisits of it will lack WARC-Refers-To",
                record.header.target_uri()
            );
        }

        let capture = Capture {
            record_id,
            date: record.header.warc_date().map(str::to_owned),
            target_uri: record.header.target_uri().map(str::to_owned),
        };
        let first = match self.log.add(digest, capture) {
            Some(first) => first.clone(),
            None => {
                self.copy_record(record)?;
                return Ok(Disposition::Copied);
            }
        };

        self.write_revisit(record, &first)?;
        Ok(Disposition::Deduplicated)
    }

    fn copy_record<R: BufRead>(&mut self, mut record: Record<R>) -> Result<(), DedupeError> {
        trace!("Copying record {:?}", record.header.record_id());
        let mut writer = record
            .header
            .write_to(&mut self.output, self.output_compression)
            .map_err(DedupeError::Write)?;

        // Copy chunks of the block out of the input's buffer, so the amount of a record held in
        // memory is bounded by the buffer size.
        loop {
            let n = {
                let buf = record.fill_buf().map_err(DedupeError::Read)?;
                if buf.is_empty() {
                    break;
                }
                writer.write_all(buf).map_err(DedupeError::Write)?;
                buf.len()
            };
            record.consume(n);
        }
        writer.finish().map_err(DedupeError::Write)?;

        self.finish_input(record)
    }

    fn write_revisit<R: BufRead>(
        &mut self,
        mut record: Record<R>,
        first: &Capture,
    ) -> Result<(), DedupeError> {
        let block = revisit::read_http_header_block(&mut record).map_err(DedupeError::Read)?;
        let record_id = self.record_ids.next_id();
        let header = revisit::revisit_header(&record.header, first, &record_id, block.len() as u64);
        info!(
            "Record {:?} for {:?} duplicates {:?} from {:?}; writing revisit {}",
            record.header.record_id(),
            header.target_uri(),
            first.record_id,
            first.date,
            record_id
        );

        let mut writer = header
            .write_to(&mut self.output, self.output_compression)
            .map_err(DedupeError::Write)?;
        writer.write_all(&block).map_err(DedupeError::Write)?;
        writer.finish().map_err(DedupeError::Write)?;

        self.finish_input(record)
    }

    /// Advance the input past a record, keeping its buffer for the next one.
    fn finish_input<R: BufRead>(&mut self, record: Record<R>) -> Result<(), DedupeError> {
        let record_id = record.header.record_id().map(str::to_owned);
        let (_, buffer) = record
            .finish()
            .map_err(|source| DedupeError::MalformedRecord { record_id, source })?;
        self.buffer = Some(buffer);
        Ok(())
    }
}

/// Deduplicate the WARC file at `input`, writing the results to `output`.
///
/// See [`deduplicate_file_with`].
pub fn deduplicate_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
) -> Result<Stats, DedupeError> {
    deduplicate_file_with(input, output, |file| file)
}

/// Deduplicate the WARC file at `input`, writing the results to `output`.
///
/// Input compression is detected from the file contents; output is always compressed. The
/// warcinfo `WARC-Filename` is set to the file name of `output`.
///
/// Output is written to a temporary file in the same directory as `output` and only moved to
/// `output` once every record has been written, so a failed pass never leaves a partial file at
/// `output`. The input file is never modified.
///
/// `wrap_input` is applied to the opened input file before reading, which allows callers to
/// observe progress.
pub fn deduplicate_file_with<P, Q, F, R>(
    input: P,
    output: Q,
    wrap_input: F,
) -> Result<Stats, DedupeError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    F: FnOnce(File) -> R,
    R: Read,
{
    let (input, output) = (input.as_ref(), output.as_ref());
    let file = File::open(input).map_err(|source| DedupeError::Open {
        path: input.to_owned(),
        source,
    })?;
    let mut reader = BufReader::with_capacity(BUFFER_LEN, wrap_input(file));
    let compression = Compression::detect(&mut reader).map_err(DedupeError::Read)?;
    debug!("Reading {:?} with compression {:?}", input, compression);

    let create_error = |source| DedupeError::Create {
        path: output.to_owned(),
        source,
    };
    let output_dir = match output.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let temp = tempfile::Builder::new()
        .prefix(".crawl-dedupe-")
        .suffix(".warc.gz.tmp")
        .tempfile_in(output_dir)
        .map_err(create_error)?;

    let mut deduplicator = Deduplicator::new(
        BufWriter::new(temp),
        InMemoryResponseLog::new(),
        Compression::Gzip,
    );
    if let Some(name) = output.file_name() {
        deduplicator = deduplicator.with_output_filename(name.to_string_lossy());
    }

    let stats = deduplicator.read_stream(&mut reader, compression)?;
    let temp = deduplicator
        .into_inner()
        .into_inner()
        .map_err(|e| DedupeError::Write(e.into_error()))?;
    temp.as_file().sync_all().map_err(DedupeError::Write)?;
    temp.persist(output).map_err(|e| DedupeError::Persist {
        path: output.to_owned(),
        source: e.error,
    })?;

    Ok(stats)
}
