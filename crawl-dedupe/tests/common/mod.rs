//! Builders for synthetic crawl output.
#![allow(dead_code)]

use std::io::Write;

use warcio::{Compression, FieldKind, Header, RecordReader, Version};

pub const CAPTURE_DATE: &str = "2019-06-22T10:00:00Z";

/// An HTTP response carrying `payload`.
pub fn http_response(payload: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n{}",
        payload.len(),
        payload
    )
}

/// The header block of [`http_response`].
pub fn http_headers(payload: &str) -> String {
    let response = http_response(payload);
    response[..response.len() - payload.len()].to_owned()
}

/// Description of one record to write.
#[derive(Debug, Clone)]
pub struct Fixture {
    pub kind: &'static str,
    pub id: String,
    pub uri: Option<String>,
    pub date: String,
    pub digest: Option<String>,
    pub block: Vec<u8>,
}

impl Fixture {
    pub fn response(n: u32, uri: &str, digest: Option<&str>, payload: &str) -> Self {
        Fixture {
            kind: "response",
            id: record_id(n),
            uri: Some(uri.to_owned()),
            date: format!("2019-06-22T10:00:{:02}Z", n),
            digest: digest.map(str::to_owned),
            block: http_response(payload).into_bytes(),
        }
    }

    pub fn of_kind(kind: &'static str, n: u32, digest: Option<&str>) -> Self {
        Fixture {
            kind,
            id: record_id(n),
            uri: Some(format!("http://example.com/{}", kind)),
            date: CAPTURE_DATE.to_owned(),
            digest: digest.map(str::to_owned),
            block: format!("{} block {}", kind, n).into_bytes(),
        }
    }

    pub fn warcinfo(filename: &str) -> Self {
        Fixture {
            kind: "warcinfo",
            id: record_id(0),
            uri: None,
            date: CAPTURE_DATE.to_owned(),
            digest: None,
            block: format!("software: Wget/1.20.3\r\nfilename: {}\r\n", filename).into_bytes(),
        }
    }

    pub fn header(&self) -> Header {
        let mut header = Header::new(Version::WARC1_0);
        header.set_field(FieldKind::Type, self.kind);
        header.set_field(FieldKind::RecordId, self.id.as_str());
        if let Some(ref uri) = self.uri {
            // Written the way Wget writes WARC/1.0 URIs
            header.set_field(FieldKind::TargetURI, format!("<{}>", uri));
        }
        header.set_field(FieldKind::Date, self.date.as_str());
        if let Some(ref digest) = self.digest {
            header.set_field(FieldKind::PayloadDigest, digest.as_str());
        }
        if self.kind == "warcinfo" {
            header.set_field(FieldKind::Filename, "capture.warc.gz");
        }
        let content_type = match self.kind {
            "response" | "revisit" => "application/http;msgtype=response",
            "request" => "application/http;msgtype=request",
            _ => "application/warc-fields",
        };
        header.set_field(FieldKind::ContentType, content_type);
        header.set_field(FieldKind::BlockDigest, "sha1:BLOCKDIGEST");
        header.set_field(FieldKind::ContentLength, self.block.len().to_string());
        header
    }
}

pub fn record_id(n: u32) -> String {
    format!("<urn:uuid:00000000-0000-4000-8000-{:012}>", n)
}

/// Serialize records as a WARC file.
pub fn warc(records: &[Fixture], compression: Compression) -> Vec<u8> {
    let mut out = Vec::new();
    for record in records {
        let mut writer = record
            .header()
            .write_to(&mut out, compression)
            .expect("failed to write header");
        writer.write_all(&record.block).unwrap();
        writer.finish().unwrap();
    }
    out
}

/// Read every record of a WARC file.
pub fn read_warc(bytes: &[u8], compression: Compression) -> Vec<(Header, Vec<u8>)> {
    use std::io::Read;

    let mut reader = RecordReader::new(bytes, compression);
    let mut records = vec![];
    while let Some(record) = reader.next() {
        let mut record = record.expect("output record should parse");
        let mut block = vec![];
        record.read_to_end(&mut block).unwrap();
        let header = record.header.clone();
        record.finish().expect("output record should be terminated");
        records.push((header, block));
    }
    records
}

/// A record ID generator producing a predictable sequence.
pub fn sequential_ids() -> impl FnMut() -> String {
    let mut n = 0;
    move || {
        n += 1;
        format!("<urn:uuid:ffffffff-0000-4000-8000-{:012}>", n)
    }
}
