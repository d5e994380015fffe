use std::io::Cursor;

use pretty_assertions::assert_eq;

use crawl_dedupe::response_log::InMemoryResponseLog;
use crawl_dedupe::revisit::IDENTICAL_PAYLOAD_DIGEST_PROFILE;
use crawl_dedupe::{Deduplicator, Stats};
use warcio::{Compression, FieldKind, RecordKind};

mod common;
use common::{http_headers, read_warc, record_id, sequential_ids, warc, Fixture};

/// Deduplicate `input`, returning the stats and gzip-compressed output.
fn deduplicate(input: &[u8], compression: Compression) -> (Stats, Vec<u8>) {
    let mut out: Vec<u8> = vec![];
    let mut deduplicator =
        Deduplicator::new(&mut out, InMemoryResponseLog::new(), Compression::Gzip)
            .with_output_filename("capture-deduplicated.warc.gz")
            .with_record_ids(sequential_ids());
    let stats = deduplicator
        .read_stream(Cursor::new(input), compression)
        .expect("read_stream returned an unexpected error");
    drop(deduplicator);
    (stats, out)
}

fn repeated_payload() -> Vec<Fixture> {
    vec![
        Fixture::warcinfo("capture.warc.gz"),
        Fixture::response(1, "http://example.com/u1", Some("sha1:AAAA"), "first payload"),
        Fixture::response(2, "http://example.com/u2", Some("sha1:BBBB"), "second payload"),
        Fixture::response(3, "http://example.com/u3", Some("sha1:AAAA"), "first payload"),
    ]
}

#[test]
fn deduplicates_repeated_payload() {
    let fixtures = repeated_payload();
    let (stats, out) = deduplicate(&warc(&fixtures, Compression::Gzip), Compression::Gzip);

    assert_eq!(
        stats,
        Stats {
            records: 4,
            copied: 3,
            deduplicated: 1,
            missing_digest: 0,
        }
    );

    let records = read_warc(&out, Compression::Gzip);
    let types: Vec<_> = records
        .iter()
        .map(|(h, _)| h.record_type().and_then(|t| t.kind()))
        .collect();
    assert_eq!(
        types,
        vec![
            Some(RecordKind::Info),
            Some(RecordKind::Response),
            Some(RecordKind::Response),
            Some(RecordKind::Revisit),
        ]
    );

    // Unique responses are unchanged apart from their URIs
    for (i, (header, block)) in records[1..3].iter().enumerate() {
        let fixture = &fixtures[i + 1];
        let mut expected = fixture.header();
        expected.unwrap_target_uri();
        assert_eq!(header, &expected);
        assert_eq!(block, &fixture.block);
    }

    let (revisit, block) = &records[3];
    assert_eq!(revisit.get_field(FieldKind::RefersTo), Some(record_id(1).as_str()));
    assert_eq!(
        revisit.get_field(FieldKind::RefersToTargetURI),
        Some("http://example.com/u1")
    );
    assert_eq!(
        revisit.get_field(FieldKind::RefersToDate),
        Some("2019-06-22T10:00:01Z")
    );
    assert_eq!(
        revisit.get_field(FieldKind::Profile),
        Some(IDENTICAL_PAYLOAD_DIGEST_PROFILE)
    );
    assert_eq!(revisit.get_field(FieldKind::Truncated), Some("length"));
    assert_eq!(revisit.get_field(FieldKind::PayloadDigest), Some("sha1:AAAA"));
    assert!(!revisit.field_exists(FieldKind::BlockDigest));
    assert_eq!(revisit.warc_date(), Some("2019-06-22T10:00:03Z"));
    assert_eq!(revisit.target_uri(), Some("http://example.com/u3"));
    assert_ne!(revisit.record_id(), Some(record_id(3).as_str()));

    // Only the HTTP headers of the duplicate remain
    assert_eq!(String::from_utf8_lossy(block), http_headers("first payload"));
    assert_eq!(revisit.content_length(), Some(block.len() as u64));
}

#[test]
fn target_uris_are_bare() {
    let (_, out) = deduplicate(&warc(&repeated_payload(), Compression::None), Compression::None);

    for (header, _) in read_warc(&out, Compression::Gzip) {
        if let Some(uri) = header.get_field_bytes_raw(FieldKind::TargetURI) {
            assert!(!uri.starts_with(b"<"), "{:?}", String::from_utf8_lossy(uri));
        }
    }
}

#[test]
fn rewrites_warcinfo_filename() {
    let (_, out) = deduplicate(&warc(&repeated_payload(), Compression::Gzip), Compression::Gzip);

    let records = read_warc(&out, Compression::Gzip);
    let (info, block) = &records[0];
    assert_eq!(
        info.get_field(FieldKind::Filename),
        Some("capture-deduplicated.warc.gz")
    );
    assert_eq!(block, &Fixture::warcinfo("capture.warc.gz").block);
}

#[test]
fn first_occurrence_is_retained() {
    let fixtures: Vec<Fixture> = (1..=6)
        .map(|n| {
            let digest = if n % 2 == 0 { "sha1:EVEN" } else { "sha1:ODD" };
            Fixture::response(n, &format!("http://example.com/{}", n), Some(digest), "x")
        })
        .collect();
    let (stats, out) = deduplicate(&warc(&fixtures, Compression::None), Compression::None);
    assert_eq!(stats.records, 6);
    assert_eq!(stats.deduplicated, 4);

    let records = read_warc(&out, Compression::Gzip);
    assert_eq!(records.len(), fixtures.len());
    for (n, (header, _)) in (1..).zip(records.iter()) {
        let expected_first = if n % 2 == 0 { 2 } else { 1 };
        if n == expected_first {
            assert_eq!(header.record_type().unwrap(), RecordKind::Response);
            assert_eq!(header.record_id(), Some(record_id(n).as_str()));
        } else {
            assert_eq!(header.record_type().unwrap(), RecordKind::Revisit);
            assert_eq!(
                header.get_field(FieldKind::RefersTo),
                Some(record_id(expected_first).as_str()),
                "record {} should refer to record {}",
                n,
                expected_first
            );
        }
    }
}

#[test]
fn output_is_deterministic() {
    let input = warc(&repeated_payload(), Compression::Gzip);

    let (_, first) = deduplicate(&input, Compression::Gzip);
    let (_, second) = deduplicate(&input, Compression::Gzip);
    assert!(first == second, "repeated passes produced different output");
}

#[test]
fn rerun_changes_nothing() {
    let (_, once) = deduplicate(&warc(&repeated_payload(), Compression::Gzip), Compression::Gzip);
    let (stats, twice) = deduplicate(&once, Compression::Gzip);

    assert_eq!(stats.records, 4);
    assert_eq!(stats.deduplicated, 0);
    assert!(once == twice, "deduplicating again should not change the output");
}

#[test]
fn missing_digest_is_never_matched() {
    let fixtures = vec![
        Fixture::response(1, "http://example.com/u1", Some("sha1:AAAA"), "payload"),
        Fixture::response(2, "http://example.com/u2", None, "payload"),
        Fixture::response(3, "http://example.com/u3", None, "payload"),
        Fixture::response(4, "http://example.com/u4", Some("sha1:AAAA"), "payload"),
    ];
    let (stats, out) = deduplicate(&warc(&fixtures, Compression::None), Compression::None);

    assert_eq!(
        stats,
        Stats {
            records: 4,
            copied: 3,
            deduplicated: 1,
            missing_digest: 2,
        }
    );

    let records = read_warc(&out, Compression::Gzip);
    for (header, block) in &records[1..3] {
        assert_eq!(header.record_type().unwrap(), RecordKind::Response);
        assert!(!header.field_exists(FieldKind::PayloadDigest));
        assert_eq!(block, &common::http_response("payload").into_bytes());
    }
    assert_eq!(
        records[3].0.get_field(FieldKind::RefersTo),
        Some(record_id(1).as_str())
    );
}

#[test]
fn only_responses_are_indexed() {
    let fixtures = vec![
        Fixture::of_kind("revisit", 1, Some("sha1:AAAA")),
        Fixture::of_kind("request", 2, Some("sha1:AAAA")),
        Fixture::of_kind("metadata", 3, Some("sha1:AAAA")),
        Fixture::of_kind("x-screenshot", 4, Some("sha1:AAAA")),
        Fixture::response(5, "http://example.com/u5", Some("sha1:AAAA"), "payload"),
        Fixture::of_kind("metadata", 6, Some("sha1:AAAA")),
    ];
    let input = warc(&fixtures, Compression::None);
    let (stats, out) = deduplicate(&input, Compression::None);

    assert_eq!(stats.records, 6);
    assert_eq!(stats.deduplicated, 0);

    let records = read_warc(&out, Compression::Gzip);
    for ((header, block), fixture) in records.iter().zip(fixtures.iter()) {
        let mut expected = fixture.header();
        expected.unwrap_target_uri();
        assert_eq!(header, &expected);
        assert_eq!(block, &fixture.block);
    }
}
