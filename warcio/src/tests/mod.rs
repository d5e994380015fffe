use pretty_assertions::assert_eq;

use crate::{FieldKind, FieldName, Header, HeaderParseError, RecordKind, RecordType, Version};


#[test]
fn header_parse_consumes_full() {
    // "WARC/1.1" CRLF (=version)
    // named-field CRLF (=warc-fields)
    // CRLF
    let text = b"\
        WARC/1.1\r\n\
        Content-Length: 123\r\n\
        \r\n\
    ";

    let (header, sz) = Header::parse(&text[..]).expect("Parse should succeed");
    assert_eq!(sz, text.len());
    let mut test_header = Header::new(Version::WARC1_1);
    test_header.set_field(FieldKind::ContentLength, "123");
    assert_eq!(header, test_header);
}

#[test]
fn header_parse_unfolds_multiline_values() {
    let text = b"WARC/1.0\r\n\
                 Warc-Type: testdata\r\n\
                 Content-Length: 6\r\n\
                 X-Multiline-Test:lol \r\n  multiline headers\r\n\
                 \r\n";

    let (header, _) = Header::parse(&text[..]).expect("Parse should succeed");
    assert_eq!(header.get_field("x-multiline-test"), Some("lol multiline headers"));
    assert_eq!(header.record_type().unwrap(), "testdata");
    assert_eq!(header.content_length(), Some(6));
}

#[test]
fn header_parse_reports_truncation() {
    assert_eq!(
        Header::parse(b"WARC/1.1\r\nWARC-Type: testdata\r\n\r"),
        Err(HeaderParseError::Truncated)
    );
    assert_eq!(Header::parse(b"WAR"), Err(HeaderParseError::Truncated));
}

#[test]
fn incorrect_signature_is_invalid() {
    assert!(matches!(
        Version::parse(b"\x89PNG\r\n\x1a\n"),
        Err(HeaderParseError::InvalidSignature(_))
    ));
    assert!(matches!(
        Version::parse(b"WARC/1.0a\r\n"),
        Err(HeaderParseError::InvalidSignature(_))
    ));
    assert!(matches!(
        Version::parse(b"WARC/10\r\n"),
        Err(HeaderParseError::InvalidSignature(_))
    ));
    assert!(matches!(
        Version::parse(b"PK"),
        Err(HeaderParseError::InvalidSignature(_))
    ));
}

#[test]
fn invalid_fields_are_invalid() {
    assert_eq!(
        Header::parse_field(b"This is not a valid field\r\n\r\n").map(|_| ()),
        Err(HeaderParseError::MalformedField)
    );
    assert_eq!(
        Header::parse_field(b"X-Invalid-UTF-8\xFF: yes\r\n\r\n").map(|_| ()),
        Err(HeaderParseError::MalformedField)
    );
    assert_eq!(
        Header::parse_field(b": no name\r\n\r\n").map(|_| ()),
        Err(HeaderParseError::MalformedField)
    );
}

#[test]
fn field_names_are_case_insensitive() {
    let mut header = Header::new(Version::WARC1_0);
    header.set_field("warc-payload-digest", "sha1:AAAA");
    header.set_field("X-Custom", "one");

    assert_eq!(header.get_field(FieldKind::PayloadDigest), Some("sha1:AAAA"));
    assert_eq!(header.get_field("WARC-PAYLOAD-DIGEST"), Some("sha1:AAAA"));
    assert_eq!(header.get_field("x-custom"), Some("one"));

    let names: Vec<&str> = header.iter_field_bytes().map(|(k, _)| k.as_ref()).collect();
    assert_eq!(names, vec!["WARC-Payload-Digest", "X-Custom"]);
}

#[test]
fn duplicate_fields_are_retained() {
    let text = b"WARC/1.0\r\n\
                 WARC-Type: response\r\n\
                 WARC-Concurrent-To: <urn:uuid:a>\r\n\
                 Content-Length: 0\r\n\
                 WARC-Concurrent-To: <urn:uuid:b>\r\n\
                 \r\n";
    let (mut header, _) = Header::parse(&text[..]).unwrap();

    assert_eq!(header.get_field(FieldKind::ConcurrentTo), Some("<urn:uuid:a>"));
    let all: Vec<&[u8]> = header.get_all_field_bytes(FieldKind::ConcurrentTo).collect();
    assert_eq!(all, vec![&b"<urn:uuid:a>"[..], &b"<urn:uuid:b>"[..]]);
    assert_eq!(header.len(), 4);

    // Setting replaces every value in place
    header.set_field(FieldKind::ConcurrentTo, "<urn:uuid:c>");
    let fields: Vec<(&str, &[u8])> = header
        .iter_field_bytes()
        .map(|(k, v)| (k.as_ref(), v))
        .collect();
    assert_eq!(
        fields,
        vec![
            ("WARC-Type", &b"response"[..]),
            ("WARC-Concurrent-To", &b"<urn:uuid:c>"[..]),
            ("Content-Length", &b"0"[..]),
        ]
    );
}

#[test]
fn remove_field_preserves_order() {
    let mut header = Header::new(Version::WARC1_0);
    header.set_field(FieldKind::Type, "response");
    header.set_field(FieldKind::BlockDigest, "sha1:X");
    header.set_field(FieldKind::Date, "2019-06-22T10:00:00Z");

    assert_eq!(header.remove_field(FieldKind::BlockDigest), Some(b"sha1:X".to_vec()));
    assert_eq!(header.remove_field(FieldKind::BlockDigest), None);
    assert!(!header.field_exists(FieldKind::BlockDigest));

    let names: Vec<&str> = header.iter_field_bytes().map(|(k, _)| k.as_ref()).collect();
    assert_eq!(names, vec!["WARC-Type", "WARC-Date"]);
}

#[test]
fn bare_uris_are_read_without_brackets() {
    let mut header = Header::new(Version::WARC1_0);
    header.set_field(FieldKind::TargetURI, "<http://example.com/>");
    header.set_field(FieldKind::RecordId, "<urn:uuid:1>");

    assert_eq!(header.target_uri(), Some("http://example.com/"));
    assert_eq!(
        header.get_field_bytes_raw(FieldKind::TargetURI),
        Some(&b"<http://example.com/>"[..])
    );
    // Record IDs are always bracketed
    assert_eq!(header.record_id(), Some("<urn:uuid:1>"));
}

#[test]
fn unwrap_target_uri_rewrites_raw_value() {
    let mut header = Header::new(Version::WARC1_0);
    header.set_field(FieldKind::TargetURI, "<http://example.com/a>");

    assert!(header.unwrap_target_uri());
    assert_eq!(
        header.get_field_bytes_raw(FieldKind::TargetURI),
        Some(&b"http://example.com/a"[..])
    );
    assert!(!header.unwrap_target_uri(), "second unwrap should change nothing");

    let mut no_uri = Header::new(Version::WARC1_0);
    assert!(!no_uri.unwrap_target_uri());
}

#[test]
fn unwrap_uri_is_idempotent() {
    for input in [
        &b"http://example.com/"[..],
        b"<http://example.com/>",
        b"<<http://example.com/>>",
        b"<>",
        b"",
        b"<unbalanced",
    ] {
        let once = crate::unwrap_uri(input);
        assert_eq!(crate::unwrap_uri(once), once, "input {:?}", input);
    }
    assert_eq!(crate::unwrap_uri(b"<unbalanced"), b"<unbalanced");
}

#[test]
fn record_types_parse_case_insensitively() {
    assert_eq!(RecordType::from("WARCINFO"), RecordKind::Info);
    assert_eq!(RecordType::from("warcinfo").kind(), Some(RecordKind::Info));
    assert_eq!(RecordType::from("Revisit").as_ref(), "revisit");

    let custom = RecordType::from("X-Screenshot");
    assert_eq!(custom.kind(), None);
    assert_eq!(custom.as_ref(), "X-Screenshot");
}

#[test]
fn field_kinds_round_trip_through_names() {
    let name: FieldName = "WARC-REFERS-TO-TARGET-URI".into();
    assert_eq!(name, FieldKind::RefersToTargetURI);
    assert_eq!(name.as_ref(), "WARC-Refers-To-Target-URI");
    assert!(name.value_is_bare_uri());
    assert!(!FieldName::from(FieldKind::RefersTo).value_is_bare_uri());
}
