use crate::FieldName;

/// Standardized values for [field names](FieldName).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// `WARC-Record-ID`: a globally unique identifier for a record.
    ///
    /// Mandatory. The value is a URI delimited by angle brackets, usually a UUID URN such as
    /// `<urn:uuid:f81d4fae-7dec-11d0-a765-00a0c91e6bf6>`.
    RecordId,
    /// `Content-Length`: the number of bytes in the record block.
    ///
    /// Mandatory. One or more ASCII digits.
    ContentLength,
    /// `WARC-Date`: the instant that capture of the record began.
    ///
    /// Mandatory. A UTC timestamp in the W3C profile of ISO 8601, like `YYYY-MM-DDThh:mm:ssZ`.
    Date,
    /// `WARC-Type`: the type of a record, corresponding to a [`RecordType`](crate::RecordType).
    ///
    /// Mandatory.
    Type,
    /// `Content-Type`: the MIME type of a record's block.
    ///
    /// Captured HTTP traffic has type `application/http;msgtype=response` (or `request`).
    ContentType,
    /// `WARC-Concurrent-To`: the [`RecordId`](Self::RecordId) of a record created as part of
    /// the same capture event, such as the request that produced a response.
    ///
    /// This field may legitimately appear more than once in a header.
    ConcurrentTo,
    /// `WARC-Block-Digest`: a `labelled-digest` (`algorithm ":" digest-value`) of the complete
    /// record block, like `sha1:3EF4GH5IJ6KL7MN8OPQAB2CD`.
    BlockDigest,
    /// `WARC-Payload-Digest`: a `labelled-digest` of the record payload.
    ///
    /// For `application/http` blocks the payload is the HTTP entity body, excluding the status
    /// line and headers. A [revisit](crate::RecordKind::Revisit) keeps the payload digest of
    /// the content it elides.
    PayloadDigest,
    /// `WARC-IP-Address`: the IP address that was contacted to retrieve record content.
    IpAddress,
    /// `WARC-Refers-To`: the record ID of a single record for which the present record
    /// holds additional content, such as the original capture of a revisit.
    RefersTo,
    /// `WARC-Refers-To-Target-URI`: the [`TargetURI`](Self::TargetURI) of the record referred to by
    /// [`RefersTo`](Self::RefersTo).
    RefersToTargetURI,
    /// `WARC-Refers-To-Date`: the [`Date`](Self::Date) of the record referred to by
    /// [`RefersTo`](Self::RefersTo).
    RefersToDate,
    /// `WARC-Target-URI`: the original URI that provided the record content.
    ///
    /// Some writers of WARC 1.0 files wrap this value in angle brackets; see
    /// [`unwrap_uri`](crate::unwrap_uri).
    TargetURI,
    /// `WARC-Truncated`: the reason that a record holds a truncated version of the original
    /// resource: `length`, `time`, `disconnect` or `unspecified`.
    Truncated,
    /// `WARC-Warcinfo-ID`: the [ID](Self::RecordId) of the [warcinfo](crate::RecordKind::Info)
    /// record associated with this record.
    InfoID,
    /// `WARC-Filename`: the name of the file containing the current
    /// [warcinfo](crate::RecordKind::Info) record.
    Filename,
    /// `WARC-Profile`: the kind of analysis and handling applied to create a
    /// [revisit](crate::RecordKind::Revisit) record, specified as a URI.
    Profile,
    /// `WARC-Identified-Payload-Type`: the content-type discovered by inspecting a record payload.
    IdentifiedPayloadType,
    /// `WARC-Segment-Number`: the current record's ordering in a sequence of segmented records.
    SegmentNumber,
    /// `WARC-Segment-Origin-ID`: the ID of the starting record in a series of segmented records.
    SegmentOriginID,
    /// `WARC-Segment-Total-Length`: the total length of concatenated segmented content blocks.
    SegmentTotalLength,
}

impl FieldKind {
    pub fn into_name(self) -> FieldName {
        FieldName::Known(self)
    }
}

include!(concat!(env!("OUT_DIR"), "/field_kind_conversions.rs"));

impl PartialEq<FieldName> for FieldKind {
    fn eq(&self, other: &FieldName) -> bool {
        other == self
    }
}
