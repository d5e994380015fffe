use uncased::AsUncased;

/// Standardized values for [record types](crate::RecordType).
#[derive(Debug, Clone, Copy, PartialOrd, Ord)]
pub enum RecordKind {
    /// `warcinfo`: describes the records that follow it, up to the end of the file or the next
    /// info record.
    ///
    /// The block is usually `application/warc-fields` holding information about the tool that
    /// wrote the file. Its [`WARC-Filename`](crate::FieldKind::Filename) field names the file
    /// containing it.
    Info,
    /// `response`: a complete scheme-specific response to some request.
    ///
    /// For http and https [target URIs](crate::FieldKind::TargetURI) the block is the full HTTP
    /// response as received over the network, status line and headers included.
    Response,
    /// `resource`: a resource without full protocol response information.
    Resource,
    /// `request`: a complete scheme-specific request.
    Request,
    /// `metadata`: content created to further describe, explain or accompany a resource.
    Metadata,
    /// `revisit`: revisitation of content that was already archived.
    ///
    /// Revisits stand in for a [response](crate::RecordKind::Response) whose content duplicates
    /// an earlier capture. They *shall* have a [`WARC-Profile`](crate::FieldKind::Profile)
    /// describing how to interpret them; the identical-payload-digest profile declares that the
    /// payload digest matches the record named by [`WARC-Refers-To`](crate::FieldKind::RefersTo).
    Revisit,
    /// `conversion`: an alternative version of another record's content.
    Conversion,
    /// `continuation`: additional data to be appended to a prior block.
    Continuation,
}

include!(concat!(env!("OUT_DIR"), "/record_kind_conversions.rs"));

impl<S: AsRef<str>> PartialEq<S> for RecordKind {
    fn eq(&self, other: &S) -> bool {
        self.as_uncased().eq(other.as_ref())
    }
}

impl Eq for RecordKind {}
