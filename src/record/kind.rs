use uncased::AsUncased;

/// The type of a single WARC record.
///
/// Every record carries its type in the `WARC-Type` field. This enumeration
/// provides variants for the types specified in the WARC standard and allows
/// representation of others as might be used by extensions to the core WARC
/// format or future versions; the extra-field decoding path dispatches on it
/// exhaustively.
///
/// A `RecordType` can be parsed from a string using the
/// [`From<str>`](#impl-From<S>) impl and retrieved as a string via
/// [`AsRef<str>`](#impl-AsRef<str>). Parsed values are case-insensitive and
/// normalize to the standard capitalization, but [unknown](RecordType::Other)
/// values preserve case when parsed.
///
/// ```
/// # use warckit::RecordType;
/// let parsed = RecordType::from("Response");
///
/// assert_eq!(parsed, RecordType::Response);
/// assert_eq!(parsed, "response");
/// assert_eq!(parsed.as_ref(), "response");
/// ```
#[derive(Debug, Clone)]
pub enum RecordType {
    /// `warcinfo`: describes the records that follow this one.
    ///
    /// The record block holds additional colon-delimited fields describing the
    /// capture (operator, software, robots policy and so on); see
    /// [`WarcInfoRecord`](crate::WarcInfoRecord).
    Warcinfo,
    /// `response`: a complete scheme-specific response to some request.
    Response,
    /// `resource`: a resource without full protocol response information.
    Resource,
    /// `request`: a complete scheme-specific request.
    Request,
    /// `metadata`: content created to further describe, explain or accompany a
    /// resource.
    ///
    /// The record block holds additional colon-delimited fields (`via`,
    /// `hopsFromSeed`, `fetchTimeMs`); see
    /// [`MetadataRecord`](crate::MetadataRecord).
    Metadata,
    /// `revisit`: revisitation of content that was already archived.
    Revisit,
    /// `conversion`: an alternative version of another record's content.
    Conversion,
    /// `continuation`: additional data to be appended to a prior block.
    Continuation,
    /// Any unrecognized record type.
    ///
    /// Software *shall* skip records of unknown type, which may be defined in
    /// future versions of the file format; the payload of such records is left
    /// opaque.
    Other(Box<str>),
}

impl AsRef<str> for RecordType {
    fn as_ref(&self) -> &str {
        use RecordType::*;
        match self {
            Warcinfo => "warcinfo",
            Response => "response",
            Resource => "resource",
            Request => "request",
            Metadata => "metadata",
            Revisit => "revisit",
            Conversion => "conversion",
            Continuation => "continuation",
            Other(s) => s,
        }
    }
}

impl<S: AsRef<str> + Into<Box<str>>> From<S> for RecordType {
    fn from(s: S) -> Self {
        let value = s.as_ref().as_uncased();
        if value == "warcinfo" {
            RecordType::Warcinfo
        } else if value == "response" {
            RecordType::Response
        } else if value == "resource" {
            RecordType::Resource
        } else if value == "request" {
            RecordType::Request
        } else if value == "metadata" {
            RecordType::Metadata
        } else if value == "revisit" {
            RecordType::Revisit
        } else if value == "conversion" {
            RecordType::Conversion
        } else if value == "continuation" {
            RecordType::Continuation
        } else {
            RecordType::Other(s.into())
        }
    }
}

impl<T: AsRef<str>> PartialEq<T> for RecordType {
    fn eq(&self, other: &T) -> bool {
        self.as_uncased().eq(other.as_ref())
    }
}

impl Eq for RecordType {}

/// The reason a record's content block holds a truncated version of the
/// original resource.
///
/// Reasons a writer may specify when truncating a record are non-exhaustively
/// enumerated by the standard; others are preserved as
/// [`Other`](TruncatedReason::Other).
#[derive(Debug, Clone)]
pub enum TruncatedReason {
    /// `length`: the record is too large.
    Length,
    /// `time`: the record took too long to capture.
    Time,
    /// `disconnect`: the resource was disconnected from a network.
    Disconnect,
    /// `unspecified`: some other or unknown reason.
    Unspecified,
    /// A reason outside the set suggested by the standard.
    Other(Box<str>),
}

impl AsRef<str> for TruncatedReason {
    fn as_ref(&self) -> &str {
        use TruncatedReason::*;
        match self {
            Length => "length",
            Time => "time",
            Disconnect => "disconnect",
            Unspecified => "unspecified",
            Other(s) => s,
        }
    }
}

impl<S: AsRef<str> + Into<Box<str>>> From<S> for TruncatedReason {
    fn from(s: S) -> Self {
        let value = s.as_ref().as_uncased();
        if value == "length" {
            TruncatedReason::Length
        } else if value == "time" {
            TruncatedReason::Time
        } else if value == "disconnect" {
            TruncatedReason::Disconnect
        } else if value == "unspecified" {
            TruncatedReason::Unspecified
        } else {
            TruncatedReason::Other(s.into())
        }
    }
}

impl<T: AsRef<str>> PartialEq<T> for TruncatedReason {
    fn eq(&self, other: &T) -> bool {
        self.as_uncased().eq(other.as_ref())
    }
}

impl Eq for TruncatedReason {}
