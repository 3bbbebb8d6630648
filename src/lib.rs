//! Tools for encoding and decoding WARC (Web ARChive) records and CDX indexes.
//!
//! ## Background
//!
//! WARC files are used to store digital resources and related information, generally for archival
//! storage. They are most commonly used to store the results of web crawls, wherein a crawler
//! requests resources from any desired web server(s) while storing the request that was sent for
//! each resource, the corresponding response, metadata for each and optionally other related
//! information. The WARC file format is formalized in an international standard, ISO 28500, which
//! to date has two published versions: ISO 28500:2009 (WARC 1.0) and ISO 28500:2017 (WARC 1.1);
//! see <https://iipc.github.io/warc-specifications/>.
//!
//! A WARC file is a simple concatenation of records. Each record has a format similar to an HTTP
//! message, consisting of a version declaration, a number of header fields, and exactly
//! `Content-Length` bytes of data:
//!
//! ```text
//! WARC/1.0
//! WARC-Type: response
//! WARC-Date: 2024-01-01T10:00:00Z
//! WARC-Record-ID: <urn:uuid:e061d11b-fb0a-4314-88c5-54e4870be701>
//! Content-Type: text/plain
//! Content-Length: 13
//!
//! Hello, World!
//! ```
//!
//! CDX files are the companion index format: a header line declaring an ordered list of
//! single-character column codes, followed by one whitespace-delimited row per indexed record.
//!
//! ## Library structure
//!
//! The [`Record`] type holds a fully decoded record: the envelope fields of the WARC header plus
//! the raw content payload. [`Record::decode`] parses one record from a byte chunk, and
//! [`Record::write_to`] performs the opposite operation. Records of type `warcinfo` and
//! `metadata` carry additional colon-delimited fields inside their payload; [`AnyRecord::decode`]
//! dispatches on the record type and decodes those as [`WarcInfoRecord`] or [`MetadataRecord`].
//!
//! A continuous byte source containing many records can be sliced into per-record chunks with
//! [`RecordStream`], which tracks each record's declared content length so payload bytes are
//! never mistaken for a record boundary.
//!
//! CDX files are read and written whole through [`cdx::CdxFile`].

#[macro_use]
extern crate log;

use thiserror::Error;

pub mod cdx;
mod fields;
pub mod reader;
pub mod record;
#[cfg(test)]
mod tests;
mod variants;
mod version;

pub use reader::{RecordStream, Records};
pub use record::{Record, RecordType, TruncatedReason};
pub use variants::{AnyRecord, MetadataRecord, WarcInfoRecord};
pub use version::Version;

/// Reasons encoding or decoding a record or index may fail.
///
/// All of these are structural: they abort the current record and no partial
/// or best-effort value is returned alongside them.
#[derive(Debug, Error)]
pub enum Error {
    /// The version line does not name a supported WARC revision.
    ///
    /// The contained value is a UTF-8 interpretation of the data that was attempted to be parsed.
    #[error("unsupported WARC version (near {0:?})")]
    UnsupportedVersion(String),
    /// A header line could not be split into a key and a value.
    #[error("header line is not a `key: value` pair: {0:?}")]
    InvalidHeaderLine(String),
    /// A field the record's kind requires is absent or empty.
    ///
    /// The contained value is the wire key of the offending field.
    #[error("required field {0} is missing or empty")]
    MissingRequiredField(&'static str),
    /// A field value could not be converted to the field's declared kind.
    #[error("field {field} has invalid value {value:?}")]
    InvalidFieldValue {
        /// Logical name of the offending field.
        field: &'static str,
        /// The raw value that failed to convert.
        value: String,
    },
    /// A CDX row does not have exactly as many fields as its format has columns.
    #[error("row has {actual} fields but the format declares {expected} columns")]
    FieldCountMismatch {
        /// Column count declared by the format.
        expected: usize,
        /// Fields actually present in the row.
        actual: usize,
    },
    /// A CDX column code has no descriptor.
    #[error("no column descriptor for code {0:?}")]
    UnknownField(char),
    /// A record declares more content bytes than the source can provide.
    #[error("record declares {declared} content bytes but only {available} are available")]
    ContentLengthMismatch {
        /// The Content-Length value from the record header.
        declared: u64,
        /// Bytes that could actually be read.
        available: u64,
    },
    /// An I/O error occurred while reading from or writing to the byte source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl std::cmp::PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        use Error::*;

        match (self, other) {
            (UnsupportedVersion(x), UnsupportedVersion(y)) => x == y,
            (InvalidHeaderLine(x), InvalidHeaderLine(y)) => x == y,
            (MissingRequiredField(x), MissingRequiredField(y)) => x == y,
            (
                InvalidFieldValue { field: f1, value: v1 },
                InvalidFieldValue { field: f2, value: v2 },
            ) => f1 == f2 && v1 == v2,
            (
                FieldCountMismatch { expected: e1, actual: a1 },
                FieldCountMismatch { expected: e2, actual: a2 },
            ) => e1 == e2 && a1 == a2,
            (UnknownField(x), UnknownField(y)) => x == y,
            (
                ContentLengthMismatch { declared: d1, available: v1 },
                ContentLengthMismatch { declared: d2, available: v2 },
            ) => d1 == d2 && v1 == v2,
            (Io(e1), Io(e2)) => e1.kind() == e2.kind(),
            (_, _) => false,
        }
    }
}
