//! The generic WARC record envelope.

use std::io::Write;
use std::str;

use chrono::{DateTime, Utc};
use uncased::UncasedStr;

use crate::fields::{self, FieldDescriptor, FieldValue, TimeProfile, ValueKind};
use crate::version::Version;
use crate::Error;

pub use kind::{RecordType, TruncatedReason};

mod kind;

/// A single WARC record: the envelope header fields plus the content payload.
///
/// The identifier, date, and type fields are mandatory; the remaining fields
/// are optional and keep their zero value when absent. The record's content
/// length is not stored separately: it is always `content.len()`, recomputed
/// on encode and enforced on decode, so the two can never disagree.
///
/// ```
/// # use warckit::{Record, RecordType};
/// let chunk = b"WARC/1.0\r\n\
/// WARC-Type: response\r\n\
/// WARC-Date: 2024-01-01T10:00:00Z\r\n\
/// WARC-Record-ID: <urn:uuid:abc>\r\n\
/// Content-Length: 13\r\n\
/// Content-Type: text/plain\r\n\
/// \r\n\
/// Hello, World!";
///
/// let record = Record::decode(chunk).unwrap();
/// assert_eq!(record.warc_type, RecordType::Response);
/// assert_eq!(record.record_id, "<urn:uuid:abc>");
/// assert_eq!(record.content_type, "text/plain");
/// assert_eq!(record.content, b"Hello, World!");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// The WARC revision this record conforms to.
    pub version: Version,
    /// `WARC-Record-ID`: a globally unique identifier for the record.
    pub record_id: String,
    /// `WARC-Date`: the instant that record data capture began.
    ///
    /// `None` only while a record is under construction; a successfully
    /// decoded record always has a date.
    pub date: Option<DateTime<Utc>>,
    /// `WARC-Type`: the type of the record.
    pub warc_type: RecordType,
    /// `Content-Type`: the MIME type of the content block.
    pub content_type: String,
    /// `WARC-Concurrent-To`: IDs of records created as part of the same
    /// capture event.
    pub concurrent_to: Vec<String>,
    /// `WARC-Block-Digest`: a labelled digest of the complete content block.
    pub block_digest: String,
    /// `WARC-Payload-Digest`: a labelled digest of the record's payload.
    pub payload_digest: String,
    /// `WARC-IP-Address`: the IP address contacted to retrieve record content.
    pub ip_address: String,
    /// `WARC-Refers-To`: the ID of the record this record holds additional
    /// content for.
    pub refers_to: String,
    /// `WARC-Refers-To-Target-URI`: the target URI of the referenced record.
    pub refers_to_target_uri: String,
    /// `WARC-Refers-To-Date`: the date of the referenced record.
    pub refers_to_date: Option<DateTime<Utc>>,
    /// `WARC-Target-URI`: the original URI that provided the record content.
    pub target_uri: String,
    /// `WARC-Truncated`: why the content block was truncated, if it was.
    pub truncated: Option<TruncatedReason>,
    /// `WARC-Warcinfo-ID`: the ID of the warcinfo record describing this
    /// record's capture.
    pub warcinfo_id: String,
    /// `WARC-Filename`: the name of the file containing the current warcinfo
    /// record.
    pub filename: String,
    /// `WARC-Profile`: the kind of analysis and handling applied to create a
    /// revisit record.
    pub profile: String,
    /// `WARC-Identified-Payload-Type`: the content type discovered by
    /// inspecting the payload.
    pub identified_payload_type: String,
    /// `WARC-Segment-Number`: this record's ordering in a sequence of
    /// segmented records (0 when unsegmented).
    pub segment_number: u64,
    /// `WARC-Segment-Origin-ID`: the ID of the starting record in a series of
    /// segmented records.
    pub segment_origin_id: String,
    /// `WARC-Segment-Total-Length`: the total length of concatenated segmented
    /// content blocks (0 when unsegmented).
    pub segment_total_length: u64,
    /// The content block: exactly `content_length()` bytes.
    pub content: Vec<u8>,
}

/// The envelope descriptor table, in emission order.
///
/// `Content-Length` is deliberately absent: its value is derived from the
/// payload rather than mapped from a stored field.
static ENVELOPE_FIELDS: [FieldDescriptor<Record>; 20] = [
    FieldDescriptor {
        name: "record_id",
        key: "WARC-Record-ID",
        required: true,
        omit_empty: false,
        kind: ValueKind::Str,
        get: |r| FieldValue::Str(r.record_id.clone()),
        set: |r, v| r.record_id = v.take_str(),
    },
    FieldDescriptor {
        name: "date",
        key: "WARC-Date",
        required: true,
        omit_empty: false,
        kind: ValueKind::Time,
        get: |r| FieldValue::Time(r.date),
        set: |r, v| r.date = v.take_time(),
    },
    FieldDescriptor {
        name: "warc_type",
        key: "WARC-Type",
        required: true,
        omit_empty: false,
        kind: ValueKind::Str,
        get: |r| FieldValue::Str(r.warc_type.as_ref().to_owned()),
        set: |r, v| r.warc_type = RecordType::from(v.take_str()),
    },
    FieldDescriptor {
        name: "content_type",
        key: "Content-Type",
        required: false,
        omit_empty: true,
        kind: ValueKind::Str,
        get: |r| FieldValue::Str(r.content_type.clone()),
        set: |r, v| r.content_type = v.take_str(),
    },
    FieldDescriptor {
        name: "concurrent_to",
        key: "WARC-Concurrent-To",
        required: false,
        omit_empty: true,
        kind: ValueKind::List,
        get: |r| FieldValue::List(r.concurrent_to.clone()),
        set: |r, v| r.concurrent_to = v.take_list(),
    },
    FieldDescriptor {
        name: "block_digest",
        key: "WARC-Block-Digest",
        required: false,
        omit_empty: true,
        kind: ValueKind::Str,
        get: |r| FieldValue::Str(r.block_digest.clone()),
        set: |r, v| r.block_digest = v.take_str(),
    },
    FieldDescriptor {
        name: "payload_digest",
        key: "WARC-Payload-Digest",
        required: false,
        omit_empty: true,
        kind: ValueKind::Str,
        get: |r| FieldValue::Str(r.payload_digest.clone()),
        set: |r, v| r.payload_digest = v.take_str(),
    },
    FieldDescriptor {
        name: "ip_address",
        key: "WARC-IP-Address",
        required: false,
        omit_empty: true,
        kind: ValueKind::Str,
        get: |r| FieldValue::Str(r.ip_address.clone()),
        set: |r, v| r.ip_address = v.take_str(),
    },
    FieldDescriptor {
        name: "refers_to",
        key: "WARC-Refers-To",
        required: false,
        omit_empty: true,
        kind: ValueKind::Str,
        get: |r| FieldValue::Str(r.refers_to.clone()),
        set: |r, v| r.refers_to = v.take_str(),
    },
    FieldDescriptor {
        name: "refers_to_target_uri",
        key: "WARC-Refers-To-Target-URI",
        required: false,
        omit_empty: true,
        kind: ValueKind::Str,
        get: |r| FieldValue::Str(r.refers_to_target_uri.clone()),
        set: |r, v| r.refers_to_target_uri = v.take_str(),
    },
    FieldDescriptor {
        name: "refers_to_date",
        key: "WARC-Refers-To-Date",
        required: false,
        omit_empty: true,
        kind: ValueKind::Time,
        get: |r| FieldValue::Time(r.refers_to_date),
        set: |r, v| r.refers_to_date = v.take_time(),
    },
    FieldDescriptor {
        name: "target_uri",
        key: "WARC-Target-URI",
        required: false,
        omit_empty: true,
        kind: ValueKind::Str,
        get: |r| FieldValue::Str(r.target_uri.clone()),
        set: |r, v| r.target_uri = v.take_str(),
    },
    FieldDescriptor {
        name: "truncated",
        key: "WARC-Truncated",
        required: false,
        omit_empty: true,
        kind: ValueKind::Str,
        get: |r| {
            FieldValue::Str(
                r.truncated
                    .as_ref()
                    .map(|reason| reason.as_ref().to_owned())
                    .unwrap_or_default(),
            )
        },
        set: |r, v| {
            let raw = v.take_str();
            r.truncated = if raw.is_empty() {
                None
            } else {
                Some(TruncatedReason::from(raw))
            };
        },
    },
    FieldDescriptor {
        name: "warcinfo_id",
        key: "WARC-Warcinfo-ID",
        required: false,
        omit_empty: true,
        kind: ValueKind::Str,
        get: |r| FieldValue::Str(r.warcinfo_id.clone()),
        set: |r, v| r.warcinfo_id = v.take_str(),
    },
    FieldDescriptor {
        name: "filename",
        key: "WARC-Filename",
        required: false,
        omit_empty: true,
        kind: ValueKind::Str,
        get: |r| FieldValue::Str(r.filename.clone()),
        set: |r, v| r.filename = v.take_str(),
    },
    FieldDescriptor {
        name: "profile",
        key: "WARC-Profile",
        required: false,
        omit_empty: true,
        kind: ValueKind::Str,
        get: |r| FieldValue::Str(r.profile.clone()),
        set: |r, v| r.profile = v.take_str(),
    },
    FieldDescriptor {
        name: "identified_payload_type",
        key: "WARC-Identified-Payload-Type",
        required: false,
        omit_empty: true,
        kind: ValueKind::Str,
        get: |r| FieldValue::Str(r.identified_payload_type.clone()),
        set: |r, v| r.identified_payload_type = v.take_str(),
    },
    FieldDescriptor {
        name: "segment_number",
        key: "WARC-Segment-Number",
        required: false,
        omit_empty: true,
        kind: ValueKind::Uint,
        get: |r| FieldValue::Uint(r.segment_number),
        set: |r, v| r.segment_number = v.take_uint(),
    },
    FieldDescriptor {
        name: "segment_origin_id",
        key: "WARC-Segment-Origin-ID",
        required: false,
        omit_empty: true,
        kind: ValueKind::Str,
        get: |r| FieldValue::Str(r.segment_origin_id.clone()),
        set: |r, v| r.segment_origin_id = v.take_str(),
    },
    FieldDescriptor {
        name: "segment_total_length",
        key: "WARC-Segment-Total-Length",
        required: false,
        omit_empty: true,
        kind: ValueKind::Uint,
        get: |r| FieldValue::Uint(r.segment_total_length),
        set: |r, v| r.segment_total_length = v.take_uint(),
    },
];

impl Record {
    /// Create an empty record of the given version.
    ///
    /// The mandatory fields start empty; [`encode`](Self::encode) and
    /// [`validate`](Self::validate) will fail until they are populated.
    pub fn new(version: Version) -> Record {
        Record {
            version,
            record_id: String::new(),
            date: None,
            warc_type: RecordType::Other("".into()),
            content_type: String::new(),
            concurrent_to: Vec::new(),
            block_digest: String::new(),
            payload_digest: String::new(),
            ip_address: String::new(),
            refers_to: String::new(),
            refers_to_target_uri: String::new(),
            refers_to_date: None,
            target_uri: String::new(),
            truncated: None,
            warcinfo_id: String::new(),
            filename: String::new(),
            profile: String::new(),
            identified_payload_type: String::new(),
            segment_number: 0,
            segment_origin_id: String::new(),
            segment_total_length: 0,
            content: Vec::new(),
        }
    }

    /// The length of the content block in bytes.
    pub fn content_length(&self) -> u64 {
        self.content.len() as u64
    }

    /// Decode one record from a byte chunk.
    ///
    /// The chunk must start with the version line; the header block extends to
    /// the first blank line and the payload is exactly the declared number of
    /// bytes after it. Bytes beyond the payload (such as the record tail) are
    /// ignored. Unrecognized header keys are skipped per the WARC standard,
    /// and keys are matched case-insensitively. Header lines may be terminated
    /// with either CRLF or a bare LF.
    pub fn decode(chunk: &[u8]) -> Result<Record, Error> {
        let (version, rest) = split_version_line(chunk)?;
        let (header, body) = split_header_block(rest)?;
        let text = str::from_utf8(header)
            .map_err(|_| Error::InvalidHeaderLine(String::from_utf8_lossy(header).into_owned()))?;
        let map = fields::parse_field_lines(text.split('\n'), false)?;

        let declared = match map.get(UncasedStr::new("Content-Length")) {
            None => return Err(Error::MissingRequiredField("Content-Length")),
            Some(raw) => raw.parse::<u64>().map_err(|_| Error::InvalidFieldValue {
                field: "content_length",
                value: raw.clone(),
            })?,
        };
        if (body.len() as u64) < declared {
            return Err(Error::ContentLengthMismatch {
                declared,
                available: body.len() as u64,
            });
        }

        let mut record = Record::new(version);
        fields::apply_fields(&mut record, &ENVELOPE_FIELDS, TimeProfile::Rfc3339, &map, true)?;
        record.content = body[..declared as usize].to_vec();
        Ok(record)
    }

    /// Write the record to the given output stream.
    ///
    /// Fields are emitted in descriptor order, so output for a given record is
    /// deterministic. `Content-Length` is recomputed from the payload and
    /// emitted last, followed by the blank line, the payload, and the record
    /// tail (two CRLFs).
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<(), Error> {
        self.write_with_payload(out, &self.content)
    }

    /// Encode the record to an owned buffer. See [`write_to`](Self::write_to).
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    /// Check that all mandatory envelope fields are present.
    ///
    /// Decoding performs this check automatically; use this before encoding a
    /// hand-constructed record to get the same diagnostics without rendering.
    pub fn validate(&self) -> Result<(), Error> {
        fields::ensure_fields(self, &ENVELOPE_FIELDS, false)
    }

    /// Write the envelope headers with an explicit payload.
    ///
    /// Shared with the specialized record types, whose payload includes their
    /// extra-field block; `Content-Length` is always computed from `payload`.
    pub(crate) fn write_with_payload<W: Write>(
        &self,
        out: &mut W,
        payload: &[u8],
    ) -> Result<(), Error> {
        let rendered = fields::encode_fields(self, &ENVELOPE_FIELDS, TimeProfile::Rfc3339)?;

        write!(out, "WARC/{}\r\n", self.version)?;
        for (key, value) in &rendered {
            write!(out, "{}: {}\r\n", key, value)?;
        }
        write!(out, "Content-Length: {}\r\n\r\n", payload.len())?;
        out.write_all(payload)?;
        out.write_all(b"\r\n\r\n")?;
        Ok(())
    }
}

/// Split the `WARC/m.n` version line off the front of a chunk.
fn split_version_line(chunk: &[u8]) -> Result<(Version, &[u8]), Error> {
    let line_end = match chunk.iter().position(|&b| b == b'\n') {
        Some(i) => i,
        None => {
            let prefix = &chunk[..chunk.len().min(16)];
            return Err(Error::UnsupportedVersion(
                String::from_utf8_lossy(prefix).into_owned(),
            ));
        }
    };
    let line = str::from_utf8(&chunk[..line_end]).map_err(|_| {
        Error::UnsupportedVersion(String::from_utf8_lossy(&chunk[..line_end]).into_owned())
    })?;
    let version = Version::parse(line.trim_end_matches('\r'))?;
    Ok((version, &chunk[line_end + 1..]))
}

/// Split a chunk (version line already removed) into the header block and the
/// body at the first blank line.
fn split_header_block(bytes: &[u8]) -> Result<(&[u8], &[u8]), Error> {
    let mut pos = 0;
    loop {
        let line_end = match bytes[pos..].iter().position(|&b| b == b'\n') {
            Some(i) => pos + i,
            None => {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "record header is not terminated by a blank line",
                )))
            }
        };
        let mut line = &bytes[pos..line_end];
        if let [rest @ .., b'\r'] = line {
            line = rest;
        }
        if line.is_empty() {
            return Ok((&bytes[..pos], &bytes[line_end + 1..]));
        }
        pos = line_end + 1;
    }
}
