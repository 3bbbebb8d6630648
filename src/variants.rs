//! Specialized record types and the type dispatcher.
//!
//! `warcinfo` and `metadata` records carry additional colon-delimited fields
//! *inside* their content payload rather than as top-level headers. The types
//! here pair a generic [`Record`] envelope with those decoded extras, and
//! [`AnyRecord`] dispatches a raw chunk to the right one.

use std::io::Write;

use uncased::UncasedStr;

use crate::fields::{self, FieldDescriptor, FieldValue, TimeProfile, ValueKind};
use crate::record::{Record, RecordType};
use crate::version::Version;
use crate::Error;

/// A `warcinfo` record: metadata about the WARC file itself.
///
/// The extra fields describe the capture that produced the file. On encode
/// they are rendered as `key: value` lines appended to the envelope's content
/// and counted in `Content-Length`; on decode the whole payload is re-parsed
/// leniently and the recognized lines are removed from `record.content`, so
/// re-encoding a decoded record does not duplicate them. Payload text that is
/// not a recognized extra field stays in `record.content` untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct WarcInfoRecord {
    /// The generic envelope. Its type is `warcinfo`.
    pub record: Record,
    /// Contact information for the WARC creator.
    pub operator: String,
    /// The software used to create the WARC.
    pub software: String,
    /// The robots policy followed during crawling.
    pub robots: String,
    /// The machine that created the WARC.
    pub hostname: String,
    /// The IP address of the machine that created the WARC.
    pub ip: String,
    /// The HTTP user-agent header used during crawling.
    pub user_agent: String,
    /// The HTTP from header used during crawling.
    pub from: String,
}

static WARCINFO_FIELDS: [FieldDescriptor<WarcInfoRecord>; 7] = [
    FieldDescriptor {
        name: "operator",
        key: "operator",
        required: false,
        omit_empty: true,
        kind: ValueKind::Str,
        get: |r| FieldValue::Str(r.operator.clone()),
        set: |r, v| r.operator = v.take_str(),
    },
    FieldDescriptor {
        name: "software",
        key: "software",
        required: false,
        omit_empty: true,
        kind: ValueKind::Str,
        get: |r| FieldValue::Str(r.software.clone()),
        set: |r, v| r.software = v.take_str(),
    },
    FieldDescriptor {
        name: "robots",
        key: "robots",
        required: false,
        omit_empty: true,
        kind: ValueKind::Str,
        get: |r| FieldValue::Str(r.robots.clone()),
        set: |r, v| r.robots = v.take_str(),
    },
    FieldDescriptor {
        name: "hostname",
        key: "hostname",
        required: false,
        omit_empty: true,
        kind: ValueKind::Str,
        get: |r| FieldValue::Str(r.hostname.clone()),
        set: |r, v| r.hostname = v.take_str(),
    },
    FieldDescriptor {
        name: "ip",
        key: "ip",
        required: false,
        omit_empty: true,
        kind: ValueKind::Str,
        get: |r| FieldValue::Str(r.ip.clone()),
        set: |r, v| r.ip = v.take_str(),
    },
    FieldDescriptor {
        name: "user_agent",
        key: "http-header-user-agent",
        required: false,
        omit_empty: true,
        kind: ValueKind::Str,
        get: |r| FieldValue::Str(r.user_agent.clone()),
        set: |r, v| r.user_agent = v.take_str(),
    },
    FieldDescriptor {
        name: "from",
        key: "http-header-from",
        required: false,
        omit_empty: true,
        kind: ValueKind::Str,
        get: |r| FieldValue::Str(r.from.clone()),
        set: |r, v| r.from = v.take_str(),
    },
];

impl WarcInfoRecord {
    /// Create an empty warcinfo record of the given version.
    pub fn new(version: Version) -> WarcInfoRecord {
        let mut record = Record::new(version);
        record.warc_type = RecordType::Warcinfo;
        WarcInfoRecord {
            record,
            operator: String::new(),
            software: String::new(),
            robots: String::new(),
            hostname: String::new(),
            ip: String::new(),
            user_agent: String::new(),
            from: String::new(),
        }
    }

    /// Decode a warcinfo record, including the extra fields in its payload.
    pub fn decode(chunk: &[u8]) -> Result<WarcInfoRecord, Error> {
        Self::from_record(Record::decode(chunk)?)
    }

    pub(crate) fn from_record(record: Record) -> Result<WarcInfoRecord, Error> {
        let text = String::from_utf8_lossy(&record.content).into_owned();
        let mut decoded = WarcInfoRecord {
            record,
            operator: String::new(),
            software: String::new(),
            robots: String::new(),
            hostname: String::new(),
            ip: String::new(),
            user_agent: String::new(),
            from: String::new(),
        };
        let map = fields::parse_field_lines(text.split('\n'), true)?;
        fields::apply_fields(
            &mut decoded,
            &WARCINFO_FIELDS,
            TimeProfile::Rfc3339,
            &map,
            false,
        )?;
        decoded.record.content = strip_extra_lines(&text, &WARCINFO_FIELDS);
        Ok(decoded)
    }

    /// Write the record, appending the extra-field block to the payload.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<(), Error> {
        let payload = render_payload(
            &self.record.content,
            fields::encode_fields(self, &WARCINFO_FIELDS, TimeProfile::Rfc3339)?,
        );
        self.record.write_with_payload(out, &payload)
    }

    /// Encode the record to an owned buffer. See [`write_to`](Self::write_to).
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    /// Check the full warcinfo contract: the envelope's mandatory fields plus
    /// every extra field.
    pub fn validate(&self) -> Result<(), Error> {
        self.record.validate()?;
        fields::ensure_fields(self, &WARCINFO_FIELDS, true)
    }
}

/// A `metadata` record: additional information about another record.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataRecord {
    /// The generic envelope. Its type is `metadata`.
    pub record: Record,
    /// The URI where the archived URI was discovered.
    pub via: String,
    /// The type of each hop from the seed URI to the current URI.
    pub hops_from_seed: String,
    /// The time taken to collect the archived URI, in milliseconds.
    pub fetch_time_ms: u64,
}

static METADATA_FIELDS: [FieldDescriptor<MetadataRecord>; 3] = [
    FieldDescriptor {
        name: "via",
        key: "via",
        required: false,
        omit_empty: true,
        kind: ValueKind::Str,
        get: |r| FieldValue::Str(r.via.clone()),
        set: |r, v| r.via = v.take_str(),
    },
    FieldDescriptor {
        name: "hops_from_seed",
        key: "hopsFromSeed",
        required: false,
        omit_empty: true,
        kind: ValueKind::Str,
        get: |r| FieldValue::Str(r.hops_from_seed.clone()),
        set: |r, v| r.hops_from_seed = v.take_str(),
    },
    FieldDescriptor {
        name: "fetch_time_ms",
        key: "fetchTimeMs",
        required: false,
        omit_empty: true,
        kind: ValueKind::Uint,
        get: |r| FieldValue::Uint(r.fetch_time_ms),
        set: |r, v| r.fetch_time_ms = v.take_uint(),
    },
];

impl MetadataRecord {
    /// Create an empty metadata record of the given version.
    pub fn new(version: Version) -> MetadataRecord {
        let mut record = Record::new(version);
        record.warc_type = RecordType::Metadata;
        MetadataRecord {
            record,
            via: String::new(),
            hops_from_seed: String::new(),
            fetch_time_ms: 0,
        }
    }

    /// Decode a metadata record, including the extra fields in its payload.
    pub fn decode(chunk: &[u8]) -> Result<MetadataRecord, Error> {
        Self::from_record(Record::decode(chunk)?)
    }

    pub(crate) fn from_record(record: Record) -> Result<MetadataRecord, Error> {
        let text = String::from_utf8_lossy(&record.content).into_owned();
        let mut decoded = MetadataRecord {
            record,
            via: String::new(),
            hops_from_seed: String::new(),
            fetch_time_ms: 0,
        };
        let map = fields::parse_field_lines(text.split('\n'), true)?;
        fields::apply_fields(
            &mut decoded,
            &METADATA_FIELDS,
            TimeProfile::Rfc3339,
            &map,
            false,
        )?;
        decoded.record.content = strip_extra_lines(&text, &METADATA_FIELDS);
        Ok(decoded)
    }

    /// Write the record, appending the extra-field block to the payload.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<(), Error> {
        let payload = render_payload(
            &self.record.content,
            fields::encode_fields(self, &METADATA_FIELDS, TimeProfile::Rfc3339)?,
        );
        self.record.write_with_payload(out, &payload)
    }

    /// Encode the record to an owned buffer. See [`write_to`](Self::write_to).
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    /// Check the full metadata contract: the envelope's mandatory fields plus
    /// every extra field.
    pub fn validate(&self) -> Result<(), Error> {
        self.record.validate()?;
        fields::ensure_fields(self, &METADATA_FIELDS, true)
    }
}

/// The extra-field block is appended to the caller's content *before* the
/// content length is computed, so the declared length always covers it.
///
/// A separator newline keeps the first extra field off the content's last
/// line; it stays attached to the content on decode.
fn render_payload(content: &[u8], extras: Vec<(&'static str, String)>) -> Vec<u8> {
    let mut payload = content.to_vec();
    if !extras.is_empty() && !payload.is_empty() && payload.last() != Some(&b'\n') {
        payload.push(b'\n');
    }
    for (key, value) in extras {
        payload.extend_from_slice(key.as_bytes());
        payload.extend_from_slice(b": ");
        payload.extend_from_slice(value.as_bytes());
        payload.push(b'\n');
    }
    payload
}

/// Remove the lines of a payload whose key matches a descriptor, keeping
/// everything else byte-for-byte. The removed lines live on as decoded fields
/// and are re-rendered on encode.
fn strip_extra_lines<T>(text: &str, table: &[FieldDescriptor<T>]) -> Vec<u8> {
    let mut kept = String::with_capacity(text.len());
    let mut rest = text;
    while !rest.is_empty() {
        let (line, tail) = match rest.find('\n') {
            Some(i) => rest.split_at(i + 1),
            None => (rest, ""),
        };
        rest = tail;
        let recognized = line
            .trim_end_matches(|c| c == '\n' || c == '\r')
            .split_once(':')
            .map(|(key, _)| {
                let key = UncasedStr::new(key.trim());
                table.iter().any(|descriptor| UncasedStr::new(descriptor.key) == key)
            })
            .unwrap_or(false);
        if !recognized {
            kept.push_str(line);
        }
    }
    kept.into_bytes()
}

/// A decoded record of any type.
///
/// This is the closed dispatch over the record types whose payloads receive
/// structural decoding. Records of every other type (standard or extension)
/// are [`Plain`](AnyRecord::Plain) with an opaque payload.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyRecord {
    /// A record whose payload is not structurally decoded.
    Plain(Record),
    /// A `warcinfo` record with decoded extra fields.
    WarcInfo(WarcInfoRecord),
    /// A `metadata` record with decoded extra fields.
    Metadata(MetadataRecord),
}

impl AnyRecord {
    /// Decode one record, dispatching on its `WARC-Type`.
    pub fn decode(chunk: &[u8]) -> Result<AnyRecord, Error> {
        let record = Record::decode(chunk)?;
        match record.warc_type {
            RecordType::Warcinfo => Ok(AnyRecord::WarcInfo(WarcInfoRecord::from_record(record)?)),
            RecordType::Metadata => Ok(AnyRecord::Metadata(MetadataRecord::from_record(record)?)),
            _ => Ok(AnyRecord::Plain(record)),
        }
    }

    /// The generic envelope of the record, whatever its type.
    pub fn record(&self) -> &Record {
        match self {
            AnyRecord::Plain(record) => record,
            AnyRecord::WarcInfo(info) => &info.record,
            AnyRecord::Metadata(metadata) => &metadata.record,
        }
    }

    /// The record's `WARC-Type`.
    pub fn warc_type(&self) -> &RecordType {
        &self.record().warc_type
    }

    /// Write the record to the given output stream.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<(), Error> {
        match self {
            AnyRecord::Plain(record) => record.write_to(out),
            AnyRecord::WarcInfo(info) => info.write_to(out),
            AnyRecord::Metadata(metadata) => metadata.write_to(out),
        }
    }

    /// Check the presence contract for the record's type.
    pub fn validate(&self) -> Result<(), Error> {
        match self {
            AnyRecord::Plain(record) => record.validate(),
            AnyRecord::WarcInfo(info) => info.validate(),
            AnyRecord::Metadata(metadata) => metadata.validate(),
        }
    }
}
