//! The declarative field-mapping engine.
//!
//! Every record shape in this crate (the WARC envelope, the warcinfo and
//! metadata extra-field blocks, and CDX rows) is described by a static table
//! of [`FieldDescriptor`]s. The tables bind a logical field to its wire key,
//! presence contract, and value kind, and the engine walks them in declaration
//! order so encoded output is byte-for-byte reproducible. The tables are
//! read-only and shared freely between threads.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use indexmap::map::IndexMap;
use std::fmt;
use uncased::{Uncased, UncasedStr};

use crate::Error;

/// The delimiter joining (and splitting) list-valued fields.
pub(crate) const LIST_DELIMITER: &str = ", ";

/// Decoded header fields, keyed case-insensitively by wire key.
///
/// An IndexMap preserves the read order of fields; std::collections::HashMap
/// randomizes ordering.
pub(crate) type FieldMap = IndexMap<Uncased<'static>, String>;

/// The wire representation of a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimeProfile {
    /// RFC 3339 / W3C ISO 8601 profile, `YYYY-MM-DDThh:mm:ssZ`. Used by WARC headers.
    Rfc3339,
    /// Compact `yyyyMMddHHmmss` UTC timestamps. Used by CDX columns.
    CdxTimestamp,
}

impl TimeProfile {
    pub(crate) fn format(self, value: &DateTime<Utc>) -> String {
        match self {
            TimeProfile::Rfc3339 => value.to_rfc3339_opts(SecondsFormat::Secs, true),
            TimeProfile::CdxTimestamp => value.format("%Y%m%d%H%M%S").to_string(),
        }
    }

    pub(crate) fn parse(self, raw: &str) -> Option<DateTime<Utc>> {
        match self {
            TimeProfile::Rfc3339 => DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|parsed| parsed.with_timezone(&Utc)),
            TimeProfile::CdxTimestamp => NaiveDateTime::parse_from_str(raw, "%Y%m%d%H%M%S")
                .ok()
                .map(|naive| Utc.from_utc_datetime(&naive)),
        }
    }
}

/// The kind of value a field holds, selecting its wire conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ValueKind {
    Str,
    Int,
    Uint,
    Time,
    List,
}

/// A typed field value in transit between a record and its wire form.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FieldValue {
    Str(String),
    Int(i64),
    Uint(u64),
    Time(Option<DateTime<Utc>>),
    List(Vec<String>),
}

impl FieldValue {
    /// Whether this value is the zero value of its kind.
    ///
    /// Empty values are skipped by `omit_empty` descriptors on encode and map
    /// to the `-` sentinel in CDX rows.
    pub(crate) fn is_empty(&self) -> bool {
        match self {
            FieldValue::Str(s) => s.is_empty(),
            FieldValue::Int(n) => *n == 0,
            FieldValue::Uint(n) => *n == 0,
            FieldValue::Time(t) => t.is_none(),
            FieldValue::List(items) => items.is_empty(),
        }
    }

    pub(crate) fn take_str(self) -> String {
        match self {
            FieldValue::Str(s) => s,
            _ => String::new(),
        }
    }

    pub(crate) fn take_int(self) -> i64 {
        match self {
            FieldValue::Int(n) => n,
            _ => 0,
        }
    }

    pub(crate) fn take_uint(self) -> u64 {
        match self {
            FieldValue::Uint(n) => n,
            _ => 0,
        }
    }

    pub(crate) fn take_time(self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Time(t) => t,
            _ => None,
        }
    }

    pub(crate) fn take_list(self) -> Vec<String> {
        match self {
            FieldValue::List(items) => items,
            _ => Vec::new(),
        }
    }
}

/// Static metadata binding one logical field of `T` to its wire form.
pub(crate) struct FieldDescriptor<T> {
    /// Logical field name, used to diagnose conversion failures.
    pub name: &'static str,
    /// The key as it appears on the wire.
    pub key: &'static str,
    /// Whether the field must be present and non-empty.
    pub required: bool,
    /// Whether an empty value suppresses the field on encode.
    pub omit_empty: bool,
    /// The wire conversion applied to the value.
    pub kind: ValueKind,
    pub get: fn(&T) -> FieldValue,
    pub set: fn(&mut T, FieldValue),
}

impl<T> fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("required", &self.required)
            .field("omit_empty", &self.omit_empty)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Render a value in its wire form.
///
/// Returns `Err` with the offending element if a list element contains the
/// list delimiter: such a value cannot survive a round trip, so it is rejected
/// rather than escaped.
pub(crate) fn render_value(value: &FieldValue, profile: TimeProfile) -> Result<String, String> {
    Ok(match value {
        FieldValue::Str(s) => s.clone(),
        FieldValue::Int(n) => n.to_string(),
        FieldValue::Uint(n) => n.to_string(),
        FieldValue::Time(None) => String::new(),
        FieldValue::Time(Some(t)) => profile.format(t),
        FieldValue::List(items) => {
            if let Some(bad) = items.iter().find(|item| item.contains(LIST_DELIMITER)) {
                return Err(bad.clone());
            }
            items.join(LIST_DELIMITER)
        }
    })
}

/// Convert a raw wire string to a typed value, or `None` if conversion fails.
pub(crate) fn parse_value(kind: ValueKind, raw: &str, profile: TimeProfile) -> Option<FieldValue> {
    Some(match kind {
        ValueKind::Str => FieldValue::Str(raw.to_owned()),
        ValueKind::Int => FieldValue::Int(raw.parse().ok()?),
        ValueKind::Uint => FieldValue::Uint(raw.parse().ok()?),
        ValueKind::Time => FieldValue::Time(Some(profile.parse(raw)?)),
        ValueKind::List => {
            if raw.is_empty() {
                FieldValue::List(Vec::new())
            } else {
                FieldValue::List(raw.split(LIST_DELIMITER).map(str::to_owned).collect())
            }
        }
    })
}

/// Render a record's fields as `(wire key, value)` pairs in descriptor order.
///
/// Empty values are skipped when the descriptor says to omit them, and fail
/// with [`MissingRequiredField`](Error::MissingRequiredField) when the
/// descriptor requires them.
pub(crate) fn encode_fields<T>(
    record: &T,
    table: &[FieldDescriptor<T>],
    profile: TimeProfile,
) -> Result<Vec<(&'static str, String)>, Error> {
    let mut rendered = Vec::with_capacity(table.len());
    for descriptor in table {
        let value = (descriptor.get)(record);
        if value.is_empty() {
            if descriptor.required {
                return Err(Error::MissingRequiredField(descriptor.key));
            }
            if descriptor.omit_empty {
                continue;
            }
        }
        let formatted = render_value(&value, profile).map_err(|bad| Error::InvalidFieldValue {
            field: descriptor.name,
            value: bad,
        })?;
        rendered.push((descriptor.key, formatted));
    }
    Ok(rendered)
}

/// Populate a record's fields from a decoded key-value map.
///
/// Absent optional fields keep their zero value. Absent required fields fail
/// when `enforce_required` is set (decoding a bare extra-field block inside a
/// payload does not enforce presence; the full-header path does). Values that
/// do not convert to the descriptor's kind always fail: silently zero-filling
/// a malformed number would mask bad input.
pub(crate) fn apply_fields<T>(
    record: &mut T,
    table: &[FieldDescriptor<T>],
    profile: TimeProfile,
    map: &FieldMap,
    enforce_required: bool,
) -> Result<(), Error> {
    for descriptor in table {
        let raw = match map.get(UncasedStr::new(descriptor.key)) {
            Some(raw) => raw,
            None => {
                if descriptor.required && enforce_required {
                    return Err(Error::MissingRequiredField(descriptor.key));
                }
                continue;
            }
        };
        let value = parse_value(descriptor.kind, raw, profile).ok_or_else(|| {
            Error::InvalidFieldValue {
                field: descriptor.name,
                value: raw.clone(),
            }
        })?;
        (descriptor.set)(record, value);
    }
    Ok(())
}

/// Check that a record satisfies a presence contract.
///
/// With `require_all` unset this checks only descriptors marked required (the
/// envelope contract); with it set every descriptor must be non-empty (the
/// per-kind contracts of warcinfo and metadata records).
pub(crate) fn ensure_fields<T>(
    record: &T,
    table: &[FieldDescriptor<T>],
    require_all: bool,
) -> Result<(), Error> {
    for descriptor in table {
        if (descriptor.required || require_all) && (descriptor.get)(record).is_empty() {
            return Err(Error::MissingRequiredField(descriptor.key));
        }
    }
    Ok(())
}

/// Parse colon-delimited `key: value` lines into a field map.
///
/// In strict mode (record headers) a non-blank line without a colon fails with
/// [`InvalidHeaderLine`](Error::InvalidHeaderLine). In lenient mode (the
/// extra-field block embedded in warcinfo/metadata payloads) such lines are
/// skipped; this is the only place malformed input is ignored.
pub(crate) fn parse_field_lines<'a, I>(lines: I, lenient: bool) -> Result<FieldMap, Error>
where
    I: Iterator<Item = &'a str>,
{
    let mut map = FieldMap::default();
    for line in lines {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        match line.split_once(':') {
            Some((key, value)) => {
                map.insert(
                    Uncased::new(key.trim().to_owned()),
                    value.trim().to_owned(),
                );
            }
            None if lenient => continue,
            None => return Err(Error::InvalidHeaderLine(line.to_owned())),
        }
    }
    Ok(map)
}
