//! Reading and writing CDX index files.
//!
//! A CDX file describes the contents of an archive, one row per record. The
//! first line declares the file's format: the literal token `CDX` followed by
//! an ordered list of single-character column codes. Every following row holds
//! one delimited value per declared column, with `-` standing in for a value
//! that is empty or unknown:
//!
//! ```text
//! CDX N b a m s k r V g
//! http://example.com/ 20010424210312 http://example.com/ text/html 200 ZMSA5TNJUKKRYAIM5PRUJLL24DV7QYOO - 12345 example.warc.gz
//! ```
//!
//! The column codes come from the Internet Archive's CDX file format; the full
//! set is enumerated on [`CdxField`], and the two formats in common use are
//! available as [`CdxFormat::cdx9`] and [`CdxFormat::cdx11`].

use std::fmt;
use std::io::{BufRead, Write};
use std::str;

use chrono::{DateTime, Utc};

use crate::fields::{self, FieldValue, TimeProfile, ValueKind};
use crate::Error;

/// A single-character CDX column code.
///
/// Codes are case-sensitive. The associated constants cover every code the
/// format defines; a `CdxField` holding any other character can be named in a
/// [`CdxFormat`] but fails with [`UnknownField`](Error::UnknownField) as soon
/// as a row is encoded or decoded against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CdxField(char);

impl CdxField {
    // URL group
    pub const CANONIZED_URL: CdxField = CdxField('A');
    pub const NEWS_GROUP: CdxField = CdxField('B');
    pub const RULESPACE_CATEGORY: CdxField = CdxField('C');
    pub const CANONIZED_FRAME: CdxField = CdxField('F');
    pub const CANONIZED_HOST: CdxField = CdxField('H');
    pub const CANONIZED_IMAGE: CdxField = CdxField('I');
    pub const CANONIZED_JUMP: CdxField = CdxField('J');
    pub const CANONIZED_LINK: CdxField = CdxField('L');
    pub const MASSAGED_URL: CdxField = CdxField('N');
    pub const CANONIZED_PATH: CdxField = CdxField('P');
    pub const CANONIZED_REDIRECT: CdxField = CdxField('R');
    pub const ORIGINAL_URL: CdxField = CdxField('a');
    pub const ORIGINAL_HOST: CdxField = CdxField('h');
    pub const ORIGINAL_PATH: CdxField = CdxField('p');

    // Metadata group
    pub const DATE: CdxField = CdxField('b');
    pub const IP: CdxField = CdxField('e');
    pub const LANGUAGE: CdxField = CdxField('Q');
    pub const PORT: CdxField = CdxField('o');
    pub const TITLE: CdxField = CdxField('t');
    pub const META_TAGS: CdxField = CdxField('M');

    // Checksum and size group
    pub const OLD_CHECKSUM: CdxField = CdxField('c');
    pub const NEW_CHECKSUM: CdxField = CdxField('k');
    pub const COMPRESSED_SIZE: CdxField = CdxField('S');
    pub const ARC_DOCUMENT_LENGTH: CdxField = CdxField('n');

    // Offset group
    pub const COMPRESSED_DAT_OFFSET: CdxField = CdxField('D');
    pub const UNCOMPRESSED_DAT_OFFSET: CdxField = CdxField('d');
    pub const COMPRESSED_ARC_OFFSET: CdxField = CdxField('V');
    pub const UNCOMPRESSED_ARC_OFFSET: CdxField = CdxField('v');

    // Resource reference group
    pub const FRAME: CdxField = CdxField('f');
    pub const IMAGE: CdxField = CdxField('i');
    pub const JUMP_POINT: CdxField = CdxField('j');
    pub const LINK: CdxField = CdxField('l');
    pub const URLS_IN_HREF: CdxField = CdxField('x');
    pub const URLS_IN_SRC: CdxField = CdxField('y');
    pub const URLS_IN_SCRIPT: CdxField = CdxField('z');

    // Response group
    pub const MIME_TYPE: CdxField = CdxField('m');
    pub const STATUS_CODE: CdxField = CdxField('s');
    pub const REDIRECT: CdxField = CdxField('r');

    // Other
    pub const FILENAME: CdxField = CdxField('g');
    pub const FBIS: CdxField = CdxField('K');
    pub const UNIQUENESS: CdxField = CdxField('U');
    /// Reserved multi-column language description. No [`CdxRecord`] field maps
    /// to this code.
    pub const LANGUAGE_DESC: CdxField = CdxField('G');

    pub const fn new(code: char) -> CdxField {
        CdxField(code)
    }

    pub const fn code(self) -> char {
        self.0
    }
}

impl fmt::Display for CdxField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An ordered list of the columns in a CDX file.
///
/// ```
/// # use warckit::cdx::CdxFormat;
/// assert_eq!(CdxFormat::cdx9().to_string(), "CDX N b a m s k r V g");
/// assert_eq!(CdxFormat::parse("CDX N b a m s k r V g"), Ok(CdxFormat::cdx9()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdxFormat(Vec<CdxField>);

impl CdxFormat {
    pub fn new(columns: Vec<CdxField>) -> CdxFormat {
        CdxFormat(columns)
    }

    /// The classic nine-column format: `CDX N b a m s k r V g`.
    pub fn cdx9() -> CdxFormat {
        CdxFormat(vec![
            CdxField::MASSAGED_URL,
            CdxField::DATE,
            CdxField::ORIGINAL_URL,
            CdxField::MIME_TYPE,
            CdxField::STATUS_CODE,
            CdxField::NEW_CHECKSUM,
            CdxField::REDIRECT,
            CdxField::COMPRESSED_ARC_OFFSET,
            CdxField::FILENAME,
        ])
    }

    /// The eleven-column format: `CDX N b a m s k r M S V g`.
    pub fn cdx11() -> CdxFormat {
        CdxFormat(vec![
            CdxField::MASSAGED_URL,
            CdxField::DATE,
            CdxField::ORIGINAL_URL,
            CdxField::MIME_TYPE,
            CdxField::STATUS_CODE,
            CdxField::NEW_CHECKSUM,
            CdxField::REDIRECT,
            CdxField::META_TAGS,
            CdxField::COMPRESSED_SIZE,
            CdxField::COMPRESSED_ARC_OFFSET,
            CdxField::FILENAME,
        ])
    }

    /// Parse a CDX header line.
    ///
    /// The first whitespace-delimited token must be the literal `CDX`, and
    /// every following token must be a single-character column code.
    pub fn parse(line: &str) -> Result<CdxFormat, Error> {
        let mut tokens = line.split_whitespace();
        if tokens.next() != Some("CDX") {
            return Err(Error::InvalidHeaderLine(line.to_owned()));
        }
        let mut columns = Vec::new();
        for token in tokens {
            let mut chars = token.chars();
            match (chars.next(), chars.next()) {
                (Some(code), None) => columns.push(CdxField::new(code)),
                _ => return Err(Error::InvalidHeaderLine(line.to_owned())),
            }
        }
        Ok(CdxFormat(columns))
    }

    pub fn columns(&self) -> &[CdxField] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CdxFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("CDX")?;
        for column in &self.0 {
            write!(f, " {}", column)?;
        }
        Ok(())
    }
}

/// A single row of a CDX index, fully typed.
///
/// The struct carries a field for every assigned column code, whatever format
/// the row came from; columns absent from the format, and columns holding the
/// `-` sentinel, keep their zero value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CdxRecord {
    // URL group
    /// `A`: canonized URL.
    pub canonized_url: String,
    /// `B`: news group.
    pub news_group: String,
    /// `C`: rulespace category (future use).
    pub rulespace_category: String,
    /// `F`: canonized frame.
    pub canonized_frame: String,
    /// `H`: canonized host.
    pub canonized_host: String,
    /// `I`: canonized image.
    pub canonized_image: String,
    /// `J`: canonized jump point.
    pub canonized_jump: String,
    /// `L`: canonized link.
    pub canonized_link: String,
    /// `N`: massaged (SURT-ordered) URL.
    pub massaged_url: String,
    /// `P`: canonized path.
    pub canonized_path: String,
    /// `R`: canonized redirect.
    pub canonized_redirect: String,
    /// `a`: original URL.
    pub original_url: String,
    /// `h`: original host.
    pub original_host: String,
    /// `p`: original path.
    pub original_path: String,

    // Metadata group
    /// `b`: capture date, `yyyyMMddHHmmss` UTC on the wire.
    pub date: Option<DateTime<Utc>>,
    /// `e`: IP address.
    pub ip: String,
    /// `Q`: language string.
    pub language: String,
    /// `o`: port.
    pub port: i64,
    /// `t`: title.
    pub title: String,
    /// `M`: AIF meta tags.
    pub meta_tags: String,

    // Checksum and size group
    /// `c`: old-style checksum.
    pub old_checksum: String,
    /// `k`: new-style checksum.
    pub new_checksum: String,
    /// `S`: compressed record size.
    pub compressed_size: i64,
    /// `n`: ARC document length.
    pub arc_document_length: i64,

    // Offset group
    /// `D`: compressed dat file offset.
    pub compressed_dat_offset: i64,
    /// `d`: uncompressed dat file offset.
    pub uncompressed_dat_offset: i64,
    /// `V`: compressed arc file offset.
    pub compressed_arc_offset: i64,
    /// `v`: uncompressed arc file offset.
    pub uncompressed_arc_offset: i64,

    // Resource reference group
    /// `f`: frame.
    pub frame: String,
    /// `i`: image.
    pub image: String,
    /// `j`: original jump point.
    pub jump_point: String,
    /// `l`: link.
    pub link: String,
    /// `x`: URL in other href tags.
    pub urls_in_href: String,
    /// `y`: URL in other src tags.
    pub urls_in_src: String,
    /// `z`: URL found in script.
    pub urls_in_script: String,

    // Response group
    /// `m`: MIME type of the original document.
    pub mime_type: String,
    /// `s`: response status code.
    pub status_code: i64,
    /// `r`: redirect.
    pub redirect: String,

    // Other
    /// `g`: file name.
    pub filename: String,
    /// `K`: FBIS what's-changed marker.
    pub fbis: String,
    /// `U`: uniqueness (future use).
    pub uniqueness: String,
}

/// The binding between one column code and its [`CdxRecord`] field.
struct Column {
    code: char,
    name: &'static str,
    kind: ValueKind,
    get: fn(&CdxRecord) -> FieldValue,
    set: fn(&mut CdxRecord, FieldValue),
}

macro_rules! str_column {
    ($code:expr, $field:ident) => {
        Column {
            code: $code,
            name: stringify!($field),
            kind: ValueKind::Str,
            get: |r| FieldValue::Str(r.$field.clone()),
            set: |r, v| r.$field = v.take_str(),
        }
    };
}

macro_rules! int_column {
    ($code:expr, $field:ident) => {
        Column {
            code: $code,
            name: stringify!($field),
            kind: ValueKind::Int,
            get: |r| FieldValue::Int(r.$field),
            set: |r, v| r.$field = v.take_int(),
        }
    };
}

static COLUMNS: [Column; 41] = [
    str_column!('A', canonized_url),
    str_column!('B', news_group),
    str_column!('C', rulespace_category),
    str_column!('F', canonized_frame),
    str_column!('H', canonized_host),
    str_column!('I', canonized_image),
    str_column!('J', canonized_jump),
    str_column!('L', canonized_link),
    str_column!('N', massaged_url),
    str_column!('P', canonized_path),
    str_column!('R', canonized_redirect),
    str_column!('a', original_url),
    str_column!('h', original_host),
    str_column!('p', original_path),
    Column {
        code: 'b',
        name: "date",
        kind: ValueKind::Time,
        get: |r| FieldValue::Time(r.date),
        set: |r, v| r.date = v.take_time(),
    },
    str_column!('e', ip),
    str_column!('Q', language),
    int_column!('o', port),
    str_column!('t', title),
    str_column!('M', meta_tags),
    str_column!('c', old_checksum),
    str_column!('k', new_checksum),
    int_column!('S', compressed_size),
    int_column!('n', arc_document_length),
    int_column!('D', compressed_dat_offset),
    int_column!('d', uncompressed_dat_offset),
    int_column!('V', compressed_arc_offset),
    int_column!('v', uncompressed_arc_offset),
    str_column!('f', frame),
    str_column!('i', image),
    str_column!('j', jump_point),
    str_column!('l', link),
    str_column!('x', urls_in_href),
    str_column!('y', urls_in_src),
    str_column!('z', urls_in_script),
    str_column!('m', mime_type),
    int_column!('s', status_code),
    str_column!('r', redirect),
    str_column!('g', filename),
    str_column!('K', fbis),
    str_column!('U', uniqueness),
];

fn column_for(field: CdxField) -> Result<&'static Column, Error> {
    COLUMNS
        .iter()
        .find(|column| column.code == field.code())
        .ok_or(Error::UnknownField(field.code()))
}

/// A whole CDX index: the format declaration plus its rows.
///
/// ```
/// # use warckit::cdx::{CdxFile, CdxFormat};
/// let data = b"CDX N b a m s k r V g\n\
/// http://example.com/ 20010424210312 http://example.com/ text/html 200 \
/// ZMSA5TNJUKKRYAIM5PRUJLL24DV7QYOO - 12345 example.warc.gz\n";
///
/// let file = CdxFile::decode(data).unwrap();
/// assert_eq!(file.format, CdxFormat::cdx9());
/// assert_eq!(file.records[0].status_code, 200);
/// assert_eq!(file.records[0].redirect, "");
/// assert_eq!(file.encode().unwrap(), data.to_vec());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CdxFile {
    pub format: CdxFormat,
    /// The character separating row fields. A space, unless building a file by
    /// hand; space-delimited rows additionally tolerate runs of whitespace
    /// when decoding.
    pub delimiter: char,
    pub records: Vec<CdxRecord>,
}

impl CdxFile {
    /// Create an empty index with the given format.
    pub fn new(format: CdxFormat) -> CdxFile {
        CdxFile {
            format,
            delimiter: ' ',
            records: Vec::new(),
        }
    }

    /// Decode a whole CDX file: the header line, then one record per
    /// non-empty row.
    pub fn decode(data: &[u8]) -> Result<CdxFile, Error> {
        let text = str::from_utf8(data)
            .map_err(|_| Error::InvalidHeaderLine(String::from_utf8_lossy(data).into_owned()))?;
        let mut lines = text.lines();
        let header = lines.next().unwrap_or("");
        let mut file = CdxFile::new(CdxFormat::parse(header)?);
        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            file.records.push(decode_row(line, &file.format, file.delimiter)?);
        }
        trace!("decoded {} CDX records", file.records.len());
        Ok(file)
    }

    /// Read and decode a whole CDX file from a byte source.
    pub fn read_from<R: BufRead>(input: &mut R) -> Result<CdxFile, Error> {
        let mut data = Vec::new();
        input.read_to_end(&mut data)?;
        CdxFile::decode(&data)
    }

    /// Write the index: the header line, then one row per record.
    ///
    /// Empty and zero values are written as the `-` sentinel, so every row has
    /// exactly one field per declared column.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<(), Error> {
        writeln!(out, "{}", self.format)?;
        for record in &self.records {
            writeln!(out, "{}", encode_row(record, &self.format, self.delimiter)?)?;
        }
        Ok(())
    }

    /// Encode the index to an owned buffer. See [`write_to`](Self::write_to).
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(buf)
    }
}

fn decode_row(line: &str, format: &CdxFormat, delimiter: char) -> Result<CdxRecord, Error> {
    let parts: Vec<&str> = if delimiter == ' ' {
        line.split_whitespace().collect()
    } else {
        line.split(delimiter).collect()
    };
    if parts.len() != format.len() {
        return Err(Error::FieldCountMismatch {
            expected: format.len(),
            actual: parts.len(),
        });
    }

    let mut record = CdxRecord::default();
    for (&field, &raw) in format.columns().iter().zip(&parts) {
        let column = column_for(field)?;
        if raw == "-" {
            continue;
        }
        let value = fields::parse_value(column.kind, raw, TimeProfile::CdxTimestamp).ok_or_else(
            || Error::InvalidFieldValue {
                field: column.name,
                value: raw.to_owned(),
            },
        )?;
        (column.set)(&mut record, value);
    }
    Ok(record)
}

fn encode_row(record: &CdxRecord, format: &CdxFormat, delimiter: char) -> Result<String, Error> {
    let mut rendered = Vec::with_capacity(format.len());
    for &field in format.columns() {
        let column = column_for(field)?;
        let value = (column.get)(record);
        if value.is_empty() {
            rendered.push("-".to_owned());
        } else {
            let formatted = fields::render_value(&value, TimeProfile::CdxTimestamp)
                .map_err(|bad| Error::InvalidFieldValue {
                    field: column.name,
                    value: bad,
                })?;
            rendered.push(formatted);
        }
    }
    let delimiter = delimiter.to_string();
    Ok(rendered.join(&delimiter))
}
