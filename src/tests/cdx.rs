use pretty_assertions::assert_eq;

use crate::cdx::{CdxField, CdxFile, CdxFormat, CdxRecord};
use crate::Error;

const CDX9_SAMPLE: &[u8] = b"CDX N b a m s k r V g\n\
    http://example.com/ 20010424210312 http://example.com/ text/html 200 \
    ZMSA5TNJUKKRYAIM5PRUJLL24DV7QYOO - 12345 example.warc.gz\n";

#[test]
fn format_displays_as_header_line() {
    assert_eq!(CdxFormat::cdx9().to_string(), "CDX N b a m s k r V g");
    assert_eq!(CdxFormat::cdx11().to_string(), "CDX N b a m s k r M S V g");
}

#[test]
fn format_parses_its_own_display() {
    for format in [CdxFormat::cdx9(), CdxFormat::cdx11()] {
        assert_eq!(CdxFormat::parse(&format.to_string()), Ok(format));
    }
}

#[test]
fn format_requires_the_cdx_magic() {
    assert_eq!(
        CdxFormat::parse("N b a m s k r V g"),
        Err(Error::InvalidHeaderLine("N b a m s k r V g".to_owned()))
    );
    assert_eq!(
        CdxFormat::parse(""),
        Err(Error::InvalidHeaderLine(String::new()))
    );
}

#[test]
fn format_rejects_multi_character_codes() {
    // Truncating `Nb` to `N` would quietly misread the whole file.
    assert_eq!(
        CdxFormat::parse("CDX Nb b"),
        Err(Error::InvalidHeaderLine("CDX Nb b".to_owned()))
    );
}

#[test]
fn decodes_a_cdx9_file() {
    let file = CdxFile::decode(CDX9_SAMPLE).expect("decoding should succeed");
    assert_eq!(file.format, CdxFormat::cdx9());
    assert_eq!(file.records.len(), 1);

    let record = &file.records[0];
    assert_eq!(record.massaged_url, "http://example.com/");
    assert_eq!(
        record.date.unwrap().format("%Y%m%d%H%M%S").to_string(),
        "20010424210312"
    );
    assert_eq!(record.original_url, "http://example.com/");
    assert_eq!(record.mime_type, "text/html");
    assert_eq!(record.status_code, 200);
    assert_eq!(record.new_checksum, "ZMSA5TNJUKKRYAIM5PRUJLL24DV7QYOO");
    // The `-` sentinel decodes to the zero value, not a literal dash.
    assert_eq!(record.redirect, "");
    assert_eq!(record.compressed_arc_offset, 12345);
    assert_eq!(record.filename, "example.warc.gz");
}

#[test]
fn reencodes_byte_for_byte() {
    let file = CdxFile::decode(CDX9_SAMPLE).unwrap();
    assert_eq!(file.encode().unwrap(), CDX9_SAMPLE.to_vec());
}

#[test]
fn encodes_a_cdx11_file() {
    let mut file = CdxFile::new(CdxFormat::cdx11());
    let mut record = CdxRecord::default();
    record.massaged_url = "com,example)/".to_owned();
    record.date = crate::fields::TimeProfile::CdxTimestamp.parse("20240101100000");
    record.original_url = "http://example.com/".to_owned();
    record.mime_type = "text/html".to_owned();
    record.status_code = 200;
    record.new_checksum = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA".to_owned();
    record.compressed_size = 512;
    record.compressed_arc_offset = 1024;
    record.filename = "example.warc.gz".to_owned();
    file.records.push(record);

    assert_eq!(
        String::from_utf8(file.encode().unwrap()).unwrap(),
        "CDX N b a m s k r M S V g\n\
         com,example)/ 20240101100000 http://example.com/ text/html 200 \
         AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA - - 512 1024 example.warc.gz\n"
    );
}

#[test]
fn empty_rows_are_skipped_and_counts_enforced() {
    let data = b"CDX N b\n\nfoo 20240101100000\n";
    let file = CdxFile::decode(data).unwrap();
    assert_eq!(file.records.len(), 1);

    let short = b"CDX N b a\nfoo 20240101100000\n";
    assert_eq!(
        CdxFile::decode(short),
        Err(Error::FieldCountMismatch {
            expected: 3,
            actual: 2,
        })
    );
}

#[test]
fn unassigned_codes_are_rejected() {
    // 'G' is reserved but maps to no record field; 'Z' is entirely unknown.
    let data = b"CDX N G\nfoo bar\n";
    assert_eq!(CdxFile::decode(data), Err(Error::UnknownField('G')));

    let mut file = CdxFile::new(CdxFormat::new(vec![CdxField::new('Z')]));
    file.records.push(CdxRecord::default());
    assert_eq!(file.encode(), Err(Error::UnknownField('Z')));
}

#[test]
fn malformed_values_are_explicit_errors() {
    let bad_status = b"CDX N s\nfoo 20x\n";
    assert_eq!(
        CdxFile::decode(bad_status),
        Err(Error::InvalidFieldValue {
            field: "status_code",
            value: "20x".to_owned(),
        })
    );

    let bad_date = b"CDX N b\nfoo 2024\n";
    assert_eq!(
        CdxFile::decode(bad_date),
        Err(Error::InvalidFieldValue {
            field: "date",
            value: "2024".to_owned(),
        })
    );
}

#[test]
fn empty_values_round_trip_through_the_sentinel() {
    let mut file = CdxFile::new(CdxFormat::cdx9());
    file.records.push(CdxRecord::default());

    let encoded = file.encode().unwrap();
    assert_eq!(
        String::from_utf8_lossy(&encoded),
        "CDX N b a m s k r V g\n- - - - - - - - -\n"
    );
    assert_eq!(CdxFile::decode(&encoded), Ok(file));
}

#[test]
fn custom_delimiter_is_used_on_encode() {
    let mut file = CdxFile::new(CdxFormat::new(vec![
        CdxField::MASSAGED_URL,
        CdxField::STATUS_CODE,
    ]));
    file.delimiter = '\t';
    let mut record = CdxRecord::default();
    record.massaged_url = "com,example)/".to_owned();
    record.status_code = 404;
    file.records.push(record);

    assert_eq!(
        String::from_utf8(file.encode().unwrap()).unwrap(),
        "CDX N s\ncom,example)/\t404\n"
    );
}

#[test]
fn read_from_reads_a_whole_source() {
    let mut cursor = std::io::Cursor::new(CDX9_SAMPLE.to_vec());
    let file = CdxFile::read_from(&mut cursor).unwrap();
    assert_eq!(file.records.len(), 1);
}
