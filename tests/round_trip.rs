//! End-to-end exercise: build a small archive with an index, write both out,
//! and read them back through the public API.

use chrono::{DateTime, Utc};
use pretty_assertions::assert_eq;

use warckit::cdx::{CdxFile, CdxFormat, CdxRecord};
use warckit::{
    AnyRecord, MetadataRecord, Record, RecordStream, RecordType, Version, WarcInfoRecord,
};

fn date(s: &str) -> Option<DateTime<Utc>> {
    Some(
        DateTime::parse_from_rfc3339(s)
            .expect("test date should be valid")
            .with_timezone(&Utc),
    )
}

#[test]
fn archive_round_trip() {
    let mut info = WarcInfoRecord::new(Version::Warc1_1);
    info.record.record_id = "<urn:uuid:info>".to_owned();
    info.record.date = date("2024-01-01T10:00:00Z");
    info.record.filename = "example.warc".to_owned();
    info.software = "crawler/1.0".to_owned();
    info.operator = "Alice".to_owned();

    let mut response = Record::new(Version::Warc1_1);
    response.record_id = "<urn:uuid:response>".to_owned();
    response.date = date("2024-01-01T10:00:05Z");
    response.warc_type = RecordType::Response;
    response.target_uri = "http://example.com/".to_owned();
    response.content_type = "application/http;msgtype=response".to_owned();
    response.warcinfo_id = "<urn:uuid:info>".to_owned();
    response.content = b"HTTP/1.1 200 OK\r\n\r\nHello, World!".to_vec();

    let mut metadata = MetadataRecord::new(Version::Warc1_1);
    metadata.record.record_id = "<urn:uuid:meta>".to_owned();
    metadata.record.date = date("2024-01-01T10:00:05Z");
    metadata.record.refers_to = "<urn:uuid:response>".to_owned();
    metadata.via = "http://example.com/".to_owned();
    metadata.hops_from_seed = "L".to_owned();
    metadata.fetch_time_ms = 120;

    let mut archive = Vec::new();
    info.write_to(&mut archive).unwrap();
    response.write_to(&mut archive).unwrap();
    metadata.write_to(&mut archive).unwrap();

    let records: Vec<AnyRecord> = RecordStream::new(&archive[..])
        .records()
        .collect::<Result<_, _>>()
        .expect("archive should read back cleanly");
    assert_eq!(records.len(), 3);

    match &records[0] {
        AnyRecord::WarcInfo(decoded) => {
            assert_eq!(decoded.software, "crawler/1.0");
            assert_eq!(decoded.operator, "Alice");
            assert_eq!(decoded.record.filename, "example.warc");
        }
        other => panic!("expected a warcinfo record, got {:?}", other),
    }

    match &records[1] {
        AnyRecord::Plain(decoded) => assert_eq!(decoded, &response),
        other => panic!("expected a plain record, got {:?}", other),
    }

    match &records[2] {
        AnyRecord::Metadata(decoded) => {
            assert_eq!(decoded.via, "http://example.com/");
            assert_eq!(decoded.fetch_time_ms, 120);
            assert_eq!(decoded.record.refers_to, "<urn:uuid:response>");
        }
        other => panic!("expected a metadata record, got {:?}", other),
    }

    // Re-encoding the decoded records reproduces the archive.
    let mut rewritten = Vec::new();
    for record in &records {
        record.write_to(&mut rewritten).unwrap();
    }
    assert_eq!(rewritten, archive);
}

#[test]
fn index_round_trip() {
    let mut index = CdxFile::new(CdxFormat::cdx9());
    let mut row = CdxRecord::default();
    row.massaged_url = "com,example)/".to_owned();
    row.date = date("2024-01-01T10:00:05Z");
    row.original_url = "http://example.com/".to_owned();
    row.mime_type = "application/http".to_owned();
    row.status_code = 200;
    row.compressed_arc_offset = 395;
    row.filename = "example.warc.gz".to_owned();
    index.records.push(row);

    let encoded = index.encode().unwrap();
    assert_eq!(
        String::from_utf8_lossy(&encoded),
        "CDX N b a m s k r V g\n\
         com,example)/ 20240101100005 http://example.com/ application/http 200 - - 395 example.warc.gz\n"
    );
    assert_eq!(CdxFile::decode(&encoded), Ok(index));
}
