use chrono::{DateTime, Utc};

use crate::{AnyRecord, Error, Record, RecordStream, RecordType, Version, WarcInfoRecord};

fn date(s: &str) -> Option<DateTime<Utc>> {
    Some(
        DateTime::parse_from_rfc3339(s)
            .expect("test date should be valid")
            .with_timezone(&Utc),
    )
}

fn sample_record(id: &str, content: &[u8]) -> Record {
    let mut record = Record::new(Version::Warc1_0);
    record.record_id = id.to_owned();
    record.date = date("2024-01-01T10:00:00Z");
    record.warc_type = RecordType::Response;
    record.content = content.to_vec();
    record
}

#[test]
fn empty_input_yields_no_records() {
    assert!(RecordStream::new(&b""[..]).next().is_none());
    // Stray padding without a record behaves the same.
    assert!(RecordStream::new(&b"\r\n\r\n"[..]).next().is_none());
}

#[test]
fn splits_concatenated_records() {
    let first = sample_record("<urn:uuid:1>", b"first payload");
    let second = sample_record("<urn:uuid:2>", b"second");
    let mut data = first.encode().unwrap();
    data.extend(second.encode().unwrap());

    let chunks: Vec<_> = RecordStream::new(&data[..])
        .collect::<Result<_, _>>()
        .expect("segmentation should succeed");
    assert_eq!(chunks.len(), 2);

    assert_eq!(Record::decode(&chunks[0]).unwrap(), first);
    assert_eq!(Record::decode(&chunks[1]).unwrap(), second);
}

#[test]
fn payload_bytes_are_never_mistaken_for_a_boundary() {
    // A record whose payload is itself a complete encoded record. Marker
    // scanning would split it; length tracking must not.
    let inner = sample_record("<urn:uuid:inner>", b"inner payload").encode().unwrap();
    let outer = sample_record("<urn:uuid:outer>", &inner);
    let mut data = outer.encode().unwrap();
    data.extend(sample_record("<urn:uuid:tail>", b"tail").encode().unwrap());

    let chunks: Vec<_> = RecordStream::new(&data[..])
        .collect::<Result<_, _>>()
        .expect("segmentation should succeed");
    assert_eq!(chunks.len(), 2);
    assert_eq!(Record::decode(&chunks[0]).unwrap().content, inner);
    assert_eq!(Record::decode(&chunks[1]).unwrap().record_id, "<urn:uuid:tail>");
}

#[test]
fn short_payload_poisons_the_stream() {
    let mut data = sample_record("<urn:uuid:1>", b"payload").encode().unwrap();
    data.truncate(data.len() - 8); // chop the tail plus half the payload

    let mut stream = RecordStream::new(&data[..]);
    assert_eq!(
        stream.next(),
        Some(Err(Error::ContentLengthMismatch {
            declared: 7,
            available: 3,
        }))
    );
    // Fused: no attempt to resynchronize after an error.
    assert!(stream.next().is_none());
    assert!(stream.next().is_none());
}

#[test]
fn missing_content_length_poisons_the_stream() {
    let data = b"WARC/1.0\r\n\
        WARC-Type: response\r\n\
        WARC-Date: 2024-01-01T10:00:00Z\r\n\
        WARC-Record-ID: <urn:uuid:x>\r\n\
        \r\n\
        some payload";

    let mut stream = RecordStream::new(&data[..]);
    assert_eq!(
        stream.next(),
        Some(Err(Error::MissingRequiredField("Content-Length")))
    );
    assert!(stream.next().is_none());
}

#[test]
fn garbage_input_is_not_a_record() {
    let data = b"this is not a WARC file\r\n\r\n";
    let mut stream = RecordStream::new(&data[..]);
    assert!(matches!(
        stream.next(),
        Some(Err(Error::UnsupportedVersion(_)))
    ));
}

#[test]
fn unterminated_header_is_an_eof_error() {
    let data = b"WARC/1.0\r\nWARC-Type: response\r\n";
    let mut stream = RecordStream::new(&data[..]);
    match stream.next() {
        Some(Err(Error::Io(e))) => assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof),
        other => panic!("expected an EOF error, got {:?}", other),
    }
}

#[test]
fn records_iterator_decodes_and_dispatches() {
    let mut info = WarcInfoRecord::new(Version::Warc1_0);
    info.record.record_id = "<urn:uuid:info>".to_owned();
    info.record.date = date("2024-01-01T10:00:00Z");
    info.operator = "Alice".to_owned();

    let mut data = info.encode().unwrap();
    data.extend(sample_record("<urn:uuid:r>", b"body").encode().unwrap());

    let records: Vec<_> = RecordStream::new(&data[..])
        .records()
        .collect::<Result<_, _>>()
        .expect("decoding should succeed");
    assert_eq!(records.len(), 2);
    match &records[0] {
        AnyRecord::WarcInfo(decoded) => assert_eq!(decoded.operator, "Alice"),
        other => panic!("expected a warcinfo record, got {:?}", other),
    }
    assert_eq!(records[1].warc_type(), &RecordType::Response);
}
