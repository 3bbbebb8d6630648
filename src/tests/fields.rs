use crate::fields::{
    parse_field_lines, parse_value, render_value, FieldValue, TimeProfile, ValueKind,
};
use crate::Error;
use uncased::UncasedStr;

#[test]
fn field_lines_parse_and_trim() {
    let map = parse_field_lines("operator: Alice\r\nSoftware:  crawler/1.0  ".split('\n'), false)
        .expect("well-formed lines should parse");

    assert_eq!(map.len(), 2);
    assert_eq!(map.get(UncasedStr::new("operator")).unwrap(), "Alice");
    // Keys are matched without regard to case.
    assert_eq!(map.get(UncasedStr::new("software")).unwrap(), "crawler/1.0");
}

#[test]
fn strict_mode_rejects_lines_without_colon() {
    let err = parse_field_lines("operator: Alice\njunk line".split('\n'), false).unwrap_err();
    assert_eq!(err, Error::InvalidHeaderLine("junk line".to_owned()));
}

#[test]
fn lenient_mode_skips_lines_without_colon() {
    let map = parse_field_lines("junk line\noperator: Alice\n\n".split('\n'), true)
        .expect("lenient parsing should not fail on junk");

    assert_eq!(map.len(), 1);
    assert_eq!(map.get(UncasedStr::new("operator")).unwrap(), "Alice");
}

#[test]
fn numeric_values_must_parse() {
    assert_eq!(
        parse_value(ValueKind::Uint, "123", TimeProfile::Rfc3339),
        Some(FieldValue::Uint(123))
    );
    assert_eq!(parse_value(ValueKind::Uint, "12x", TimeProfile::Rfc3339), None);
    assert_eq!(parse_value(ValueKind::Int, "-", TimeProfile::Rfc3339), None);
}

#[test]
fn timestamps_round_trip_in_both_profiles() {
    for (profile, wire) in [
        (TimeProfile::Rfc3339, "2024-01-01T10:00:00Z"),
        (TimeProfile::CdxTimestamp, "20240101100000"),
    ] {
        let parsed = profile.parse(wire).expect("timestamp should parse");
        assert_eq!(profile.format(&parsed), wire);
    }
    assert_eq!(TimeProfile::CdxTimestamp.parse("2024"), None);
}

#[test]
fn list_values_split_and_join_symmetrically() {
    let value = parse_value(ValueKind::List, "<urn:a>, <urn:b>", TimeProfile::Rfc3339).unwrap();
    assert_eq!(
        value,
        FieldValue::List(vec!["<urn:a>".to_owned(), "<urn:b>".to_owned()])
    );
    assert_eq!(
        render_value(&value, TimeProfile::Rfc3339).unwrap(),
        "<urn:a>, <urn:b>"
    );
}

#[test]
fn list_elements_containing_the_delimiter_are_rejected() {
    // Joining such an element would decode as two elements; there is no
    // escaping mechanism, so rendering refuses.
    let value = FieldValue::List(vec!["<urn:a>".to_owned(), "bad, element".to_owned()]);
    assert_eq!(
        render_value(&value, TimeProfile::Rfc3339),
        Err("bad, element".to_owned())
    );
}
