//! Unit tests for entry payload classification

use opencloud_datastore_client::api::classify::{
    classify, decode_json_string, encode_json_string,
};
use opencloud_datastore_client::EntryKind;

#[test]
fn test_classifier_precedence_table() {
    // Quoted numeric text is a string, not a number
    let (kind, display) = classify("\"42\"");
    assert_eq!(kind, EntryKind::String);
    assert_eq!(display, "42");

    // Bare numeric text is a number
    let (kind, display) = classify("42");
    assert_eq!(kind, EntryKind::Number);
    assert_eq!(display, "42");

    let (kind, _) = classify("true");
    assert_eq!(kind, EntryKind::Bool);

    let (kind, _) = classify("{\"a\":1}");
    assert_eq!(kind, EntryKind::Json);

    let (kind, display) = classify("not json or number");
    assert_eq!(kind, EntryKind::Error);
    assert_eq!(display, "not json or number");
}

#[test]
fn test_classifier_never_panics_on_hostile_input() {
    for raw in [
        "",
        "\"",
        "\"\\",
        "{",
        "[",
        "nan or so",
        "\u{0}",
        "\"mixed\" trailing",
    ] {
        let (kind, display) = classify(raw);
        // Fallback never loses the payload
        if kind == EntryKind::Error {
            assert_eq!(display, raw);
        }
    }
}

#[test]
fn test_string_round_trip_property() {
    // Any NUL-free string survives an encode/decode round trip
    let samples = [
        "plain",
        "",
        "with \"inner quotes\" and \\ backslash",
        "newline\nand\ttab",
        "unicode: héllo wörld 键",
        "42",
        "true",
    ];
    for original in samples {
        let encoded = encode_json_string(original);
        assert_eq!(
            decode_json_string(&encoded).as_deref(),
            Some(original),
            "round trip failed for {original:?}"
        );
    }
}

#[test]
fn test_classification_is_deterministic() {
    for raw in ["{\"a\":[1,2]}", "\"s\"", "-0.5", "false", "???"] {
        assert_eq!(classify(raw), classify(raw));
    }
}
