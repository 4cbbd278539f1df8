//! Loading keyword sets from disk and screening with them.

use proptest::prelude::*;
use serene_safety::{KeywordSet, SafetyError, SafetyScreen, Screening};

#[test]
fn partial_file_keeps_default_lists() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("keywords.json");
    std::fs::write(&path, r#"{"crisis": ["quiero morir"], "suicide_risk": ["quiero morir"]}"#)
        .unwrap();

    let keywords = KeywordSet::from_json_file(&path).unwrap();
    assert_eq!(keywords.crisis, vec!["quiero morir".to_string()]);
    assert_eq!(keywords.off_topic, KeywordSet::default().off_topic);

    let screen = SafetyScreen::new(&keywords).unwrap();
    match screen.screen("A veces QUIERO MORIR") {
        Screening::Crisis(signal) => assert!(signal.suicide_risk),
        other => panic!("expected crisis, got {other:?}"),
    }
}

#[test]
fn malformed_file_is_a_parse_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("keywords.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(KeywordSet::from_json_file(&path), Err(SafetyError::Parse(_))));
    assert!(matches!(
        KeywordSet::from_json_file(temp.path().join("missing.json")),
        Err(SafetyError::Io(_))
    ));
}

#[test]
fn screening_serializes_with_kind_tag() {
    let screen = SafetyScreen::new(&KeywordSet::default()).unwrap();
    let json = serde_json::to_value(screen.screen("I feel hopeless")).unwrap();
    assert_eq!(json["kind"], "crisis");
    assert_eq!(json["matched"][0], "hopeless");
    assert_eq!(serde_json::to_value(Screening::Clear).unwrap()["kind"], "clear");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Screening is a pure function of the message.
    #[test]
    fn screening_is_deterministic(message in "\\PC{0,80}") {
        let screen = SafetyScreen::new(&KeywordSet::default()).unwrap();
        prop_assert_eq!(screen.screen(&message), screen.screen(&message));
    }

    /// Any message containing a crisis phrase as a separate word group is a crisis.
    #[test]
    fn embedded_crisis_phrase_is_detected(
        prefix in "[a-z ]{0,20}",
        suffix in "[a-z ]{0,20}",
        index in 0usize..22,
    ) {
        let phrase = serene_safety::DEFAULT_CRISIS_KEYWORDS[index];
        let message = format!("{prefix} {phrase} {suffix}");
        let screen = SafetyScreen::new(&KeywordSet::default()).unwrap();
        prop_assert!(screen.screen(&message).is_crisis());
    }
}
