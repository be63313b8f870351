use pwrules_annotations::{parse_password_rules, Blocklist};
use serde_json::json;

#[test]
fn rules_serialize_as_name_and_value() {
    let rules = parse_password_rules(
        "required: upper(1, 3), [ab]; blocklist: hibp; max-consecutive: 2; minlength: 8",
        true,
    );

    assert_eq!(
        serde_json::to_value(&rules).unwrap(),
        json!([
            {
                "name": "required",
                "value": [
                    {"name": "upper", "minChars": 1, "maxChars": 3},
                    {"characters": ["a", "b"]},
                ],
            },
            {"name": "blocklist", "value": ["hibp"]},
            {"name": "max-consecutive", "value": 2},
            {"name": "minlength", "value": 8},
            {"name": "minclasses", "value": 4},
        ])
    );
}

#[test]
fn universal_classes_serialize_by_name() {
    let rules = parse_password_rules("allowed: ascii-printable; required: unicode", false);

    assert_eq!(
        serde_json::to_string(&rules).unwrap(),
        r#"[{"name":"required","value":[{"name":"unicode"}]},{"name":"allowed","value":[{"name":"unicode"}]},{"name":"minclasses","value":4}]"#
    );
}

#[test]
fn default_blocklist_serializes_every_word() {
    let rules = parse_password_rules("blocklist: default", true);
    let value = serde_json::to_value(&rules).unwrap();

    let words = value[0]["value"].as_array().unwrap();
    assert_eq!(value[0]["name"], "blocklist");
    assert_eq!(words.len(), Blocklist::global().len());
    assert!(words.iter().any(|word| word == "password"));
}
