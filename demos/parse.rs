use pwrules_annotations::{parse_password_rules, CharacterClass, NamedClass, Rule};

fn main() {
    let password_rules = "minlength: 8; maxlength: 32; required: lower, upper; required: digit; allowed: [-_./\\@$*&!#];";
    let rules = parse_password_rules(password_rules, true);

    assert_eq!(
        rules,
        vec![
            Rule::Required(vec![
                CharacterClass::named(NamedClass::Lower),
                CharacterClass::named(NamedClass::Upper),
            ]),
            Rule::Required(vec![CharacterClass::named(NamedClass::Digit)]),
            Rule::Allowed(vec![CharacterClass::custom(vec![
                '-', '!', '#', '$', '&', '*', '.', '/', '@', '\\', '_',
            ])]),
            Rule::MinLength(8),
            Rule::MaxLength(32),
            Rule::MinClasses(4),
        ]
    );

    // This password rule does not place a restriction on consecutive characters
    assert!(!rules.iter().any(|rule| matches!(rule, Rule::MaxConsecutive(_))));

    // The above information can be used to make informed decisions about what password
    // to generate for use with a specific service
    for rule in &rules {
        println!("{rule};");
    }
}
