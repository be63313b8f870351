//! Rust parser for password composition rules, the small language used by the HTML
//! [`passwordrules` attribute][whatwg_proposal] and by password managers to describe what
//! passwords a service accepts.
//!
//! # Password Rules
//!
//! A rules document is a list of `name: value` rules separated by a semicolon (`;`):
//!
//! * `max-consecutive` - The maximum number of consecutive identical characters allowed in the
//!   password
//! * `minlength` - The minimum length of the password
//! * `maxlength` - The maximum length of the password
//! * `minclasses` - The minimum number of character classes the password must draw from,
//!   between 1 and 4
//! * `allowed` - A set of character classes whose characters the password is allowed to be
//!   generated with
//!     * Note that `allowed: digit, upper;` is equivalent to `allowed: digit; allowed: upper;`
//! * `required` - A set of character classes where at least one character from each `required` set
//!   must appear in the password
//!     * Note that `required: digit, upper;` is **not** equivalent to
//!       `required: digit; required: upper;`. The first means that the password must contain a
//!       `digit` or an `upper`(case) character, while the second means the password must contain
//!       a `digit` **AND** an `upper`(case) character.
//! * `blocklist` - Passwords that must be rejected: `default` expands to the bundled list of
//!   common passwords (see [`Blocklist`]), `hibp` is passed through for the host to look up
//!
//! Values of `allowed` and `required` are separated by a comma (`,`), and each one may carry a
//! `(min, max)` range of how many of its characters the password may or must contain, like
//! `required: digit(1, 3);`.
//!
//! # Character Classes
//!
//! * `upper` - All ASCII uppercase characters (`ABCDEFGHIJKLMNOPQRSTUVWXYZ`)
//! * `lower` - All ASCII lowercase characters (`abcdefghijklmnopqrstuvwxyz`)
//! * `digit` - All ASCII digits (`0123456789`)
//! * `special` - ASCII special characters and space (`-~!@#$%^&*_+=``|(){}[:;"'<>,.?]`)
//! * `ascii-printable` - All ASCII printable characters
//! * `unicode` - All unicode characters
//! * Custom - A set of ASCII printable characters in the format `[-abc]]`, where `-`, `a`,
//!   `b`, `c`, and `]` are the characters. A `-` is only accepted as the first character, and
//!   `]]` stands for a `]` as the last one.
//!
//! # Output
//!
//! Parsing never fails. Rules are merged into a canonical list: `required` and `blocklist`
//! rules in input order, then one `allowed` rule, `max-consecutive`, `minlength`,
//! `maxlength` and `minclasses`. Character classes are canonicalized, so a custom class
//! covering all of `lower` becomes `lower`, and `upper, lower, digit, special` becomes
//! `ascii-printable`. Ranges that can't be satisfied together with the length limits are
//! dropped. Problems in the input are reported as [`Diagnostic`]s by
//! [`parse_password_rules_with_options`], and logged through the [`log`] facade.
//!
//! [`format_rules`] writes rules back out as a document that parses into the same rules. A
//! `blocklist` rule is written as its source name when it holds one, like `hibp`, and as
//! `default` otherwise; the bundled default list has about 500 words, so an expanded list
//! whose words were not all bundled or [appended](Blocklist::append) will not read back the
//! same.
//!
//! # Example
//!
//! This example can be run via `cargo run --example parse`.
//!
//! ```
//! use pwrules_annotations::{parse_password_rules, CharacterClass, NamedClass, Rule};
//!
//! let password_rules = "minlength: 8; maxlength: 32; required: lower, upper; required: digit; allowed: [-_./\\@$*&!#];";
//! let rules = parse_password_rules(password_rules, true);
//!
//! assert_eq!(
//!     rules,
//!     vec![
//!         Rule::Required(vec![
//!             CharacterClass::named(NamedClass::Lower),
//!             CharacterClass::named(NamedClass::Upper),
//!         ]),
//!         Rule::Required(vec![CharacterClass::named(NamedClass::Digit)]),
//!         Rule::Allowed(vec![CharacterClass::custom(vec![
//!             '-', '!', '#', '$', '&', '*', '.', '/', '@', '\\', '_',
//!         ])]),
//!         Rule::MinLength(8),
//!         Rule::MaxLength(32),
//!         Rule::MinClasses(4),
//!     ]
//! );
//!
//! // The above information can be used to make informed decisions about what password
//! // to generate for use with a specific service
//! ```
//!
//! You can try parsing arbitrary rules with this tool via `cargo run --example cli`.
//!
//! [whatwg_proposal]: https://github.com/whatwg/html/issues/3518

#![forbid(unsafe_code)]

mod blocklist;
pub mod canonical;
mod class;
pub mod error;
mod merge;
mod parser;
mod rule;
pub mod scanner;

pub use crate::blocklist::Blocklist;
pub use crate::canonical::{canonicalize, canonicalize_allowed};
pub use crate::class::{CharRange, CharacterClass, NamedClass};
pub use crate::error::{Diagnostic, DiagnosticKind, PasswordRulesError, Severity};
pub use crate::merge::merge_rules;
pub use crate::rule::{format_rules, Rule, RuleKind};

use crate::parser::RulesParser;

/// Options for parsing a rules document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Keep the output close to the source text: the classes of `required` rules are not
    /// copied into `allowed`, no default `allowed` rule is added, and custom classes are
    /// ordered so they can be written back out in bracket syntax.
    pub format_for_minified: bool,
}

/// The result of parsing a rules document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseReport {
    /// The merged rules. Empty if the document had to be abandoned.
    pub rules: Vec<Rule>,
    /// Everything that was adjusted or dropped, in input order
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseReport {
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diagnostic| diagnostic.severity == Severity::Error)
    }

    /// Treat error diagnostics as a failed parse. Warnings are accepted.
    pub fn into_result(self) -> Result<Vec<Rule>, PasswordRulesError> {
        if self.has_errors() {
            Err(PasswordRulesError {
                diagnostics: self.diagnostics,
            })
        } else {
            Ok(self.rules)
        }
    }
}

/// Parse a password rules string into its merged, canonical rules.
///
/// Malformed parts of the input are skipped; see [`parse_password_rules_with_options`] for the
/// diagnostics. A document that can't be parsed at all produces no rules.
///
/// Unless `format_for_minified` is given, the classes of every `required` rule are also added to
/// the `allowed` rule, and `allowed` defaults to `ascii-printable`.
pub fn parse_password_rules(s: &str, format_for_minified: bool) -> Vec<Rule> {
    let options = ParseOptions {
        format_for_minified,
    };

    parse_password_rules_with_options(s, &options).rules
}

/// Parse a password rules string, returning the diagnostics along with the rules
pub fn parse_password_rules_with_options(s: &str, options: &ParseOptions) -> ParseReport {
    let mut parser = RulesParser::new(s);
    let rules = parser.parse_rule_list();

    let mut diagnostics = parser.into_diagnostics();
    diagnostics.sort_by_key(|diagnostic| diagnostic.index);

    let rules = match rules {
        Some(rules) => merge_rules(rules, options.format_for_minified),
        None => {
            log::debug!("abandoned the rules document, {} diagnostics", diagnostics.len());
            Vec::new()
        }
    };

    ParseReport { rules, diagnostics }
}

#[cfg(test)]
mod test {
    use super::*;

    /// Helper macro to construct a CharacterClass, optionally with a range:
    /// `class!(upper)`, `class!(['a' 'b'])`, `class!(digit(1, 3))`
    macro_rules! class {
        (upper) => {CharacterClass::named(NamedClass::Upper)};
        (lower) => {CharacterClass::named(NamedClass::Lower)};
        (digit) => {CharacterClass::named(NamedClass::Digit)};
        (special) => {CharacterClass::named(NamedClass::Special)};
        (ascii) => {CharacterClass::named(NamedClass::AsciiPrintable)};
        (unicode) => {CharacterClass::named(NamedClass::Unicode)};
        ([$($c:tt)*]) => {CharacterClass::custom(vec![$($c,)*])};
        ($class:tt ($min:expr, $max:expr)) => {
            class!($class).with_range(CharRange::new($min, $max))
        };
    }

    /// This macro creates test cases. Each case parses the input without
    /// `format_for_minified` and compares the rules:
    ///
    /// tests! {
    ///     empty_string: "" => vec![...];
    ///
    ///     complex_test
    ///     "This tests something complex described in this comment":
    ///     "" => vec![...];
    /// }
    ///
    /// The last case demonstrates an optional string comment; if this is
    /// present and the test fails, the comment will be included in the
    /// assertion failure message.
    macro_rules! tests {
        ($($test:ident $($doc:literal)? : $input:expr => $expected:expr;)*) => {$(
            $(#[doc = $doc])?
            #[test]
            fn $test() {
                let expected: Vec<Rule> = $expected;
                assert_eq!(
                    parse_password_rules($input, false),
                    expected,

                    "{doc}\ninput: {input:?}",
                    doc = None $(.or(Some($doc)))? .unwrap_or(""),
                    input = $input
                );
            }
        )*};
    }

    fn report(input: &str, format_for_minified: bool) -> ParseReport {
        parse_password_rules_with_options(
            input,
            &ParseOptions {
                format_for_minified,
            },
        )
    }

    tests! {
        empty_string "An empty document still gets the defaults":
        "" => vec![Rule::Allowed(vec![class!(ascii)]), Rule::MinClasses(4)];

        whitespace_only: "  \t\n " => vec![Rule::Allowed(vec![class!(ascii)]), Rule::MinClasses(4)];

        missing_values: "allowed:; max-consecutive:; minlength:;" => vec![
            Rule::Allowed(vec![class!(ascii)]),
            Rule::MinClasses(4),
        ];

        required_and_custom_classes:
        "minlength: 21; required: lower, upper, digit; required: [!], [%];" => vec![
            Rule::Required(vec![class!(lower), class!(upper), class!(digit)]),
            Rule::Required(vec![class!(['!' '%'])]),
            Rule::Allowed(vec![class!(lower), class!(upper), class!(digit), class!(['!' '%'])]),
            Rule::MinLength(21),
            Rule::MinClasses(4),
        ];

        infeasible_ranges_are_dropped
        "Ranges allowing 3 characters can't reach a minlength of 10":
        "required: lower(0, 1); required: upper(1,1); required: digit(1,1); minlength: 10;" => vec![
            Rule::Required(vec![class!(lower)]),
            Rule::Required(vec![class!(upper)]),
            Rule::Required(vec![class!(digit)]),
            Rule::Allowed(vec![class!(ascii)]),
            Rule::MinLength(10),
            Rule::MinClasses(3),
        ];

        feasible_ranges_are_kept:
        "required: upper(1, 2); required: digit(2, 4); minlength: 4; maxlength: 12" => vec![
            Rule::Required(vec![class!(upper(1, 2))]),
            Rule::Required(vec![class!(digit(2, 4))]),
            Rule::Allowed(vec![class!(upper), class!(digit)]),
            Rule::MinLength(4),
            Rule::MaxLength(12),
            Rule::MinClasses(4),
        ];

        four_classes_absorb "All four basic classes make up ascii-printable":
        "required: upper, lower, digit, special" => vec![
            Rule::Required(vec![class!(ascii)]),
            Rule::Allowed(vec![class!(ascii)]),
            Rule::MinClasses(4),
        ];

        three_classes_stay: "required: upper, digit, special" => vec![
            Rule::Required(vec![class!(upper), class!(digit), class!(special)]),
            Rule::Allowed(vec![class!(upper), class!(digit), class!(special)]),
            Rule::MinClasses(4),
        ];

        unicode_wins: "allowed: unicode, [abc]; required: ascii-printable" => vec![
            Rule::Required(vec![class!(ascii)]),
            Rule::Allowed(vec![class!(unicode)]),
            Rule::MinClasses(4),
        ];

        class_names_ignore_case: "required: uPPeR" => vec![
            Rule::Required(vec![class!(upper)]),
            Rule::Allowed(vec![class!(upper)]),
            Rule::MinClasses(4),
        ];

        custom_class_completes_named_class: "allowed: [abcdefghijklmnopqrstuvwxyz]" => vec![
            Rule::Allowed(vec![class!(lower)]),
            Rule::MinClasses(4),
        ];

        overlapping_custom_is_absorbed: "required: upper, [AZ]" => vec![
            Rule::Required(vec![class!(upper)]),
            Rule::Allowed(vec![class!(upper)]),
            Rule::MinClasses(4),
        ];

        brackets_and_dashes: "required: [-]]; allowed: [-]" => vec![
            Rule::Required(vec![class!(['-' ']'])]),
            Rule::Allowed(vec![class!(['-' ']'])]),
            Rule::MinClasses(4),
        ];

        lengths_merge:
        "maxlength:50; max-consecutive:40; minlength:10; max-consecutive:30; minlength:12; maxlength:20;"
        => vec![
            Rule::Allowed(vec![class!(ascii)]),
            Rule::MaxConsecutive(30),
            Rule::MinLength(12),
            Rule::MaxLength(20),
            Rule::MinClasses(4),
        ];

        min_classes_clamped: "minclasses: 0" => vec![
            Rule::Allowed(vec![class!(ascii)]),
            Rule::MinClasses(1),
        ];

        min_classes_last_wins: "minclasses: 2; minclasses: 9" => vec![
            Rule::Allowed(vec![class!(ascii)]),
            Rule::MinClasses(4),
        ];

        hibp_blocklist: "blocklist: hibp; minlength: 8" => vec![
            Rule::Blocklist(vec!["hibp".to_string()]),
            Rule::Allowed(vec![class!(ascii)]),
            Rule::MinLength(8),
            Rule::MinClasses(4),
        ];

        unknown_rule_keeps_prefix "An unknown rule name stops parsing, but earlier rules are kept":
        "minlength: 8; dummy: upper; maxlength: 3" => vec![
            Rule::Allowed(vec![class!(ascii)]),
            Rule::MinLength(8),
            Rule::MinClasses(4),
        ];

        missing_colon_keeps_prefix: "required: digit; minlength 8" => vec![
            Rule::Required(vec![class!(digit)]),
            Rule::Allowed(vec![class!(digit)]),
            Rule::MinClasses(4),
        ];

        unknown_class_is_skipped: "required: letters, digit; minlength: 8" => vec![
            Rule::Required(vec![class!(digit)]),
            Rule::Allowed(vec![class!(digit)]),
            Rule::MinLength(8),
            Rule::MinClasses(4),
        ];

        missing_value_separator "Two values without a comma abandon the document":
        "minlength: 8; required: upper lower" => vec![];

        unterminated_custom_class: "minlength: 8; required: [abc" => vec![];

        missing_rule_separator: "minlength: 8 maxlength: 3" => vec![];

        trailing_comma: "allowed: upper,," => vec![];

        named_class_beats_ranged_custom
        "The named value represents lower, the ranged custom keeps its own range":
        "required: [cab](1,2), lower" => vec![
            Rule::Required(vec![class!(lower), class!(['a' 'b' 'c'](1, 2))]),
            Rule::Allowed(vec![class!(lower)]),
            Rule::MinClasses(4),
        ];

        ranged_cover_of_named_class_stays_custom
        "A ranged custom spelling out lower doesn't take over the named lower":
        "required: [abcdefghijklmnopqrstuvwxyz](1,2), lower" => vec![
            Rule::Required(vec![
                class!(lower),
                CharacterClass::custom('a'..='z').with_range(CharRange::new(1, 2)),
            ]),
            Rule::Allowed(vec![class!(lower)]),
            Rule::MinClasses(4),
        ];

        required_copies_complete_allowed
        "Dropped ranges leave all four classes allowed, whatever ranges allowed carries":
        "required: upper(1,2); allowed: digit(2,3); minlength: 4;" => vec![
            Rule::Required(vec![class!(upper)]),
            Rule::Allowed(vec![class!(ascii)]),
            Rule::MinLength(4),
            Rule::MinClasses(1),
        ];
    }

    #[test]
    fn minified_output_stays_close_to_the_source() {
        assert_eq!(
            parse_password_rules("required: digit; allowed: [a-]]; minlength: 4", true),
            vec![
                Rule::Required(vec![class!(digit)]),
                Rule::Allowed(vec![class!(['a' ']'])]),
                Rule::MinLength(4),
                Rule::MinClasses(4),
            ]
        );

        assert_eq!(parse_password_rules("", true), vec![Rule::MinClasses(4)]);
    }

    #[test]
    fn malformed_ranges_are_dropped() {
        let input = "required: [!?.](0, 5), [%](-1, 10); allowed: lower(-1,10); \
                     minlength: 16; maxlength: 20; blocklist: default;";
        let report = report(input, false);

        let malformed: Vec<&Diagnostic> = report
            .diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.kind == DiagnosticKind::MalformedRange)
            .collect();
        assert_eq!(malformed.len(), 2);
        assert!(malformed
            .iter()
            .all(|diagnostic| diagnostic.severity == Severity::Warning));
        assert!(!report.has_errors());

        // The unbounded [%] can't fit into a maxlength of 20, so every range goes
        assert_eq!(
            report.rules,
            vec![
                Rule::Required(vec![class!(['!' '%' '.' '?'])]),
                Rule::Blocklist(Blocklist::global().words()),
                Rule::Allowed(vec![class!(ascii)]),
                Rule::MinLength(16),
                Rule::MaxLength(20),
                Rule::MinClasses(1),
            ]
        );
    }

    #[test]
    fn diagnostics_are_in_input_order() {
        let input = "allowed: [a-b], nope; required: [\u{7f}x], upper(1,x); maxlength: 99999999999";
        let report = report(input, false);

        let indices: Vec<usize> = report.diagnostics.iter().map(|d| d.index).collect();
        let mut sorted = indices.clone();
        sorted.sort_unstable();

        assert_eq!(indices, sorted);
        assert_eq!(
            report
                .diagnostics
                .iter()
                .map(|d| d.kind.clone())
                .collect::<Vec<_>>(),
            vec![
                DiagnosticKind::MisplacedDash,
                DiagnosticKind::UnknownClassName("nope".to_string()),
                DiagnosticKind::NonPrintableCharacter('\u{7f}'),
                DiagnosticKind::MalformedRange,
                DiagnosticKind::MalformedInteger,
            ]
        );
    }

    #[test]
    fn strict_parsing() {
        let rules = report("required: upper; allowed: [ab-]", false).into_result();
        assert!(rules.is_ok());

        let input = "required: letters; minlength: 8";
        let err = report(input, false).into_result().unwrap_err();

        assert_eq!(err.errors().count(), 1);
        assert_eq!(err.diagnostics[0].line, 1);
        assert_eq!(err.diagnostics[0].column, 11);
        assert!(err.to_string_pretty(input).is_ok());

        assert!(report("required: [abc", false).has_errors());
    }

    #[test]
    fn rendered_rules_parse_back_the_same() {
        let documents = [
            "minlength: 21; required: lower, upper, digit; required: [!], [%];",
            "required: upper(1, 2); required: digit(2, 4); minlength: 4; maxlength: 12",
            "required: [-]]; allowed: [-xyz]; max-consecutive: 3; blocklist: hibp",
            "required: lower(0, 1); required: upper(1,1); required: digit(1,1); minlength: 10;",
            "blocklist: default; minclasses: 2",
            "required: upper(1,2); allowed: digit(2,3); minlength: 4;",
            "allowed: digit; required: upper",
            "allowed: digit(0, 3), digit, [x](1, 2); required: [0123456789](1, 4)",
            "required: [-abc](1, 2), lower; allowed: [xy]]",
            "",
        ];

        for format_for_minified in [false, true] {
            for document in documents {
                let rules = parse_password_rules(document, format_for_minified);
                let rendered = format_rules(&rules);
                let report = report(&rendered, format_for_minified);

                assert_eq!(report.rules, rules, "{document:?} rendered as {rendered:?}");
                assert!(report.diagnostics.is_empty(), "{rendered:?}");
            }
        }
    }

    /// Every combination of these parts is parsed in both modes
    const REQUIRED: [&str; 4] = [
        "",
        "required: upper(1,2); ",
        "required: lower, [ab](1,3); ",
        "required: digit(1,1), special(2,4); ",
    ];
    const ALLOWED: [&str; 4] = [
        "",
        "allowed: digit(2,3); ",
        "allowed: [xyz], lower(0,5); ",
        "allowed: upper, [!?](1,4); ",
    ];
    const LENGTHS: [&str; 5] = [
        "",
        "minlength: 4; ",
        "maxlength: 3; ",
        "minlength: 0; ",
        "minlength: 20; maxlength: 30; ",
    ];

    /// Remaining ranges on required classes always fit the length limits
    fn assert_ranges_fit(rules: &[Rule], document: &str) {
        let classes: Vec<&CharacterClass> = rules
            .iter()
            .filter_map(|rule| match rule {
                Rule::Required(classes) => Some(classes),
                _ => None,
            })
            .flatten()
            .collect();

        if classes.iter().all(|class| class.range().is_none()) {
            return;
        }

        let total = |bound: fn(CharRange) -> u32| -> u32 {
            classes
                .iter()
                .map(|class| class.range().map_or(128, bound))
                .sum()
        };
        let (min_total, max_total) = (total(|range| range.min), total(|range| range.max));

        for rule in rules {
            match *rule {
                Rule::MaxLength(max_length) => {
                    assert!(min_total <= max_length, "{document:?} => {rules:?}")
                }
                Rule::MinLength(min_length) => assert!(
                    min_length != 0 && max_total >= min_length,
                    "{document:?} => {rules:?}"
                ),
                _ => {}
            }
        }
    }

    #[test]
    fn merged_rules_are_consistent_and_stable() {
        for required in REQUIRED {
            for allowed in ALLOWED {
                for lengths in LENGTHS {
                    let document = format!("{required}{allowed}{lengths}");

                    for format_for_minified in [false, true] {
                        let rules = report(&document, format_for_minified).rules;
                        assert_ranges_fit(&rules, &document);

                        let rendered = format_rules(&rules);
                        let again = report(&rendered, format_for_minified);
                        assert_eq!(again.rules, rules, "{document:?} rendered as {rendered:?}");
                        assert!(again.diagnostics.is_empty(), "{rendered:?}");
                    }
                }
            }
        }
    }
}
