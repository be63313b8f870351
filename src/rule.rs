//! Password rules, the output of parsing

use std::fmt::{self, Display, Formatter};

use itertools::Itertools;
use serde::Serialize;

use crate::blocklist;
use crate::class::CharacterClass;

/// The names a rule can have
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RuleKind {
    Allowed,
    Required,
    MaxConsecutive,
    MinLength,
    MaxLength,
    MinClasses,
    Blocklist,
}

impl RuleKind {
    /// Look up a rule kind by its exact (case-sensitive) name
    pub fn from_name(name: &str) -> Option<Self> {
        use RuleKind::*;

        [
            Allowed,
            Required,
            MaxConsecutive,
            MinLength,
            MaxLength,
            MinClasses,
            Blocklist,
        ]
        .into_iter()
        .find(|kind| kind.as_str() == name)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RuleKind::Allowed => "allowed",
            RuleKind::Required => "required",
            RuleKind::MaxConsecutive => "max-consecutive",
            RuleKind::MinLength => "minlength",
            RuleKind::MaxLength => "maxlength",
            RuleKind::MinClasses => "minclasses",
            RuleKind::Blocklist => "blocklist",
        }
    }
}

impl Display for RuleKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single password rule.
///
/// Serializes as `{"name": "minlength", "value": 8}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "name", content = "value")]
pub enum Rule {
    /// Classes whose characters the password may be made of
    #[serde(rename = "allowed")]
    Allowed(Vec<CharacterClass>),
    /// Classes of which the password must contain at least one character.
    /// Each `required` rule is a separate requirement.
    #[serde(rename = "required")]
    Required(Vec<CharacterClass>),
    /// The maximum number of identical consecutive characters
    #[serde(rename = "max-consecutive")]
    MaxConsecutive(u32),
    #[serde(rename = "minlength")]
    MinLength(u32),
    #[serde(rename = "maxlength")]
    MaxLength(u32),
    /// The minimum number of character classes the password must draw from,
    /// between 1 and 4
    #[serde(rename = "minclasses")]
    MinClasses(u32),
    /// Passwords that must be rejected. Either a single source name like
    /// `hibp`, to be looked up by the host, or the expanded default list.
    #[serde(rename = "blocklist")]
    Blocklist(Vec<String>),
}

impl Rule {
    pub fn kind(&self) -> RuleKind {
        match self {
            Rule::Allowed(_) => RuleKind::Allowed,
            Rule::Required(_) => RuleKind::Required,
            Rule::MaxConsecutive(_) => RuleKind::MaxConsecutive,
            Rule::MinLength(_) => RuleKind::MinLength,
            Rule::MaxLength(_) => RuleKind::MaxLength,
            Rule::MinClasses(_) => RuleKind::MinClasses,
            Rule::Blocklist(_) => RuleKind::Blocklist,
        }
    }

    /// The character classes of a `required` or `allowed` rule
    pub fn classes(&self) -> Option<&[CharacterClass]> {
        match self {
            Rule::Allowed(classes) | Rule::Required(classes) => Some(classes.as_slice()),
            _ => None,
        }
    }

    /// The number of an integer-valued rule
    pub fn number(&self) -> Option<u32> {
        match self {
            Rule::MaxConsecutive(n)
            | Rule::MinLength(n)
            | Rule::MaxLength(n)
            | Rule::MinClasses(n) => Some(*n),
            _ => None,
        }
    }
}

impl Display for Rule {
    /// Render the rule in rule syntax, without the trailing `;`
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.kind())?;

        match self {
            Rule::Allowed(classes) | Rule::Required(classes) => {
                write!(f, "{}", classes.iter().join(", "))
            }
            Rule::MaxConsecutive(n) | Rule::MinLength(n) | Rule::MaxLength(n) | Rule::MinClasses(n) => {
                write!(f, "{n}")
            }
            // Anything but a source name can only have come from `default`
            Rule::Blocklist(words) => match words.as_slice() {
                [source] if blocklist::SOURCES.contains(&source.as_str()) => {
                    write!(f, "{source}")
                }
                _ => f.write_str(blocklist::DEFAULT_NAME),
            },
        }
    }
}

/// Render a list of rules as a rules document, which parses back into the
/// same rules.
pub fn format_rules(rules: &[Rule]) -> String {
    rules.iter().map(|rule| format!("{rule};")).join(" ")
}
