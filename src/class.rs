//! Character classes that `required` and `allowed` rules are made of

use std::fmt::{self, Display, Formatter};
use std::ops::RangeInclusive;

use serde::ser::{Serialize, SerializeMap, Serializer};

pub(crate) const ASCII_RANGE: RangeInclusive<char> = ' '..='~';
pub(crate) const UPPER_RANGE: RangeInclusive<char> = 'A'..='Z';
pub(crate) const LOWER_RANGE: RangeInclusive<char> = 'a'..='z';
pub(crate) const DIGIT_RANGE: RangeInclusive<char> = '0'..='9';

/// The printable characters that are neither letters nor digits, in four runs
pub(crate) const SPECIAL_RANGES: [RangeInclusive<char>; 4] =
    [' '..='/', ':'..='@', '['..='`', '{'..='~'];

/// The classes that can be referred to by name
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamedClass {
    /// A-Z
    Upper,
    /// a-z
    Lower,
    /// 0-9
    Digit,
    /// -~!@#$%^&*_+=`|(){}[:;"'<>,.?] and space
    Special,
    /// All unicode characters. Treated as ascii-printable when expanded to characters.
    Unicode,
    /// All ASCII printable characters
    AsciiPrintable,
}

impl NamedClass {
    /// The four classes that together make up ascii-printable
    pub const BASIC: [NamedClass; 4] = [
        NamedClass::Upper,
        NamedClass::Lower,
        NamedClass::Digit,
        NamedClass::Special,
    ];

    /// Look up a class by its identifier, ignoring ASCII case
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        use NamedClass::*;

        [Upper, Lower, Digit, Special, Unicode, AsciiPrintable]
            .into_iter()
            .find(|class| class.as_str().eq_ignore_ascii_case(identifier))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NamedClass::Upper => "upper",
            NamedClass::Lower => "lower",
            NamedClass::Digit => "digit",
            NamedClass::Special => "special",
            NamedClass::Unicode => "unicode",
            NamedClass::AsciiPrintable => "ascii-printable",
        }
    }

    /// Unicode and ascii-printable absorb every other class
    pub fn is_universal(self) -> bool {
        matches!(self, NamedClass::Unicode | NamedClass::AsciiPrintable)
    }

    /// The characters this class consists of
    pub fn chars(self) -> Vec<char> {
        match self {
            NamedClass::Upper => UPPER_RANGE.collect(),
            NamedClass::Lower => LOWER_RANGE.collect(),
            NamedClass::Digit => DIGIT_RANGE.collect(),
            NamedClass::Special => SPECIAL_RANGES.iter().cloned().flatten().collect(),
            NamedClass::Unicode | NamedClass::AsciiPrintable => ASCII_RANGE.collect(),
        }
    }

    /// The basic class a printable character belongs to
    pub fn of_char(c: char) -> Option<Self> {
        NamedClass::BASIC
            .into_iter()
            .find(|class| class.ranges().iter().any(|range| range.contains(&c)))
    }

    pub(crate) fn ranges(self) -> &'static [RangeInclusive<char>] {
        const UPPER: [RangeInclusive<char>; 1] = [UPPER_RANGE];
        const LOWER: [RangeInclusive<char>; 1] = [LOWER_RANGE];
        const DIGIT: [RangeInclusive<char>; 1] = [DIGIT_RANGE];
        const ASCII: [RangeInclusive<char>; 1] = [ASCII_RANGE];

        match self {
            NamedClass::Upper => &UPPER,
            NamedClass::Lower => &LOWER,
            NamedClass::Digit => &DIGIT,
            NamedClass::Special => &SPECIAL_RANGES,
            NamedClass::Unicode | NamedClass::AsciiPrintable => &ASCII,
        }
    }
}

impl Display for NamedClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How many characters of a class must (or may) appear, written `(min, max)`.
///
/// Both bounds are present or the whole range is absent; they are never both
/// zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CharRange {
    pub min: u32,
    pub max: u32,
}

impl CharRange {
    /// Build a range, rejecting the `(0, 0)` range
    pub fn new(min: u32, max: u32) -> Option<Self> {
        if min == 0 && max == 0 {
            None
        } else {
            Some(Self { min, max })
        }
    }
}

impl Display for CharRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.min, self.max)
    }
}

/// A value of a `required` or `allowed` rule
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CharacterClass {
    /// A class referred to by name, like `upper`
    Named {
        name: NamedClass,
        range: Option<CharRange>,
    },
    /// A custom list between \[\] of ascii characters. Order is first-seen and
    /// duplicates are kept as written.
    Custom {
        characters: Vec<char>,
        range: Option<CharRange>,
    },
}

impl CharacterClass {
    pub fn named(name: NamedClass) -> Self {
        CharacterClass::Named { name, range: None }
    }

    pub fn custom(characters: impl IntoIterator<Item = char>) -> Self {
        CharacterClass::Custom {
            characters: characters.into_iter().collect(),
            range: None,
        }
    }

    /// Return this class with `range` attached in place of any existing one
    pub fn with_range(self, range: Option<CharRange>) -> Self {
        match self {
            CharacterClass::Named { name, .. } => CharacterClass::Named { name, range },
            CharacterClass::Custom { characters, .. } => {
                CharacterClass::Custom { characters, range }
            }
        }
    }

    /// Return a copy with no range attached
    pub fn without_range(&self) -> Self {
        self.clone().with_range(None)
    }

    pub fn range(&self) -> Option<CharRange> {
        match self {
            CharacterClass::Named { range, .. } | CharacterClass::Custom { range, .. } => *range,
        }
    }

    pub fn name(&self) -> Option<NamedClass> {
        match self {
            CharacterClass::Named { name, .. } => Some(*name),
            CharacterClass::Custom { .. } => None,
        }
    }

    pub fn is_universal(&self) -> bool {
        self.name().map_or(false, NamedClass::is_universal)
    }

    /// Render the class for an HTML attribute value: rule syntax with `"`
    /// escaped as `&quot;`
    pub fn to_html_string(&self) -> String {
        self.to_string().replace('"', "&quot;")
    }

    /// The characters a character class consists of
    pub fn chars(&self) -> Vec<char> {
        match self {
            CharacterClass::Named { name, .. } => name.chars(),
            CharacterClass::Custom { characters, .. } => characters.clone(),
        }
    }
}

impl Display for CharacterClass {
    /// Render the class in rule syntax. In a custom class `-` is written first
    /// and `]` last, which is the only placement the parser accepts.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            CharacterClass::Named { name, .. } => write!(f, "{name}")?,
            CharacterClass::Custom { characters, .. } => {
                f.write_str("[")?;
                if characters.contains(&'-') {
                    f.write_str("-")?;
                }
                characters
                    .iter()
                    .filter(|&&c| c != '-' && c != ']')
                    .try_for_each(|c| write!(f, "{c}"))?;
                if characters.contains(&']') {
                    f.write_str("]")?;
                }
                f.write_str("]")?;
            }
        }

        match self.range() {
            Some(range) => write!(f, "{range}"),
            None => Ok(()),
        }
    }
}

impl Serialize for CharacterClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let range = self.range();
        let len = if range.is_some() { 3 } else { 1 };
        let mut map = serializer.serialize_map(Some(len))?;

        match self {
            CharacterClass::Named { name, .. } => map.serialize_entry("name", name)?,
            CharacterClass::Custom { characters, .. } => {
                map.serialize_entry("characters", characters)?
            }
        }

        if let Some(range) = range {
            map.serialize_entry("minChars", &range.min)?;
            map.serialize_entry("maxChars", &range.max)?;
        }

        map.end()
    }
}
