//! Diagnostics produced while parsing, and the error type built from them

use std::fmt::{self, Display, Formatter, Write};
use std::error::Error;

use itertools::{Itertools, Position::*};
use nom::error::{ErrorKind, ParseError};
use pretty_lint::{Position, PrettyLint, Span};

use crate::rule::RuleKind;

/// Different kinds of things that can be expected at a given location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    /// Expected EoF (End of File)
    Eof,
    /// Expected a character
    Char(char),
    /// Expected a number
    Number,
    /// Expected the name of a rule, like "minlength"
    RuleName,
    /// Expected a character class name or a custom class
    ClassValue,
    /// Expected an identifier, like "default"
    Identifier,
}

impl Display for Expected {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Eof => write!(f, "EoF"),
            Expected::Number => write!(f, "a number"),
            Expected::Char(c) => write!(f, "{c:?}"),
            Expected::RuleName => write!(f, "a rule name"),
            Expected::ClassValue => write!(f, "a character class"),
            Expected::Identifier => write!(f, "an identifier"),
        }
    }
}

/// How bad a diagnostic is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// The input was adjusted and parsing carried on
    Warning,
    /// A value, a rule, or the whole document was dropped
    Error,
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// What went wrong at a diagnostic's location
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Structural error: none of these were found
    Expected(&'static [Expected]),
    UnknownRuleName(String),
    UnknownClassName(String),
    UnknownBlocklistName(String),
    /// An integer value followed by something other than `;` or EoF, or one
    /// too large to represent
    MalformedInteger,
    /// A `(min, max)` range without two numbers, or with both of them zero
    MalformedRange,
    /// A range that hit `;` or EoF before its closing `)`
    UnterminatedRange,
    /// A `-` that was not the first character of a custom class
    MisplacedDash,
    NonPrintableCharacter(char),
    EmptyCustomClass,
    UnterminatedCustomClass,
    /// A rule with nothing after its `:`
    EmptyValue(RuleKind),
}

impl Display for DiagnosticKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::Expected(expected) => match *expected {
                [] => write!(f, "unexpected input"),
                [exp] => write!(f, "expected {exp}"),
                expected => {
                    write!(f, "expected one of ")?;
                    expected
                        .iter()
                        .with_position()
                        .try_for_each(|positioned| match positioned {
                            (Only, exp) => write!(f, "{exp}"),
                            (First, exp) | (Middle, exp) => write!(f, "{exp}, "),
                            (Last, exp) => write!(f, "or {exp}"),
                        })
                }
            },
            DiagnosticKind::UnknownRuleName(name) => write!(f, "unrecognized rule name {name:?}"),
            DiagnosticKind::UnknownClassName(name) => {
                write!(f, "unrecognized character class {name:?}")
            }
            DiagnosticKind::UnknownBlocklistName(name) => {
                write!(f, "unrecognized blocklist {name:?}")
            }
            DiagnosticKind::MalformedInteger => write!(f, "malformed integer"),
            DiagnosticKind::MalformedRange => {
                write!(f, "malformed range; expected two numbers that are not both zero")
            }
            DiagnosticKind::UnterminatedRange => write!(f, "range is missing its closing ')'"),
            DiagnosticKind::MisplacedDash => write!(
                f,
                "ignoring '-'; a '-' may only appear as the first character in a character class"
            ),
            DiagnosticKind::NonPrintableCharacter(c) => {
                write!(f, "ignoring {c:?}; only ASCII printable characters are allowed")
            }
            DiagnosticKind::EmptyCustomClass => write!(f, "ignoring empty character class"),
            DiagnosticKind::UnterminatedCustomClass => {
                write!(f, "character class is missing its closing ']'")
            }
            DiagnosticKind::EmptyValue(kind) => write!(f, "rule {kind} has no value"),
        }
    }
}

/// A single diagnostic at a location in the input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The byte index of the diagnostic location
    pub index: usize,

    /// The line number (starting with 1) of the diagnostic location
    pub line: u32,

    /// The column number (starting with 1) of the diagnostic location
    pub column: u32,

    pub severity: Severity,

    pub kind: DiagnosticKind,
}

impl Diagnostic {
    fn span(&self) -> Span {
        let (line, col) = (self.line as usize, self.column as usize);

        Span {
            start: Position { line, col },
            end: Position { line, col },
        }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} at {}:{}",
            self.severity, self.kind, self.line, self.column
        )
    }
}

/// This type is used while parsing is running; it knows only the tail end of
/// the input at the time the diagnostic was raised. It can be combined with
/// the original input to produce an absolute location via `Diagnostic`.
#[derive(Debug, Clone)]
pub(crate) struct DiagnosticContext<'a> {
    input_tail: &'a str,
    severity: Severity,
    kind: DiagnosticKind,
}

impl<'a> DiagnosticContext<'a> {
    pub fn error(input_tail: &'a str, kind: DiagnosticKind) -> Self {
        Self {
            input_tail,
            severity: Severity::Error,
            kind,
        }
    }

    pub fn warning(input_tail: &'a str, kind: DiagnosticKind) -> Self {
        Self {
            input_tail,
            severity: Severity::Warning,
            kind,
        }
    }

    /// Given the original input string, extract the absolute location of a
    /// DiagnosticContext
    pub fn extract_context(self, input: &'a str) -> Diagnostic {
        // Every tail handed to the parsers is a suffix of the input
        let offset = input.len().saturating_sub(self.input_tail.len());

        let prefix = &input[..offset];

        let line_number = prefix.chars().filter(|&c| c == '\n').count() + 1;
        let last_line_start = prefix
            .char_indices()
            .rev()
            .find(|&(_, c)| c == '\n')
            .map(|(index, _)| index + 1)
            .unwrap_or(0);
        let column_number = prefix[last_line_start..].chars().count() + 1;

        Diagnostic {
            line: line_number.try_into().unwrap_or(u32::MAX),
            column: column_number.try_into().unwrap_or(u32::MAX),
            index: offset,
            severity: self.severity,
            kind: self.kind,
        }
    }
}

impl<'a> ParseError<&'a str> for DiagnosticContext<'a> {
    fn from_error_kind(input: &'a str, kind: ErrorKind) -> Self {
        let expected: &'static [Expected] = match kind {
            ErrorKind::Eof => &[Expected::Eof],
            ErrorKind::Digit => &[Expected::Number],
            ErrorKind::TakeWhile1 => &[Expected::Identifier],
            _ => &[],
        };

        Self::error(input, DiagnosticKind::Expected(expected))
    }

    fn append(_: &'a str, _: ErrorKind, other: Self) -> Self {
        other
    }

    fn from_char(input: &'a str, c: char) -> Self {
        let expected: &'static [Expected] = match c {
            ':' => &[Expected::Char(':')],
            '(' => &[Expected::Char('(')],
            '[' => &[Expected::Char('[')],
            _ => &[],
        };

        Self::error(input, DiagnosticKind::Expected(expected))
    }
}

/// Error that can result from strictly parsing password rules: parsing
/// produced at least one error-severity diagnostic.
#[derive(Debug, Clone)]
pub struct PasswordRulesError {
    /// Every diagnostic raised while parsing, warnings included, in input order
    pub diagnostics: Vec<Diagnostic>,
}

impl PasswordRulesError {
    /// Diagnostics with `Severity::Error`
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.severity == Severity::Error)
    }

    /// Build a pretty version of the error given the original input string.
    ///
    /// The default `Display` implementation produces helpful output:
    ///
    /// ```text
    /// error: unrecognized character class "letters" at 1:11
    /// ```
    ///
    /// It doesn't have access to the original input string, however, so it's limited
    /// in what it can do. This method renders each location with a source excerpt:
    ///
    /// ```text
    /// error: parsing failed
    ///  --> 1:11
    ///   |
    /// 1 | required: letters; minlength: 8
    ///   |           ^ unrecognized character class "letters"
    /// ```
    pub fn to_string_pretty(&self, s: &str) -> Result<String, fmt::Error> {
        let mut lint_string = String::new();

        if self.diagnostics.is_empty() {
            let lint = PrettyLint::error(s)
                .with_message("parsing failed")
                .with_inline_message("unknown error");
            write!(lint_string, "{lint}")?;
            return Ok(lint_string);
        }

        // Group the diagnostics by location, so that several diagnostics at the same
        // location can be shown together
        let groups = self
            .diagnostics
            .iter()
            .chunk_by(|diagnostic| (diagnostic.line, diagnostic.column));

        groups.into_iter().try_for_each(|(_, group)| {
            let group: Vec<&Diagnostic> = group.collect();
            let inline_message = group.iter().map(|d| d.kind.to_string()).join("; ");
            let message = match group.iter().map(|d| d.severity).max() {
                Some(Severity::Error) => "parsing failed",
                _ => "input was adjusted",
            };

            let lint = PrettyLint::error(s)
                .with_message(message)
                .with_inline_message(&inline_message)
                .at(group[0].span());

            write!(lint_string, "{lint}")
        })?;

        Ok(lint_string)
    }
}

impl Display for PasswordRulesError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self.diagnostics.as_slice() {
            [] => write!(f, "unknown error"),
            [diagnostic] => write!(f, "{diagnostic}"),
            diagnostics => diagnostics
                .iter()
                .with_position()
                .try_for_each(|positioned| match positioned {
                    (Last, diagnostic) | (Only, diagnostic) => write!(f, "{diagnostic}"),
                    (_, diagnostic) => writeln!(f, "{diagnostic}"),
                }),
        }
    }
}

impl Error for PasswordRulesError {}
