//! Parsing of a rules document into raw, unmerged rules.
//!
//! Every sub-parser takes the unconsumed tail of the input and returns the
//! tail it stopped at, nom style. Problems that only affect a value are
//! recorded as diagnostics and parsing carries on. A `nom::Err::Error` stops
//! the document with the rules parsed so far; a `nom::Err::Failure` abandons
//! the document.

use nom::{
    bytes::complete::take_while1,
    character::complete::{char, digit1},
    IResult,
};

use crate::blocklist::{self, Blocklist};
use crate::class::{CharRange, CharacterClass, NamedClass};
use crate::error::{Diagnostic, DiagnosticContext, DiagnosticKind, Expected, Severity};
use crate::rule::{Rule, RuleKind};
use crate::scanner::{is_digit, is_identifier_char, is_printable, is_whitespace, trim_whitespace};

type PResult<'a, O> = IResult<&'a str, O, DiagnosticContext<'a>>;

const PROPERTY_SEPARATOR: char = ';';
const VALUE_SEPARATOR: char = ',';
const VALUE_START: char = ':';
const CLASS_START: char = '[';
const CLASS_END: char = ']';
const RANGE_START: char = '(';
const RANGE_END: char = ')';
const RANGE_SEPARATOR: char = ',';

/// Split the first character off a tail
fn split_first(tail: &str) -> Option<(char, &str)> {
    let mut chars = tail.chars();
    chars.next().map(|c| (c, chars.as_str()))
}

fn peek(tail: &str) -> Option<char> {
    tail.chars().next()
}

/// Parse an identifier, which is 1 or more identifier characters
fn parse_identifier(input: &str) -> PResult<'_, &str> {
    take_while1(is_identifier_char)(input)
}

pub(crate) struct RulesParser<'a> {
    input: &'a str,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> RulesParser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            diagnostics: Vec::new(),
        }
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    fn record(&mut self, context: DiagnosticContext<'a>) {
        let diagnostic = context.extract_context(self.input);

        match diagnostic.severity {
            Severity::Warning => log::warn!("{diagnostic}"),
            Severity::Error => log::error!("{diagnostic}"),
        }

        self.diagnostics.push(diagnostic);
    }

    fn warn(&mut self, at: &'a str, kind: DiagnosticKind) {
        self.record(DiagnosticContext::warning(at, kind));
    }

    fn error(&mut self, at: &'a str, kind: DiagnosticKind) {
        self.record(DiagnosticContext::error(at, kind));
    }

    /// Parse a whole document. Returns `None` if the document has to be
    /// abandoned; otherwise the rules with a value, in input order.
    pub fn parse_rule_list(&mut self) -> Option<Vec<Rule>> {
        let mut rules = Vec::new();
        let mut tail = trim_whitespace(self.input);

        while let Some(c) = peek(tail) {
            if !is_identifier_char(c) {
                self.error(tail, DiagnosticKind::Expected(&[Expected::RuleName]));
                return Some(rules);
            }

            match self.parse_rule(tail) {
                Ok((rest, rule)) => {
                    rules.extend(rule);
                    tail = rest;
                }
                Err(nom::Err::Error(context)) => {
                    self.record(context);
                    return Some(rules);
                }
                Err(nom::Err::Failure(context)) => {
                    self.record(context);
                    return None;
                }
                Err(nom::Err::Incomplete(..)) => unreachable!(),
            }

            tail = trim_whitespace(tail);
            match split_first(tail) {
                None => break,
                Some((PROPERTY_SEPARATOR, rest)) => tail = trim_whitespace(rest),
                Some(_) => {
                    self.error(
                        tail,
                        DiagnosticKind::Expected(&[Expected::Char(PROPERTY_SEPARATOR), Expected::Eof]),
                    );
                    return None;
                }
            }
        }

        Some(rules)
    }

    /// Parse a single `name: value` rule. The separating `;` is left for the
    /// caller. A rule without a usable value is returned as `None`.
    pub fn parse_rule(&mut self, input: &'a str) -> PResult<'a, Option<Rule>> {
        let (tail, name) = parse_identifier(input)?;

        let kind = RuleKind::from_name(name).ok_or_else(|| {
            nom::Err::Error(DiagnosticContext::error(
                input,
                DiagnosticKind::UnknownRuleName(name.to_string()),
            ))
        })?;

        let (tail, _) = char(VALUE_START)(trim_whitespace(tail))?;
        let tail = trim_whitespace(tail);

        if matches!(peek(tail), None | Some(PROPERTY_SEPARATOR)) {
            self.warn(input, DiagnosticKind::EmptyValue(kind));
            return Ok((tail, None));
        }

        match kind {
            RuleKind::Allowed | RuleKind::Required => {
                let (tail, classes) = self.parse_class_list(tail)?;
                let rule = if classes.is_empty() {
                    None
                } else if kind == RuleKind::Allowed {
                    Some(Rule::Allowed(classes))
                } else {
                    Some(Rule::Required(classes))
                };
                Ok((tail, rule))
            }
            RuleKind::MaxConsecutive
            | RuleKind::MinLength
            | RuleKind::MaxLength
            | RuleKind::MinClasses => {
                let (tail, number) = self.parse_integer(tail);
                let rule = number.map(|n| match kind {
                    RuleKind::MaxConsecutive => Rule::MaxConsecutive(n),
                    RuleKind::MinLength => Rule::MinLength(n),
                    RuleKind::MaxLength => Rule::MaxLength(n),
                    _ => Rule::MinClasses(n),
                });
                Ok((tail, rule))
            }
            RuleKind::Blocklist => {
                let (tail, words) = self.parse_blocklist_value(tail)?;
                Ok((tail, words.map(Rule::Blocklist)))
            }
        }
    }

    /// Parse a number, which is 1 or more consecutive digits followed by `;`
    /// or EoF. On a malformed number, the diagnostic points at its start and
    /// the returned tail is where scanning stopped.
    pub fn parse_integer(&mut self, input: &'a str) -> (&'a str, Option<u32>) {
        let (tail, digits) = digit1::<_, DiagnosticContext<'a>>(input).unwrap_or((input, ""));
        let value = digits.parse::<u32>().ok();

        let terminated = matches!(peek(trim_whitespace(tail)), None | Some(PROPERTY_SEPARATOR));

        match value {
            Some(value) if terminated => (tail, Some(value)),
            _ => {
                self.error(input, DiagnosticKind::MalformedInteger);
                let stop = if terminated { tail } else { trim_whitespace(tail) };
                (stop, None)
            }
        }
    }

    /// Parse the comma separated values of a `required` or `allowed` rule,
    /// each of which may be followed by a range. The list ends at `;` or EoF.
    pub fn parse_class_list(&mut self, input: &'a str) -> PResult<'a, Vec<CharacterClass>> {
        let mut classes = Vec::new();
        let mut tail = input;

        loop {
            match peek(tail) {
                Some(c) if is_identifier_char(c) => {
                    let (rest, identifier) = parse_identifier(tail)?;
                    let (rest, range) = self.parse_optional_range(rest);

                    match NamedClass::from_identifier(identifier) {
                        Some(name) => classes.push(CharacterClass::Named { name, range }),
                        None => self.error(
                            tail,
                            DiagnosticKind::UnknownClassName(identifier.to_string()),
                        ),
                    }
                    tail = rest;
                }
                Some(CLASS_START) => {
                    let (rest, characters) = self.parse_custom_class(tail)?;
                    let (rest, range) = self.parse_optional_range(rest);

                    if characters.is_empty() {
                        self.warn(tail, DiagnosticKind::EmptyCustomClass);
                    } else {
                        classes.push(CharacterClass::Custom { characters, range });
                    }
                    tail = rest;
                }
                _ => {
                    return Err(nom::Err::Failure(DiagnosticContext::error(
                        tail,
                        DiagnosticKind::Expected(&[Expected::ClassValue]),
                    )))
                }
            }

            tail = trim_whitespace(tail);
            match split_first(tail) {
                None | Some((PROPERTY_SEPARATOR, _)) => return Ok((tail, classes)),
                Some((VALUE_SEPARATOR, rest)) => tail = trim_whitespace(rest),
                Some(_) => {
                    return Err(nom::Err::Failure(DiagnosticContext::error(
                        tail,
                        DiagnosticKind::Expected(&[
                            Expected::Char(VALUE_SEPARATOR),
                            Expected::Char(PROPERTY_SEPARATOR),
                            Expected::Eof,
                        ]),
                    )))
                }
            }
        }
    }

    /// Parse a custom character class, which is a series of ascii-printable
    /// characters enclosed by []. A `-` is only kept as the first character;
    /// a `]]` is a literal `]` followed by the closing bracket.
    pub fn parse_custom_class(&mut self, input: &'a str) -> PResult<'a, Vec<char>> {
        let (mut tail, _) = char(CLASS_START)(input)?;
        let mut characters = Vec::new();
        let mut first = true;

        loop {
            let (c, rest) = split_first(tail).ok_or_else(|| {
                nom::Err::Failure(DiagnosticContext::error(
                    input,
                    DiagnosticKind::UnterminatedCustomClass,
                ))
            })?;

            match c {
                CLASS_END => match split_first(rest) {
                    Some((CLASS_END, after)) => {
                        characters.push(CLASS_END);
                        return Ok((after, characters));
                    }
                    _ => return Ok((rest, characters)),
                },
                '-' if !first => self.warn(tail, DiagnosticKind::MisplacedDash),
                c if !is_printable(c) => self.warn(tail, DiagnosticKind::NonPrintableCharacter(c)),
                c => characters.push(c),
            }

            first = false;
            tail = rest;
        }
    }

    /// Parse a `(min, max)` range if one follows, skipping whitespace before it
    fn parse_optional_range(&mut self, input: &'a str) -> (&'a str, Option<CharRange>) {
        let tail = trim_whitespace(input);

        match peek(tail) {
            Some(RANGE_START) => self.parse_range(tail),
            _ => (input, None),
        }
    }

    /// Parse a `(min, max)` range. A malformed range is reported and dropped,
    /// but the text up to and including its `)` is still consumed. A range
    /// cut short by `;` or EoF stops in front of it.
    pub fn parse_range(&mut self, input: &'a str) -> (&'a str, Option<CharRange>) {
        let mut fields: Vec<String> = vec![String::new()];
        let mut malformed = false;
        let mut tail = input;

        loop {
            match split_first(tail) {
                None | Some((PROPERTY_SEPARATOR, _)) => {
                    self.warn(input, DiagnosticKind::UnterminatedRange);
                    return (tail, None);
                }
                Some((RANGE_END, rest)) => {
                    tail = rest;
                    break;
                }
                Some((c, rest)) => {
                    match c {
                        RANGE_START => {}
                        c if is_whitespace(c) => {}
                        RANGE_SEPARATOR => fields.push(String::new()),
                        c if is_digit(c) => {
                            if let Some(field) = fields.last_mut() {
                                field.push(c);
                            }
                        }
                        _ => malformed = true,
                    }
                    tail = rest;
                }
            }
        }

        let range = match fields.as_slice() {
            [min, max] if !malformed => match (min.parse::<u32>(), max.parse::<u32>()) {
                (Ok(min), Ok(max)) => CharRange::new(min, max),
                _ => None,
            },
            _ => None,
        };

        if range.is_none() {
            self.warn(input, DiagnosticKind::MalformedRange);
        }

        (tail, range)
    }

    /// Parse the value of a `blocklist` rule: `default` expands to the global
    /// blocklist, any other known source is kept by name.
    pub fn parse_blocklist_value(&mut self, input: &'a str) -> PResult<'a, Option<Vec<String>>> {
        let (tail, identifier) = parse_identifier(input).map_err(|_| {
            nom::Err::Failure(DiagnosticContext::error(
                input,
                DiagnosticKind::Expected(&[Expected::Identifier]),
            ))
        })?;

        if identifier.eq_ignore_ascii_case(blocklist::DEFAULT_NAME) {
            return Ok((tail, Some(Blocklist::global().words())));
        }

        match blocklist::SOURCES
            .iter()
            .find(|source| source.eq_ignore_ascii_case(identifier))
        {
            Some(source) => Ok((tail, Some(vec![source.to_string()]))),
            None => {
                self.error(
                    input,
                    DiagnosticKind::UnknownBlocklistName(identifier.to_string()),
                );
                Ok((tail, None))
            }
        }
    }
}
