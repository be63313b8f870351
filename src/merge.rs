//! Merging of raw rules into the final, internally consistent rule list

use std::cmp::{max, min};
use std::collections::BTreeSet;

use crate::canonical::{canonicalize, canonicalize_allowed};
use crate::class::{CharRange, CharacterClass, NamedClass};
use crate::rule::Rule;

/// Stand-in bound for a required class without a range when checking ranges
/// against the length limits
const UNBOUNDED_CHARS: u32 = 128;

const MIN_CLASSES_RANGE: (u32, u32) = (1, 4);

/// If the source option is None, set it to Some(new). Otherwise, call cmp with
/// the old and new T, and set the option to the return value of cmp. Used to
/// implement "min of" and "max of" logic with options.
fn apply<T>(source: &mut Option<T>, new: T, mut cmp: impl FnMut(T, T) -> T) {
    *source = match source.take() {
        None => Some(new),
        Some(old) => Some(cmp(old, new)),
    }
}

/// A required class always asks for at least one character
fn at_least_one(class: CharacterClass) -> CharacterClass {
    match class.range() {
        Some(range) if range.min < 1 => class.with_range(Some(CharRange { min: 1, ..range })),
        _ => class,
    }
}

/// An allowed class never asks for a minimum number of characters
fn no_minimum(class: CharacterClass) -> CharacterClass {
    match class.range() {
        Some(range) if range.min >= 1 => class.with_range(CharRange::new(0, range.max)),
        _ => class,
    }
}

/// Accumulates raw rules, combining each kind the way it has to be combined
struct RuleMerger {
    copy_required_to_allowed: bool,
    preserve_class_syntax_chars: bool,
    /// `required` and `blocklist` rules, in input order
    rules: Vec<Rule>,
    /// Classes of `required` rules, which come before every other allowed
    /// class the way they do in the rendered output
    copied: Vec<CharacterClass>,
    allowed: Vec<CharacterClass>,
    max_consecutive: Option<u32>,
    min_length: Option<u32>,
    max_length: Option<u32>,
    min_classes: Option<u32>,
}

impl RuleMerger {
    fn new(format_for_minified: bool) -> Self {
        Self {
            copy_required_to_allowed: !format_for_minified,
            preserve_class_syntax_chars: format_for_minified,
            rules: Vec::new(),
            copied: Vec::new(),
            allowed: Vec::new(),
            max_consecutive: None,
            min_length: None,
            max_length: None,
            min_classes: None,
        }
    }

    fn push(&mut self, rule: Rule) {
        match rule {
            Rule::MaxConsecutive(n) => apply(&mut self.max_consecutive, n, min),
            Rule::MinLength(n) => apply(&mut self.min_length, n, max),
            Rule::MaxLength(n) => apply(&mut self.max_length, n, min),
            Rule::MinClasses(n) => self.min_classes = Some(n),
            Rule::Blocklist(words) => self.rules.push(Rule::Blocklist(words)),
            Rule::Required(classes) => {
                let classes: Vec<CharacterClass> =
                    canonicalize(&classes, self.preserve_class_syntax_chars)
                        .into_iter()
                        .map(at_least_one)
                        .collect();

                if self.copy_required_to_allowed {
                    self.copied
                        .extend(classes.iter().map(CharacterClass::without_range));
                }
                self.rules.push(Rule::Required(classes));
            }
            Rule::Allowed(classes) => self.allowed.extend(classes.into_iter().map(no_minimum)),
        }
    }

    fn required(&self) -> impl Iterator<Item = &Vec<CharacterClass>> {
        self.rules.iter().filter_map(|rule| match rule {
            Rule::Required(classes) => Some(classes),
            _ => None,
        })
    }

    /// Check the ranges of required classes against the length limits, and
    /// rewrite the required rules when they can't all be satisfied.
    fn reconcile_ranges(&mut self) {
        let classes: Vec<&CharacterClass> = self.required().flatten().collect();

        if !classes.iter().any(|class| class.range().is_some()) {
            return;
        }

        let min_chars_total: u32 = classes
            .iter()
            .map(|class| class.range().map_or(UNBOUNDED_CHARS, |range| range.min))
            .fold(0, u32::saturating_add);
        let max_chars_total: u32 = classes
            .iter()
            .map(|class| class.range().map_or(UNBOUNDED_CHARS, |range| range.max))
            .fold(0, u32::saturating_add);

        let exceeds_max_length = self
            .max_length
            .map_or(false, |max_length| min_chars_total > max_length);
        let misses_min_length = self
            .min_length
            .map_or(false, |min_length| max_chars_total < min_length || min_length == 0);

        if !exceeds_max_length && !misses_min_length {
            return;
        }

        let seen: BTreeSet<NamedClass> = classes
            .iter()
            .filter_map(|class| class.name())
            .filter(|name| NamedClass::BASIC.contains(name))
            .collect();
        let required_rules = self.required().count();

        log::debug!(
            "required ranges need {min_chars_total}..{max_chars_total} characters, \
             length is {:?}..{:?}; {} classes seen in {required_rules} required rules",
            self.min_length,
            self.max_length,
            seen.len(),
        );

        if seen.len() == NamedClass::BASIC.len() && required_rules == 1 {
            log::debug!("collapsing the required rule to ascii-printable");
            for rule in &mut self.rules {
                if let Rule::Required(classes) = rule {
                    *classes = vec![CharacterClass::named(NamedClass::AsciiPrintable)];
                }
            }
            return;
        }

        log::debug!("dropping the ranges of every required class");
        let preserve = self.preserve_class_syntax_chars;
        for rule in &mut self.rules {
            if let Rule::Required(classes) = rule {
                let stripped: Vec<CharacterClass> =
                    classes.iter().map(CharacterClass::without_range).collect();
                *classes = canonicalize(&stripped, preserve);
            }
        }

        if seen.len() < NamedClass::BASIC.len() {
            if self.copy_required_to_allowed {
                self.allowed.extend(
                    NamedClass::BASIC
                        .into_iter()
                        .filter(|name| !seen.contains(name))
                        .map(CharacterClass::named),
                );
            }

            let seen_count = max(seen.len() as u32, MIN_CLASSES_RANGE.0);
            self.min_classes = Some(min(self.min_classes(), seen_count));
        }
    }

    /// The effective minclasses value, clamped into 1..=4 and defaulted to 4
    fn min_classes(&self) -> u32 {
        let (low, high) = MIN_CLASSES_RANGE;
        self.min_classes.unwrap_or(high).clamp(low, high)
    }

    fn finish(mut self) -> Vec<Rule> {
        self.reconcile_ranges();
        let min_classes = self.min_classes();

        let mut classes = std::mem::take(&mut self.copied);
        classes.append(&mut self.allowed);

        let mut allowed = canonicalize_allowed(&classes, self.preserve_class_syntax_chars);
        if allowed.is_empty() && self.copy_required_to_allowed {
            allowed.push(CharacterClass::named(NamedClass::AsciiPrintable));
        }

        let mut rules = self.rules;

        if !allowed.is_empty() {
            rules.push(Rule::Allowed(allowed));
        }
        rules.extend(self.max_consecutive.map(Rule::MaxConsecutive));
        rules.extend(self.min_length.map(Rule::MinLength));
        rules.extend(self.max_length.map(Rule::MaxLength));
        rules.push(Rule::MinClasses(min_classes));

        rules
    }
}

/// Merge raw rules into the final rule list.
///
/// `required` and `blocklist` rules come first, in input order, followed by
/// the combined `allowed` rule, `max-consecutive`, `minlength`, `maxlength`
/// and `minclasses`. Unless `format_for_minified` is set, the classes of
/// every `required` rule are also allowed.
pub fn merge_rules(rules: impl IntoIterator<Item = Rule>, format_for_minified: bool) -> Vec<Rule> {
    let mut merger = RuleMerger::new(format_for_minified);
    rules.into_iter().for_each(|rule| merger.push(rule));
    merger.finish()
}
