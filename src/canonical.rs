//! Reduction of a list of character classes to its minimal equivalent form

use crate::class::{CharacterClass, NamedClass};

/// One slot per ASCII printable character; slot `i` is `' ' + i`
const TABLE_SIZE: usize = 95;

struct AsciiTable {
    table: [bool; TABLE_SIZE],
}

impl AsciiTable {
    fn new() -> Self {
        Self {
            table: [false; TABLE_SIZE],
        }
    }

    fn index(c: char) -> Option<usize> {
        (c as usize)
            .checked_sub(' ' as usize)
            .filter(|&index| index < TABLE_SIZE)
    }

    /// Add a character to the table. Characters outside of the printable range
    /// are ignored.
    fn set(&mut self, c: char) {
        if let Some(index) = Self::index(c) {
            self.table[index] = true;
        }
    }

    fn set_range(&mut self, range: impl IntoIterator<Item = char>) {
        range.into_iter().for_each(|c| self.set(c))
    }

    fn check(&self, c: char) -> bool {
        Self::index(c).map_or(false, |index| self.table[index])
    }

    /// Check if a class is completely represented in the table
    fn check_class(&self, class: NamedClass) -> bool {
        class
            .ranges()
            .iter()
            .all(|range| range.clone().all(|c| self.check(c)))
    }

    /// The characters of a class that are present in the table
    fn extract_class(&self, class: NamedClass) -> impl Iterator<Item = char> + '_ {
        class
            .ranges()
            .iter()
            .flat_map(|range| range.clone())
            .filter(move |&c| self.check(c))
    }

    /// Every character in the table: upper, lower, digit, then special
    fn chars(&self) -> impl Iterator<Item = char> + '_ {
        NamedClass::BASIC
            .into_iter()
            .flat_map(move |class| self.extract_class(class))
    }
}

/// Whether a source mentions any characters of `class`
fn contributes_to(source: &CharacterClass, class: NamedClass) -> bool {
    match source {
        CharacterClass::Named { name, .. } => *name == class,
        CharacterClass::Custom { characters, .. } => characters
            .iter()
            .any(|&c| NamedClass::of_char(c) == Some(class)),
    }
}

/// The basic class a custom class spells out exactly, like `[0123456789]`
fn exact_cover(characters: &[char]) -> Option<NamedClass> {
    let class = NamedClass::of_char(*characters.first()?)?;
    if !characters.iter().all(|&c| NamedClass::of_char(c) == Some(class)) {
        return None;
    }

    let mut table = AsciiTable::new();
    table.set_range(characters.iter().copied());
    table.check_class(class).then_some(class)
}

/// Which list is being canonicalized. The two differ in how values that
/// carry a range are treated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ClassList {
    /// Ranges are minimum counts and every ranged value is kept
    Required,
    /// Ranges only cap a count, so a value without a range absorbs ranged
    /// values it covers
    Allowed,
}

/// A class of the output, with the input index it sorts by
struct Placed {
    position: usize,
    class: CharacterClass,
}

/// Converts a list of character classes into a canonicalized list of
/// character classes.
///
/// Named classes whose characters are all present collapse into the named
/// class, and everything else is kept as custom characters. Ranges attached to
/// the input survive: a named value keeps its range, and a custom value with a
/// range is kept whole with that range unless it spells out exactly one named
/// class. If the four basic classes are covered and some value has a range, the
/// input is returned unchanged.
///
/// With `preserve_class_syntax_chars`, a `-` among the custom characters is
/// moved to the front and a `]` to the back, so the custom class can be written
/// back out in bracket syntax.
pub fn canonicalize(
    classes: &[CharacterClass],
    preserve_class_syntax_chars: bool,
) -> Vec<CharacterClass> {
    canonicalize_list(classes, preserve_class_syntax_chars, ClassList::Required)
}

/// Canonicalize the classes of an `allowed` rule.
///
/// Unlike [`canonicalize`], the order of the input doesn't matter: a value
/// without a range wins over ranged values covering the same characters,
/// several ranges on the same named class keep the highest maximum, and
/// covering the four basic classes always yields `ascii-printable`.
pub fn canonicalize_allowed(
    classes: &[CharacterClass],
    preserve_class_syntax_chars: bool,
) -> Vec<CharacterClass> {
    canonicalize_list(classes, preserve_class_syntax_chars, ClassList::Allowed)
}

fn canonicalize_list(
    classes: &[CharacterClass],
    preserve_class_syntax_chars: bool,
    list: ClassList,
) -> Vec<CharacterClass> {
    // Unicode includes AsciiPrintable, and AsciiPrintable includes all other character classes
    // so we will check for these special cases and bail out early with the largest set found
    let universal = classes
        .iter()
        .find(|class| class.name() == Some(NamedClass::Unicode))
        .or_else(|| classes.iter().find(|class| class.is_universal()));

    if let Some(universal) = universal {
        return vec![universal.clone()];
    }

    if list == ClassList::Required {
        let mut everything = AsciiTable::new();
        for class in classes {
            everything.set_range(class.chars());
        }

        if NamedClass::BASIC.iter().all(|&class| everything.check_class(class)) {
            // Collapsing into ascii-printable would lose the ranges, which the
            // merger still needs to reconcile against the length limits
            if classes.iter().any(|class| class.range().is_some()) {
                return classes.to_vec();
            }
            return vec![CharacterClass::named(NamedClass::AsciiPrintable)];
        }
    }

    // Values that take part in completing named classes
    let is_free = |class: &CharacterClass| match (list, class) {
        (ClassList::Required, CharacterClass::Named { .. }) => true,
        (_, class) => class.range().is_none(),
    };

    let mut table = AsciiTable::new();
    for class in classes.iter().filter(|&class| is_free(class)) {
        table.set_range(class.chars());
    }

    let complete = NamedClass::BASIC.map(|class| table.check_class(class));
    let is_complete = |class: NamedClass| {
        NamedClass::BASIC
            .iter()
            .position(|&basic| basic == class)
            .map_or(false, |index| complete[index])
    };

    if complete.iter().all(|&complete| complete) {
        return vec![CharacterClass::named(NamedClass::AsciiPrintable)];
    }

    let mut named: Vec<Placed> = Vec::new();
    let mut custom: Vec<Placed> = Vec::new();

    for class in NamedClass::BASIC.into_iter().filter(|&class| is_complete(class)) {
        let position = classes
            .iter()
            .position(|source| is_free(source) && contributes_to(source, class));
        let source = classes
            .iter()
            .find(|&source| is_free(source) && source.name() == Some(class));

        if let Some(position) = position {
            named.push(Placed {
                position,
                class: source.cloned().unwrap_or_else(|| CharacterClass::named(class)),
            });
        }
    }

    for (position, source) in classes.iter().enumerate() {
        if is_free(source) {
            continue;
        }

        let (class, range) = match source {
            CharacterClass::Named { name, range } => (Some(*name), *range),
            CharacterClass::Custom { characters, range } => (exact_cover(characters), *range),
        };

        if let Some(class) = class.filter(|&class| !is_complete(class)) {
            let existing = named
                .iter_mut()
                .find(|placed| placed.class.name() == Some(class));

            match (existing, list) {
                (None, _) => {
                    named.push(Placed {
                        position,
                        class: CharacterClass::Named { name: class, range },
                    });
                    continue;
                }
                (Some(placed), ClassList::Allowed) => {
                    let wider = match (placed.class.range(), range) {
                        (Some(current), Some(new)) => new.max > current.max,
                        _ => false,
                    };
                    if wider {
                        placed.class = CharacterClass::Named { name: class, range };
                    }
                    continue;
                }
                // A second exact cover of a named class stays a custom class
                (Some(_), ClassList::Required) => {}
            }
        }

        let characters = source.chars();
        if list == ClassList::Allowed && characters.iter().all(|&c| table.check(c)) {
            continue;
        }

        let mut own = AsciiTable::new();
        own.set_range(characters);
        custom.push(Placed {
            position,
            class: CharacterClass::Custom {
                characters: bracket_order(own.chars().collect(), preserve_class_syntax_chars),
                range,
            },
        });
    }

    // Characters of the free values that didn't complete a named class share
    // one custom class
    let leftovers: Vec<char> = NamedClass::BASIC
        .into_iter()
        .filter(|&class| !is_complete(class))
        .flat_map(|class| table.extract_class(class))
        .collect();

    let position = classes.iter().position(|source| {
        is_free(source)
            && matches!(source, CharacterClass::Custom { characters, .. }
                if characters.iter().any(|c| leftovers.contains(c)))
    });

    if let Some(position) = position {
        custom.push(Placed {
            position,
            class: CharacterClass::custom(bracket_order(leftovers, preserve_class_syntax_chars)),
        });
    }

    named.sort_by_key(|placed| placed.position);
    custom.sort_by_key(|placed| placed.position);
    named
        .into_iter()
        .chain(custom)
        .map(|placed| placed.class)
        .collect()
}

/// With `preserve_class_syntax_chars`, move a `-` to the front and a `]` to
/// the back
fn bracket_order(mut characters: Vec<char>, preserve_class_syntax_chars: bool) -> Vec<char> {
    if preserve_class_syntax_chars {
        if let Some(index) = characters.iter().position(|&c| c == '-') {
            characters.remove(index);
            characters.insert(0, '-');
        }
        if let Some(index) = characters.iter().position(|&c| c == ']') {
            characters.remove(index);
            characters.push(']');
        }
    }
    characters
}
