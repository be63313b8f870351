//! The process-wide list of passwords that `blocklist: default` expands to

use std::sync::{PoisonError, RwLock, RwLockReadGuard};

use once_cell::sync::Lazy;

/// The blocklist name that expands to the global list
pub(crate) const DEFAULT_NAME: &str = "default";

/// Blocklist names that are kept as-is, for the host to resolve
pub(crate) const SOURCES: [&str; 1] = ["hibp"];

/// The bundled list of most commonly breached passwords, one per line
const DEFAULT_WORDS: &str = include_str!("../data/blocklist.txt");

static BLOCKLIST: Lazy<Blocklist> = Lazy::new(Blocklist::from_default_words);

/// A list of lowercase passwords.
///
/// The global instance is built from the bundled list on first access and
/// lives until the process exits. Hosts may add their own words with
/// [`Blocklist::append`]; appended words are seen by every later reader,
/// including later `blocklist: default` expansions.
#[derive(Debug, Default)]
pub struct Blocklist {
    words: RwLock<Vec<String>>,
}

impl Blocklist {
    /// The process-wide blocklist
    pub fn global() -> &'static Blocklist {
        &BLOCKLIST
    }

    /// Build a blocklist from newline-separated words. Blank lines are
    /// skipped and words are lowercased.
    pub fn from_lines(lines: &str) -> Self {
        let blocklist = Self::default();
        blocklist.append(lines.lines());
        blocklist
    }

    fn from_default_words() -> Self {
        let blocklist = Self::from_lines(DEFAULT_WORDS);
        log::debug!("loaded {} default blocklist words", blocklist.len());
        blocklist
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<String>> {
        self.words.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// A snapshot of the current words
    pub fn words(&self) -> Vec<String> {
        self.read().clone()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Check whether a password is on the list, ignoring case
    pub fn contains(&self, password: &str) -> bool {
        let password = password.to_lowercase();
        self.read().iter().any(|word| *word == password)
    }

    /// Add passwords to the end of the list
    pub fn append<I, S>(&self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = self.words.write().unwrap_or_else(PoisonError::into_inner);

        list.extend(
            words
                .into_iter()
                .map(|word| word.as_ref().trim().to_lowercase())
                .filter(|word| !word.is_empty()),
        );
    }
}
