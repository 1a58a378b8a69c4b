use itertools::Itertools;

use crate::Show;

/// A [`CharAlphabet`] is the simplest kind of alphabet: a finite collection of single characters,
/// each of which may label a transition.
///
/// The symbols are kept sorted and free of duplicates, so two alphabets over the same characters
/// compare equal regardless of the order in which the characters were declared.
#[derive(Clone, Hash, PartialEq, Eq, Debug, PartialOrd, Ord, Default)]
pub struct CharAlphabet(Vec<char>);

impl CharAlphabet {
    /// Creates a new [`CharAlphabet`] from the given symbols. Duplicates are removed.
    pub fn new<I: IntoIterator<Item = char>>(symbols: I) -> Self {
        symbols.into_iter().collect()
    }

    /// Creates a new [`CharAlphabet`] alphabet of the given size. The symbols are just the first `size` letters
    /// of the alphabet, i.e. 'a' to 'z'.
    pub fn of_size(size: usize) -> Self {
        assert!(size <= 26, "Alphabet is too large");
        Self((0..size).map(|i| (b'a' + i as u8) as char).collect())
    }

    /// Returns an iterator over all symbols in ascending order.
    pub fn universe(&self) -> impl Iterator<Item = char> + '_ {
        self.0.iter().copied()
    }

    /// Returns true if the given symbol is present in the alphabet.
    pub fn contains(&self, symbol: char) -> bool {
        self.0.binary_search(&symbol).is_ok()
    }

    /// Returns the number of symbols in the alphabet.
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the alphabet has no symbols.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::ops::Index<usize> for CharAlphabet {
    type Output = char;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl FromIterator<char> for CharAlphabet {
    fn from_iter<T: IntoIterator<Item = char>>(iter: T) -> Self {
        Self(iter.into_iter().unique().sorted().collect())
    }
}

impl From<&str> for CharAlphabet {
    fn from(value: &str) -> Self {
        value.chars().collect()
    }
}

impl Show for CharAlphabet {
    fn show(&self) -> String {
        char::show_collection(self.0.iter())
    }
}
