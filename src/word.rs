/// A finite word is a finite sequence of `char` symbols that can be read by a [`crate::Dfa`].
///
/// Implemented for string types as well as for slices and vectors of `char`, so
/// `dfa.accepts("ab")`, `dfa.accepts(&word)` and `dfa.accepts(['a', 'b'])` all work.
pub trait FiniteWord {
    /// Type for an iterator over the symbols making up the word.
    type Symbols<'this>: Iterator<Item = char>
    where
        Self: 'this;

    /// Returns an iterator over the symbols of the word.
    fn symbols(&self) -> Self::Symbols<'_>;

    /// Returns the number of symbols in the word.
    fn len(&self) -> usize {
        self.symbols().count()
    }

    /// Returns true if the word contains no symbols.
    fn is_empty(&self) -> bool {
        self.symbols().next().is_none()
    }
}

impl FiniteWord for str {
    type Symbols<'this> = std::str::Chars<'this>;
    fn symbols(&self) -> Self::Symbols<'_> {
        self.chars()
    }
}

impl FiniteWord for String {
    type Symbols<'this> = std::str::Chars<'this>;
    fn symbols(&self) -> Self::Symbols<'_> {
        self.chars()
    }
}

impl FiniteWord for [char] {
    type Symbols<'this> = std::iter::Copied<std::slice::Iter<'this, char>>;
    fn symbols(&self) -> Self::Symbols<'_> {
        self.iter().copied()
    }
}

impl<const N: usize> FiniteWord for [char; N] {
    type Symbols<'this> = std::iter::Copied<std::slice::Iter<'this, char>>;
    fn symbols(&self) -> Self::Symbols<'_> {
        self.iter().copied()
    }
}

impl FiniteWord for Vec<char> {
    type Symbols<'this> = std::iter::Copied<std::slice::Iter<'this, char>>;
    fn symbols(&self) -> Self::Symbols<'_> {
        self.iter().copied()
    }
}

impl<W: FiniteWord + ?Sized> FiniteWord for &W {
    type Symbols<'this> = W::Symbols<'this> where Self: 'this;
    fn symbols(&self) -> Self::Symbols<'_> {
        W::symbols(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::FiniteWord;

    #[test]
    fn words_from_different_sources() {
        assert_eq!(FiniteWord::len("äb"), 2);
        assert!(FiniteWord::is_empty(""));
        assert_eq!(
            String::from("ba").symbols().collect::<Vec<_>>(),
            vec!['b', 'a']
        );
        assert_eq!(['a', 'a'].symbols().collect::<String>(), "aa");
        assert!(!(&vec!['x']).is_empty());
    }
}
