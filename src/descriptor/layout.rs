/// Determines where the [`crate::DescriptorParser`] looks for each declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Layout {
    /// Use [`Layout::Sectioned`] if the text contains exactly one header for every declaration,
    /// otherwise [`Layout::Positional`] with the default [`LineLayout`].
    #[default]
    Auto,
    /// Every declaration is expected on a fixed line.
    Positional(LineLayout),
    /// Declarations are introduced by named headers such as `states:` or `Σ =`, their order and
    /// position in the text do not matter.
    Sectioned,
}

/// The zero-based line indices of the declarations in the positional layout. The transition
/// rules occupy every line from `transitions` up to the end of the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineLayout {
    /// Line of the states declaration.
    pub states: usize,
    /// Line of the alphabet declaration.
    pub alphabet: usize,
    /// Line of the start state declaration.
    pub start: usize,
    /// Line of the accepting states declaration.
    pub accepting: usize,
    /// First line of the transition block.
    pub transitions: usize,
}

impl Default for LineLayout {
    fn default() -> Self {
        Self {
            states: 5,
            alphabet: 7,
            start: 9,
            accepting: 11,
            transitions: 14,
        }
    }
}

impl LineLayout {
    /// A layout without any gaps: states, alphabet, start state and accepting states on lines
    /// 0 to 3, followed by the transition rules.
    pub fn compact() -> Self {
        Self {
            states: 0,
            alphabet: 1,
            start: 2,
            accepting: 3,
            transitions: 4,
        }
    }
}

impl std::str::FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Layout::Auto),
            "positional" => Ok(Layout::Positional(LineLayout::default())),
            "compact" => Ok(Layout::Positional(LineLayout::compact())),
            "sectioned" => Ok(Layout::Sectioned),
            other => Err(format!("unknown layout `{other}`")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_from_str() {
        assert_eq!("auto".parse::<Layout>(), Ok(Layout::Auto));
        assert_eq!(
            "Positional".parse::<Layout>(),
            Ok(Layout::Positional(LineLayout::default()))
        );
        assert_eq!(
            "compact".parse::<Layout>(),
            Ok(Layout::Positional(LineLayout::compact()))
        );
        assert_eq!("sectioned".parse::<Layout>(), Ok(Layout::Sectioned));
        assert!("tabular".parse::<Layout>().is_err());
    }
}
