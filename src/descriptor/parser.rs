use std::fmt::Display;

use itertools::Itertools;
use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    math::{Map, OrderedSet},
    prelude::*,
};

/// The five declarations a description consists of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    /// The set of states.
    States,
    /// The input alphabet.
    Alphabet,
    /// The start state.
    Start,
    /// The set of accepting states.
    Accepting,
    /// The block of transition rules.
    Transitions,
}

impl Field {
    /// All fields in the order in which they appear in the positional layout.
    pub const ALL: [Field; 5] = [
        Field::States,
        Field::Alphabet,
        Field::Start,
        Field::Accepting,
        Field::Transitions,
    ];

    /// Section headers (lowercase) that introduce this field in the sectioned layout.
    pub fn keys(&self) -> &'static [&'static str] {
        match self {
            Field::States => &["states", "q"],
            Field::Alphabet => &["alphabet", "sigma", "σ"],
            Field::Start => &["start", "initial"],
            Field::Accepting => &["accepting", "final", "f"],
            Field::Transitions => &["transitions", "delta", "δ"],
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        let key = key.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|field| field.keys().contains(&key.as_str()))
    }

    fn line_in(&self, layout: &LineLayout) -> usize {
        match self {
            Field::States => layout.states,
            Field::Alphabet => layout.alphabet,
            Field::Start => layout.start,
            Field::Accepting => layout.accepting,
            Field::Transitions => layout.transitions,
        }
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Field::States => "states",
                Field::Alphabet => "alphabet",
                Field::Start => "start state",
                Field::Accepting => "accepting states",
                Field::Transitions => "transitions",
            }
        )
    }
}

/// Abstracts the types of errors that can occur when parsing a [`Descriptor`] from text. Line
/// numbers are one-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum DescriptorFormatError {
    #[error("the {field} declaration is expected on line {line}, but the description has only {available} lines")]
    MissingLine {
        field: Field,
        line: usize,
        available: usize,
    },
    #[error("the description has no {0} section")]
    MissingSection(Field),
    #[error("line {line}: the {field} section was already declared on line {first}")]
    DuplicateSection {
        field: Field,
        line: usize,
        first: usize,
    },
    #[error("line {line}: {field} declaration is missing `{delimiter}`")]
    MissingDelimiter {
        field: Field,
        line: usize,
        delimiter: char,
    },
    #[error("line {line}: {field} declaration contains no state marker `{marker}`")]
    MissingMarker {
        field: Field,
        line: usize,
        marker: char,
    },
    #[error("line {line}: expected a digit in {field} declaration, found {}", describe(.found))]
    ExpectedDigit {
        field: Field,
        line: usize,
        found: Option<char>,
    },
    #[error("line {line}: state `{digits}` in {field} declaration is out of range")]
    StateOutOfRange {
        field: Field,
        line: usize,
        digits: String,
    },
    #[error("line {line}: transition rule `({rule})` must have the form (state, symbol, state)")]
    MalformedRule { line: usize, rule: String },
    #[error("line {line}: `{found}` is not a single character symbol")]
    MalformedSymbol { line: usize, found: String },
    #[error("line {line}: unexpected content `{content}`")]
    UnexpectedContent { line: usize, content: String },
}

fn describe(found: &Option<char>) -> String {
    match found {
        Some(c) => format!("`{c}`"),
        None => "end of line".to_string(),
    }
}

/// How the identifiers of the declared states are determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum StateNumbering {
    /// Every occurrence of the marker in the states declaration yields the next identifier,
    /// starting at 1. Whatever follows the marker is ignored.
    #[default]
    Counted,
    /// The integer following each marker is the identifier.
    Literal,
}

impl std::str::FromStr for StateNumbering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "counted" => Ok(Self::Counted),
            "literal" => Ok(Self::Literal),
            other => Err(format!("unknown state numbering `{other}`")),
        }
    }
}

/// Options for the [`DescriptorParser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Where to find the declarations.
    pub layout: Layout,
    /// The character that introduces a state, e.g. the `q` in `q1`.
    pub marker: char,
    /// How the declared states are numbered.
    pub numbering: StateNumbering,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            layout: Layout::Auto,
            marker: 'q',
            numbering: StateNumbering::Counted,
        }
    }
}

impl ParseOptions {
    /// Sets the layout.
    pub fn with_layout(self, layout: Layout) -> Self {
        Self { layout, ..self }
    }

    /// Sets the state marker.
    pub fn with_marker(self, marker: char) -> Self {
        Self { marker, ..self }
    }

    /// Sets the state numbering.
    pub fn with_numbering(self, numbering: StateNumbering) -> Self {
        Self { numbering, ..self }
    }
}

#[derive(Debug, Clone, Copy)]
struct Located<'a> {
    line: usize,
    text: &'a str,
}

#[derive(Debug)]
struct Sections<'a> {
    declarations: Map<Field, Located<'a>>,
    rules: Vec<Located<'a>>,
}

fn split_header(line: &str) -> Option<(Field, &str)> {
    let pos = line.find(|c: char| c == ':' || c == '=')?;
    let field = Field::from_key(&line[..pos])?;
    Some((field, &line[pos + 1..]))
}

fn is_skipped(text: &str) -> bool {
    text.is_empty() || text.starts_with('#')
}

fn sections<S: AsRef<str>>(lines: &[S]) -> Result<Sections<'_>, DescriptorFormatError> {
    let mut declarations: Map<Field, Located<'_>> = Map::default();
    let mut rules = vec![];
    let mut in_transitions = false;

    for (idx, raw) in lines.iter().enumerate() {
        let line = idx + 1;
        let text = raw.as_ref().trim();
        if is_skipped(text) {
            continue;
        }

        match split_header(text) {
            Some((field, payload)) => {
                if let Some(first) = declarations.get(&field) {
                    return Err(DescriptorFormatError::DuplicateSection {
                        field,
                        line,
                        first: first.line,
                    });
                }
                trace!("line {line} opens the {field} section");
                let located = Located {
                    line,
                    text: payload,
                };
                declarations.insert(field, located);
                in_transitions = field == Field::Transitions;
                if in_transitions {
                    rules.push(located);
                }
            }
            None if in_transitions => rules.push(Located { line, text }),
            None => {
                return Err(DescriptorFormatError::UnexpectedContent {
                    line,
                    content: text.to_string(),
                })
            }
        }
    }

    Ok(Sections {
        declarations,
        rules,
    })
}

/// The sections of `lines`, provided every field has exactly one header and the whole text reads
/// as sections. Positional files contain lines like `Q = {q1, q2}` or `Start: q1` that look like
/// headers, so the header count alone does not decide.
fn auto_sections<S: AsRef<str>>(lines: &[S]) -> Option<Sections<'_>> {
    let headers = lines
        .iter()
        .map(|line| line.as_ref().trim())
        .filter(|text| !is_skipped(text))
        .filter_map(split_header)
        .map(|(field, _)| field)
        .counts();

    if !Field::ALL.iter().all(|field| headers.get(field) == Some(&1)) {
        return None;
    }
    match sections(lines) {
        Ok(sections) => Some(sections),
        Err(e) => {
            debug!("text has a header for every field but is not sectioned, {e}");
            None
        }
    }
}

/// Returns the layout that [`Layout::Auto`] resolves to for the given lines: sectioned if every
/// field has exactly one header and the text can be read as sections, positional with the
/// default [`LineLayout`] otherwise.
pub fn detect_layout<S: AsRef<str>>(lines: &[S]) -> Layout {
    match auto_sections(lines) {
        Some(_) => Layout::Sectioned,
        None => Layout::Positional(LineLayout::default()),
    }
}

/// The declarations of one text, located once and shared by all `parse_*` operations.
#[derive(Debug)]
enum Resolved<'a> {
    Positional {
        lines: Vec<&'a str>,
        layout: LineLayout,
    },
    Sectioned(Sections<'a>),
}

impl<'a> Resolved<'a> {
    fn positional<S: AsRef<str>>(lines: &'a [S], layout: LineLayout) -> Self {
        Resolved::Positional {
            lines: lines.iter().map(|line| line.as_ref()).collect(),
            layout,
        }
    }

    fn layout(&self) -> Layout {
        match self {
            Resolved::Positional { layout, .. } => Layout::Positional(*layout),
            Resolved::Sectioned(_) => Layout::Sectioned,
        }
    }

    fn declaration(&self, field: Field) -> Result<Located<'a>, DescriptorFormatError> {
        match self {
            Resolved::Positional { lines, layout } => {
                let idx = field.line_in(layout);
                lines
                    .get(idx)
                    .copied()
                    .map(|text| Located {
                        line: idx + 1,
                        text,
                    })
                    .ok_or(DescriptorFormatError::MissingLine {
                        field,
                        line: idx + 1,
                        available: lines.len(),
                    })
            }
            Resolved::Sectioned(sections) => sections
                .declarations
                .get(&field)
                .copied()
                .ok_or(DescriptorFormatError::MissingSection(field)),
        }
    }

    fn rule_lines(&self) -> Result<Vec<Located<'a>>, DescriptorFormatError> {
        match self {
            Resolved::Positional { lines, layout } => {
                if lines.len() <= layout.transitions {
                    return Err(DescriptorFormatError::MissingLine {
                        field: Field::Transitions,
                        line: layout.transitions + 1,
                        available: lines.len(),
                    });
                }
                Ok(lines[layout.transitions..]
                    .iter()
                    .enumerate()
                    .map(|(offset, text)| Located {
                        line: layout.transitions + offset + 1,
                        text: *text,
                    })
                    .collect())
            }
            Resolved::Sectioned(sections) => {
                if !sections.declarations.contains_key(&Field::Transitions) {
                    return Err(DescriptorFormatError::MissingSection(Field::Transitions));
                }
                Ok(sections.rules.clone())
            }
        }
    }
}

fn braced<'a>(field: Field, located: &Located<'a>) -> Result<&'a str, DescriptorFormatError> {
    let missing = |delimiter| DescriptorFormatError::MissingDelimiter {
        field,
        line: located.line,
        delimiter,
    };
    let open = located.text.find('{').ok_or_else(|| missing('{'))?;
    let close = located.text[open..]
        .find('}')
        .map(|offset| open + offset)
        .ok_or_else(|| missing('}'))?;
    Ok(&located.text[open + 1..close])
}

/// Reads the decimal number at the beginning of `rest`.
fn number_at(field: Field, line: usize, rest: &str) -> Result<u32, DescriptorFormatError> {
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if end == 0 {
        return Err(DescriptorFormatError::ExpectedDigit {
            field,
            line,
            found: rest.chars().next(),
        });
    }
    rest[..end]
        .parse()
        .map_err(|_| DescriptorFormatError::StateOutOfRange {
            field,
            line,
            digits: rest[..end].to_string(),
        })
}

/// Converts description text into a [`Descriptor`].
///
/// Each of the `parse_*` methods reads exactly one declaration and can be used on its own. The
/// parser does not check whether the declarations fit together, e.g. whether the start state is
/// among the states. That is left to [`Descriptor::validate`].
///
/// ```
/// use dfa_sim::prelude::*;
///
/// let text = "states: {q1, q2}\nalphabet: {a, b}\nstart: q1\naccepting: {q2}\ntransitions: (q1, a, q2) (q2, b, q1)";
/// let descriptor = DescriptorParser::default().parse_str(text).unwrap();
/// assert_eq!(descriptor.states().len(), 2);
/// assert!(Dfa::new(descriptor).accepts("aba"));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DescriptorParser {
    options: ParseOptions,
}

impl DescriptorParser {
    /// Creates a parser with the given options.
    pub fn new(options: ParseOptions) -> Self {
        Self { options }
    }

    /// Returns the options of the parser.
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// The layout used for `lines`, resolving [`Layout::Auto`] through [`detect_layout`].
    pub fn layout_for<S: AsRef<str>>(&self, lines: &[S]) -> Layout {
        match self.options.layout {
            Layout::Auto => detect_layout(lines),
            layout => layout,
        }
    }

    fn resolve<'a, S: AsRef<str>>(
        &self,
        lines: &'a [S],
    ) -> Result<Resolved<'a>, DescriptorFormatError> {
        match self.options.layout {
            Layout::Positional(layout) => Ok(Resolved::positional(lines, layout)),
            Layout::Sectioned => sections(lines).map(Resolved::Sectioned),
            Layout::Auto => Ok(match auto_sections(lines) {
                Some(sections) => Resolved::Sectioned(sections),
                None => Resolved::positional(lines, LineLayout::default()),
            }),
        }
    }

    fn states_after_markers(
        &self,
        field: Field,
        line: usize,
        payload: &str,
    ) -> Result<OrderedSet<State>, DescriptorFormatError> {
        let marker = self.options.marker;
        payload
            .match_indices(marker)
            .map(|(pos, _)| number_at(field, line, &payload[pos + marker.len_utf8()..]).map(State::new))
            .collect()
    }

    /// Extracts the declared states. With [`StateNumbering::Counted`], `{q0, q5, q7}` declares
    /// the states 1, 2 and 3.
    pub fn parse_states<S: AsRef<str>>(
        &self,
        lines: &[S],
    ) -> Result<OrderedSet<State>, DescriptorFormatError> {
        self.states_in(&self.resolve(lines)?)
    }

    fn states_in(
        &self,
        resolved: &Resolved<'_>,
    ) -> Result<OrderedSet<State>, DescriptorFormatError> {
        let located = resolved.declaration(Field::States)?;
        let payload = braced(Field::States, &located)?;
        let states = match self.options.numbering {
            StateNumbering::Counted => {
                let count = payload.matches(self.options.marker).count() as u32;
                (1..=count).map(State::new).collect()
            }
            StateNumbering::Literal => {
                self.states_after_markers(Field::States, located.line, payload)?
            }
        };
        trace!("line {}: states {}", located.line, State::show_collection(&states));
        Ok(states)
    }

    /// Extracts the alphabet, that is every character between the braces that is neither
    /// whitespace nor a comma.
    pub fn parse_alphabet<S: AsRef<str>>(
        &self,
        lines: &[S],
    ) -> Result<CharAlphabet, DescriptorFormatError> {
        self.alphabet_in(&self.resolve(lines)?)
    }

    fn alphabet_in(&self, resolved: &Resolved<'_>) -> Result<CharAlphabet, DescriptorFormatError> {
        let located = resolved.declaration(Field::Alphabet)?;
        let alphabet: CharAlphabet = braced(Field::Alphabet, &located)?
            .chars()
            .filter(|c| !c.is_whitespace() && !matches!(c, ',' | '{' | '}'))
            .collect();
        trace!("line {}: alphabet {}", located.line, alphabet.show());
        Ok(alphabet)
    }

    /// Extracts the start state, which is the number following the first marker of the
    /// declaration.
    pub fn parse_start_state<S: AsRef<str>>(
        &self,
        lines: &[S],
    ) -> Result<State, DescriptorFormatError> {
        self.start_state_in(&self.resolve(lines)?)
    }

    fn start_state_in(&self, resolved: &Resolved<'_>) -> Result<State, DescriptorFormatError> {
        let located = resolved.declaration(Field::Start)?;
        let marker = self.options.marker;
        let pos = located
            .text
            .find(marker)
            .ok_or(DescriptorFormatError::MissingMarker {
                field: Field::Start,
                line: located.line,
                marker,
            })?;
        let start = State::new(number_at(
            Field::Start,
            located.line,
            &located.text[pos + marker.len_utf8()..],
        )?);
        trace!("line {}: start state {start}", located.line);
        Ok(start)
    }

    /// Extracts the accepting states, one per marker between the braces.
    pub fn parse_final_states<S: AsRef<str>>(
        &self,
        lines: &[S],
    ) -> Result<OrderedSet<State>, DescriptorFormatError> {
        self.final_states_in(&self.resolve(lines)?)
    }

    fn final_states_in(
        &self,
        resolved: &Resolved<'_>,
    ) -> Result<OrderedSet<State>, DescriptorFormatError> {
        let located = resolved.declaration(Field::Accepting)?;
        let payload = braced(Field::Accepting, &located)?;
        let accepting = self.states_after_markers(Field::Accepting, located.line, payload)?;
        trace!(
            "line {}: accepting states {}",
            located.line,
            State::show_collection(&accepting)
        );
        Ok(accepting)
    }

    /// Collects the rules of the whole transition block into a [`TransitionTable`].
    pub fn parse_transitions<S: AsRef<str>>(
        &self,
        lines: &[S],
    ) -> Result<TransitionTable, DescriptorFormatError> {
        self.transitions_in(&self.resolve(lines)?)
    }

    fn transitions_in(
        &self,
        resolved: &Resolved<'_>,
    ) -> Result<TransitionTable, DescriptorFormatError> {
        let mut table = TransitionTable::new();
        for located in resolved.rule_lines()? {
            for rule in self.rules_in_line(&located)? {
                trace!("line {}: rule {}", located.line, rule.show());
                table.insert(rule);
            }
        }
        Ok(table)
    }

    /// Decodes every top-level parenthesised group of a line. Text between the groups is
    /// ignored, a line without any group must consist of braces only.
    fn rules_in_line(&self, located: &Located<'_>) -> Result<Vec<Transition>, DescriptorFormatError> {
        let text = located.text.trim();
        let line = located.line;
        let mut rules = vec![];
        let mut depth = 0usize;
        let mut open = 0;

        for (pos, c) in text.char_indices() {
            match c {
                '(' => {
                    if depth == 0 {
                        open = pos;
                    }
                    depth += 1;
                }
                ')' => {
                    if depth == 0 {
                        return Err(DescriptorFormatError::MissingDelimiter {
                            field: Field::Transitions,
                            line,
                            delimiter: '(',
                        });
                    }
                    depth -= 1;
                    if depth == 0 {
                        rules.push(self.decode_rule(line, &text[open + 1..pos])?);
                    }
                }
                _ => {}
            }
        }

        if depth > 0 {
            return Err(DescriptorFormatError::MissingDelimiter {
                field: Field::Transitions,
                line,
                delimiter: ')',
            });
        }
        if rules.is_empty()
            && !is_skipped(text)
            && !text.chars().all(|c| c.is_whitespace() || matches!(c, '{' | '}' | ','))
        {
            return Err(DescriptorFormatError::UnexpectedContent {
                line,
                content: text.to_string(),
            });
        }
        Ok(rules)
    }

    /// Decodes `q1, a, q2`. Nested parentheses are flattened, so `(q1, a), q2` works as well.
    fn decode_rule(&self, line: usize, payload: &str) -> Result<Transition, DescriptorFormatError> {
        let flat: String = payload.chars().filter(|c| !matches!(c, '(' | ')')).collect();
        let fields = flat.split(',').map(str::trim).collect_vec();
        let [source, symbol, target] = fields.as_slice() else {
            return Err(DescriptorFormatError::MalformedRule {
                line,
                rule: payload.to_string(),
            });
        };

        let mut chars = symbol.chars();
        let symbol = match (chars.next(), chars.next()) {
            (Some(c), None) => c,
            _ => {
                return Err(DescriptorFormatError::MalformedSymbol {
                    line,
                    found: symbol.to_string(),
                })
            }
        };

        Ok(Transition::new(
            self.state_token(line, source)?,
            symbol,
            self.state_token(line, target)?,
        ))
    }

    /// A state inside a rule, the marker is optional.
    fn state_token(&self, line: usize, token: &str) -> Result<State, DescriptorFormatError> {
        let digits = token.strip_prefix(self.options.marker).unwrap_or(token);
        if let Some(c) = digits.chars().find(|c| !c.is_ascii_digit()) {
            return Err(DescriptorFormatError::ExpectedDigit {
                field: Field::Transitions,
                line,
                found: Some(c),
            });
        }
        number_at(Field::Transitions, line, digits).map(State::new)
    }

    /// Parses the complete description. Fails on the first malformed declaration, a partially
    /// parsed descriptor is never returned.
    pub fn parse<S: AsRef<str>>(&self, lines: &[S]) -> Result<Descriptor, DescriptorFormatError> {
        let resolved = self.resolve(lines)?;
        debug!(
            "parsing description of {} lines, layout {:?}",
            lines.len(),
            resolved.layout()
        );

        Ok(Descriptor::new(
            self.states_in(&resolved)?,
            self.alphabet_in(&resolved)?,
            self.start_state_in(&resolved)?,
            self.final_states_in(&resolved)?,
            self.transitions_in(&resolved)?,
        ))
    }

    /// Splits `text` into lines and parses it, see [`DescriptorParser::parse`].
    pub fn parse_str(&self, text: &str) -> Result<Descriptor, DescriptorFormatError> {
        self.parse(&text.lines().collect_vec())
    }

    /// Reads all lines from `read` and parses them. Failing to read is reported as an
    /// [`std::io::Error`] in the outer result, so it can be told apart from a malformed
    /// description.
    pub fn parse_read<R: std::io::BufRead>(
        &self,
        read: R,
    ) -> std::io::Result<Result<Descriptor, DescriptorFormatError>> {
        let lines = read.lines().collect::<std::io::Result<Vec<_>>>()?;
        Ok(self.parse(&lines))
    }
}

impl std::str::FromStr for Descriptor {
    type Err = DescriptorFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DescriptorParser::default().parse_str(s)
    }
}
