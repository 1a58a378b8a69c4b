use tracing::trace;

use crate::prelude::*;

/// Generates a random total descriptor with `size` states over an alphabet of `symbols`
/// characters by drawing a target for every state and symbol. Every state is accepting with
/// probability one half and the start state is `q1`. Depending on the drawn transitions, some
/// states may not be reachable.
///
/// # Panics
/// If `size` is zero.
pub fn random_descriptor_sized(symbols: usize, size: usize) -> Descriptor {
    assert!(size > 0, "a descriptor needs at least one state");
    let alphabet = CharAlphabet::of_size(symbols);
    let size = size as u32;

    let transitions = (1..=size)
        .flat_map(|source| alphabet.universe().map(move |symbol| (source, symbol)))
        .map(|(source, symbol)| (source, symbol, fastrand::u32(1..=size)))
        .collect::<Vec<_>>();

    Descriptor::builder()
        .with_states(1..=size)
        .with_alphabet(alphabet.universe())
        .with_accepting((1..=size).filter(|_| fastrand::bool()))
        .with_transitions(transitions)
        .into_descriptor(1)
}

/// Grows a random total descriptor from a single state. States and symbols are treated in
/// order, for each pair the existing states are tried one after another and chosen as target
/// with the given `probability`. If none is chosen, a new state is created and becomes the
/// target. Generation ends once every created state has a rule for every symbol, and all states
/// are reachable from the start state `q1`. The higher `probability`, the fewer states are
/// created.
///
/// # Panics
/// If `probability` is not positive, since then every pair would ask for a new state.
pub fn random_descriptor(symbols: usize, probability: f64) -> Descriptor {
    assert!(
        probability > 0.0,
        "probability of reusing a state must be positive"
    );
    let alphabet = CharAlphabet::of_size(symbols);
    let mut transitions = vec![];
    let mut size = 1u32;
    let mut current = 1u32;

    while current <= size {
        'symbols: for symbol in alphabet.universe() {
            for target in 1..=current {
                if fastrand::f64() < probability {
                    transitions.push((current, symbol, target));
                    continue 'symbols;
                }
            }
            size += 1;
            trace!("adding q{size} as successor of q{current} on {symbol}");
            transitions.push((current, symbol, size));
        }
        current += 1;
    }

    Descriptor::builder()
        .with_states(1..=size)
        .with_alphabet(alphabet.universe())
        .with_accepting((1..=size).filter(|_| fastrand::bool()))
        .with_transitions(transitions)
        .into_descriptor(1)
}

/// Draws a word of length at most `max_len` whose symbols are taken uniformly from `alphabet`.
pub fn random_word(alphabet: &CharAlphabet, max_len: usize) -> String {
    if alphabet.is_empty() {
        return String::new();
    }
    let len = fastrand::usize(..=max_len);
    (0..len)
        .map(|_| alphabet[fastrand::usize(..alphabet.size())])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn sized_descriptors_are_total() {
        fastrand::seed(17);
        for size in 1..8 {
            let descriptor = random_descriptor_sized(3, size);
            assert_eq!(descriptor.states().len(), size);
            assert_eq!(descriptor.transitions().len(), 3 * size);
            assert_eq!(descriptor.validate(Validation::Total), Ok(()));
        }
    }

    #[test_log::test]
    fn grown_descriptors_are_total() {
        fastrand::seed(4);
        for _ in 0..10 {
            let descriptor = random_descriptor(2, 0.4);
            assert_eq!(descriptor.validate(Validation::Total), Ok(()));
        }
    }

    #[test]
    #[should_panic(expected = "must be positive")]
    fn growing_needs_positive_probability() {
        random_descriptor(2, 0.0);
    }

    #[test]
    fn certain_reuse_gives_single_state() {
        let descriptor = random_descriptor(3, 1.0);
        assert_eq!(descriptor.states().len(), 1);
        assert_eq!(descriptor.validate(Validation::Total), Ok(()));
    }

    #[test_log::test]
    fn total_descriptors_never_stall() {
        fastrand::seed(99);
        let dfa = Dfa::new(random_descriptor_sized(2, 6));
        for _ in 0..50 {
            let word = random_word(dfa.descriptor().alphabet(), 12);
            let run = dfa.run(&word).unwrap();
            assert!(!run.stalled());
            assert_eq!(run.states().len(), word.len() + 1);
            assert_eq!(dfa.accepts(&word), dfa.accepts(&word));
            assert_eq!(
                dfa.accepts(&word),
                dfa.descriptor().is_accepting(run.reached())
            );
        }
    }

    #[test]
    fn rendered_descriptors_answer_alike() {
        fastrand::seed(3);
        let dfa = Dfa::new(random_descriptor(3, 0.5));
        let reparsed: Descriptor = dfa.descriptor().to_string().parse().unwrap();
        assert_eq!(&reparsed, dfa.descriptor());
        for _ in 0..20 {
            let word = random_word(dfa.descriptor().alphabet(), 8);
            assert_eq!(dfa.accepts(&word), Dfa::new(reparsed.clone()).accepts(&word));
        }
    }
}
