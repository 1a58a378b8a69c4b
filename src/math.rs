use std::collections::BTreeSet;

/// Type alias for maps, we use this to hide which type of `HashMap` we are actually using.
pub type Map<K, V> = fxhash::FxHashMap<K, V>;
/// Type alias for sets whose iteration order matters, e.g. when a collection of states is
/// displayed or compared against the text it was parsed from.
pub type OrderedSet<S> = BTreeSet<S>;
