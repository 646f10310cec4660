use std::collections::HashMap;
use std::hash::Hash;

use crate::model::{Match, SideView};

/// Name-to-accumulator map that remembers first-insertion order, so equal sort keys keep the
/// order in which their teams were first seen.
#[derive(Debug, Clone)]
pub struct KeyedFold<K, A> {
    index: HashMap<K, usize>,
    entries: Vec<(K, A)>,
}

impl<K: Eq + Hash + Clone, A> KeyedFold<K, A> {
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    pub fn entry_with(&mut self, key: &K, init: impl FnOnce() -> A) -> &mut A {
        let idx = match self.index.get(key) {
            Some(idx) => *idx,
            None => {
                let idx = self.entries.len();
                self.index.insert(key.clone(), idx);
                self.entries.push((key.clone(), init()));
                idx
            }
        };
        &mut self.entries[idx].1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<(K, A)> {
        self.entries
    }
}

impl<K: Eq + Hash + Clone, A: Default> KeyedFold<K, A> {
    pub fn entry(&mut self, key: &K) -> &mut A {
        self.entry_with(key, A::default)
    }
}

impl<K: Eq + Hash + Clone, A> Default for KeyedFold<K, A> {
    fn default() -> Self {
        Self::new()
    }
}

/// Folds every side of every match into a per-key accumulator and materialises the result.
///
/// `key` picks the accumulator a side contributes to (`None` skips the side), `update` applies
/// the side to it and `finalize` turns each finished accumulator into an output row. Rows come
/// back in first-seen key order; callers sort afterwards.
pub fn fold_sides<'a, I, K, A, O>(
    matches: I,
    mut key: impl FnMut(&SideView<'a>) -> Option<K>,
    mut update: impl FnMut(&mut A, &SideView<'a>),
    mut finalize: impl FnMut(K, A) -> O,
) -> Vec<O>
where
    I: IntoIterator<Item = &'a Match>,
    K: Eq + Hash + Clone,
    A: Default,
{
    let mut fold: KeyedFold<K, A> = KeyedFold::new();
    for m in matches {
        for side in m.sides() {
            let Some(k) = key(&side) else {
                continue;
            };
            update(fold.entry(&k), &side);
        }
    }
    fold.into_entries()
        .into_iter()
        .map(|(k, acc)| finalize(k, acc))
        .collect()
}

/// `fold_sides` keyed by team name, the shape shared by the per-team league tables.
pub fn fold_by_team<'a, I, A, O>(
    matches: I,
    update: impl FnMut(&mut A, &SideView<'a>),
    finalize: impl FnMut(String, A) -> O,
) -> Vec<O>
where
    I: IntoIterator<Item = &'a Match>,
    A: Default,
{
    fold_sides(matches, |side| Some(side.team.name.clone()), update, finalize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyed_fold_keeps_first_seen_order() {
        let mut fold: KeyedFold<String, u32> = KeyedFold::new();
        assert!(fold.is_empty());
        for name in ["b", "a", "b", "c", "a"] {
            *fold.entry(&name.to_string()) += 1;
        }
        assert_eq!(fold.len(), 3);
        let entries = fold.into_entries();
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
        assert_eq!(entries[0].1, 2);
        assert_eq!(entries[2].1, 1);
    }
}
