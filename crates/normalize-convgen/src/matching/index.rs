//! Candidate collection and key indexing for one side of a match.

use crate::rename::RenamePipeline;
use crate::schema::Pos;
use indexmap::IndexMap;
use std::collections::HashMap;

/// Something that can be matched against a counterpart on the other side:
/// a record field or accessor, an enumeration member, a union variant.
pub trait Candidate: Clone {
    /// Stable identity within one side. Doubles as the display name in
    /// diagnostics (`Name`, `Inner.Name`, `GetName()`, `a.Circle`).
    fn crumb(&self) -> &str;

    /// Declaration position, used to order diagnostics.
    fn pos(&self) -> Pos;

    fn exported(&self) -> bool {
        true
    }
}

/// Match keys are non-empty and dot-free. Discovery only produces such keys;
/// a rename can break either rule, and such a candidate never matches by key.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && !key.contains('.')
}

/// Candidates of one side in discovery order, each with its literal key.
#[derive(Debug, Clone)]
pub struct CandidateSet<T> {
    entries: IndexMap<String, (T, String)>,
}

impl<T> Default for CandidateSet<T> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<T: Candidate> CandidateSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a candidate under its unrenamed key. Adding the same identity
    /// again replaces the earlier entry in place.
    pub fn add(&mut self, candidate: T, key: impl Into<String>) {
        let key = key.into();
        debug_assert!(is_valid_key(&key), "invalid match key {key:?}");
        self.entries
            .insert(candidate.crumb().to_string(), (candidate, key));
    }

    /// Retract a candidate, e.g. one superseded by nested flattening.
    pub fn delete(&mut self, crumb: &str) {
        self.entries.shift_remove(crumb);
    }

    pub fn contains(&self, crumb: &str) -> bool {
        self.entries.contains_key(crumb)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A candidate with its final match key.
#[derive(Debug, Clone)]
pub struct Entry<T> {
    pub candidate: T,
    pub key: String,
}

impl<T: Candidate> Entry<T> {
    pub fn has_valid_key(&self) -> bool {
        is_valid_key(&self.key)
    }

    /// `key [crumb]`, or just the crumb when renaming left it unchanged. An
    /// emptied key shows as `""`.
    pub fn display(&self) -> String {
        let crumb = self.candidate.crumb();
        if self.key.is_empty() {
            format!("\"\" [{crumb}]")
        } else if self.key == crumb {
            crumb.to_string()
        } else {
            format!("{} [{crumb}]", self.key)
        }
    }
}

/// Renamed candidates of one side, addressable by key and by identity.
#[derive(Debug, Clone)]
pub struct CandidateIndex<T> {
    entries: Vec<Entry<T>>,
    by_key: HashMap<String, Vec<usize>>,
    by_crumb: HashMap<String, usize>,
}

impl<T: Candidate> CandidateIndex<T> {
    /// Run the rename pipeline over the current keys and index the result.
    pub fn build(set: &CandidateSet<T>, pipeline: &RenamePipeline) -> Self {
        let mut keys: Vec<String> = set.entries.values().map(|(_, key)| key.clone()).collect();
        pipeline.apply(&mut keys);

        let entries: Vec<Entry<T>> = set
            .entries
            .values()
            .zip(keys)
            .map(|((candidate, _), key)| Entry {
                candidate: candidate.clone(),
                key,
            })
            .collect();

        let mut by_key: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_crumb = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            by_key.entry(entry.key.clone()).or_default().push(i);
            by_crumb.insert(entry.candidate.crumb().to_string(), i);
        }

        Self {
            entries,
            by_key,
            by_crumb,
        }
    }

    pub fn entries(&self) -> &[Entry<T>] {
        &self.entries
    }

    pub fn entry(&self, i: usize) -> &Entry<T> {
        &self.entries[i]
    }

    /// Every entry sharing `key`, in discovery order.
    pub fn by_key(&self, key: &str) -> &[usize] {
        self.by_key.get(key).map_or(&[], Vec::as_slice)
    }

    pub fn by_crumb(&self, crumb: &str) -> Option<usize> {
        self.by_crumb.get(crumb).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rename::RenameRule;

    #[derive(Debug, Clone)]
    struct Name(&'static str, u32);

    impl Candidate for Name {
        fn crumb(&self) -> &str {
            self.0
        }
        fn pos(&self) -> Pos {
            Pos::NONE
        }
    }

    fn lower_then_trim() -> RenamePipeline {
        let mut p = RenamePipeline::new();
        for rule in [RenameRule::Lower, RenameRule::TrimCommonPrefix] {
            p.push(rule.compile().unwrap().unwrap());
        }
        p
    }

    #[test]
    fn test_keys_are_renamed_together() {
        let mut set = CandidateSet::new();
        set.add(Name("UserName", 1), "UserName");
        set.add(Name("UserID", 2), "UserID");
        let index = CandidateIndex::build(&set, &lower_then_trim());
        let keys: Vec<_> = index.entries().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, ["name", "id"]);
        assert_eq!(index.entry(0).display(), "name [UserName]");
    }

    #[test]
    fn test_colliding_keys_are_preserved() {
        let mut set = CandidateSet::new();
        set.add(Name("A", 1), "k");
        set.add(Name("B", 2), "k");
        let index = CandidateIndex::build(&set, &RenamePipeline::new());
        assert_eq!(index.by_key("k"), [0, 1]);
        assert_eq!(index.by_key("missing"), [] as [usize; 0]);
    }

    #[test]
    fn test_renames_can_break_keys() {
        let mut set = CandidateSet::new();
        set.add(Name("Id", 1), "Id");
        set.add(Name("Name", 2), "Name");
        let mut p = RenamePipeline::new();
        let rules = [
            RenameRule::TrimPrefix {
                prefix: "Id".into(),
            },
            RenameRule::Replace {
                from: "a".into(),
                to: ".".into(),
            },
        ];
        for rule in rules {
            p.push(rule.compile().unwrap().unwrap());
        }
        let index = CandidateIndex::build(&set, &p);
        assert_eq!(index.entry(0).key, "");
        assert_eq!(index.entry(1).key, "N.me");
        assert!(!index.entry(0).has_valid_key());
        assert!(!index.entry(1).has_valid_key());
        assert!(is_valid_key("name"));
    }

    #[test]
    fn test_delete_by_identity() {
        let mut set = CandidateSet::new();
        set.add(Name("Inner", 1), "Inner");
        set.add(Name("Inner.Value", 2), "Value");
        set.delete("Inner");
        let index = CandidateIndex::build(&set, &RenamePipeline::new());
        assert_eq!(index.len(), 1);
        assert_eq!(index.by_crumb("Inner.Value"), Some(0));
        assert_eq!(index.by_crumb("Inner"), None);
    }

    #[test]
    fn test_readding_keeps_position() {
        let mut set = CandidateSet::new();
        set.add(Name("A", 1), "A");
        set.add(Name("B", 2), "B");
        set.add(Name("A", 3), "A");
        let index = CandidateIndex::build(&set, &RenamePipeline::new());
        assert_eq!(index.entry(0).candidate.1, 3);
        assert_eq!(index.entry(1).candidate.0, "B");
    }
}
