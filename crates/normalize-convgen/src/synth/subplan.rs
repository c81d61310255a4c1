//! Registry of named subplans.
//!
//! An entry is reserved (with no plan yet) before its body is synthesized,
//! so a recursive reference to the same pair finds the name instead of
//! recursing again. The entry is filled on success and removed on failure.

use crate::plan::Plan;
use crate::schema::Type;
use indexmap::IndexMap;
use serde::Serialize;

/// A subplan: reserved while `plan` is `None`, complete afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subplan {
    pub name: String,
    pub source: Type,
    pub target: Type,
    pub fallible: bool,
    pub plan: Option<Plan>,
}

#[derive(Debug, Clone, Default)]
pub struct SubplanRegistry {
    entries: IndexMap<(Type, Type), Subplan>,
}

impl SubplanRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a placeholder for `(source, target)`.
    pub fn reserve(&mut self, name: &str, source: &Type, target: &Type, fallible: bool) {
        let entry = Subplan {
            name: name.to_string(),
            source: source.clone(),
            target: target.clone(),
            fallible,
            plan: None,
        };
        self.entries.insert((source.clone(), target.clone()), entry);
    }

    /// Complete a reserved entry. Returns false if there was none.
    pub fn fill(&mut self, source: &Type, target: &Type, plan: Plan) -> bool {
        match self.entries.get_mut(&(source.clone(), target.clone())) {
            Some(entry) => {
                entry.plan = Some(plan);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, source: &Type, target: &Type) -> Option<Subplan> {
        self.entries.shift_remove(&(source.clone(), target.clone()))
    }

    pub fn get(&self, source: &Type, target: &Type) -> Option<&Subplan> {
        self.entries.get(&(source.clone(), target.clone()))
    }

    /// Move every entry of `other` into this registry.
    pub fn merge(&mut self, other: SubplanRegistry) {
        self.entries.extend(other.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Subplan> {
        self.entries.values()
    }

    /// Completed entries, sorted by name.
    pub fn into_sorted(self) -> Vec<Subplan> {
        let mut out: Vec<Subplan> = self
            .entries
            .into_values()
            .filter(|entry| entry.plan.is_some())
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }
}
