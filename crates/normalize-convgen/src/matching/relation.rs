//! Ordered, multi-valued, invertible relation.

use indexmap::{IndexMap, IndexSet};
use std::hash::Hash;

/// A many-to-many relation kept as two ordered multimaps.
///
/// Both views are only ever changed together, so every forward pair has its
/// backward twin. Keys with no remaining values are dropped, and iteration
/// follows insertion order.
#[derive(Debug, Clone)]
pub struct Relation<A, B> {
    forward: IndexMap<A, IndexSet<B>>,
    backward: IndexMap<B, IndexSet<A>>,
}

impl<A, B> Default for Relation<A, B> {
    fn default() -> Self {
        Self {
            forward: IndexMap::new(),
            backward: IndexMap::new(),
        }
    }
}

impl<A, B> Relation<A, B>
where
    A: Clone + Eq + Hash,
    B: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, a: A, b: B) {
        self.forward.entry(a.clone()).or_default().insert(b.clone());
        self.backward.entry(b).or_default().insert(a);
    }

    pub fn remove(&mut self, a: &A, b: &B) {
        if let Some(bs) = self.forward.get_mut(a) {
            bs.shift_remove(b);
            if bs.is_empty() {
                self.forward.shift_remove(a);
            }
        }
        if let Some(as_) = self.backward.get_mut(b) {
            as_.shift_remove(a);
            if as_.is_empty() {
                self.backward.shift_remove(b);
            }
        }
    }

    pub fn has(&self, a: &A, b: &B) -> bool {
        self.forward.get(a).is_some_and(|bs| bs.contains(b))
    }

    /// Values related to `a`, in the order they were added.
    pub fn forward(&self, a: &A) -> impl Iterator<Item = &B> {
        self.forward.get(a).into_iter().flatten()
    }

    /// Keys related to `b`, in the order they were added.
    pub fn backward(&self, b: &B) -> impl Iterator<Item = &A> {
        self.backward.get(b).into_iter().flatten()
    }

    pub fn has_forward(&self, a: &A) -> bool {
        self.forward.contains_key(a)
    }

    pub fn has_backward(&self, b: &B) -> bool {
        self.backward.contains_key(b)
    }

    /// All pairs, grouped by key in key insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&A, &B)> {
        self.forward
            .iter()
            .flat_map(|(a, bs)| bs.iter().map(move |b| (a, b)))
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}
