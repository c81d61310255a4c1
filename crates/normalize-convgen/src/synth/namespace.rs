//! Unique names for generated subplans.

use std::collections::HashSet;

/// Names claimed so far. Conflicts get a numeric suffix, with an underscore
/// in between when the name already ends in a digit (`answer42_2`).
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    used: HashSet<String>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `name` as taken. Returns false if it already was.
    pub fn reserve(&mut self, name: &str) -> bool {
        self.used.insert(name.to_string())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.used.contains(name)
    }

    /// Normalize `name` and claim the first free variant of it.
    pub fn claim(&mut self, name: &str) -> String {
        let name = normalize(name);
        if self.reserve(&name) {
            return name;
        }
        let sep = match name.chars().last() {
            Some(c) if c.is_ascii_digit() => "_",
            _ => "",
        };
        (2u64..)
            .map(|i| format!("{name}{sep}{i}"))
            .find(|candidate| self.reserve(candidate))
            .unwrap_or(name)
    }
}

/// Drop characters that cannot appear in an identifier, title-casing each
/// chunk after the first: `a.b-c` becomes `aBC`.
pub fn normalize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let chunks = name
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|chunk| !chunk.is_empty());
    for (i, chunk) in chunks.enumerate() {
        if i == 0 {
            out.push_str(chunk);
            continue;
        }
        let mut chars = chunk.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.push_str(&chars.as_str().to_ascii_lowercase());
        }
    }
    out
}
