//! Positions and their source locations.

use serde::Serialize;
use std::fmt;

/// Opaque handle to a place in some schema or configuration source.
///
/// Handles are cheap to copy and compare; [`SourceMap`] turns them into
/// human-readable locations when a diagnostic is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
#[serde(transparent)]
pub struct Pos(u32);

impl Pos {
    /// No position, also used as the "missing counterpart" sentinel.
    pub const NONE: Pos = Pos(0);

    pub fn is_valid(self) -> bool {
        self != Pos::NONE
    }
}

/// A resolved position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Allocates [`Pos`] handles and remembers where they point.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    locations: Vec<Location>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a location and return its handle.
    pub fn add(&mut self, file: impl Into<String>, line: u32, column: u32) -> Pos {
        self.locations.push(Location {
            file: file.into(),
            line,
            column,
        });
        // Handles start at 1 so that 0 stays free for `Pos::NONE`.
        Pos(u32::try_from(self.locations.len()).unwrap_or(u32::MAX))
    }

    pub fn get(&self, pos: Pos) -> Option<&Location> {
        let index = usize::try_from(pos.0).ok()?.checked_sub(1)?;
        self.locations.get(index)
    }

    /// `file:line:col`, or `-:-` for positions that were never registered.
    pub fn display(&self, pos: Pos) -> String {
        match self.get(pos) {
            Some(loc) => loc.to_string(),
            None => "-:-".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_resolve() {
        let mut map = SourceMap::new();
        let a = map.add("main.conv", 10, 5);
        let b = map.add("main.conv", 11, 5);
        assert!(a < b);
        assert_eq!(map.display(a), "main.conv:10:5");
        assert_eq!(map.display(b), "main.conv:11:5");
    }

    #[test]
    fn test_missing_position() {
        let map = SourceMap::new();
        assert!(!Pos::NONE.is_valid());
        assert_eq!(map.display(Pos::NONE), "-:-");
    }
}
