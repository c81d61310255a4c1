//! Pairs up the candidates of two sides.
//!
//! ```text
//!  sources ──rename──┐                          ┌── matches
//!                    ├─ key ─ forced ─ missing ─ skip ─ ambiguous ─┤
//!  targets ──rename──┘                          └── table (on failure)
//! ```
//!
//! The rules run in that fixed order, each seeing the links left by the ones
//! before it. Forced pairs take their sides out of key matching; skips run
//! after missing classification so that a skipped pair is not reported as
//! missing; ambiguity is judged last, on the surviving links only.

use super::index::{Candidate, CandidateIndex, CandidateSet, Entry};
use super::relation::Relation;
use super::visualize::{Column, Reason, Table};
use crate::error::Error;
use crate::rename::RenamePipeline;
use crate::schema::{Pos, SourceMap};
use indexmap::IndexMap;
use std::collections::HashMap;

/// A surviving (source, target) pair.
#[derive(Debug, Clone)]
pub struct Match<T> {
    pub x: T,
    pub y: T,
}

/// Matches the candidates of a source (`x`) and a target (`y`) side.
#[derive(Debug, Clone)]
pub struct Matcher<T> {
    source_label: String,
    target_label: String,
    xs: CandidateSet<T>,
    ys: CandidateSet<T>,
    rename_x: RenamePipeline,
    rename_y: RenamePipeline,
    forced: Relation<String, String>,
    forced_at: HashMap<(String, String), Pos>,
    skipped_at: IndexMap<(Option<String>, Option<String>), Pos>,
    default_y: Option<String>,
}

impl<T: Candidate> Matcher<T> {
    pub fn new(
        source_label: impl Into<String>,
        target_label: impl Into<String>,
        rename_x: RenamePipeline,
        rename_y: RenamePipeline,
    ) -> Self {
        Self {
            source_label: source_label.into(),
            target_label: target_label.into(),
            xs: CandidateSet::new(),
            ys: CandidateSet::new(),
            rename_x,
            rename_y,
            forced: Relation::new(),
            forced_at: HashMap::new(),
            skipped_at: IndexMap::new(),
            default_y: None,
        }
    }

    pub fn add_x(&mut self, x: T, key: impl Into<String>) {
        self.xs.add(x, key);
    }

    pub fn add_y(&mut self, y: T, key: impl Into<String>) {
        self.ys.add(y, key);
    }

    pub fn delete_x(&mut self, crumb: &str) {
        self.xs.delete(crumb);
    }

    pub fn delete_y(&mut self, crumb: &str) {
        self.ys.delete(crumb);
    }

    pub fn has_x(&self, crumb: &str) -> bool {
        self.xs.contains(crumb)
    }

    pub fn has_y(&self, crumb: &str) -> bool {
        self.ys.contains(crumb)
    }

    /// Link `x` to `y` regardless of their keys.
    pub fn force(&mut self, x: &str, y: &str, at: Pos) {
        self.forced.add(x.to_string(), y.to_string());
        self.forced_at.insert((x.to_string(), y.to_string()), at);
    }

    /// Declare that `x` and `y` must not be paired. `None` on one side means
    /// the other side is expected to have no counterpart at all.
    pub fn skip(&mut self, x: Option<&str>, y: Option<&str>, at: Pos) {
        let key = (x.map(str::to_string), y.map(str::to_string));
        self.skipped_at.insert(key, at);
    }

    /// The target member that stands for "unknown"; it may stay unmatched.
    pub fn set_default_target(&mut self, y: &str) {
        self.default_y = Some(y.to_string());
    }

    /// Run every rule, returning the surviving matches and the verdict table.
    pub fn run(&self) -> (Vec<Match<T>>, Table) {
        let xs = CandidateIndex::build(&self.xs, &self.rename_x);
        let ys = CandidateIndex::build(&self.ys, &self.rename_y);
        let mut links = Relation::<usize, usize>::new();
        let mut table = Table::new(column(&xs), column(&ys));

        self.rule_key(&xs, &ys, &mut links, &mut table);
        self.rule_forced(&xs, &ys, &mut links, &mut table);
        self.rule_missing(&xs, &ys, &links, &mut table);
        self.rule_skip(&xs, &ys, &mut links, &mut table);
        rule_ambiguous(&ys, &links, &mut table);

        let mut matches = Vec::new();
        for (i, x) in xs.entries().iter().enumerate() {
            for &j in links.forward(&i) {
                matches.push(Match {
                    x: x.candidate.clone(),
                    y: ys.entry(j).candidate.clone(),
                });
            }
        }
        (matches, table)
    }

    /// The matches, or [`Error::InvalidMatch`] carrying the full table.
    pub fn matches(&self, sources: &SourceMap, at: Pos) -> Result<Vec<Match<T>>, Error> {
        let (matches, table) = self.run();
        if table.is_valid() {
            return Ok(matches);
        }
        Err(Error::InvalidMatch {
            source_label: self.source_label.clone(),
            target_label: self.target_label.clone(),
            failures: table.failures(),
            table: table.render(sources),
            at,
        })
    }

    /// The verdict table, whether or not the match is valid.
    pub fn visualize(&self, sources: &SourceMap) -> String {
        self.run().1.render(sources)
    }

    fn rule_key(
        &self,
        xs: &CandidateIndex<T>,
        ys: &CandidateIndex<T>,
        links: &mut Relation<usize, usize>,
        table: &mut Table,
    ) {
        for (i, x) in xs.entries().iter().enumerate() {
            if !x.has_valid_key() || self.forced.has_forward(&x.candidate.crumb().to_string()) {
                continue;
            }
            for &j in ys.by_key(&x.key) {
                let y = ys.entry(j).candidate.crumb().to_string();
                if !ys.entry(j).has_valid_key() || self.forced.has_backward(&y) {
                    continue;
                }
                tracing::trace!(x = %x.candidate.crumb(), %y, key = %x.key, "linked by key");
                links.add(i, j);
                table.matched(Some(i), Some(j), None);
            }
        }
    }

    fn rule_forced(
        &self,
        xs: &CandidateIndex<T>,
        ys: &CandidateIndex<T>,
        links: &mut Relation<usize, usize>,
        table: &mut Table,
    ) {
        for (x, y) in self.forced.iter() {
            let (Some(i), Some(j)) = (xs.by_crumb(x), ys.by_crumb(y)) else {
                continue;
            };
            let at = self
                .forced_at
                .get(&(x.clone(), y.clone()))
                .copied()
                .unwrap_or(Pos::NONE);
            tracing::trace!(%x, %y, "linked by force");
            links.add(i, j);
            table.matched(Some(i), Some(j), Some(Reason::Forced(at)));
        }
    }

    fn rule_missing(
        &self,
        xs: &CandidateIndex<T>,
        ys: &CandidateIndex<T>,
        links: &Relation<usize, usize>,
        table: &mut Table,
    ) {
        for (i, x) in xs.entries().iter().enumerate() {
            if links.has_forward(&i) {
                continue;
            }
            let crumb = x.candidate.crumb().to_string();
            match self.skipped_at.get(&(Some(crumb), None)) {
                Some(&at) => table.skipped(Some(i), None, Reason::SkippedMissing(at)),
                None => table.match_failed(Some(i), None, missing(x)),
            }
        }
        for (j, y) in ys.entries().iter().enumerate() {
            if links.has_backward(&j) {
                continue;
            }
            let crumb = y.candidate.crumb().to_string();
            if let Some(&at) = self.skipped_at.get(&(None, Some(crumb.clone()))) {
                table.skipped(None, Some(j), Reason::SkippedMissing(at));
            } else if self.default_y.as_deref() == Some(crumb.as_str()) {
                table.matched(None, Some(j), Some(Reason::UnknownMayBeMissing));
            } else {
                table.match_failed(None, Some(j), missing(y));
            }
        }
    }

    fn rule_skip(
        &self,
        xs: &CandidateIndex<T>,
        ys: &CandidateIndex<T>,
        links: &mut Relation<usize, usize>,
        table: &mut Table,
    ) {
        for ((x, y), &at) in &self.skipped_at {
            let i = x.as_deref().and_then(|x| xs.by_crumb(x));
            let j = y.as_deref().and_then(|y| ys.by_crumb(y));

            let linked = match (i, j) {
                (None, None) => true,
                (Some(i), None) => !links.has_forward(&i),
                (None, Some(j)) => !links.has_backward(&j),
                (Some(i), Some(j)) => links.has(&i, &j),
            };
            if !linked {
                table.skip_failed(i, j, Reason::IneffectiveSkip(at));
                continue;
            }

            let (Some(i), Some(j)) = (i, j) else {
                // Classified as skipped-missing already.
                continue;
            };
            links.remove(&i, &j);
            table.skipped(Some(i), Some(j), Reason::SkippedMatch(at));
        }
    }
}

/// Why an unlinked candidate failed: a broken key could never have matched.
fn missing<T: Candidate>(entry: &Entry<T>) -> Reason {
    if entry.has_valid_key() {
        Reason::Missing
    } else {
        Reason::InvalidKey
    }
}

fn rule_ambiguous<T: Candidate>(
    ys: &CandidateIndex<T>,
    links: &Relation<usize, usize>,
    table: &mut Table,
) {
    for j in 0..ys.len() {
        // Fan-out from one source is fine; several sources for one target
        // would lose information.
        for &i in links.backward(&j).skip(1) {
            table.match_failed(Some(i), Some(j), Reason::Ambiguous);
        }
    }
}

fn column<T: Candidate>(index: &CandidateIndex<T>) -> Column {
    Column {
        names: index.entries().iter().map(|e| e.display()).collect(),
        positions: index.entries().iter().map(|e| e.candidate.pos()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::FailureKind;
    use crate::rename::RenameRule;

    #[derive(Debug, Clone, PartialEq)]
    struct Obj {
        crumb: &'static str,
        pos: Pos,
    }

    impl Candidate for Obj {
        fn crumb(&self) -> &str {
            self.crumb
        }
        fn pos(&self) -> Pos {
            self.pos
        }
    }

    struct Fixture {
        sources: SourceMap,
        lines: u32,
        matcher: Matcher<Obj>,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_renames(RenamePipeline::new(), RenamePipeline::new())
        }

        fn with_renames(rename_x: RenamePipeline, rename_y: RenamePipeline) -> Self {
            Self {
                sources: SourceMap::new(),
                lines: 0,
                matcher: Matcher::new("fruit.Basket", "person.Group", rename_x, rename_y),
            }
        }

        fn obj(&mut self, crumb: &'static str) -> Obj {
            self.lines += 1;
            let pos = self.sources.add("t.schema", self.lines, 1);
            Obj { crumb, pos }
        }

        fn x(&mut self, crumb: &'static str, key: &str) -> &mut Self {
            let obj = self.obj(crumb);
            self.matcher.add_x(obj, key);
            self
        }

        fn y(&mut self, crumb: &'static str, key: &str) -> &mut Self {
            let obj = self.obj(crumb);
            self.matcher.add_y(obj, key);
            self
        }

        fn at(&mut self, line: u32) -> Pos {
            self.sources.add("main.conv", line, 5)
        }

        fn pairs(&self) -> Vec<(&'static str, &'static str)> {
            self.matcher
                .matches(&self.sources, Pos::NONE)
                .unwrap()
                .into_iter()
                .map(|m| (m.x.crumb, m.y.crumb))
                .collect()
        }

        fn table(&self) -> String {
            self.matcher.visualize(&self.sources)
        }
    }

    #[test]
    fn test_one_to_one() {
        let mut f = Fixture::new();
        f.x("apple", "A").y("alice", "A").x("banana", "B").y("bob", "B");
        assert_eq!(f.pairs(), [("apple", "alice"), ("banana", "bob")]);
    }

    #[test]
    fn test_missing_on_both_sides() {
        let mut f = Fixture::new();
        f.x("Apple", "Apple")
            .y("Alice", "Alice")
            .x("Banana", "Banana")
            .y("Bob", "Bob")
            .x("Clementine", "Clementine")
            .y("Clementine", "Clementine");
        insta::assert_snapshot!(f.table(), @r"
        FAIL: Apple      → ?     // missing
        FAIL: Banana     → ?     // missing
        ok:   Clementine → Clementine
        FAIL: ?          → Alice // missing
        FAIL: ?          → Bob   // missing
        ");

        let err = f.matcher.matches(&f.sources, Pos::NONE).unwrap_err();
        let Error::InvalidMatch { failures, .. } = &err else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(failures.len(), 4);
        assert!(failures.iter().all(|f| f.kind == FailureKind::MissingMatch));
        assert!(err.to_string().starts_with(
            "invalid match between fruit.Basket and person.Group\n\tFAIL: Apple"
        ));
    }

    #[test]
    fn test_key_order_does_not_matter() {
        let mut a = Fixture::new();
        a.x("x1", "One").x("x2", "Two").y("y2", "Two").y("y1", "One");
        let mut b = Fixture::new();
        b.x("x2", "Two").x("x1", "One").y("y1", "One").y("y2", "Two");

        let mut pa = a.pairs();
        let mut pb = b.pairs();
        pa.sort();
        pb.sort();
        assert_eq!(pa, pb);
    }

    #[test]
    fn test_fan_out_is_allowed() {
        let mut f = Fixture::new();
        f.x("x", "K").y("y1", "K").y("y2", "K");
        assert_eq!(f.pairs(), [("x", "y1"), ("x", "y2")]);
    }

    #[test]
    fn test_ambiguity_keeps_first_source() {
        let mut f = Fixture::new();
        f.x("x1", "K").x("x2", "K").x("x3", "K").y("y", "K");
        let (_, table) = f.matcher.run();
        let failures = table.failures();
        assert_eq!(failures.len(), 2);
        assert!(failures.iter().all(|f| f.kind == FailureKind::AmbiguousMatch));
        assert_eq!(failures[0].source.as_deref(), Some("x2"));
        assert_eq!(failures[1].source.as_deref(), Some("x3"));
        insta::assert_snapshot!(f.table(), @r"
        ok:   x1 → y
        FAIL: x2 → y // ambiguous
        FAIL: x3 → y // ambiguous
        ");
    }

    #[test]
    fn test_forced_links_cross_key_matches() {
        let mut f = Fixture::new();
        f.x("A", "A").x("B", "B").y("A", "A").y("B", "B");
        let at1 = f.at(10);
        let at2 = f.at(11);
        f.matcher.force("A", "B", at1);
        f.matcher.force("B", "A", at2);
        assert_eq!(f.pairs(), [("A", "B"), ("B", "A")]);
        insta::assert_snapshot!(f.table(), @r"
        ok: A → B // forced at main.conv:10:5
        ok: B → A // forced at main.conv:11:5
        ");
    }

    #[test]
    fn test_crossed_forces_on_interleaved_sides() {
        // Positions 1..4 alternate between the sides; 1 → 4 and 3 → 2 are
        // forced against the key matches 1 → 2 and 3 → 4.
        let mut f = Fixture::new();
        f.x("apple", "A")
            .y("alice", "A")
            .x("banana", "B")
            .y("bob", "B");
        f.matcher.force("apple", "bob", Pos::NONE);
        f.matcher.force("banana", "alice", Pos::NONE);
        assert_eq!(f.pairs(), [("apple", "bob"), ("banana", "alice")]);
        insta::assert_snapshot!(f.table(), @r"
        ok: A [apple]  → B [bob]   // forced at -:-
        ok: B [banana] → A [alice] // forced at -:-
        ");
    }

    #[test]
    fn test_emptied_key_is_reported() {
        let mut trim = RenamePipeline::new();
        let rule = RenameRule::TrimPrefix {
            prefix: "Id".into(),
        };
        if let Some(stage) = rule.compile().unwrap() {
            trim.push(stage);
        }
        let mut f = Fixture::with_renames(trim, RenamePipeline::new());
        f.x("Id", "Id").x("IdName", "IdName").y("Name", "Name");
        insta::assert_snapshot!(f.table(), @r#"
        FAIL: "" [Id]       → ? // renamed to an invalid key
        ok:   Name [IdName] → Name
        "#);

        let (_, table) = f.matcher.run();
        let failures: Vec<_> = table
            .failures()
            .into_iter()
            .map(|f| (f.kind, f.source, f.target))
            .collect();
        assert_eq!(
            failures,
            [(FailureKind::InvalidKey, Some(r#""" [Id]"#.to_string()), None)]
        );
    }

    #[test]
    fn test_dotted_keys_never_match() {
        let mut dots = RenamePipeline::new();
        let rule = RenameRule::Replace {
            from: "_".into(),
            to: ".".into(),
        };
        if let Some(stage) = rule.compile().unwrap() {
            dots.push(stage);
        }
        let mut f = Fixture::with_renames(dots.clone(), dots);
        f.x("a_b", "a_b").y("a_b", "a_b");
        let (matches, table) = f.matcher.run();
        assert!(matches.is_empty());
        let failures = table.failures();
        assert_eq!(failures.len(), 2);
        assert!(failures.iter().all(|f| f.kind == FailureKind::InvalidKey));
    }

    #[test]
    fn test_forced_side_leaves_key_matching() {
        // C shares a key with A on the target side, but A is forced elsewhere
        // so only A's side is withdrawn.
        let mut f = Fixture::new();
        f.x("A", "K").x("C", "K").y("K", "K").y("Z", "Z");
        let at = f.at(3);
        f.matcher.force("A", "Z", at);
        assert_eq!(f.pairs(), [("A", "Z"), ("C", "K")]);
    }

    #[test]
    fn test_skip_missing_and_default_target() {
        let mut f = Fixture::new();
        f.x("Secret", "Secret").y("Unknown", "Unknown").y("Extra", "Extra");
        let at1 = f.at(20);
        let at2 = f.at(21);
        f.matcher.skip(Some("Secret"), None, at1);
        f.matcher.skip(None, Some("Extra"), at2);
        f.matcher.set_default_target("Unknown");
        assert!(f.pairs().is_empty());
        insta::assert_snapshot!(f.table(), @r"
        ok: Secret ‥ ?       // skipped missing at main.conv:20:5
        ok: ?      → Unknown // unknown value may be missing
        ok: ?      ‥ Extra   // skipped missing at main.conv:21:5
        ");
    }

    #[test]
    fn test_skip_matched_pair() {
        let mut f = Fixture::new();
        f.x("A", "A").y("A", "A");
        let at = f.at(4);
        f.matcher.skip(Some("A"), Some("A"), at);
        assert!(f.pairs().is_empty());
        insta::assert_snapshot!(f.table(), @"ok: A ‥ A // skipped match at main.conv:4:5");
    }

    #[test]
    fn test_ineffective_skip() {
        let mut f = Fixture::new();
        f.x("A", "A").y("A", "A").x("B", "B").y("C", "C");
        let at1 = f.at(5);
        let at2 = f.at(6);
        f.matcher.skip(Some("B"), Some("C"), at1);
        f.matcher.skip(Some("A"), None, at2);
        // A verdict on the concrete (B, C) pair replaces their missing rows.
        let (_, table) = f.matcher.run();
        let failures: Vec<_> = table
            .failures()
            .into_iter()
            .map(|f| (f.kind, f.source, f.target))
            .collect();
        assert_eq!(
            failures,
            [
                (FailureKind::IneffectiveSkip, Some("A".into()), None),
                (
                    FailureKind::IneffectiveSkip,
                    Some("B".into()),
                    Some("C".into())
                ),
            ]
        );
    }

    #[test]
    fn test_renamed_keys_show_crumb() {
        let mut lower = RenamePipeline::new();
        if let Some(stage) = RenameRule::Lower.compile().unwrap() {
            lower.push(stage);
        }
        let mut f = Fixture::with_renames(lower, RenamePipeline::new());
        f.x("NAME", "NAME").y("name", "name");
        assert_eq!(f.pairs(), [("NAME", "name")]);
        insta::assert_snapshot!(f.table(), @"ok: name [NAME] → name");
    }
}
