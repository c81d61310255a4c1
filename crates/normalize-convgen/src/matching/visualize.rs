//! Diagnostic table for one match.
//!
//! Every classified pair becomes one row:
//!
//! ```text
//! ok:   Name      → Name
//! FAIL: Age       → ?          // missing
//! ok:   Nick      → Alias      // forced at main.conv:10:5
//! ok:   Secret    ‥ ?          // skipped missing at main.conv:11:5
//! ```
//!
//! Rows are keyed by their (source, target) slots, so a later rule can
//! overwrite an earlier verdict for the same pair.

use crate::schema::{Pos, SourceMap};
use indexmap::IndexMap;
use serde::Serialize;
use std::cmp::Ordering;

pub const MATCHED: &str = "→";
pub const SKIPPED: &str = "‥";
pub const MISSING: &str = "?";

/// Why a row has the verdict it has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    Forced(Pos),
    SkippedMissing(Pos),
    UnknownMayBeMissing,
    Missing,
    InvalidKey,
    IneffectiveSkip(Pos),
    SkippedMatch(Pos),
    Ambiguous,
}

impl Reason {
    pub fn render(self, sources: &SourceMap) -> String {
        match self {
            Reason::Forced(at) => format!("forced at {}", sources.display(at)),
            Reason::SkippedMissing(at) => format!("skipped missing at {}", sources.display(at)),
            Reason::UnknownMayBeMissing => "unknown value may be missing".to_string(),
            Reason::Missing => "missing".to_string(),
            Reason::InvalidKey => "renamed to an invalid key".to_string(),
            Reason::IneffectiveSkip(at) => format!("ineffective skip at {}", sources.display(at)),
            Reason::SkippedMatch(at) => format!("skipped match at {}", sources.display(at)),
            Reason::Ambiguous => "ambiguous".to_string(),
        }
    }
}

/// Failure classes that abort a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    MissingMatch,
    AmbiguousMatch,
    IneffectiveSkip,
    InvalidKey,
}

/// One failing row, in structured form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchFailure {
    pub kind: FailureKind,
    /// Display form of the source side, `None` when missing.
    pub source: Option<String>,
    pub target: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Verdict {
    ok: bool,
    skipped: bool,
    reason: Option<Reason>,
}

/// Display name and position of every candidate of one side, by slot.
#[derive(Debug, Clone, Default)]
pub struct Column {
    pub names: Vec<String>,
    pub positions: Vec<Pos>,
}

type Slot = (Option<usize>, Option<usize>);

/// Verdicts collected while the match rules run.
#[derive(Debug, Clone)]
pub struct Table {
    left: Column,
    right: Column,
    rows: IndexMap<Slot, Verdict>,
}

impl Table {
    pub fn new(left: Column, right: Column) -> Self {
        Self {
            left,
            right,
            rows: IndexMap::new(),
        }
    }

    fn put(&mut self, x: Option<usize>, y: Option<usize>, verdict: Verdict) {
        self.rows.insert((x, y), verdict);
        // A pair with both sides present supersedes their "missing" rows.
        if x.is_some() && y.is_some() {
            self.rows.shift_remove(&(x, None));
            self.rows.shift_remove(&(None, y));
        }
    }

    pub fn matched(&mut self, x: Option<usize>, y: Option<usize>, reason: Option<Reason>) {
        self.put(x, y, Verdict { ok: true, skipped: false, reason });
    }

    pub fn skipped(&mut self, x: Option<usize>, y: Option<usize>, reason: Reason) {
        let reason = Some(reason);
        self.put(x, y, Verdict { ok: true, skipped: true, reason });
    }

    pub fn match_failed(&mut self, x: Option<usize>, y: Option<usize>, reason: Reason) {
        let reason = Some(reason);
        self.put(x, y, Verdict { ok: false, skipped: false, reason });
    }

    pub fn skip_failed(&mut self, x: Option<usize>, y: Option<usize>, reason: Reason) {
        let reason = Some(reason);
        self.put(x, y, Verdict { ok: false, skipped: true, reason });
    }

    pub fn is_valid(&self) -> bool {
        self.rows.values().all(|v| v.ok)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn compare_slot(column: &Column, a: Option<usize>, b: Option<usize>) -> Ordering {
        match (a, b) {
            (Some(a), Some(b)) => {
                let (pa, pb) = (column.positions[a], column.positions[b]);
                // Unpositioned candidates go after positioned ones.
                pb.is_valid()
                    .cmp(&pa.is_valid())
                    .then(pa.cmp(&pb))
                    .then(a.cmp(&b))
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    fn sorted(&self) -> Vec<(Slot, Verdict)> {
        let mut rows: Vec<_> = self.rows.iter().map(|(k, v)| (*k, *v)).collect();
        rows.sort_by(|((ax, ay), _), ((bx, by), _)| {
            Self::compare_slot(&self.left, *ax, *bx)
                .then_with(|| Self::compare_slot(&self.right, *ay, *by))
        });
        rows
    }

    fn name(column: &Column, slot: Option<usize>) -> &str {
        slot.map_or(MISSING, |i| column.names[i].as_str())
    }

    /// Failing rows in display order.
    pub fn failures(&self) -> Vec<MatchFailure> {
        self.sorted()
            .into_iter()
            .filter(|(_, v)| !v.ok)
            .map(|((x, y), v)| MatchFailure {
                kind: match v.reason {
                    Some(Reason::Ambiguous) => FailureKind::AmbiguousMatch,
                    Some(Reason::IneffectiveSkip(_)) => FailureKind::IneffectiveSkip,
                    Some(Reason::InvalidKey) => FailureKind::InvalidKey,
                    _ => FailureKind::MissingMatch,
                },
                source: x.map(|i| self.left.names[i].clone()),
                target: y.map(|i| self.right.names[i].clone()),
            })
            .collect()
    }

    /// Render rows as aligned columns, one line per row, no trailing newline.
    pub fn render(&self, sources: &SourceMap) -> String {
        let lines: Vec<[String; 5]> = self
            .sorted()
            .into_iter()
            .map(|((x, y), v)| {
                [
                    if v.ok { "ok:" } else { "FAIL:" }.to_string(),
                    Self::name(&self.left, x).to_string(),
                    if v.skipped { SKIPPED } else { MATCHED }.to_string(),
                    Self::name(&self.right, y).to_string(),
                    v.reason
                        .map(|r| format!("// {}", r.render(sources)))
                        .unwrap_or_default(),
                ]
            })
            .collect();

        let width = |col: usize, only_with_reason: bool| {
            lines
                .iter()
                .filter(|cells| !only_with_reason || !cells[4].is_empty())
                .map(|cells| cells[col].chars().count())
                .max()
                .unwrap_or(0)
        };
        let widths = [width(0, false), width(1, false), width(2, false), width(3, true)];

        let mut out = String::new();
        for (i, cells) in lines.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            for (col, cell) in cells[..3].iter().enumerate() {
                pad(&mut out, cell, widths[col] + 1);
            }
            if cells[4].is_empty() {
                out.push_str(&cells[3]);
            } else {
                pad(&mut out, &cells[3], widths[3] + 1);
                out.push_str(&cells[4]);
            }
        }
        out
    }
}

fn pad(out: &mut String, cell: &str, width: usize) {
    out.push_str(cell);
    let len = cell.chars().count();
    out.extend(std::iter::repeat_n(' ', width.saturating_sub(len)));
}
