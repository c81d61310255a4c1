//! Synthesis errors.
//!
//! Failures are collected rather than returned at the first one: sibling
//! fields, members, and variants are all tried, and their errors are joined
//! into [`Errors`].

use crate::config::ConfigError;
use crate::matching::{FailureKind, MatchFailure};
use crate::schema::{Pos, SourceMap, Type};
use serde::Serialize;
use std::fmt;

/// Classification of any [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    MissingMatch,
    AmbiguousMatch,
    IneffectiveSkip,
    InvalidKey,
    LossyConversion,
    UnsupportedShape,
    IllegalErrorPropagation,
    DuplicateRegistration,
    RedeclaredVariantShape,
    UnresolvedPath,
    EmptyUnion,
    DefaultTypeMismatch,
    Config,
}

impl From<FailureKind> for ErrorKind {
    fn from(kind: FailureKind) -> Self {
        match kind {
            FailureKind::MissingMatch => ErrorKind::MissingMatch,
            FailureKind::AmbiguousMatch => ErrorKind::AmbiguousMatch,
            FailureKind::IneffectiveSkip => ErrorKind::IneffectiveSkip,
            FailureKind::InvalidKey => ErrorKind::InvalidKey,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The candidates of two types could not be paired up. `table` is the
    /// rendered verdict table, one row per line.
    #[error("invalid match between {source_label} and {target_label}\n{}", indent(.table))]
    InvalidMatch {
        source_label: String,
        target_label: String,
        failures: Vec<MatchFailure>,
        table: String,
        at: Pos,
    },

    #[error("cannot convert {source_ty} to {target_ty} without loss; register a custom function")]
    LossyConversion {
        source_ty: Type,
        target_ty: Type,
        at: Pos,
    },

    #[error("cannot convert {source_ty} to {target_ty}; register a custom function")]
    UnsupportedShape {
        source_ty: Type,
        target_ty: Type,
        at: Pos,
    },

    /// A conversion that must not fail would have to call `callee`, which can.
    #[error("cannot convert {source_ty} to {target_ty} without error: {callee} may fail")]
    IllegalErrorPropagation {
        callee: String,
        source_ty: Type,
        target_ty: Type,
        at: Pos,
    },

    #[error("conversion from {source_ty} to {target_ty} already registered at {previous}")]
    DuplicateRegistration {
        source_ty: Type,
        target_ty: Type,
        previous: String,
        at: Pos,
    },

    /// One variant named both by value and through a pointer.
    #[error("{declared} redeclared as {variant}\n\tprevious declaration at {previous}")]
    RedeclaredVariantShape {
        variant: Type,
        declared: Type,
        previous: String,
        at: Pos,
    },

    #[error("{path} does not name {what} of {owner}")]
    UnresolvedPath {
        path: String,
        what: &'static str,
        owner: Type,
        at: Pos,
    },

    #[error("union {union} has no methods to discover variants by")]
    EmptyUnion { union: Type, at: Pos },

    #[error("default member {member} has type {actual}, expected {expected}")]
    DefaultTypeMismatch {
        member: String,
        actual: Type,
        expected: Type,
        at: Pos,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn indent(table: &str) -> String {
    table
        .lines()
        .map(|line| format!("\t{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

impl Error {
    /// Where the error should be reported.
    pub fn at(&self) -> Pos {
        match self {
            Error::InvalidMatch { at, .. }
            | Error::LossyConversion { at, .. }
            | Error::UnsupportedShape { at, .. }
            | Error::IllegalErrorPropagation { at, .. }
            | Error::DuplicateRegistration { at, .. }
            | Error::RedeclaredVariantShape { at, .. }
            | Error::UnresolvedPath { at, .. }
            | Error::EmptyUnion { at, .. }
            | Error::DefaultTypeMismatch { at, .. } => *at,
            Error::Config(e) => e.at(),
        }
    }

    /// Every kind this error stands for. An invalid match reports the
    /// distinct kinds of its failing rows.
    pub fn kinds(&self) -> Vec<ErrorKind> {
        let single = match self {
            Error::InvalidMatch { failures, .. } => {
                let mut kinds: Vec<ErrorKind> = Vec::new();
                for failure in failures {
                    let kind = failure.kind.into();
                    if !kinds.contains(&kind) {
                        kinds.push(kind);
                    }
                }
                return kinds;
            }
            Error::LossyConversion { .. } => ErrorKind::LossyConversion,
            Error::UnsupportedShape { .. } => ErrorKind::UnsupportedShape,
            Error::IllegalErrorPropagation { .. } => ErrorKind::IllegalErrorPropagation,
            Error::DuplicateRegistration { .. } => ErrorKind::DuplicateRegistration,
            Error::RedeclaredVariantShape { .. } => ErrorKind::RedeclaredVariantShape,
            Error::UnresolvedPath { .. } => ErrorKind::UnresolvedPath,
            Error::EmptyUnion { .. } => ErrorKind::EmptyUnion,
            Error::DefaultTypeMismatch { .. } => ErrorKind::DefaultTypeMismatch,
            Error::Config(_) => ErrorKind::Config,
        };
        vec![single]
    }
}

/// Independent failures of one build, in the order they were found.
#[derive(Debug, Default)]
pub struct Errors(Vec<Error>);

impl Errors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, err: Error) {
        self.0.push(err);
    }

    pub fn extend(&mut self, other: Errors) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Error> {
        self.0.iter()
    }

    pub fn kinds(&self) -> Vec<ErrorKind> {
        self.0.iter().flat_map(Error::kinds).collect()
    }

    /// `Ok(value)` when nothing was collected.
    pub fn into_result<T>(self, value: T) -> Result<T, Errors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }

    /// One error per line, each prefixed with its resolved location.
    pub fn render(&self, sources: &SourceMap) -> String {
        self.0
            .iter()
            .map(|err| format!("{}: {err}", sources.display(err.at())))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<Error> for Errors {
    fn from(err: Error) -> Self {
        Self(vec![err])
    }
}

impl From<ConfigError> for Errors {
    fn from(err: ConfigError) -> Self {
        Self(vec![Error::Config(err)])
    }
}

impl FromIterator<Error> for Errors {
    fn from_iter<I: IntoIterator<Item = Error>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Errors {
    type Item = Error;
    type IntoIter = std::vec::IntoIter<Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Errors {
    type Item = &'a Error;
    type IntoIter = std::slice::Iter<'a, Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Errors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Errors {}
