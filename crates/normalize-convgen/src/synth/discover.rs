//! Candidate discovery shared by records, enumerations and unions.
//!
//! Each kind implements [`Discovery`]; [`discover`] wires it to a
//! [`Matcher`] together with the forced pairs and skips of the active
//! configuration.

use crate::config::{Config, MatchFunc};
use crate::error::{Error, Errors};
use crate::matching::{Candidate, Matcher};
use crate::schema::{Pos, Scope, Type, Universe};
use std::collections::{HashMap, HashSet};

/// Custom functions of forced pairs, keyed by (source crumb, target crumb).
pub(crate) type MatchFuncs = HashMap<(String, String), MatchFunc>;

pub(crate) trait Discovery {
    type Candidate: Candidate;

    /// Add the default candidates of the source side.
    fn discover_x(&self, sink: &mut Sink<'_, Self::Candidate>) -> Result<(), Errors>;

    /// Add the default candidates of the target side.
    fn discover_y(&self, sink: &mut Sink<'_, Self::Candidate>) -> Result<(), Errors>;

    /// Turn a directive path into a source candidate and its match key.
    fn resolve_x(&self, path: &str, at: Pos) -> Result<(Self::Candidate, String), Error>;

    fn resolve_y(&self, path: &str, at: Pos) -> Result<(Self::Candidate, String), Error>;
}

/// Where a discovery puts the candidates of one side.
///
/// Unexported candidates are dropped unless a forced pair names them or
/// unexported discovery is enabled for the side.
pub(crate) struct Sink<'m, T> {
    matcher: &'m mut Matcher<T>,
    source: bool,
    explicit: &'m HashSet<String>,
    unexported: bool,
}

impl<T: Candidate> Sink<'_, T> {
    pub fn add(&mut self, candidate: T, key: impl Into<String>) {
        if !candidate.exported() && !self.unexported && !self.explicit.contains(candidate.crumb())
        {
            return;
        }
        if self.source {
            self.matcher.add_x(candidate, key);
        } else {
            self.matcher.add_y(candidate, key);
        }
    }

    /// Retract a candidate added earlier.
    pub fn delete(&mut self, crumb: &str) {
        if self.source {
            self.matcher.delete_x(crumb);
        } else {
            self.matcher.delete_y(crumb);
        }
    }
}

/// The scope enumeration members or union variants of `ty` are discovered
/// in: the side's sample scope when one is configured, else the scope
/// declaring `ty`.
pub(crate) fn discovery_scope<'a>(
    universe: &'a Universe,
    cfg: &Config,
    ty: &Type,
    source: bool,
) -> Result<&'a Scope, Error> {
    let sample = cfg
        .sample
        .as_ref()
        .and_then(|s| if source { s.x.as_deref() } else { s.y.as_deref() });
    let name = match (sample, ty.as_named()) {
        (Some(sample), _) => sample,
        (None, Some(named)) => named.scope.as_str(),
        (None, None) => "",
    };
    universe.scope(name).ok_or_else(|| Error::UnresolvedPath {
        path: name.to_string(),
        what: "a declaration scope",
        owner: ty.clone(),
        at: Pos::NONE,
    })
}

/// Fill `matcher` from `discovery` and the directives in `cfg`, collecting
/// failures into `errs`.
///
/// Forced pairs are resolved first so that the unexported filter can let
/// them through, and added again after discovery so that they are present
/// even when discovery would not produce them.
pub(crate) fn discover<D: Discovery>(
    cfg: &Config,
    matcher: &mut Matcher<D::Candidate>,
    discovery: &D,
    errs: &mut Errors,
) -> MatchFuncs {
    let mut forced = Vec::new();
    let mut explicit_x = HashSet::new();
    let mut explicit_y = HashSet::new();
    for rule in &cfg.matches {
        let x = discovery.resolve_x(&rule.x, rule.at);
        let y = discovery.resolve_y(&rule.y, rule.at);
        match (x, y) {
            (Ok(x), Ok(y)) => {
                explicit_x.insert(x.0.crumb().to_string());
                explicit_y.insert(y.0.crumb().to_string());
                forced.push((x, y, rule));
            }
            (x, y) => {
                errs.extend(x.err().into_iter().chain(y.err()).collect());
            }
        }
    }

    let mut sink = Sink {
        matcher: &mut *matcher,
        source: true,
        explicit: &explicit_x,
        unexported: cfg.unexported_x(),
    };
    if let Err(e) = discovery.discover_x(&mut sink) {
        errs.extend(e);
    }
    let mut sink = Sink {
        matcher: &mut *matcher,
        source: false,
        explicit: &explicit_y,
        unexported: cfg.unexported_y(),
    };
    if let Err(e) = discovery.discover_y(&mut sink) {
        errs.extend(e);
    }

    let mut funcs = MatchFuncs::new();
    for ((x, key_x), (y, key_y), rule) in forced {
        let crumbs = (x.crumb().to_string(), y.crumb().to_string());
        matcher.add_x(x, key_x);
        matcher.add_y(y, key_y);
        matcher.force(&crumbs.0, &crumbs.1, rule.at);
        if let Some(func) = &rule.func {
            funcs.insert(crumbs, func.clone());
        }
    }

    for rule in &cfg.skips {
        let x = rule
            .x
            .as_deref()
            .map(|path| discovery.resolve_x(path, rule.at))
            .transpose();
        let y = rule
            .y
            .as_deref()
            .map(|path| discovery.resolve_y(path, rule.at))
            .transpose();
        match (x, y) {
            (Ok(x), Ok(y)) => {
                let x = x.map(|(c, _)| c.crumb().to_string());
                let y = y.map(|(c, _)| c.crumb().to_string());
                matcher.skip(x.as_deref(), y.as_deref(), rule.at);
            }
            (x, y) => {
                errs.extend(x.err().into_iter().chain(y.err()).collect());
            }
        }
    }

    funcs
}
