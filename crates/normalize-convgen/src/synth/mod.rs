//! Plan synthesis.
//!
//! A [`Factory`] turns a (source, target) type pair into a [`Plan`] by trying
//! strategies in a fixed order and taking the first that applies:
//!
//! ```text
//!  build(x, y)
//!    1  match func         forced pair with its own function
//!    2  module func        imported for exactly (x, y)
//!    3  existing subplan   this factory or an ancestor, reserved or done
//!    4  new subplan        record pairs; reserve, synthesize, fill
//!    5  pointer            peel one level, recurse
//!    6  primitive          identity or lossless numeric
//!    7  sequence           element-wise
//!    8  associative        key- and element-wise
//!    9  enum               member switch
//!   10  union              variant switch
//!   11  unsupported
//! ```
//!
//! A strategy that applies but fails ends the dispatch with its errors.
//! Sibling failures (fields, members, variants) are collected, not
//! short-circuited.

mod collection;
mod discover;
mod enumeration;
mod func;
mod namespace;
mod pointer;
mod primitive;
mod record;
mod subplan;
mod union;

pub use func::FuncTable;
pub use namespace::Namespace;
pub use primitive::is_lossless;
pub use subplan::{Subplan, SubplanRegistry};

use crate::config::{Config, Kind, MatchFunc};
use crate::error::{Error, Errors};
use crate::plan::Plan;
use crate::schema::{Pos, SourceMap, Type, Universe};
use std::cell::RefCell;

/// `Ok(None)`: the strategy does not apply. `Err`: it applies and failed.
pub(crate) type Tried = Result<Option<Plan>, Errors>;

/// What every factory of one module shares.
pub(crate) struct Env<'a> {
    pub universe: &'a Universe,
    pub module: &'a str,
    pub module_cfg: &'a Config,
    pub funcs: &'a FuncTable,
    pub namespace: &'a RefCell<Namespace>,
}

/// The explicit shape a top-level request asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Shape<'r> {
    Record,
    Union,
    Enum { default: &'r str },
}

pub(crate) struct Factory<'a> {
    env: &'a Env<'a>,
    cfg: Config,
    allows_err: bool,
    parent: Option<&'a Factory<'a>>,
    new_subplans: RefCell<SubplanRegistry>,
    /// Subplans committed by earlier requests of the module.
    old_subplans: Option<&'a SubplanRegistry>,
    at: Pos,
}

impl<'a> Factory<'a> {
    pub fn new(
        env: &'a Env<'a>,
        cfg: Config,
        allows_err: bool,
        old_subplans: Option<&'a SubplanRegistry>,
        at: Pos,
    ) -> Self {
        Self {
            env,
            cfg,
            allows_err,
            parent: None,
            new_subplans: RefCell::new(SubplanRegistry::new()),
            old_subplans,
            at,
        }
    }

    /// A child factory sharing this one's module, with an empty registry of
    /// its own.
    fn fork(&self, cfg: Config, allows_err: bool) -> Factory<'_> {
        Factory {
            env: self.env,
            cfg,
            allows_err,
            parent: Some(self),
            new_subplans: RefCell::new(SubplanRegistry::new()),
            old_subplans: None,
            at: self.at,
        }
    }

    /// Subplans created by this factory.
    pub fn into_subplans(self) -> SubplanRegistry {
        self.new_subplans.into_inner()
    }

    fn sources(&self) -> &SourceMap {
        self.env.universe.source_map()
    }

    /// Build the plan for a top-level request.
    pub fn build_request(&self, shape: &Shape<'_>, x: &Type, y: &Type) -> Result<Plan, Errors> {
        let tried = match shape {
            Shape::Record => match self.try_record(x, y)? {
                Some(plan) => Some(plan),
                None => self.try_record_pointer(x, y)?,
            },
            Shape::Union => self.try_union(x, y, self.allows_err)?,
            Shape::Enum { default } => self.try_enum(x, y, Some(*default), self.allows_err)?,
        };
        tried.ok_or_else(|| self.unsupported(x, y).into())
    }

    /// Build the plan converting `x` to `y`.
    pub fn build(&self, x: &Type, y: &Type, func: Option<&MatchFunc>) -> Result<Plan, Errors> {
        let strategies: [(&str, &dyn Fn() -> Tried); 10] = [
            ("match func", &|| self.try_match_func(x, y, func)),
            ("module func", &|| self.try_module_func(x, y)),
            ("existing subplan", &|| self.try_existing_subplan(x, y)),
            ("new subplan", &|| self.try_new_subplan(x, y)),
            ("pointer", &|| self.try_pointer(x, y)),
            ("primitive", &|| self.try_primitive(x, y)),
            ("sequence", &|| self.try_sequence(x, y)),
            ("associative", &|| self.try_associative(x, y)),
            ("enum", &|| self.try_nested_enum(x, y)),
            ("union", &|| self.try_nested_union(x, y)),
        ];
        for (strategy, attempt) in strategies {
            if let Some(plan) = attempt()? {
                tracing::debug!(%x, %y, strategy, "selected strategy");
                return Ok(plan);
            }
        }
        Err(self.unsupported(x, y).into())
    }

    fn unsupported(&self, x: &Type, y: &Type) -> Error {
        Error::UnsupportedShape {
            source_ty: x.clone(),
            target_ty: y.clone(),
            at: self.at,
        }
    }

    /// Apply the configured error wrappers to a call that may fail.
    fn wrap(&self, plan: Plan) -> Plan {
        if !self.allows_err || self.cfg.err_wraps.is_empty() || !plan.may_fail() {
            return plan;
        }
        Plan::ErrWrap {
            wrappers: self.wrapper_names(),
            inner: Box::new(plan),
        }
    }

    fn wrapper_names(&self) -> Vec<String> {
        self.cfg.err_wraps.iter().map(|w| w.name.clone()).collect()
    }

    fn illegal(&self, callee: &str, x: &Type, y: &Type) -> Error {
        Error::IllegalErrorPropagation {
            callee: callee.to_string(),
            source_ty: x.clone(),
            target_ty: y.clone(),
            at: self.at,
        }
    }

    /// Find a subplan for the pair in this factory or any ancestor.
    fn find_subplan(&self, x: &Type, y: &Type) -> Option<(String, bool)> {
        let mut fac = Some(self);
        while let Some(f) = fac {
            if let Some(entry) = f.new_subplans.borrow().get(x, y) {
                return Some((entry.name.clone(), entry.fallible));
            }
            if let Some(entry) = f.old_subplans.and_then(|old| old.get(x, y)) {
                return Some((entry.name.clone(), entry.fallible));
            }
            fac = f.parent;
        }
        None
    }

    fn try_existing_subplan(&self, x: &Type, y: &Type) -> Tried {
        let Some((name, fallible)) = self.find_subplan(x, y) else {
            return Ok(None);
        };
        if fallible && !self.allows_err {
            return Err(self.illegal(&name, x, y).into());
        }
        Ok(Some(self.wrap(Plan::Subplan { name, fallible })))
    }

    /// Reserve a subplan for a record pair and synthesize its body in a
    /// fork. A fork that must not fail is tried first; when it is rejected
    /// and this factory may fail, a second, independent fork is allowed to.
    fn try_new_subplan(&self, x: &Type, y: &Type) -> Tried {
        let universe = self.env.universe;
        if !universe.is_record(x) || !universe.is_record(y) {
            return Ok(None);
        }

        let base = subplan_name(self.env.module, x, y);
        let snapshot = self.env.namespace.borrow().clone();
        let name = self.env.namespace.borrow_mut().claim(&base);

        let mut outcome = self.attempt_subplan(&name, x, y, false);
        if !matches!(outcome, Ok(Some(_))) && self.allows_err {
            tracing::debug!(%name, "retrying subplan with errors allowed");
            *self.env.namespace.borrow_mut() = snapshot.clone();
            let again = self.env.namespace.borrow_mut().claim(&base);
            debug_assert_eq!(again, name);
            outcome = self.attempt_subplan(&name, x, y, true);
        }

        match outcome {
            Ok(Some(registry)) => {
                let fallible = registry.get(x, y).is_some_and(|s| s.fallible);
                self.new_subplans.borrow_mut().merge(registry);
                Ok(Some(self.wrap(Plan::Subplan { name, fallible })))
            }
            other => {
                *self.env.namespace.borrow_mut() = snapshot;
                other.map(|_| None)
            }
        }
    }

    /// One isolated attempt. On success, returns the fork's registry,
    /// including the filled entry for `(x, y)`.
    fn attempt_subplan(
        &self,
        name: &str,
        x: &Type,
        y: &Type,
        allows_err: bool,
    ) -> Result<Option<SubplanRegistry>, Errors> {
        let fork = self.fork(self.env.module_cfg.fork_for(Kind::Record), allows_err);
        fork.new_subplans
            .borrow_mut()
            .reserve(name, x, y, allows_err);
        tracing::debug!(name, %x, %y, allows_err, "reserved subplan");

        let rollback = |fork: &Factory<'_>| {
            fork.new_subplans.borrow_mut().remove(x, y);
            tracing::debug!(name, "rolled back subplan");
        };
        match fork.try_record(x, y) {
            Ok(Some(plan)) if allows_err || !plan.may_fail() => {
                fork.new_subplans.borrow_mut().fill(x, y, plan);
                Ok(Some(fork.into_subplans()))
            }
            Ok(_) => {
                rollback(&fork);
                Ok(None)
            }
            Err(errs) => {
                rollback(&fork);
                Err(errs)
            }
        }
    }

    /// Enumerations met inside another conversion have no default member and
    /// never report a miss.
    fn try_nested_enum(&self, x: &Type, y: &Type) -> Tried {
        let fork = self.fork(self.env.module_cfg.fork_for(Kind::Enum), self.allows_err);
        let plan = fork.try_enum(x, y, None, false)?;
        if plan.is_some() {
            self.new_subplans.borrow_mut().merge(fork.into_subplans());
        }
        Ok(plan)
    }

    fn try_nested_union(&self, x: &Type, y: &Type) -> Tried {
        let fork = self.fork(self.env.module_cfg.fork_for(Kind::Union), self.allows_err);
        let plan = fork.try_union(x, y, false)?;
        if plan.is_some() {
            self.new_subplans.borrow_mut().merge(fork.into_subplans());
        }
        Ok(plan)
    }

    /// The verdict table of a top-level request, without failing on it.
    pub fn explain(&self, shape: &Shape<'_>, x: &Type, y: &Type) -> Result<Option<String>, Errors> {
        let mut errs = Errors::new();
        let sources = self.sources();
        let table = match shape {
            Shape::Record => self
                .record_matcher(x, y, &mut errs)
                .map(|(m, _)| m.visualize(sources)),
            Shape::Union => self
                .union_matcher(x, y, &mut errs)
                .map(|(m, _)| m.visualize(sources)),
            Shape::Enum { default } => self
                .enum_matcher(x, y, Some(*default), &mut errs)
                .map(|(m, _, _)| m.visualize(sources)),
        };
        errs.into_result(table)
    }
}

/// `convgen_[module_]X_Y`, using the declared names behind any pointers.
fn subplan_name(module: &str, x: &Type, y: &Type) -> String {
    let part = |ty: &Type| {
        ty.deref_all()
            .as_named()
            .map_or_else(|| "anon".to_string(), |n| n.name.clone())
    };
    let mut name = String::from("convgen_");
    if !module.is_empty() {
        name.push_str(module);
        name.push('_');
    }
    name.push_str(&part(x));
    name.push('_');
    name.push_str(&part(y));
    name
}
