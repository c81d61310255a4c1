//! Field-wise record conversion.
//!
//! Source members are fields and, when enabled, getters; target members are
//! fields and setters. Nested flattening replaces a field with the members
//! of the record it holds, keeping the path from the root.

use super::discover::{Discovery, MatchFuncs, Sink, discover};
use super::{Factory, Tried};
use crate::config::{Affix, Config};
use crate::error::{Error, Errors};
use crate::matching::{Candidate, Matcher};
use crate::plan::{Access, FieldAssignment, MemberRef, Plan, RecordPlan};
use crate::schema::{Declaration, Field, Method, Pos, Type, Universe};

/// A field or accessor reachable from the root record.
#[derive(Debug, Clone)]
pub(crate) struct Member {
    crumb: String,
    path: Vec<String>,
    access: Access,
    ty: Type,
    exported: bool,
    pos: Pos,
}

impl Member {
    fn field(prefix: &[String], field: &Field) -> Self {
        let mut path = prefix.to_vec();
        path.push(field.name.clone());
        Self {
            crumb: path.join("."),
            path,
            access: Access::Field,
            ty: field.ty.clone(),
            exported: field.exported,
            pos: field.pos,
        }
    }

    fn accessor(prefix: &[String], method: &Method, source: bool) -> Option<Self> {
        let (access, ty) = if source {
            if !method.is_getter_shaped() {
                return None;
            }
            let access = Access::Getter {
                fallible: method.fallible,
            };
            (access, method.result.clone()?)
        } else {
            if !method.is_setter_shaped() {
                return None;
            }
            let access = Access::Setter {
                fallible: method.fallible,
            };
            (access, method.params.first()?.clone())
        };
        let mut path = prefix.to_vec();
        path.push(method.name.clone());
        Some(Self {
            crumb: format!("{}()", path.join(".")),
            path,
            access,
            ty,
            exported: method.exported,
            pos: method.pos,
        })
    }

    fn member_ref(&self) -> MemberRef {
        MemberRef {
            path: self.path.clone(),
            access: self.access,
        }
    }
}

impl Candidate for Member {
    fn crumb(&self) -> &str {
        &self.crumb
    }

    fn pos(&self) -> Pos {
        self.pos
    }

    fn exported(&self) -> bool {
        self.exported
    }
}

struct RecordDiscovery<'a> {
    universe: &'a Universe,
    cfg: &'a Config,
    x: &'a Type,
    y: &'a Type,
}

impl RecordDiscovery<'_> {
    fn record(&self, ty: &Type) -> Option<&Declaration> {
        self.universe
            .declaration_of(ty.deref_all())
            .filter(|d| d.is_record())
    }

    fn accessors(&self, source: bool) -> Option<&Affix> {
        if source {
            self.cfg.getters.as_ref()
        } else {
            self.cfg.setters.as_ref()
        }
    }

    /// Add the members of the record `owner` under `prefix`.
    fn members(&self, owner: &Type, prefix: &[String], source: bool, sink: &mut Sink<'_, Member>) {
        let Some(decl) = self.record(owner) else {
            return;
        };
        for field in decl.fields() {
            sink.add(Member::field(prefix, field), field.name.clone());
        }
        let Some(affix) = self.accessors(source) else {
            return;
        };
        for method in &decl.methods {
            if !affix.matches(&method.name) {
                continue;
            }
            let key = affix.strip(&method.name);
            if key.is_empty() {
                continue;
            }
            if let Some(member) = Member::accessor(prefix, method, source) {
                sink.add(member, key);
            }
        }
    }

    fn side(&self, source: bool, sink: &mut Sink<'_, Member>) -> Result<(), Errors> {
        let (root, nested) = if source {
            (self.x, &self.cfg.nested_x)
        } else {
            (self.y, &self.cfg.nested_y)
        };
        self.members(root, &[], source, sink);

        let mut errs = Errors::new();
        for path in nested {
            match self.resolve_nested(root, path) {
                Ok(field) => {
                    sink.delete(&field.crumb);
                    self.members(&field.ty, &field.path, source, sink);
                }
                Err(e) => errs.push(e),
            }
        }
        errs.into_result(())
    }

    fn resolve_nested(&self, root: &Type, path: &str) -> Result<Member, Error> {
        let (member, _) = self.resolve(root, path, false, Pos::NONE)?;
        if member.access != Access::Field || self.record(&member.ty).is_none() {
            return Err(Error::UnresolvedPath {
                path: path.to_string(),
                what: "a nested record field",
                owner: root.clone(),
                at: Pos::NONE,
            });
        }
        Ok(member)
    }

    /// Walk `a.b.c` through record fields. The last element may also name
    /// an accessor of the side.
    fn resolve(
        &self,
        root: &Type,
        path: &str,
        source: bool,
        at: Pos,
    ) -> Result<(Member, String), Error> {
        let unresolved = || Error::UnresolvedPath {
            path: path.to_string(),
            what: "a field",
            owner: root.clone(),
            at,
        };
        let segments: Vec<&str> = path.split('.').collect();
        let Some((last, parents)) = segments.split_last() else {
            return Err(unresolved());
        };

        let mut owner = root.deref_all().clone();
        let mut prefix = Vec::new();
        for segment in parents {
            let decl = self.record(&owner).ok_or_else(unresolved)?;
            let field = decl
                .fields()
                .iter()
                .find(|f| f.name == *segment)
                .ok_or_else(unresolved)?;
            owner = field.ty.deref_all().clone();
            prefix.push(field.name.clone());
        }

        let decl = self.record(&owner).ok_or_else(unresolved)?;
        if let Some(field) = decl.fields().iter().find(|f| f.name == *last) {
            return Ok((Member::field(&prefix, field), field.name.clone()));
        }
        let member = decl
            .methods
            .iter()
            .filter(|m| m.name == *last)
            .find_map(|m| Member::accessor(&prefix, m, source))
            .ok_or_else(unresolved)?;
        let key = match self.accessors(source) {
            Some(affix) if affix.matches(last) && !affix.strip(last).is_empty() => {
                affix.strip(last)
            }
            _ => *last,
        };
        Ok((member, key.to_string()))
    }
}

impl Discovery for RecordDiscovery<'_> {
    type Candidate = Member;

    fn discover_x(&self, sink: &mut Sink<'_, Member>) -> Result<(), Errors> {
        self.side(true, sink)
    }

    fn discover_y(&self, sink: &mut Sink<'_, Member>) -> Result<(), Errors> {
        self.side(false, sink)
    }

    fn resolve_x(&self, path: &str, at: Pos) -> Result<(Member, String), Error> {
        self.resolve(self.x, path, true, at)
    }

    fn resolve_y(&self, path: &str, at: Pos) -> Result<(Member, String), Error> {
        self.resolve(self.y, path, false, at)
    }
}

impl Factory<'_> {
    /// A matcher filled with the members of two record types, or `None` when
    /// either side is not a record.
    pub(super) fn record_matcher(
        &self,
        x: &Type,
        y: &Type,
        errs: &mut Errors,
    ) -> Option<(Matcher<Member>, MatchFuncs)> {
        let universe = self.env.universe;
        if !universe.is_record(x) || !universe.is_record(y) {
            return None;
        }
        let mut matcher = Matcher::new(
            x.to_string(),
            y.to_string(),
            self.cfg.rename_x.clone(),
            self.cfg.rename_y.clone(),
        );
        let discovery = RecordDiscovery {
            universe,
            cfg: &self.cfg,
            x,
            y,
        };
        let funcs = discover(&self.cfg, &mut matcher, &discovery, errs);
        Some((matcher, funcs))
    }

    pub(super) fn try_record(&self, x: &Type, y: &Type) -> Tried {
        let mut errs = Errors::new();
        let Some((matcher, funcs)) = self.record_matcher(x, y, &mut errs) else {
            return Ok(None);
        };
        if !errs.is_empty() {
            return Err(errs);
        }
        let matches = matcher
            .matches(self.sources(), self.at)
            .map_err(Errors::from)?;

        if !self.allows_err {
            for m in &matches {
                for (member, owner) in [(&m.x, x), (&m.y, y)] {
                    if member.access.fallible() {
                        let callee = format!("{owner}.{}", member.crumb);
                        errs.push(self.illegal(&callee, x, y));
                    }
                }
            }
        }

        let mut assignments = Vec::with_capacity(matches.len());
        for m in matches {
            let func = funcs.get(&(m.x.crumb.clone(), m.y.crumb.clone()));
            match self.build(&m.x.ty, &m.y.ty, func) {
                Ok(plan) => {
                    tracing::trace!(
                        x = %m.x.crumb,
                        y = %m.y.crumb,
                        strategy = plan.strategy(),
                        "assigned"
                    );
                    assignments.push(FieldAssignment {
                        source: m.x.member_ref(),
                        target: m.y.member_ref(),
                        plan,
                    });
                }
                Err(e) => errs.extend(e),
            }
        }

        let accessor_fails = assignments
            .iter()
            .any(|a| a.source.access.fallible() || a.target.access.fallible());
        let wrappers = if self.allows_err && accessor_fails {
            self.wrapper_names()
        } else {
            Vec::new()
        };
        errs.into_result(Some(Plan::Record(RecordPlan {
            source: x.clone(),
            target: y.clone(),
            assignments,
            wrappers,
        })))
    }
}
