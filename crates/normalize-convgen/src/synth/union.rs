//! Variant switches between unions.
//!
//! A variant is a named type in the discovery scope that implements the
//! union's methods, by value (`a.Circle`) or only through a pointer
//! (`*a.Circle`). Both shapes share the crumb `a.Circle`; naming one variant
//! in both shapes on one side is an error.

use super::discover::{Discovery, MatchFuncs, Sink, discover, discovery_scope};
use super::{Factory, Tried};
use crate::config::Config;
use crate::error::{Error, Errors};
use crate::matching::{Candidate, Matcher};
use crate::plan::{Plan, UnionCase, UnionPlan};
use crate::schema::{DeclKind, Method, Pos, SourceMap, Type, Universe};
use std::cell::RefCell;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub(crate) struct Variant {
    crumb: String,
    ty: Type,
    exported: bool,
    pos: Pos,
}

impl Variant {
    fn new(ty: Type, universe: &Universe) -> Self {
        let decl = universe.declaration_of(ty.deref_all());
        Self {
            crumb: ty.deref_all().to_string(),
            exported: decl.is_none_or(|d| d.exported),
            pos: decl.map_or(Pos::NONE, |d| d.pos),
            ty,
        }
    }

    /// The type name without its scope, used as the match key.
    fn key(&self) -> &str {
        self.ty.deref_all().as_named().map_or(&self.crumb, |n| &n.name)
    }
}

impl Candidate for Variant {
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

struct UnionDiscovery<'a> {
    universe: &'a Universe,
    sources: &'a SourceMap,
    cfg: &'a Config,
    x: &'a Type,
    y: &'a Type,
    methods_x: &'a [Method],
    methods_y: &'a [Method],
    /// Shapes named by directives so far, per side.
    declared: [RefCell<HashMap<String, (Type, Pos)>>; 2],
}

impl UnionDiscovery<'_> {
    fn side_of(&self, source: bool) -> (&Type, &[Method]) {
        if source {
            (self.x, self.methods_x)
        } else {
            (self.y, self.methods_y)
        }
    }

    fn side(&self, source: bool, sink: &mut Sink<'_, Variant>) -> Result<(), Errors> {
        let (union, methods) = self.side_of(source);
        let scope = discovery_scope(self.universe, self.cfg, union, source)?;
        for decl in scope.declarations().filter(|d| !d.is_union()) {
            let by_value = Type::Named(decl.name.clone());
            let ty = if self.universe.implements(&by_value, methods) {
                by_value
            } else {
                let by_pointer = Type::pointer(by_value);
                if !self.universe.implements(&by_pointer, methods) {
                    continue;
                }
                by_pointer
            };
            let variant = Variant::new(ty, self.universe);
            let key = variant.key().to_string();
            sink.add(variant, key);
        }
        Ok(())
    }

    /// Parse a variant type. An unqualified name is looked up in the
    /// discovery scope of the side.
    fn resolve(&self, path: &str, source: bool, at: Pos) -> Result<(Variant, String), Error> {
        let (union, methods) = self.side_of(source);
        let unresolved = || Error::UnresolvedPath {
            path: path.to_string(),
            what: "a variant",
            owner: union.clone(),
            at,
        };

        let pointer = path.starts_with('*');
        let base = path.trim_start_matches('*');
        let qualified = if base.contains('.') {
            path.to_string()
        } else {
            let scope = discovery_scope(self.universe, self.cfg, union, source)?;
            format!("{}{}.{base}", if pointer { "*" } else { "" }, scope.name)
        };
        let ty: Type = qualified.parse().map_err(|_| unresolved())?;
        if ty.pointer_depth() > 1 || !self.universe.implements(&ty, methods) {
            return Err(unresolved());
        }

        let variant = Variant::new(ty, self.universe);
        let mut declared = self.declared[usize::from(!source)].borrow_mut();
        match declared.get(&variant.crumb) {
            Some((previous, previous_at)) if *previous != variant.ty => {
                return Err(Error::RedeclaredVariantShape {
                    variant: variant.ty.clone(),
                    declared: previous.clone(),
                    previous: self.sources.display(*previous_at),
                    at,
                });
            }
            Some(_) => {}
            None => {
                declared.insert(variant.crumb.clone(), (variant.ty.clone(), at));
            }
        }
        let key = variant.key().to_string();
        Ok((variant, key))
    }
}

impl Discovery for UnionDiscovery<'_> {
    type Candidate = Variant;

    fn discover_x(&self, sink: &mut Sink<'_, Variant>) -> Result<(), Errors> {
        self.side(true, sink)
    }

    fn discover_y(&self, sink: &mut Sink<'_, Variant>) -> Result<(), Errors> {
        self.side(false, sink)
    }

    fn resolve_x(&self, path: &str, at: Pos) -> Result<(Variant, String), Error> {
        self.resolve(path, true, at)
    }

    fn resolve_y(&self, path: &str, at: Pos) -> Result<(Variant, String), Error> {
        self.resolve(path, false, at)
    }
}

impl Factory<'_> {
    fn union_methods(&self, ty: &Type) -> Option<&[Method]> {
        match &self.env.universe.declaration_of(ty)?.kind {
            DeclKind::Union { methods } => Some(methods),
            _ => None,
        }
    }

    /// A matcher over the variants of two unions. A union without methods
    /// has no variants to discover and is reported instead.
    pub(super) fn union_matcher(
        &self,
        x: &Type,
        y: &Type,
        errs: &mut Errors,
    ) -> Option<(Matcher<Variant>, MatchFuncs)> {
        let (methods_x, methods_y) = (self.union_methods(x)?, self.union_methods(y)?);
        let mut matcher = Matcher::new(
            x.to_string(),
            y.to_string(),
            self.cfg.rename_x.clone(),
            self.cfg.rename_y.clone(),
        );
        let mut empty = false;
        for (union, methods) in [(x, methods_x), (y, methods_y)] {
            if methods.is_empty() {
                empty = true;
                errs.push(Error::EmptyUnion {
                    union: union.clone(),
                    at: self.at,
                });
            }
        }
        if empty {
            return Some((matcher, MatchFuncs::new()));
        }

        let discovery = UnionDiscovery {
            universe: self.env.universe,
            sources: self.sources(),
            cfg: &self.cfg,
            x,
            y,
            methods_x,
            methods_y,
            declared: Default::default(),
        };
        let funcs = discover(&self.cfg, &mut matcher, &discovery, errs);
        Some((matcher, funcs))
    }

    pub(super) fn try_union(&self, x: &Type, y: &Type, errorful: bool) -> Tried {
        let mut errs = Errors::new();
        let Some((matcher, funcs)) = self.union_matcher(x, y, &mut errs) else {
            return Ok(None);
        };
        if !errs.is_empty() {
            return Err(errs);
        }
        let matches = matcher
            .matches(self.sources(), self.at)
            .map_err(Errors::from)?;

        let mut variants = Vec::with_capacity(matches.len());
        for m in matches {
            let func = funcs.get(&(m.x.crumb.clone(), m.y.crumb.clone()));
            match self.build(&m.x.ty, &m.y.ty, func) {
                Ok(plan) => variants.push(UnionCase {
                    source: m.x.ty,
                    target: m.y.ty,
                    plan,
                }),
                Err(e) => errs.extend(e),
            }
        }
        errs.into_result(Some(Plan::Union(UnionPlan { variants, errorful })))
    }
}
