//! Member-to-member enumeration switches.

use super::discover::{Discovery, MatchFuncs, Sink, discover, discovery_scope};
use super::{Factory, Tried};
use crate::config::Config;
use crate::error::{Error, Errors};
use crate::matching::{Candidate, Matcher};
use crate::plan::{EnumCase, EnumPlan, Plan};
use crate::schema::{Constant, Pos, Scope, Type, TypeName, Universe};

/// A constant of the enumeration type.
#[derive(Debug, Clone)]
pub(crate) struct EnumMember {
    name: String,
    exported: bool,
    pos: Pos,
}

impl From<&Constant> for EnumMember {
    fn from(c: &Constant) -> Self {
        Self {
            name: c.name.clone(),
            exported: c.exported,
            pos: c.pos,
        }
    }
}

impl Candidate for EnumMember {
    fn crumb(&self) -> &str {
        &self.name
    }

    fn pos(&self) -> Pos {
        self.pos
    }

    fn exported(&self) -> bool {
        self.exported
    }
}

struct EnumDiscovery<'a> {
    universe: &'a Universe,
    cfg: &'a Config,
    x: &'a Type,
    y: &'a Type,
}

impl<'a> EnumDiscovery<'a> {
    fn scope(&self, source: bool) -> Result<&'a Scope, Error> {
        let ty = if source { self.x } else { self.y };
        discovery_scope(self.universe, self.cfg, ty, source)
    }

    fn type_name(&self, source: bool) -> Option<&'a TypeName> {
        if source { self.x.as_named() } else { self.y.as_named() }
    }

    fn side(&self, source: bool, sink: &mut Sink<'_, EnumMember>) -> Result<(), Errors> {
        let scope = self.scope(source)?;
        let ty = self.type_name(source);
        for constant in scope.constants() {
            if Some(&constant.ty) == ty {
                sink.add(EnumMember::from(constant), constant.name.clone());
            }
        }
        Ok(())
    }

    /// A constant named `Red` in the discovery scope, or `b.Red` in scope `b`,
    /// whatever its type.
    fn lookup(&self, path: &str, source: bool) -> Option<&'a Constant> {
        let (scope, name) = match path.split_once('.') {
            Some((scope, name)) => (self.universe.scope(scope)?, name),
            None => (self.scope(source).ok()?, path),
        };
        scope.constants().iter().find(|c| c.name == name)
    }

    fn resolve(&self, path: &str, source: bool, at: Pos) -> Result<(EnumMember, String), Error> {
        let ty = self.type_name(source);
        match self.lookup(path, source) {
            Some(c) if Some(&c.ty) == ty => Ok((EnumMember::from(c), c.name.clone())),
            _ => Err(Error::UnresolvedPath {
                path: path.to_string(),
                what: "a member",
                owner: if source { self.x } else { self.y }.clone(),
                at,
            }),
        }
    }

    /// Resolve the default target member, telling a wrongly typed constant
    /// apart from a missing one.
    fn resolve_default(&self, path: &str, at: Pos) -> Result<EnumMember, Error> {
        let Some(c) = self.lookup(path, false) else {
            return self.resolve(path, false, at).map(|(m, _)| m);
        };
        if self.type_name(false) != Some(&c.ty) {
            return Err(Error::DefaultTypeMismatch {
                member: path.to_string(),
                actual: Type::Named(c.ty.clone()),
                expected: self.y.clone(),
                at,
            });
        }
        Ok(EnumMember::from(c))
    }
}

impl Discovery for EnumDiscovery<'_> {
    type Candidate = EnumMember;

    fn discover_x(&self, sink: &mut Sink<'_, EnumMember>) -> Result<(), Errors> {
        self.side(true, sink)
    }

    fn discover_y(&self, sink: &mut Sink<'_, EnumMember>) -> Result<(), Errors> {
        self.side(false, sink)
    }

    fn resolve_x(&self, path: &str, at: Pos) -> Result<(EnumMember, String), Error> {
        self.resolve(path, true, at)
    }

    fn resolve_y(&self, path: &str, at: Pos) -> Result<(EnumMember, String), Error> {
        self.resolve(path, false, at)
    }
}

impl Factory<'_> {
    fn is_enum(&self, ty: &Type) -> bool {
        self.env
            .universe
            .declaration_of(ty)
            .is_some_and(|d| d.is_enum())
    }

    /// A matcher over the members of two enumerations, plus the resolved
    /// default target member.
    pub(super) fn enum_matcher(
        &self,
        x: &Type,
        y: &Type,
        default: Option<&str>,
        errs: &mut Errors,
    ) -> Option<(Matcher<EnumMember>, MatchFuncs, Option<String>)> {
        if !self.is_enum(x) || !self.is_enum(y) {
            return None;
        }
        let mut matcher = Matcher::new(
            x.to_string(),
            y.to_string(),
            self.cfg.rename_x.clone(),
            self.cfg.rename_y.clone(),
        );
        let discovery = EnumDiscovery {
            universe: self.env.universe,
            cfg: &self.cfg,
            x,
            y,
        };
        let funcs = discover(&self.cfg, &mut matcher, &discovery, errs);

        let default = default.and_then(|path| match discovery.resolve_default(path, self.at) {
            Ok(member) => {
                matcher.set_default_target(&member.name);
                Some(member.name)
            }
            Err(e) => {
                errs.push(e);
                None
            }
        });
        Some((matcher, funcs, default))
    }

    /// Without a default, an unmatched source value becomes the zero value.
    pub(super) fn try_enum(
        &self,
        x: &Type,
        y: &Type,
        default: Option<&str>,
        errorful: bool,
    ) -> Tried {
        let mut errs = Errors::new();
        let Some((matcher, _, default)) = self.enum_matcher(x, y, default, &mut errs) else {
            return Ok(None);
        };
        if !errs.is_empty() {
            return Err(errs);
        }
        let matches = matcher
            .matches(self.sources(), self.at)
            .map_err(Errors::from)?;
        let cases = matches
            .into_iter()
            .map(|m| EnumCase {
                source: m.x.name,
                target: m.y.name,
            })
            .collect();
        Ok(Some(Plan::Enum(EnumPlan {
            cases,
            default,
            errorful,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Directive;
    use crate::schema::Primitive;

    fn universe() -> Universe {
        Universe::builder()
            .scope("a", |s| {
                s.enumeration("Color", Primitive::Int, &["Red", "Green"])
                    .enumeration("Size", Primitive::Int, &["Small"]);
            })
            .scope("b", |s| {
                s.enumeration("Color", Primitive::String, &["Red", "Green", "Unknown"]);
            })
            .scope("c", |s| {
                s.constant("Blue", "a.Color");
            })
            .build()
            .unwrap()
    }

    #[test]
    fn test_members_are_constants_of_the_type() {
        let universe = universe();
        let cfg = Config::new();
        let (x, y) = (Type::named("a", "Color"), Type::named("b", "Color"));
        let d = EnumDiscovery {
            universe: &universe,
            cfg: &cfg,
            x: &x,
            y: &y,
        };
        assert!(d.resolve("Red", true, Pos::NONE).is_ok());
        assert!(d.resolve("b.Unknown", false, Pos::NONE).is_ok());
        let err = d.resolve("Small", true, Pos::NONE).unwrap_err();
        assert_eq!(err.to_string(), "Small does not name a member of a.Color");
    }

    #[test]
    fn test_default_member_checks() {
        let universe = universe();
        let cfg = Config::new();
        let (x, y) = (Type::named("a", "Color"), Type::named("b", "Color"));
        let d = EnumDiscovery {
            universe: &universe,
            cfg: &cfg,
            x: &x,
            y: &y,
        };
        assert_eq!(d.resolve_default("Unknown", Pos::NONE).unwrap().name, "Unknown");
        let err = d.resolve_default("a.Small", Pos::NONE).unwrap_err();
        assert_eq!(
            err.to_string(),
            "default member a.Small has type a.Size, expected b.Color"
        );
        let err = d.resolve_default("Purple", Pos::NONE).unwrap_err();
        assert_eq!(err.to_string(), "Purple does not name a member of b.Color");
    }

    #[test]
    fn test_sample_scope() {
        let universe = universe();
        let cfg = Config::new()
            .with(Directive::DiscoverBySample {
                x: Some("c".into()),
                y: None,
            })
            .unwrap();
        let (x, y) = (Type::named("a", "Color"), Type::named("b", "Color"));
        let d = EnumDiscovery {
            universe: &universe,
            cfg: &cfg,
            x: &x,
            y: &y,
        };
        assert_eq!(d.scope(true).unwrap().name, "c");
        assert_eq!(d.scope(false).unwrap().name, "b");
        assert!(d.resolve("Blue", true, Pos::NONE).is_ok());
        assert!(d.resolve("Red", true, Pos::NONE).is_err());
    }
}
