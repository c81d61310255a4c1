//! Conversion modules and the requests they declare.

use crate::config::{ConfigError, ConfigFile, Directive, Kind};
use crate::schema::{Pos, SourceMap, Type};
use serde::Serialize;
use std::path::Path;

/// What a request asks to convert, and whether the conversion may fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RequestKind {
    Record,
    RecordErrorful,
    Union,
    UnionErrorful,
    /// Unmatched source members become `default`.
    Enum { default: String },
    /// As [`RequestKind::Enum`], and the miss is also reported.
    EnumErrorful { default: String },
}

impl RequestKind {
    pub fn kind(&self) -> Kind {
        match self {
            RequestKind::Record | RequestKind::RecordErrorful => Kind::Record,
            RequestKind::Union | RequestKind::UnionErrorful => Kind::Union,
            RequestKind::Enum { .. } | RequestKind::EnumErrorful { .. } => Kind::Enum,
        }
    }

    pub fn errorful(&self) -> bool {
        matches!(
            self,
            RequestKind::RecordErrorful
                | RequestKind::UnionErrorful
                | RequestKind::EnumErrorful { .. }
        )
    }
}

/// One named conversion to generate.
#[derive(Debug, Clone)]
pub struct Request {
    pub name: String,
    pub kind: RequestKind,
    pub source: Type,
    pub target: Type,
    /// Applied on top of the module configuration for this request only.
    pub directives: Vec<(Directive, Pos)>,
    pub at: Pos,
}

impl Request {
    pub fn new(name: impl Into<String>, kind: RequestKind, source: Type, target: Type) -> Self {
        Self {
            name: name.into(),
            kind,
            source,
            target,
            directives: Vec::new(),
            at: Pos::NONE,
        }
    }

    pub fn record(name: impl Into<String>, source: Type, target: Type) -> Self {
        Self::new(name, RequestKind::Record, source, target)
    }

    pub fn record_errorful(name: impl Into<String>, source: Type, target: Type) -> Self {
        Self::new(name, RequestKind::RecordErrorful, source, target)
    }

    pub fn union(name: impl Into<String>, source: Type, target: Type) -> Self {
        Self::new(name, RequestKind::Union, source, target)
    }

    pub fn union_errorful(name: impl Into<String>, source: Type, target: Type) -> Self {
        Self::new(name, RequestKind::UnionErrorful, source, target)
    }

    pub fn enumeration(
        name: impl Into<String>,
        source: Type,
        target: Type,
        default: impl Into<String>,
    ) -> Self {
        let kind = RequestKind::Enum {
            default: default.into(),
        };
        Self::new(name, kind, source, target)
    }

    pub fn enumeration_errorful(
        name: impl Into<String>,
        source: Type,
        target: Type,
        default: impl Into<String>,
    ) -> Self {
        let kind = RequestKind::EnumErrorful {
            default: default.into(),
        };
        Self::new(name, kind, source, target)
    }

    pub fn at(mut self, at: Pos) -> Self {
        self.at = at;
        self
    }

    pub fn directive(mut self, directive: Directive, at: Pos) -> Self {
        self.directives.push((directive, at));
        self
    }
}

/// A named group of requests sharing one configuration, one function table
/// and one subplan registry.
#[derive(Debug, Clone, Default)]
pub struct ConversionModule {
    pub name: String,
    pub directives: Vec<(Directive, Pos)>,
    pub requests: Vec<Request>,
}

impl ConversionModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// A module configured by the TOML file at `path`.
    pub fn load(
        name: impl Into<String>,
        path: &Path,
        sources: &mut SourceMap,
    ) -> Result<Self, ConfigError> {
        let mut module = Self::new(name);
        module.directives = ConfigFile::load(path, sources)?;
        Ok(module)
    }

    pub fn directive(mut self, directive: Directive, at: Pos) -> Self {
        self.directives.push((directive, at));
        self
    }

    pub fn request(mut self, request: Request) -> Self {
        self.requests.push(request);
        self
    }
}
