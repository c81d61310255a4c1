//! Schema model: positions, type descriptors, declarations.
//!
//! This is the interface a declaration extractor fills in. The synthesizer
//! only ever reads it.

mod decl;
mod pos;
mod types;

pub use decl::{
    Constant, DeclKind, Declaration, Field, Method, RecordBuilder, SchemaError, Scope,
    ScopeBuilder, UnionBuilder, Universe, UniverseBuilder,
};
pub use pos::{Location, Pos, SourceMap};
pub use types::{Family, Primitive, Type, TypeName, TypeParseError};
