//! Schema-to-schema conversion planning.
//!
//! `normalize-convgen` decides how to build a value of a target type from a
//! value of a source type: which source member feeds which target member,
//! which strategy converts each pair, and whether anything along the way can
//! fail. The result is a [`Plan`] tree per requested conversion plus the
//! named subplans those trees call, ready to be lowered to code.
//!
//! # Architecture
//!
//! ```text
//! Universe + ConversionModule
//!         │
//!         ▼
//!     Compiler ──► Factory (synth) ──► strategy dispatch ──► Plan
//!                     │        ▲
//!                     ▼        │ matched pairs recurse
//!                  Matcher ────┘
//!              (rename, key, forced, missing, skip, ambiguous)
//!                     │
//!                     ▼ on failure
//!                  Table ──► Error::InvalidMatch
//! ```
//!
//! - [`schema`]: the declarations being converted between.
//! - [`config`]: directives (renames, forced pairs, skips, discovery
//!   toggles, imports, error wrappers), in code or loaded from TOML.
//! - [`matching`]: the name matcher and its verdict table.
//! - [`synth`]: strategy dispatch, memoized subplans, namespace.
//! - [`compiler`]: drives the requests of each module.
//! - [`eval`]: a reference interpreter for plans.
//!
//! # Example
//!
//! ```
//! use normalize_convgen::{Compiler, ConversionModule, Request, Type, Universe};
//!
//! let universe = Universe::builder()
//!     .scope("api", |s| {
//!         s.record("User", |r| {
//!             r.field("Name", "string").field("Age", "int32");
//!         });
//!     })
//!     .scope("db", |s| {
//!         s.record("User", |r| {
//!             r.field("Name", "string").field("Age", "int64");
//!         });
//!     })
//!     .build()
//!     .unwrap();
//!
//! let module = ConversionModule::new("").request(Request::record(
//!     "UserToRow",
//!     Type::named("api", "User"),
//!     Type::named("db", "User"),
//! ));
//! let output = Compiler::new(&universe).module(module).compile().unwrap();
//! assert_eq!(output.conversions[0].plan.strategy(), "record");
//! ```

pub mod affix;
pub mod compiler;
pub mod config;
pub mod error;
pub mod eval;
pub mod matching;
pub mod module;
pub mod plan;
pub mod rename;
pub mod schema;
pub mod synth;
pub mod words;

pub use compiler::{Compiler, Conversion, Output};
pub use config::{Config, ConfigError, ConfigFile, Directive, Kind};
pub use error::{Error, ErrorKind, Errors};
pub use eval::{EvalError, Interpreter, Runtime, Value};
pub use module::{ConversionModule, Request, RequestKind};
pub use plan::Plan;
pub use schema::{Pos, Primitive, SourceMap, Type, Universe};
