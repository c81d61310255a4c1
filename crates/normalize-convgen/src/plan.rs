//! Conversion plans.
//!
//! A plan is an immutable tree describing how to produce a target value from
//! a source value. It is complete: lowering it to code never needs the
//! matcher again. Named subplans are referenced by name only, which is what
//! lets a cyclic schema produce a finite tree.
//!
//! ```text
//! Record(a.User -> b.User)
//! ├── Name  <- Name      Identity
//! ├── Age   <- Age       Numeric(int32 -> int64)
//! └── Home  <- Home      Pointer
//!                        └── Subplan(convgen_Address_Address)
//! ```

use crate::schema::{Primitive, Type};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum Plan {
    /// Plain assignment.
    Identity,
    /// Lossless numeric conversion.
    Numeric { from: Primitive, to: Primitive },
    Pointer(PointerPlan),
    Sequence(SequencePlan),
    Associative(AssociativePlan),
    Enum(EnumPlan),
    Union(UnionPlan),
    Record(RecordPlan),
    /// Call a user-supplied function.
    Func { name: String, fallible: bool },
    /// Call a generated subplan by name.
    Subplan { name: String, fallible: bool },
    /// Run `inner`, passing any failure through `wrappers` in order.
    ErrWrap { wrappers: Vec<String>, inner: Box<Plan> },
}

impl Plan {
    /// Whether running this plan can report a failure.
    pub fn may_fail(&self) -> bool {
        match self {
            Plan::Identity | Plan::Numeric { .. } => false,
            Plan::Pointer(p) => p.elem.may_fail(),
            Plan::Sequence(p) => p.elem.may_fail(),
            Plan::Associative(p) => p.key.may_fail() || p.elem.may_fail(),
            Plan::Enum(p) => p.errorful,
            Plan::Union(p) => p.errorful || p.variants.iter().any(|v| v.plan.may_fail()),
            Plan::Record(p) => p.assignments.iter().any(|a| {
                a.plan.may_fail() || a.source.access.fallible() || a.target.access.fallible()
            }),
            Plan::Func { fallible, .. } | Plan::Subplan { fallible, .. } => *fallible,
            Plan::ErrWrap { inner, .. } => inner.may_fail(),
        }
    }

    /// Short strategy name, for logs.
    pub fn strategy(&self) -> &'static str {
        match self {
            Plan::Identity => "identity",
            Plan::Numeric { .. } => "numeric",
            Plan::Pointer(_) => "pointer",
            Plan::Sequence(_) => "sequence",
            Plan::Associative(_) => "associative",
            Plan::Enum(_) => "enum",
            Plan::Union(_) => "union",
            Plan::Record(_) => "record",
            Plan::Func { .. } => "func",
            Plan::Subplan { .. } => "subplan",
            Plan::ErrWrap { .. } => "err-wrap",
        }
    }
}

/// Unwraps one pointer level on each side that has one.
///
/// A nil source leaves the target at its zero value. With more than one
/// target level, a nil result of `elem` stays nil instead of being boxed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointerPlan {
    pub source_depth: usize,
    pub target_depth: usize,
    /// The target after removing one pointer level, if it has one.
    pub target_elem: Type,
    pub elem: Box<Plan>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Collection {
    Array { len: usize },
    Seq,
}

/// Element-wise copy. An absent source sequence gives an absent target; a
/// present but empty one gives a present, empty target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequencePlan {
    pub source: Collection,
    pub target: Collection,
    pub elem: Box<Plan>,
}

/// Where the keys of a map conversion come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeySource {
    /// The keys of a source map.
    Map,
    /// The positions of a source sequence or array, as `int`.
    Index,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssociativePlan {
    pub source: KeySource,
    pub key: Box<Plan>,
    pub elem: Box<Plan>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumCase {
    pub source: String,
    pub target: String,
}

/// Member-to-member switch. A source value without a case becomes
/// `default`, or the zero value when there is none; an errorful switch also
/// reports it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumPlan {
    pub cases: Vec<EnumCase>,
    pub default: Option<String>,
    pub errorful: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnionCase {
    pub source: Type,
    pub target: Type,
    pub plan: Plan,
}

/// Dispatch on the dynamic variant. An unmatched variant becomes nil, and an
/// errorful switch also reports it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnionPlan {
    pub variants: Vec<UnionCase>,
    pub errorful: bool,
}

/// How a record member is read or written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Access {
    Field,
    Getter { fallible: bool },
    Setter { fallible: bool },
}

impl Access {
    pub fn fallible(self) -> bool {
        match self {
            Access::Field => false,
            Access::Getter { fallible } | Access::Setter { fallible } => fallible,
        }
    }
}

/// A member reached from the root record through nested fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberRef {
    pub path: Vec<String>,
    pub access: Access,
}

impl MemberRef {
    pub fn name(&self) -> &str {
        self.path.last().map_or("", String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldAssignment {
    pub source: MemberRef,
    pub target: MemberRef,
    pub plan: Plan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordPlan {
    pub source: Type,
    pub target: Type,
    pub assignments: Vec<FieldAssignment>,
    /// Error wrappers for accessor failures.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub wrappers: Vec<String>,
}
