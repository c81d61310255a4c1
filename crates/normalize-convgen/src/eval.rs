//! Reference interpreter for plans.
//!
//! Runs a compiled [`Output`] against dynamic [`Value`]s, so that the
//! behavior of a plan can be checked without emitting code. Custom
//! functions, accessors and error wrappers are supplied by a [`Runtime`].

use crate::compiler::{Conversion, Output};
use crate::plan::{
    Access, AssociativePlan, Collection, EnumPlan, KeySource, MemberRef, Plan, PointerPlan,
    RecordPlan, SequencePlan, UnionPlan,
};
use crate::schema::{Family, Primitive, Type, Universe};
use crate::synth::Subplan;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;

/// A dynamic value of some schema type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum Value {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Complex(f64, f64),
    Str(String),
    /// A nil pointer, union, or unset enumeration.
    Nil,
    Ptr(Box<Value>),
    Array(Vec<Value>),
    /// `None` is an absent sequence, distinct from a present empty one.
    Seq(Option<Vec<Value>>),
    Map(Option<Vec<(Value, Value)>>),
    Record(IndexMap<String, Value>),
    /// An enumeration member, by constant name.
    Member(String),
    /// A union holding a value of the variant type `ty`.
    Variant { ty: Type, value: Box<Value> },
}

impl Value {
    pub fn record<'a>(fields: impl IntoIterator<Item = (&'a str, Value)>) -> Self {
        Value::Record(
            fields
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        )
    }

    pub fn seq(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Seq(Some(items.into_iter().collect()))
    }

    pub fn map(entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        Value::Map(Some(entries.into_iter().collect()))
    }

    pub fn ptr(value: Value) -> Self {
        Value::Ptr(Box::new(value))
    }

    pub fn member(name: &str) -> Self {
        Value::Member(name.to_string())
    }

    pub fn variant(ty: Type, value: Value) -> Self {
        Value::Variant {
            ty,
            value: Box::new(value),
        }
    }

    /// The zero value of `ty`: absent collections, nil pointers, unions and
    /// enumerations, and records of zero fields.
    pub fn zero(ty: &Type, universe: &Universe) -> Self {
        match ty {
            Type::Primitive(p) => match p.family() {
                Family::Bool => Value::Bool(false),
                Family::Signed => Value::Int(0),
                Family::Unsigned => Value::Uint(0),
                Family::Float => Value::Float(0.0),
                Family::Complex => Value::Complex(0.0, 0.0),
                Family::String => Value::Str(String::new()),
            },
            Type::Named(_) => match universe.declaration_of(ty) {
                Some(decl) if decl.is_record() => Value::Record(
                    decl.fields()
                        .iter()
                        .map(|f| (f.name.clone(), Value::zero(&f.ty, universe)))
                        .collect(),
                ),
                _ => Value::Nil,
            },
            Type::Pointer(_) => Value::Nil,
            Type::Array(len, elem) => Value::Array(vec![Value::zero(elem, universe); *len]),
            Type::Seq(_) => Value::Seq(None),
            Type::Map(..) => Value::Map(None),
        }
    }

    /// Short name of the value's shape, for errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Uint(_) => "uint",
            Value::Float(_) => "float",
            Value::Complex(..) => "complex",
            Value::Str(_) => "string",
            Value::Nil => "nil",
            Value::Ptr(_) => "pointer",
            Value::Array(_) => "array",
            Value::Seq(_) => "sequence",
            Value::Map(_) => "map",
            Value::Record(_) => "record",
            Value::Member(_) => "member",
            Value::Variant { .. } => "variant",
        }
    }

    fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Record(fields) => fields.get(name),
            Value::Ptr(inner) => inner.field(name),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        Value::Uint(u)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    /// An errorful enumeration or union switch had no case for the value.
    #[error("no {what} matches {value}")]
    NoMatch { what: &'static str, value: String },

    #[error("{name}: {message}")]
    Func { name: String, message: String },

    #[error("{wrapper}: {source}")]
    Wrapped {
        wrapper: String,
        #[source]
        source: Box<EvalError>,
    },

    #[error("no conversion named {0}")]
    UnknownConversion(String),

    #[error("no subplan named {0}")]
    UnknownSubplan(String),

    /// The value does not have the shape the plan expects.
    #[error("expected {expected}, found {found}")]
    Shape {
        expected: &'static str,
        found: &'static str,
    },

    #[error("{value} does not fit in {target}")]
    Overflow { value: String, target: Primitive },
}

fn shape(expected: &'static str, found: &Value) -> EvalError {
    EvalError::Shape {
        expected,
        found: found.kind(),
    }
}

/// User code a plan can call. Every method fails by default.
pub trait Runtime {
    fn call(&self, func: &str, value: Value) -> Result<Value, String> {
        let _ = value;
        Err(format!("function {func} is not available"))
    }

    fn getter(&self, owner: &Value, method: &str) -> Result<Value, String> {
        let _ = owner;
        Err(format!("getter {method} is not available"))
    }

    fn setter(&self, owner: &mut Value, method: &str, value: Value) -> Result<(), String> {
        let _ = (owner, value);
        Err(format!("setter {method} is not available"))
    }

    /// Pass a failure through the error wrapper `wrapper`.
    fn wrap_error(&self, wrapper: &str, err: EvalError) -> EvalError {
        EvalError::Wrapped {
            wrapper: wrapper.to_string(),
            source: Box::new(err),
        }
    }
}

/// Runs the conversions and subplans of one [`Output`].
pub struct Interpreter<'a> {
    conversions: HashMap<&'a str, &'a Conversion>,
    subplans: HashMap<&'a str, &'a Subplan>,
    universe: &'a Universe,
    runtime: &'a dyn Runtime,
}

impl<'a> Interpreter<'a> {
    pub fn new(output: &'a Output, universe: &'a Universe, runtime: &'a dyn Runtime) -> Self {
        Self {
            conversions: output
                .conversions
                .iter()
                .map(|c| (c.name.as_str(), c))
                .collect(),
            subplans: output
                .subplans
                .iter()
                .map(|s| (s.name.as_str(), s))
                .collect(),
            universe,
            runtime,
        }
    }

    /// Run the requested conversion `name` on `value`.
    pub fn convert(&self, name: &str, value: Value) -> Result<Value, EvalError> {
        let conversion = self
            .conversions
            .get(name)
            .ok_or_else(|| EvalError::UnknownConversion(name.to_string()))?;
        self.run(&conversion.plan, value)
    }

    pub fn run(&self, plan: &Plan, value: Value) -> Result<Value, EvalError> {
        match plan {
            Plan::Identity => Ok(value),
            Plan::Numeric { to, .. } => numeric(value, *to),
            Plan::Pointer(p) => self.pointer(p, value),
            Plan::Sequence(p) => self.sequence(p, value),
            Plan::Associative(p) => self.associative(p, value),
            Plan::Enum(p) => enumeration(p, value),
            Plan::Union(p) => self.union(p, value),
            Plan::Record(p) => self.record(p, value),
            Plan::Func { name, .. } => match self.conversions.get(name.as_str()) {
                Some(conversion) => self.run(&conversion.plan, value),
                None => self.runtime.call(name, value).map_err(|message| EvalError::Func {
                    name: name.clone(),
                    message,
                }),
            },
            Plan::Subplan { name, .. } => {
                let plan = self
                    .subplans
                    .get(name.as_str())
                    .and_then(|s| s.plan.as_ref())
                    .ok_or_else(|| EvalError::UnknownSubplan(name.clone()))?;
                tracing::trace!(name, "calling subplan");
                self.run(plan, value)
            }
            Plan::ErrWrap { wrappers, inner } => self
                .run(inner, value)
                .map_err(|err| self.wrap(wrappers, err)),
        }
    }

    fn wrap(&self, wrappers: &[String], err: EvalError) -> EvalError {
        wrappers
            .iter()
            .fold(err, |err, wrapper| self.runtime.wrap_error(wrapper, err))
    }

    fn pointer(&self, p: &PointerPlan, value: Value) -> Result<Value, EvalError> {
        let inner = if p.source_depth == 0 {
            value
        } else {
            match value {
                Value::Ptr(inner) => *inner,
                Value::Nil if p.target_depth == 0 => {
                    return Ok(Value::zero(&p.target_elem, self.universe));
                }
                Value::Nil => return Ok(Value::Nil),
                other => return Err(shape("pointer", &other)),
            }
        };
        let result = self.run(&p.elem, inner)?;
        Ok(match p.target_depth {
            0 => result,
            1 => Value::ptr(result),
            _ if result == Value::Nil => Value::Nil,
            _ => Value::ptr(result),
        })
    }

    fn sequence(&self, p: &SequencePlan, value: Value) -> Result<Value, EvalError> {
        let items = match (p.source, value) {
            (Collection::Seq, Value::Seq(None)) => return Ok(Value::Seq(None)),
            (Collection::Seq, Value::Seq(Some(items))) => items,
            (Collection::Array { .. }, Value::Array(items)) => items,
            (_, other) => return Err(shape("sequence", &other)),
        };
        let items = items
            .into_iter()
            .map(|item| self.run(&p.elem, item))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(match p.target {
            Collection::Seq => Value::Seq(Some(items)),
            Collection::Array { .. } => Value::Array(items),
        })
    }

    fn associative(&self, p: &AssociativePlan, value: Value) -> Result<Value, EvalError> {
        let entries: Vec<(Value, Value)> = match (p.source, value) {
            (KeySource::Map, Value::Map(None)) | (KeySource::Index, Value::Seq(None)) => {
                return Ok(Value::Map(None));
            }
            (KeySource::Map, Value::Map(Some(entries))) => entries,
            (KeySource::Index, Value::Seq(Some(items)) | Value::Array(items)) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| (Value::Int(i as i64), item))
                .collect(),
            (_, other) => return Err(shape("map", &other)),
        };
        let entries = entries
            .into_iter()
            .map(|(k, v)| Ok((self.run(&p.key, k)?, self.run(&p.elem, v)?)))
            .collect::<Result<Vec<_>, EvalError>>()?;
        Ok(Value::Map(Some(entries)))
    }

    fn union(&self, p: &UnionPlan, value: Value) -> Result<Value, EvalError> {
        let (ty, inner) = match value {
            Value::Nil => return Ok(Value::Nil),
            Value::Variant { ty, value } => (ty, *value),
            other => return Err(shape("variant", &other)),
        };
        match p.variants.iter().find(|v| v.source == ty) {
            Some(case) => {
                let converted = self.run(&case.plan, inner)?;
                Ok(Value::variant(case.target.clone(), converted))
            }
            None if p.errorful => Err(EvalError::NoMatch {
                what: "variant",
                value: ty.to_string(),
            }),
            None => Ok(Value::Nil),
        }
    }

    fn record(&self, p: &RecordPlan, value: Value) -> Result<Value, EvalError> {
        if !matches!(value, Value::Record(_)) {
            return Err(shape("record", &value));
        }
        let mut target = Value::zero(&p.target, self.universe);
        for assignment in &p.assignments {
            let read = self
                .read(&p.source, &value, &assignment.source)
                .map_err(|err| self.wrap(&p.wrappers, err))?;
            let converted = self.run(&assignment.plan, read)?;
            self.write(&p.target, &mut target, &assignment.target, converted)
                .map_err(|err| self.wrap(&p.wrappers, err))?;
        }
        Ok(target)
    }

    /// The type of field `name` of the record behind `owner`.
    fn field_type(&self, owner: &Type, name: &str) -> Option<Type> {
        let decl = self.universe.declaration_of(owner.deref_all())?;
        decl.fields()
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.ty.clone())
    }

    fn read(&self, root_ty: &Type, root: &Value, member: &MemberRef) -> Result<Value, EvalError> {
        let Some((last, parents)) = member.path.split_last() else {
            return Ok(root.clone());
        };
        let mut ty = root_ty.clone();
        let mut owner = root;
        for segment in parents {
            let field_ty = self.field_type(&ty, segment);
            match owner.field(segment) {
                Some(Value::Nil) | None => {
                    // An absent nested record reads as zero members.
                    let leaf = field_ty.and_then(|t| self.field_type(&t, last));
                    return Ok(match (member.access, leaf) {
                        (Access::Field, Some(t)) => Value::zero(&t, self.universe),
                        _ => Value::Nil,
                    });
                }
                Some(next) => owner = next,
            }
            ty = field_ty.unwrap_or(ty);
        }
        match member.access {
            Access::Getter { .. } => {
                let owner = match owner {
                    Value::Ptr(inner) => inner.as_ref(),
                    other => other,
                };
                self.runtime
                    .getter(owner, last)
                    .map_err(|message| EvalError::Func {
                        name: last.clone(),
                        message,
                    })
            }
            _ => Ok(owner.field(last).cloned().unwrap_or(Value::Nil)),
        }
    }

    fn write(
        &self,
        root_ty: &Type,
        root: &mut Value,
        member: &MemberRef,
        value: Value,
    ) -> Result<(), EvalError> {
        let Some((last, parents)) = member.path.split_last() else {
            return Ok(());
        };
        let mut ty = root_ty.clone();
        let mut owner = root;
        for segment in parents {
            let field_ty = self.field_type(&ty, segment).unwrap_or_else(|| ty.clone());
            owner = match owner {
                Value::Record(fields) => {
                    let slot = fields.entry(segment.clone()).or_insert(Value::Nil);
                    if *slot == Value::Nil && field_ty.is_pointer() {
                        *slot = Value::ptr(Value::zero(field_ty.deref_all(), self.universe));
                    }
                    match slot {
                        Value::Ptr(inner) => inner.as_mut(),
                        other => other,
                    }
                }
                other => return Err(shape("record", other)),
            };
            ty = field_ty;
        }
        match member.access {
            Access::Setter { .. } => self
                .runtime
                .setter(owner, last, value)
                .map_err(|message| EvalError::Func {
                    name: last.clone(),
                    message,
                }),
            _ => match owner {
                Value::Record(fields) => {
                    fields.insert(last.clone(), value);
                    Ok(())
                }
                other => Err(shape("record", other)),
            },
        }
    }
}

fn numeric(value: Value, to: Primitive) -> Result<Value, EvalError> {
    let overflow = |value: &dyn std::fmt::Display| EvalError::Overflow {
        value: value.to_string(),
        target: to,
    };
    match (value, to.family()) {
        (Value::Int(i), Family::Signed) => Ok(Value::Int(i)),
        (Value::Uint(u), Family::Unsigned) => Ok(Value::Uint(u)),
        (Value::Uint(u), Family::Signed) => i64::try_from(u)
            .map(Value::Int)
            .map_err(|_| overflow(&u)),
        (Value::Float(f), Family::Float) => Ok(Value::Float(f)),
        (Value::Complex(re, im), Family::Complex) => Ok(Value::Complex(re, im)),
        (other, _) => Err(shape(to.name(), &other)),
    }
}

fn enumeration(p: &EnumPlan, value: Value) -> Result<Value, EvalError> {
    let member = match &value {
        Value::Member(name) => Some(name.as_str()),
        Value::Nil => None,
        other => return Err(shape("member", other)),
    };
    if let Some(case) = member.and_then(|m| p.cases.iter().find(|c| c.source == m)) {
        return Ok(Value::Member(case.target.clone()));
    }
    if p.errorful {
        return Err(EvalError::NoMatch {
            what: "member",
            value: member.unwrap_or("nil").to_string(),
        });
    }
    Ok(p.default.as_deref().map_or(Value::Nil, Value::member))
}
