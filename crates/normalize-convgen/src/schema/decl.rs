//! Declarations and the in-memory type universe.
//!
//! The universe is what a declaration extractor would hand over: scopes of
//! named declarations (records, enumerations, unions) and constants, each with
//! a registered position.

use super::pos::{Pos, SourceMap};
use super::types::{Primitive, Type, TypeName, TypeParseError};
use indexmap::IndexMap;

/// A record field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: Type,
    pub exported: bool,
    pub pos: Pos,
}

/// A method declared on a named type, or required by a union.
#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub name: String,
    pub params: Vec<Type>,
    pub result: Option<Type>,
    /// The method can report a failure alongside its result.
    pub fallible: bool,
    /// Only callable through a pointer to the receiver.
    pub pointer_receiver: bool,
    pub exported: bool,
    pub pos: Pos,
}

impl Method {
    /// Same name and signature, ignoring receiver kind and position.
    pub fn same_signature(&self, other: &Method) -> bool {
        self.name == other.name
            && self.params == other.params
            && self.result == other.result
            && self.fallible == other.fallible
    }

    /// No parameters, one result.
    pub fn is_getter_shaped(&self) -> bool {
        self.params.is_empty() && self.result.is_some()
    }

    /// One parameter, no result.
    pub fn is_setter_shaped(&self) -> bool {
        self.params.len() == 1 && self.result.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeclKind {
    Record { fields: Vec<Field> },
    /// A primitive-backed enumeration; members are constants of this type.
    Enum { repr: Primitive },
    /// An interface; implementations are the named types whose method set
    /// covers every listed method.
    Union { methods: Vec<Method> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: TypeName,
    pub kind: DeclKind,
    pub methods: Vec<Method>,
    pub exported: bool,
    pub pos: Pos,
}

impl Declaration {
    pub fn fields(&self) -> &[Field] {
        match &self.kind {
            DeclKind::Record { fields } => fields,
            _ => &[],
        }
    }

    pub fn is_record(&self) -> bool {
        matches!(self.kind, DeclKind::Record { .. })
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.kind, DeclKind::Enum { .. })
    }

    pub fn is_union(&self) -> bool {
        matches!(self.kind, DeclKind::Union { .. })
    }

    /// Methods callable on a value (`pointer = false`) or through a pointer.
    pub fn method_set(&self, pointer: bool) -> impl Iterator<Item = &Method> {
        self.methods
            .iter()
            .filter(move |m| pointer || !m.pointer_receiver)
    }
}

/// A named constant, e.g. an enumeration member.
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    pub name: String,
    pub ty: TypeName,
    pub exported: bool,
    pub pos: Pos,
}

#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub name: String,
    decls: IndexMap<String, Declaration>,
    constants: Vec<Constant>,
    lines: u32,
}

impl Scope {
    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.decls.values()
    }

    pub fn declaration(&self, name: &str) -> Option<&Declaration> {
        self.decls.get(name)
    }

    pub fn constants(&self) -> &[Constant] {
        &self.constants
    }
}

/// Errors from building a [`Universe`].
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("{context}: {source}")]
    InvalidType {
        context: String,
        #[source]
        source: TypeParseError,
    },
    #[error("{0} redeclared")]
    Duplicate(String),
}

/// Every scope and declaration visible to the synthesizer.
#[derive(Debug, Clone, Default)]
pub struct Universe {
    scopes: IndexMap<String, Scope>,
    source_map: SourceMap,
}

impl Universe {
    pub fn builder() -> UniverseBuilder {
        UniverseBuilder::default()
    }

    pub fn source_map(&self) -> &SourceMap {
        &self.source_map
    }

    /// Positions for directives and requests are registered here too, so that
    /// every diagnostic resolves through one map.
    pub fn source_map_mut(&mut self) -> &mut SourceMap {
        &mut self.source_map
    }

    pub fn scope(&self, name: &str) -> Option<&Scope> {
        self.scopes.get(name)
    }

    pub fn scopes(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.values()
    }

    pub fn declaration(&self, name: &TypeName) -> Option<&Declaration> {
        self.scopes.get(&name.scope)?.declaration(&name.name)
    }

    /// The declaration behind a named type, if `ty` is one.
    pub fn declaration_of(&self, ty: &Type) -> Option<&Declaration> {
        self.declaration(ty.as_named()?)
    }

    pub fn is_record(&self, ty: &Type) -> bool {
        self.declaration_of(ty).is_some_and(Declaration::is_record)
    }

    /// Whether `ty` (a named type, or a pointer to one) provides every method
    /// in `required`.
    pub fn implements(&self, ty: &Type, required: &[Method]) -> bool {
        let (decl, pointer) = match ty {
            Type::Pointer(elem) => match self.declaration_of(elem) {
                Some(decl) => (decl, true),
                None => return false,
            },
            other => match self.declaration_of(other) {
                Some(decl) => (decl, false),
                None => return false,
            },
        };
        if decl.is_union() {
            return false;
        }
        required
            .iter()
            .all(|want| decl.method_set(pointer).any(|have| have.same_signature(want)))
    }
}

/// Collects scopes, then validates type notation in one pass.
#[derive(Debug, Default)]
pub struct UniverseBuilder {
    universe: Universe,
    errors: Vec<SchemaError>,
}

impl UniverseBuilder {
    /// Declare things in `scope`. Calling this twice for the same scope
    /// continues where the previous call left off.
    pub fn scope(mut self, name: &str, build: impl FnOnce(&mut ScopeBuilder<'_>)) -> Self {
        let scope = self
            .universe
            .scopes
            .entry(name.to_string())
            .or_insert_with(|| Scope {
                name: name.to_string(),
                ..Scope::default()
            });
        let mut builder = ScopeBuilder {
            scope,
            source_map: &mut self.universe.source_map,
            errors: &mut self.errors,
        };
        build(&mut builder);
        self
    }

    pub fn build(self) -> Result<Universe, SchemaError> {
        match self.errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(self.universe),
        }
    }
}

/// Declares records, enumerations, unions, and constants in one scope.
///
/// Every declaration and member gets its own line in a synthetic
/// `<scope>.schema` file, in declaration order.
pub struct ScopeBuilder<'a> {
    scope: &'a mut Scope,
    source_map: &'a mut SourceMap,
    errors: &'a mut Vec<SchemaError>,
}

impl ScopeBuilder<'_> {
    fn next_pos(&mut self, column: u32) -> Pos {
        self.scope.lines += 1;
        let file = format!("{}.schema", self.scope.name);
        self.source_map.add(file, self.scope.lines, column)
    }

    fn parse(&mut self, context: &str, ty: &str) -> Type {
        match ty.parse() {
            Ok(ty) => ty,
            Err(source) => {
                self.errors.push(SchemaError::InvalidType {
                    context: format!("{}.{context}", self.scope.name),
                    source,
                });
                Type::Primitive(Primitive::Bool)
            }
        }
    }

    fn declare(
        &mut self,
        name: &str,
        kind: DeclKind,
        methods: Vec<Method>,
        exported: bool,
        pos: Pos,
    ) {
        let decl = Declaration {
            name: TypeName::new(self.scope.name.clone(), name),
            kind,
            methods,
            exported,
            pos,
        };
        if self.scope.decls.insert(name.to_string(), decl).is_some() {
            self.errors
                .push(SchemaError::Duplicate(format!("{}.{name}", self.scope.name)));
        }
    }

    /// Declare an exported record.
    pub fn record(
        &mut self,
        name: &str,
        build: impl FnOnce(&mut RecordBuilder<'_, '_>),
    ) -> &mut Self {
        self.record_with(name, true, build)
    }

    pub fn private_record(
        &mut self,
        name: &str,
        build: impl FnOnce(&mut RecordBuilder<'_, '_>),
    ) -> &mut Self {
        self.record_with(name, false, build)
    }

    fn record_with(
        &mut self,
        name: &str,
        exported: bool,
        build: impl FnOnce(&mut RecordBuilder<'_, '_>),
    ) -> &mut Self {
        let pos = self.next_pos(1);
        let mut record = RecordBuilder {
            scope: self,
            record: name.to_string(),
            fields: Vec::new(),
            methods: Vec::new(),
        };
        build(&mut record);
        let RecordBuilder {
            fields, methods, ..
        } = record;
        self.declare(name, DeclKind::Record { fields }, methods, exported, pos);
        self
    }

    /// Declare an enumeration with exported members, in order.
    pub fn enumeration(&mut self, name: &str, repr: Primitive, members: &[&str]) -> &mut Self {
        let pos = self.next_pos(1);
        self.declare(name, DeclKind::Enum { repr }, Vec::new(), true, pos);
        for member in members {
            self.constant(member, name);
        }
        self
    }

    /// Declare a union whose implementations must provide `methods`.
    pub fn union(
        &mut self,
        name: &str,
        build: impl FnOnce(&mut UnionBuilder<'_, '_>),
    ) -> &mut Self {
        let pos = self.next_pos(1);
        let mut union = UnionBuilder {
            scope: self,
            union: name.to_string(),
            methods: Vec::new(),
        };
        build(&mut union);
        let methods = union.methods;
        self.declare(name, DeclKind::Union { methods }, Vec::new(), true, pos);
        self
    }

    /// An exported constant of the named type, declared in this scope unless
    /// `ty` is qualified (`scope.Name`).
    pub fn constant(&mut self, name: &str, ty: &str) -> &mut Self {
        self.constant_with(name, ty, true)
    }

    pub fn private_constant(&mut self, name: &str, ty: &str) -> &mut Self {
        self.constant_with(name, ty, false)
    }

    fn constant_with(&mut self, name: &str, ty: &str, exported: bool) -> &mut Self {
        let pos = self.next_pos(1);
        let ty = match ty.split_once('.') {
            Some((scope, ty)) => TypeName::new(scope, ty),
            None => TypeName::new(self.scope.name.clone(), ty),
        };
        self.scope.constants.push(Constant {
            name: name.to_string(),
            ty,
            exported,
            pos,
        });
        self
    }
}

/// Adds fields and methods to a record under construction.
pub struct RecordBuilder<'s, 'a> {
    scope: &'s mut ScopeBuilder<'a>,
    record: String,
    fields: Vec<Field>,
    methods: Vec<Method>,
}

impl RecordBuilder<'_, '_> {
    fn add_field(&mut self, name: &str, ty: &str, exported: bool) -> &mut Self {
        let pos = self.scope.next_pos(5);
        let ty = self.scope.parse(&format!("{}.{name}", self.record), ty);
        self.fields.push(Field {
            name: name.to_string(),
            ty,
            exported,
            pos,
        });
        self
    }

    fn add_method(
        &mut self,
        name: &str,
        params: &[&str],
        result: Option<&str>,
        fallible: bool,
        pointer_receiver: bool,
    ) -> &mut Self {
        let pos = self.scope.next_pos(5);
        let context = format!("{}.{name}", self.record);
        let params = params.iter().map(|p| self.scope.parse(&context, p)).collect();
        let result = result.map(|r| self.scope.parse(&context, r));
        self.methods.push(Method {
            name: name.to_string(),
            params,
            result,
            fallible,
            pointer_receiver,
            exported: is_exported_name(name),
            pos,
        });
        self
    }

    pub fn field(&mut self, name: &str, ty: &str) -> &mut Self {
        self.add_field(name, ty, true)
    }

    pub fn private_field(&mut self, name: &str, ty: &str) -> &mut Self {
        self.add_field(name, ty, false)
    }

    /// A value-receiver method with no parameters.
    pub fn getter(&mut self, name: &str, ty: &str) -> &mut Self {
        self.add_method(name, &[], Some(ty), false, false)
    }

    pub fn fallible_getter(&mut self, name: &str, ty: &str) -> &mut Self {
        self.add_method(name, &[], Some(ty), true, false)
    }

    /// A pointer-receiver method taking one parameter.
    pub fn setter(&mut self, name: &str, ty: &str) -> &mut Self {
        self.add_method(name, &[ty], None, false, true)
    }

    pub fn fallible_setter(&mut self, name: &str, ty: &str) -> &mut Self {
        self.add_method(name, &[ty], None, true, true)
    }

    pub fn method(&mut self, name: &str, params: &[&str], result: Option<&str>) -> &mut Self {
        self.add_method(name, params, result, false, false)
    }

    pub fn pointer_method(
        &mut self,
        name: &str,
        params: &[&str],
        result: Option<&str>,
    ) -> &mut Self {
        self.add_method(name, params, result, false, true)
    }
}

/// Adds required methods to a union under construction.
pub struct UnionBuilder<'s, 'a> {
    scope: &'s mut ScopeBuilder<'a>,
    union: String,
    methods: Vec<Method>,
}

impl UnionBuilder<'_, '_> {
    pub fn method(&mut self, name: &str, params: &[&str], result: Option<&str>) -> &mut Self {
        let pos = self.scope.next_pos(5);
        let context = format!("{}.{name}", self.union);
        let params = params.iter().map(|p| self.scope.parse(&context, p)).collect();
        let result = result.map(|r| self.scope.parse(&context, r));
        self.methods.push(Method {
            name: name.to_string(),
            params,
            result,
            fallible: false,
            pointer_receiver: false,
            exported: is_exported_name(name),
            pos,
        });
        self
    }
}

/// Methods follow the usual convention: an uppercase initial is exported.
fn is_exported_name(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}
