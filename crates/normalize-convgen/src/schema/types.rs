//! Type descriptors and their textual notation.
//!
//! ```text
//! bool, int8 .. uint64, float32, complex128, string   primitives
//! scope.Name                                          declared type
//! *T                                                  pointer / optional
//! [T; N]                                              fixed-length array
//! [T]                                                 growable sequence
//! {K: V}                                              associative map
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Scalar kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
}

/// Representation family of a primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Bool,
    Signed,
    Unsigned,
    Float,
    Complex,
    String,
}

impl Primitive {
    pub const ALL: [Primitive; 16] = [
        Primitive::Bool,
        Primitive::Int,
        Primitive::Int8,
        Primitive::Int16,
        Primitive::Int32,
        Primitive::Int64,
        Primitive::Uint,
        Primitive::Uint8,
        Primitive::Uint16,
        Primitive::Uint32,
        Primitive::Uint64,
        Primitive::Float32,
        Primitive::Float64,
        Primitive::Complex64,
        Primitive::Complex128,
        Primitive::String,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Primitive::Bool => "bool",
            Primitive::Int => "int",
            Primitive::Int8 => "int8",
            Primitive::Int16 => "int16",
            Primitive::Int32 => "int32",
            Primitive::Int64 => "int64",
            Primitive::Uint => "uint",
            Primitive::Uint8 => "uint8",
            Primitive::Uint16 => "uint16",
            Primitive::Uint32 => "uint32",
            Primitive::Uint64 => "uint64",
            Primitive::Float32 => "float32",
            Primitive::Float64 => "float64",
            Primitive::Complex64 => "complex64",
            Primitive::Complex128 => "complex128",
            Primitive::String => "string",
        }
    }

    pub fn family(self) -> Family {
        match self {
            Primitive::Bool => Family::Bool,
            Primitive::Int
            | Primitive::Int8
            | Primitive::Int16
            | Primitive::Int32
            | Primitive::Int64 => Family::Signed,
            Primitive::Uint
            | Primitive::Uint8
            | Primitive::Uint16
            | Primitive::Uint32
            | Primitive::Uint64 => Family::Unsigned,
            Primitive::Float32 | Primitive::Float64 => Family::Float,
            Primitive::Complex64 | Primitive::Complex128 => Family::Complex,
            Primitive::String => Family::String,
        }
    }

    /// Bit width used by the narrowing check. The unsized `int` and `uint`
    /// count as 32 bits, the smallest width they are guaranteed to have.
    /// Strings have no meaningful width.
    pub fn width(self) -> Option<u32> {
        match self {
            Primitive::Bool => Some(1),
            Primitive::Int8 | Primitive::Uint8 => Some(8),
            Primitive::Int16 | Primitive::Uint16 => Some(16),
            Primitive::Int
            | Primitive::Int32
            | Primitive::Uint
            | Primitive::Uint32
            | Primitive::Float32 => Some(32),
            Primitive::Int64 | Primitive::Uint64 | Primitive::Float64 | Primitive::Complex64 => {
                Some(64)
            }
            Primitive::Complex128 => Some(128),
            Primitive::String => None,
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(self.family(), Family::Signed | Family::Unsigned)
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A declared type, qualified by the scope that declares it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName {
    pub scope: String,
    pub name: String,
}

impl TypeName {
    pub fn new(scope: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.scope, self.name)
    }
}

/// Structural type descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Type {
    Primitive(Primitive),
    Named(TypeName),
    Pointer(Box<Type>),
    Array(usize, Box<Type>),
    Seq(Box<Type>),
    Map(Box<Type>, Box<Type>),
}

impl Type {
    pub fn named(scope: impl Into<String>, name: impl Into<String>) -> Self {
        Type::Named(TypeName::new(scope, name))
    }

    pub fn pointer(elem: Type) -> Self {
        Type::Pointer(Box::new(elem))
    }

    pub fn seq(elem: Type) -> Self {
        Type::Seq(Box::new(elem))
    }

    pub fn array(len: usize, elem: Type) -> Self {
        Type::Array(len, Box::new(elem))
    }

    pub fn map(key: Type, elem: Type) -> Self {
        Type::Map(Box::new(key), Box::new(elem))
    }

    pub fn as_named(&self) -> Option<&TypeName> {
        match self {
            Type::Named(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_primitive(&self) -> Option<Primitive> {
        match self {
            Type::Primitive(p) => Some(*p),
            _ => None,
        }
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Pointer(_))
    }

    /// Number of pointer levels wrapped around the innermost type.
    pub fn pointer_depth(&self) -> usize {
        match self {
            Type::Pointer(elem) => 1 + elem.pointer_depth(),
            _ => 0,
        }
    }

    /// The innermost non-pointer type.
    pub fn deref_all(&self) -> &Type {
        match self {
            Type::Pointer(elem) => elem.deref_all(),
            other => other,
        }
    }
}

impl From<Primitive> for Type {
    fn from(p: Primitive) -> Self {
        Type::Primitive(p)
    }
}

impl From<TypeName> for Type {
    fn from(name: TypeName) -> Self {
        Type::Named(name)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(p) => write!(f, "{p}"),
            Type::Named(name) => write!(f, "{name}"),
            Type::Pointer(elem) => write!(f, "*{elem}"),
            Type::Array(len, elem) => write!(f, "[{elem}; {len}]"),
            Type::Seq(elem) => write!(f, "[{elem}]"),
            Type::Map(key, elem) => write!(f, "{{{key}: {elem}}}"),
        }
    }
}

/// Error from parsing type notation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid type `{input}`: {message}")]
pub struct TypeParseError {
    pub input: String,
    pub message: String,
}

impl FromStr for Type {
    type Err = TypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = Parser { src: s, at: 0 };
        let ty = parser.parse().map_err(|message| TypeParseError {
            input: s.to_string(),
            message,
        })?;
        parser.skip_ws();
        if parser.at != s.len() {
            return Err(TypeParseError {
                input: s.to_string(),
                message: format!("unexpected trailing input at offset {}", parser.at),
            });
        }
        Ok(ty)
    }
}

struct Parser<'a> {
    src: &'a str,
    at: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.at..].chars().next()
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek().filter(|c| c.is_whitespace()) {
            self.at += c.len_utf8();
        }
    }

    fn expect(&mut self, want: char) -> Result<(), String> {
        self.skip_ws();
        match self.peek() {
            Some(c) if c == want => {
                self.at += c.len_utf8();
                Ok(())
            }
            Some(c) => Err(format!("expected `{want}`, found `{c}`")),
            None => Err(format!("expected `{want}`, found end of input")),
        }
    }

    fn parse(&mut self) -> Result<Type, String> {
        self.skip_ws();
        match self.peek() {
            Some('*') => {
                self.at += 1;
                Ok(Type::pointer(self.parse()?))
            }
            Some('[') => {
                self.at += 1;
                let elem = self.parse()?;
                self.skip_ws();
                if self.peek() == Some(';') {
                    self.at += 1;
                    self.skip_ws();
                    let digits = self.take_while(|c| c.is_ascii_digit());
                    let len = digits
                        .parse::<usize>()
                        .map_err(|_| format!("invalid array length `{digits}`"))?;
                    self.expect(']')?;
                    Ok(Type::array(len, elem))
                } else {
                    self.expect(']')?;
                    Ok(Type::seq(elem))
                }
            }
            Some('{') => {
                self.at += 1;
                let key = self.parse()?;
                self.expect(':')?;
                let elem = self.parse()?;
                self.expect('}')?;
                Ok(Type::map(key, elem))
            }
            Some(_) => {
                let word = self.take_while(|c| c.is_alphanumeric() || c == '_' || c == '.');
                if word.is_empty() {
                    return Err(format!("unexpected character at offset {}", self.at));
                }
                if let Some((scope, name)) = word.rsplit_once('.') {
                    if scope.is_empty() || name.is_empty() {
                        return Err(format!("malformed type name `{word}`"));
                    }
                    return Ok(Type::named(scope, name));
                }
                Primitive::ALL
                    .into_iter()
                    .find(|p| p.name() == word)
                    .map(Type::Primitive)
                    .ok_or_else(|| {
                        format!("unknown type `{word}`; declared types are written `scope.Name`")
                    })
            }
            None => Err("expected a type, found end of input".to_string()),
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.at;
        while let Some(c) = self.peek().filter(|&c| pred(c)) {
            self.at += c.len_utf8();
        }
        &self.src[start..self.at]
    }
}

impl Serialize for Type {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Type {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Type {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_roundtrips_display() {
        for s in [
            "int8",
            "a.User",
            "*a.User",
            "**int",
            "[string]",
            "[float64; 4]",
            "{string: [*b.Item]}",
        ] {
            assert_eq!(parse(s).to_string(), s);
        }
    }

    #[test]
    fn test_parse_tolerates_whitespace() {
        assert_eq!(parse(" { int :  [ uint8 ;2 ] } "), parse("{int: [uint8; 2]}"));
    }

    #[test]
    fn test_parse_errors() {
        assert!("User".parse::<Type>().is_err());
        assert!("[int".parse::<Type>().is_err());
        assert!("[int; x]".parse::<Type>().is_err());
        assert!("int int".parse::<Type>().is_err());
        assert!("".parse::<Type>().is_err());
    }

    #[test]
    fn test_pointer_depth() {
        let t = parse("**a.X");
        assert_eq!(t.pointer_depth(), 2);
        assert_eq!(t.deref_all(), &Type::named("a", "X"));
    }

    #[test]
    fn test_widths() {
        assert_eq!(Primitive::Int.width(), Some(32));
        assert_eq!(Primitive::Uint64.width(), Some(64));
        assert_eq!(Primitive::Complex128.width(), Some(128));
        assert_eq!(Primitive::String.width(), None);
    }
}
