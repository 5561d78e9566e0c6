#![forbid(unsafe_code)]

use std::fmt;
use std::str::FromStr;

use miette::SourceSpan;

use crate::error::ModelError;
use crate::marker::{MarkerSet, MarkerTrait};

pub type Span = SourceSpan;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spanned<T> {
    pub span: Span,
    pub node: T,
}

impl<T> Spanned<T> {
    pub fn new(span: Span, node: T) -> Self {
        Self { span, node }
    }
}

pub fn span(start: usize, len: usize) -> Span {
    SourceSpan::new(start.into(), len)
}

pub type Ident = Spanned<String>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
        }
    }

    pub fn from_keyword(s: &str) -> Option<Self> {
        Some(match s {
            "boolean" => PrimitiveKind::Boolean,
            "byte" => PrimitiveKind::Byte,
            "char" => PrimitiveKind::Char,
            "short" => PrimitiveKind::Short,
            "int" => PrimitiveKind::Int,
            "long" => PrimitiveKind::Long,
            "float" => PrimitiveKind::Float,
            "double" => PrimitiveKind::Double,
            _ => return None,
        })
    }
}

/// A resolved static type as reported by the front end.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Primitive(PrimitiveKind),
    Null,
    Array(Box<TypeRef>),
    /// Unbound type parameter.
    TypeVar(String),
    /// Declared type, by fully qualified name.
    Named(String),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    pub fn array_of(elem: TypeRef) -> Self {
        TypeRef::Array(Box::new(elem))
    }

    pub fn is_primitive_or_null(&self) -> bool {
        matches!(self, TypeRef::Primitive(_) | TypeRef::Null)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Primitive(p) => f.write_str(p.keyword()),
            TypeRef::Null => f.write_str("null"),
            TypeRef::Array(elem) => write!(f, "{elem}[]"),
            TypeRef::TypeVar(name) => f.write_str(name),
            TypeRef::Named(name) => f.write_str(name),
        }
    }
}

/// Text form: primitive keywords, `null`, `T[]`, `'T` for a type variable,
/// anything else is a qualified name. Generic arguments (`List<String>`) are
/// stripped.
impl FromStr for TypeRef {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let malformed = || ModelError::TypeSyntax {
            text: s.to_string(),
        };
        if text.is_empty() {
            return Err(malformed());
        }
        if let Some(elem) = text.strip_suffix("[]") {
            return Ok(TypeRef::array_of(elem.parse().map_err(|_| malformed())?));
        }
        if text == "null" {
            return Ok(TypeRef::Null);
        }
        if let Some(p) = PrimitiveKind::from_keyword(text) {
            return Ok(TypeRef::Primitive(p));
        }
        if let Some(var) = text.strip_prefix('\'') {
            if var.is_empty() || !is_qualified_name(var) {
                return Err(malformed());
            }
            return Ok(TypeRef::TypeVar(var.to_string()));
        }
        let base = match text.find('<') {
            Some(idx) if text.ends_with('>') => &text[..idx],
            Some(_) => return Err(malformed()),
            None => text,
        };
        if !is_qualified_name(base) {
            return Err(malformed());
        }
        Ok(TypeRef::Named(base.to_string()))
    }
}

fn is_qualified_name(s: &str) -> bool {
    !s.is_empty()
        && s.split('.').all(|seg| {
            let mut chars = seg.chars();
            matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_' || c == '$')
                && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Annotation,
}

impl TypeKind {
    /// Interfaces and annotations only carry implicitly static final fields.
    pub fn is_interface_like(&self) -> bool {
        matches!(self, TypeKind::Interface | TypeKind::Annotation)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub name: Ident,
    pub ty: TypeRef,
    pub is_final: bool,
    pub is_static: bool,
    pub is_synthetic: bool,
    pub is_enum_constant: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: Spanned::new(span(0, 0), name.into()),
            ty,
            is_final: false,
            is_static: false,
            is_synthetic: false,
            is_enum_constant: false,
        }
    }

    pub fn at(mut self, start: usize, len: usize) -> Self {
        self.name.span = span(start, len);
        self
    }

    pub fn final_(mut self) -> Self {
        self.is_final = true;
        self
    }

    pub fn static_(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn synthetic(mut self) -> Self {
        self.is_synthetic = true;
        self
    }

    pub fn enum_constant(mut self) -> Self {
        self.is_enum_constant = true;
        self.is_static = true;
        self.is_final = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name.node
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TypeDecl {
    /// Fully qualified name; the type's identity.
    pub name: String,
    pub kind: TypeKind,
    pub traits: MarkerSet,
    pub superclass: Option<String>,
    /// Non-marker super-interfaces.
    pub interfaces: Vec<String>,
    pub enclosing: Option<String>,
    pub is_static_member: bool,
    pub fields: Vec<Field>,
    pub is_builtin: bool,
    pub name_span: Span,
}

impl TypeDecl {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            traits: MarkerSet::EMPTY,
            superclass: None,
            interfaces: Vec::new(),
            enclosing: None,
            is_static_member: false,
            fields: Vec::new(),
            is_builtin: false,
            name_span: span(0, 0),
        }
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Class)
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Interface)
    }

    pub fn enumeration(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Enum)
    }

    pub fn at(mut self, start: usize, len: usize) -> Self {
        self.name_span = span(start, len);
        self
    }

    pub fn declares(mut self, t: MarkerTrait) -> Self {
        self.traits.insert(t);
        self
    }

    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    pub fn implements(mut self, iface: impl Into<String>) -> Self {
        self.interfaces.push(iface.into());
        self
    }

    /// Non-static member of `outer`.
    pub fn inner_of(mut self, outer: impl Into<String>) -> Self {
        self.enclosing = Some(outer.into());
        self.is_static_member = false;
        self
    }

    /// Static member of `outer`.
    pub fn nested_in(mut self, outer: impl Into<String>) -> Self {
        self.enclosing = Some(outer.into());
        self.is_static_member = true;
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn builtin(mut self) -> Self {
        self.is_builtin = true;
        self
    }

    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Enclosing type whose instance state this type can reach.
    pub fn enclosing_instance(&self) -> Option<&str> {
        if self.is_static_member {
            None
        } else {
            self.enclosing.as_deref()
        }
    }

    /// Superclass followed by super-interfaces.
    pub fn supertypes(&self) -> impl Iterator<Item = &str> {
        self.superclass
            .as_deref()
            .into_iter()
            .chain(self.interfaces.iter().map(String::as_str))
    }
}
