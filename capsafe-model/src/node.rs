#![forbid(unsafe_code)]

use crate::types::{Ident, Span, Spanned, TypeRef, span};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EqOp {
    Eq,
    Ne,
}

impl EqOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            EqOp::Eq => "==",
            EqOp::Ne => "!=",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub span: Span,
    /// Resolved static type; `None` when the node is not an expression or
    /// resolution failed.
    pub ty: Option<TypeRef>,
    pub kind: NodeKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Equality {
        op: EqOp,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    Method {
        name: Ident,
        is_native: bool,
        body: Vec<Node>,
    },
    /// Any node the checker does not inspect; only its children are walked.
    Other { children: Vec<Node> },
}

impl Node {
    /// Leaf expression with a resolved type.
    pub fn expr(span: Span, ty: TypeRef) -> Self {
        Node {
            span,
            ty: Some(ty),
            kind: NodeKind::Other {
                children: Vec::new(),
            },
        }
    }

    /// Leaf expression whose type the front end could not resolve.
    pub fn unresolved(span: Span) -> Self {
        Node {
            span,
            ty: None,
            kind: NodeKind::Other {
                children: Vec::new(),
            },
        }
    }

    pub fn block(span: Span, children: Vec<Node>) -> Self {
        Node {
            span,
            ty: None,
            kind: NodeKind::Other { children },
        }
    }

    pub fn equality(span: Span, op: EqOp, lhs: Node, rhs: Node) -> Self {
        Node {
            span,
            ty: Some(TypeRef::Primitive(crate::types::PrimitiveKind::Boolean)),
            kind: NodeKind::Equality {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
        }
    }

    pub fn method(span: Span, name: Ident, is_native: bool, body: Vec<Node>) -> Self {
        Node {
            span,
            ty: None,
            kind: NodeKind::Method {
                name,
                is_native,
                body,
            },
        }
    }

    pub fn children(&self) -> Box<dyn Iterator<Item = &Node> + '_> {
        match &self.kind {
            NodeKind::Equality { lhs, rhs, .. } => Box::new([lhs.as_ref(), rhs.as_ref()].into_iter()),
            NodeKind::Method { body, .. } => Box::new(body.iter()),
            NodeKind::Other { children } => Box::new(children.iter()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompilationUnit {
    pub name: String,
    /// Package declarations in source order; well-formed units have at most one.
    pub packages: Vec<Spanned<String>>,
    /// Qualified names of the types declared in this unit, in source order.
    pub types: Vec<String>,
    pub body: Vec<Node>,
}

impl CompilationUnit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            packages: Vec::new(),
            types: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn package(mut self, name: impl Into<String>, start: usize, len: usize) -> Self {
        self.packages.push(Spanned::new(span(start, len), name.into()));
        self
    }

    pub fn declares(mut self, type_name: impl Into<String>) -> Self {
        self.types.push(type_name.into());
        self
    }

    pub fn node(mut self, node: Node) -> Self {
        self.body.push(node);
        self
    }
}
