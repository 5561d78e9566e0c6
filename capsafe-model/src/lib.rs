#![forbid(unsafe_code)]

mod error;
mod marker;
mod node;
mod program;
mod types;

pub use error::ModelError;
pub use marker::{MarkerSet, MarkerTrait};
pub use node::{CompilationUnit, EqOp, Node, NodeKind};
pub use program::{Program, ProgramModel};
pub use types::{
    Field, Ident, PrimitiveKind, Span, Spanned, TypeDecl, TypeKind, TypeRef, span,
};
