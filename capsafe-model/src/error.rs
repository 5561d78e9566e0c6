#![forbid(unsafe_code)]
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum ModelError {
    #[error("type `{name}` is declared more than once")]
    #[diagnostic(code(capsafe::model::duplicate_type))]
    DuplicateType { name: String },

    #[error("unknown marker trait `{name}`")]
    #[diagnostic(
        code(capsafe::model::unknown_marker),
        help("expected one of Immutable, Powerless, Record, Data, Equatable, DeepFrozen")
    )]
    UnknownMarker { name: String },

    #[error("malformed type `{text}`")]
    #[diagnostic(code(capsafe::model::type_syntax))]
    TypeSyntax { text: String },
}
