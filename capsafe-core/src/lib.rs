#![forbid(unsafe_code)]

mod closure;
mod diagnostics;
mod error;
mod exprs;
mod fields;
pub mod lattice;
mod registry;
mod verifier;

pub use closure::{EdgeKind, RequiredScopes, UnresolvedEdge, find_required_scopes};
pub use diagnostics::Diagnostics;
pub use error::{Problem, ProblemKind, Unresolved};
pub use exprs::ExpressionChecker;
pub use fields::{verify_fields, verify_static_fields};
pub use registry::{
    DEFAULT_ENUM_BASE, DEFAULT_IDENTITY_ROOT, DEFAULT_RESERVED_NAMESPACE, HonoraryTable,
    MarkerRegistry, Policy,
};
pub use verifier::Verifier;
