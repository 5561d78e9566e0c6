#![forbid(unsafe_code)]
#![allow(unused_assignments)]

use capsafe_model::Span;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProblemKind {
    /// The program model could not resolve a referenced type.
    ModelAccess,
    /// A trait claim contradicts a structural fact about the type.
    MalformedClaim,
    /// Ordinary field or expression rule finding.
    RuleViolation,
}

impl ProblemKind {
    pub fn display(&self) -> &'static str {
        match self {
            ProblemKind::ModelAccess => "model-access",
            ProblemKind::MalformedClaim => "malformed-claim",
            ProblemKind::RuleViolation => "rule-violation",
        }
    }
}

/// A single verification error.
#[derive(Clone, Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(capsafe::verify), severity(Error))]
pub struct Problem {
    pub message: String,
    #[label]
    pub span: Span,
    pub kind: ProblemKind,
}

impl Problem {
    pub fn new(kind: ProblemKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            kind,
        }
    }

    pub fn rule(message: impl Into<String>, span: Span) -> Self {
        Self::new(ProblemKind::RuleViolation, message, span)
    }

    pub fn malformed(message: impl Into<String>, span: Span) -> Self {
        Self::new(ProblemKind::MalformedClaim, message, span)
    }

    pub fn model_access(message: impl Into<String>, span: Span) -> Self {
        Self::new(ProblemKind::ModelAccess, message, span)
    }
}

/// A name the program model could not resolve.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("could not resolve `{name}`")]
pub struct Unresolved {
    pub name: String,
}
