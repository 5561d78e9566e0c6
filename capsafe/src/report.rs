#![forbid(unsafe_code)]

use std::fs;
use std::path::{Path, PathBuf};

use capsafe_core::{Diagnostics, Problem};
use capsafe_model::{CompilationUnit, Span};
use miette::NamedSource;
use serde::Serialize;

pub const CHECK_SCHEMA: &str = "capsafe.check.v1";

#[derive(Debug, Clone, Serialize)]
pub struct SpanRange {
    pub offset: usize,
    pub len: usize,
}

impl From<Span> for SpanRange {
    fn from(s: Span) -> Self {
        Self {
            offset: s.offset(),
            len: s.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProblemReport {
    pub message: String,
    pub span: SpanRange,
    pub severity: &'static str,
    pub kind: &'static str,
}

impl From<&Problem> for ProblemReport {
    fn from(p: &Problem) -> Self {
        Self {
            message: p.message.clone(),
            span: p.span.into(),
            severity: "error",
            kind: p.kind.display(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UnitReport {
    pub unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub problems: Vec<ProblemReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub schema: &'static str,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
    pub ok: bool,
    pub total: usize,
    pub units: Vec<UnitReport>,
}

impl CheckReport {
    pub fn new(
        model: &Path,
        config: Option<&Path>,
        units: &[CompilationUnit],
        sources: &[Option<PathBuf>],
        results: &[Diagnostics],
    ) -> Self {
        let units: Vec<UnitReport> = units
            .iter()
            .zip(results)
            .enumerate()
            .map(|(i, (unit, diags))| UnitReport {
                unit: unit.name.clone(),
                source: sources
                    .get(i)
                    .and_then(|s| s.as_ref())
                    .map(|s| s.display().to_string()),
                problems: diags.iter().map(ProblemReport::from).collect(),
            })
            .collect();
        let total = units.iter().map(|u| u.problems.len()).sum();
        Self {
            schema: CHECK_SCHEMA,
            model: model.display().to_string(),
            config: config.map(|p| p.display().to_string()),
            ok: total == 0,
            total,
            units,
        }
    }
}

/// Print each problem as a miette report, with the unit's source attached
/// when it can be read.
pub fn render_human(units: &[CompilationUnit], sources: &[Option<PathBuf>], results: &[Diagnostics]) {
    for (i, (unit, diags)) in units.iter().zip(results).enumerate() {
        if diags.is_empty() {
            continue;
        }
        let text = sources.get(i).and_then(|s| s.as_ref()).and_then(|path| {
            fs::read_to_string(path)
                .map_err(|e| tracing::warn!(path = %path.display(), "cannot read source: {e}"))
                .ok()
        });
        for problem in diags {
            match &text {
                Some(src) if fits(problem.span, src) => {
                    let report = miette::Report::new(problem.clone())
                        .with_source_code(NamedSource::new(unit.name.clone(), src.clone()));
                    eprintln!("{report:?}");
                }
                _ => {
                    let offset = problem.span.offset();
                    eprintln!("error: {}: {} (at offset {offset})", unit.name, problem.message);
                }
            }
        }
    }
}

/// Spans come from the model file unchecked; only hand miette ones that land
/// on character boundaries inside the source.
fn fits(span: Span, src: &str) -> bool {
    span.offset()
        .checked_add(span.len())
        .is_some_and(|end| src.is_char_boundary(span.offset()) && src.is_char_boundary(end))
}
