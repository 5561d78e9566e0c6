#![forbid(unsafe_code)]

use crate::error::Problem;

/// Append-only problem list for one compilation unit.
///
/// Problems stay in the order the checks produced them. Nothing is sorted or
/// deduplicated: the same field rejected under two claims is two problems.
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    problems: Vec<Problem>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, problem: Problem) {
        tracing::trace!(message = %problem.message, kind = problem.kind.display(), "problem");
        self.problems.push(problem);
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Problem> {
        self.problems.iter()
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    /// Messages in order; handy for comparisons.
    pub fn messages(&self) -> Vec<&str> {
        self.problems.iter().map(|p| p.message.as_str()).collect()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Problem;
    type IntoIter = std::slice::Iter<'a, Problem>;

    fn into_iter(self) -> Self::IntoIter {
        self.problems.iter()
    }
}
