#![forbid(unsafe_code)]

use std::collections::{HashSet, VecDeque};

use capsafe_model::{MarkerTrait, ProgramModel, TypeDecl};

use crate::registry::MarkerRegistry;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeKind {
    Enclosing,
    Superclass,
}

impl EdgeKind {
    pub fn display(&self) -> &'static str {
        match self {
            EdgeKind::Enclosing => "enclosing type",
            EdgeKind::Superclass => "superclass",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnresolvedEdge {
    pub kind: EdgeKind,
    pub from: String,
    pub target: String,
}

/// Declaration sites whose own fields must satisfy a claim.
#[derive(Clone, Debug, Default)]
pub struct RequiredScopes<'m> {
    /// Discovery order; the candidate comes first.
    pub scopes: Vec<&'m TypeDecl>,
    pub unresolved: Vec<UnresolvedEdge>,
}

impl RequiredScopes<'_> {
    pub fn names(&self) -> Vec<&str> {
        self.scopes.iter().map(|d| d.name.as_str()).collect()
    }
}

/// Collect `ty` plus every superclass and non-static enclosing type reachable
/// from it that does not already honor `t`. Types honoring `t` are trusted
/// and end the walk along that edge.
pub fn find_required_scopes<'m, M: ProgramModel + ?Sized>(
    model: &'m M,
    registry: &MarkerRegistry,
    ty: &'m TypeDecl,
    t: MarkerTrait,
) -> RequiredScopes<'m> {
    let mut out = RequiredScopes::default();
    let mut found: HashSet<&'m str> = HashSet::new();
    let mut queue: VecDeque<&'m TypeDecl> = VecDeque::new();

    found.insert(ty.name.as_str());
    out.scopes.push(ty);
    queue.push_back(ty);

    while let Some(next) = queue.pop_front() {
        let edges = [
            (EdgeKind::Enclosing, next.enclosing_instance()),
            (EdgeKind::Superclass, next.superclass.as_deref()),
        ];
        for (kind, target) in edges {
            let Some(target) = target else { continue };
            let Some(decl) = model.lookup(target) else {
                // Library types the registry knows are opaque leaves.
                if registry.is_known(target) {
                    continue;
                }
                out.unresolved.push(UnresolvedEdge {
                    kind,
                    from: next.name.clone(),
                    target: target.to_string(),
                });
                continue;
            };
            if registry.type_honors(model, decl, t) {
                tracing::trace!(from = %next.name, to = %decl.name, marker = %t, "trusted");
                continue;
            }
            if found.insert(decl.name.as_str()) {
                tracing::trace!(from = %next.name, to = %decl.name, edge = kind.display(), "scope");
                out.scopes.push(decl);
                queue.push_back(decl);
            }
        }
    }
    out
}
