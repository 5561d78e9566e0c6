#![forbid(unsafe_code)]

//! Fixed implication order between marker traits.

use capsafe_model::{MarkerSet, MarkerTrait};

/// `(a, b)`: every type honoring `a` honors `b`.
const IMPLICATIONS: &[(MarkerTrait, MarkerTrait)] =
    &[(MarkerTrait::Powerless, MarkerTrait::Immutable)];

/// Claims that contradict extending the identity-token root.
pub const IDENTITY_CONFLICTS: MarkerSet =
    MarkerSet::of(&[MarkerTrait::Powerless, MarkerTrait::Record, MarkerTrait::Data]);

/// Traits transitively implied by `t`, excluding `t` itself.
pub fn implied_by(t: MarkerTrait) -> MarkerSet {
    let mut out = MarkerSet::EMPTY;
    let mut frontier = vec![t];
    while let Some(cur) = frontier.pop() {
        for &(from, to) in IMPLICATIONS {
            if from == cur && to != t && out.insert(to) {
                frontier.push(to);
            }
        }
    }
    out
}

pub fn with_implied(set: MarkerSet) -> MarkerSet {
    set.iter().fold(set, |acc, t| acc.union(implied_by(t)))
}

/// Drop every trait implied by another member of `set`.
pub fn minimal_claims(set: MarkerSet) -> MarkerSet {
    let mut out = set;
    for t in set.iter() {
        for implied in implied_by(t).iter() {
            out.remove(implied);
        }
    }
    out
}
