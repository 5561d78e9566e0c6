#![forbid(unsafe_code)]

use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Marker traits a type may declare to claim a safety property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MarkerTrait {
    /// No mutable state reachable through fields.
    Immutable,
    /// Immutable and conveys no authority.
    Powerless,
    /// Selfless: no object identity, compared by content.
    Record,
    Data,
    /// Identity comparison is meaningful.
    Equatable,
    DeepFrozen,
}

impl MarkerTrait {
    pub const ALL: [MarkerTrait; 6] = [
        MarkerTrait::Immutable,
        MarkerTrait::Powerless,
        MarkerTrait::Record,
        MarkerTrait::Data,
        MarkerTrait::Equatable,
        MarkerTrait::DeepFrozen,
    ];

    pub fn display(&self) -> &'static str {
        match self {
            MarkerTrait::Immutable => "Immutable",
            MarkerTrait::Powerless => "Powerless",
            MarkerTrait::Record => "Record",
            MarkerTrait::Data => "Data",
            MarkerTrait::Equatable => "Equatable",
            MarkerTrait::DeepFrozen => "DeepFrozen",
        }
    }

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for MarkerTrait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display())
    }
}

impl FromStr for MarkerTrait {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Immutable" => Ok(MarkerTrait::Immutable),
            "Powerless" | "Incapable" => Ok(MarkerTrait::Powerless),
            "Record" | "Selfless" => Ok(MarkerTrait::Record),
            "Data" => Ok(MarkerTrait::Data),
            "Equatable" => Ok(MarkerTrait::Equatable),
            "DeepFrozen" => Ok(MarkerTrait::DeepFrozen),
            other => Err(ModelError::UnknownMarker {
                name: other.to_string(),
            }),
        }
    }
}

/// Set of marker traits. Iteration follows `MarkerTrait::ALL` order.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MarkerSet(u8);

impl MarkerSet {
    pub const EMPTY: MarkerSet = MarkerSet(0);

    pub const fn of(traits: &[MarkerTrait]) -> Self {
        let mut bits = 0u8;
        let mut i = 0;
        while i < traits.len() {
            bits |= traits[i].bit();
            i += 1;
        }
        MarkerSet(bits)
    }

    pub fn contains(&self, t: MarkerTrait) -> bool {
        self.0 & t.bit() != 0
    }

    pub fn insert(&mut self, t: MarkerTrait) -> bool {
        let fresh = !self.contains(t);
        self.0 |= t.bit();
        fresh
    }

    pub fn remove(&mut self, t: MarkerTrait) {
        self.0 &= !t.bit();
    }

    pub fn union(self, other: MarkerSet) -> MarkerSet {
        MarkerSet(self.0 | other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = MarkerTrait> + '_ {
        MarkerTrait::ALL.into_iter().filter(|t| self.contains(*t))
    }
}

impl FromIterator<MarkerTrait> for MarkerSet {
    fn from_iter<I: IntoIterator<Item = MarkerTrait>>(iter: I) -> Self {
        let mut set = MarkerSet::EMPTY;
        for t in iter {
            set.insert(t);
        }
        set
    }
}

impl fmt::Debug for MarkerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for MarkerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(|t| t.display()).collect();
        write!(f, "{}", names.join(" | "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_parse_to_canonical_traits() {
        assert_eq!("Incapable".parse::<MarkerTrait>().unwrap(), MarkerTrait::Powerless);
        assert_eq!("Selfless".parse::<MarkerTrait>().unwrap(), MarkerTrait::Record);
        assert!("Mutable".parse::<MarkerTrait>().is_err());
    }

    #[test]
    fn set_iterates_in_declaration_order() {
        let set: MarkerSet = [MarkerTrait::DeepFrozen, MarkerTrait::Immutable, MarkerTrait::Data]
            .into_iter()
            .collect();
        let order: Vec<_> = set.iter().collect();
        assert_eq!(
            order,
            vec![MarkerTrait::Immutable, MarkerTrait::Data, MarkerTrait::DeepFrozen]
        );
        assert_eq!(set.len(), 3);
        assert_eq!(set.to_string(), "Immutable | Data | DeepFrozen");
    }

    #[test]
    fn insert_reports_freshness() {
        let mut set = MarkerSet::EMPTY;
        assert!(set.insert(MarkerTrait::Equatable));
        assert!(!set.insert(MarkerTrait::Equatable));
        set.remove(MarkerTrait::Equatable);
        assert!(set.is_empty());
    }
}
