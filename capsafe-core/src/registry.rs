#![forbid(unsafe_code)]

//! Marker trait registry: honorary grants, policy names and the `honors`
//! relation between types and traits.

use std::collections::{BTreeMap, HashSet, VecDeque};

use capsafe_model::{MarkerSet, MarkerTrait, ProgramModel, TypeDecl, TypeKind, TypeRef};

use crate::error::Unresolved;
use crate::lattice;

pub const DEFAULT_IDENTITY_ROOT: &str = "org.joe_e.Token";
pub const DEFAULT_ENUM_BASE: &str = "java.lang.Enum";
pub const DEFAULT_RESERVED_NAMESPACE: &str = "org.joe_e";

const VALUE_TRAITS: MarkerSet = MarkerSet::of(&[
    MarkerTrait::Immutable,
    MarkerTrait::Powerless,
    MarkerTrait::Record,
    MarkerTrait::Data,
]);

/// Types trusted to satisfy traits without inspecting their fields.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HonoraryTable {
    entries: BTreeMap<String, MarkerSet>,
}

impl HonoraryTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Grants for the core library types.
    pub fn builtin() -> Self {
        let mut table = Self::empty();
        table.grant("java.lang.String", VALUE_TRAITS);
        table.grant("java.lang.Integer", VALUE_TRAITS);
        table.grant("java.lang.Character", VALUE_TRAITS);
        table.grant(DEFAULT_ENUM_BASE, MarkerSet::of(&[MarkerTrait::Equatable]));
        table
    }

    pub fn grant(&mut self, type_name: impl Into<String>, traits: MarkerSet) {
        let entry = self.entries.entry(type_name.into()).or_default();
        *entry = entry.union(traits);
    }

    pub fn get(&self, type_name: &str) -> MarkerSet {
        self.entries.get(type_name).copied().unwrap_or_default()
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.entries.contains_key(type_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, MarkerSet)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Designated names the rules are keyed on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Policy {
    /// Root of the capability-token hierarchy; identity comparison allowed.
    pub identity_root: String,
    /// Base type of all enumerations; identity comparison allowed.
    pub enum_base: String,
    /// Packages equal to or nested below this namespace are reserved.
    pub reserved_namespace: String,
    /// When set, every static field of every type must honor this trait.
    pub static_field_trait: Option<MarkerTrait>,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            identity_root: DEFAULT_IDENTITY_ROOT.to_string(),
            enum_base: DEFAULT_ENUM_BASE.to_string(),
            reserved_namespace: DEFAULT_RESERVED_NAMESPACE.to_string(),
            static_field_trait: None,
        }
    }
}

impl Policy {
    pub fn is_reserved_package(&self, package: &str) -> bool {
        let ns = self.reserved_namespace.as_str();
        !ns.is_empty()
            && package
                .strip_prefix(ns)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
    }
}

/// Read-only after construction; shared across worker threads.
#[derive(Clone, Debug)]
pub struct MarkerRegistry {
    honoraries: HonoraryTable,
    policy: Policy,
}

impl Default for MarkerRegistry {
    fn default() -> Self {
        Self::new(HonoraryTable::builtin(), Policy::default())
    }
}

impl MarkerRegistry {
    pub fn new(honoraries: HonoraryTable, policy: Policy) -> Self {
        Self { honoraries, policy }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn honoraries(&self) -> &HonoraryTable {
        &self.honoraries
    }

    /// Grants for `type_name`, closed under implication: an honorary
    /// Powerless type is also Immutable.
    pub fn honorary_traits(&self, type_name: &str) -> MarkerSet {
        lattice::with_implied(self.honoraries.get(type_name))
    }

    pub fn is_honorary(&self, type_name: &str, t: MarkerTrait) -> bool {
        self.honorary_traits(type_name).contains(t)
    }

    /// Names the registry knows about even when the model does not declare them.
    pub fn is_known(&self, type_name: &str) -> bool {
        self.honoraries.contains(type_name)
            || type_name == self.policy.identity_root
            || type_name == self.policy.enum_base
    }

    /// Traits `decl` declares itself or inherits from any supertype, closed
    /// under implication. Honorary grants are not included.
    pub fn declared_traits<M: ProgramModel + ?Sized>(&self, model: &M, decl: &TypeDecl) -> MarkerSet {
        let mut acc = MarkerSet::EMPTY;
        walk_supertypes(model, decl, |_, found| {
            if let Some(d) = found {
                acc = acc.union(d.traits);
            }
            false
        });
        lattice::with_implied(acc)
    }

    /// Whether a declaration honors `t`, explicitly, by inheritance, or by
    /// honorary grant on the type itself.
    pub fn type_honors<M: ProgramModel + ?Sized>(
        &self,
        model: &M,
        decl: &TypeDecl,
        t: MarkerTrait,
    ) -> bool {
        self.is_honorary(&decl.name, t) || self.declared_traits(model, decl).contains(t)
    }

    pub fn honors<M: ProgramModel + ?Sized>(
        &self,
        model: &M,
        ty: &TypeRef,
        t: MarkerTrait,
    ) -> Result<bool, Unresolved> {
        match ty {
            // Primitives compare by value and carry no authority.
            TypeRef::Primitive(_) => Ok(true),
            TypeRef::Null => Ok(true),
            TypeRef::Array(_) | TypeRef::TypeVar(_) => Ok(false),
            TypeRef::Named(name) => {
                if self.is_honorary(name, t) {
                    return Ok(true);
                }
                match model.lookup(name) {
                    Some(decl) => Ok(self.type_honors(model, decl, t)),
                    None if self.is_known(name) => Ok(false),
                    None => Err(Unresolved { name: name.clone() }),
                }
            }
        }
    }

    /// Whether the supertype closure of `name` contains any of `targets`.
    /// Intermediate supertypes missing from the model end their branch.
    pub fn reaches<M: ProgramModel + ?Sized>(
        &self,
        model: &M,
        name: &str,
        targets: &[&str],
    ) -> Result<bool, Unresolved> {
        if targets.contains(&name) {
            return Ok(true);
        }
        match model.lookup(name) {
            Some(decl) => Ok(self.decl_reaches(model, decl, targets)),
            None if self.is_known(name) => Ok(false),
            None => Err(Unresolved {
                name: name.to_string(),
            }),
        }
    }

    /// Enum declarations reach the enum base even when the model leaves their
    /// superclass implicit.
    pub fn decl_reaches<M: ProgramModel + ?Sized>(
        &self,
        model: &M,
        decl: &TypeDecl,
        targets: &[&str],
    ) -> bool {
        let wants_enum_base = targets.contains(&self.policy.enum_base.as_str());
        walk_supertypes(model, decl, |name, found| {
            targets.contains(&name)
                || (wants_enum_base && found.is_some_and(|d| d.kind == TypeKind::Enum))
        })
    }
}

/// Breadth-first walk over `start` and its transitive supertypes, visiting
/// each name once. Stops and returns true as soon as `visit` does.
pub(crate) fn walk_supertypes<'m, M: ProgramModel + ?Sized>(
    model: &'m M,
    start: &'m TypeDecl,
    mut visit: impl FnMut(&str, Option<&'m TypeDecl>) -> bool,
) -> bool {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<(&str, Option<&'m TypeDecl>)> = VecDeque::new();
    seen.insert(start.name.as_str());
    queue.push_back((start.name.as_str(), Some(start)));

    while let Some((name, decl)) = queue.pop_front() {
        if visit(name, decl) {
            return true;
        }
        let Some(decl) = decl else { continue };
        for sup in decl.supertypes() {
            if seen.insert(sup) {
                queue.push_back((sup, model.lookup(sup)));
            }
        }
    }
    false
}
