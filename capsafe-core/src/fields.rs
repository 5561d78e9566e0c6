#![forbid(unsafe_code)]

use capsafe_model::{Field, MarkerTrait, ProgramModel, Span, TypeDecl};

use crate::diagnostics::Diagnostics;
use crate::error::Problem;
use crate::registry::MarkerRegistry;

/// Check the own fields of every scope against claim `t` made by `candidate`.
///
/// Findings on the candidate's own fields anchor at the field name. Findings
/// on fields of other scopes anchor at the candidate and name the scope, so
/// every problem is attributed to the type that made the claim.
pub fn verify_fields<M: ProgramModel + ?Sized>(
    model: &M,
    registry: &MarkerRegistry,
    scopes: &[&TypeDecl],
    t: MarkerTrait,
    candidate: &TypeDecl,
    out: &mut Diagnostics,
) {
    if candidate.kind.is_interface_like() {
        return;
    }
    for scope in scopes {
        let own = scope.name == candidate.name;
        for field in &scope.fields {
            if field.is_enum_constant || field.is_synthetic {
                continue;
            }
            let site = FieldSite {
                field,
                scope,
                candidate,
                own,
                by_policy: false,
            };
            check_field(model, registry, &site, t, out);
        }
    }
}

/// Static-field policy applied to a single type regardless of its claims.
pub fn verify_static_fields<M: ProgramModel + ?Sized>(
    model: &M,
    registry: &MarkerRegistry,
    decl: &TypeDecl,
    t: MarkerTrait,
    out: &mut Diagnostics,
) {
    for field in decl.fields.iter().filter(|f| f.is_static && !f.is_enum_constant && !f.is_synthetic) {
        let site = FieldSite {
            field,
            scope: decl,
            candidate: decl,
            own: true,
            by_policy: true,
        };
        check_field(model, registry, &site, t, out);
    }
}

struct FieldSite<'a> {
    field: &'a Field,
    scope: &'a TypeDecl,
    candidate: &'a TypeDecl,
    own: bool,
    /// Checked because of the global static-field policy, not a claim.
    by_policy: bool,
}

impl FieldSite<'_> {
    fn anchor(&self) -> Span {
        if self.own {
            self.field.name.span
        } else {
            self.candidate.name_span
        }
    }

    /// "static field `x` from `Outer`"
    fn describe(&self) -> String {
        let kind = if self.field.is_static { "static field" } else { "field" };
        if self.own {
            format!("{kind} `{}`", self.field.name())
        } else {
            format!("{kind} `{}` from `{}`", self.field.name(), self.scope.simple_name())
        }
    }

    fn claim(&self, t: MarkerTrait) -> String {
        let name = self.candidate.simple_name();
        if self.by_policy {
            format!("in `{name}` (required by static_field_trait {t})")
        } else {
            format!("in {t} type `{name}`")
        }
    }
}

fn check_field<M: ProgramModel + ?Sized>(
    model: &M,
    registry: &MarkerRegistry,
    site: &FieldSite<'_>,
    t: MarkerTrait,
    out: &mut Diagnostics,
) {
    let field = site.field;
    if !field.is_final {
        out.push(Problem::rule(
            format!("non-final {} {}", site.describe(), site.claim(t)),
            site.anchor(),
        ));
        return;
    }
    match registry.honors(model, &field.ty, t) {
        Ok(true) => {}
        Ok(false) => out.push(Problem::rule(
            format!(
                "{} has non-{t} type `{}` {}",
                site.describe(),
                field.ty,
                site.claim(t)
            ),
            site.anchor(),
        )),
        Err(unresolved) => out.push(Problem::model_access(
            format!(
                "could not resolve type `{}` of {} {}",
                unresolved.name,
                site.describe(),
                site.claim(t)
            ),
            site.anchor(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capsafe_model::{Program, TypeRef, span};

    #[test]
    fn own_fields_anchor_at_the_field() {
        let decl = TypeDecl::class("a.Point")
            .at(100, 5)
            .declares(MarkerTrait::Immutable)
            .field(Field::new("x", "int".parse().unwrap()).at(120, 1))
            .field(Field::new("y", "int".parse().unwrap()).at(130, 1).final_());
        let p = Program::new().with_type(decl.clone()).unwrap();
        let mut out = Diagnostics::new();
        verify_fields(&p, &MarkerRegistry::default(), &[&decl], MarkerTrait::Immutable, &decl, &mut out);
        assert_eq!(out.messages(), vec!["non-final field `x` in Immutable type `Point`"]);
        assert_eq!(out.problems()[0].span, span(120, 1));
    }

    #[test]
    fn inherited_fields_anchor_at_the_candidate() {
        let base = TypeDecl::class("a.Base")
            .field(Field::new("items", TypeRef::array_of("int".parse().unwrap())).at(10, 5).final_());
        let leaf = TypeDecl::class("a.Leaf").at(200, 4).extends("a.Base");
        let p = Program::new()
            .with_type(base.clone())
            .and_then(|p| p.with_type(leaf.clone()))
            .unwrap();
        let mut out = Diagnostics::new();
        verify_fields(&p, &MarkerRegistry::default(), &[&leaf, &base], MarkerTrait::Powerless, &leaf, &mut out);
        assert_eq!(
            out.messages(),
            vec!["field `items` from `Base` has non-Powerless type `int[]` in Powerless type `Leaf`"]
        );
        assert_eq!(out.problems()[0].span, span(200, 4));
    }

    #[test]
    fn statics_must_be_final() {
        let decl = TypeDecl::class("a.Holder")
            .field(Field::new("count", "int".parse().unwrap()).static_())
            .field(Field::new("NAME", TypeRef::named("java.lang.String")).static_().final_());
        let p = Program::new().with_type(decl.clone()).unwrap();
        let mut out = Diagnostics::new();
        verify_static_fields(&p, &MarkerRegistry::default(), &decl, MarkerTrait::Powerless, &mut out);
        assert_eq!(
            out.messages(),
            vec!["non-final static field `count` in `Holder` (required by static_field_trait Powerless)"]
        );
    }
}
