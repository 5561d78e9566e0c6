#![forbid(unsafe_code)]

use capsafe_model::{
    CompilationUnit, MarkerSet, MarkerTrait, Program, ProgramModel, TypeDecl, TypeKind, span,
};
use rayon::prelude::*;

use crate::closure::find_required_scopes;
use crate::diagnostics::Diagnostics;
use crate::error::Problem;
use crate::exprs::ExpressionChecker;
use crate::fields::{verify_fields, verify_static_fields};
use crate::lattice;
use crate::registry::MarkerRegistry;

/// Entry point: checks trait claims of declarations and the expression bans
/// of compilation units.
#[derive(Clone, Debug, Default)]
pub struct Verifier {
    registry: MarkerRegistry,
}

impl Verifier {
    pub fn new(registry: MarkerRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &MarkerRegistry {
        &self.registry
    }

    /// Claims `decl` must prove: declared or inherited, excluding traits it
    /// holds only honorarily, reduced to the strongest ones.
    pub fn claims<M: ProgramModel + ?Sized>(&self, model: &M, decl: &TypeDecl) -> MarkerSet {
        let mut claims = self.registry.declared_traits(model, decl);
        for t in self.registry.honorary_traits(&decl.name).iter() {
            claims.remove(t);
        }
        lattice::minimal_claims(claims)
    }

    pub fn verify_type<M: ProgramModel + ?Sized>(
        &self,
        model: &M,
        decl: &TypeDecl,
        out: &mut Diagnostics,
    ) {
        if decl.is_builtin {
            tracing::trace!(name = %decl.name, "builtin type trusted");
            return;
        }
        self.check_honorary_inheritance(model, decl, out);
        if let Some(t) = self.registry.policy().static_field_trait {
            verify_static_fields(model, &self.registry, decl, t, out);
        }
        if decl.kind.is_interface_like() {
            return;
        }
        let claims = self.claims(model, decl);
        tracing::debug!(name = %decl.name, claims = %claims, "verifying type");
        for t in claims.iter() {
            self.verify_trait(model, decl, t, out);
        }
    }

    /// Prove that `decl` satisfies `t`: no conflicting identity ancestry, and
    /// every field in its required scopes is final and honors `t`.
    pub fn verify_trait<M: ProgramModel + ?Sized>(
        &self,
        model: &M,
        decl: &TypeDecl,
        t: MarkerTrait,
        out: &mut Diagnostics,
    ) {
        if decl.kind.is_interface_like() {
            return;
        }
        let root = self.registry.policy().identity_root.as_str();
        if lattice::IDENTITY_CONFLICTS.contains(t)
            && self.registry.decl_reaches(model, decl, &[root])
        {
            out.push(Problem::malformed(
                format!(
                    "{t} type `{}` can't extend identity token `{root}`",
                    decl.simple_name()
                ),
                decl.name_span,
            ));
        }

        let required = find_required_scopes(model, &self.registry, decl, t);
        tracing::debug!(name = %decl.name, marker = %t, scopes = ?required.names(), "closure");
        for edge in &required.unresolved {
            out.push(Problem::model_access(
                format!(
                    "could not resolve {} `{}` of `{}` while checking {t} type `{}`",
                    edge.kind.display(),
                    edge.target,
                    edge.from,
                    decl.simple_name()
                ),
                decl.name_span,
            ));
        }
        verify_fields(model, &self.registry, &required.scopes, t, decl, out);
    }

    /// Honorary grants are not inherited: a subclass must honor every trait
    /// its superclass holds honorarily.
    fn check_honorary_inheritance<M: ProgramModel + ?Sized>(
        &self,
        model: &M,
        decl: &TypeDecl,
        out: &mut Diagnostics,
    ) {
        if decl.kind != TypeKind::Class {
            return;
        }
        let Some(sup) = decl.superclass.as_deref() else {
            return;
        };
        for t in self.registry.honoraries().get(sup).iter() {
            if !self.registry.type_honors(model, decl, t) {
                let simple = sup.rsplit('.').next().unwrap_or(sup);
                out.push(Problem::malformed(
                    format!("honorary trait {t} not inherited from `{simple}`"),
                    decl.name_span,
                ));
            }
        }
    }

    pub fn check_expressions<M: ProgramModel + ?Sized>(
        &self,
        model: &M,
        unit: &CompilationUnit,
        out: &mut Diagnostics,
    ) {
        ExpressionChecker::new(model, &self.registry, out).check_unit(unit);
    }

    /// Every declared type of the unit, then its expressions.
    pub fn verify_unit<M: ProgramModel + ?Sized>(
        &self,
        model: &M,
        unit: &CompilationUnit,
    ) -> Diagnostics {
        let mut out = Diagnostics::new();
        for name in &unit.types {
            match model.lookup(name) {
                Some(decl) => self.verify_type(model, decl, &mut out),
                None => out.push(Problem::model_access(
                    format!("could not resolve declared type `{name}`"),
                    span(0, 0),
                )),
            }
        }
        self.check_expressions(model, unit, &mut out);
        tracing::debug!(unit = %unit.name, problems = out.len(), "unit verified");
        out
    }

    /// Units are independent; results come back in input order.
    pub fn verify_units<M: ProgramModel + Sync + ?Sized>(
        &self,
        model: &M,
        units: &[CompilationUnit],
    ) -> Vec<Diagnostics> {
        units.par_iter().map(|unit| self.verify_unit(model, unit)).collect()
    }

    pub fn verify_program(&self, program: &Program) -> Vec<Diagnostics> {
        self.verify_units(program, program.units())
    }
}
