#![forbid(unsafe_code)]

//! Expression- and declaration-level bans: reference equality on values
//! without meaningful identity, native methods, reserved packages.

use capsafe_model::{CompilationUnit, EqOp, Node, NodeKind, ProgramModel, TypeRef};

use crate::diagnostics::Diagnostics;
use crate::error::{Problem, Unresolved};
use crate::registry::MarkerRegistry;

pub struct ExpressionChecker<'a, M: ProgramModel + ?Sized> {
    model: &'a M,
    registry: &'a MarkerRegistry,
    out: &'a mut Diagnostics,
}

impl<'a, M: ProgramModel + ?Sized> ExpressionChecker<'a, M> {
    pub fn new(model: &'a M, registry: &'a MarkerRegistry, out: &'a mut Diagnostics) -> Self {
        Self {
            model,
            registry,
            out,
        }
    }

    pub fn check_unit(&mut self, unit: &CompilationUnit) {
        self.check_packages(unit);
        for node in &unit.body {
            self.visit(node);
        }
    }

    fn check_packages(&mut self, unit: &CompilationUnit) {
        let policy = self.registry.policy();
        for (i, pkg) in unit.packages.iter().enumerate() {
            if i > 0 {
                self.out
                    .push(Problem::rule("more than one package declaration", pkg.span));
            }
            if policy.is_reserved_package(&pkg.node) {
                self.out.push(Problem::rule(
                    format!(
                        "package `{}` is inside the reserved namespace `{}`",
                        pkg.node, policy.reserved_namespace
                    ),
                    pkg.span,
                ));
            }
        }
    }

    /// Pre-order walk; every node is visited even after a finding.
    fn visit(&mut self, node: &Node) {
        match &node.kind {
            NodeKind::Equality { op, lhs, rhs } => self.check_equality(node, *op, lhs, rhs),
            NodeKind::Method {
                name, is_native, ..
            } => {
                if *is_native {
                    self.out
                        .push(Problem::rule(format!("native method `{}`", name.node), node.span));
                }
            }
            NodeKind::Other { .. } => {}
        }
        for child in node.children() {
            self.visit(child);
        }
    }

    fn check_equality(&mut self, node: &Node, op: EqOp, lhs: &Node, rhs: &Node) {
        let Some(left) = &lhs.ty else {
            self.unresolved_operand("left", op, lhs);
            return;
        };
        match left {
            TypeRef::Primitive(_) | TypeRef::Null => return,
            TypeRef::Array(_) => {
                self.out.push(Problem::rule(
                    format!("comparing arrays by reference (`{}`)", op.symbol()),
                    node.span,
                ));
                return;
            }
            TypeRef::TypeVar(_) => {
                self.out.push(Problem::rule(
                    format!("comparing generic-typed values by reference (`{}`)", op.symbol()),
                    node.span,
                ));
                return;
            }
            TypeRef::Named(_) => {}
        }

        let Some(right) = &rhs.ty else {
            self.unresolved_operand("right", op, rhs);
            return;
        };
        if right.is_primitive_or_null() {
            return;
        }

        for ty in [left, right] {
            match self.identity_safe(ty) {
                Ok(true) => return,
                Ok(false) => {}
                Err(unresolved) => {
                    self.out.push(Problem::model_access(
                        format!("could not resolve type `{}` in `{}` comparison", unresolved.name, op.symbol()),
                        node.span,
                    ));
                    return;
                }
            }
        }
        self.out.push(Problem::rule(
            format!(
                "reference equality used on a non-identity-safe type (`{left}` {} `{right}`)",
                op.symbol()
            ),
            node.span,
        ));
    }

    /// Identity comparison is meaningful only for the token hierarchy and
    /// enumerations.
    fn identity_safe(&self, ty: &TypeRef) -> Result<bool, Unresolved> {
        match ty {
            TypeRef::Named(name) => {
                let policy = self.registry.policy();
                self.registry.reaches(
                    self.model,
                    name,
                    &[policy.identity_root.as_str(), policy.enum_base.as_str()],
                )
            }
            _ => Ok(false),
        }
    }

    fn unresolved_operand(&mut self, side: &str, op: EqOp, operand: &Node) {
        self.out.push(Problem::model_access(
            format!("could not resolve type of {side} operand of `{}`", op.symbol()),
            operand.span,
        ));
    }
}
