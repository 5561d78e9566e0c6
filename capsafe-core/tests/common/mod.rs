#![allow(dead_code)]

use capsafe_core::{Diagnostics, Verifier};
use capsafe_model::{CompilationUnit, MarkerTrait, Program, TypeDecl};

/// Library declarations most tests need: the string type, the token root and
/// the enumeration base.
pub fn library() -> Program {
    let mut p = Program::new();
    for decl in [
        TypeDecl::class("java.lang.Object").builtin(),
        TypeDecl::class("java.lang.String").extends("java.lang.Object").builtin(),
        TypeDecl::class("java.lang.Enum").extends("java.lang.Object").builtin(),
        TypeDecl::class("org.joe_e.Token")
            .extends("java.lang.Object")
            .declares(MarkerTrait::Immutable)
            .declares(MarkerTrait::Equatable)
            .builtin(),
    ] {
        p.add_type(decl).expect("library type");
    }
    p
}

pub fn program_with(decls: impl IntoIterator<Item = TypeDecl>) -> Program {
    let mut p = library();
    for d in decls {
        p.add_type(d).expect("add type");
    }
    p
}

/// Verify one declared type through the driver.
pub fn verify(program: &Program, type_name: &str) -> Diagnostics {
    let unit = CompilationUnit::new("Test.java").declares(type_name);
    Verifier::default().verify_unit(program, &unit)
}

pub fn check_unit(program: &Program, unit: &CompilationUnit) -> Diagnostics {
    Verifier::default().verify_unit(program, unit)
}
