mod common;

use capsafe_core::{
    Diagnostics, HonoraryTable, MarkerRegistry, Policy, ProblemKind, Verifier,
};
use capsafe_model::{
    CompilationUnit, Field, MarkerSet, MarkerTrait, PrimitiveKind, TypeDecl, TypeRef, span,
};

use common::{program_with, verify};

fn int() -> TypeRef {
    TypeRef::Primitive(PrimitiveKind::Int)
}

fn string() -> TypeRef {
    TypeRef::named("java.lang.String")
}

#[test]
fn conforming_closure_yields_no_problems() {
    let p = program_with([
        TypeDecl::class("app.Base").field(Field::new("id", int()).final_()),
        TypeDecl::class("app.Money")
            .declares(MarkerTrait::Powerless)
            .extends("app.Base")
            .field(Field::new("currency", string()).final_())
            .field(Field::new("cents", TypeRef::Primitive(PrimitiveKind::Long)).final_())
            .field(Field::new("ZERO", TypeRef::named("app.Money")).static_().final_()),
    ]);
    let out = verify(&p, "app.Money");
    assert!(out.is_empty(), "unexpected problems: {:?}", out.messages());
}

#[test]
fn one_non_final_field_gives_exactly_one_problem_for_any_claim() {
    for t in [
        MarkerTrait::Immutable,
        MarkerTrait::Powerless,
        MarkerTrait::Record,
        MarkerTrait::Data,
        MarkerTrait::Equatable,
        MarkerTrait::DeepFrozen,
    ] {
        let p = program_with([TypeDecl::class("app.Counter")
            .at(13, 7)
            .declares(t)
            .field(Field::new("count", int()).at(40, 5))]);
        let out = verify(&p, "app.Counter");
        assert_eq!(out.len(), 1, "{t}: {:?}", out.messages());
        let problem = &out.problems()[0];
        assert!(problem.message.contains("`count`"), "{}", problem.message);
        assert_eq!(problem.span, span(40, 5));
        assert_eq!(problem.kind, ProblemKind::RuleViolation);
    }
}

#[test]
fn mutable_array_field_in_immutable_class() {
    // The old BadDeepFrozen fixture: a non-final static and an array field.
    let p = program_with([TypeDecl::class("test.BadDeepFrozen")
        .at(100, 13)
        .declares(MarkerTrait::Immutable)
        .field(Field::new("foo", TypeRef::named("org.joe_e.Token")).at(120, 3).static_())
        .field(Field::new("qzar", string()).at(140, 4).final_())
        .field(Field::new("fooTok", TypeRef::named("org.joe_e.Token")).at(160, 6).final_())
        .field(Field::new("foop", TypeRef::array_of(int())).at(180, 4).final_())]);

    let out = verify(&p, "test.BadDeepFrozen");
    assert_eq!(
        out.messages(),
        vec![
            "non-final static field `foo` in Immutable type `BadDeepFrozen`",
            "field `foop` has non-Immutable type `int[]` in Immutable type `BadDeepFrozen`",
        ]
    );
}

#[test]
fn enum_constants_are_skipped_but_enum_state_is_checked() {
    let p = program_with([TypeDecl::enumeration("test.BadEnumeration")
        .declares(MarkerTrait::Powerless)
        .extends("java.lang.Enum")
        .field(Field::new("foo", TypeRef::named("test.BadEnumeration")).enum_constant())
        .field(Field::new("bar", TypeRef::named("test.BadEnumeration")).enum_constant())
        .field(Field::new("q", int()).final_())
        .field(Field::new("z", int()).at(77, 1))]);
    let out = verify(&p, "test.BadEnumeration");
    assert_eq!(
        out.messages(),
        vec!["non-final field `z` in Powerless type `BadEnumeration`"]
    );
}

#[test]
fn synthetic_fields_are_skipped() {
    let p = program_with([
        TypeDecl::class("app.Outer"),
        TypeDecl::class("app.Outer.Snapshot")
            .nested_in("app.Outer")
            .declares(MarkerTrait::Immutable)
            .field(Field::new("this$0", TypeRef::named("app.Outer")).at(12, 6).synthetic())
            .field(Field::new("size", int()).final_()),
    ]);
    let out = verify(&p, "app.Outer.Snapshot");
    assert!(out.is_empty(), "{:?}", out.messages());
}

#[test]
fn field_types_honor_traits_declared_on_super_interfaces() {
    let p = program_with([
        TypeDecl::interface("app.Shape").declares(MarkerTrait::Immutable),
        TypeDecl::class("app.Circle")
            .implements("app.Shape")
            .field(Field::new("radius", int()).final_()),
        TypeDecl::class("app.Blob"),
        TypeDecl::class("app.Drawing")
            .declares(MarkerTrait::Immutable)
            .field(Field::new("outline", TypeRef::named("app.Circle")).at(20, 7).final_()),
        TypeDecl::class("app.Sketch")
            .declares(MarkerTrait::Immutable)
            .field(Field::new("smudge", TypeRef::named("app.Blob")).at(40, 6).final_()),
    ]);
    let drawing = verify(&p, "app.Drawing");
    assert!(drawing.is_empty(), "{:?}", drawing.messages());

    let sketch = verify(&p, "app.Sketch");
    assert_eq!(
        sketch.messages(),
        vec!["field `smudge` has non-Immutable type `app.Blob` in Immutable type `Sketch`"]
    );
    assert_eq!(sketch.problems()[0].span, span(40, 6));
}

#[test]
fn equatable_claim_checks_fields_like_any_other() {
    let p = program_with([TypeDecl::class("app.Handle")
        .declares(MarkerTrait::Equatable)
        .field(Field::new("id", int()).final_())
        .field(Field::new("label", TypeRef::array_of(int())).at(30, 5).final_())]);
    let out = verify(&p, "app.Handle");
    assert_eq!(
        out.messages(),
        vec!["field `label` has non-Equatable type `int[]` in Equatable type `Handle`"]
    );
}

#[test]
fn enclosing_scope_fields_are_attributed_to_the_enclosing_type() {
    let p = program_with([
        TypeDecl::class("app.Outer").field(Field::new("log", TypeRef::array_of(string())).at(30, 3).final_()),
        TypeDecl::class("app.Outer.View")
            .at(90, 4)
            .inner_of("app.Outer")
            .declares(MarkerTrait::Immutable),
    ]);
    let out = verify(&p, "app.Outer.View");
    assert_eq!(
        out.messages(),
        vec!["field `log` from `Outer` has non-Immutable type `java.lang.String[]` in Immutable type `View`"]
    );
    assert_eq!(out.problems()[0].span, span(90, 4));
}

#[test]
fn static_nested_class_does_not_see_enclosing_state() {
    let p = program_with([
        TypeDecl::class("app.Outer").field(Field::new("n", int())),
        TypeDecl::class("app.Outer.Key")
            .nested_in("app.Outer")
            .declares(MarkerTrait::Immutable),
    ]);
    assert!(verify(&p, "app.Outer.Key").is_empty());
}

#[test]
fn trusted_enclosing_type_is_not_rechecked() {
    let p = program_with([
        TypeDecl::class("app.Outer")
            .declares(MarkerTrait::Immutable)
            .field(Field::new("n", int()).final_()),
        TypeDecl::class("app.Outer.Inner")
            .inner_of("app.Outer")
            .declares(MarkerTrait::Immutable),
    ]);
    assert!(verify(&p, "app.Outer.Inner").is_empty());
}

#[test]
fn interfaces_never_produce_field_problems() {
    let p = program_with([TypeDecl::interface("app.Config")
        .declares(MarkerTrait::Powerless)
        .field(Field::new("DEFAULTS", TypeRef::array_of(int())).static_().final_())
        .field(Field::new("weird", TypeRef::named("app.Nowhere")))]);
    assert!(verify(&p, "app.Config").is_empty());
}

#[test]
fn declaring_powerless_and_immutable_checks_once() {
    let p = program_with([TypeDecl::class("app.P")
        .declares(MarkerTrait::Immutable)
        .declares(MarkerTrait::Powerless)
        .field(Field::new("x", int()))]);
    let out = verify(&p, "app.P");
    assert_eq!(out.messages(), vec!["non-final field `x` in Powerless type `P`"]);
}

#[test]
fn independent_claims_each_report() {
    let p = program_with([TypeDecl::class("app.Both")
        .declares(MarkerTrait::Immutable)
        .declares(MarkerTrait::DeepFrozen)
        .field(Field::new("x", int()))]);
    let out = verify(&p, "app.Both");
    assert_eq!(
        out.messages(),
        vec![
            "non-final field `x` in Immutable type `Both`",
            "non-final field `x` in DeepFrozen type `Both`",
        ]
    );
}

#[test]
fn inherited_claim_obliges_subclass_fields() {
    let p = program_with([
        TypeDecl::class("app.Shape").declares(MarkerTrait::Immutable),
        TypeDecl::class("app.Square")
            .extends("app.Shape")
            .field(Field::new("side", int()).at(5, 4)),
    ]);
    let out = verify(&p, "app.Square");
    assert_eq!(out.messages(), vec!["non-final field `side` in Immutable type `Square`"]);
}

#[test]
fn powerless_type_cannot_extend_token() {
    let p = program_with([
        TypeDecl::class("app.Key").extends("org.joe_e.Token"),
        TypeDecl::class("app.Sneaky")
            .at(3, 6)
            .extends("app.Key")
            .declares(MarkerTrait::Powerless),
    ]);
    let out = verify(&p, "app.Sneaky");
    assert_eq!(out.len(), 1, "{:?}", out.messages());
    assert_eq!(out.problems()[0].kind, ProblemKind::MalformedClaim);
    assert_eq!(
        out.problems()[0].message,
        "Powerless type `Sneaky` can't extend identity token `org.joe_e.Token`"
    );
}

#[test]
fn immutable_token_subclass_is_fine() {
    let p = program_with([TypeDecl::class("app.Cap")
        .extends("org.joe_e.Token")
        .declares(MarkerTrait::Immutable)]);
    assert!(verify(&p, "app.Cap").is_empty());
}

#[test]
fn honorary_traits_must_be_restated_by_subclasses() {
    let mut honoraries = HonoraryTable::builtin();
    honoraries.grant("lib.Frozen", MarkerSet::of(&[MarkerTrait::Immutable]));
    let verifier = Verifier::new(MarkerRegistry::new(honoraries, Policy::default()));

    let p = program_with([
        TypeDecl::class("lib.Frozen").builtin(),
        TypeDecl::class("app.Thawed").at(8, 6).extends("lib.Frozen"),
        TypeDecl::class("app.StillFrozen")
            .extends("lib.Frozen")
            .declares(MarkerTrait::Immutable),
    ]);
    let thawed = verifier.verify_unit(&p, &CompilationUnit::new("T.java").declares("app.Thawed"));
    assert_eq!(thawed.messages(), vec!["honorary trait Immutable not inherited from `Frozen`"]);
    assert_eq!(thawed.problems()[0].span, span(8, 6));

    let ok = verifier.verify_unit(&p, &CompilationUnit::new("S.java").declares("app.StillFrozen"));
    assert!(ok.is_empty(), "{:?}", ok.messages());
}

#[test]
fn unresolved_field_type_is_a_model_access_problem() {
    let p = program_with([TypeDecl::class("app.Holder")
        .declares(MarkerTrait::Immutable)
        .field(Field::new("thing", TypeRef::named("vendor.Missing")).at(11, 5).final_())]);
    let out = verify(&p, "app.Holder");
    assert_eq!(out.len(), 1);
    assert_eq!(out.problems()[0].kind, ProblemKind::ModelAccess);
    assert!(out.problems()[0].message.contains("vendor.Missing"));
}

#[test]
fn unresolved_superclass_is_reported_at_the_candidate() {
    let p = program_with([TypeDecl::class("app.Orphan")
        .at(60, 6)
        .extends("vendor.Base")
        .declares(MarkerTrait::Immutable)]);
    let out = verify(&p, "app.Orphan");
    assert_eq!(
        out.messages(),
        vec!["could not resolve superclass `vendor.Base` of `app.Orphan` while checking Immutable type `Orphan`"]
    );
    assert_eq!(out.problems()[0].span, span(60, 6));
}

#[test]
fn undeclared_unit_type_is_reported() {
    let p = program_with([]);
    let out = verify(&p, "app.Ghost");
    assert_eq!(out.messages(), vec!["could not resolve declared type `app.Ghost`"]);
}

#[test]
fn shared_ancestor_is_reported_once_per_claim() {
    let p = program_with([
        TypeDecl::class("app.Base").field(Field::new("x", int())),
        TypeDecl::class("app.Left").extends("app.Base").declares(MarkerTrait::Immutable),
        TypeDecl::class("app.Right").extends("app.Base").declares(MarkerTrait::Immutable),
    ]);
    let unit = CompilationUnit::new("LR.java").declares("app.Left").declares("app.Right");
    let out = common::check_unit(&p, &unit);
    assert_eq!(
        out.messages(),
        vec![
            "non-final field `x` from `Base` in Immutable type `Left`",
            "non-final field `x` from `Base` in Immutable type `Right`",
        ]
    );
}

#[test]
fn static_field_policy_applies_to_unclaimed_types() {
    let policy = Policy {
        static_field_trait: Some(MarkerTrait::Powerless),
        ..Policy::default()
    };
    let verifier = Verifier::new(MarkerRegistry::new(HonoraryTable::builtin(), policy));
    let p = program_with([TypeDecl::class("app.Globals")
        .field(Field::new("cache", TypeRef::array_of(string())).static_().final_())
        .field(Field::new("hits", int()).static_())
        .field(Field::new("name", string()))]);
    let out: Diagnostics =
        verifier.verify_unit(&p, &CompilationUnit::new("G.java").declares("app.Globals"));
    assert_eq!(
        out.messages(),
        vec![
            "static field `cache` has non-Powerless type `java.lang.String[]` in `Globals` (required by static_field_trait Powerless)",
            "non-final static field `hits` in `Globals` (required by static_field_trait Powerless)",
        ]
    );
}

#[test]
fn builtin_types_are_trusted() {
    let p = program_with([TypeDecl::class("lib.Opaque")
        .builtin()
        .declares(MarkerTrait::Immutable)
        .field(Field::new("buf", TypeRef::array_of(int())))]);
    assert!(verify(&p, "lib.Opaque").is_empty());
}
