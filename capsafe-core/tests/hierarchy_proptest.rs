mod common;

use capsafe_core::Verifier;
use capsafe_model::{
    CompilationUnit, Field, MarkerSet, MarkerTrait, PrimitiveKind, Program, TypeDecl, TypeRef,
};
use proptest::prelude::*;

#[derive(Clone, Debug)]
struct Shape {
    superclass: Option<usize>,
    enclosing: Option<(usize, bool)>,
    traits: u8,
    fields: Vec<(bool, u8)>,
}

fn shape(n: usize) -> impl Strategy<Value = Shape> {
    (
        proptest::option::of(0..n),
        proptest::option::of((0..n, any::<bool>())),
        0u8..64,
        proptest::collection::vec((any::<bool>(), 0u8..5), 0..4),
    )
        .prop_map(|(superclass, enclosing, traits, fields)| Shape {
            superclass,
            enclosing,
            traits,
            fields,
        })
}

fn hierarchy() -> impl Strategy<Value = Vec<Shape>> {
    (1usize..8).prop_flat_map(|n| proptest::collection::vec(shape(n), n))
}

fn name(i: usize) -> String {
    format!("gen.T{i}")
}

fn field_type(choice: u8, owner: usize, count: usize) -> TypeRef {
    match choice {
        0 => TypeRef::Primitive(PrimitiveKind::Int),
        1 => TypeRef::array_of(TypeRef::Primitive(PrimitiveKind::Byte)),
        2 => TypeRef::named("java.lang.String"),
        3 => TypeRef::named(name((owner + 1) % count)),
        _ => TypeRef::TypeVar("E".into()),
    }
}

fn build(shapes: &[Shape]) -> (Program, CompilationUnit) {
    let mut p = common::library();
    let mut unit = CompilationUnit::new("Gen.java");
    for (i, s) in shapes.iter().enumerate() {
        let mut decl = TypeDecl::class(name(i)).at(i * 100, 2);
        if let Some(sup) = s.superclass {
            decl = decl.extends(name(sup));
        }
        if let Some((outer, is_static)) = s.enclosing {
            decl = if is_static {
                decl.nested_in(name(outer))
            } else {
                decl.inner_of(name(outer))
            };
        }
        decl.traits = MarkerTrait::ALL
            .into_iter()
            .enumerate()
            .filter(|(bit, _)| s.traits & (1 << bit) != 0)
            .map(|(_, t)| t)
            .collect::<MarkerSet>();
        for (j, (is_final, choice)) in s.fields.iter().enumerate() {
            let mut f = Field::new(format!("f{j}"), field_type(*choice, i, shapes.len()))
                .at(i * 100 + 10 + j, 2);
            if *is_final {
                f = f.final_();
            }
            decl = decl.field(f);
        }
        p.add_type(decl).expect("unique generated names");
        unit = unit.declares(name(i));
    }
    (p, unit)
}

proptest! {
    #[test]
    fn arbitrary_hierarchies_terminate_deterministically(shapes in hierarchy()) {
        let (p, unit) = build(&shapes);
        let verifier = Verifier::default();
        let first = verifier.verify_unit(&p, &unit);
        let second = verifier.verify_unit(&p, &unit);
        prop_assert_eq!(first.messages(), second.messages());

        // Every field can be reported at most once per claim of every type
        // whose closure reaches it, plus one malformed-claim or
        // honorary problem per claim.
        let fields: usize = shapes.iter().map(|s| s.fields.len()).sum();
        let bound = shapes.len() * MarkerTrait::ALL.len() * (fields + 2);
        prop_assert!(first.len() <= bound);
    }

    #[test]
    fn final_primitive_fields_always_conform(shapes in hierarchy()) {
        let conforming: Vec<Shape> = shapes
            .into_iter()
            .map(|mut s| {
                s.fields = s.fields.iter().map(|_| (true, 0)).collect();
                s
            })
            .collect();
        let (p, unit) = build(&conforming);
        let out = Verifier::default().verify_unit(&p, &unit);
        prop_assert!(out.is_empty(), "{:?}", out.messages());
    }
}
