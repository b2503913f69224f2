//! Property tests for the produced-type lattice.
//!
//! Types are drawn from a fixed hierarchy:
//!
//! ```text
//! Animal (abstract)     Pet (interface)
//!   Dog satisfies Pet
//!     Puppy
//!   Cat
//! Box<out T>  Sink<in T>  Cell<T>
//! alias Pets => Dog|Cat
//! alias Crate<out T> => Box<T>
//! Holder<out A, in B, C>
//! ```
//!
//! and built through the canonical union and intersection builders.

use lattice_solver::{
    AliasForm, DeclId, DeclKey, Declaration, DeclarationGraph, ProducedType, TypeArgumentMap,
    TypeEngine, Variance,
};
use proptest::prelude::*;
use std::sync::LazyLock;

const PROPTEST_CASES: u32 = 256;
const PACKAGE: &str = "props";

struct Universe {
    graph: DeclarationGraph,
    leaves: Vec<ProducedType>,
    boxed: DeclId,
    sink: DeclId,
    cell: DeclId,
    crate_alias: DeclId,
    holder_parameters: Vec<DeclId>,
}

static UNIVERSE: LazyLock<Universe> = LazyLock::new(Universe::new);

impl Universe {
    fn new() -> Self {
        let graph = DeclarationGraph::new();
        let object = graph.object_type();
        let declare = |name: &str, declaration: Declaration| {
            graph.declare(
                DeclKey::toplevel(PACKAGE, name),
                declaration.in_package(PACKAGE),
            )
        };
        let extend = |id: DeclId, extended: &ProducedType| {
            if let Some(declaration) = extended.declaration() {
                graph.set_extended_type_declaration(id, declaration);
            }
            graph.set_extended_type(id, extended.clone());
        };
        let parameters = |owner: DeclId, specs: &[(&str, Variance)]| {
            let anything = graph.builtins().anything;
            let ids: Vec<DeclId> = specs
                .iter()
                .map(|(name, variance)| {
                    let id = graph.declare(
                        DeclKey::member(owner, name),
                        Declaration::type_parameter(*name, owner, *variance, false)
                            .in_package(PACKAGE),
                    );
                    graph.set_extended_type_declaration(id, anything);
                    graph.set_extended_type(id, graph.anything_type());
                    id
                })
                .collect();
            graph.set_type_parameters(owner, ids.clone());
            ids
        };

        let animal = declare("Animal", Declaration::abstract_class("Animal"));
        extend(animal, &object);
        let pet = declare("Pet", Declaration::interface("Pet"));
        let dog = declare("Dog", Declaration::class("Dog"));
        extend(dog, &ProducedType::of(animal));
        graph.add_satisfied_type_declaration(dog, pet);
        graph.add_satisfied_type(dog, ProducedType::of(pet));
        let puppy = declare("Puppy", Declaration::class("Puppy"));
        extend(puppy, &ProducedType::of(dog));
        let cat = declare("Cat", Declaration::class("Cat"));
        extend(cat, &ProducedType::of(animal));

        let generic = |name: &str, variance: Variance| {
            let id = declare(name, Declaration::class(name));
            extend(id, &object);
            parameters(id, &[("T", variance)]);
            id
        };
        let boxed = generic("Box", Variance::Covariant);
        let sink = generic("Sink", Variance::Contravariant);
        let cell = generic("Cell", Variance::Invariant);

        let pets = declare("Pets", Declaration::alias("Pets", AliasForm::Type));
        graph.set_extended_type(
            pets,
            ProducedType::union_unchecked(vec![ProducedType::of(dog), ProducedType::of(cat)]),
        );
        let crate_alias = declare("Crate", Declaration::alias("Crate", AliasForm::Type));
        let t = parameters(crate_alias, &[("T", Variance::Covariant)])[0];
        graph.set_extended_type(crate_alias, ProducedType::applied(boxed, [ProducedType::of(t)]));

        let holder = declare("Holder", Declaration::class("Holder"));
        extend(holder, &object);
        let holder_parameters = parameters(
            holder,
            &[
                ("A", Variance::Covariant),
                ("B", Variance::Contravariant),
                ("C", Variance::Invariant),
            ],
        );

        let leaves = vec![
            ProducedType::of(animal),
            ProducedType::of(pet),
            ProducedType::of(dog),
            ProducedType::of(puppy),
            ProducedType::of(cat),
            ProducedType::of(pets),
            graph.object_type(),
            graph.null_type(),
            graph.anything_type(),
            ProducedType::nothing(),
        ];
        Universe {
            graph,
            leaves,
            boxed,
            sink,
            cell,
            crate_alias,
            holder_parameters,
        }
    }

    fn build(&self, engine: &mut TypeEngine<'_>, shape: &Shape) -> ProducedType {
        let apply = |engine: &mut TypeEngine<'_>, declaration: DeclId, inner: &Shape| {
            let argument = self.build(engine, inner);
            ProducedType::applied(declaration, [argument])
        };
        match shape {
            Shape::Leaf(index) => self.leaves[*index].clone(),
            Shape::Parameter(index) => ProducedType::of(self.holder_parameters[*index]),
            Shape::Boxed(inner) => apply(engine, self.boxed, inner),
            Shape::Sink(inner) => apply(engine, self.sink, inner),
            Shape::Cell(inner) => apply(engine, self.cell, inner),
            Shape::Crate(inner) => apply(engine, self.crate_alias, inner),
            Shape::Union(parts) => {
                let parts: Vec<_> = parts.iter().map(|part| self.build(engine, part)).collect();
                engine.union_of(parts)
            }
            Shape::Intersection(parts) => {
                let parts: Vec<_> = parts.iter().map(|part| self.build(engine, part)).collect();
                engine.intersection_of(parts)
            }
        }
    }

    fn identity_bindings(&self) -> TypeArgumentMap {
        self.holder_parameters
            .iter()
            .map(|&parameter| (parameter, ProducedType::of(parameter)))
            .collect()
    }
}

#[derive(Clone, Debug)]
enum Shape {
    Leaf(usize),
    Parameter(usize),
    Boxed(Box<Shape>),
    Sink(Box<Shape>),
    Cell(Box<Shape>),
    Crate(Box<Shape>),
    Union(Vec<Shape>),
    Intersection(Vec<Shape>),
}

fn shape_from(leaf: BoxedStrategy<Shape>) -> impl Strategy<Value = Shape> {
    leaf.prop_recursive(3, 16, 3, |inner| {
        prop_oneof![
            2 => inner.clone().prop_map(|s| Shape::Boxed(Box::new(s))),
            1 => inner.clone().prop_map(|s| Shape::Sink(Box::new(s))),
            1 => inner.clone().prop_map(|s| Shape::Cell(Box::new(s))),
            1 => inner.clone().prop_map(|s| Shape::Crate(Box::new(s))),
            2 => prop::collection::vec(inner.clone(), 2..=3).prop_map(Shape::Union),
            2 => prop::collection::vec(inner, 2..=3).prop_map(Shape::Intersection),
        ]
    })
}

fn shape() -> impl Strategy<Value = Shape> {
    let leaves = UNIVERSE.leaves.len();
    shape_from((0..leaves).prop_map(Shape::Leaf).boxed())
}

fn generic_shape() -> impl Strategy<Value = Shape> {
    let leaves = UNIVERSE.leaves.len();
    let parameters = UNIVERSE.holder_parameters.len();
    let leaf = prop_oneof![
        (0..leaves).prop_map(Shape::Leaf),
        (0..parameters).prop_map(Shape::Parameter),
    ];
    shape_from(leaf.boxed())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: PROPTEST_CASES,
        .. ProptestConfig::default()
    })]

    #[test]
    fn subtyping_is_reflexive(s in shape()) {
        let u = &*UNIVERSE;
        let mut engine = TypeEngine::new(&u.graph);
        let t = u.build(&mut engine, &s);
        prop_assert!(engine.is_subtype_of(&t, &t), "{:?}", t);
        prop_assert!(engine.is_exactly(&t, &t));
        prop_assert!(engine.issues().is_empty(), "{:?}", engine.issues());
    }

    #[test]
    fn nothing_is_bottom_and_anything_is_top(s in shape()) {
        let u = &*UNIVERSE;
        let mut engine = TypeEngine::new(&u.graph);
        let t = u.build(&mut engine, &s);
        prop_assert!(engine.is_subtype_of(&ProducedType::nothing(), &t));
        prop_assert!(engine.is_subtype_of(&t, &u.graph.anything_type()));
        prop_assert_eq!(engine.is_subtype_of(&t, &ProducedType::nothing()), t.is_nothing());
    }

    #[test]
    fn subtyping_is_transitive(a in shape(), b in shape(), c in shape()) {
        let u = &*UNIVERSE;
        let mut engine = TypeEngine::new(&u.graph);
        let a = u.build(&mut engine, &a);
        let b = u.build(&mut engine, &b);
        let c = u.build(&mut engine, &c);
        if engine.is_subtype_of(&a, &b) && engine.is_subtype_of(&b, &c) {
            prop_assert!(engine.is_subtype_of(&a, &c), "{:?} <: {:?} <: {:?}", a, b, c);
        }
    }

    #[test]
    fn exactly_implies_mutual_subtypes(a in shape(), b in shape()) {
        let u = &*UNIVERSE;
        let mut engine = TypeEngine::new(&u.graph);
        let a = u.build(&mut engine, &a);
        let b = u.build(&mut engine, &b);
        if engine.is_exactly(&a, &b) {
            prop_assert!(engine.is_subtype_of(&a, &b));
            prop_assert!(engine.is_subtype_of(&b, &a));
        }
    }

    #[test]
    fn union_is_least_upper_bound(a in shape(), b in shape(), x in shape()) {
        let u = &*UNIVERSE;
        let mut engine = TypeEngine::new(&u.graph);
        let a = u.build(&mut engine, &a);
        let b = u.build(&mut engine, &b);
        let x = u.build(&mut engine, &x);
        let union = engine.union_of([a.clone(), b.clone()]);
        prop_assert!(engine.is_subtype_of(&a, &union));
        prop_assert!(engine.is_subtype_of(&b, &union));
        let both = engine.is_subtype_of(&a, &x) && engine.is_subtype_of(&b, &x);
        prop_assert_eq!(engine.is_subtype_of(&union, &x), both);
    }

    #[test]
    fn intersection_is_greatest_lower_bound(a in shape(), b in shape(), x in shape()) {
        let u = &*UNIVERSE;
        let mut engine = TypeEngine::new(&u.graph);
        let a = u.build(&mut engine, &a);
        let b = u.build(&mut engine, &b);
        let x = u.build(&mut engine, &x);
        let meet = engine.intersection_of([a.clone(), b.clone()]);
        prop_assert!(engine.is_subtype_of(&meet, &a), "{:?}", meet);
        prop_assert!(engine.is_subtype_of(&meet, &b), "{:?}", meet);
        let both = engine.is_subtype_of(&x, &a) && engine.is_subtype_of(&x, &b);
        prop_assert_eq!(engine.is_subtype_of(&x, &meet), both);
    }

    #[test]
    fn union_builder_is_commutative(a in shape(), b in shape()) {
        let u = &*UNIVERSE;
        let mut engine = TypeEngine::new(&u.graph);
        let a = u.build(&mut engine, &a);
        let b = u.build(&mut engine, &b);
        let ab = engine.union_of([a.clone(), b.clone()]);
        let ba = engine.union_of([b, a]);
        prop_assert!(engine.is_exactly(&ab, &ba), "{:?} vs {:?}", ab, ba);
    }

    #[test]
    fn identity_substitution_is_exact(s in generic_shape()) {
        let u = &*UNIVERSE;
        let mut engine = TypeEngine::new(&u.graph);
        let t = u.build(&mut engine, &s);
        let identity = u.identity_bindings();
        let same = engine.substitute(&t, &identity);
        prop_assert!(engine.is_exactly(&same, &t), "{:?} vs {:?}", same, t);
        let unbound = engine.substitute(&t, &TypeArgumentMap::default());
        prop_assert!(engine.is_exactly(&unbound, &t));
    }

    #[test]
    fn substitution_reaches_every_parameter(s in generic_shape()) {
        let u = &*UNIVERSE;
        let mut engine = TypeEngine::new(&u.graph);
        let t = u.build(&mut engine, &s);
        let dog = u.leaves[2].clone();
        let bindings: TypeArgumentMap = u
            .holder_parameters
            .iter()
            .map(|&parameter| (parameter, dog.clone()))
            .collect();
        let ground = engine.substitute_internal(&t, &bindings);
        prop_assert!(!ground.contains_type_parameters(&u.graph));
        prop_assert!(u.holder_parameters.iter().all(|&p| !ground.contains_declaration(p)));
    }

    #[test]
    fn alias_resolution_is_idempotent(s in shape()) {
        let u = &*UNIVERSE;
        let mut engine = TypeEngine::new(&u.graph);
        let t = u.build(&mut engine, &s);
        let once = engine.resolve_aliases(&t);
        let twice = engine.resolve_aliases(&once);
        prop_assert_eq!(&once, &twice);
        prop_assert!(!once.contains_declaration(u.crate_alias));
    }
}
