use super::*;
use crate::def::Variance;
use crate::error::RelationIssueKind;
use crate::fixture::{Fixture, Zoo};

fn visited(ids: &[DeclId]) -> FxHashSet<DeclId> {
    ids.iter().copied().collect()
}

#[test]
fn test_resolve_simple_alias() {
    let zoo = Zoo::new();
    let pets = ProducedType::union_unchecked(vec![zoo.dog(), zoo.cat()]);
    let alias = zoo.fx.alias("Pets", Some(&pets));
    let mut engine = TypeEngine::new(&zoo.fx.graph);
    assert_eq!(engine.resolve_aliases(&zoo.fx.t(alias)), pets);
    assert_eq!(engine.resolve_aliases(&zoo.dog()), zoo.dog());
}

#[test]
fn test_resolve_generic_alias() {
    let zoo = Zoo::new();
    let list = zoo.fx.alias("List", None);
    let t = zoo.fx.parameters(list, &[("T", Variance::Covariant)])[0];
    zoo.fx.graph.set_extended_type(list, zoo.boxed(&zoo.fx.t(t)));
    let mut engine = TypeEngine::new(&zoo.fx.graph);
    let dogs = zoo.fx.apply(list, &[zoo.dog()]);
    assert_eq!(engine.resolve_aliases(&dogs), zoo.boxed(&zoo.dog()));
}

#[test]
fn test_resolve_chain_and_nested_arguments() {
    let zoo = Zoo::new();
    let pet = zoo.fx.alias("Pet", Some(&zoo.dog()));
    let companion = zoo.fx.alias("Companion", Some(&zoo.fx.t(pet)));
    let mut engine = TypeEngine::new(&zoo.fx.graph);
    assert_eq!(engine.resolve_aliases(&zoo.fx.t(companion)), zoo.dog());
    assert_eq!(
        engine.resolve_aliases(&zoo.boxed(&zoo.fx.t(companion))),
        zoo.boxed(&zoo.dog())
    );
}

#[test]
fn test_resolve_rebuilds_unions() {
    let zoo = Zoo::new();
    let pets = ProducedType::union_unchecked(vec![zoo.dog(), zoo.cat()]);
    let alias = zoo.fx.alias("Pets", Some(&pets));
    let mut engine = TypeEngine::new(&zoo.fx.graph);
    let maybe = ProducedType::union_unchecked(vec![zoo.fx.t(alias), zoo.fx.null()]);
    let resolved = engine.resolve_aliases(&maybe);
    assert_eq!(resolved.cases(), Some(&[zoo.dog(), zoo.cat(), zoo.fx.null()][..]));

    let everything = ProducedType::union_unchecked(vec![zoo.fx.t(alias), zoo.animal()]);
    assert_eq!(engine.resolve_aliases(&everything), zoo.animal());
}

#[test]
fn test_alias_without_definition_is_unknown() {
    let fx = Fixture::new();
    let broken = fx.alias("Broken", None);
    let mut engine = TypeEngine::new(&fx.graph);
    assert!(engine.resolve_aliases(&fx.t(broken)).is_unknown());
}

#[test]
fn test_resolve_keeps_markers() {
    let zoo = Zoo::new();
    let pet = zoo.fx.alias("Pet", Some(&zoo.dog()));
    let mut engine = TypeEngine::new(&zoo.fx.graph);
    let marked = zoo.fx.t(pet).with_underlying_type("native");
    let resolved = engine.resolve_aliases(&marked);
    assert_eq!(resolved, zoo.dog());
    assert_eq!(resolved.underlying_type(), Some("native"));
    assert!(engine.resolve_aliases(&zoo.fx.t(pet).as_raw()).is_raw());
}

#[test]
fn test_resolving_cyclic_alias_is_undecidable() {
    let fx = Fixture::new();
    let x = fx.alias("X", None);
    fx.graph.set_extended_type(x, fx.t(x));
    let mut engine = TypeEngine::new(&fx.graph);
    assert!(engine.resolve_aliases(&fx.t(x)).is_unknown());
    assert_eq!(engine.issues().len(), 1);
    assert_eq!(engine.issues()[0].kind, RelationIssueKind::Undecidable);
    assert!(engine.issues()[0].message.contains("canonicalization"));
}

// =============================================================================
// Definition cycles
// =============================================================================

#[test]
fn test_self_referential_alias() {
    let fx = Fixture::new();
    let x = fx.alias("X", None);
    fx.graph.set_extended_type(x, fx.t(x));
    assert_eq!(recursive_alias_definition(&fx.graph, &fx.t(x), &visited(&[x])), vec![x]);
}

#[test]
fn test_mutually_recursive_aliases() {
    let fx = Fixture::new();
    let a = fx.alias("A", None);
    let b = fx.alias("B", None);
    let dog = fx.class("Dog");
    fx.graph.set_extended_type(a, fx.t(b));
    fx.graph
        .set_extended_type(b, ProducedType::union_unchecked(vec![fx.t(a), fx.t(dog)]));
    let engine = TypeEngine::new(&fx.graph);
    let cycle = engine.is_recursive_type_alias_definition(&fx.t(b), &visited(&[a]));
    assert_eq!(cycle, vec![a, b]);
}

#[test]
fn test_alias_through_arguments() {
    let zoo = Zoo::new();
    let x = zoo.fx.alias("X", None);
    zoo.fx.graph.set_extended_type(x, zoo.boxed(&zoo.fx.t(x)));
    let cycle = recursive_alias_definition(&zoo.fx.graph, &zoo.boxed(&zoo.fx.t(x)), &visited(&[x]));
    assert_eq!(cycle, vec![x]);
}

#[test]
fn test_acyclic_alias() {
    let zoo = Zoo::new();
    let pet = zoo.fx.alias("Pet", Some(&zoo.dog()));
    let engine = TypeEngine::new(&zoo.fx.graph);
    assert!(
        engine
            .is_recursive_type_alias_definition(&zoo.dog(), &visited(&[pet]))
            .is_empty()
    );
}

#[test]
fn test_inheritance_cycle() {
    let fx = Fixture::new();
    let a = fx.class("A");
    let b = fx.subclass("B", &fx.t(a));
    fx.extend(a, &fx.t(b));
    let engine = TypeEngine::new(&fx.graph);
    let cycle = engine.is_recursive_raw_type_definition(&fx.t(b), &visited(&[a]));
    assert_eq!(cycle, vec![b, a]);
    let clean = fx.class("Clean");
    assert!(
        engine
            .is_recursive_raw_type_definition(&fx.object(), &visited(&[clean]))
            .is_empty()
    );
}

#[test]
fn test_inheritance_cycle_through_broken_edge() {
    let fx = Fixture::new();
    let a = fx.interface("A");
    let b = fx.interface("B");
    fx.satisfy(a, &fx.t(b));
    fx.satisfy(b, &fx.t(a));
    fx.graph.break_supertype(b, &fx.t(a));
    let cycle = recursive_raw_definition(&fx.graph, &fx.t(b), &visited(&[a]));
    assert_eq!(cycle, vec![a, b]);
}
