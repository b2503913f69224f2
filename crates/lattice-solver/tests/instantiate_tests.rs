use super::*;
use crate::def::{DeclId, Variance};
use crate::fixture::Zoo;

fn parameter(zoo: &Zoo) -> DeclId {
    zoo.fx.graph.type_parameters(zoo.boxed)[0]
}

fn bind(parameter: DeclId, argument: ProducedType) -> TypeArgumentMap {
    let mut bindings = TypeArgumentMap::default();
    bindings.insert(parameter, argument);
    bindings
}

#[test]
fn test_substitute_argument() {
    let zoo = Zoo::new();
    let t = parameter(&zoo);
    let mut engine = TypeEngine::new(&zoo.fx.graph);
    let open = zoo.boxed(&zoo.fx.t(t));
    let closed = engine.substitute(&open, &bind(t, zoo.dog()));
    assert_eq!(closed, zoo.boxed(&zoo.dog()));
    assert_eq!(engine.substitute(&zoo.fx.t(t), &bind(t, zoo.cat())), zoo.cat());
}

#[test]
fn test_unbound_parameter_kept() {
    let zoo = Zoo::new();
    let t = parameter(&zoo);
    let other = zoo.fx.parameter(zoo.animal, "U", Variance::Invariant, false);
    let mut engine = TypeEngine::new(&zoo.fx.graph);
    let open = zoo.fx.t(other);
    assert_eq!(engine.substitute(&open, &bind(t, zoo.dog())), open);
}

#[test]
fn test_substitute_canonicalizes_unions() {
    let zoo = Zoo::new();
    let t = parameter(&zoo);
    let mut engine = TypeEngine::new(&zoo.fx.graph);
    let open = ProducedType::union_unchecked(vec![zoo.fx.t(t), zoo.dog()]);
    let bindings = bind(t, zoo.animal());

    assert_eq!(engine.substitute(&open, &bindings), zoo.animal());

    let raw = engine.substitute_internal(&open, &bindings);
    assert_eq!(raw.cases(), Some(&[zoo.animal(), zoo.dog()][..]));
}

#[test]
fn test_substitute_inside_arguments_simplifies() {
    let zoo = Zoo::new();
    let t = parameter(&zoo);
    let mut engine = TypeEngine::new(&zoo.fx.graph);
    let open = zoo.boxed(&ProducedType::union_unchecked(vec![zoo.fx.t(t), zoo.cat()]));
    let closed = engine.substitute(&open, &bind(t, zoo.cat()));
    assert_eq!(closed, zoo.boxed(&zoo.cat()));
}

#[test]
fn test_substitute_clears_raw_keeps_marker() {
    let zoo = Zoo::new();
    let t = parameter(&zoo);
    let mut engine = TypeEngine::new(&zoo.fx.graph);
    let open = zoo
        .boxed(&zoo.fx.t(t))
        .with_underlying_type("java.util.Box")
        .as_raw();
    let closed = engine.substitute(&open, &bind(t, zoo.dog()));
    assert!(!closed.is_raw());
    assert_eq!(closed.underlying_type(), Some("java.util.Box"));
}

#[test]
fn test_empty_bindings_are_identity() {
    let zoo = Zoo::new();
    let engine = TypeEngine::new(&zoo.fx.graph);
    let t = zoo.boxed(&zoo.dog()).as_raw();
    let same = engine.substitute_internal(&t, &TypeArgumentMap::default());
    assert!(same.is_raw());
    assert_eq!(same, t);
}

// =============================================================================
// Projection
// =============================================================================

#[test]
fn test_extended_type_seen_from_instantiation() {
    let zoo = Zoo::new();
    let crate_ = zoo.fx.class("Crate");
    let u = zoo.fx.parameters(crate_, &[("U", Variance::Covariant)])[0];
    zoo.fx.extend(crate_, &zoo.boxed(&zoo.fx.t(u)));
    let mut engine = TypeEngine::new(&zoo.fx.graph);
    let crate_of_dog = zoo.fx.apply(crate_, &[zoo.dog()]);
    assert_eq!(
        engine.extended_type(&crate_of_dog),
        Ok(Some(zoo.boxed(&zoo.dog())))
    );
    assert_eq!(engine.extended_type(&zoo.dog()), Ok(Some(zoo.animal())));
    assert_eq!(engine.extended_type(&ProducedType::nothing()), Ok(None));
}

#[test]
fn test_satisfied_types_of_intersection_are_members() {
    let zoo = Zoo::new();
    let pet = zoo.fx.interface("Pet");
    zoo.fx.satisfy(zoo.dog, &zoo.fx.t(pet));
    let mut engine = TypeEngine::new(&zoo.fx.graph);
    let both = ProducedType::intersection_unchecked(vec![zoo.cat(), zoo.fx.t(pet)]);
    assert_eq!(
        engine.satisfied_types(&both),
        Ok(vec![zoo.cat(), zoo.fx.t(pet)])
    );
    assert_eq!(engine.satisfied_types(&zoo.dog()), Ok(vec![zoo.fx.t(pet)]));
}

#[test]
fn test_case_types_substituted() {
    let zoo = Zoo::new();
    let fx = &zoo.fx;
    let option = fx.abstract_class("Option");
    let t = fx.parameters(option, &[("T", Variance::Covariant)])[0];
    let some = fx.class("Some");
    let st = fx.parameters(some, &[("T", Variance::Covariant)])[0];
    fx.extend(some, &fx.apply(option, &[fx.t(st)]));
    fx.cases(option, &[fx.apply(some, &[fx.t(t)]), fx.null()]);

    let mut engine = TypeEngine::new(&fx.graph);
    let cases = engine.case_types(&fx.apply(option, &[zoo.dog()]));
    assert_eq!(cases, Ok(Some(vec![fx.apply(some, &[zoo.dog()]), fx.null()])));
    assert_eq!(engine.case_types(&zoo.dog()), Ok(None));
}

#[test]
fn test_typed_member_type() {
    let zoo = Zoo::new();
    let t = parameter(&zoo);
    let item = zoo.fx.value(zoo.boxed, "item", &zoo.fx.t(t));
    let kennel = zoo.fx.subclass("Kennel", &zoo.boxed(&zoo.dog()));
    let mut engine = TypeEngine::new(&zoo.fx.graph);
    assert_eq!(
        engine.typed_member_type(&zoo.fx.t(kennel), item),
        Some(zoo.dog())
    );
    assert_eq!(engine.typed_member_type(&zoo.cat(), item), None);
}
