use super::*;
use crate::fixture::Zoo;

/// `Animal` enumerated as `Dog|Cat`.
fn enumerated() -> Zoo {
    let zoo = Zoo::new();
    zoo.fx.cases(zoo.animal, &[zoo.dog(), zoo.cat()]);
    zoo
}

#[test]
fn test_union_of_cases() {
    let zoo = enumerated();
    let mut engine = TypeEngine::new(&zoo.fx.graph);
    assert_eq!(
        engine.union_of_cases(&zoo.fx.anything()),
        ProducedType::union_unchecked(vec![zoo.fx.object(), zoo.fx.null()])
    );
    assert_eq!(
        engine.union_of_cases(&zoo.animal()),
        ProducedType::union_unchecked(vec![zoo.dog(), zoo.cat()])
    );
    assert_eq!(engine.union_of_cases(&zoo.dog()), zoo.dog());
}

#[test]
fn test_union_of_cases_flattens_nested_enumerations() {
    let zoo = enumerated();
    let maybe = ProducedType::union_unchecked(vec![zoo.animal(), zoo.fx.null()]);
    let mut engine = TypeEngine::new(&zoo.fx.graph);
    let cases = engine.union_of_cases(&maybe);
    assert_eq!(cases.cases().map(<[_]>::len), Some(3));
}

#[test]
fn test_union_of_cases_distributes_intersection() {
    let zoo = enumerated();
    let pet = zoo.fx.interface("Pet");
    let mut engine = TypeEngine::new(&zoo.fx.graph);
    let pet_animal = ProducedType::intersection_unchecked(vec![zoo.animal(), zoo.fx.t(pet)]);
    let expected = ProducedType::union_unchecked(vec![
        ProducedType::intersection_unchecked(vec![zoo.dog(), zoo.fx.t(pet)]),
        ProducedType::intersection_unchecked(vec![zoo.cat(), zoo.fx.t(pet)]),
    ]);
    assert_eq!(engine.union_of_cases(&pet_animal), expected);
}

#[test]
fn test_covers_enumerated_type() {
    let zoo = enumerated();
    let mut engine = TypeEngine::new(&zoo.fx.graph);
    let pets = ProducedType::union_unchecked(vec![zoo.dog(), zoo.cat()]);
    assert!(engine.covers(&pets, &zoo.animal()));
    assert!(!engine.covers(&zoo.dog(), &zoo.animal()));
    assert!(!engine.is_subtype_of(&zoo.animal(), &pets));
}

#[test]
fn test_covers_anything() {
    let zoo = Zoo::new();
    let mut engine = TypeEngine::new(&zoo.fx.graph);
    let object_or_null = ProducedType::union_unchecked(vec![zoo.fx.object(), zoo.fx.null()]);
    assert!(engine.covers(&object_or_null, &zoo.fx.anything()));
    assert!(!engine.covers(&zoo.fx.object(), &zoo.fx.anything()));
}

#[test]
fn test_covers_shapes() {
    let zoo = enumerated();
    let pet = zoo.fx.interface("Pet");
    let mut engine = TypeEngine::new(&zoo.fx.graph);
    assert!(engine.covers(&zoo.dog(), &ProducedType::nothing()));
    assert!(!engine.covers(&zoo.dog(), &ProducedType::unknown()));
    let dog_pet = ProducedType::intersection_unchecked(vec![zoo.dog(), zoo.fx.t(pet)]);
    assert!(engine.covers(&zoo.dog(), &dog_pet));
    let mixed = ProducedType::union_unchecked(vec![zoo.animal(), zoo.fx.null()]);
    let all = ProducedType::union_unchecked(vec![zoo.dog(), zoo.cat(), zoo.fx.null()]);
    assert!(engine.covers(&all, &mixed));
    assert!(!engine.covers(&zoo.animal(), &mixed));
}

#[test]
fn test_minus() {
    let zoo = enumerated();
    let mut engine = TypeEngine::new(&zoo.fx.graph);
    assert_eq!(engine.minus(&zoo.animal(), &zoo.dog()), zoo.cat());
    assert!(engine.minus(&zoo.animal(), &zoo.animal()).is_nothing());
    assert_eq!(engine.minus(&zoo.fx.anything(), &zoo.fx.null()), zoo.fx.object());
    assert_eq!(engine.minus(&zoo.dog(), &zoo.cat()), zoo.dog());
}

#[test]
fn test_shallow_minus_keeps_enumerations() {
    let zoo = enumerated();
    let mut engine = TypeEngine::new(&zoo.fx.graph);
    let maybe = ProducedType::union_unchecked(vec![zoo.animal(), zoo.fx.null()]);
    assert_eq!(engine.shallow_minus(&maybe, &zoo.fx.null()), zoo.animal());
    assert_eq!(engine.shallow_minus(&zoo.animal(), &zoo.dog()), zoo.animal());
}

#[test]
fn test_eliminate_null() {
    let zoo = Zoo::new();
    let mut engine = TypeEngine::new(&zoo.fx.graph);
    let maybe = ProducedType::union_unchecked(vec![zoo.dog(), zoo.fx.null()]);
    assert_eq!(engine.eliminate_null(&maybe), zoo.dog());
    assert!(engine.eliminate_null(&zoo.fx.null()).is_nothing());
    assert_eq!(engine.eliminate_null(&zoo.dog()), zoo.dog());
}
