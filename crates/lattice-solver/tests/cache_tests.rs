use super::*;
use crate::engine::TypeEngine;
use crate::fixture::Zoo;

#[test]
fn test_disabled_cache_ignores_inserts() {
    let zoo = Zoo::new();
    let cache = SupertypeCache::new();
    assert!(!cache.is_enabled());
    cache.insert((zoo.dog(), zoo.animal), Some(zoo.animal()));
    assert_eq!(cache.get(&(zoo.dog(), zoo.animal)), None);
    assert_eq!(cache.stats().entries, 0);
}

#[test]
fn test_hit_and_negative_entry() {
    let zoo = Zoo::new();
    let cache = SupertypeCache::new();
    cache.enable();
    cache.insert((zoo.dog(), zoo.animal), Some(zoo.animal()));
    cache.insert((zoo.dog(), zoo.cat), None);
    assert_eq!(cache.get(&(zoo.dog(), zoo.animal)), Some(Some(zoo.animal())));
    assert_eq!(cache.get(&(zoo.dog(), zoo.cat)), Some(None));
    assert_eq!(cache.get(&(zoo.cat(), zoo.animal)), None);
    let stats = cache.stats();
    assert_eq!(stats.entries, 2);
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.misses, 1);
}

#[test]
fn test_first_insert_wins() {
    let zoo = Zoo::new();
    let cache = SupertypeCache::new();
    cache.enable();
    cache.insert((zoo.dog(), zoo.animal), Some(zoo.animal()));
    cache.insert((zoo.dog(), zoo.animal), None);
    assert_eq!(cache.get(&(zoo.dog(), zoo.animal)), Some(Some(zoo.animal())));
}

#[test]
fn test_disable_drops_entries() {
    let zoo = Zoo::new();
    let cache = SupertypeCache::new();
    cache.enable();
    cache.insert((zoo.dog(), zoo.animal), Some(zoo.animal()));
    cache.disable();
    assert_eq!(cache.stats().entries, 0);
    cache.enable();
    assert_eq!(cache.get(&(zoo.dog(), zoo.animal)), None);
}

#[test]
fn test_engine_populates_cache() {
    let zoo = Zoo::new();
    let cache = SupertypeCache::new();
    cache.enable();
    let mut engine = TypeEngine::with_cache(&zoo.fx.graph, &cache);
    let boxed = zoo.boxed(&zoo.dog());
    assert_eq!(engine.get_supertype(&boxed, zoo.boxed), Some(boxed.clone()));
    assert!(cache.stats().entries >= 1);
    assert_eq!(engine.get_supertype(&boxed, zoo.boxed), Some(boxed.clone()));
    assert!(cache.stats().hits >= 1);
}

#[test]
fn test_marked_types_bypass_cache() {
    let zoo = Zoo::new();
    let cache = SupertypeCache::new();
    cache.enable();
    let mut engine = TypeEngine::with_cache(&zoo.fx.graph, &cache);
    let marked = zoo.dog().with_underlying_type("native");
    assert!(engine.get_supertype(&marked, zoo.animal).is_some());
    assert_eq!(cache.stats().entries, 0);
}
