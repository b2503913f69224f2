use super::*;

fn registry(sources: &[ModuleSource]) -> ModuleRegistry {
    ModuleRegistry::new(sources).expect("modules are distinct")
}

#[test]
fn test_in_hierarchy() {
    assert!(in_hierarchy("zoo", "zoo"));
    assert!(in_hierarchy("zoo", "zoo.pets"));
    assert!(!in_hierarchy("zoo", "zookeeper"));
    assert!(!in_hierarchy("zoo.pets", "zoo"));
}

#[test]
fn test_duplicate_module_is_rejected() {
    let result = ModuleRegistry::new(&[ModuleSource::new("zoo"), ModuleSource::new("zoo")]);
    assert!(matches!(result, Err(ProjectError::DuplicateModule(name)) if name == "zoo"));
}

#[test]
fn test_admit_picks_longest_owning_module() {
    let mut registry = registry(&[ModuleSource::new("zoo"), ModuleSource::new("zoo.pets")]);
    let pets = registry
        .admit(UnitId(0), "dog.lat", "zoo.pets.dogs", None)
        .expect("admitted");
    let zoo = registry
        .admit(UnitId(1), "gate.lat", "zoo.gate", None)
        .expect("admitted");
    assert_eq!(registry.get(pets).map(|m| m.name.as_str()), Some("zoo.pets"));
    assert_eq!(registry.get(zoo).map(|m| m.name.as_str()), Some("zoo"));
    assert_eq!(registry.module_of_package("zoo.pets.dogs"), Some(pets));
}

#[test]
fn test_unclaimed_package_goes_to_default_module() {
    let mut registry = registry(&[ModuleSource::new("zoo")]);
    let id = registry
        .admit(UnitId(0), "farm.lat", "farm", None)
        .expect("admitted");
    let module = registry.get(id).expect("module exists");
    assert_eq!(module.name, DEFAULT_MODULE);
    assert_eq!(module.packages, vec!["farm".to_string()]);
    assert_eq!(module.units, vec![UnitId(0)]);
    assert_eq!(registry.len(), 2);
}

#[test]
fn test_explicit_module_must_exist() {
    let mut registry = registry(&[]);
    let result = registry.admit(UnitId(0), "a.lat", "zoo", Some("zoo"));
    assert!(matches!(result, Err(ProjectError::UnknownModule { .. })));
}

#[test]
fn test_explicit_module_must_own_package() {
    let mut registry = registry(&[ModuleSource::new("zoo")]);
    let result = registry.admit(UnitId(0), "a.lat", "farm", Some("zoo"));
    assert!(matches!(
        result,
        Err(ProjectError::PackageOutsideModule { package, .. }) if package == "farm"
    ));
}

#[test]
fn test_visible_packages_follow_imports() {
    let mut registry = registry(&[
        ModuleSource::new("zoo").import(ModuleImport::new("farm")),
        ModuleSource::new("farm"),
        ModuleSource::new("city"),
    ]);
    registry.admit(UnitId(0), "a.lat", "zoo", None).expect("admitted");
    registry.admit(UnitId(1), "b.lat", "zoo.pets", None).expect("admitted");
    registry.admit(UnitId(2), "c.lat", "farm", None).expect("admitted");
    registry.admit(UnitId(3), "d.lat", "city", None).expect("admitted");

    let visible = registry.visible_packages("zoo.pets");
    assert_eq!(visible[0], "zoo.pets");
    assert!(visible.contains(&"zoo".to_string()));
    assert!(visible.contains(&"farm".to_string()));
    assert!(!visible.contains(&"city".to_string()));
    assert_eq!(visible.last().map(String::as_str), Some(LANGUAGE_PACKAGE));

    // Imports are not transitive in the other direction.
    let from_farm = registry.visible_packages("farm");
    assert!(!from_farm.contains(&"zoo".to_string()));
}

#[test]
fn test_dependents_are_recorded_once() {
    let registry = registry(&[ModuleSource::new("zoo")]);
    let zoo = registry.by_name("zoo").map(|m| m.id).expect("zoo exists");
    registry.record_dependents(zoo, &[UnitId(1), UnitId(2)]);
    registry.record_dependents(zoo, &[UnitId(2), UnitId(3)]);
    assert_eq!(
        registry.dependents_of(zoo),
        vec![UnitId(1), UnitId(2), UnitId(3)]
    );
    assert!(registry.dependents_of(ModuleId(9)).is_empty());
}

#[test]
fn test_module_source_from_json() {
    let json = r#"{ "name": "zoo", "imports": [{ "name": "farm", "optional": true }, { "name": "city" }] }"#;
    let source: ModuleSource = serde_json::from_str(json).expect("valid module");
    assert_eq!(
        source.imports,
        vec![ModuleImport::optional("farm"), ModuleImport::new("city")]
    );
    assert_eq!(source.root, None);
}
