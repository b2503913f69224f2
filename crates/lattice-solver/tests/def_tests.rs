use super::*;
use crate::fixture::{Fixture, PACKAGE};

#[test]
fn test_builtins_registered() {
    let graph = DeclarationGraph::new();
    let builtins = graph.builtins();
    assert_eq!(graph.len(), 3);
    assert!(builtins.anything.is_valid());
    assert_eq!(
        graph.lookup_toplevel(LANGUAGE_PACKAGE, "Object"),
        Some(builtins.object)
    );
    assert_eq!(graph.extended_decl(builtins.null), Some(builtins.anything));
    assert_eq!(
        graph.case_types(builtins.anything),
        Some(vec![graph.object_type(), graph.null_type()])
    );
    assert!(graph.is_class(builtins.anything));
    assert!(!graph.is_type_parameter(builtins.object));
}

#[test]
fn test_declare_interns_by_key() {
    let graph = DeclarationGraph::new();
    let first = graph.declare(
        DeclKey::toplevel(PACKAGE, "Dog"),
        Declaration::class("Dog").in_package(PACKAGE),
    );
    let second = graph.declare(
        DeclKey::toplevel(PACKAGE, "Dog"),
        Declaration::interface("Dog").in_package(PACKAGE),
    );
    assert_eq!(first, second);
    assert_eq!(graph.kind(first), Some(DeclKind::Class { is_abstract: false }));
    assert_eq!(graph.len(), 4);
}

#[test]
fn test_overloads_get_distinct_ids() {
    let fx = Fixture::new();
    let owner = fx.class("Printer");
    let a = fx.function(owner, "print", 0, &[fx.object()]);
    let b = fx.function(owner, "print", 1, &[fx.null()]);
    assert_ne!(a, b);
    assert_eq!(fx.graph.direct_members_named(owner, "print"), vec![a, b]);
    assert!(fx.graph.direct_members_named(owner, "scan").is_empty());
}

#[test]
fn test_add_member_is_idempotent() {
    let fx = Fixture::new();
    let outer = fx.class("Outer");
    let inner = fx.member_class(outer, "Inner");
    fx.graph.add_member(outer, inner);
    assert_eq!(fx.graph.members(outer), vec![inner]);
}

#[test]
fn test_qualified_name_of_member() {
    let fx = Fixture::new();
    let outer = fx.class("Outer");
    let inner = fx.member_class(outer, "Inner");
    assert_eq!(fx.graph.qualified_name(outer), "test::Outer");
    assert_eq!(fx.graph.qualified_name(inner), "test::Outer.Inner");
    assert!(fx.graph.is_member(inner));
    assert!(fx.graph.is_toplevel(outer));
    assert_eq!(fx.graph.qualified_name(DeclId(9999)), "<unknown>");
}

#[test]
fn test_type_parameter_is_not_a_member_type() {
    let fx = Fixture::new();
    let boxed = fx.class("Box");
    let params = fx.parameters(boxed, &[("T", Variance::Covariant)]);
    let t = params[0];
    assert_eq!(fx.graph.container(t), Some(boxed));
    assert!(fx.graph.is_type_parameter(t));
    assert_eq!(fx.graph.variance(t), Variance::Covariant);
    assert_eq!(fx.graph.variance(boxed), Variance::Invariant);
    assert!(!fx.graph.is_defaulted(t));
}

#[test]
fn test_defaulted_parameter() {
    let fx = Fixture::new();
    let map = fx.class("Map");
    let k = fx.parameter(map, "K", Variance::Invariant, false);
    let v = fx.parameter(map, "V", Variance::Covariant, true);
    fx.graph.set_type_parameters(map, vec![k, v]);
    assert!(!fx.graph.is_defaulted(k));
    assert!(fx.graph.is_defaulted(v));
}

#[test]
fn test_inherits_through_satisfied() {
    let fx = Fixture::new();
    let comparable = fx.interface("Comparable");
    let number = fx.class("Number");
    fx.satisfy(number, &fx.t(comparable));
    let integer = fx.subclass("Integer", &fx.t(number));
    assert!(fx.graph.inherits(integer, comparable));
    assert!(fx.graph.inherits(integer, fx.graph.builtins().anything));
    assert!(!fx.graph.inherits(comparable, number));
}

#[test]
fn test_inherits_terminates_on_cycle() {
    let fx = Fixture::new();
    let a = fx.interface("A");
    let b = fx.interface("B");
    fx.satisfy(a, &fx.t(b));
    fx.satisfy(b, &fx.t(a));
    let unrelated = fx.class("C");
    assert!(fx.graph.inherits(a, b));
    assert!(!fx.graph.inherits(a, unrelated));
}

#[test]
fn test_break_supertype_moves_edge() {
    let fx = Fixture::new();
    let readable = fx.interface("Readable");
    let file = fx.class("File");
    fx.satisfy(file, &fx.t(readable));
    assert!(fx.graph.inherits(file, readable));

    fx.graph.break_supertype(file, &fx.t(readable));
    assert!(fx.graph.satisfied_types(file).is_empty());
    assert!(fx.graph.satisfied_decls(file).is_empty());
    assert_eq!(fx.graph.broken_supertypes(file), vec![fx.t(readable)]);
    assert!(!fx.graph.inherits(file, readable));
}

#[test]
fn test_break_supertype_ignores_unknown_edge() {
    let fx = Fixture::new();
    let file = fx.class("File");
    let other = fx.interface("Other");
    fx.graph.break_supertype(file, &fx.t(other));
    assert!(fx.graph.broken_supertypes(file).is_empty());
    assert_eq!(fx.graph.extended_type(file), Some(fx.object()));
}

#[test]
fn test_declarations_of_unit() {
    let graph = DeclarationGraph::new();
    let a = graph.declare(
        DeclKey::toplevel(PACKAGE, "A"),
        Declaration::class("A").with_origin("pkg/a.unit.json"),
    );
    let b = graph.declare(
        DeclKey::toplevel(PACKAGE, "B"),
        Declaration::class("B").with_origin("pkg/a.unit.json"),
    );
    graph.declare(
        DeclKey::toplevel(PACKAGE, "C"),
        Declaration::class("C").with_origin("pkg/c.unit.json"),
    );
    assert_eq!(graph.declarations_of("pkg/a.unit.json"), vec![a, b]);
    assert!(graph.declarations_of("missing").is_empty());
    assert_eq!(graph.ids().len(), 6);
}

#[test]
fn test_alias_kinds() {
    assert!(DeclKind::Alias(AliasForm::Class).is_class());
    assert!(DeclKind::Alias(AliasForm::Interface).is_interface());
    assert!(DeclKind::Alias(AliasForm::Type).is_alias());
    assert!(!DeclKind::Alias(AliasForm::Type).is_class_or_interface());
    assert!(!DeclKind::Function.is_class_or_interface());
}

#[test]
fn test_signature() {
    let fx = Fixture::new();
    let owner = fx.class("Owner");
    let name = fx.value(owner, "name", &fx.object());
    assert_eq!(
        fx.graph.with(name, |d| d.value_type.clone()).flatten(),
        Some(fx.object())
    );
    assert_eq!(fx.graph.kind(name), Some(DeclKind::Value));
}
