use super::*;
use stubir_ir::{
    ClassDecl, ContainerId, ContainerKind, DeclArena, DeclId, DeclPayload, Declaration, Deferred,
    FunctionDecl, ModuleBuilder, Origin, Parent, PropertyDecl,
};
use stubir_common::PrimitiveKind;
use stubir_metadata::{ClassFlavor, ForeignType, MetadataBuilder};
use stubir_provider::StubSession;

fn file(arena: &mut DeclArena, package: &str, name: &str) -> ContainerId {
    let package = arena.intern(package);
    let name = arena.intern(name);
    arena.alloc_container(ContainerKind::File, package, name, None)
}

fn group(arena: &mut DeclArena, parent: ContainerId, name: &str) -> ContainerId {
    let package = arena.container(parent).map(|c| c.package).unwrap();
    let name = arena.intern(name);
    arena.alloc_container(ContainerKind::Group, package, name, Some(parent))
}

fn declare(arena: &mut DeclArena, container: ContainerId, name: &str, payload: DeclPayload) -> DeclId {
    let name = arena.intern(name);
    let id = arena.alloc(Declaration::new(name, Origin::Source, Parent::Container(container), payload));
    assert!(arena.attach(container, id));
    id
}

fn property(arena: &mut DeclArena, container: ContainerId, name: &str) -> DeclId {
    declare(arena, container, name, DeclPayload::Property(PropertyDecl::default()))
}

fn class(arena: &mut DeclArena, container: ContainerId, name: &str) -> DeclId {
    declare(arena, container, name, DeclPayload::Class(ClassDecl::new(ClassFlavor::Class)))
}

#[test]
fn test_repeated_names_get_markers_in_order() {
    let mut arena = DeclArena::new();
    let main = file(&mut arena, "app", "main.stub");
    let first = property(&mut arena, main, "x");
    let second = property(&mut arena, main, "x");
    let third = property(&mut arena, main, "x");

    let names = NameAmbiguityResolver::default().resolve_container(&arena, main);
    assert_eq!(names.unique_name_for(&arena, first), "x");
    assert_eq!(names.unique_name_for(&arena, second), "x_");
    assert_eq!(names.unique_name_for(&arena, third), "x__");

    assert_eq!(names.len(), 2);
    assert_eq!(names.altered(first), None);
    let altered: Vec<_> = names.iter().collect();
    assert_eq!(altered, [(second, "x_"), (third, "x__")]);
}

#[test]
fn test_unique_names_are_not_recorded() {
    let mut arena = DeclArena::new();
    let main = file(&mut arena, "app", "main.stub");
    let a = property(&mut arena, main, "a");
    let b = property(&mut arena, main, "b");

    let names = NameAmbiguityResolver::default().resolve_container(&arena, main);
    assert!(names.is_empty());
    assert_eq!(names.unique_name_for(&arena, a), "a");
    assert_eq!(names.unique_name_for(&arena, b), "b");
}

#[test]
fn test_property_colliding_with_classifier_is_renamed() {
    let mut arena = DeclArena::new();
    let main = file(&mut arena, "app", "main.stub");
    let value = property(&mut arena, main, "Color");
    // Declared after the property, still seeded first.
    class(&mut arena, main, "Color");

    let names = NameAmbiguityResolver::default().resolve_container(&arena, main);
    assert_eq!(names.unique_name_for(&arena, value), "Color_");
}

#[test]
fn test_reserved_names_and_custom_marker() {
    let mut arena = DeclArena::new();
    let main = file(&mut arena, "app", "main.stub");
    let errno = property(&mut arena, main, "errno");
    let other = property(&mut arena, main, "errno");

    let resolver = NameAmbiguityResolver::new(NameResolverOptions {
        marker: '$',
        reserved: vec!["errno".to_string()],
    });
    let names = resolver.resolve_container(&arena, main);
    assert_eq!(names.unique_name_for(&arena, errno), "errno$");
    assert_eq!(names.unique_name_for(&arena, other), "errno$$");
}

#[test]
fn test_group_properties_keep_their_names() {
    let mut arena = DeclArena::new();
    let main = file(&mut arena, "app", "main.stub");
    let nested = group(&mut arena, main, "platform");
    let in_group = property(&mut arena, nested, "x");
    let also_in_group = property(&mut arena, nested, "x");
    let direct = property(&mut arena, main, "x");
    // Classifiers inside groups still occupy the file scope.
    class(&mut arena, nested, "Handle");
    let handle = property(&mut arena, main, "Handle");

    let names = NameAmbiguityResolver::default().resolve_container(&arena, main);
    assert_eq!(names.unique_name_for(&arena, direct), "x");
    assert_eq!(names.unique_name_for(&arena, in_group), "x");
    assert_eq!(names.unique_name_for(&arena, also_in_group), "x");
    assert_eq!(names.unique_name_for(&arena, handle), "Handle_");
    assert_eq!(names.len(), 1);
}

#[test]
fn test_class_members_and_functions_are_ignored() {
    let mut arena = DeclArena::new();
    let main = file(&mut arena, "app", "main.stub");
    let owner = class(&mut arena, main, "Holder");
    let name = arena.intern("x");
    let member = arena.alloc(Declaration::new(
        name,
        Origin::Source,
        Parent::Declaration(owner),
        DeclPayload::Property(PropertyDecl::default()),
    ));
    if let Some(DeclPayload::Class(c)) = arena.get_mut(owner).map(|d| &mut d.payload) {
        c.members = Deferred::Ready(vec![member]);
    }
    declare(&mut arena, main, "x", DeclPayload::Function(FunctionDecl::default()));
    let top = property(&mut arena, main, "x");

    let names = NameAmbiguityResolver::default().resolve_container(&arena, main);
    assert!(names.is_empty());
    assert_eq!(names.unique_name_for(&arena, top), "x");
    assert_eq!(names.unique_name_for(&arena, member), "x");
}

#[test]
fn test_module_scope_is_per_package() {
    let mut arena = DeclArena::new();
    let first = file(&mut arena, "app", "a.stub");
    let second = file(&mut arena, "app", "b.stub");
    let other = file(&mut arena, "lib", "c.stub");
    let a = property(&mut arena, first, "count");
    let b = property(&mut arena, second, "count");
    let c = property(&mut arena, other, "count");
    class(&mut arena, second, "limit");
    let limit = property(&mut arena, first, "limit");

    let mut builder = ModuleBuilder::new("app");
    builder.add_file(first);
    builder.add_file(second);
    builder.add_file(other);
    let module = builder.bind(arena);

    let names = NameAmbiguityResolver::default().resolve_module(&module);
    let arena = module.arena();
    assert_eq!(names.unique_name_for(arena, a), "count");
    assert_eq!(names.unique_name_for(arena, b), "count_");
    assert_eq!(names.unique_name_for(arena, c), "count");
    // Classifiers from every file of the package are seeded.
    assert_eq!(names.unique_name_for(arena, limit), "limit_");
}

#[test]
fn test_options_deserialize_with_defaults() {
    let options: NameResolverOptions = serde_json::from_str(r#"{"reserved":["main"]}"#).unwrap();
    assert_eq!(options.marker, '_');
    assert_eq!(options.reserved, ["main"]);

    let options: NameResolverOptions = serde_json::from_str(r#"{"marker":"$"}"#).unwrap();
    assert_eq!(options.marker, '$');
    assert!(options.reserved.is_empty());
}

#[test]
fn test_scope_declares_once() {
    let mut scope = TopLevelScope::new();
    scope.seed("Color");
    scope.seed("Color");
    assert_eq!(scope.len(), 1);
    assert!(!scope.declare_property("Color"));
    assert!(scope.declare_property("x"));
    assert!(!scope.declare_property("x"));
    assert!(scope.contains("x"));
}

#[test]
fn test_materialized_foreign_properties_are_disambiguated() {
    let mut builder = MetadataBuilder::new("libp");
    let first = builder.property("p", "x", ForeignType::Primitive(PrimitiveKind::I32), false);
    let second = builder.property("p", "x", ForeignType::Primitive(PrimitiveKind::I64), true);
    let color = builder
        .enum_class("p", "Color", PrimitiveKind::I32, &[("RED", 0)])
        .unwrap();
    let color_value = builder.property("p", "Color", ForeignType::Entity(color), false);
    let other = builder.property("q", "x", ForeignType::Primitive(PrimitiveKind::I32), false);
    let index = builder.finish();

    let mut session = StubSession::new("app", &index);
    let first = session.materialize(first).unwrap();
    let second = session.materialize(second).unwrap();
    session.materialize(color).unwrap();
    let color_value = session.materialize(color_value).unwrap();
    let other = session.materialize(other).unwrap();
    let module = session.finish();

    let names = NameAmbiguityResolver::default().resolve_module(&module);
    let arena = module.arena();
    assert_eq!(names.unique_name_for(arena, first), "x");
    assert_eq!(names.unique_name_for(arena, second), "x_");
    assert_eq!(names.unique_name_for(arena, color_value), "Color_");
    // Another package has its own scope.
    assert_eq!(names.unique_name_for(arena, other), "x");
    assert_eq!(names.len(), 2);
}

#[test]
fn test_foreign_properties_follow_source_files_of_their_package() {
    let mut builder = MetadataBuilder::new("libp");
    let counter = builder.property("p", "counter", ForeignType::Primitive(PrimitiveKind::U32), false);
    let handle = builder.class("p", "Handle", ClassFlavor::Class);
    let handle_value = builder.property("p", "Handle", ForeignType::Entity(handle), false);
    let index = builder.finish();

    let mut session = StubSession::new("app", &index);
    let foreign = session.materialize(counter).unwrap();
    session.materialize(handle).unwrap();
    let handle_value = session.materialize(handle_value).unwrap();
    let main = session.add_source_file("p", "main.stub");
    let local = session
        .add_source_declaration(
            Parent::Container(main),
            stubir_ir::DeclKind::Property,
            "counter",
            stubir_common::Visibility::Public,
        )
        .unwrap();
    let module = session.finish();

    let names = NameAmbiguityResolver::default().resolve_module(&module);
    let arena = module.arena();
    assert_eq!(names.unique_name_for(arena, local), "counter");
    assert_eq!(names.unique_name_for(arena, foreign), "counter_");
    // Classes outside any file are seeded as well.
    assert_eq!(names.unique_name_for(arena, handle_value), "Handle_");
}
