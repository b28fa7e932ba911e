use super::*;
use stubir_metadata::ClassFlavor;

fn class(arena: &mut DeclArena, name: &str, parent: Parent) -> DeclId {
    let name = arena.intern(name);
    arena.alloc(Declaration::new(
        name,
        Origin::ExternalStub,
        parent,
        DeclPayload::Class(ClassDecl::new(ClassFlavor::Class)),
    ))
}

#[test]
fn test_add_file_once() {
    let mut builder = ModuleBuilder::new("app");
    assert!(builder.add_file(ContainerId(0)));
    assert!(!builder.add_file(ContainerId(0)));
    assert!(builder.add_file(ContainerId(1)));
    assert_eq!(builder.files(), &[ContainerId(0), ContainerId(1)]);

    builder.truncate(ContainerId(1));
    assert_eq!(builder.files(), &[ContainerId(0)]);
    assert!(builder.add_file(ContainerId(1)));
}

#[test]
fn test_walk_visits_declarations_before_groups() {
    let mut arena = DeclArena::new();
    let pkg = arena.intern("app");
    let file_name = arena.intern("main.stub");
    let group_name = arena.intern("nested");
    let file = arena.alloc_container(ContainerKind::File, pkg, file_name, None);
    let group = arena.alloc_container(ContainerKind::Group, pkg, group_name, Some(file));

    let in_group = class(&mut arena, "Inner", Parent::Container(group));
    arena.attach(group, in_group);
    let outer = class(&mut arena, "Outer", Parent::Container(file));
    arena.attach(file, outer);
    let member = class(&mut arena, "Nested", Parent::Declaration(outer));
    if let Some(DeclPayload::Class(c)) = arena.get_mut(outer).map(|d| &mut d.payload) {
        c.members = Deferred::Ready(vec![member]);
    }

    let mut builder = ModuleBuilder::new("app");
    builder.add_file(file);
    let module = builder.bind(arena);

    let mut seen = Vec::new();
    module.walk(|id, depth| seen.push((module.arena().name(id).to_string(), depth)));
    assert_eq!(
        seen,
        [
            ("Outer".to_string(), 0),
            ("Nested".to_string(), 1),
            ("Inner".to_string(), 0),
        ]
    );

    assert_eq!(module.fq_name(member), "app.Outer.Nested");
    assert_eq!(module.fq_name(in_group), "app.Inner");
}

#[test]
fn test_fq_name_of_external_declaration() {
    let mut arena = DeclArena::new();
    let pkg = arena.intern("platform.posix");
    let stat = class(&mut arena, "stat", Parent::ExternalPackage(pkg));
    let module = ModuleBuilder::new("m").bind(arena);

    let (package, segments) = module.qualified_path(stat);
    assert_eq!(package, "platform.posix");
    assert_eq!(segments, ["stat"]);
    assert!(module.files().is_empty());

    let mut seen = Vec::new();
    module.walk(|id, depth| seen.push((id, depth)));
    assert_eq!(seen, [(stat, 0)]);
}
