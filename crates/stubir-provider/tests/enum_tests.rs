use super::*;
use stubir_common::{ConstValue, IntEncoding, PrimitiveKind};
use stubir_ir::{
    Body, CtorRef, DeclFlags, DeclId, DeclKind, Declaration, Expr, IrType, Origin, Parent,
    WellKnownClass,
};
use stubir_metadata::{
    Annotation, AnnotationArg, DescriptorOrigin, ENUM_ENTRY_VALUE, ENUM_VAR_TYPE_SIZE, EntityKind,
    ForeignDescriptor, ForeignRef, MetadataBuilder, MetadataIndex,
};

fn decl<'a>(session: &'a StubSession<'_>, id: DeclId) -> &'a Declaration {
    session.arena().get(id).expect("declaration exists")
}

fn color_index() -> (MetadataIndex, ForeignRef) {
    let mut builder = MetadataBuilder::new("libcolors");
    let color = builder
        .enum_class("colors", "Color", PrimitiveKind::I32, &[("A", 1), ("B", 2)])
        .expect("valid enum");
    (builder.finish(), color)
}

fn entry(name: &str) -> ForeignDescriptor {
    ForeignDescriptor::new(
        EntityKind::EnumEntry,
        name,
        "colors",
        DescriptorOrigin::Interop {
            library: "libcolors".into(),
        },
    )
}

fn entry_value(encoding: IntEncoding, value: AnnotationArg) -> Annotation {
    Annotation::new(format!("{ENUM_ENTRY_VALUE}.{}", encoding.tag())).with_arg("value", value)
}

#[test]
fn test_enum_is_complete() {
    let (index, color) = color_index();
    let mut session = StubSession::new("app", &index);

    let enum_id = session.materialize(color).expect("enum");
    let members = session.members_of(enum_id).expect("members");
    let kinds: Vec<DeclKind> = members.iter().map(|&m| decl(&session, m).kind()).collect();
    assert_eq!(
        kinds,
        [
            DeclKind::Constructor,
            DeclKind::Property,
            DeclKind::EnumEntry,
            DeclKind::EnumEntry,
            DeclKind::Function,
            DeclKind::Function,
            DeclKind::Class,
        ]
    );
    let [ctor, value, a, b, values, value_of, var] = members[..] else {
        panic!("unexpected member layout");
    };

    // Constructor: base call with the enum as type argument, then initializers.
    let ctor_decl = decl(&session, ctor);
    assert!(ctor_decl.flags.contains(DeclFlags::PRIMARY));
    let body = ctor_decl
        .as_constructor()
        .and_then(|c| c.body.as_ref())
        .expect("constructor body");
    assert_eq!(
        body.statements(),
        &[
            Expr::EnumConstructorCall {
                target: CtorRef::WellKnown(WellKnownClass::Enum),
                type_args: smallvec::smallvec![IrType::Class(enum_id)],
                args: Vec::new(),
            },
            Expr::InstanceInitializerCall { class: enum_id },
        ]
    );

    // Entries call the primary constructor with their decoded value.
    for (entry, raw) in [(a, 1), (b, 2)] {
        let initializer = decl(&session, entry)
            .as_enum_entry()
            .and_then(|e| e.initializer.clone())
            .expect("entry initializer");
        assert_eq!(
            initializer,
            Expr::EnumConstructorCall {
                target: CtorRef::Declared(ctor),
                type_args: smallvec::SmallVec::new(),
                args: vec![Expr::Const(ConstValue::I32(raw))],
            }
        );
    }
    assert_eq!(session.arena().name(a), "A");
    assert_eq!(session.arena().name(b), "B");

    // Storage field and getter.
    let property = decl(&session, value).as_property().expect("value property");
    let field = property.backing_field.expect("backing field");
    let field_decl = decl(&session, field);
    assert_eq!(field_decl.origin, Origin::PropertyBackingField);
    assert_eq!(field_decl.visibility, stubir_common::Visibility::Private);
    // Only the property stands for the foreign entity.
    assert_eq!(field_decl.foreign, None);
    assert_eq!(session.resolve(decl(&session, value).foreign.expect("foreign")).decl(), Some(value));
    assert_eq!(
        field_decl.as_field().and_then(|f| f.initializer.clone()),
        Some(Expr::GetValueParam { owner: ctor, index: 0 })
    );
    let accessors = property.accessors.get().copied().expect("accessors ready");
    assert!(accessors.setter.is_none());
    let getter = decl(&session, accessors.getter.expect("getter"));
    assert_eq!(getter.origin, Origin::SyntheticAccessor);
    let getter_fn = getter.as_function().expect("getter function");
    assert_eq!(getter_fn.corresponding_property, Some(value));
    assert_eq!(
        getter_fn.body,
        Some(Body::Expr(Expr::Return(Box::new(Expr::GetField {
            receiver: Box::new(Expr::GetThis { class: enum_id }),
            field,
        }))))
    );

    // Special members.
    assert_eq!(session.arena().name(values), "values");
    assert_eq!(session.arena().name(value_of), "valueOf");
    assert_eq!(decl(&session, values).origin, Origin::EnumSpecialMember);
    assert_eq!(
        session.signature_of(values).expect("values signature").return_type,
        IrType::Array(Box::new(IrType::Class(enum_id)))
    );

    // Exactly one wrapper type.
    assert_eq!(session.arena().name(var), "Var");
    assert_eq!(decl(&session, var).parent, Parent::Declaration(enum_id));
    assert_eq!(session.stats().enums_synthesized, 1);
    assert_eq!(session.stats().factory_invocations, 0);
}

#[test]
fn test_enum_var_wrapper() {
    let (index, color) = color_index();
    let mut session = StubSession::new("app", &index);

    let enum_id = session.materialize(color).expect("enum");
    let var = *session.members_of(enum_id).expect("members").last().expect("Var");
    let var_members = session.members_of(var).expect("Var members");
    let [ctor, companion, value] = var_members[..] else {
        panic!("unexpected Var layout");
    };

    assert_eq!(
        session.supertypes_of(var).expect("Var supertypes"),
        [IrType::WellKnown(WellKnownClass::EnumVar)]
    );
    let ctor_body = decl(&session, ctor)
        .as_constructor()
        .and_then(|c| c.body.clone())
        .expect("Var constructor body");
    assert_eq!(
        ctor_body.statements()[0],
        Expr::DelegatingConstructorCall {
            target: CtorRef::WellKnown(WellKnownClass::EnumVar),
            args: vec![Expr::GetValueParam { owner: ctor, index: 0 }],
        }
    );

    assert!(decl(&session, companion).flags.contains(DeclFlags::COMPANION));
    let companion_ctor = session.members_of(companion).expect("companion members")[0];
    let companion_body = decl(&session, companion_ctor)
        .as_constructor()
        .and_then(|c| c.body.clone())
        .expect("companion constructor body");
    assert_eq!(
        companion_body.statements(),
        &[
            Expr::DelegatingConstructorCall {
                target: CtorRef::WellKnown(WellKnownClass::PrimitiveVarType),
                args: vec![Expr::Const(ConstValue::I32(4))],
            },
            Expr::InstanceInitializerCall { class: companion },
        ]
    );

    assert!(decl(&session, value).flags.contains(DeclFlags::MUTABLE));
    assert_eq!(session.type_of(value).expect("value type"), IrType::Class(enum_id));
    let accessors = session.accessors_of(value).expect("accessors");
    let setter = accessors.setter.expect("setter");
    assert_eq!(
        decl(&session, setter).as_function().and_then(|f| f.corresponding_property),
        Some(value)
    );
    let signature = session.signature_of(setter).expect("setter signature");
    assert_eq!(signature.params[0].ty, IrType::Class(enum_id));
    assert!(accessors.getter.is_some());
}

#[test]
fn test_member_request_builds_whole_enum() {
    let (index, color) = color_index();
    let b = index.lookup("colors.Color.B").expect("entry");
    let companion = index.lookup("colors.Color.Var.Companion").expect("companion");
    let mut session = StubSession::new("app", &index);

    let b_id = session.materialize(b).expect("entry");
    let enum_id = session.resolve(color).decl().expect("enum bound");
    assert_eq!(session.resolve(color), Resolution::Bound(enum_id));
    assert_eq!(decl(&session, b_id).parent, Parent::Declaration(enum_id));
    assert!(session.resolve(companion).decl().is_some());
    assert_eq!(session.stats().enums_synthesized, 1);

    // Top-level enums live in their package file.
    let file = session.package_file("colors").expect("package file");
    assert_eq!(
        session.arena().container(file).map(|c| c.declarations.clone()),
        Some(vec![enum_id])
    );
    assert_eq!(decl(&session, enum_id).parent, Parent::Container(file));
}

#[test]
fn test_unsigned_enum_width() {
    let mut builder = MetadataBuilder::new("libflags");
    let flags = builder
        .enum_class("flags", "Mode", PrimitiveKind::U16, &[("MAX", 65535)])
        .expect("valid enum");
    let index = builder.finish();
    let mut session = StubSession::new("app", &index);

    let enum_id = session.materialize(flags).expect("enum");
    let members = session.members_of(enum_id).expect("members");
    let max = decl(&session, members[2])
        .as_enum_entry()
        .and_then(|e| e.initializer.clone())
        .expect("initializer");
    let Expr::EnumConstructorCall { args, .. } = max else {
        panic!("expected constructor call");
    };
    assert_eq!(args, [Expr::Const(ConstValue::U16(65535))]);

    let companion = index.lookup("flags.Mode.Var.Companion").expect("companion");
    let companion_id = session.resolve(companion).decl().expect("bound");
    let ctor = session.members_of(companion_id).expect("companion members")[0];
    let body = decl(&session, ctor)
        .as_constructor()
        .and_then(|c| c.body.clone())
        .expect("body");
    assert!(matches!(
        &body.statements()[0],
        Expr::DelegatingConstructorCall { args, .. } if args == &[Expr::Const(ConstValue::I32(2))]
    ));
}

#[test]
fn test_find_or_generate_enum_uses_given_parent() {
    let (index, color) = color_index();
    let mut session = StubSession::new("app", &index);
    let file = session.add_source_file("app", "colors.stub");

    let enum_id = session.find_or_generate_enum(color, file).expect("enum");
    assert_eq!(decl(&session, enum_id).parent, Parent::Container(file));
    assert!(session.package_file("colors").is_none());
    assert_eq!(session.files(), &[file]);
    assert_eq!(session.find_or_generate_enum(color, file).expect("cached"), enum_id);

    let ctor = index.lookup("colors.Color.A").expect("entry");
    assert!(matches!(
        session.find_or_generate_enum(ctor, file),
        Err(StubError::Misuse(CallerMisuse::NotAnEnum { .. }))
    ));
}

#[test]
fn test_top_level_enum_attachment_can_be_disabled() {
    let (index, color) = color_index();
    let options = ProviderOptions {
        attach_top_level_enums: false,
        ..ProviderOptions::default()
    };
    let mut session = StubSession::new("app", &index).with_options(options);

    let enum_id = session.materialize(color).expect("enum");
    assert!(matches!(decl(&session, enum_id).parent, Parent::ExternalPackage(_)));
    assert!(session.files().is_empty());
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_missing_entry_annotation_rolls_back() {
    let mut builder = MetadataBuilder::new("libcolors");
    let color = builder
        .enum_class("colors", "Color", PrimitiveKind::I32, &[("A", 1), ("B", 2)])
        .expect("valid enum");
    let b = builder.lookup("colors.Color.B").expect("entry");
    if let Some(desc) = builder.descriptor_mut(b) {
        desc.annotations.clear();
    }
    let index = builder.finish();
    let mut session = StubSession::new("app", &index);

    let err = session.materialize(color).expect_err("entry B has no value");
    assert!(matches!(
        err,
        StubError::Configuration(ConfigurationError::MissingEntryValue { ref entry }) if entry == "B"
    ));
    assert!(session.arena().is_empty());
    assert_eq!(session.resolve(color), Resolution::Unbound);
    assert!(session.files().is_empty());
    assert!(session.package_file("colors").is_none());
    assert_eq!(session.stats().rollbacks, 1);
    assert_eq!(session.stats().enums_synthesized, 0);
}

#[test]
fn test_missing_type_size_rolls_back() {
    let mut builder = MetadataBuilder::new("libcolors");
    let color = builder
        .enum_class("colors", "Color", PrimitiveKind::I32, &[("A", 1)])
        .expect("valid enum");
    let companion = builder.lookup("colors.Color.Var.Companion").expect("companion");
    if let Some(desc) = builder.descriptor_mut(companion) {
        desc.annotations.retain(|a| a.fq_name != ENUM_VAR_TYPE_SIZE);
    }
    let index = builder.finish();
    let mut session = StubSession::new("app", &index);

    let err = session.materialize(color).expect_err("no width");
    assert!(matches!(
        err,
        StubError::Configuration(ConfigurationError::MissingTypeSize { ref class }) if class == "colors.Color.Var.Companion"
    ));
    assert!(session.arena().is_empty());
    assert_eq!(session.resolve(color), Resolution::Unbound);
}

#[test]
fn test_decode_priority_and_range() {
    let mut both = entry("BOTH");
    both.annotations.push(entry_value(IntEncoding::I64, AnnotationArg::Int(7)));
    both.annotations.push(entry_value(IntEncoding::I8, AnnotationArg::Int(7)));
    assert_eq!(decode_entry_value(ForeignRef(0), &both).expect("decodes"), ConstValue::I8(7));

    let mut unsigned = entry("U");
    unsigned.annotations.push(entry_value(IntEncoding::U64, AnnotationArg::UInt(u64::MAX)));
    assert_eq!(
        decode_entry_value(ForeignRef(0), &unsigned).expect("decodes"),
        ConstValue::U64(u64::MAX)
    );

    let mut too_big = entry("BIG");
    too_big.annotations.push(entry_value(IntEncoding::I8, AnnotationArg::Int(300)));
    assert!(matches!(
        decode_entry_value(ForeignRef(0), &too_big),
        Err(StubError::Configuration(ConfigurationError::ValueOutOfRange {
            value: 300,
            encoding: IntEncoding::I8,
            ..
        }))
    ));

    assert!(matches!(
        decode_entry_value(ForeignRef(0), &entry("NONE")),
        Err(StubError::Configuration(ConfigurationError::MissingEntryValue { .. }))
    ));

    let mut not_integral = entry("STR");
    not_integral
        .annotations
        .push(entry_value(IntEncoding::I32, AnnotationArg::Str("x".into())));
    assert!(matches!(
        decode_entry_value(ForeignRef(0), &not_integral),
        Err(StubError::Configuration(ConfigurationError::Malformed { .. }))
    ));
}
