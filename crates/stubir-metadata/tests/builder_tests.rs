use super::*;
use stubir_common::Visibility;

#[test]
fn test_enum_class_layout() {
    let mut builder = MetadataBuilder::new("libcolors");
    let color = builder
        .enum_class("colors", "Color", PrimitiveKind::I32, &[("RED", 1), ("GREEN", 2)])
        .expect("valid enum");
    let index = builder.finish();

    let desc = index.descriptor(color).expect("enum descriptor");
    assert!(desc.is_enum_class());
    let kinds: Vec<EntityKind> = desc
        .members()
        .iter()
        .map(|&m| index.descriptor(m).expect("member").kind)
        .collect();
    assert_eq!(
        kinds,
        [
            EntityKind::Constructor,
            EntityKind::Property,
            EntityKind::EnumEntry,
            EntityKind::EnumEntry,
            EntityKind::Class,
        ]
    );

    let var = index
        .find_member(color, "Var", EntityKind::Class)
        .expect("Var class");
    let companion = index
        .find_member(var, "Companion", EntityKind::Class)
        .expect("companion");
    let size = index
        .descriptor(companion)
        .and_then(|d| d.find_annotation(ENUM_VAR_TYPE_SIZE))
        .and_then(|a| a.arg("size"))
        .and_then(AnnotationArg::as_i128);
    assert_eq!(size, Some(4));

    let green = index.lookup("colors.Color.GREEN").expect("entry by name");
    let value = index
        .descriptor(green)
        .and_then(|d| d.find_annotation(&format!("{ENUM_ENTRY_VALUE}.I32")))
        .and_then(|a| a.arg("value"))
        .and_then(AnnotationArg::as_i128);
    assert_eq!(value, Some(2));
}

#[test]
fn test_enum_rejects_out_of_range_entry() {
    let mut builder = MetadataBuilder::new("libflags");
    let err = builder
        .enum_class("flags", "Small", PrimitiveKind::U8, &[("BIG", 300)])
        .expect_err("300 does not fit u8");
    assert!(matches!(err, MetadataError::EntryValueOutOfRange { value: 300, .. }));

    let err = builder
        .enum_class("flags", "Float", PrimitiveKind::F32, &[])
        .expect_err("float backing");
    assert!(matches!(err, MetadataError::NonIntegralEnumBacking { .. }));
}

#[test]
fn test_property_accessors_are_detached() {
    let mut builder = MetadataBuilder::new("libc");
    let errno = builder.property("posix", "errno", ForeignType::Primitive(PrimitiveKind::I32), true);
    let index = builder.finish();

    let info = index
        .descriptor(errno)
        .and_then(|d| d.property.clone())
        .expect("property info");
    let getter = info.getter.expect("getter");
    let setter = info.setter.expect("setter");

    let getter_desc = index.descriptor(getter).expect("getter descriptor");
    assert_eq!(getter_desc.accessor_of, Some(errno));
    assert_eq!(getter_desc.uniq_id, None);
    assert_eq!(index.descriptor(setter).map(|d| d.params.len()), Some(1));

    let top: Vec<ForeignRef> = index.top_level().collect();
    assert_eq!(top, vec![errno]);
}

#[test]
fn test_uniq_ids_are_deterministic() {
    let build = || {
        let mut builder = MetadataBuilder::new("libm");
        builder.function(
            "math",
            "fabs",
            vec![ForeignParam::new("x", ForeignType::Primitive(PrimitiveKind::F64))],
            ForeignType::Primitive(PrimitiveKind::F64),
        );
        builder.finish()
    };
    let a = build();
    let b = build();
    let fabs_a = a.lookup("math.fabs").expect("fabs");
    let fabs_b = b.lookup("math.fabs").expect("fabs");

    let id_a = a.descriptor(fabs_a).and_then(|d| d.uniq_id);
    assert!(id_a.is_some());
    assert_eq!(id_a, b.descriptor(fabs_b).and_then(|d| d.uniq_id));
}

#[test]
fn test_fq_name_walks_containers() {
    let mut builder = MetadataBuilder::new("libui");
    let window = builder.objc_class("ui", "Window");
    let frame = builder.member_field(window, "frame", ForeignType::Primitive(PrimitiveKind::I64));
    builder.set_visibility(frame, Visibility::Private);
    let index = builder.finish();

    assert_eq!(index.fq_name(frame), "ui.Window.frame");
    assert_eq!(index.find_member(window, "frame", EntityKind::Field), Some(frame));
    assert_eq!(index.find_member(window, "frame", EntityKind::Property), None);
    assert!(index.descriptor(window).is_some_and(ForeignDescriptor::is_objc_class));
}
