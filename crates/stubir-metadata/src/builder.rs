//! Programmatic construction of a `MetadataIndex`.
//!
//! The builder lays out descriptors the way an interop library records
//! them: properties get accessor descriptors, enum classes get their
//! constructor, `value` property, annotated entries and the `Var` storage
//! wrapper with its companion. Every non-accessor entity receives a
//! precomputed identity unless one is set explicitly.

use crate::MetadataError;
use crate::entity::{
    Annotation, AnnotationArg, ClassFlavor, ClassInfo, DescriptorOrigin, ENUM_ENTRY_VALUE,
    ENUM_VAR_TYPE_SIZE, EntityKind, ForeignDescriptor, ForeignParam, ForeignRef, ForeignType,
    PropertyInfo,
};
use crate::reader::{MetadataIndex, MetadataReader};
use rustc_hash::{FxHashMap, FxHasher};
use std::hash::{Hash, Hasher};
use stubir_common::{ConstValue, IntEncoding, PrimitiveKind, Visibility};
use tracing::trace;

pub struct MetadataBuilder {
    index: MetadataIndex,
    origin: DescriptorOrigin,
}

/// Identity an interop library would have stored for an entity.
///
/// Hash of (library, dotted name, kind, arity) so overloads differ.
pub fn stable_uniq_id(library: &str, fq_name: &str, kind: EntityKind, arity: usize) -> u64 {
    let mut hasher = FxHasher::default();
    library.hash(&mut hasher);
    fq_name.hash(&mut hasher);
    kind.hash(&mut hasher);
    arity.hash(&mut hasher);
    hasher.finish()
}

impl MetadataBuilder {
    /// Builder for a metadata-based interop library.
    pub fn new(library: impl Into<String>) -> Self {
        let library = library.into();
        Self {
            origin: DescriptorOrigin::Interop {
                library: library.clone(),
            },
            index: MetadataIndex {
                library,
                descriptors: Vec::new(),
                by_fq_name: FxHashMap::default(),
            },
        }
    }

    /// Origin recorded on every descriptor added after this call.
    pub fn set_origin(&mut self, origin: DescriptorOrigin) {
        self.origin = origin;
    }

    pub fn finish(self) -> MetadataIndex {
        self.index
    }

    pub fn lookup(&self, fq_name: &str) -> Option<ForeignRef> {
        self.index.lookup(fq_name)
    }

    pub fn descriptor(&self, entity: ForeignRef) -> Option<&ForeignDescriptor> {
        self.index.descriptor(entity)
    }

    pub fn descriptor_mut(&mut self, entity: ForeignRef) -> Option<&mut ForeignDescriptor> {
        self.index.descriptors.get_mut(entity.0 as usize)
    }

    /// Add a fully formed descriptor. Registers it with its container and
    /// assigns a precomputed identity if it has none.
    pub fn add(&mut self, mut desc: ForeignDescriptor) -> ForeignRef {
        let id = ForeignRef(self.index.descriptors.len() as u32);
        let container = desc.container;
        self.index.descriptors.push(desc.clone());

        let fq_name = self.index.fq_name(id);
        if desc.uniq_id.is_none() && desc.accessor_of.is_none() {
            desc.uniq_id = Some(stable_uniq_id(
                self.origin.library_name(),
                &fq_name,
                desc.kind,
                desc.params.len(),
            ));
        }
        trace!(entity = %id, fq_name = %fq_name, kind = ?desc.kind, "MetadataBuilder::add");
        self.index.descriptors[id.0 as usize] = desc;
        if desc_is_named_entity(&self.index.descriptors[id.0 as usize]) {
            self.index.by_fq_name.entry(fq_name).or_insert(id);
        }

        if let Some(owner) = container
            && let Some(class) = self
                .index
                .descriptors
                .get_mut(owner.0 as usize)
                .and_then(|d| d.class.as_mut())
        {
            class.members.push(id);
        }
        id
    }

    fn new_descriptor(&self, kind: EntityKind, name: &str, package: &str) -> ForeignDescriptor {
        ForeignDescriptor::new(kind, name, package, self.origin.clone())
    }

    fn package_of(&self, entity: ForeignRef) -> String {
        self.index
            .descriptor(entity)
            .map(|d| d.package.clone())
            .unwrap_or_default()
    }

    // =========================================================================
    // Top-level entities
    // =========================================================================

    pub fn function(
        &mut self,
        package: &str,
        name: &str,
        params: Vec<ForeignParam>,
        returns: ForeignType,
    ) -> ForeignRef {
        let mut desc = self.new_descriptor(EntityKind::Function, name, package);
        desc.params = params;
        desc.ty = Some(returns);
        self.add(desc)
    }

    /// Property with a getter, and a setter when `is_var`.
    pub fn property(&mut self, package: &str, name: &str, ty: ForeignType, is_var: bool) -> ForeignRef {
        self.property_in(package, None, name, ty, is_var)
    }

    pub fn type_alias(&mut self, package: &str, name: &str, expands_to: ForeignType) -> ForeignRef {
        let mut desc = self.new_descriptor(EntityKind::TypeAlias, name, package);
        desc.ty = Some(expands_to);
        self.add(desc)
    }

    pub fn class(&mut self, package: &str, name: &str, flavor: ClassFlavor) -> ForeignRef {
        let mut desc = self.new_descriptor(EntityKind::Class, name, package);
        desc.class = Some(ClassInfo::new(flavor));
        self.add(desc)
    }

    pub fn objc_class(&mut self, package: &str, name: &str) -> ForeignRef {
        let id = self.class(package, name, ClassFlavor::Class);
        if let Some(class) = self.descriptor_mut(id).and_then(|d| d.class.as_mut()) {
            class.is_objc = true;
        }
        id
    }

    // =========================================================================
    // Members
    // =========================================================================

    pub fn nested_class(&mut self, owner: ForeignRef, name: &str, flavor: ClassFlavor) -> ForeignRef {
        let package = self.package_of(owner);
        let mut desc = self.new_descriptor(EntityKind::Class, name, &package);
        desc.container = Some(owner);
        desc.class = Some(ClassInfo::new(flavor));
        self.add(desc)
    }

    pub fn member_function(
        &mut self,
        owner: ForeignRef,
        name: &str,
        params: Vec<ForeignParam>,
        returns: ForeignType,
    ) -> ForeignRef {
        let package = self.package_of(owner);
        let mut desc = self.new_descriptor(EntityKind::Function, name, &package);
        desc.container = Some(owner);
        desc.params = params;
        desc.ty = Some(returns);
        self.add(desc)
    }

    pub fn member_property(
        &mut self,
        owner: ForeignRef,
        name: &str,
        ty: ForeignType,
        is_var: bool,
    ) -> ForeignRef {
        let package = self.package_of(owner);
        self.property_in(&package, Some(owner), name, ty, is_var)
    }

    pub fn member_field(&mut self, owner: ForeignRef, name: &str, ty: ForeignType) -> ForeignRef {
        let package = self.package_of(owner);
        let mut desc = self.new_descriptor(EntityKind::Field, name, &package);
        desc.container = Some(owner);
        desc.ty = Some(ty);
        self.add(desc)
    }

    pub fn constructor(&mut self, owner: ForeignRef, params: Vec<ForeignParam>, is_primary: bool) -> ForeignRef {
        let package = self.package_of(owner);
        let mut desc = self.new_descriptor(EntityKind::Constructor, "<init>", &package);
        desc.container = Some(owner);
        desc.params = params;
        desc.ty = Some(ForeignType::Entity(owner));
        desc.is_primary = is_primary;
        self.add(desc)
    }

    fn property_in(
        &mut self,
        package: &str,
        owner: Option<ForeignRef>,
        name: &str,
        ty: ForeignType,
        is_var: bool,
    ) -> ForeignRef {
        let mut desc = self.new_descriptor(EntityKind::Property, name, package);
        desc.container = owner;
        desc.ty = Some(ty.clone());
        desc.property = Some(PropertyInfo {
            is_var,
            getter: None,
            setter: None,
        });
        let property = self.add(desc);

        let getter = self.accessor(package, owner, property, &format!("<get-{name}>"), Vec::new(), ty.clone());
        let setter = is_var.then(|| {
            self.accessor(
                package,
                owner,
                property,
                &format!("<set-{name}>"),
                vec![ForeignParam::new("<set-?>", ty)],
                ForeignType::unit(),
            )
        });
        if let Some(info) = self.descriptor_mut(property).and_then(|d| d.property.as_mut()) {
            info.getter = Some(getter);
            info.setter = setter;
        }
        property
    }

    fn accessor(
        &mut self,
        package: &str,
        owner: Option<ForeignRef>,
        property: ForeignRef,
        name: &str,
        params: Vec<ForeignParam>,
        returns: ForeignType,
    ) -> ForeignRef {
        let mut desc = self.new_descriptor(EntityKind::Function, name, package);
        // Accessors are not class members of their own; they hang off the property.
        desc.accessor_of = Some(property);
        desc.params = params;
        desc.ty = Some(returns);
        let id = self.add(desc);
        if let Some(d) = self.descriptor_mut(id) {
            d.container = owner;
        }
        id
    }

    // =========================================================================
    // Enums
    // =========================================================================

    /// Enum class backed by `backing`, with one annotated entry per pair.
    ///
    /// Produces: primary constructor `(value: backing)`, `value` property,
    /// the entries, and a nested `Var` class with a primary constructor
    /// `(rawPtr: nativeptr)`, a `Companion` object annotated with the
    /// backing width, and a mutable `value` property.
    pub fn enum_class(
        &mut self,
        package: &str,
        name: &str,
        backing: PrimitiveKind,
        entries: &[(&str, i128)],
    ) -> Result<ForeignRef, MetadataError> {
        let encoding = IntEncoding::for_primitive(backing).ok_or_else(|| {
            MetadataError::NonIntegralEnumBacking {
                name: name.to_string(),
                backing,
            }
        })?;
        let backing_ty = ForeignType::Primitive(backing);

        let enum_ref = self.class(package, name, ClassFlavor::EnumClass);

        self.constructor(enum_ref, vec![ForeignParam::new("value", backing_ty.clone())], true);
        self.member_property(enum_ref, "value", backing_ty.clone(), false);

        for &(entry_name, raw) in entries {
            let value = ConstValue::from_i128(encoding, raw).ok_or_else(|| {
                MetadataError::EntryValueOutOfRange {
                    entry: entry_name.to_string(),
                    value: raw,
                    encoding,
                }
            })?;
            let arg = if encoding.is_signed() {
                AnnotationArg::Int(value.as_i128() as i64)
            } else {
                AnnotationArg::UInt(value.as_i128() as u64)
            };
            let mut entry = self.new_descriptor(EntityKind::EnumEntry, entry_name, package);
            entry.container = Some(enum_ref);
            entry.ty = Some(ForeignType::Entity(enum_ref));
            entry.annotations.push(
                Annotation::new(format!("{ENUM_ENTRY_VALUE}.{}", encoding.tag())).with_arg("value", arg),
            );
            self.add(entry);
        }

        let var_ref = self.nested_class(enum_ref, "Var", ClassFlavor::Class);
        self.constructor(
            var_ref,
            vec![ForeignParam::new(
                "rawPtr",
                ForeignType::Primitive(PrimitiveKind::NativePtr),
            )],
            true,
        );
        let companion = self.nested_class(var_ref, "Companion", ClassFlavor::CompanionObject);
        self.constructor(companion, Vec::new(), true);
        if let Some(d) = self.descriptor_mut(companion) {
            d.annotations.push(
                Annotation::new(ENUM_VAR_TYPE_SIZE)
                    .with_arg("size", AnnotationArg::Int(i64::from(backing.byte_width()))),
            );
        }
        self.member_property(var_ref, "value", ForeignType::Entity(enum_ref), true);

        Ok(enum_ref)
    }

    /// Mark a member as inherited without redeclaration.
    pub fn mark_fake_override(&mut self, entity: ForeignRef) {
        if let Some(d) = self.descriptor_mut(entity) {
            d.is_fake_override = true;
        }
    }

    pub fn set_visibility(&mut self, entity: ForeignRef, visibility: Visibility) {
        if let Some(d) = self.descriptor_mut(entity) {
            d.visibility = visibility;
        }
    }

    pub fn set_uniq_id(&mut self, entity: ForeignRef, uniq_id: Option<u64>) {
        if let Some(d) = self.descriptor_mut(entity) {
            d.uniq_id = uniq_id;
        }
    }

    pub fn add_supertype(&mut self, class: ForeignRef, supertype: ForeignType) {
        if let Some(info) = self.descriptor_mut(class).and_then(|d| d.class.as_mut()) {
            info.supertypes.push(supertype);
        }
    }
}

fn desc_is_named_entity(desc: &ForeignDescriptor) -> bool {
    desc.accessor_of.is_none() && desc.kind != EntityKind::Constructor
}
