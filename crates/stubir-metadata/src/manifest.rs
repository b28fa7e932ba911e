//! JSON manifest describing an interop library.
//!
//! ```json
//! {
//!   "library": "libcolors",
//!   "packages": [{
//!     "name": "colors",
//!     "declarations": [
//!       { "kind": "enum", "name": "Color", "backing": "i32",
//!         "entries": [{ "name": "RED", "value": 1 }] },
//!       { "kind": "property", "name": "favorite", "type": "Color" }
//!     ]
//!   }]
//! }
//! ```
//!
//! Type strings are primitive names (`i32`, `nativeptr`, ...), a leading
//! `*` for pointers, or a classifier name, either dotted or relative to the
//! declaring package. Classifiers are declared before anything else so
//! declarations may refer to classes that appear later, or to themselves.

use crate::MetadataError;
use crate::builder::MetadataBuilder;
use crate::entity::{ClassFlavor, DescriptorOrigin, ForeignParam, ForeignRef, ForeignType};
use crate::reader::MetadataIndex;
use serde::Deserialize;
use stubir_common::{PrimitiveKind, Visibility};
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub library: String,
    #[serde(default)]
    pub packages: Vec<ManifestPackage>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestPackage {
    pub name: String,
    /// Declarations compiled from source rather than generated metadata.
    #[serde(default)]
    pub source: bool,
    #[serde(default)]
    pub declarations: Vec<ManifestDecl>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestParam {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub name: String,
    pub value: i64,
}

fn unit() -> String {
    "unit".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ManifestDecl {
    Function {
        name: String,
        #[serde(default)]
        params: Vec<ManifestParam>,
        #[serde(default = "unit")]
        returns: String,
        #[serde(default)]
        uniq_id: Option<u64>,
    },
    Property {
        name: String,
        #[serde(rename = "type")]
        ty: String,
        #[serde(default)]
        mutable: bool,
        #[serde(default)]
        uniq_id: Option<u64>,
    },
    TypeAlias {
        name: String,
        target: String,
    },
    Class {
        name: String,
        #[serde(default)]
        objc: bool,
        #[serde(default)]
        supertypes: Vec<String>,
        #[serde(default)]
        members: Vec<ManifestMember>,
    },
    Enum {
        name: String,
        backing: PrimitiveKind,
        #[serde(default)]
        entries: Vec<ManifestEntry>,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ManifestMember {
    Function {
        name: String,
        #[serde(default)]
        params: Vec<ManifestParam>,
        #[serde(default = "unit")]
        returns: String,
        #[serde(default)]
        fake_override: bool,
        #[serde(default)]
        visibility: Visibility,
    },
    Property {
        name: String,
        #[serde(rename = "type")]
        ty: String,
        #[serde(default)]
        mutable: bool,
        #[serde(default)]
        fake_override: bool,
    },
    Field {
        name: String,
        #[serde(rename = "type")]
        ty: String,
        #[serde(default)]
        visibility: Visibility,
    },
    Constructor {
        #[serde(default)]
        params: Vec<ManifestParam>,
        #[serde(default)]
        primary: bool,
    },
}

impl Manifest {
    pub fn from_json(text: &str) -> Result<Self, MetadataError> {
        serde_json::from_str(text).map_err(MetadataError::Manifest)
    }

    /// Lay the manifest out as descriptors.
    pub fn build(&self) -> Result<MetadataIndex, MetadataError> {
        let mut builder = MetadataBuilder::new(self.library.clone());

        // Classifiers first, so every type string can be resolved.
        let mut classes: Vec<(ForeignRef, &ManifestPackage, &ManifestDecl)> = Vec::new();
        for package in &self.packages {
            builder.set_origin(origin_for(&self.library, package));
            for decl in &package.declarations {
                match decl {
                    ManifestDecl::Class { name, objc, .. } => {
                        let class = if *objc {
                            builder.objc_class(&package.name, name)
                        } else {
                            builder.class(&package.name, name, ClassFlavor::Class)
                        };
                        classes.push((class, package, decl));
                    }
                    ManifestDecl::Enum {
                        name,
                        backing,
                        entries,
                    } => {
                        let entries: Vec<(&str, i128)> = entries
                            .iter()
                            .map(|e| (e.name.as_str(), i128::from(e.value)))
                            .collect();
                        builder.enum_class(&package.name, name, *backing, &entries)?;
                    }
                    _ => {}
                }
            }
        }

        for package in &self.packages {
            builder.set_origin(origin_for(&self.library, package));
            let pkg = package.name.as_str();
            for decl in &package.declarations {
                match decl {
                    ManifestDecl::Function {
                        name,
                        params,
                        returns,
                        uniq_id,
                    } => {
                        let params = resolve_params(&builder, pkg, params)?;
                        let ret = resolve_type(&builder, pkg, returns)?;
                        let id = builder.function(pkg, name, params, ret);
                        if uniq_id.is_some() {
                            builder.set_uniq_id(id, *uniq_id);
                        }
                    }
                    ManifestDecl::Property {
                        name,
                        ty,
                        mutable,
                        uniq_id,
                    } => {
                        let ty = resolve_type(&builder, pkg, ty)?;
                        let id = builder.property(pkg, name, ty, *mutable);
                        if uniq_id.is_some() {
                            builder.set_uniq_id(id, *uniq_id);
                        }
                    }
                    ManifestDecl::TypeAlias { name, target } => {
                        let ty = resolve_type(&builder, pkg, target)?;
                        builder.type_alias(pkg, name, ty);
                    }
                    ManifestDecl::Class { .. } | ManifestDecl::Enum { .. } => {}
                }
            }
        }

        for (class, package, decl) in classes {
            builder.set_origin(origin_for(&self.library, package));
            let ManifestDecl::Class {
                supertypes,
                members,
                ..
            } = decl
            else {
                continue;
            };
            let pkg = package.name.as_str();
            for supertype in supertypes {
                let ty = resolve_type(&builder, pkg, supertype)?;
                builder.add_supertype(class, ty);
            }
            for member in members {
                add_member(&mut builder, pkg, class, member)?;
            }
        }

        let index = builder.finish();
        debug!(library = %index.library(), entities = index.len(), "manifest built");
        Ok(index)
    }
}

fn origin_for(library: &str, package: &ManifestPackage) -> DescriptorOrigin {
    if package.source {
        DescriptorOrigin::Source {
            module: library.to_string(),
        }
    } else {
        DescriptorOrigin::Interop {
            library: library.to_string(),
        }
    }
}

fn add_member(
    builder: &mut MetadataBuilder,
    pkg: &str,
    class: ForeignRef,
    member: &ManifestMember,
) -> Result<(), MetadataError> {
    match member {
        ManifestMember::Function {
            name,
            params,
            returns,
            fake_override,
            visibility,
        } => {
            let params = resolve_params(builder, pkg, params)?;
            let ret = resolve_type(builder, pkg, returns)?;
            let id = builder.member_function(class, name, params, ret);
            if *fake_override {
                builder.mark_fake_override(id);
            }
            builder.set_visibility(id, *visibility);
        }
        ManifestMember::Property {
            name,
            ty,
            mutable,
            fake_override,
        } => {
            let ty = resolve_type(builder, pkg, ty)?;
            let id = builder.member_property(class, name, ty, *mutable);
            if *fake_override {
                builder.mark_fake_override(id);
            }
        }
        ManifestMember::Field {
            name,
            ty,
            visibility,
        } => {
            let ty = resolve_type(builder, pkg, ty)?;
            let id = builder.member_field(class, name, ty);
            builder.set_visibility(id, *visibility);
        }
        ManifestMember::Constructor { params, primary } => {
            let params = resolve_params(builder, pkg, params)?;
            builder.constructor(class, params, *primary);
        }
    }
    Ok(())
}

fn resolve_params(
    builder: &MetadataBuilder,
    pkg: &str,
    params: &[ManifestParam],
) -> Result<Vec<ForeignParam>, MetadataError> {
    params
        .iter()
        .map(|p| Ok(ForeignParam::new(p.name.clone(), resolve_type(builder, pkg, &p.ty)?)))
        .collect()
}

/// Resolve a manifest type string.
pub fn resolve_type(builder: &MetadataBuilder, pkg: &str, text: &str) -> Result<ForeignType, MetadataError> {
    let text = text.trim();
    if let Some(pointee) = text.strip_prefix('*') {
        return Ok(ForeignType::Pointer(Box::new(resolve_type(builder, pkg, pointee)?)));
    }
    if let Some(primitive) = parse_primitive(text) {
        return Ok(ForeignType::Primitive(primitive));
    }
    builder
        .lookup(&format!("{pkg}.{text}"))
        .or_else(|| builder.lookup(text))
        .map(ForeignType::Entity)
        .ok_or_else(|| MetadataError::UnknownType {
            package: pkg.to_string(),
            name: text.to_string(),
        })
}

fn parse_primitive(text: &str) -> Option<PrimitiveKind> {
    Some(match text {
        "unit" => PrimitiveKind::Unit,
        "bool" => PrimitiveKind::Bool,
        "i8" => PrimitiveKind::I8,
        "i16" => PrimitiveKind::I16,
        "i32" => PrimitiveKind::I32,
        "i64" => PrimitiveKind::I64,
        "u8" => PrimitiveKind::U8,
        "u16" => PrimitiveKind::U16,
        "u32" => PrimitiveKind::U32,
        "u64" => PrimitiveKind::U64,
        "f32" => PrimitiveKind::F32,
        "f64" => PrimitiveKind::F64,
        "nativeptr" => PrimitiveKind::NativePtr,
        _ => return None,
    })
}
