//! Type translation service.
//!
//! Turns foreign types into `IrType`s. Classifier references go back
//! through a `ClassSymbolResolver`, which in a session is the dispatcher
//! itself, so referenced classes are materialized through the registry.

use crate::error::{StubError, TranslationError};
use stubir_ir::{DeclId, IrType};
use stubir_metadata::{ForeignRef, ForeignType};

pub trait ClassSymbolResolver {
    fn resolve_class(&mut self, entity: ForeignRef) -> Result<DeclId, StubError>;
}

pub trait TypeTranslator {
    fn translate(
        &self,
        ty: &ForeignType,
        classes: &mut dyn ClassSymbolResolver,
    ) -> Result<IrType, TranslationError>;
}

/// Structural translation: primitives map one to one, pointers recurse and
/// entity references become class types.
#[derive(Copy, Clone, Debug, Default)]
pub struct DefaultTypeTranslator;

impl TypeTranslator for DefaultTypeTranslator {
    fn translate(
        &self,
        ty: &ForeignType,
        classes: &mut dyn ClassSymbolResolver,
    ) -> Result<IrType, TranslationError> {
        match ty {
            ForeignType::Primitive(kind) => Ok(IrType::Primitive(*kind)),
            ForeignType::Entity(entity) => classes
                .resolve_class(*entity)
                .map(IrType::Class)
                .map_err(|source| TranslationError::Class {
                    entity: *entity,
                    source: Box::new(source),
                }),
            ForeignType::Pointer(inner) => Ok(IrType::Pointer(Box::new(self.translate(inner, classes)?))),
            ForeignType::Unsupported(text) => Err(TranslationError::Unsupported(text.clone())),
        }
    }
}
