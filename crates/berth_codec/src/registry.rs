//! Type-identifier registry with retirement enforcement.

use crate::error::{CodecError, CodecResult};
use crate::schema::{FieldRecord, Schema, TypeId};
use std::collections::{BTreeMap, BTreeSet};

/// Registry of record schemas keyed by type identifier.
///
/// Registration happens once, before any box is opened. Registering two
/// schemas under one identifier, or registering under a retired
/// identifier, is a configuration error surfaced at startup rather than
/// at use time.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: BTreeMap<TypeId, Schema>,
    reserved: BTreeSet<TypeId>,
}

impl SchemaRegistry {
    /// Creates an empty registry with no retired identifiers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry that rejects the given retired identifiers.
    #[must_use]
    pub fn with_reserved(reserved: impl IntoIterator<Item = TypeId>) -> Self {
        Self {
            schemas: BTreeMap::new(),
            reserved: reserved.into_iter().collect(),
        }
    }

    /// Registers a schema.
    ///
    /// # Errors
    ///
    /// Fails with [`CodecError::DuplicateTypeId`] if the identifier is
    /// already registered, or [`CodecError::ReservedTypeId`] if it has
    /// been retired.
    pub fn register(&mut self, schema: Schema) -> CodecResult<()> {
        let type_id = schema.type_id();
        if self.reserved.contains(&type_id) {
            return Err(CodecError::ReservedTypeId {
                type_id: type_id.as_u16(),
                name: schema.name().to_string(),
            });
        }
        if let Some(existing) = self.schemas.get(&type_id) {
            return Err(CodecError::DuplicateTypeId {
                type_id: type_id.as_u16(),
                existing: existing.name().to_string(),
                incoming: schema.name().to_string(),
            });
        }
        self.schemas.insert(type_id, schema);
        Ok(())
    }

    /// Looks up a registered schema.
    #[must_use]
    pub fn get(&self, type_id: TypeId) -> Option<&Schema> {
        self.schemas.get(&type_id)
    }

    /// Decodes record bytes under the schema registered for `type_id`.
    ///
    /// # Errors
    ///
    /// Fails with [`CodecError::UnknownTypeId`] if nothing is registered
    /// under the identifier, or with a wire error on malformed bytes.
    pub fn decode(&self, type_id: TypeId, bytes: &[u8]) -> CodecResult<FieldRecord> {
        let schema = self.get(type_id).ok_or(CodecError::UnknownTypeId {
            type_id: type_id.as_u16(),
        })?;
        schema.decode(bytes)
    }

    /// Iterates over registered schemas in type-id order.
    pub fn iter(&self) -> impl Iterator<Item = &Schema> {
        self.schemas.values()
    }
}
