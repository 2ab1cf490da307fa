//! Process-wide schema registry keyed by entity type identity.
//!
//! Schemas are installed once at program initialization; installing twice
//! for the same type and looking up an uninstalled type are both errors,
//! never silent fallbacks.

use crate::db::schema::{Schema, SchemaRef};
use crate::error::SchemaError;
use once_cell::sync::Lazy;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::info;

static REGISTRY: Lazy<RwLock<HashMap<TypeId, SchemaRef>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Install the schema for entity type `T`.
pub fn install<T: 'static>(schema: Schema) -> Result<SchemaRef, SchemaError> {
    let mut registry = REGISTRY.write().unwrap();
    let type_id = TypeId::of::<T>();
    if registry.contains_key(&type_id) {
        return Err(SchemaError::AlreadyInstalled(std::any::type_name::<T>()));
    }
    info!(
        entity = std::any::type_name::<T>(),
        table = schema.table(),
        "Schema installed"
    );
    let schema = Arc::new(schema);
    registry.insert(type_id, schema.clone());
    Ok(schema)
}

/// Look up the schema installed for entity type `T`.
pub fn lookup<T: 'static>() -> Result<SchemaRef, SchemaError> {
    REGISTRY
        .read()
        .unwrap()
        .get(&TypeId::of::<T>())
        .cloned()
        .ok_or(SchemaError::NotInstalled(std::any::type_name::<T>()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::FieldDef;

    struct Widget;
    struct Gadget;

    #[test]
    fn test_install_and_lookup() {
        let schema = Schema::builder("widgets")
            .field(FieldDef::integer("id").primary_key())
            .build()
            .unwrap();
        install::<Widget>(schema).unwrap();
        let found = lookup::<Widget>().unwrap();
        assert_eq!(found.table(), "widgets");
    }

    #[test]
    fn test_lookup_uninstalled_fails() {
        let err = lookup::<Gadget>().unwrap_err();
        assert!(matches!(err, SchemaError::NotInstalled(_)));
    }

    #[test]
    fn test_double_install_fails() {
        struct Dup;
        let make = || {
            Schema::builder("dups")
                .field(FieldDef::integer("id").primary_key())
                .build()
                .unwrap()
        };
        install::<Dup>(make()).unwrap();
        let err = install::<Dup>(make()).unwrap_err();
        assert!(matches!(err, SchemaError::AlreadyInstalled(_)));
    }
}
