//! Entity trait and active-record operations.
//!
//! An [`Entity`] is a serde-backed struct whose schema has been installed in
//! the [`registry`](crate::db::registry). The operations delegate to
//! [`Database`] using the schema's pre-rendered SQL templates with
//! positional arguments; an affected-row count other than one is logged as
//! a warning, not raised.

use crate::db::pool::Database;
use crate::db::registry;
use crate::db::schema::SchemaRef;
use crate::error::{DbError, SchemaError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

/// An active-record entity mapped to one database table.
pub trait Entity: Serialize + DeserializeOwned + Sized + 'static {
    /// Schema descriptor installed for this entity type.
    fn schema() -> Result<SchemaRef, SchemaError> {
        registry::lookup::<Self>()
    }
}

/// Row-limit shapes for [`Database::find_all`].
///
/// The enum makes the original's "int or 2-tuple" limit argument
/// unrepresentable when invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// `limit ?`
    Count(u64),
    /// `limit ?, ?` (offset, count)
    OffsetCount(u64, u64),
}

/// Optional query modifiers for [`Database::find_all`].
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub order_by: Option<String>,
    pub limit: Option<Limit>,
}

impl Database {
    /// Fetch one entity by primary key.
    pub fn find<T: Entity>(&self, primary_key: &Value) -> Result<Option<T>, DbError> {
        let schema = T::schema()?;
        let sql = format!(
            "{} where `{}`=?",
            schema.select_sql(),
            schema.primary_key()
        );
        let rows = self.select(&sql, std::slice::from_ref(primary_key), Some(1))?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(decode_row(row)?)),
            None => Ok(None),
        }
    }

    /// Fetch all entities matching an optional `where` clause.
    pub fn find_all<T: Entity>(
        &self,
        filter: Option<&str>,
        args: &[Value],
        opts: &QueryOptions,
    ) -> Result<Vec<T>, DbError> {
        let schema = T::schema()?;
        let mut sql = schema.select_sql().to_string();
        let mut all_args = args.to_vec();
        if let Some(filter) = filter {
            sql.push_str(" where ");
            sql.push_str(filter);
        }
        if let Some(order_by) = &opts.order_by {
            sql.push_str(" order by ");
            sql.push_str(order_by);
        }
        match opts.limit {
            Some(Limit::Count(n)) => {
                sql.push_str(" limit ?");
                all_args.push(Value::from(n));
            }
            Some(Limit::OffsetCount(offset, n)) => {
                sql.push_str(" limit ?, ?");
                all_args.push(Value::from(offset));
                all_args.push(Value::from(n));
            }
            None => {}
        }
        let rows = self.select(&sql, &all_args, None)?;
        rows.into_iter().map(decode_row).collect()
    }

    /// Fetch a scalar aggregate (e.g. `count(id)`) for an entity's table.
    pub fn find_number<T: Entity>(
        &self,
        selected_field: &str,
        filter: Option<&str>,
        args: &[Value],
    ) -> Result<Option<Value>, DbError> {
        let schema = T::schema()?;
        let mut sql = format!("select {} _num_ from `{}`", selected_field, schema.table());
        if let Some(filter) = filter {
            sql.push_str(" where ");
            sql.push_str(filter);
        }
        let rows = self.select(&sql, args, Some(1))?;
        Ok(rows.into_iter().next().and_then(|mut r| r.remove("_num_")))
    }

    /// Insert the entity, applying field defaults for absent values.
    pub fn save<T: Entity>(&self, entity: &T) -> Result<(), DbError> {
        let schema = T::schema()?;
        let values = entity_values(entity)?;
        let mut args: Vec<Value> = schema
            .fields()
            .iter()
            .map(|f| value_or_default(&values, f.name(), f.default()))
            .collect();
        args.push(value_or_default(
            &values,
            schema.primary_key(),
            schema.primary_key_field().default(),
        ));
        let affected = self.execute(schema.insert_sql(), &args, true)?;
        if affected != 1 {
            warn!(table = schema.table(), affected, "Failed to insert record");
        }
        Ok(())
    }

    /// Update the entity's row, keyed on the primary key.
    pub fn update<T: Entity>(&self, entity: &T) -> Result<(), DbError> {
        let schema = T::schema()?;
        let values = entity_values(entity)?;
        let mut args: Vec<Value> = schema
            .fields()
            .iter()
            .map(|f| values.get(f.name()).cloned().unwrap_or(Value::Null))
            .collect();
        args.push(
            values
                .get(schema.primary_key())
                .cloned()
                .unwrap_or(Value::Null),
        );
        let affected = self.execute(schema.update_sql(), &args, true)?;
        if affected != 1 {
            warn!(
                table = schema.table(),
                affected, "Failed to update by primary key"
            );
        }
        Ok(())
    }

    /// Delete the entity's row, keyed on the primary key.
    pub fn delete<T: Entity>(&self, entity: &T) -> Result<(), DbError> {
        let schema = T::schema()?;
        let values = entity_values(entity)?;
        let args = vec![values
            .get(schema.primary_key())
            .cloned()
            .unwrap_or(Value::Null)];
        let affected = self.execute(schema.delete_sql(), &args, true)?;
        if affected != 1 {
            warn!(
                table = schema.table(),
                affected, "Failed to delete by primary key"
            );
        }
        Ok(())
    }
}

fn entity_values<T: Entity>(entity: &T) -> Result<serde_json::Map<String, Value>, DbError> {
    match serde_json::to_value(entity) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(DbError::Decode(format!(
            "entity serialized to non-object value: {other}"
        ))),
        Err(e) => Err(DbError::Decode(e.to_string())),
    }
}

fn value_or_default(
    values: &serde_json::Map<String, Value>,
    name: &str,
    default: Option<&Value>,
) -> Value {
    match values.get(name) {
        Some(v) if !v.is_null() => v.clone(),
        _ => default.cloned().unwrap_or(Value::Null),
    }
}

fn decode_row<T: Entity>(row: serde_json::Map<String, Value>) -> Result<T, DbError> {
    serde_json::from_value(Value::Object(row)).map_err(|e| DbError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_or_default_prefers_present() {
        let mut map = serde_json::Map::new();
        map.insert("a".to_string(), json!("x"));
        assert_eq!(value_or_default(&map, "a", Some(&json!("d"))), json!("x"));
    }

    #[test]
    fn test_value_or_default_applies_default_for_null() {
        let mut map = serde_json::Map::new();
        map.insert("a".to_string(), Value::Null);
        assert_eq!(value_or_default(&map, "a", Some(&json!(0))), json!(0));
        assert_eq!(value_or_default(&map, "b", None), Value::Null);
    }

    #[test]
    fn test_limit_shapes() {
        assert_eq!(Limit::Count(5), Limit::Count(5));
        assert_ne!(Limit::Count(5), Limit::OffsetCount(0, 5));
    }
}
