//! Entity schema descriptors.
//!
//! A [`Schema`] is built once per entity type at program initialization via
//! [`Schema::builder`]. Building validates that exactly one field is marked
//! primary key - zero or more than one is a definition-time failure, never
//! a first-use one - and pre-renders the four SQL templates the entity
//! operations execute.

use crate::error::SchemaError;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Shared schema handle stored in the registry.
pub type SchemaRef = Arc<Schema>;

/// A typed field descriptor.
#[derive(Debug, Clone)]
pub struct FieldDef {
    name: &'static str,
    column: Option<&'static str>,
    ddl: &'static str,
    primary_key: bool,
    default: Option<Value>,
}

impl FieldDef {
    /// `varchar(100)` string field.
    pub fn string(name: &'static str) -> Self {
        Self {
            name,
            column: None,
            ddl: "varchar(100)",
            primary_key: false,
            default: None,
        }
    }

    /// `text` field.
    pub fn text(name: &'static str) -> Self {
        Self {
            ddl: "text",
            ..Self::string(name)
        }
    }

    /// `boolean` field, defaulting to `false`.
    pub fn boolean(name: &'static str) -> Self {
        Self {
            ddl: "boolean",
            default: Some(Value::Bool(false)),
            ..Self::string(name)
        }
    }

    /// `bigint` field, defaulting to `0`.
    pub fn integer(name: &'static str) -> Self {
        Self {
            ddl: "bigint",
            default: Some(Value::from(0)),
            ..Self::string(name)
        }
    }

    /// `real` field, defaulting to `0.0`.
    pub fn float(name: &'static str) -> Self {
        Self {
            ddl: "real",
            default: Some(Value::from(0.0)),
            ..Self::string(name)
        }
    }

    /// Override the column DDL (e.g. `varchar(50)`).
    pub fn ddl(mut self, ddl: &'static str) -> Self {
        self.ddl = ddl;
        self
    }

    /// Override the column name used in `update` statements.
    pub fn column(mut self, column: &'static str) -> Self {
        self.column = Some(column);
        self
    }

    /// Mark this field as the primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Value applied on `save` when the entity carries none.
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn column_name(&self) -> &'static str {
        self.column.unwrap_or(self.name)
    }

    pub fn column_ddl(&self) -> &'static str {
        self.ddl
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// Immutable schema descriptor: table name, ordered field list, primary key
/// and the pre-rendered SQL templates.
#[derive(Debug, Clone)]
pub struct Schema {
    table: String,
    primary_key: FieldDef,
    fields: Vec<FieldDef>,
    select_sql: String,
    insert_sql: String,
    update_sql: String,
    delete_sql: String,
}

impl Schema {
    pub fn builder(table: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            table: table.into(),
            fields: Vec::new(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Primary key field name.
    pub fn primary_key(&self) -> &'static str {
        self.primary_key.name()
    }

    pub fn primary_key_field(&self) -> &FieldDef {
        &self.primary_key
    }

    /// Non-primary-key fields in declaration order.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn select_sql(&self) -> &str {
        &self.select_sql
    }

    pub fn insert_sql(&self) -> &str {
        &self.insert_sql
    }

    pub fn update_sql(&self) -> &str {
        &self.update_sql
    }

    pub fn delete_sql(&self) -> &str {
        &self.delete_sql
    }
}

/// Builder collecting field definitions for one table.
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    table: String,
    fields: Vec<FieldDef>,
}

impl SchemaBuilder {
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Validate and render the schema.
    pub fn build(self) -> Result<Schema, SchemaError> {
        let table = self.table;
        let mut primary_key: Option<FieldDef> = None;
        let mut fields = Vec::with_capacity(self.fields.len());
        for field in self.fields {
            if field.is_primary_key() {
                if primary_key.is_some() {
                    return Err(SchemaError::DuplicatePrimaryKey {
                        table,
                        field: field.name().to_string(),
                    });
                }
                primary_key = Some(field);
            } else {
                fields.push(field);
            }
        }
        let primary_key = primary_key.ok_or(SchemaError::MissingPrimaryKey(table.clone()))?;
        let pk = primary_key.name();

        let escaped: Vec<String> = fields.iter().map(|f| format!("`{}`", f.name())).collect();
        let select_sql = format!("select `{}`, {} from `{}`", pk, escaped.join(", "), table);
        let insert_sql = format!(
            "insert into `{}` ({}, `{}`) values ({})",
            table,
            escaped.join(", "),
            pk,
            placeholders(fields.len() + 1)
        );
        let update_sql = format!(
            "update `{}` set {} where `{}`=?",
            table,
            fields
                .iter()
                .map(|f| format!("`{}`=?", f.column_name()))
                .collect::<Vec<_>>()
                .join(", "),
            pk
        );
        let delete_sql = format!("delete from `{}` where `{}`=?", table, pk);

        debug!(table = %table, primary_key = %pk, fields = fields.len(), "Schema built");

        Ok(Schema {
            table,
            primary_key,
            fields,
            select_sql,
            insert_sql,
            update_sql,
            delete_sql,
        })
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(",")
}
