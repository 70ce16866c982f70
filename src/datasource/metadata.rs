//! # Dataset Metadata
//!
//! Database, table and field descriptors referenced by filter designs.
//! Identity is always the raw name; pretty names only feed display strings.

use serde::{Deserialize, Serialize};

/// A database descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatabaseMeta {
    /// Database name (identity)
    #[serde(default)]
    pub name: String,

    /// Display name
    #[serde(default)]
    pub pretty_name: String,
}

impl DatabaseMeta {
    /// Create a database descriptor
    pub fn new(name: impl Into<String>, pretty_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pretty_name: pretty_name.into(),
        }
    }

    /// Create a descriptor whose pretty name is its name
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(name.clone(), name)
    }

    /// Pretty name, falling back to the raw name
    pub fn label(&self) -> &str {
        if self.pretty_name.is_empty() {
            &self.name
        } else {
            &self.pretty_name
        }
    }
}

/// A table descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableMeta {
    /// Table name (identity)
    #[serde(default)]
    pub name: String,

    /// Display name
    #[serde(default)]
    pub pretty_name: String,
}

impl TableMeta {
    /// Create a table descriptor
    pub fn new(name: impl Into<String>, pretty_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pretty_name: pretty_name.into(),
        }
    }

    /// Create a descriptor whose pretty name is its name
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(name.clone(), name)
    }

    /// Pretty name, falling back to the raw name
    pub fn label(&self) -> &str {
        if self.pretty_name.is_empty() {
            &self.name
        } else {
            &self.pretty_name
        }
    }
}

/// A field descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldMeta {
    /// Column name (identity)
    #[serde(default)]
    pub column_name: String,

    /// Display name
    #[serde(default)]
    pub pretty_name: String,

    /// Declared field type (e.g. "keyword", "date")
    #[serde(default, rename = "type", skip_serializing_if = "String::is_empty")]
    pub field_type: String,
}

impl FieldMeta {
    /// Create a field descriptor
    pub fn new(column_name: impl Into<String>, pretty_name: impl Into<String>) -> Self {
        Self {
            column_name: column_name.into(),
            pretty_name: pretty_name.into(),
            field_type: String::new(),
        }
    }

    /// Create a descriptor whose pretty name is its column name
    pub fn named(column_name: impl Into<String>) -> Self {
        let column_name = column_name.into();
        Self::new(column_name.clone(), column_name)
    }

    /// Set the declared field type
    pub fn with_type(mut self, field_type: impl Into<String>) -> Self {
        self.field_type = field_type.into();
        self
    }

    /// Pretty name, falling back to the column name
    pub fn label(&self) -> &str {
        if self.pretty_name.is_empty() {
            &self.column_name
        } else {
            &self.pretty_name
        }
    }

    /// The "unset" sentinel has no column name
    pub fn is_unset(&self) -> bool {
        self.column_name.is_empty()
    }
}

/// Field identity used by relations: `{datastore, database, table, field}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldKey {
    #[serde(default)]
    pub datastore: String,
    #[serde(default)]
    pub database: DatabaseMeta,
    #[serde(default)]
    pub table: TableMeta,
    #[serde(default)]
    pub field: FieldMeta,
}

impl FieldKey {
    /// Create a field key from metadata
    pub fn new(
        datastore: impl Into<String>,
        database: DatabaseMeta,
        table: TableMeta,
        field: FieldMeta,
    ) -> Self {
        Self {
            datastore: datastore.into(),
            database,
            table,
            field,
        }
    }

    /// Create a field key from raw names, using them as pretty names too
    pub fn named(datastore: &str, database: &str, table: &str, field: &str) -> Self {
        Self::new(
            datastore,
            DatabaseMeta::named(database),
            TableMeta::named(table),
            FieldMeta::named(field),
        )
    }

    /// Parse a dotted `datastore.database.table.field` path.
    ///
    /// The field segment keeps any remaining dots (nested fields).
    pub fn from_path(path: &str) -> Option<Self> {
        let mut parts = path.splitn(4, '.');
        let datastore = parts.next()?;
        let database = parts.next()?;
        let table = parts.next()?;
        let field = parts.next()?;
        if database.is_empty() || table.is_empty() || field.is_empty() {
            return None;
        }
        Some(Self::named(datastore, database, table, field))
    }

    /// Dotted `datastore.database.table.field` path
    pub fn path(&self) -> String {
        format!(
            "{}.{}.{}.{}",
            self.datastore, self.database.name, self.table.name, self.field.column_name
        )
    }

    /// True if the field is the unset sentinel
    pub fn is_unset(&self) -> bool {
        self.field.is_unset()
    }

    /// Same datastore, database, table and field (names only)
    pub fn same_field(&self, other: &FieldKey) -> bool {
        self.datastore == other.datastore
            && self.database.name == other.database.name
            && self.table.name == other.table.name
            && self.field.column_name == other.field.column_name
    }
}
