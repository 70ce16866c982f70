//! # Dataset State
//!
//! Metadata lookup used to restore saved filters, and the dashboard
//! configuration file that provides it.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::datasource::{DatabaseMeta, FieldKey, FieldMeta, TableMeta};
use crate::relation::RelationGroup;

use super::errors::{ConfigError, ConfigResult};
use super::saved::SavedFilterDesign;

/// Resolves names to dataset metadata
pub trait DatasetState {
    fn database(&self, datastore: &str, database: &str) -> Option<DatabaseMeta>;

    fn table(&self, datastore: &str, database: &str, table: &str) -> Option<TableMeta>;

    fn field(&self, datastore: &str, database: &str, table: &str, field: &str)
        -> Option<FieldMeta>;

    /// Full field identity, if every name resolves
    fn field_key(
        &self,
        datastore: &str,
        database: &str,
        table: &str,
        field: &str,
    ) -> Option<FieldKey> {
        Some(FieldKey::new(
            datastore,
            self.database(datastore, database)?,
            self.table(datastore, database, table)?,
            self.field(datastore, database, table, field)?,
        ))
    }
}

/// A datastore and its databases
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatastoreConfig {
    pub name: String,

    #[serde(default)]
    pub databases: Vec<DatabaseConfig>,
}

/// A database and its tables
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub name: String,

    #[serde(default)]
    pub pretty_name: String,

    #[serde(default)]
    pub tables: Vec<TableConfig>,
}

/// A table and its fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableConfig {
    pub name: String,

    #[serde(default)]
    pub pretty_name: String,

    #[serde(default)]
    pub fields: Vec<FieldMeta>,
}

/// Dashboard configuration file
///
/// ```json
/// {
///   "datastores": [{"name": "es", "databases": [...]}],
///   "relations": [[["es.news.articles.author"], ["es.news.authors.name"]]],
///   "filters": [...]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub datastores: Vec<DatastoreConfig>,

    /// Relation groups as dotted `datastore.database.table.field` paths
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relations: Vec<Vec<Vec<String>>>,

    /// Saved filters
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<SavedFilterDesign>,
}

impl DashboardConfig {
    /// Load a config file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        Self::from_json(&text)
    }

    /// Parse config text
    pub fn from_json(text: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Write the config as pretty JSON
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text).map_err(|e| ConfigError::io(path, e))
    }

    fn find_database(&self, datastore: &str, database: &str) -> Option<&DatabaseConfig> {
        self.datastores
            .iter()
            .find(|candidate| candidate.name == datastore)?
            .databases
            .iter()
            .find(|candidate| candidate.name == database)
    }

    fn find_table(&self, datastore: &str, database: &str, table: &str) -> Option<&TableConfig> {
        self.find_database(datastore, database)?
            .tables
            .iter()
            .find(|candidate| candidate.name == table)
    }

    /// Resolve a dotted field path against the configured metadata
    pub fn resolve_field_path(&self, path: &str) -> Option<FieldKey> {
        let key = FieldKey::from_path(path)?;
        self.field_key(
            &key.datastore,
            &key.database.name,
            &key.table.name,
            &key.field.column_name,
        )
    }

    /// Relation groups with every path resolved
    pub fn relation_groups(&self) -> ConfigResult<Vec<RelationGroup>> {
        self.relations
            .iter()
            .map(|group| {
                group
                    .iter()
                    .map(|list| {
                        list.iter()
                            .map(|path| {
                                self.resolve_field_path(path)
                                    .ok_or_else(|| ConfigError::UnknownField(path.clone()))
                            })
                            .collect::<ConfigResult<Vec<_>>>()
                    })
                    .collect::<ConfigResult<Vec<_>>>()
            })
            .collect()
    }

    /// Check that every relation path and saved filter resolves
    pub fn validate(&self) -> ConfigResult<()> {
        self.relation_groups()?;
        for filter in &self.filters {
            if filter.resolve(self).is_none() {
                warn!(filter = %filter.describe(), "Saved filter does not resolve");
                return Err(ConfigError::UnknownField(filter.describe()));
            }
        }
        Ok(())
    }
}

impl DatasetState for DashboardConfig {
    fn database(&self, datastore: &str, database: &str) -> Option<DatabaseMeta> {
        self.find_database(datastore, database)
            .map(|found| DatabaseMeta::new(found.name.clone(), found.pretty_name.clone()))
    }

    fn table(&self, datastore: &str, database: &str, table: &str) -> Option<TableMeta> {
        self.find_table(datastore, database, table)
            .map(|found| TableMeta::new(found.name.clone(), found.pretty_name.clone()))
    }

    fn field(
        &self,
        datastore: &str,
        database: &str,
        table: &str,
        field: &str,
    ) -> Option<FieldMeta> {
        self.find_table(datastore, database, table)?
            .fields
            .iter()
            .find(|candidate| candidate.column_name == field)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn config() -> DashboardConfig {
        serde_json::from_value(json!({
            "datastores": [{
                "name": "es",
                "databases": [{
                    "name": "news",
                    "pretty_name": "News",
                    "tables": [
                        {"name": "articles", "pretty_name": "Articles", "fields": [
                            {"column_name": "author", "pretty_name": "Author"}
                        ]},
                        {"name": "authors", "fields": [
                            {"column_name": "name"}
                        ]}
                    ]
                }]
            }],
            "relations": [[["es.news.articles.author"], ["es.news.authors.name"]]]
        }))
        .unwrap()
    }

    #[test]
    fn test_lookup_metadata() {
        let config = config();
        assert_eq!(config.database("es", "news").unwrap().pretty_name, "News");
        assert_eq!(config.table("es", "news", "authors").unwrap().label(), "authors");
        assert!(config.field("es", "news", "articles", "title").is_none());
        assert!(config.database("sql", "news").is_none());
    }

    #[test]
    fn test_relation_groups_resolve() {
        let groups = config().relation_groups().unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[0][0][0].field.pretty_name, "Author");
        assert_eq!(groups[0][1][0].table.name, "authors");
    }

    #[test]
    fn test_unknown_relation_path() {
        let mut config = config();
        config.relations = vec![vec![vec!["es.news.articles.title".to_string()]]];
        assert_eq!(
            config.validate(),
            Err(ConfigError::UnknownField("es.news.articles.title".to_string()))
        );
    }

    #[test]
    fn test_save_and_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("dashboard.json");

        let config = config();
        config.save(&path).unwrap();
        assert_eq!(DashboardConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file() {
        let tmp = TempDir::new().unwrap();
        let result = DashboardConfig::load(&tmp.path().join("missing.json"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            DashboardConfig::from_json("{not json"),
            Err(ConfigError::InvalidJson(_))
        ));
    }
}
