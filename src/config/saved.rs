//! # Saved Filters
//!
//! Flattened filter designs for configuration files: database, table and
//! field are stored by name and resolved back to metadata on restore.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::design::{
    present_value, CompoundFilterDesign, CompoundType, FilterDesign, SimpleFilterDesign,
};
use crate::filter::Filter;

use super::dataset::DatasetState;

/// A saved single-condition filter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedSimpleFilterDesign {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub root: CompoundType,

    #[serde(default)]
    pub datastore: String,

    #[serde(default)]
    pub database: String,

    #[serde(default)]
    pub table: String,

    #[serde(default)]
    pub field: String,

    #[serde(default)]
    pub operator: String,

    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<Value>,

    /// Ids of relation partners
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relations: Vec<String>,
}

/// A saved boolean combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedCompoundFilterDesign {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "type")]
    pub kind: CompoundType,

    #[serde(default)]
    pub root: CompoundType,

    pub filters: Vec<SavedFilterDesign>,

    /// Ids of relation partners
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relations: Vec<String>,
}

/// A saved filter: simple or compound
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SavedFilterDesign {
    Compound(SavedCompoundFilterDesign),
    Simple(SavedSimpleFilterDesign),
}

impl SavedFilterDesign {
    /// Flatten a live filter, keeping its relation links
    pub fn from_filter(filter: &Filter) -> Self {
        let mut saved = Self::from(&filter.to_design());
        let relations = filter.relations().to_vec();
        match &mut saved {
            SavedFilterDesign::Simple(simple) => simple.relations = relations,
            SavedFilterDesign::Compound(compound) => compound.relations = relations,
        }
        saved
    }

    pub fn relations(&self) -> &[String] {
        match self {
            SavedFilterDesign::Simple(simple) => &simple.relations,
            SavedFilterDesign::Compound(compound) => &compound.relations,
        }
    }

    /// Resolve names back to metadata; `None` when any name is unknown
    pub fn resolve(&self, dataset: &dyn DatasetState) -> Option<FilterDesign> {
        match self {
            SavedFilterDesign::Simple(simple) => {
                let key = dataset.field_key(
                    &simple.datastore,
                    &simple.database,
                    &simple.table,
                    &simple.field,
                )?;
                Some(FilterDesign::Simple(SimpleFilterDesign {
                    id: simple.id.clone(),
                    name: simple.name.clone(),
                    root: simple.root,
                    datastore: key.datastore,
                    database: key.database,
                    table: key.table,
                    field: key.field,
                    operator: simple.operator.clone(),
                    value: simple.value.clone(),
                }))
            }
            SavedFilterDesign::Compound(compound) => {
                let filters = compound
                    .filters
                    .iter()
                    .map(|filter| filter.resolve(dataset))
                    .collect::<Option<Vec<_>>>()?;
                Some(FilterDesign::Compound(CompoundFilterDesign {
                    id: compound.id.clone(),
                    name: compound.name.clone(),
                    kind: compound.kind,
                    root: compound.root,
                    filters,
                }))
            }
        }
    }

    /// Short description for logs and errors
    pub fn describe(&self) -> String {
        match self {
            SavedFilterDesign::Simple(simple) => format!(
                "{}.{}.{}.{} {}",
                simple.datastore, simple.database, simple.table, simple.field, simple.operator
            ),
            SavedFilterDesign::Compound(compound) => compound
                .filters
                .iter()
                .map(|filter| format!("({})", filter.describe()))
                .collect::<Vec<_>>()
                .join(&format!(" {} ", compound.kind)),
        }
    }
}

impl From<&FilterDesign> for SavedFilterDesign {
    fn from(design: &FilterDesign) -> Self {
        match design {
            FilterDesign::Simple(simple) => SavedFilterDesign::Simple(SavedSimpleFilterDesign {
                id: simple.id.clone(),
                name: simple.name.clone(),
                root: simple.root,
                datastore: simple.datastore.clone(),
                database: simple.database.name.clone(),
                table: simple.table.name.clone(),
                field: simple.field.column_name.clone(),
                operator: simple.operator.clone(),
                value: simple.value.clone(),
                relations: Vec::new(),
            }),
            FilterDesign::Compound(compound) => {
                SavedFilterDesign::Compound(SavedCompoundFilterDesign {
                    id: compound.id.clone(),
                    name: compound.name.clone(),
                    kind: compound.kind,
                    root: compound.root,
                    filters: compound.filters.iter().map(SavedFilterDesign::from).collect(),
                    relations: Vec::new(),
                })
            }
        }
    }
}
