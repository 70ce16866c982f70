//! # Simple Filters
//!
//! A live single-condition filter.

use serde_json::Value;
use uuid::Uuid;

use crate::datasource::{DatabaseMeta, FieldKey, FieldMeta, TableMeta};
use crate::design::{CompoundType, SimpleFilterDesign};
use crate::search::{FilterClause, SearchClauseBuilder};

use super::display;

/// A single `field operator value` filter
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleFilter {
    id: String,
    name: String,
    root: CompoundType,
    datastore: String,
    database: DatabaseMeta,
    table: TableMeta,
    field: FieldMeta,
    operator: String,
    value: Option<Value>,
    relations: Vec<String>,
    clause: FilterClause,
}

impl SimpleFilter {
    /// Build a filter, keeping the design's id and name when present
    pub fn from_design(design: &SimpleFilterDesign, builder: &dyn SearchClauseBuilder) -> Self {
        let clause =
            builder.create_filter_clause(&design.field_key(), &design.operator, design.value.as_ref());
        Self {
            id: design
                .id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            name: design
                .name
                .clone()
                .unwrap_or_else(|| display::simple_name(design)),
            root: design.root,
            datastore: design.datastore.clone(),
            database: design.database.clone(),
            table: design.table.clone(),
            field: design.field.clone(),
            operator: design.operator.clone(),
            value: design.value.clone(),
            relations: Vec::new(),
            clause,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> CompoundType {
        self.root
    }

    pub fn datastore(&self) -> &str {
        &self.datastore
    }

    pub fn database(&self) -> &DatabaseMeta {
        &self.database
    }

    pub fn table(&self) -> &TableMeta {
        &self.table
    }

    pub fn field(&self) -> &FieldMeta {
        &self.field
    }

    pub fn operator(&self) -> &str {
        &self.operator
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn relations(&self) -> &[String] {
        &self.relations
    }

    pub fn clause(&self) -> &FilterClause {
        &self.clause
    }

    pub fn field_key(&self) -> FieldKey {
        FieldKey::new(
            self.datastore.clone(),
            self.database.clone(),
            self.table.clone(),
            self.field.clone(),
        )
    }

    pub(crate) fn add_relation(&mut self, id: &str) {
        if id != self.id && !self.relations.iter().any(|existing| existing == id) {
            self.relations.push(id.to_string());
        }
    }

    pub(crate) fn remove_relation(&mut self, id: &str) {
        self.relations.retain(|existing| existing != id);
    }

    /// Same datastore, database, table, field and operator
    pub fn is_compatible_with(&self, design: &SimpleFilterDesign) -> bool {
        self.datastore == design.datastore
            && self.database.name == design.database.name
            && self.table.name == design.table.name
            && self.field.column_name == design.field.column_name
            && self.operator == design.operator
    }

    /// Compatible and holding the same value
    pub fn is_equivalent_to(&self, design: &SimpleFilterDesign) -> bool {
        self.is_compatible_with(design) && self.value == design.value
    }

    pub(crate) fn is_equivalent_to_filter(&self, other: &SimpleFilter) -> bool {
        self.datastore == other.datastore
            && self.database.name == other.database.name
            && self.table.name == other.table.name
            && self.field.column_name == other.field.column_name
            && self.operator == other.operator
            && self.value == other.value
    }

    pub fn does_affect_search(&self, datastore: &str, database: &str, table: &str) -> bool {
        self.datastore == datastore && self.database.name == database && self.table.name == table
    }

    pub fn to_design(&self) -> SimpleFilterDesign {
        SimpleFilterDesign {
            id: Some(self.id.clone()),
            name: Some(self.name.clone()),
            root: self.root,
            datastore: self.datastore.clone(),
            database: self.database.clone(),
            table: self.table.clone(),
            field: self.field.clone(),
            operator: self.operator.clone(),
            value: self.value.clone(),
        }
    }

    /// Identity-free design with the field swapped for the substitute of the
    /// matching equivalent key. Returns whether a substitution happened.
    pub(crate) fn substituted_design(
        &self,
        equivalent: &[FieldKey],
        substitute: &[FieldKey],
    ) -> (SimpleFilterDesign, bool) {
        let mut design = SimpleFilterDesign {
            id: None,
            name: None,
            ..self.to_design()
        };
        let own = self.field_key();
        let Some(replacement) = equivalent
            .iter()
            .position(|key| key.same_field(&own))
            .and_then(|index| substitute.get(index))
        else {
            return (design, false);
        };
        design.datastore = replacement.datastore.clone();
        design.database = replacement.database.clone();
        design.table = replacement.table.clone();
        design.field = replacement.field.clone();
        (design, true)
    }
}
