//! # Search Clauses
//!
//! The seam to the query payload builders. Filters hold the clause built for
//! them but never inspect it.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::datasource::FieldKey;
use crate::design::CompoundType;

/// Opaque query clause produced by a [`SearchClauseBuilder`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterClause(Value);

impl FilterClause {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_json(&self) -> &Value {
        &self.0
    }

    pub fn into_json(self) -> Value {
        self.0
    }
}

/// Builds the query clauses for filter leaves and combinations
pub trait SearchClauseBuilder {
    /// Clause for a single `field operator value` condition
    fn create_filter_clause(
        &self,
        field: &FieldKey,
        operator: &str,
        value: Option<&Value>,
    ) -> FilterClause;

    /// Clause combining nested clauses with a boolean connective
    fn create_compound_filter_clause(
        &self,
        clauses: Vec<FilterClause>,
        kind: CompoundType,
    ) -> FilterClause;
}

/// Builds clauses as plain JSON objects
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonClauseBuilder;

impl SearchClauseBuilder for JsonClauseBuilder {
    fn create_filter_clause(
        &self,
        field: &FieldKey,
        operator: &str,
        value: Option<&Value>,
    ) -> FilterClause {
        FilterClause::new(json!({
            "field": field.field.column_name,
            "operator": operator,
            "value": value.cloned().unwrap_or(Value::Null),
        }))
    }

    fn create_compound_filter_clause(
        &self,
        clauses: Vec<FilterClause>,
        kind: CompoundType,
    ) -> FilterClause {
        FilterClause::new(json!({
            "type": kind.as_str(),
            "filters": clauses.into_iter().map(FilterClause::into_json).collect::<Vec<_>>(),
        }))
    }
}
