//! # Filter Data Source Keys
//!
//! The `(datastore, database, table, field, operator)` identity used to
//! bucket filters, and the equivalence rules between keys and key lists.

use serde::{Deserialize, Serialize};

use crate::design::{FilterDesign, SimpleFilterDesign};

/// Identity tuple of one filter clause
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterDataSource {
    pub datastore: String,
    pub database: String,
    pub table: String,
    pub field: String,
    pub operator: String,
}

impl FilterDataSource {
    /// Create a key from raw names
    pub fn new(
        datastore: impl Into<String>,
        database: impl Into<String>,
        table: impl Into<String>,
        field: impl Into<String>,
        operator: impl Into<String>,
    ) -> Self {
        Self {
            datastore: datastore.into(),
            database: database.into(),
            table: table.into(),
            field: field.into(),
            operator: operator.into(),
        }
    }

    /// Key of a simple design; the operator is blanked when ignored
    pub fn from_design(design: &SimpleFilterDesign, ignore_operator: bool) -> Self {
        Self {
            datastore: design.datastore.clone(),
            database: design.database.name.clone(),
            table: design.table.name.clone(),
            field: design.field.column_name.clone(),
            operator: if ignore_operator {
                String::new()
            } else {
                design.operator.clone()
            },
        }
    }

    /// Database, table and field are set, and the operator too unless ignored.
    ///
    /// Incomplete keys never match anything, including themselves.
    pub fn is_complete(&self, ignore_operator: bool) -> bool {
        !self.database.is_empty()
            && !self.table.is_empty()
            && !self.field.is_empty()
            && (ignore_operator || !self.operator.is_empty())
    }

    fn fields(&self) -> [&str; 5] {
        [
            self.datastore.as_str(),
            self.database.as_str(),
            self.table.as_str(),
            self.field.as_str(),
            self.operator.as_str(),
        ]
    }
}

impl std::fmt::Display for FilterDataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{}.{}.{} {}",
            self.datastore, self.database, self.table, self.field, self.operator
        )
    }
}

/// Field-by-field comparison, optionally ignoring the operator
pub fn are_equivalent(a: &FilterDataSource, b: &FilterDataSource, ignore_operator: bool) -> bool {
    a.is_complete(ignore_operator)
        && b.is_complete(ignore_operator)
        && a.datastore == b.datastore
        && a.database == b.database
        && a.table == b.table
        && a.field == b.field
        && (ignore_operator || a.operator == b.operator)
}

/// Multiset equality of two key lists, independent of order
pub fn are_lists_equivalent(a: &[FilterDataSource], b: &[FilterDataSource]) -> bool {
    match (canonical_key(a), canonical_key(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Order-independent serialization of a key list.
///
/// Returns `None` when any key is incomplete, since such a list can never
/// be looked up again.
pub fn canonical_key(list: &[FilterDataSource]) -> Option<String> {
    if !list.iter().all(|key| key.is_complete(false)) {
        return None;
    }
    let mut keys: Vec<[&str; 5]> = list.iter().map(FilterDataSource::fields).collect();
    keys.sort_unstable();
    serde_json::to_string(&keys).ok()
}

/// Derive the key list of a design.
///
/// Compound designs contribute one key per distinct clause identity across
/// all nested simple designs.
pub fn create_key_list_from_design(
    design: &FilterDesign,
    ignore_operator: bool,
) -> Vec<FilterDataSource> {
    let mut keys = Vec::new();
    for leaf in design.leaves() {
        let key = FilterDataSource::from_design(leaf, ignore_operator);
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}
