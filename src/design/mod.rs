//! # Filter Designs
//!
//! Plain, serializable descriptions of a desired filter. A design has no
//! identity beyond its content until it is materialized into a
//! [`Filter`](crate::filter::Filter).

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::datasource::{DatabaseMeta, FieldKey, FieldMeta, TableMeta};

/// Boolean connective of a compound filter, or the root a filter joins
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompoundType {
    #[default]
    And,
    Or,
}

impl CompoundType {
    /// Lowercase keyword
    pub fn as_str(&self) -> &'static str {
        match self {
            CompoundType::And => "and",
            CompoundType::Or => "or",
        }
    }

    /// Parse a keyword, case-insensitively
    pub fn parse(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_lowercase().as_str() {
            "and" => Some(CompoundType::And),
            "or" => Some(CompoundType::Or),
            _ => None,
        }
    }
}

impl std::fmt::Display for CompoundType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Keeps an explicit `null` as `Some(Value::Null)`; a missing key stays `None`.
pub(crate) fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// A single field/operator/value filter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimpleFilterDesign {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Connective joining this filter with sibling filters on the same source
    #[serde(default)]
    pub root: CompoundType,

    #[serde(default)]
    pub datastore: String,

    #[serde(default)]
    pub database: DatabaseMeta,

    #[serde(default)]
    pub table: TableMeta,

    #[serde(default)]
    pub field: FieldMeta,

    #[serde(default)]
    pub operator: String,

    /// `None` is "no value"; `Some(Value::Null)` is an explicit null
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<Value>,
}

impl SimpleFilterDesign {
    /// Create a design on the given field
    pub fn new(field: &FieldKey, operator: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            id: None,
            name: None,
            root: CompoundType::And,
            datastore: field.datastore.clone(),
            database: field.database.clone(),
            table: field.table.clone(),
            field: field.field.clone(),
            operator: operator.into(),
            value: Some(value.into()),
        }
    }

    /// Set the root connective
    pub fn with_root(mut self, root: CompoundType) -> Self {
        self.root = root;
        self
    }

    /// Drop the value entirely
    pub fn without_value(mut self) -> Self {
        self.value = None;
        self
    }

    /// The field this design targets
    pub fn field_key(&self) -> FieldKey {
        FieldKey::new(
            self.datastore.clone(),
            self.database.clone(),
            self.table.clone(),
            self.field.clone(),
        )
    }
}

/// A boolean combination of nested designs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundFilterDesign {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "type")]
    pub kind: CompoundType,

    #[serde(default)]
    pub root: CompoundType,

    pub filters: Vec<FilterDesign>,
}

/// A filter design: simple or compound
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterDesign {
    Compound(CompoundFilterDesign),
    Simple(SimpleFilterDesign),
}

impl FilterDesign {
    /// Create a simple design on the given field
    pub fn simple(field: &FieldKey, operator: impl Into<String>, value: impl Into<Value>) -> Self {
        FilterDesign::Simple(SimpleFilterDesign::new(field, operator, value))
    }

    /// Create a compound design
    pub fn compound(kind: CompoundType, filters: Vec<FilterDesign>) -> Self {
        FilterDesign::Compound(CompoundFilterDesign {
            id: None,
            name: None,
            kind,
            root: CompoundType::And,
            filters,
        })
    }

    /// Set the root connective
    pub fn with_root(mut self, root: CompoundType) -> Self {
        match &mut self {
            FilterDesign::Simple(simple) => simple.root = root,
            FilterDesign::Compound(compound) => compound.root = root,
        }
        self
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            FilterDesign::Simple(simple) => simple.id.as_deref(),
            FilterDesign::Compound(compound) => compound.id.as_deref(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            FilterDesign::Simple(simple) => simple.name.as_deref(),
            FilterDesign::Compound(compound) => compound.name.as_deref(),
        }
    }

    pub fn root(&self) -> CompoundType {
        match self {
            FilterDesign::Simple(simple) => simple.root,
            FilterDesign::Compound(compound) => compound.root,
        }
    }

    /// All simple designs in the tree, depth first
    pub fn leaves(&self) -> Vec<&SimpleFilterDesign> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, leaves: &mut Vec<&'a SimpleFilterDesign>) {
        match self {
            FilterDesign::Simple(simple) => leaves.push(simple),
            FilterDesign::Compound(compound) => {
                for filter in &compound.filters {
                    filter.collect_leaves(leaves);
                }
            }
        }
    }

    /// Field identities of every leaf, in order, duplicates included
    pub fn leaf_fields(&self) -> Vec<FieldKey> {
        self.leaves().into_iter().map(SimpleFilterDesign::field_key).collect()
    }

    /// Copy of the design without ids at any level; names are kept
    pub fn without_ids(&self) -> FilterDesign {
        match self {
            FilterDesign::Simple(simple) => FilterDesign::Simple(SimpleFilterDesign {
                id: None,
                ..simple.clone()
            }),
            FilterDesign::Compound(compound) => FilterDesign::Compound(CompoundFilterDesign {
                id: None,
                name: compound.name.clone(),
                kind: compound.kind,
                root: compound.root,
                filters: compound.filters.iter().map(FilterDesign::without_ids).collect(),
            }),
        }
    }

    /// Copy of the design without ids or names at any level
    pub fn without_identity(&self) -> FilterDesign {
        match self {
            FilterDesign::Simple(simple) => FilterDesign::Simple(SimpleFilterDesign {
                id: None,
                name: None,
                ..simple.clone()
            }),
            FilterDesign::Compound(compound) => FilterDesign::Compound(CompoundFilterDesign {
                id: None,
                name: None,
                kind: compound.kind,
                root: compound.root,
                filters: compound
                    .filters
                    .iter()
                    .map(FilterDesign::without_identity)
                    .collect(),
            }),
        }
    }
}

impl From<SimpleFilterDesign> for FilterDesign {
    fn from(design: SimpleFilterDesign) -> Self {
        FilterDesign::Simple(design)
    }
}

impl From<CompoundFilterDesign> for FilterDesign {
    fn from(design: CompoundFilterDesign) -> Self {
        FilterDesign::Compound(design)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn size() -> FieldKey {
        FieldKey::named("es", "shop", "items", "size")
    }

    #[test]
    fn test_explicit_null_differs_from_missing_value() {
        let with_null: SimpleFilterDesign = serde_json::from_value(json!({
            "field": {"column_name": "size"},
            "operator": "=",
            "value": null
        }))
        .unwrap();
        let without: SimpleFilterDesign = serde_json::from_value(json!({
            "field": {"column_name": "size"},
            "operator": "="
        }))
        .unwrap();

        assert_eq!(with_null.value, Some(Value::Null));
        assert_eq!(without.value, None);
    }

    #[test]
    fn test_untagged_parses_compound_and_simple() {
        let design: FilterDesign = serde_json::from_value(json!({
            "type": "or",
            "filters": [
                {"field": {"column_name": "a"}, "operator": "=", "value": 1},
                {"field": {"column_name": "b"}, "operator": "=", "value": 2}
            ]
        }))
        .unwrap();

        match design {
            FilterDesign::Compound(compound) => {
                assert_eq!(compound.kind, CompoundType::Or);
                assert_eq!(compound.root, CompoundType::And);
                assert_eq!(compound.filters.len(), 2);
            }
            FilterDesign::Simple(_) => panic!("expected compound design"),
        }
    }

    #[test]
    fn test_serialize_round_trip() {
        let design = FilterDesign::compound(
            CompoundType::And,
            vec![
                FilterDesign::simple(&size(), ">", 10),
                FilterDesign::simple(&size(), "<", 20).with_root(CompoundType::Or),
            ],
        );
        let text = serde_json::to_string(&design).unwrap();
        let parsed: FilterDesign = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, design);
    }

    #[test]
    fn test_leaves_depth_first() {
        let design = FilterDesign::compound(
            CompoundType::Or,
            vec![
                FilterDesign::simple(&size(), "=", 1),
                FilterDesign::compound(
                    CompoundType::And,
                    vec![
                        FilterDesign::simple(&size(), ">", 2),
                        FilterDesign::simple(&size(), "<", 3),
                    ],
                ),
            ],
        );
        let operators: Vec<&str> = design.leaves().iter().map(|l| l.operator.as_str()).collect();
        assert_eq!(operators, vec!["=", ">", "<"]);
    }

    #[test]
    fn test_without_ids_keeps_names() {
        let mut inner = SimpleFilterDesign::new(&size(), ">", 1);
        inner.id = Some("leaf".to_string());
        inner.name = Some("Big".to_string());
        let design = FilterDesign::Compound(CompoundFilterDesign {
            id: Some("outer".to_string()),
            name: Some("Range".to_string()),
            kind: CompoundType::And,
            root: CompoundType::And,
            filters: vec![inner.into()],
        });

        let stripped = design.without_ids();
        assert_eq!(stripped.id(), None);
        assert_eq!(stripped.name(), Some("Range"));
        assert_eq!(stripped.leaves()[0].id, None);
        assert_eq!(stripped.leaves()[0].name.as_deref(), Some("Big"));
    }

    #[test]
    fn test_compound_type_parse() {
        assert_eq!(CompoundType::parse("AND"), Some(CompoundType::And));
        assert_eq!(CompoundType::parse("or"), Some(CompoundType::Or));
        assert_eq!(CompoundType::parse("xor"), None);
    }
}
