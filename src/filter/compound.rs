//! # Compound Filters
//!
//! A live boolean combination of nested filters.

use uuid::Uuid;

use crate::datasource::FieldKey;
use crate::design::{CompoundFilterDesign, CompoundType};
use crate::search::{FilterClause, SearchClauseBuilder};

use super::{display, matches_unordered, Filter};

/// An `and`/`or` combination of nested filters
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundFilter {
    id: String,
    name: String,
    kind: CompoundType,
    root: CompoundType,
    filters: Vec<Filter>,
    relations: Vec<String>,
    clause: FilterClause,
}

impl CompoundFilter {
    /// Build the filter tree, keeping the design's id and name when present
    pub fn from_design(design: &CompoundFilterDesign, builder: &dyn SearchClauseBuilder) -> Self {
        let filters: Vec<Filter> = design
            .filters
            .iter()
            .map(|child| Filter::from_design(child, builder))
            .collect();
        let clause = builder.create_compound_filter_clause(
            filters.iter().map(|child| child.clause().clone()).collect(),
            design.kind,
        );
        let name = design
            .name
            .clone()
            .unwrap_or_else(|| display::compound_name(design.kind, filters.iter().map(Filter::name)));

        Self {
            id: design
                .id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            name,
            kind: design.kind,
            root: design.root,
            filters,
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

    pub fn kind(&self) -> CompoundType {
        self.kind
    }

    pub fn root(&self) -> CompoundType {
        self.root
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn relations(&self) -> &[String] {
        &self.relations
    }

    pub fn clause(&self) -> &FilterClause {
        &self.clause
    }

    pub(crate) fn add_relation(&mut self, id: &str) {
        if id != self.id && !self.relations.iter().any(|existing| existing == id) {
            self.relations.push(id.to_string());
        }
    }

    pub(crate) fn remove_relation(&mut self, id: &str) {
        self.relations.retain(|existing| existing != id);
    }

    /// Same type, same root, and a one-to-one compatible pairing of children
    pub fn is_compatible_with(&self, design: &CompoundFilterDesign) -> bool {
        self.kind == design.kind
            && self.root == design.root
            && matches_unordered(&self.filters, &design.filters, |filter, child| {
                filter.is_compatible_with_design(child)
            })
    }

    pub fn is_equivalent_to(&self, design: &CompoundFilterDesign) -> bool {
        self.kind == design.kind
            && self.root == design.root
            && matches_unordered(&self.filters, &design.filters, |filter, child| {
                filter.is_equivalent_to_design(child)
            })
    }

    pub(crate) fn is_equivalent_to_filter(&self, other: &CompoundFilter) -> bool {
        self.kind == other.kind
            && self.root == other.root
            && matches_unordered(&self.filters, &other.filters, |a, b| a.is_equivalent_to_filter(b))
    }

    pub fn does_affect_search(&self, datastore: &str, database: &str, table: &str) -> bool {
        self.filters
            .iter()
            .any(|filter| filter.does_affect_search(datastore, database, table))
    }

    pub fn to_design(&self) -> CompoundFilterDesign {
        CompoundFilterDesign {
            id: Some(self.id.clone()),
            name: Some(self.name.clone()),
            kind: self.kind,
            root: self.root,
            filters: self.filters.iter().map(Filter::to_design).collect(),
        }
    }

    pub(crate) fn substituted_design(
        &self,
        equivalent: &[FieldKey],
        substitute: &[FieldKey],
    ) -> (CompoundFilterDesign, bool) {
        let mut substituted = true;
        let filters = self
            .filters
            .iter()
            .map(|filter| {
                let (design, changed) = filter.substituted_design(equivalent, substitute);
                substituted &= changed;
                design
            })
            .collect();
        let design = CompoundFilterDesign {
            id: None,
            name: None,
            kind: self.kind,
            root: self.root,
            filters,
        };
        (design, substituted)
    }
}
