//! # Filter Instances
//!
//! Live filters built from designs. A filter's shape (type tree, field and
//! operator per node) is fixed at creation; only its relation links change.
//!
//! Equality helpers here are structural:
//! - *compatible*: same shape, values ignored
//! - *equivalent*: compatible and equal values at every leaf
//!
//! Values compare as JSON values, so `0`, `""`, `false`, `null` and a
//! missing value are all distinct.

mod compound;
mod display;
mod simple;

pub use compound::CompoundFilter;
pub use simple::SimpleFilter;

use crate::datasource::{create_key_list_from_design, FieldKey, FilterDataSource};
use crate::design::{CompoundType, FilterDesign};
use crate::search::{FilterClause, SearchClauseBuilder};

/// A live filter: simple or compound
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Simple(SimpleFilter),
    Compound(CompoundFilter),
}

impl Filter {
    /// Build a filter tree mirroring the design
    pub fn from_design(design: &FilterDesign, builder: &dyn SearchClauseBuilder) -> Self {
        match design {
            FilterDesign::Simple(simple) => Filter::Simple(SimpleFilter::from_design(simple, builder)),
            FilterDesign::Compound(compound) => {
                Filter::Compound(CompoundFilter::from_design(compound, builder))
            }
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Filter::Simple(simple) => simple.id(),
            Filter::Compound(compound) => compound.id(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Filter::Simple(simple) => simple.name(),
            Filter::Compound(compound) => compound.name(),
        }
    }

    pub fn root(&self) -> CompoundType {
        match self {
            Filter::Simple(simple) => simple.root(),
            Filter::Compound(compound) => compound.root(),
        }
    }

    /// Ids of the filters this one is kept in sync with
    pub fn relations(&self) -> &[String] {
        match self {
            Filter::Simple(simple) => simple.relations(),
            Filter::Compound(compound) => compound.relations(),
        }
    }

    pub fn clause(&self) -> &FilterClause {
        match self {
            Filter::Simple(simple) => simple.clause(),
            Filter::Compound(compound) => compound.clause(),
        }
    }

    pub(crate) fn add_relation(&mut self, id: &str) {
        match self {
            Filter::Simple(simple) => simple.add_relation(id),
            Filter::Compound(compound) => compound.add_relation(id),
        }
    }

    pub(crate) fn remove_relation(&mut self, id: &str) {
        match self {
            Filter::Simple(simple) => simple.remove_relation(id),
            Filter::Compound(compound) => compound.remove_relation(id),
        }
    }

    /// All simple filters in the tree, depth first
    pub fn leaves(&self) -> Vec<&SimpleFilter> {
        match self {
            Filter::Simple(simple) => vec![simple],
            Filter::Compound(compound) => compound
                .filters()
                .iter()
                .flat_map(Filter::leaves)
                .collect(),
        }
    }

    /// Key list of the bucket this filter belongs to
    pub fn data_sources(&self) -> Vec<FilterDataSource> {
        create_key_list_from_design(&self.to_design(), false)
    }

    /// Structural match against a design, ignoring values
    pub fn is_compatible_with_design(&self, design: &FilterDesign) -> bool {
        match (self, design) {
            (Filter::Simple(filter), FilterDesign::Simple(design)) => filter.is_compatible_with(design),
            (Filter::Compound(filter), FilterDesign::Compound(design)) => {
                filter.is_compatible_with(design)
            }
            _ => false,
        }
    }

    /// Structural match against a design including every leaf value
    pub fn is_equivalent_to_design(&self, design: &FilterDesign) -> bool {
        match (self, design) {
            (Filter::Simple(filter), FilterDesign::Simple(design)) => filter.is_equivalent_to(design),
            (Filter::Compound(filter), FilterDesign::Compound(design)) => {
                filter.is_equivalent_to(design)
            }
            _ => false,
        }
    }

    /// Structural match against another filter including every leaf value
    pub fn is_equivalent_to_filter(&self, other: &Filter) -> bool {
        match (self, other) {
            (Filter::Simple(a), Filter::Simple(b)) => a.is_equivalent_to_filter(b),
            (Filter::Compound(a), Filter::Compound(b)) => a.is_equivalent_to_filter(b),
            _ => false,
        }
    }

    /// True if any leaf targets the given datastore, database and table
    pub fn does_affect_search(&self, datastore: &str, database: &str, table: &str) -> bool {
        match self {
            Filter::Simple(simple) => simple.does_affect_search(datastore, database, table),
            Filter::Compound(compound) => compound.does_affect_search(datastore, database, table),
        }
    }

    /// Build a copy of this filter moved onto related fields.
    ///
    /// Each leaf whose field matches `equivalent[i]` is moved onto
    /// `substitute[i]`. Returns `None` when the lists differ in length, a
    /// substitute is the unset field, or no leaf matched at all.
    ///
    /// A compound filter takes either one substitute key or one per leaf,
    /// and every leaf must be moved.
    pub fn create_relation_filter(
        &self,
        equivalent: &[FieldKey],
        substitute: &[FieldKey],
        builder: &dyn SearchClauseBuilder,
    ) -> Option<Filter> {
        if equivalent.len() != substitute.len() || substitute.iter().any(FieldKey::is_unset) {
            return None;
        }
        if let Filter::Compound(_) = self {
            let leaves = self.leaves().len();
            if leaves == 0 || (substitute.len() != 1 && substitute.len() != leaves) {
                return None;
            }
        }
        let (design, substituted) = self.substituted_design(equivalent, substitute);
        if !substituted {
            return None;
        }
        Some(Filter::from_design(&design, builder))
    }

    fn substituted_design(
        &self,
        equivalent: &[FieldKey],
        substitute: &[FieldKey],
    ) -> (FilterDesign, bool) {
        match self {
            Filter::Simple(simple) => {
                let (design, changed) = simple.substituted_design(equivalent, substitute);
                (FilterDesign::Simple(design), changed)
            }
            Filter::Compound(compound) => {
                let (design, changed) = compound.substituted_design(equivalent, substitute);
                (FilterDesign::Compound(design), changed)
            }
        }
    }

    /// Inverse of construction, preserving id, name, root and values
    pub fn to_design(&self) -> FilterDesign {
        match self {
            Filter::Simple(simple) => FilterDesign::Simple(simple.to_design()),
            Filter::Compound(compound) => FilterDesign::Compound(compound.to_design()),
        }
    }
}

/// One-to-one pairing of `left` with `right` in any order.
///
/// Greedy assignment is enough because both predicates used here are
/// equivalence relations.
pub(crate) fn matches_unordered<A, B>(
    left: &[A],
    right: &[B],
    matches: impl Fn(&A, &B) -> bool,
) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let mut used = vec![false; right.len()];
    for item in left {
        let found = right
            .iter()
            .enumerate()
            .find(|(index, candidate)| !used[*index] && matches(item, *candidate))
            .map(|(index, _)| index);
        match found {
            Some(index) => used[index] = true,
            None => return false,
        }
    }
    true
}
