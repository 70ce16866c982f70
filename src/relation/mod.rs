//! # Relation Resolver
//!
//! Mirrors activated filters onto related fields of other data sources.
//!
//! A relation group lists interchangeable field-key lists. When one list of
//! a group is fully covered by a design's leaf fields, the design is
//! substituted onto every other list of the group. Only one substitution
//! level is applied per group.

use tracing::debug;

use crate::datasource::{are_lists_equivalent, FieldKey, FilterDataSource};
use crate::design::FilterDesign;
use crate::filter::Filter;
use crate::search::SearchClauseBuilder;

/// Interchangeable field-key lists
pub type RelationGroup = Vec<Vec<FieldKey>>;

/// Expands designs into primary filters plus their relation partners
pub struct RelationResolver<'a> {
    relations: &'a [RelationGroup],
    builder: &'a dyn SearchClauseBuilder,
}

impl<'a> RelationResolver<'a> {
    pub fn new(relations: &'a [RelationGroup], builder: &'a dyn SearchClauseBuilder) -> Self {
        Self { relations, builder }
    }

    /// Primary filter first, then one substitute per related field list.
    ///
    /// All returned filters are linked to each other through their
    /// relation ids.
    pub fn expand(&self, design: &FilterDesign) -> Vec<Filter> {
        let primary = Filter::from_design(design, self.builder);
        let leaf_fields = design.leaf_fields();
        let mut filters = vec![primary];

        for group in self.relations {
            let Some(matched) = group.iter().position(|list| covers(&leaf_fields, list)) else {
                continue;
            };
            for (position, substitute) in group.iter().enumerate() {
                if position == matched {
                    continue;
                }
                match filters[0].create_relation_filter(&group[matched], substitute, self.builder) {
                    Some(filter) => filters.push(filter),
                    None => debug!(
                        filter = filters[0].name(),
                        substitute = position,
                        "Skipped relation substitution"
                    ),
                }
            }
        }

        link(&mut filters);
        filters
    }

    /// Expand every design and group the resulting filters by key list
    pub fn expand_with_relations(
        &self,
        designs: &[FilterDesign],
    ) -> Vec<(Vec<FilterDataSource>, Vec<Filter>)> {
        let mut grouped: Vec<(Vec<FilterDataSource>, Vec<Filter>)> = Vec::new();
        for design in designs {
            for filter in self.expand(design) {
                let data_sources = filter.data_sources();
                match grouped
                    .iter_mut()
                    .find(|(existing, _)| are_lists_equivalent(existing, &data_sources))
                {
                    Some((_, filters)) => filters.push(filter),
                    None => grouped.push((data_sources, vec![filter])),
                }
            }
        }
        grouped
    }
}

/// Every key of the list matches one of the design's leaf fields
fn covers(leaf_fields: &[FieldKey], list: &[FieldKey]) -> bool {
    !list.is_empty()
        && list
            .iter()
            .all(|key| leaf_fields.iter().any(|leaf| leaf.same_field(key)))
}

/// Link every filter to every other one
fn link(filters: &mut [Filter]) {
    let ids: Vec<String> = filters.iter().map(|filter| filter.id().to_string()).collect();
    for filter in filters.iter_mut() {
        for id in &ids {
            filter.add_relation(id);
        }
    }
}
