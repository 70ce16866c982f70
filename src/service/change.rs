//! # Change Sets
//!
//! Snapshot of the buckets an operation changed.

use serde::Serialize;

use crate::collection::FilterCollection;
use crate::datasource::{are_lists_equivalent, FilterDataSource};
use crate::design::FilterDesign;
use crate::filter::Filter;

/// New contents of one changed bucket
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketChange {
    pub data_sources: Vec<FilterDataSource>,
    pub filters: Vec<FilterDesign>,
}

/// Every bucket whose contents changed, in bucket order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChangeSet {
    entries: Vec<BucketChange>,
}

impl ChangeSet {
    /// Compare two states of the same collection.
    ///
    /// Buckets are append-only, so bucket `i` of `after` is bucket `i` of
    /// `before` when it existed.
    pub(crate) fn between(before: &FilterCollection, after: &FilterCollection) -> Self {
        let previous: Vec<Vec<FilterDesign>> = before
            .iter()
            .map(|(_, filters)| designs(filters))
            .collect();

        let entries = after
            .iter()
            .enumerate()
            .filter_map(|(position, (data_sources, filters))| {
                let current = designs(filters);
                let unchanged = match previous.get(position) {
                    Some(old) => *old == current,
                    None => current.is_empty(),
                };
                (!unchanged).then(|| BucketChange {
                    data_sources: data_sources.to_vec(),
                    filters: current,
                })
            })
            .collect();

        Self { entries }
    }

    /// New designs of a changed bucket
    pub fn get(&self, data_sources: &[FilterDataSource]) -> Option<&[FilterDesign]> {
        self.entries
            .iter()
            .find(|entry| are_lists_equivalent(&entry.data_sources, data_sources))
            .map(|entry| entry.filters.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &BucketChange> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn designs(filters: &[Filter]) -> Vec<FilterDesign> {
    filters.iter().map(Filter::to_design).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::FieldKey;
    use crate::search::JsonClauseBuilder;

    #[test]
    fn test_unchanged_collection_has_no_changes() {
        let mut collection = FilterCollection::new();
        let design = FilterDesign::simple(&FieldKey::named("es", "db", "t", "id"), "=", 1);
        collection.add_filter(Filter::from_design(&design, &JsonClauseBuilder));

        let before = collection.clone();
        collection.find_or_create_key_list(&FilterDesign::simple(
            &FieldKey::named("es", "db", "t", "name"),
            "=",
            "x",
        ));
        assert!(ChangeSet::between(&before, &collection).is_empty());
    }

    #[test]
    fn test_emptied_bucket_is_reported() {
        let mut collection = FilterCollection::new();
        let design = FilterDesign::simple(&FieldKey::named("es", "db", "t", "id"), "=", 1);
        let filter = Filter::from_design(&design, &JsonClauseBuilder);
        let id = filter.id().to_string();
        let data_sources = collection.add_filter(filter);

        let before = collection.clone();
        collection.remove_filter(&id);
        let change = ChangeSet::between(&before, &collection);

        assert_eq!(change.len(), 1);
        assert_eq!(change.get(&data_sources), Some(&[][..]));
    }
}
