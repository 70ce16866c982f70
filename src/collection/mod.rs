//! # Filter Collection
//!
//! Buckets of live filters keyed by their data source key list.
//!
//! Key lists are matched structurally (as multisets), through a canonical
//! string index. Reading a key list that has no bucket yet allocates an
//! empty one, so lookups never come back with "nothing", only with an
//! empty slice. Key lists containing incomplete keys are never indexed and
//! therefore always land in a fresh bucket.

use std::collections::HashMap;

use tracing::trace;

use crate::datasource::{canonical_key, create_key_list_from_design, FilterDataSource};
use crate::design::FilterDesign;
use crate::filter::Filter;

/// One key list and its filters
#[derive(Debug, Clone)]
struct Bucket {
    data_sources: Vec<FilterDataSource>,
    filters: Vec<Filter>,
}

/// Store of live filters bucketed by key list
#[derive(Debug, Clone, Default)]
pub struct FilterCollection {
    /// Buckets in insertion order
    buckets: Vec<Bucket>,

    /// Canonical key list -> bucket position
    index: HashMap<String, usize>,
}

impl FilterCollection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, data_sources: &[FilterDataSource]) -> Option<usize> {
        canonical_key(data_sources).and_then(|key| self.index.get(&key).copied())
    }

    fn allocate(&mut self, data_sources: &[FilterDataSource]) -> usize {
        let position = self.buckets.len();
        self.buckets.push(Bucket {
            data_sources: data_sources.to_vec(),
            filters: Vec::new(),
        });
        if let Some(key) = canonical_key(data_sources) {
            self.index.insert(key, position);
        }
        trace!(position, keys = data_sources.len(), "Allocated filter bucket");
        position
    }

    fn position_or_allocate(&mut self, data_sources: &[FilterDataSource]) -> usize {
        match self.position(data_sources) {
            Some(position) => position,
            None => self.allocate(data_sources),
        }
    }

    /// Stored key list equivalent to the design's keys, allocating a bucket
    /// when none exists yet
    pub fn find_or_create_key_list(&mut self, design: &FilterDesign) -> Vec<FilterDataSource> {
        let data_sources = create_key_list_from_design(design, false);
        let position = self.position_or_allocate(&data_sources);
        self.buckets[position].data_sources.clone()
    }

    /// Filters of a key list, allocating an empty bucket on first access
    pub fn get_filters(&mut self, data_sources: &[FilterDataSource]) -> &[Filter] {
        let position = self.position_or_allocate(data_sources);
        &self.buckets[position].filters
    }

    /// Filters of a key list without allocating
    pub fn peek_filters(&self, data_sources: &[FilterDataSource]) -> &[Filter] {
        match self.position(data_sources) {
            Some(position) => &self.buckets[position].filters,
            None => &[],
        }
    }

    /// Replace the filters of a key list; returns the stored key list
    pub fn set_filters(
        &mut self,
        data_sources: &[FilterDataSource],
        filters: Vec<Filter>,
    ) -> Vec<FilterDataSource> {
        let position = self.position_or_allocate(data_sources);
        let bucket = &mut self.buckets[position];
        bucket.filters = filters;
        bucket.data_sources.clone()
    }

    /// Append a filter to the bucket of its own key list
    pub fn add_filter(&mut self, filter: Filter) -> Vec<FilterDataSource> {
        let data_sources = filter.data_sources();
        let position = self.position_or_allocate(&data_sources);
        let bucket = &mut self.buckets[position];
        bucket.filters.push(filter);
        bucket.data_sources.clone()
    }

    /// Every stored key list in insertion order
    pub fn get_all_data_sources(&self) -> Vec<Vec<FilterDataSource>> {
        self.buckets
            .iter()
            .map(|bucket| bucket.data_sources.clone())
            .collect()
    }

    /// Buckets in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&[FilterDataSource], &[Filter])> {
        self.buckets
            .iter()
            .map(|bucket| (bucket.data_sources.as_slice(), bucket.filters.as_slice()))
    }

    /// Every filter across all buckets, in bucket order
    pub fn all_filters(&self) -> impl Iterator<Item = &Filter> {
        self.buckets.iter().flat_map(|bucket| bucket.filters.iter())
    }

    /// Filters in the design's bucket that are compatible with it
    pub fn compatible_filters(&self, design: &FilterDesign) -> Vec<&Filter> {
        let data_sources = create_key_list_from_design(design, false);
        self.peek_filters(&data_sources)
            .iter()
            .filter(|filter| filter.is_compatible_with_design(design))
            .collect()
    }

    /// Find a top-level filter by id
    pub fn find_filter(&self, id: &str) -> Option<&Filter> {
        self.all_filters().find(|filter| filter.id() == id)
    }

    /// Remove a top-level filter by id
    pub fn remove_filter(&mut self, id: &str) -> Option<Filter> {
        for bucket in &mut self.buckets {
            if let Some(position) = bucket.filters.iter().position(|filter| filter.id() == id) {
                return Some(bucket.filters.remove(position));
            }
        }
        None
    }

    /// Drop the given ids from every filter's relation list
    pub fn unlink(&mut self, ids: &[String]) {
        for bucket in &mut self.buckets {
            for filter in &mut bucket.filters {
                for id in ids {
                    filter.remove_relation(id);
                }
            }
        }
    }

    /// Empty every bucket, keeping the key lists
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.filters.clear();
        }
    }

    /// True if no bucket holds a filter
    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(|bucket| bucket.filters.is_empty())
    }

    /// Number of buckets, empty ones included
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::FieldKey;
    use crate::design::CompoundType;
    use crate::search::JsonClauseBuilder;

    fn field(name: &str) -> FieldKey {
        FieldKey::named("es", "shop", "items", name)
    }

    fn key(field: &str, operator: &str) -> FilterDataSource {
        FilterDataSource::new("es", "shop", "items", field, operator)
    }

    fn range() -> FilterDesign {
        FilterDesign::compound(
            CompoundType::And,
            vec![
                FilterDesign::simple(&field("size"), ">", 10),
                FilterDesign::simple(&field("size"), "<", 20),
            ],
        )
    }

    #[test]
    fn test_read_allocates_bucket() {
        let mut collection = FilterCollection::new();
        assert!(collection.get_filters(&[key("id", "=")]).is_empty());
        assert_eq!(collection.get_all_data_sources(), vec![vec![key("id", "=")]]);
    }

    #[test]
    fn test_peek_does_not_allocate() {
        let collection = FilterCollection::new();
        assert!(collection.peek_filters(&[key("id", "=")]).is_empty());
        assert_eq!(collection.bucket_count(), 0);
    }

    #[test]
    fn test_equivalent_key_lists_share_bucket() {
        let mut collection = FilterCollection::new();
        let stored = collection.find_or_create_key_list(&range());
        let again = collection.find_or_create_key_list(&range());
        assert_eq!(stored, again);
        assert_eq!(collection.bucket_count(), 1);

        let reversed = vec![key("size", "<"), key("size", ">")];
        let filter = Filter::from_design(&range(), &JsonClauseBuilder);
        let returned = collection.set_filters(&reversed, vec![filter]);
        assert_eq!(returned, stored);
        assert_eq!(collection.peek_filters(&stored).len(), 1);
        assert_eq!(collection.bucket_count(), 1);
    }

    #[test]
    fn test_incomplete_keys_always_allocate() {
        let mut collection = FilterCollection::new();
        let blank = vec![key("", "=")];
        collection.get_filters(&blank);
        collection.get_filters(&blank);
        assert_eq!(collection.bucket_count(), 2);
    }

    #[test]
    fn test_add_and_remove_filter() {
        let mut collection = FilterCollection::new();
        let filter = Filter::from_design(&FilterDesign::simple(&field("id"), "=", "x1"), &JsonClauseBuilder);
        let id = filter.id().to_string();

        let stored = collection.add_filter(filter);
        assert_eq!(stored, vec![key("id", "=")]);
        assert!(collection.find_filter(&id).is_some());

        assert!(collection.remove_filter(&id).is_some());
        assert!(collection.remove_filter(&id).is_none());
        assert!(collection.is_empty());
        assert_eq!(collection.bucket_count(), 1);
    }

    #[test]
    fn test_compatible_filters() {
        let mut collection = FilterCollection::new();
        collection.add_filter(Filter::from_design(&range(), &JsonClauseBuilder));
        assert_eq!(collection.compatible_filters(&range()).len(), 1);

        let or_range = FilterDesign::compound(
            CompoundType::Or,
            vec![
                FilterDesign::simple(&field("size"), ">", 1),
                FilterDesign::simple(&field("size"), "<", 2),
            ],
        );
        assert!(collection.compatible_filters(&or_range).is_empty());
    }

    #[test]
    fn test_clear_keeps_key_lists() {
        let mut collection = FilterCollection::new();
        collection.add_filter(Filter::from_design(&range(), &JsonClauseBuilder));
        collection.clear();
        assert!(collection.is_empty());
        assert_eq!(collection.get_all_data_sources().len(), 1);
    }
}
