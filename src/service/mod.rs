//! # Filter Service
//!
//! The transactional surface over the master filter collection.
//!
//! Every mutating operation:
//! 1. Locks the master collection for its whole duration
//! 2. Applies all of its edits
//! 3. Diffs the result against the prior state
//! 4. Publishes exactly one [`FiltersChanged`] event if any bucket changed
//!
//! Removing a filter also removes its relation partners, one level deep.

mod change;
mod events;

pub use change::{BucketChange, ChangeSet};
pub use events::{FilterEventReceiver, FilterEventSender, FiltersChanged, FILTERS_CHANGED};

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::collection::FilterCollection;
use crate::config::{DatasetState, SavedFilterDesign};
use crate::datasource::{are_lists_equivalent, create_key_list_from_design, FilterDataSource};
use crate::design::FilterDesign;
use crate::filter::Filter;
use crate::relation::{RelationGroup, RelationResolver};
use crate::search::SearchClauseBuilder;

use events::Subscribers;

/// Caller id used for changes restored from configuration
pub const CONFIG_CALLER: &str = "config";

/// A design a component follows, with the callback that receives the
/// matching filters
pub struct FilterBehavior<'a> {
    pub design: FilterDesign,
    pub on_change: Box<dyn FnMut(&[Filter]) + 'a>,
}

impl<'a> FilterBehavior<'a> {
    pub fn new(design: FilterDesign, on_change: impl FnMut(&[Filter]) + 'a) -> Self {
        Self {
            design,
            on_change: Box::new(on_change),
        }
    }
}

#[derive(Debug, Default)]
struct ServiceState {
    collection: FilterCollection,
    subscribers: Subscribers,
}

/// Owner of the master filter collection
#[derive(Debug, Default)]
pub struct FilterService {
    state: Mutex<ServiceState>,
}

impl FilterService {
    /// Create a service with an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ServiceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Receive every future change event
    pub fn subscribe(&self) -> FilterEventReceiver {
        self.lock().subscribers.subscribe()
    }

    /// Number of subscribers still listening as of the last publish
    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    /// Run one atomic edit and publish its change set
    fn transact(
        &self,
        caller: &str,
        operation: &str,
        apply: impl FnOnce(&mut FilterCollection),
    ) -> ChangeSet {
        let mut state = self.lock();
        let before = state.collection.clone();
        apply(&mut state.collection);

        let change = ChangeSet::between(&before, &state.collection);
        if change.is_empty() {
            debug!(caller, operation, "Filters unchanged, event suppressed");
            return change;
        }

        let event = FiltersChanged {
            change: change.clone(),
            caller: caller.to_string(),
        };
        let delivered = state.subscribers.publish(&event);
        debug!(caller, operation, buckets = change.len(), delivered, "Filters changed");
        change
    }

    /// Toggle each design: remove an equivalent active filter, or add the
    /// design (with its relation partners) when none is active.
    pub fn toggle_filters(
        &self,
        caller: &str,
        designs: &[FilterDesign],
        relations: &[RelationGroup],
        builder: &dyn SearchClauseBuilder,
    ) -> ChangeSet {
        let resolver = RelationResolver::new(relations, builder);
        self.transact(caller, "toggle", |collection| {
            for design in designs.iter().filter(|design| activatable(design)) {
                let data_sources = create_key_list_from_design(design, false);
                let existing = collection
                    .peek_filters(&data_sources)
                    .iter()
                    .find(|filter| filter.is_equivalent_to_design(design))
                    .map(|filter| filter.id().to_string());

                match existing {
                    Some(id) => remove_with_relations(collection, &id),
                    None => {
                        for filter in resolver.expand(&with_unused_ids(collection, design)) {
                            collection.add_filter(filter);
                        }
                    }
                }
            }
        })
    }

    /// Replace the compatible filters of each added design's bucket, and
    /// remove filters compatible with the designs to delete.
    ///
    /// Deletes are applied first. Filters added earlier in the same call
    /// are never replaced by later ones.
    pub fn exchange_filters(
        &self,
        caller: &str,
        designs_to_add: &[FilterDesign],
        relations: &[RelationGroup],
        builder: &dyn SearchClauseBuilder,
        designs_to_delete: &[FilterDesign],
    ) -> ChangeSet {
        let resolver = RelationResolver::new(relations, builder);
        self.transact(caller, "exchange", |collection| {
            for design in designs_to_delete {
                remove_compatible(collection, design);
            }

            let mut added: HashSet<String> = HashSet::new();
            for design in designs_to_add.iter().filter(|design| activatable(design)) {
                for filter in resolver.expand(&with_unused_ids(collection, design)) {
                    let slot = filter.to_design();
                    let stale: Vec<String> = collection
                        .peek_filters(&filter.data_sources())
                        .iter()
                        .filter(|existing| {
                            !added.contains(existing.id()) && existing.is_compatible_with_design(&slot)
                        })
                        .map(|existing| existing.id().to_string())
                        .collect();
                    for id in &stale {
                        remove_with_relations(collection, id);
                    }
                    added.insert(filter.id().to_string());
                    collection.add_filter(filter);
                }
            }
        })
    }

    /// Remove the filters compatible with a design
    pub fn delete_filter(&self, caller: &str, design: &FilterDesign) -> ChangeSet {
        self.transact(caller, "delete", |collection| {
            remove_compatible(collection, design);
        })
    }

    /// Remove the filters compatible with each design; an empty slice
    /// clears every bucket.
    pub fn delete_filters(&self, caller: &str, designs_to_delete: &[FilterDesign]) -> ChangeSet {
        self.transact(caller, "delete", |collection| {
            if designs_to_delete.is_empty() {
                collection.clear();
                return;
            }
            for design in designs_to_delete {
                remove_compatible(collection, design);
            }
        })
    }

    /// Designs of one bucket, or of every bucket in insertion order
    pub fn get_filters(&self, data_sources: Option<&[FilterDataSource]>) -> Vec<FilterDesign> {
        let state = self.lock();
        match data_sources {
            Some(data_sources) => state
                .collection
                .peek_filters(data_sources)
                .iter()
                .map(Filter::to_design)
                .collect(),
            None => state.collection.all_filters().map(Filter::to_design).collect(),
        }
    }

    /// Copies of every live filter
    pub fn get_raw_filters(&self) -> Vec<Filter> {
        self.lock().collection.all_filters().cloned().collect()
    }

    /// Snapshot of the master collection
    pub fn collection(&self) -> FilterCollection {
        self.lock().collection.clone()
    }

    /// Whether the master collection is filtered; see [`FilterService::is_filtered`]
    pub fn has_filters(&self, design: Option<&FilterDesign>) -> bool {
        Self::is_filtered(&self.lock().collection, design)
    }

    /// Without a design: any bucket holds a filter.
    ///
    /// With a design: its bucket holds a compatible filter. A compound
    /// design whose leaves span several keys also counts as filtered when
    /// each single-key bucket holds exactly as many compatible filters as
    /// the design has leaves on that key.
    pub fn is_filtered(collection: &FilterCollection, design: Option<&FilterDesign>) -> bool {
        let Some(design) = design else {
            return !collection.is_empty();
        };
        if !collection.compatible_filters(design).is_empty() {
            return true;
        }

        let data_sources = create_key_list_from_design(design, false);
        if !matches!(design, FilterDesign::Compound(_)) || data_sources.len() < 2 {
            return false;
        }

        let leaves = design.leaves();
        data_sources.iter().all(|data_source| {
            let group: Vec<_> = leaves
                .iter()
                .filter(|leaf| FilterDataSource::from_design(leaf, false) == *data_source)
                .collect();
            let compatible = collection
                .peek_filters(std::slice::from_ref(data_source))
                .iter()
                .filter(|filter| match filter {
                    Filter::Simple(simple) => group.iter().any(|leaf| simple.is_compatible_with(leaf)),
                    Filter::Compound(_) => false,
                })
                .count();
            compatible == group.len()
        })
    }

    /// Copy master filters compatible with each behavior's design into the
    /// matching bucket of `target`.
    ///
    /// Each distinct bucket is written once, with the union of its
    /// behaviors' filters, and the first behavior registered for it is
    /// called once with the final list, even when it is empty.
    pub fn update_collection_with_global_compatible_filters(
        &self,
        behaviors: &mut [FilterBehavior<'_>],
        target: &mut FilterCollection,
    ) {
        let mut touched: Vec<(Vec<FilterDataSource>, usize, Vec<Filter>)> = Vec::new();
        {
            let state = self.lock();
            for (position, behavior) in behaviors.iter().enumerate() {
                let data_sources = target.find_or_create_key_list(&behavior.design);
                let compatible = state.collection.compatible_filters(&behavior.design);
                match touched
                    .iter_mut()
                    .find(|(existing, _, _)| are_lists_equivalent(existing, &data_sources))
                {
                    Some((_, _, filters)) => {
                        for filter in compatible {
                            if !filters.iter().any(|known| known.id() == filter.id()) {
                                filters.push(filter.clone());
                            }
                        }
                    }
                    None => touched.push((
                        data_sources,
                        position,
                        compatible.into_iter().cloned().collect(),
                    )),
                }
            }
        }

        for (data_sources, position, filters) in touched {
            let snapshot = filters.clone();
            target.set_filters(&data_sources, filters);
            (behaviors[position].on_change)(&snapshot);
        }
    }

    /// Every live filter as a flattened design for configuration
    pub fn get_filters_to_save_in_config(&self) -> Vec<SavedFilterDesign> {
        self.lock()
            .collection
            .all_filters()
            .map(SavedFilterDesign::from_filter)
            .collect()
    }

    /// Replace every live filter with saved designs resolved against the
    /// dataset. Designs that do not resolve are skipped.
    pub fn set_filters_from_config(
        &self,
        designs: &[SavedFilterDesign],
        dataset: &dyn DatasetState,
        builder: &dyn SearchClauseBuilder,
    ) -> ChangeSet {
        self.transact(CONFIG_CALLER, "restore", |collection| {
            collection.clear();
            for saved in designs {
                let Some(design) = saved.resolve(dataset) else {
                    warn!(filter = %saved.describe(), "Skipped saved filter with unknown data source");
                    continue;
                };
                if !activatable(&design) {
                    continue;
                }
                let mut filter = Filter::from_design(&with_unused_ids(collection, &design), builder);
                for id in saved.relations() {
                    filter.add_relation(id);
                }
                collection.add_filter(filter);
            }
        })
    }
}

/// Designs with incomplete data sources are never activated
fn activatable(design: &FilterDesign) -> bool {
    let data_sources = create_key_list_from_design(design, false);
    let complete = !data_sources.is_empty()
        && data_sources
            .iter()
            .all(|data_source| data_source.is_complete(false));
    if !complete {
        warn!(
            filter = design.name().unwrap_or_default(),
            "Skipped filter design with incomplete data source"
        );
    }
    complete
}

/// The design, with its ids dropped when a live filter already uses its id.
///
/// Designs read back through `get_filters` carry the id of the filter they
/// came from; live ids must stay unique for removal by id.
fn with_unused_ids(collection: &FilterCollection, design: &FilterDesign) -> FilterDesign {
    match design.id() {
        Some(id) if collection.find_filter(id).is_some() => design.without_ids(),
        _ => design.clone(),
    }
}

/// Remove every filter compatible with the design
fn remove_compatible(collection: &mut FilterCollection, design: &FilterDesign) {
    let ids: Vec<String> = collection
        .compatible_filters(design)
        .iter()
        .map(|filter| filter.id().to_string())
        .collect();
    for id in &ids {
        remove_with_relations(collection, id);
    }
}

/// Remove a filter and its direct relation partners, then unlink them
fn remove_with_relations(collection: &mut FilterCollection, id: &str) {
    let Some(removed) = collection.remove_filter(id) else {
        return;
    };
    let mut removed_ids = vec![removed.id().to_string()];
    for partner in removed.relations() {
        if collection.remove_filter(partner).is_some() {
            removed_ids.push(partner.clone());
        }
    }
    collection.unlink(&removed_ids);
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

    fn id_filter(value: &str) -> FilterDesign {
        FilterDesign::simple(&field("id"), "=", value)
    }

    #[test]
    fn test_toggle_adds_then_removes() {
        let service = FilterService::new();
        let change = service.toggle_filters("table", &[id_filter("x1")], &[], &JsonClauseBuilder);
        assert_eq!(change.len(), 1);
        assert_eq!(service.get_filters(None).len(), 1);

        let change = service.toggle_filters("table", &[id_filter("x1")], &[], &JsonClauseBuilder);
        assert_eq!(change.len(), 1);
        assert!(change.iter().next().unwrap().filters.is_empty());
        assert!(service.get_filters(None).is_empty());
    }

    #[test]
    fn test_toggle_reused_design_gets_own_id() {
        let service = FilterService::new();
        service.toggle_filters("table", &[id_filter("x1")], &[], &JsonClauseBuilder);

        let FilterDesign::Simple(mut edited) = service.get_filters(None).remove(0) else {
            panic!("expected simple design");
        };
        edited.value = Some(serde_json::json!("x2"));
        let edited = FilterDesign::Simple(edited);

        service.toggle_filters("table", &[edited.clone()], &[], &JsonClauseBuilder);
        let raw = service.get_raw_filters();
        assert_eq!(raw.len(), 2);
        assert_ne!(raw[0].id(), raw[1].id());

        service.toggle_filters("table", &[edited], &[], &JsonClauseBuilder);
        let remaining = service.get_raw_filters();
        assert_eq!(remaining.len(), 1);
        assert!(remaining[0].is_equivalent_to_design(&id_filter("x1")));
    }

    #[test]
    fn test_toggle_different_value_appends() {
        let service = FilterService::new();
        service.toggle_filters("table", &[id_filter("x1")], &[], &JsonClauseBuilder);
        service.toggle_filters("table", &[id_filter("x2")], &[], &JsonClauseBuilder);
        assert_eq!(service.get_filters(None).len(), 2);
    }

    #[test]
    fn test_incomplete_design_is_skipped() {
        let service = FilterService::new();
        let mut rx = service.subscribe();
        let blank = FilterDesign::simple(&FieldKey::named("es", "shop", "items", ""), "=", 1);

        let change = service.toggle_filters("table", &[blank], &[], &JsonClauseBuilder);
        assert!(change.is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_delete_filters_without_designs_clears_all() {
        let service = FilterService::new();
        service.toggle_filters(
            "table",
            &[id_filter("x1"), FilterDesign::simple(&field("size"), ">", 3)],
            &[],
            &JsonClauseBuilder,
        );

        let change = service.delete_filters("table", &[]);
        assert_eq!(change.len(), 2);
        assert!(!service.has_filters(None));
    }

    #[test]
    fn test_exchange_keeps_batch_siblings() {
        let service = FilterService::new();
        service.exchange_filters(
            "table",
            &[id_filter("x1"), id_filter("x2")],
            &[],
            &JsonClauseBuilder,
            &[],
        );
        assert_eq!(service.get_filters(None).len(), 2);

        service.exchange_filters("table", &[id_filter("x3")], &[], &JsonClauseBuilder, &[]);
        let designs = service.get_filters(None);
        assert_eq!(designs.len(), 1);
    }

    #[test]
    fn test_is_filtered_single_bucket() {
        let service = FilterService::new();
        assert!(!service.has_filters(None));
        service.toggle_filters("table", &[id_filter("x1")], &[], &JsonClauseBuilder);

        assert!(service.has_filters(None));
        assert!(service.has_filters(Some(&id_filter("other"))));
        assert!(!service.has_filters(Some(&FilterDesign::simple(&field("id"), "!=", "x1"))));
    }

    #[test]
    fn test_is_filtered_across_buckets_requires_exact_counts() {
        let range = FilterDesign::compound(
            CompoundType::And,
            vec![
                FilterDesign::simple(&field("size"), ">", 10),
                FilterDesign::simple(&field("size"), "<", 20),
            ],
        );
        let service = FilterService::new();
        service.toggle_filters(
            "table",
            &[FilterDesign::simple(&field("size"), ">", 1)],
            &[],
            &JsonClauseBuilder,
        );
        assert!(!service.has_filters(Some(&range)));

        service.toggle_filters(
            "table",
            &[FilterDesign::simple(&field("size"), "<", 5)],
            &[],
            &JsonClauseBuilder,
        );
        assert!(service.has_filters(Some(&range)));

        service.toggle_filters(
            "table",
            &[FilterDesign::simple(&field("size"), "<", 6)],
            &[],
            &JsonClauseBuilder,
        );
        assert!(!service.has_filters(Some(&range)));
    }

    #[test]
    fn test_update_collection_calls_once_per_bucket() {
        let service = FilterService::new();
        service.toggle_filters(
            "table",
            &[id_filter("x1"), id_filter("x2")],
            &[],
            &JsonClauseBuilder,
        );

        let mut first_calls = Vec::new();
        let mut second_calls = 0;
        let mut empty_calls = Vec::new();
        let mut target = FilterCollection::new();
        {
            let mut behaviors = vec![
                FilterBehavior::new(id_filter(""), |filters: &[Filter]| first_calls.push(filters.len())),
                FilterBehavior::new(id_filter("x9"), |_: &[Filter]| second_calls += 1),
                FilterBehavior::new(
                    FilterDesign::simple(&field("size"), ">", 0),
                    |filters: &[Filter]| empty_calls.push(filters.len()),
                ),
            ];
            service.update_collection_with_global_compatible_filters(&mut behaviors, &mut target);
        }

        assert_eq!(first_calls, vec![2]);
        assert_eq!(second_calls, 0);
        assert_eq!(empty_calls, vec![0]);
        assert_eq!(target.all_filters().count(), 2);
    }
}
