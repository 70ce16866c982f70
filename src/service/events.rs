//! # Filter Events
//!
//! Change notifications published by the filter service.

use serde::Serialize;
use tokio::sync::mpsc;

use super::change::ChangeSet;

/// Topic of every filter change event
pub const FILTERS_CHANGED: &str = "FILTERS_CHANGED";

/// Published once per operation that changed at least one bucket
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FiltersChanged {
    /// Every bucket whose contents changed, with its new designs
    pub change: ChangeSet,

    /// Identifier of the component that requested the change
    pub caller: String,
}

impl FiltersChanged {
    pub fn topic(&self) -> &'static str {
        FILTERS_CHANGED
    }
}

/// Event sender for a subscriber
pub type FilterEventSender = mpsc::UnboundedSender<FiltersChanged>;

/// Event receiver for a subscriber
pub type FilterEventReceiver = mpsc::UnboundedReceiver<FiltersChanged>;

/// Fan-out of change events to subscribers
#[derive(Debug, Default)]
pub(crate) struct Subscribers {
    senders: Vec<FilterEventSender>,
}

impl Subscribers {
    pub(crate) fn subscribe(&mut self) -> FilterEventReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.push(tx);
        rx
    }

    /// Deliver to every live subscriber, dropping closed ones.
    /// Returns the number of deliveries.
    pub(crate) fn publish(&mut self, event: &FiltersChanged) -> usize {
        self.senders.retain(|sender| sender.send(event.clone()).is_ok());
        self.senders.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.senders.len()
    }
}
