//! dashfilter - dashboard filter state engine
//!
//! Filters are grouped into buckets keyed by the data sources they touch.
//! [`service::FilterService`] owns the master collection and publishes one
//! change event per mutating operation. Relation groups let a filter on
//! one field be mirrored onto equivalent fields of other tables.

pub mod cli;
pub mod codec;
pub mod collection;
pub mod config;
pub mod datasource;
pub mod design;
pub mod filter;
pub mod relation;
pub mod search;
pub mod service;
