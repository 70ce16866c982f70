//! # Data Sources
//!
//! Dataset metadata and the filter data source keys derived from designs.

pub mod key;
pub mod metadata;

pub use key::{
    are_equivalent, are_lists_equivalent, canonical_key, create_key_list_from_design,
    FilterDataSource,
};
pub use metadata::{DatabaseMeta, FieldKey, FieldMeta, TableMeta};
