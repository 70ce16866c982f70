//! # Configuration
//!
//! Saving and restoring filters, and the dashboard configuration file that
//! supplies dataset metadata and relation groups.

pub mod dataset;
pub mod errors;
pub mod saved;

pub use dataset::{DashboardConfig, DatabaseConfig, DatasetState, DatastoreConfig, TableConfig};
pub use errors::{ConfigError, ConfigResult};
pub use saved::{SavedCompoundFilterDesign, SavedFilterDesign, SavedSimpleFilterDesign};
