//! Keeps a product/menu listing in an HTML page in step with a published spreadsheet.
//!
//! A load cycle fetches the sheet as CSV (with a deadline), falls back to a JSON backup,
//! normalizes loosely named columns into [`model::CatalogItem`]s and either patches the
//! page's `data-producto-id` elements in place or renders a fresh card grid.

pub mod catalog;
pub mod config;
pub mod index;
pub mod model;
pub mod normalizer;
pub mod page;
pub mod parser;
pub mod pricing;
pub mod reconciler;
pub mod source;

pub use catalog::{CatalogSync, SyncOutcome};
pub use config::{load_config, AppConfig};
pub use page::{Document, Page};
