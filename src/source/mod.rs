// Source loading: fetcher port, HTTP fetcher, primary/backup loader.

pub mod fetcher;
pub mod loader;
pub mod traits;

pub use fetcher::HttpFetcher;
pub use loader::{csv_export_url, SourceLoader};
pub use traits::Fetcher;
