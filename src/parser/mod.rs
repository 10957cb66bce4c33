// Tabular parsing: parser port, CSV adapter and the lazily loaded shared instance.

pub mod csv_parser;
pub mod lazy;

pub use csv_parser::CsvTableParser;
pub use lazy::LazyParser;

use crate::model::{RawRecord, SourceError};

/// Turns delimited text into rows keyed by the header row. Blank rows are skipped.
pub trait TableParser: Send + Sync {
    fn parse(&self, text: &str) -> Result<Vec<RawRecord>, SourceError>;
}
