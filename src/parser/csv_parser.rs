// CSV adapter over the `csv` crate
use csv::{ReaderBuilder, Trim};

use crate::model::{RawRecord, SourceError};
use crate::parser::TableParser;

pub struct CsvTableParser {
    delimiter: u8,
}

impl CsvTableParser {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }
}

impl Default for CsvTableParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TableParser for CsvTableParser {
    fn parse(&self, text: &str) -> Result<Vec<RawRecord>, SourceError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .delimiter(self.delimiter)
            .flexible(true)
            .trim(Trim::Headers)
            .from_reader(text.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| SourceError::Parse(e.to_string()))?
            .clone();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| SourceError::Parse(e.to_string()))?;
            let row: RawRecord = headers
                .iter()
                .enumerate()
                .map(|(i, name)| (name, record.get(i).unwrap_or("")))
                .collect();
            if row.is_blank() {
                continue;
            }
            rows.push(row);
        }
        Ok(rows)
    }
}
