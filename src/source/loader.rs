use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::model::{RawRecord, SourceError};
use crate::parser::LazyParser;
use crate::source::Fetcher;

/// Published-CSV endpoint for a bare spreadsheet id; absolute URLs pass through.
pub fn csv_export_url(sheet: &str) -> String {
    let sheet = sheet.trim();
    if is_absolute_url(sheet) {
        sheet.to_string()
    } else {
        format!("https://docs.google.com/spreadsheets/d/{}/pub?output=csv", sheet)
    }
}

fn is_absolute_url(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    lower.starts_with("https://") || lower.starts_with("http://")
}

/// Rows of a backup document: either a bare array or an object with an `items` array.
pub fn backup_rows(document: &Value) -> Vec<RawRecord> {
    let rows: &[Value] = match document {
        Value::Array(rows) => rows.as_slice(),
        Value::Object(map) => match map.get("items") {
            Some(Value::Array(rows)) => rows.as_slice(),
            _ => &[],
        },
        _ => &[],
    };
    rows.iter().filter_map(json_row).collect()
}

fn json_row(row: &Value) -> Option<RawRecord> {
    let object = row.as_object()?;
    let record = object
        .iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some((key.as_str(), text))
        })
        .collect();
    Some(record)
}

pub struct SourceLoader {
    fetcher: Arc<dyn Fetcher>,
    parser: Arc<LazyParser>,
    sheet_timeout: Duration,
    backup_timeout: Option<Duration>,
}

impl SourceLoader {
    pub fn new(fetcher: Arc<dyn Fetcher>, parser: Arc<LazyParser>, sheet_timeout: Duration) -> Self {
        Self {
            fetcher,
            parser,
            sheet_timeout,
            backup_timeout: None,
        }
    }

    pub fn with_backup_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.backup_timeout = timeout;
        self
    }

    /// Fetches a spreadsheet as CSV within the sheet timeout and parses it.
    pub async fn load_sheet(&self, sheet: &str) -> Result<Vec<RawRecord>, SourceError> {
        let url = csv_export_url(sheet);
        info!("Fetching sheet: {}", url);
        let text = self.fetch_bounded(&url, Some(self.sheet_timeout)).await?;
        let parser = self.parser.get().await?;
        let rows = parser.parse(&text)?;
        debug!("Parsed {} rows from {}", rows.len(), url);
        Ok(rows)
    }

    pub async fn load_backup(&self, url: &str) -> Result<Vec<RawRecord>, SourceError> {
        info!("Fetching backup: {}", url);
        let text = self.fetch_bounded(url, self.backup_timeout).await?;
        let document: Value =
            serde_json::from_str(&text).map_err(|e| SourceError::Parse(e.to_string()))?;
        let rows = backup_rows(&document);
        debug!("Backup yielded {} rows", rows.len());
        Ok(rows)
    }

    /// Dropping the fetch future on expiry cancels the request.
    async fn fetch_bounded(&self, url: &str, limit: Option<Duration>) -> Result<String, SourceError> {
        let Some(limit) = limit else {
            return self.fetcher.fetch(url).await;
        };
        match tokio::time::timeout(limit, self.fetcher.fetch(url)).await {
            Ok(result) => result,
            Err(_) => {
                let ms = limit.as_millis() as u64;
                warn!("Fetch of {} timed out after {} ms", url, ms);
                Err(SourceError::Timeout(ms))
            }
        }
    }
}
