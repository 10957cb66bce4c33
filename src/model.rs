// Core structs: RawRecord, CatalogItem, CanonicalId, errors
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// One table row as it came out of a source: free-form column name -> cell text.
///
/// Column order is kept so that colliding names resolve the same way every time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    fields: Vec<(String, String)>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.fields.push((column.into(), value.into()));
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .rev()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_blank(&self) -> bool {
        self.fields.iter().all(|(_, v)| v.trim().is_empty())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SizeKey {
    Ind,
    Fam,
    Xl,
}

impl SizeKey {
    pub const ALL: [SizeKey; 3] = [SizeKey::Ind, SizeKey::Fam, SizeKey::Xl];

    pub fn as_str(self) -> &'static str {
        match self {
            SizeKey::Ind => "ind",
            SizeKey::Fam => "fam",
            SizeKey::Xl => "xl",
        }
    }

    /// Exact match on an already-normalized suffix.
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "ind" => Some(SizeKey::Ind),
            "fam" => Some(SizeKey::Fam),
            "xl" => Some(SizeKey::Xl),
            _ => None,
        }
    }
}

impl fmt::Display for SizeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Availability {
    #[default]
    Available,
    Unavailable,
}

impl Availability {
    pub fn is_available(self) -> bool {
        self == Availability::Available
    }
}

/// Canonical product record. Built once by the normalizer, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    pub description: String,
    pub image: String,
    pub availability: Availability,
    pub base_price: String,
    pub size_prices: BTreeMap<SizeKey, String>,
}

impl CatalogItem {
    pub fn price_for(&self, size: SizeKey) -> Option<&str> {
        self.size_prices
            .get(&size)
            .map(String::as_str)
            .filter(|p| !p.is_empty())
    }
}

/// A normalized id split into its base and an optional size suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalId {
    pub base: String,
    pub size: Option<SizeKey>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogSource {
    Primary,
    Backup,
}

/// Result of one successful load cycle.
#[derive(Debug, Clone)]
pub struct LoadedCatalog {
    pub items: Vec<CatalogItem>,
    pub source: CatalogSource,
    pub loaded_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request timed out after {0} ms")]
    Timeout(u64),
    #[error("bad response status {0}")]
    BadResponse(u16),
    #[error("http error: {0}")]
    Http(String),
    #[error("parse error: {0}")]
    Parse(String),
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("primary source failed and no backup is configured: {0}")]
    NoBackup(SourceError),
    #[error("all sources failed (primary: {primary}; backup: {backup})")]
    Exhausted {
        primary: SourceError,
        backup: SourceError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_duplicate_column_wins_on_get() {
        let record: RawRecord = [("precio", "100"), ("precio", "200")].into_iter().collect();
        assert_eq!(record.get("precio"), Some("200"));
    }

    #[test]
    fn whitespace_only_row_is_blank() {
        let record: RawRecord = [("id", "  "), ("nombre", "")].into_iter().collect();
        assert!(record.is_blank());
    }

    #[test]
    fn empty_size_price_counts_as_missing() {
        let mut item = CatalogItem::default();
        item.size_prices.insert(SizeKey::Fam, String::new());
        assert_eq!(item.price_for(SizeKey::Fam), None);
    }
}
