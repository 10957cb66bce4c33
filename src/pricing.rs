use serde::Deserialize;

use crate::model::{CatalogItem, SizeKey};

/// Currency presentation for price displays.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PriceFormat {
    pub currency_symbol: String,
    pub thousands_separator: String,
}

impl Default for PriceFormat {
    fn default() -> Self {
        Self {
            currency_symbol: "$".to_string(),
            thousands_separator: ".".to_string(),
        }
    }
}

impl PriceFormat {
    /// Digits-only amount, grouped by thousands. Values without digits come back untouched.
    pub fn format(&self, raw: &str) -> String {
        let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            return raw.to_string();
        }
        let amount = match digits.parse::<u64>() {
            Ok(amount) => amount,
            Err(_) => return raw.to_string(),
        };
        format!("{}{}", self.currency_symbol, group_thousands(amount, &self.thousands_separator))
    }
}

fn group_thousands(amount: u64, separator: &str) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 * separator.len());
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push_str(separator);
        }
        out.push(ch);
    }
    out
}

/// Size-specific price when the size was recovered from the id and the item has one,
/// the base price otherwise.
pub fn select_price(item: &CatalogItem, size: Option<SizeKey>) -> &str {
    size.and_then(|s| item.price_for(s))
        .unwrap_or(item.base_price.as_str())
}

pub fn resolve_price(item: &CatalogItem, size: Option<SizeKey>, format: &PriceFormat) -> String {
    format.format(select_price(item, size))
}
