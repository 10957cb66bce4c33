use std::collections::HashMap;

use unicode_normalization::UnicodeNormalization;

use crate::model::{Availability, CanonicalId, CatalogItem, RawRecord, SizeKey};

const ID_KEYS: &[&str] = &["id", "producto id", "producto_id"];
const NAME_KEYS: &[&str] = &["nombre", "name"];
const DESCRIPTION_KEYS: &[&str] = &["descripcion", "description"];
const PRICE_KEYS: &[&str] = &["precio", "price"];
const IMAGE_KEYS: &[&str] = &["imagen", "image", "foto"];
const AVAILABILITY_KEYS: &[&str] = &["disponible", "available"];
const DEFAULT_AVAILABILITY: &str = "SI";

fn size_keys(size: SizeKey) -> &'static [&'static str] {
    match size {
        SizeKey::Ind => &["precio ind", "precio_ind", "precio individual", "precio_individual", "ind"],
        SizeKey::Fam => &["precio fam", "precio_fam", "precio familiar", "precio_familiar", "fam"],
        SizeKey::Xl => &["precio xl", "precio_xl", "xl"],
    }
}

/// Lowercase, strip diacritics, trim. Trimming runs last so whitespace left behind by a
/// stripped mark is removed too.
pub fn normalize_key(key: &str) -> String {
    let stripped: String = key
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();
    stripped
        .trim()
        .trim_start_matches('\u{feff}')
        .trim()
        .to_string()
}

/// Key canonicalization plus removal of every whitespace character.
pub fn normalize_id(value: &str) -> String {
    normalize_key(value)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

fn is_combining_mark(c: char) -> bool {
    ('\u{0300}'..='\u{036f}').contains(&c)
}

/// Split a normalized id on its last `-` when the tail is a known size key.
pub fn decompose_id(normalized: &str) -> CanonicalId {
    if let Some((base, suffix)) = normalized.rsplit_once('-') {
        if let Some(size) = SizeKey::from_suffix(suffix) {
            return CanonicalId {
                base: base.to_string(),
                size: Some(size),
            };
        }
    }
    CanonicalId {
        base: normalized.to_string(),
        size: None,
    }
}

pub fn parse_availability(flag: &str) -> Availability {
    match normalize_key(flag).as_str() {
        "no" | "false" => Availability::Unavailable,
        _ => Availability::Available,
    }
}

pub fn normalize_all(records: &[RawRecord]) -> Vec<CatalogItem> {
    records.iter().map(normalize_record).collect()
}

pub fn normalize_record(record: &RawRecord) -> CatalogItem {
    let mut fields: HashMap<String, &str> = HashMap::new();
    for (column, value) in record.iter() {
        fields.insert(normalize_key(column), value);
    }

    let lookup = |keys: &[&str]| -> String {
        keys.iter()
            .filter_map(|k| fields.get(*k))
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
            .unwrap_or_default()
            .to_string()
    };

    let availability = match lookup(AVAILABILITY_KEYS) {
        flag if flag.is_empty() => parse_availability(DEFAULT_AVAILABILITY),
        flag => parse_availability(&flag),
    };

    let size_prices = SizeKey::ALL
        .into_iter()
        .map(|size| (size, lookup(size_keys(size))))
        .filter(|(_, price)| !price.is_empty())
        .collect();

    CatalogItem {
        id: lookup(ID_KEYS),
        name: lookup(NAME_KEYS),
        description: lookup(DESCRIPTION_KEYS),
        image: lookup(IMAGE_KEYS),
        availability,
        base_price: lookup(PRICE_KEYS),
        size_prices,
    }
}
