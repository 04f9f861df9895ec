use crate::constants;
use crate::domain::{OnlineOnly, ResourceRecord};
use crate::storage::RawRow;

// Candidate source columns per canonical field, in priority order. The first
// candidate present with a non-empty value wins.
const PROVINCE_COLUMNS: &[&str] = &["province", "prov", "region"];
const CITY_COLUMNS: &[&str] = &["city", "town", "municipality"];
const ADDRESS_COLUMNS: &[&str] = &["address", "street address", "location"];
const CATEGORY_COLUMNS: &[&str] = &["category", "service type", "type"];
const NAME_COLUMNS: &[&str] = &["name", "resource name", "organization", "title"];
const DESCRIPTION_COLUMNS: &[&str] = &["description", "details", "about"];
const CONTACT_COLUMNS: &[&str] = &["contact", "phone", "phone number", "email"];
const LINK_COLUMNS: &[&str] = &["link", "website", "url"];
const LATITUDE_COLUMNS: &[&str] = &["latitude", "lat"];
const LONGITUDE_COLUMNS: &[&str] = &["longitude", "lng", "lon", "long"];
const ONLINE_ONLY_COLUMNS: &[&str] = &["onlineonly", "online only", "online"];

/// Looks up the first candidate column present in the row, matching header
/// names case-insensitively. Absent columns read as the empty string.
fn field<'a>(row: &'a RawRow, candidates: &[&str]) -> &'a str {
    for candidate in candidates {
        for (header, value) in row {
            if header.trim().eq_ignore_ascii_case(candidate) && !value.trim().is_empty() {
                return value;
            }
        }
    }
    ""
}

fn lower(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Coerces a raw source row into the canonical record shape. Shape coercion
/// only; the French filter and content gates are separate steps so that
/// re-reading an already-refined table stays lossless.
pub fn normalize_row(row: &RawRow) -> ResourceRecord {
    let latitude = field(row, LATITUDE_COLUMNS).trim().parse::<f64>().ok();
    let longitude = field(row, LONGITUDE_COLUMNS).trim().parse::<f64>().ok();
    // A record with exactly one coordinate is invalid; clearing both makes it
    // eligible for geocoding instead of dropping the row.
    let (latitude, longitude) = match (latitude, longitude) {
        (Some(lat), Some(lon)) => (Some(lat), Some(lon)),
        _ => (None, None),
    };

    let link_raw = field(row, LINK_COLUMNS).trim();
    let link = if link_raw.is_empty() {
        None
    } else {
        Some(link_raw.to_string())
    };

    ResourceRecord {
        province: lower(field(row, PROVINCE_COLUMNS)),
        city: lower(field(row, CITY_COLUMNS)),
        address: lower(field(row, ADDRESS_COLUMNS)),
        // Taxonomy casing is preserved; classification overwrites this on the
        // refine path anyway.
        category: field(row, CATEGORY_COLUMNS).trim().to_string(),
        name: lower(field(row, NAME_COLUMNS)),
        description: lower(field(row, DESCRIPTION_COLUMNS)),
        contact: field(row, CONTACT_COLUMNS).trim().to_string(),
        link,
        latitude,
        longitude,
        online_only: OnlineOnly::parse(field(row, ONLINE_ONLY_COLUMNS)),
    }
}

/// Minimal-content check: a record with neither a name nor an address carries
/// nothing worth keeping.
pub fn has_minimal_content(record: &ResourceRecord) -> bool {
    !record.name.is_empty() || !record.address.is_empty()
}

/// The refine stage additionally needs text to classify on.
pub fn has_refine_content(record: &ResourceRecord) -> bool {
    !record.name.is_empty() && !record.description.is_empty()
}

fn contains_french_marker(value: &str) -> bool {
    let lowered = value.to_lowercase();
    constants::FRENCH_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

/// Heuristic French-language filter over every field of the record. False
/// positives and negatives are accepted, not masked elsewhere.
pub fn is_french(record: &ResourceRecord) -> bool {
    [
        record.province.as_str(),
        record.city.as_str(),
        record.address.as_str(),
        record.category.as_str(),
        record.name.as_str(),
        record.description.as_str(),
        record.contact.as_str(),
        record.link.as_deref().unwrap_or(""),
    ]
    .iter()
    .any(|value| contains_french_marker(value))
}

#[derive(Debug, Default)]
pub struct NormalizeOutcome {
    pub records: Vec<ResourceRecord>,
    pub french_removed: usize,
    pub invalid_removed: usize,
}

/// Normalizes a batch of raw rows, dropping French-language rows first and
/// then rows failing the minimal-content check.
pub fn normalize_batch(rows: &[RawRow]) -> NormalizeOutcome {
    let mut outcome = NormalizeOutcome::default();
    for row in rows {
        let record = normalize_row(row);
        if is_french(&record) {
            outcome.french_removed += 1;
            continue;
        }
        if !has_minimal_content(&record) {
            outcome.invalid_removed += 1;
            continue;
        }
        outcome.records.push(record);
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_key_fields_are_lowercase_trimmed() {
        let record = normalize_row(&row(&[
            ("Name", "  Crisis Line  "),
            ("CITY", " Toronto "),
            ("province", "ONTARIO"),
        ]));
        assert_eq!(record.name, "crisis line");
        assert_eq!(record.city, "toronto");
        assert_eq!(record.province, "ontario");
        assert_eq!(record.name, record.name.trim().to_lowercase());
        assert_eq!(record.city, record.city.trim().to_lowercase());
    }

    #[test]
    fn test_column_priority_order() {
        // "name" outranks "organization" even when both are present
        let record = normalize_row(&row(&[
            ("Organization", "Fallback Org"),
            ("Name", "Primary Name"),
        ]));
        assert_eq!(record.name, "primary name");

        // the lower-priority candidate fills in when the first is empty
        let record = normalize_row(&row(&[("Name", "  "), ("Organization", "Fallback Org")]));
        assert_eq!(record.name, "fallback org");
    }

    #[test]
    fn test_absent_columns_map_to_empty_strings() {
        let record = normalize_row(&row(&[("Name", "helpline")]));
        assert_eq!(record.city, "");
        assert_eq!(record.address, "");
        assert_eq!(record.contact, "");
        assert_eq!(record.link, None);
    }

    #[test]
    fn test_partial_coordinates_are_cleared() {
        let record = normalize_row(&row(&[("Name", "x"), ("Latitude", "43.6")]));
        assert_eq!(record.latitude, None);
        assert_eq!(record.longitude, None);

        let record = normalize_row(&row(&[
            ("Name", "x"),
            ("Latitude", "43.6"),
            ("Longitude", "-79.4"),
        ]));
        assert_eq!(record.latitude, Some(43.6));
        assert_eq!(record.longitude, Some(-79.4));
    }

    #[test]
    fn test_unparseable_coordinates_are_cleared() {
        let record = normalize_row(&row(&[
            ("Name", "x"),
            ("Latitude", "n/a"),
            ("Longitude", "-79.4"),
        ]));
        assert_eq!(record.latitude, None);
        assert_eq!(record.longitude, None);
    }

    #[test]
    fn test_french_rows_are_dropped() {
        let rows = vec![
            row(&[("Name", "clinique de lachine"), ("Description", "soins")]),
            row(&[
                ("Name", "crisis line"),
                ("Description", "24/7 phone support"),
            ]),
        ];
        let outcome = normalize_batch(&rows);
        assert_eq!(outcome.french_removed, 1);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].name, "crisis line");
    }

    #[test]
    fn test_minimal_content_gate() {
        let rows = vec![
            row(&[("Description", "no name, no address")]),
            row(&[("Address", "12 Main St"), ("Description", "walk-in only")]),
        ];
        let outcome = normalize_batch(&rows);
        assert_eq!(outcome.invalid_removed, 1);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].address, "12 main st");
    }
}
