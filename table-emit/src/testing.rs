//! Shared fixtures for unit tests.

use crate::models::Record;

/// Twenty countries, already in code-point order.
pub const COUNTRIES: [(&str, &str); 20] = [
    ("Argentina", "Buenos Aires"),
    ("Australia", "Canberra"),
    ("Brazil", "Brasília"),
    ("Canada", "Ottawa"),
    ("Chile", "Santiago"),
    ("Egypt", "Cairo"),
    ("France", "Paris"),
    ("Germany", "Berlin"),
    ("India", "New Delhi"),
    ("Italy", "Rome"),
    ("Japan", "Tokyo"),
    ("Kenya", "Nairobi"),
    ("Mexico", "Mexico City"),
    ("Nigeria", "Abuja"),
    ("Norway", "Oslo"),
    ("Peru", "Lima"),
    ("Portugal", "Lisbon"),
    ("Spain", "Madrid"),
    ("Sweden", "Stockholm"),
    ("Thailand", "Bangkok"),
];

pub fn sample_rows() -> Vec<(&'static str, &'static str)> {
    COUNTRIES.to_vec()
}

pub fn sample_records() -> Vec<Record> {
    COUNTRIES.iter().map(|(c, k)| Record::new(*c, *k)).collect()
}

fn quote(field: &str) -> String {
    if field.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Header plus the given rows, newline-joined, no trailing newline.
pub fn csv_from_rows(rows: &[(&str, &str)]) -> String {
    std::iter::once("country,capital".to_string())
        .chain(rows.iter().map(|(a, b)| format!("{},{}", quote(a), quote(b))))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn valid_csv() -> String {
    csv_from_rows(&COUNTRIES)
}

/// `n` sorted unique rows; past the fixture, synthetic names keep the order.
pub fn csv_with_row_count(n: usize) -> String {
    let mut rows: Vec<(String, String)> = COUNTRIES
        .iter()
        .take(n)
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect();
    for i in COUNTRIES.len()..n {
        rows.push((format!("Zz{:03}", i), format!("Capital {}", i)));
    }
    let borrowed: Vec<(&str, &str)> = rows.iter().map(|(a, b)| (a.as_str(), b.as_str())).collect();
    csv_from_rows(&borrowed)
}
