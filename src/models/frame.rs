use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::db::Row;

/// In-memory table: an ordered column list plus rows
///
/// Rows are flat JSON objects. `columns` is the schema shown to clients and
/// may be non-empty while `rows` is empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Row>,
}

impl Frame {
    /// Empty frame carrying a column schema
    pub fn with_columns(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Build a frame from records; columns are the keys in first-seen order
    pub fn from_records(records: Vec<Row>) -> Self {
        let mut frame = Self::default();
        for record in records {
            frame.push(record);
        }
        frame
    }

    /// Records to hand to the store; null cells are left out so the
    /// database can apply its column defaults
    pub fn to_records(&self) -> Vec<Row> {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .filter(|(_, v)| !v.is_null())
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Append a row, extending the schema with any new keys
    pub fn push(&mut self, row: Row) {
        for key in row.keys() {
            if !self.has_column(key) {
                self.columns.push(key.clone());
            }
        }
        self.rows.push(row);
    }

    /// Add a column if missing, filling existing rows with `default`
    pub fn ensure_column(&mut self, name: &str, default: Value) {
        if !self.has_column(name) {
            self.columns.push(name.to_string());
        }
        for row in &mut self.rows {
            row.entry(name.to_string()).or_insert_with(|| default.clone());
        }
    }

    pub fn drop_column(&mut self, name: &str) {
        self.columns.retain(|c| c != name);
        for row in &mut self.rows {
            row.remove(name);
        }
    }

    pub fn retain<F>(&mut self, f: F)
    where
        F: FnMut(&Row) -> bool,
    {
        self.rows.retain(f);
    }

    /// Cells of one column, skipping rows that lack it
    pub fn column<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.rows.iter().filter_map(move |row| row.get(name))
    }

    /// Sum of a column, treating unparseable cells as 0
    pub fn sum(&self, name: &str) -> f64 {
        self.column(name).filter_map(as_number).sum()
    }

    /// Sum of `value_col` over rows whose `key_col` equals `key`, ignoring case
    pub fn sum_where(&self, value_col: &str, key_col: &str, key: &str) -> f64 {
        self.rows
            .iter()
            .filter(|row| {
                row.get(key_col)
                    .and_then(Value::as_str)
                    .map_or(false, |v| v.trim().eq_ignore_ascii_case(key))
            })
            .filter_map(|row| row.get(value_col).and_then(as_number))
            .sum()
    }

    /// Sum of `value_col` over rows whose `key_col` is exactly `key`
    pub fn sum_where_eq(&self, value_col: &str, key_col: &str, key: &str) -> f64 {
        self.rows
            .iter()
            .filter(|row| row.get(key_col).and_then(Value::as_str) == Some(key))
            .filter_map(|row| row.get(value_col).and_then(as_number))
            .sum()
    }

    /// Trim and lowercase every column name
    pub fn lowercase_columns(&mut self) {
        let mut columns: Vec<String> = Vec::with_capacity(self.columns.len());
        for c in &self.columns {
            let lower = c.trim().to_lowercase();
            if !columns.contains(&lower) {
                columns.push(lower);
            }
        }
        self.columns = columns;
        for row in &mut self.rows {
            *row = std::mem::take(row)
                .into_iter()
                .map(|(k, v)| (k.trim().to_lowercase(), v))
                .collect();
        }
    }

    /// Drop rows where every cell is null or blank text
    pub fn drop_empty_rows(&mut self) {
        self.rows.retain(|row| !row.values().all(is_blank));
    }

    /// Coerce loaded values to the types the dashboard works with
    ///
    /// Date-like columns (any name containing `data`) become ISO text or
    /// null; `numeric` columns become numbers, with 0 for anything
    /// unparseable.
    pub fn normalize_with(mut self, numeric: &[&str]) -> Self {
        self.drop_empty_rows();

        for row in &mut self.rows {
            for (key, value) in row.iter_mut() {
                let lower = key.to_lowercase();
                if lower.contains("data") {
                    *value = normalize_date(value);
                }
                if numeric.contains(&lower.as_str()) && !value.is_number() {
                    *value = Value::Number(number_or_zero(as_number(value).unwrap_or(0.0)));
                }
            }
        }

        self
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn number_or_zero(n: f64) -> Number {
    Number::from_f64(n).unwrap_or_else(|| Number::from(0))
}

/// Numeric value of a cell; numeric text is parsed
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

/// Parse day-first or ISO dates and date-times
pub fn parse_date(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    for format in ["%d/%m/%Y", "%Y-%m-%d", "%d-%m-%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%d/%m/%Y %H:%M:%S"] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(text, format) {
            return Some(datetime);
        }
    }
    chrono::DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.naive_utc())
}

fn normalize_date(value: &Value) -> Value {
    let Value::String(text) = value else {
        return Value::Null;
    };
    match parse_date(text) {
        Some(dt) if dt.time() == chrono::NaiveTime::MIN => {
            Value::String(dt.date().format("%Y-%m-%d").to_string())
        }
        Some(dt) => Value::String(dt.format("%Y-%m-%dT%H:%M:%S").to_string()),
        None => Value::Null,
    }
}
