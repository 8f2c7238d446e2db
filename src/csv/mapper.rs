//! Header-to-field mapping for tokenized CSV rows.
//!
//! This module turns a header row and value rows into [`Record`]s, renaming source
//! headers through a [`HeaderMap`] and repairing rows whose length does not match.

use crate::model::Record;
use std::collections::HashMap;
use tracing::warn;

/// Dictionary from source header text to semantic field name.
///
/// Lookups use the trimmed header text and are exact; headers without an entry keep
/// their own text as the field name.
///
/// # Examples
///
/// ```
/// use digestboard::csv::HeaderMap;
///
/// let mut map = HeaderMap::from_table(&[("公众号", "source")]);
/// map.set_mapping("发布时间", "date");
/// assert_eq!(map.field_for_header(" 公众号 "), Some("source"));
/// assert_eq!(map.field_for_header("URL"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct HeaderMap {
    entries: HashMap<String, String>,
}

impl HeaderMap {
    /// Creates a map that renames nothing
    #[must_use]
    pub fn identity() -> Self {
        Self::default()
    }

    /// Creates a map from a `(header, field)` table
    #[must_use]
    pub fn from_table(table: &[(&str, &str)]) -> Self {
        let mut map = Self::default();
        for (header, field) in table {
            map.set_mapping(header, field);
        }
        map
    }

    /// Sets the field name used for a header
    pub fn set_mapping(&mut self, header: &str, field: &str) -> &mut Self {
        self.entries
            .insert(header.trim().to_string(), field.to_string());
        self
    }

    /// Finds the field name for a given header
    pub fn field_for_header(&self, header: &str) -> Option<&str> {
        self.entries.get(header.trim()).map(String::as_str)
    }

    /// Resolves the record key for the header at `index`.
    fn key_for(&self, index: usize, header: &str) -> String {
        let header = header.trim();
        match self.field_for_header(header) {
            Some(field) => field.to_string(),
            None if header.is_empty() => format!("column{index}"),
            None => header.to_string(),
        }
    }
}

/// A value row mapped onto the header schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedRow {
    /// The record, with exactly one entry per header
    pub record: Record,
    /// How many values the source row actually had
    pub value_count: usize,
}

impl MappedRow {
    /// Whether the row had to be padded or truncated
    pub fn repaired(&self) -> bool {
        self.value_count != self.record.len()
    }
}

/// Maps value rows onto a fixed header row.
///
/// Rows shorter than the header are padded with empty strings and longer rows are
/// truncated. Mapping never fails and never reorders values.
#[derive(Debug, Clone)]
pub struct RecordMapper {
    keys: Vec<String>,
}

impl RecordMapper {
    /// Creates a mapper for `headers`, renaming them through `header_map`
    #[must_use]
    pub fn new(headers: &[String], header_map: &HeaderMap) -> Self {
        let keys = headers
            .iter()
            .enumerate()
            .map(|(i, header)| header_map.key_for(i, header))
            .collect();
        Self { keys }
    }

    /// The record keys, in header order
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Maps one value row. `row_number` is only used for diagnostics.
    pub fn map(&self, mut values: Vec<String>, row_number: usize) -> MappedRow {
        let value_count = values.len();
        if value_count != self.keys.len() {
            warn!(
                row = row_number,
                values = value_count,
                headers = self.keys.len(),
                "row length does not match header, repairing"
            );
            values.resize(self.keys.len(), String::new());
        }

        let record = self.keys.iter().cloned().zip(values).collect();
        MappedRow {
            record,
            value_count,
        }
    }
}
