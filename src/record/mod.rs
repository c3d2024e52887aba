//! Document records
//!
//! A [`Record`] is a flat mapping from field name to value describing one document.
//! Fields that the source page does not provide are simply absent; the empty-string
//! default is applied only when a [`Schema`] turns a record into an output row.

mod counter;
mod schema;

pub use counter::RunCounter;
pub use schema::Schema;

use std::collections::BTreeMap;

/// Well-known field names
pub mod fields {
    pub const INDEX: &str = "Index";
    pub const TITLE: &str = "Title";
    pub const DESCRIPTION: &str = "Description";
    pub const AUTHOR: &str = "Author";
    pub const PUBLISHED: &str = "Published";
    pub const STATUS: &str = "Status";
    pub const SUBJECT: &str = "Subject";
    pub const CATEGORY: &str = "Category";
    pub const CATEGORIES: &str = "Categories";
    pub const MEDIA: &str = "Media";
    pub const ISBN: &str = "ISBN";
    pub const CALL_NUMBER: &str = "Call Number";
    pub const TYPE: &str = "Type";
    pub const KEYWORDS: &str = "Keywords";
    pub const DATE: &str = "Date";
    pub const SOURCE: &str = "Source";
    pub const DOWNLOAD: &str = "Download";
    pub const URL: &str = "URL";
    pub const ERROR: &str = "Error";
}

/// Separator used when a record accumulates more than one error
const ERROR_SEPARATOR: &str = "; ";

/// Metadata for one document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: BTreeMap<String, String>,
}

impl Record {
    /// Creates an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field, replacing any previous value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Returns a field's value, if present
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates fields in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Appends an error description to the Error field
    pub fn push_error(&mut self, message: impl AsRef<str>) {
        let message = message.as_ref();
        match self.fields.get_mut(fields::ERROR) {
            Some(existing) if !existing.is_empty() => {
                existing.push_str(ERROR_SEPARATOR);
                existing.push_str(message);
            }
            _ => self.set(fields::ERROR, message),
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.get(fields::ERROR)
    }

    pub fn has_error(&self) -> bool {
        self.error().is_some_and(|e| !e.is_empty())
    }

    /// Copies every field of `other` into this record; `other` wins on conflicts
    /// except for Error, which is accumulated.
    pub fn overlay(&mut self, other: Record) {
        for (name, value) in other.fields {
            if name == fields::ERROR {
                self.push_error(value);
            } else {
                self.fields.insert(name, value);
            }
        }
    }

    /// Assigns the record's ordinal
    pub fn set_index(&mut self, index: u64) {
        self.set(fields::INDEX, index.to_string());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.set(k, v);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_fields_are_absent() {
        let mut record = Record::new();
        record.set(fields::TITLE, "Report");
        assert_eq!(record.get(fields::TITLE), Some("Report"));
        assert_eq!(record.get(fields::AUTHOR), None);
        assert!(!record.contains(fields::AUTHOR));
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn test_push_error_accumulates() {
        let mut record = Record::new();
        assert!(!record.has_error());

        record.push_error("missing link");
        record.push_error("missing date");
        assert_eq!(record.error(), Some("missing link; missing date"));
        assert!(record.has_error());
    }

    #[test]
    fn test_overlay_prefers_other_and_keeps_errors() {
        let mut listing: Record = [
            (fields::TITLE, "Listing title"),
            (fields::SOURCE, "NHS"),
            (fields::ERROR, "first"),
        ]
        .into_iter()
        .collect();

        let detail: Record = [(fields::TITLE, "Detail title"), (fields::ERROR, "second")]
            .into_iter()
            .collect();

        listing.overlay(detail);
        assert_eq!(listing.get(fields::TITLE), Some("Detail title"));
        assert_eq!(listing.get(fields::SOURCE), Some("NHS"));
        assert_eq!(listing.error(), Some("first; second"));
    }

    #[test]
    fn test_set_index() {
        let mut record = Record::new();
        record.set_index(42);
        assert_eq!(record.get(fields::INDEX), Some("42"));
    }
}
