use super::{fields, Record};

/// Fixed column order for one run's output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    columns: &'static [&'static str],
}

impl Schema {
    /// Catalogue entries enriched from their detail pages
    pub const CATALOGUE: Schema = Schema {
        columns: &[
            fields::INDEX,
            fields::TITLE,
            fields::DESCRIPTION,
            fields::AUTHOR,
            fields::PUBLISHED,
            fields::STATUS,
            fields::SUBJECT,
            fields::CATEGORY,
            fields::MEDIA,
            fields::ISBN,
            fields::CALL_NUMBER,
            fields::TYPE,
            fields::KEYWORDS,
            fields::DOWNLOAD,
            fields::URL,
            fields::ERROR,
        ],
    };

    /// Catalogue listing rows only
    pub const LISTING: Schema = Schema {
        columns: &[
            fields::INDEX,
            fields::TITLE,
            fields::SOURCE,
            fields::CALL_NUMBER,
            fields::URL,
            fields::ERROR,
        ],
    };

    /// Article listings (archive, region and category pages)
    pub const DOCUMENTS: Schema = Schema {
        columns: &[
            fields::INDEX,
            fields::TITLE,
            fields::DATE,
            fields::CATEGORIES,
            fields::URL,
            fields::DOWNLOAD,
            fields::ERROR,
        ],
    };

    pub fn columns(&self) -> &'static [&'static str] {
        self.columns
    }

    /// Header row
    pub fn header(&self) -> Vec<&'static str> {
        self.columns.to_vec()
    }

    /// Projects a record onto the schema; missing fields become empty strings
    pub fn row<'a>(&self, record: &'a Record) -> Vec<&'a str> {
        self.columns
            .iter()
            .map(|column| record.get(column).unwrap_or(""))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_fills_missing_with_empty() {
        let record: Record = [(fields::TITLE, "Report"), (fields::URL, "https://x/1")]
            .into_iter()
            .collect();

        let row = Schema::DOCUMENTS.row(&record);
        assert_eq!(row, vec!["", "Report", "", "", "https://x/1", "", ""]);
    }

    #[test]
    fn test_row_ignores_unknown_fields() {
        let record: Record = [(fields::TITLE, "Report"), ("Shelf Mark", "A1")]
            .into_iter()
            .collect();

        let row = Schema::LISTING.row(&record);
        assert_eq!(row.len(), Schema::LISTING.columns().len());
        assert!(!row.contains(&"A1"));
    }

    #[test]
    fn test_header_matches_columns() {
        assert_eq!(Schema::CATALOGUE.header().len(), 16);
        assert_eq!(Schema::CATALOGUE.header()[0], "Index");
        assert_eq!(Schema::CATALOGUE.header()[15], "Error");
    }
}
