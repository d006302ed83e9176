//! Keyword-based transaction classification
//!
//! A transaction is classified by scanning its description for mapping
//! keywords as case-insensitive substrings. When several mappings match,
//! the most specific one wins: longest keyword first (by character
//! count), oldest mapping (smallest id) on a length tie. This makes a
//! "스타벅스" rule beat a bare "스타" rule regardless of insertion order.

use crate::models::CategoryMapping;

/// A compiled view of the mapping table, ready for repeated matching.
///
/// Built once per import or sweep so a thousand-row statement does not
/// re-lowercase the keyword list a thousand times.
pub struct Classifier {
    /// (lowercased keyword, char count, id, category), pre-sorted by
    /// descending char count then ascending id.
    rules: Vec<(String, usize, i64, String)>,
}

impl Classifier {
    pub fn new(mappings: &[CategoryMapping]) -> Self {
        let mut rules: Vec<(String, usize, i64, String)> = mappings
            .iter()
            .filter(|m| !m.keyword.trim().is_empty())
            .map(|m| {
                let keyword = m.keyword.trim().to_lowercase();
                let len = keyword.chars().count();
                (keyword, len, m.id, m.category.clone())
            })
            .collect();
        rules.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
        Self { rules }
    }

    /// Return the category for a description, or None when no keyword
    /// matches.
    pub fn classify(&self, description: &str) -> Option<&str> {
        let haystack = description.to_lowercase();
        self.rules
            .iter()
            .find(|(keyword, _, _, _)| haystack.contains(keyword.as_str()))
            .map(|(_, _, _, category)| category.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
