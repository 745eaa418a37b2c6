use serde::Serialize;
use std::collections::BTreeMap;

/// A piece of text plus where it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub content: String,
    pub metadata: BTreeMap<String, String>,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.metadata.insert(key.into(), value.to_string());
        self
    }

    pub fn source(&self) -> Option<&str> {
        self.metadata.get("source").map(String::as_str)
    }

    pub fn page(&self) -> Option<&str> {
        self.metadata.get("page").map(String::as_str)
    }

    /// One document per page of `text`. Pages are separated by form feeds;
    /// blank pages are skipped and numbering starts at 1.
    pub fn from_pages(source: &str, text: &str) -> Vec<Document> {
        text.split('\u{c}')
            .enumerate()
            .filter(|(_, page)| !page.trim().is_empty())
            .map(|(i, page)| {
                Document::new(page)
                    .with_metadata("source", source)
                    .with_metadata("page", i + 1)
            })
            .collect()
    }
}
