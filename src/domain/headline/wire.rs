//! Wire types for the news feed.

use serde::Deserialize;
use serde_json::Value;

/// Top Stories response. Entries stay untyped so one malformed entry
/// does not reject the whole feed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopStoriesResponse {
    #[serde(default)]
    pub results: Option<Vec<Value>>,
}

impl TopStoriesResponse {
    pub fn len(&self) -> usize {
        self.results.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// String titles in feed order. Entries that are not objects, or whose
    /// `title` is absent or not a string, are skipped.
    pub fn titles(self) -> impl Iterator<Item = String> {
        self.results
            .unwrap_or_default()
            .into_iter()
            .filter_map(|entry| match entry {
                Value::Object(mut fields) => match fields.remove("title") {
                    Some(Value::String(title)) => Some(title),
                    _ => None,
                },
                _ => None,
            })
    }
}
