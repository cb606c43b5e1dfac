//! Headline: the news headline a run is built around.

pub mod client;
pub mod wire;

use async_trait::async_trait;

use crate::error::{PipelineError, PipelineResult};
use wire::TopStoriesResponse;

pub use client::NytHeadlineSource;

/// A non-empty headline, exactly as the feed returned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Headline(String);

impl Headline {
    /// Rejects empty and whitespace-only text. Does not trim.
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            None
        } else {
            Some(Self(text))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Headline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Produces the headline for a run.
#[async_trait]
pub trait HeadlineSource: Send + Sync {
    async fn fetch(&self) -> PipelineResult<Headline>;
}

/// First entry, in server order, with a usable title.
pub fn first_headline(response: TopStoriesResponse) -> PipelineResult<Headline> {
    response
        .titles()
        .find_map(Headline::new)
        .ok_or_else(|| PipelineError::data("no titled entry in news feed response"))
}
