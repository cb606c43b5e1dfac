//! NYT Top Stories headline source.

use async_trait::async_trait;

use crate::config::{required_secret, Secret, ENV_NEWS_KEY};
use crate::error::PipelineResult;
use crate::http::HttpClient;

use super::wire::TopStoriesResponse;
use super::{first_headline, Headline, HeadlineSource};

pub struct NytHeadlineSource {
    http: HttpClient,
    url: String,
    api_key: Option<Secret>,
}

impl NytHeadlineSource {
    pub fn new(http: HttpClient, url: impl Into<String>, api_key: Option<Secret>) -> Self {
        Self {
            http,
            url: url.into(),
            api_key,
        }
    }
}

#[async_trait]
impl HeadlineSource for NytHeadlineSource {
    async fn fetch(&self) -> PipelineResult<Headline> {
        // Checked before any network traffic.
        let key = required_secret(self.api_key.as_ref(), ENV_NEWS_KEY)?;

        let request = self.http.get(&self.url).query(&[("api-key", key.expose())]);
        let response: TopStoriesResponse = self.http.send_json(request).await?;
        tracing::debug!(entries = response.len(), "news feed fetched");

        first_headline(response)
    }
}
