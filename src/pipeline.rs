//! The daily run: headline → image → pinned image → pinned metadata →
//! on-chain token URI.
//!
//! Each stage's output feeds the next verbatim and the first failure ends
//! the run. Nothing is rolled back; pinned content that never reaches the
//! chain is simply unreferenced.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::chain::{ChainCommitter, ChainContext, EvmCommitter, TxHash};
use crate::config::Config;
use crate::domain::headline::{Headline, HeadlineSource, NytHeadlineSource};
use crate::domain::image::{HuggingFaceGenerator, ImageGenerator, Prompt};
use crate::domain::pinning::{ContentPinner, Locator, Metadata, PinataPinner};
use crate::error::PipelineResult;
use crate::http::{Delay, HttpClient};

/// Everything a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub headline: Headline,
    pub image: Locator,
    pub metadata: Locator,
    pub tx_hash: TxHash,
}

pub struct Pipeline {
    headlines: Box<dyn HeadlineSource>,
    images: Box<dyn ImageGenerator>,
    pinner: Box<dyn ContentPinner>,
    committer: Box<dyn ChainCommitter>,
    run_date: NaiveDate,
}

impl Pipeline {
    pub fn new(
        headlines: Box<dyn HeadlineSource>,
        images: Box<dyn ImageGenerator>,
        pinner: Box<dyn ContentPinner>,
        committer: Box<dyn ChainCommitter>,
        run_date: NaiveDate,
    ) -> Self {
        Self {
            headlines,
            images,
            pinner,
            committer,
            run_date,
        }
    }

    /// Wire the production clients. Parses the key and contract address;
    /// makes no network calls.
    pub fn from_config(config: &Config, run_date: NaiveDate) -> PipelineResult<Self> {
        let http = HttpClient::new()?;
        Self::from_parts(config, http, run_date, None)
    }

    /// As [`Pipeline::from_config`], with a caller-supplied HTTP client and
    /// optional delay for the image retry and receipt polling.
    pub fn from_parts(
        config: &Config,
        http: HttpClient,
        run_date: NaiveDate,
        delay: Option<Arc<dyn Delay>>,
    ) -> PipelineResult<Self> {
        let endpoints = &config.endpoints;
        let ctx = ChainContext::from_config(config, http.clone())?;

        let headlines = NytHeadlineSource::new(
            http.clone(),
            endpoints.news_url.as_str(),
            config.news_api_key.clone(),
        );
        let mut images = HuggingFaceGenerator::new(
            http.clone(),
            endpoints.image_url.as_str(),
            config.image_token.clone(),
        );
        let pinner = PinataPinner::new(
            http,
            endpoints.pin_file_url.as_str(),
            endpoints.pin_json_url.as_str(),
            config.pin_token.clone(),
        );
        let mut committer = EvmCommitter::new(ctx, config.receipt_poll_interval);

        if let Some(delay) = delay {
            images = images.with_delay(delay.clone());
            committer = committer.with_delay(delay);
        }

        Ok(Self::new(
            Box::new(headlines),
            Box::new(images),
            Box::new(pinner),
            Box::new(committer),
            run_date,
        ))
    }

    pub fn run_date(&self) -> NaiveDate {
        self.run_date
    }

    /// Run every stage and return the confirmed transaction hash.
    pub async fn run(&self) -> PipelineResult<TxHash> {
        Ok(self.run_report().await?.tx_hash)
    }

    /// Run every stage and return all intermediate results.
    pub async fn run_report(&self) -> PipelineResult<RunReport> {
        let date = self.run_date.format("%Y-%m-%d").to_string();

        let headline = self.headlines.fetch().await?;
        tracing::info!(headline = %headline, "headline fetched");

        let prompt = Prompt::for_headline(&headline);
        let image = self.images.generate(&prompt).await?;
        tracing::info!(bytes = image.len(), content_type = image.content_type(), "image generated");

        let image_name = format!("headline_{}.{}", date, image.extension());
        let image_locator = self
            .pinner
            .pin_binary(image.bytes(), &image_name, image.content_type())
            .await?;
        tracing::info!(locator = %image_locator, "image pinned");

        let metadata = Metadata {
            name: format!("NYT Daily: {}", date),
            description: headline.as_str().to_string(),
            image: image_locator.clone(),
        };
        let metadata_name = format!("metadata_{}.json", date);
        let metadata_locator = self.pinner.pin_json(&metadata, &metadata_name).await?;
        tracing::info!(locator = %metadata_locator, "metadata pinned");

        let tx_hash = self.committer.commit(&metadata_locator).await?;
        tracing::info!(tx_hash = %tx_hash, "token URI updated");

        Ok(RunReport {
            headline,
            image: image_locator,
            metadata: metadata_locator,
            tx_hash,
        })
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("run_date", &self.run_date)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::image::ImageAsset;
    use crate::error::PipelineError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 0];

    /// Shared call log, in order.
    type Log = Arc<Mutex<Vec<String>>>;

    struct FakeHeadlines(Option<&'static str>);

    #[async_trait]
    impl HeadlineSource for FakeHeadlines {
        async fn fetch(&self) -> PipelineResult<Headline> {
            match self.0 {
                Some(text) => Ok(Headline::new(text).unwrap()),
                None => Err(PipelineError::data("no headline")),
            }
        }
    }

    struct FakeImages {
        log: Log,
        fail: bool,
    }

    #[async_trait]
    impl ImageGenerator for FakeImages {
        async fn generate(&self, prompt: &Prompt) -> PipelineResult<ImageAsset> {
            self.log.lock().unwrap().push(format!("generate {}", prompt.as_str()));
            if self.fail {
                return Err(PipelineError::ServiceUnavailable {
                    service: "image".into(),
                    attempts: 3,
                });
            }
            ImageAsset::from_response(PNG.to_vec(), None)
        }
    }

    struct FakePinner {
        log: Log,
        metadata: Arc<Mutex<Option<Metadata>>>,
    }

    #[async_trait]
    impl ContentPinner for FakePinner {
        async fn pin_binary(
            &self,
            bytes: &[u8],
            filename: &str,
            content_type: &str,
        ) -> PipelineResult<Locator> {
            assert_eq!(bytes, PNG);
            self.log
                .lock()
                .unwrap()
                .push(format!("pin_binary {} {}", filename, content_type));
            Locator::from_hash("Qm123Image")
        }

        async fn pin_json(&self, record: &Metadata, filename: &str) -> PipelineResult<Locator> {
            self.log.lock().unwrap().push(format!("pin_json {}", filename));
            *self.metadata.lock().unwrap() = Some(record.clone());
            Locator::from_hash("Qm456Meta")
        }
    }

    struct FakeCommitter {
        log: Log,
    }

    #[async_trait]
    impl ChainCommitter for FakeCommitter {
        async fn commit(&self, locator: &Locator) -> PipelineResult<TxHash> {
            self.log.lock().unwrap().push(format!("commit {}", locator));
            Ok(TxHash::from_bytes([0xab; 32]))
        }
    }

    struct Harness {
        pipeline: Pipeline,
        log: Log,
        metadata: Arc<Mutex<Option<Metadata>>>,
    }

    fn harness(headline: Option<&'static str>, image_fails: bool) -> Harness {
        let log: Log = Arc::default();
        let metadata = Arc::new(Mutex::new(None));
        let pipeline = Pipeline::new(
            Box::new(FakeHeadlines(headline)),
            Box::new(FakeImages {
                log: log.clone(),
                fail: image_fails,
            }),
            Box::new(FakePinner {
                log: log.clone(),
                metadata: metadata.clone(),
            }),
            Box::new(FakeCommitter { log: log.clone() }),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        );
        Harness {
            pipeline,
            log,
            metadata,
        }
    }

    #[tokio::test]
    async fn test_end_to_end_flow() {
        let h = harness(Some("Markets Rally on Fed News"), false);
        let report = h.pipeline.run_report().await.unwrap();

        assert_eq!(report.headline.as_str(), "Markets Rally on Fed News");
        assert_eq!(report.image.as_str(), "ipfs://Qm123Image");
        assert_eq!(report.metadata.as_str(), "ipfs://Qm456Meta");
        assert_eq!(report.tx_hash.as_bytes(), &[0xab; 32]);

        let metadata = h.metadata.lock().unwrap().clone().unwrap();
        assert_eq!(
            serde_json::to_value(&metadata).unwrap(),
            serde_json::json!({
                "name": "NYT Daily: 2024-01-01",
                "description": "Markets Rally on Fed News",
                "image": "ipfs://Qm123Image",
            })
        );

        assert_eq!(
            *h.log.lock().unwrap(),
            vec![
                "generate Professional digital art, newspaper aesthetic for: Markets Rally on Fed News",
                "pin_binary headline_2024-01-01.png image/png",
                "pin_json metadata_2024-01-01.json",
                "commit ipfs://Qm456Meta",
            ]
        );
    }

    #[tokio::test]
    async fn test_run_returns_transaction_hash() {
        let h = harness(Some("Markets Rally on Fed News"), false);
        let hash = h.pipeline.run().await.unwrap();
        assert_eq!(hash, TxHash::from_bytes([0xab; 32]));
    }

    #[tokio::test]
    async fn test_headline_failure_stops_before_any_side_effect() {
        let h = harness(None, false);
        let err = h.pipeline.run().await.unwrap_err();
        assert!(matches!(err, PipelineError::Data(_)));
        assert!(h.log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_image_failure_skips_pinning_and_commit() {
        let h = harness(Some("Quiet Day"), true);
        let err = h.pipeline.run().await.unwrap_err();
        assert_eq!(err.exit_code(), 5);
        assert_eq!(h.log.lock().unwrap().len(), 1);
        assert!(h.metadata.lock().unwrap().is_none());
    }
}
