//! # headline-pipeline
//!
//! Turns the day's top news headline into an on-chain token URI.
//!
//! ## Architecture
//!
//! The crate is organized in layers:
//!
//! 1. **Core** — Errors, configuration, service URLs
//! 2. **HTTP** — Shared `reqwest` client and the bounded warm-up retry
//! 3. **Domain** — Headline source, image generator, content pinner
//! 4. **Chain** — RLP/ABI encoding, local signing, JSON-RPC, the committer
//! 5. **Pipeline** — The orchestrator and the read-only diagnostics
//!
//! Every external collaborator sits behind an `async_trait` seam so the
//! pipeline can be driven against fakes.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use headline_pipeline::prelude::*;
//!
//! let config = Config::from_env()?;
//! let pipeline = Pipeline::from_config(&config, chrono::Local::now().date_naive())?;
//! let tx_hash = pipeline.run().await?;
//! ```

// ── Layer 1: Core ────────────────────────────────────────────────────────────

/// Unified pipeline error types.
pub mod error;

/// Environment-driven configuration and secret handling.
pub mod config;

/// Default service URLs.
pub mod network;

// ── Layer 2: HTTP ────────────────────────────────────────────────────────────

/// HTTP client with status classification and warm-up retry.
pub mod http;

// ── Layer 3: Domain ──────────────────────────────────────────────────────────

/// Domain modules (vertical slices): types, wire types, clients.
pub mod domain;

// ── Layer 4: Chain ───────────────────────────────────────────────────────────

/// Transaction construction, signing, node access, confirmation.
pub mod chain;

// ── Layer 5: Pipeline ────────────────────────────────────────────────────────

/// The stage orchestrator.
pub mod pipeline;

/// Read-only connectivity and account checks.
pub mod diagnostics;

// ── Prelude ──────────────────────────────────────────────────────────────────

pub mod prelude {
    // Core
    pub use crate::config::{Config, Endpoints, Secret};
    pub use crate::error::{PipelineError, PipelineResult, TransportError};

    // HTTP
    pub use crate::http::{Delay, HttpClient, RetryConfig, TimerDelay};

    // Domain
    pub use crate::domain::headline::{Headline, HeadlineSource, NytHeadlineSource};
    pub use crate::domain::image::{HuggingFaceGenerator, ImageAsset, ImageGenerator, Prompt};
    pub use crate::domain::pinning::{ContentPinner, Locator, Metadata, PinataPinner};

    // Chain
    pub use crate::chain::{
        Address, ChainCommitter, ChainContext, ChainRpc, EvmCommitter, JsonRpcClient,
        LocalSigner, TokenUriContract, TxHash,
    };

    // Pipeline
    pub use crate::diagnostics::{check, DiagnosticReport};
    pub use crate::pipeline::{Pipeline, RunReport};
}
