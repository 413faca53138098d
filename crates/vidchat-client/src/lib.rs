//! Chat retrieval for live and recorded videos.
//!
//! # Overview
//!
//! - **Session** ([`Session`]): homepage bootstrap harvesting the cookies
//!   and form tokens every later request needs.
//! - **Transport** ([`ChatTransport`], [`HttpTransport`]): one method per
//!   endpoint (metadata, live poll, replay window).
//! - **Retrieval** ([`ChatRetriever`]): picks live polling or windowed
//!   replay, retries transient failures with backoff, deduplicates live
//!   pages and streams normalized messages to a sink.
//!
//! # Example
//!
//! ```no_run
//! use std::ops::ControlFlow;
//!
//! use vidchat_client::{ChatRetriever, RetrievalConfig, video_id_from_url};
//! use vidchat_normalize::Normalizer;
//!
//! let video_id = video_id_from_url("https://www.facebook.com/page/videos/382024729792892")?;
//! let mut retriever = ChatRetriever::connect(RetrievalConfig::default(), Normalizer::builtin())?;
//! let retrieval = retriever.run(&video_id, |message| {
//!     println!("{}", message.message.as_deref().unwrap_or_default());
//!     ControlFlow::Continue(())
//! })?;
//! println!("{} messages", retrieval.summary.emitted);
//! # Ok::<(), vidchat_client::ClientError>(())
//! ```

pub mod cancel;
pub mod config;
pub mod dedup;
pub mod error;
pub mod manifest;
pub mod markup;
pub mod metadata;
pub mod retrieval;
pub mod retry;
pub mod session;
pub mod transport;
pub mod url;

pub use cancel::CancellationToken;
pub use config::RetrievalConfig;
pub use dedup::DedupWindow;
pub use error::{ClientError, Result};
pub use metadata::VideoMetadata;
pub use retrieval::{ChatRetriever, Mode, Retrieval, RunSummary, replay_windows, select_mode};
pub use retry::RetryPolicy;
pub use session::Session;
pub use transport::{ChatTransport, HttpTransport};
pub use url::video_id_from_url;
