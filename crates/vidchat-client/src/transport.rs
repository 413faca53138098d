//! Endpoint transport.
//!
//! [`ChatTransport`] is the seam between the retrieval state machine and the
//! network. [`HttpTransport`] talks to the real endpoints; tests script an
//! in-memory implementation.

use serde_json::{Value, json};
use tracing::debug;

use crate::config::RetrievalConfig;
use crate::error::Result;
use crate::markup;
use crate::metadata::{self, VideoMetadata};
use crate::session::{HOMEPAGE, Session};

/// Operation id of the live comment query.
const LIVE_COMMENTS_DOC_ID: &str = "4889623951078943";

/// One request per call; implementations never retry internally.
pub trait ChatTransport {
    /// Live flag and duration of a video.
    fn fetch_metadata(&mut self, video_id: &str) -> Result<VideoMetadata>;

    /// Newest page of top-level comment nodes, newest first.
    fn poll_live(&mut self, video_id: &str) -> Result<Vec<Value>>;

    /// Replay entries for the window `[start, end)` in seconds.
    fn fetch_window(&mut self, video_id: &str, start: f64, end: f64) -> Result<Vec<Value>>;
}

/// Transport over a bootstrapped [`Session`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    session: Session,
}

impl HttpTransport {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Bootstrap a fresh session and wrap it.
    pub fn connect(config: &RetrievalConfig) -> Result<Self> {
        Ok(Self::new(Session::bootstrap(config)?))
    }
}

impl ChatTransport for HttpTransport {
    fn fetch_metadata(&mut self, video_id: &str) -> Result<VideoMetadata> {
        let url = format!(
            "{HOMEPAGE}/video/tahoe/async/{video_id}/?chain=true&isvideo=true&payloadtype=primary"
        );
        debug!(%url, "fetching video metadata");
        let body = self.session.post(&url, &[], &[])?;
        metadata::parse_video_metadata(&markup::parse_guarded_json(&body)?, video_id)
    }

    fn poll_live(&mut self, video_id: &str) -> Result<Vec<Value>> {
        let url = format!("{HOMEPAGE}/api/graphql/");
        let variables = json!({ "videoID": video_id }).to_string();
        let body = self.session.post(
            &url,
            &[],
            &[
                ("variables", variables),
                ("doc_id", LIVE_COMMENTS_DOC_ID.to_string()),
            ],
        )?;
        metadata::parse_live_page(&markup::parse_guarded_json(&body)?)
    }

    fn fetch_window(&mut self, video_id: &str, start: f64, end: f64) -> Result<Vec<Value>> {
        let url = format!("{HOMEPAGE}/videos/vodcomments/");
        let query = [
            ("eft_id", video_id.to_string()),
            ("target_ufi_instance_id", "u_2_1".to_string()),
            ("start_time", format_seconds(start)),
            ("end_time", format_seconds(end)),
        ];
        let body = self.session.post(&url, &query, &[])?;
        metadata::parse_replay_window(&markup::parse_guarded_json(&body)?)
    }
}

/// Whole seconds without a fraction, others as given.
fn format_seconds(seconds: f64) -> String {
    if seconds.fract() == 0.0 && seconds.abs() < 1e15 {
        format!("{}", seconds as i64)
    } else {
        seconds.to_string()
    }
}
