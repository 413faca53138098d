//! Dual-mode chat retrieval.
//!
//! ```text
//! INIT ──metadata──► LIVE_POLL    (live, no time range)   ──► TERMINATED
//!                └─► VOD_PAGINATE (otherwise)             ──► TERMINATED
//! ```
//!
//! One retrieval runs on the calling thread and issues one request at a
//! time. Cancellation is checked between requests and during waits.

use std::fmt;
use std::ops::ControlFlow;
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, info_span, trace, warn};
use vidchat_model::ChatMessage;
use vidchat_normalize::{Diagnostics, Normalizer, RecordOutcome};

use crate::cancel::CancellationToken;
use crate::config::RetrievalConfig;
use crate::dedup::DedupWindow;
use crate::error::{ClientError, Result};
use crate::metadata::VideoMetadata;
use crate::retry::RetryPolicy;
use crate::transport::{ChatTransport, HttpTransport};

/// Longest single sleep between cancellation checks.
const CANCEL_CHECK_INTERVAL: Duration = Duration::from_millis(100);

/// Retrieval regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Poll the newest page of a broadcasting stream.
    LivePoll,
    /// Walk a recording in fixed time windows.
    VodPaginate,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::LivePoll => "live_poll",
            Self::VodPaginate => "vod_paginate",
        })
    }
}

/// Live polling only when the stream is live and no range was requested.
pub fn select_mode(metadata: &VideoMetadata, config: &RetrievalConfig) -> Mode {
    if metadata.is_live && !config.has_time_range() {
        Mode::LivePoll
    } else {
        Mode::VodPaginate
    }
}

/// Split `[start, end)` into consecutive windows of at most `step` seconds.
pub fn replay_windows(start: f64, end: f64, step: f64) -> Vec<(f64, f64)> {
    let mut windows = Vec::new();
    if !(step > 0.0 && start.is_finite() && end.is_finite()) {
        return windows;
    }
    let mut window_start = start.max(0.0);
    while window_start < end {
        let window_end = (window_start + step).min(end);
        windows.push((window_start, window_end));
        window_start = window_end;
    }
    windows
}

/// Counters for one retrieval call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub mode: Option<Mode>,
    pub emitted: usize,
    pub duplicates_skipped: usize,
    pub records_failed: usize,
    pub requests: usize,
    pub retries: usize,
    /// Replay windows skipped after their retries ran out.
    pub windows_failed: usize,
    /// Live polls that ran out of retries.
    pub polls_failed: usize,
    pub cancelled: bool,
    pub limit_reached: bool,
    pub diagnostics: Diagnostics,
}

/// Result of one retrieval call.
#[derive(Debug, Clone, Default)]
pub struct Retrieval {
    /// Every emitted message, in emission order.
    pub messages: Vec<ChatMessage>,
    pub summary: RunSummary,
}

impl Retrieval {
    fn emit<F>(&mut self, message: ChatMessage, sink: &mut F, max_messages: Option<usize>) -> ControlFlow<()>
    where
        F: FnMut(&ChatMessage) -> ControlFlow<()>,
    {
        trace!(message_id = %message.message_id, "emitting message");
        let flow = sink(&message);
        self.messages.push(message);
        self.summary.emitted += 1;
        if max_messages.is_some_and(|max| self.messages.len() >= max) {
            self.summary.limit_reached = true;
            return ControlFlow::Break(());
        }
        if flow.is_break() {
            self.summary.cancelled = true;
        }
        flow
    }

    fn record_failure(&mut self, err: &vidchat_normalize::RecordError) {
        self.summary.records_failed += 1;
        warn!(error = %err, "skipping malformed record");
    }

    /// Emit successes and count failures. Breaks when the sink or the limit
    /// says stop.
    fn absorb<F>(
        &mut self,
        outcome: RecordOutcome,
        sink: &mut F,
        max_messages: Option<usize>,
    ) -> ControlFlow<()>
    where
        F: FnMut(&ChatMessage) -> ControlFlow<()>,
    {
        match outcome {
            Ok(message) => self.emit(message, sink, max_messages),
            Err(err) => {
                self.record_failure(&err);
                ControlFlow::Continue(())
            }
        }
    }
}

/// Drives one transport through the retrieval state machine.
pub struct ChatRetriever<T> {
    transport: T,
    normalizer: Normalizer,
    config: RetrievalConfig,
    cancel: CancellationToken,
}

impl ChatRetriever<HttpTransport> {
    /// Bootstrap a session and build a retriever over HTTP.
    pub fn connect(config: RetrievalConfig, normalizer: Normalizer) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::connect(&config)?;
        Ok(Self::new(transport, normalizer, config))
    }
}

impl<T: ChatTransport> ChatRetriever<T> {
    pub fn new(transport: T, normalizer: Normalizer, config: RetrievalConfig) -> Self {
        let normalizer = normalizer.with_max_depth(config.max_reply_depth);
        Self {
            transport,
            normalizer,
            config,
            cancel: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Retrieve without a sink.
    pub fn collect(&mut self, video_id: &str) -> Result<Retrieval> {
        self.run(video_id, |_| ControlFlow::Continue(()))
    }

    /// Retrieve chat for `video_id`, pushing each message to `sink` as soon
    /// as it is normalized.
    ///
    /// Returns when the replay range is exhausted, the message limit is
    /// reached, the sink breaks, or the call is cancelled. Fails on a fatal
    /// error or when the metadata lookup runs out of retries. A replay
    /// window that runs out of retries is skipped; a live poll that does is
    /// followed by a `backoff_max` wait and polling resumes.
    pub fn run<F>(&mut self, video_id: &str, mut sink: F) -> Result<Retrieval>
    where
        F: FnMut(&ChatMessage) -> ControlFlow<()>,
    {
        let span = info_span!("retrieve", video_id);
        let _guard = span.enter();

        let mut retrieval = Retrieval::default();
        let Some(metadata) =
            self.with_retry(&mut retrieval.summary, "metadata", |t| t.fetch_metadata(video_id))?
        else {
            retrieval.summary.cancelled = true;
            return Ok(retrieval);
        };

        let mode = select_mode(&metadata, &self.config);
        retrieval.summary.mode = Some(mode);
        info!(%mode, is_live = metadata.is_live, duration = ?metadata.duration, "starting retrieval");

        match mode {
            Mode::LivePoll => self.live_poll(video_id, &mut retrieval, &mut sink)?,
            Mode::VodPaginate => self.vod_paginate(video_id, &metadata, &mut retrieval, &mut sink)?,
        }

        info!(
            emitted = retrieval.summary.emitted,
            failed = retrieval.summary.records_failed,
            windows_failed = retrieval.summary.windows_failed,
            requests = retrieval.summary.requests,
            "retrieval finished"
        );
        Ok(retrieval)
    }

    fn live_poll<F>(&mut self, video_id: &str, retrieval: &mut Retrieval, sink: &mut F) -> Result<()>
    where
        F: FnMut(&ChatMessage) -> ControlFlow<()>,
    {
        let mut window = DedupWindow::new(self.config.dedup_capacity);
        let mut last_poll: Option<Instant> = None;

        loop {
            if let Some(last) = last_poll {
                let wait = self.config.poll_interval.saturating_sub(last.elapsed());
                if !self.pause(wait) {
                    retrieval.summary.cancelled = true;
                    return Ok(());
                }
            } else if self.cancel.is_cancelled() {
                retrieval.summary.cancelled = true;
                return Ok(());
            }
            last_poll = Some(Instant::now());

            let page = match self.with_retry(&mut retrieval.summary, "live_poll", |t| {
                t.poll_live(video_id)
            }) {
                Ok(Some(page)) => page,
                Ok(None) => {
                    retrieval.summary.cancelled = true;
                    return Ok(());
                }
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    retrieval.summary.polls_failed += 1;
                    warn!(error = %err, "live poll failed, backing off");
                    if !self.pause(self.config.backoff_max) {
                        retrieval.summary.cancelled = true;
                        return Ok(());
                    }
                    continue;
                }
            };

            let mut fresh = 0usize;
            // Pages arrive newest first.
            for node in page.iter().rev() {
                if let Some(id) = record_id(node) {
                    if !window.insert(id) {
                        retrieval.summary.duplicates_skipped += 1;
                        continue;
                    }
                }
                fresh += 1;
                let outcome = self
                    .normalizer
                    .normalize(node, &mut retrieval.summary.diagnostics);
                if retrieval
                    .absorb(outcome, sink, self.config.max_messages)
                    .is_break()
                {
                    return Ok(());
                }
            }
            debug!(fresh, page_size = page.len(), "live poll");
        }
    }

    fn vod_paginate<F>(
        &mut self,
        video_id: &str,
        metadata: &VideoMetadata,
        retrieval: &mut Retrieval,
        sink: &mut F,
    ) -> Result<()>
    where
        F: FnMut(&ChatMessage) -> ControlFlow<()>,
    {
        let start = self.config.start_time.unwrap_or(0.0);
        let end = match (self.config.end_time, metadata.duration) {
            (Some(end), Some(duration)) => end.min(duration),
            (Some(end), None) => end,
            (None, Some(duration)) => duration,
            (None, None) => {
                return Err(ClientError::Config(
                    "video duration is unknown; an end time is required".to_string(),
                ));
            }
        };

        for (window_start, window_end) in replay_windows(start, end, self.config.window_secs) {
            if self.cancel.is_cancelled() {
                retrieval.summary.cancelled = true;
                return Ok(());
            }
            let _window = info_span!("window", window_start, window_end).entered();

            let entries = match self.with_retry(&mut retrieval.summary, "replay_window", |t| {
                t.fetch_window(video_id, window_start, window_end)
            }) {
                Ok(Some(entries)) => entries,
                Ok(None) => {
                    retrieval.summary.cancelled = true;
                    return Ok(());
                }
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    retrieval.summary.windows_failed += 1;
                    warn!(error = %err, "skipping replay window");
                    continue;
                }
            };
            debug!(entries = entries.len(), "replay window");

            for entry in &entries {
                let outcomes = self
                    .normalizer
                    .normalize_replay_entry(entry, &mut retrieval.summary.diagnostics);
                for outcome in outcomes {
                    if retrieval
                        .absorb(outcome, sink, self.config.max_messages)
                        .is_break()
                    {
                        return Ok(());
                    }
                }
            }
        }
        Ok(())
    }

    /// Run one request with bounded retries. `Ok(None)` means cancelled
    /// while backing off.
    fn with_retry<R>(
        &mut self,
        summary: &mut RunSummary,
        step: &'static str,
        mut request: impl FnMut(&mut T) -> Result<R>,
    ) -> Result<Option<R>> {
        let policy = RetryPolicy::from_config(&self.config);
        let mut retries = 0u32;
        loop {
            summary.requests += 1;
            let err = match request(&mut self.transport) {
                Ok(value) => return Ok(Some(value)),
                Err(err) => err,
            };
            if !err.is_retryable() {
                return Err(err);
            }
            if !policy.allows(retries) {
                return Err(ClientError::RetriesExhausted {
                    attempts: retries + 1,
                    last: Box::new(err),
                });
            }
            let delay = policy.delay(retries);
            retries += 1;
            summary.retries += 1;
            warn!(
                step,
                attempt = retries,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "request failed, retrying"
            );
            if !self.pause(delay) {
                return Ok(None);
            }
        }
    }

    /// Sleep for `duration` unless cancelled. Returns `false` if cancelled.
    fn pause(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.cancel.is_cancelled() {
                return false;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return true;
            }
            thread::sleep(remaining.min(CANCEL_CHECK_INTERVAL));
        }
    }
}

fn record_id(node: &Value) -> Option<String> {
    match node.get("id")? {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}
