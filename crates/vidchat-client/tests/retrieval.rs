//! Retrieval state machine tests over a scripted transport.

use std::collections::VecDeque;
use std::ops::ControlFlow;
use std::time::Duration;

use serde_json::{Value, json};
use vidchat_client::{
    CancellationToken, ChatRetriever, ChatTransport, ClientError, Mode, RetrievalConfig,
    VideoMetadata,
};
use vidchat_normalize::Normalizer;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Metadata,
    Live,
    Window(f64, f64),
}

enum Reply {
    Page(Vec<Value>),
    Transient(&'static str),
}

/// Transport that replays a fixed script and cancels the run once the live
/// script is used up.
struct ScriptedTransport {
    metadata: std::result::Result<VideoMetadata, &'static str>,
    live: VecDeque<Reply>,
    window_failures: usize,
    /// Start of a window that fails on every attempt.
    broken_window: Option<f64>,
    calls: Vec<Call>,
    cancel: CancellationToken,
}

impl ScriptedTransport {
    fn new(metadata: VideoMetadata, cancel: &CancellationToken) -> Self {
        Self {
            metadata: Ok(metadata),
            live: VecDeque::new(),
            window_failures: 0,
            broken_window: None,
            calls: Vec::new(),
            cancel: cancel.clone(),
        }
    }

    fn live_reply(mut self, reply: Reply) -> Self {
        self.live.push_back(reply);
        self
    }
}

impl ChatTransport for ScriptedTransport {
    fn fetch_metadata(&mut self, _video_id: &str) -> vidchat_client::Result<VideoMetadata> {
        self.calls.push(Call::Metadata);
        self.metadata
            .clone()
            .map_err(|reason| ClientError::Bootstrap(reason.to_string()))
    }

    fn poll_live(&mut self, _video_id: &str) -> vidchat_client::Result<Vec<Value>> {
        self.calls.push(Call::Live);
        match self.live.pop_front() {
            Some(Reply::Page(nodes)) => Ok(nodes),
            Some(Reply::Transient(reason)) => Err(ClientError::ApiResponse(reason.to_string())),
            None => {
                self.cancel.cancel();
                Ok(Vec::new())
            }
        }
    }

    fn fetch_window(
        &mut self,
        _video_id: &str,
        start: f64,
        end: f64,
    ) -> vidchat_client::Result<Vec<Value>> {
        self.calls.push(Call::Window(start, end));
        if self.broken_window == Some(start) {
            return Err(ClientError::ApiResponse("window unavailable".to_string()));
        }
        if self.window_failures > 0 {
            self.window_failures -= 1;
            return Err(ClientError::Network("connection reset".to_string()));
        }
        Ok(vec![json!({
            "timeoffset": start,
            "ufipayload": {
                "comments": [{"id": format!("c{start}"), "author": "1", "body": {"text": format!("at {start}")}}],
                "profiles": {"1": {"id": "1", "name": "Viewer"}}
            }
        })])
    }
}

fn fast_config() -> RetrievalConfig {
    RetrievalConfig {
        poll_interval: Duration::ZERO,
        backoff_base: Duration::ZERO,
        backoff_max: Duration::ZERO,
        ..RetrievalConfig::default()
    }
}

fn comment(id: &str) -> Value {
    json!({"id": id, "body": {"text": format!("message {id}")}})
}

fn retriever(
    transport: ScriptedTransport,
    config: RetrievalConfig,
    cancel: &CancellationToken,
) -> ChatRetriever<ScriptedTransport> {
    ChatRetriever::new(transport, Normalizer::builtin(), config).with_cancellation(cancel.clone())
}

fn ids(messages: &[vidchat_model::ChatMessage]) -> Vec<&str> {
    messages.iter().map(|m| m.message_id.as_str()).collect()
}

#[test]
fn recorded_video_walks_fixed_windows() {
    let cancel = CancellationToken::new();
    let transport = ScriptedTransport::new(VideoMetadata::recorded("7", 125.0), &cancel);
    let mut retriever = retriever(transport, fast_config(), &cancel);

    let retrieval = retriever.collect("7").unwrap();

    assert_eq!(
        retriever.transport().calls,
        vec![
            Call::Metadata,
            Call::Window(0.0, 60.0),
            Call::Window(60.0, 120.0),
            Call::Window(120.0, 125.0),
        ]
    );
    assert_eq!(retrieval.summary.mode, Some(Mode::VodPaginate));
    assert_eq!(retrieval.summary.requests, 4);
    assert_eq!(ids(&retrieval.messages), vec!["c0", "c60", "c120"]);
    let first = &retrieval.messages[0];
    assert_eq!(first.time_text.as_deref(), Some("0:00"));
    assert_eq!(first.author.as_ref().unwrap().name.as_deref(), Some("Viewer"));
    assert!(!retrieval.summary.cancelled);
}

#[test]
fn explicit_range_forces_replay_and_is_clamped() {
    let cancel = CancellationToken::new();
    let transport = ScriptedTransport::new(VideoMetadata::live("7"), &cancel);
    let config = RetrievalConfig {
        start_time: Some(30.0),
        end_time: Some(100.0),
        ..fast_config()
    };
    let mut retriever = retriever(transport, config, &cancel);

    let retrieval = retriever.collect("7").unwrap();

    assert_eq!(retrieval.summary.mode, Some(Mode::VodPaginate));
    assert_eq!(
        retriever.transport().calls[1..],
        [Call::Window(30.0, 90.0), Call::Window(90.0, 100.0)]
    );
}

#[test]
fn live_polls_skip_recent_duplicates() {
    let cancel = CancellationToken::new();
    let transport = ScriptedTransport::new(VideoMetadata::live("7"), &cancel)
        .live_reply(Reply::Page(vec![comment("3"), comment("2"), comment("1")]))
        .live_reply(Reply::Page(vec![comment("4"), comment("3"), comment("2")]));
    let mut retriever = retriever(transport, fast_config(), &cancel);

    let mut streamed = Vec::new();
    let retrieval = retriever
        .run("7", |message| {
            streamed.push(message.message_id.clone());
            ControlFlow::Continue(())
        })
        .unwrap();

    assert_eq!(retrieval.summary.mode, Some(Mode::LivePoll));
    assert_eq!(ids(&retrieval.messages), vec!["1", "2", "3", "4"]);
    assert_eq!(streamed, vec!["1", "2", "3", "4"]);
    assert_eq!(retrieval.summary.duplicates_skipped, 2);
    assert!(retrieval.summary.cancelled);
}

#[test]
fn transient_errors_are_retried() {
    let cancel = CancellationToken::new();
    let transport = ScriptedTransport::new(VideoMetadata::live("7"), &cancel)
        .live_reply(Reply::Transient("no feedback"))
        .live_reply(Reply::Page(vec![comment("1")]));
    let mut retriever = retriever(transport, fast_config(), &cancel);

    let retrieval = retriever.collect("7").unwrap();

    assert_eq!(ids(&retrieval.messages), vec!["1"]);
    assert_eq!(retrieval.summary.retries, 1);
}

#[test]
fn exhausted_live_polls_back_off_and_keep_polling() {
    let cancel = CancellationToken::new();
    let mut transport = ScriptedTransport::new(VideoMetadata::live("7"), &cancel);
    for _ in 0..10 {
        transport = transport.live_reply(Reply::Transient("errors reported"));
    }
    let config = RetrievalConfig {
        max_retries: 2,
        ..fast_config()
    };
    let mut retriever = retriever(transport, config, &cancel);

    let retrieval = retriever.collect("7").unwrap();

    let live_calls = retriever
        .transport()
        .calls
        .iter()
        .filter(|call| **call == Call::Live)
        .count();
    // Three exhausted rounds of three attempts, one failure, then the empty
    // page that ends the script.
    assert_eq!(live_calls, 11);
    assert_eq!(retrieval.summary.polls_failed, 3);
    assert_eq!(retrieval.summary.retries, 7);
    assert_eq!(retrieval.summary.requests, 12);
    assert!(retrieval.summary.cancelled);
    assert!(retrieval.messages.is_empty());
}

#[test]
fn persistently_failing_window_is_skipped() {
    let cancel = CancellationToken::new();
    let mut transport = ScriptedTransport::new(VideoMetadata::recorded("7", 180.0), &cancel);
    transport.broken_window = Some(60.0);
    let config = RetrievalConfig {
        max_retries: 2,
        ..fast_config()
    };
    let mut retriever = retriever(transport, config, &cancel);

    let retrieval = retriever.collect("7").unwrap();

    assert_eq!(
        retriever.transport().calls,
        vec![
            Call::Metadata,
            Call::Window(0.0, 60.0),
            Call::Window(60.0, 120.0),
            Call::Window(60.0, 120.0),
            Call::Window(60.0, 120.0),
            Call::Window(120.0, 180.0),
        ]
    );
    assert_eq!(ids(&retrieval.messages), vec!["c0", "c120"]);
    assert_eq!(retrieval.summary.windows_failed, 1);
    assert_eq!(retrieval.summary.retries, 2);
    assert!(!retrieval.summary.cancelled);
}

#[test]
fn replay_window_is_retried_then_continues() {
    let cancel = CancellationToken::new();
    let mut transport = ScriptedTransport::new(VideoMetadata::recorded("7", 60.0), &cancel);
    transport.window_failures = 1;
    let mut retriever = retriever(transport, fast_config(), &cancel);

    let retrieval = retriever.collect("7").unwrap();

    assert_eq!(retrieval.summary.retries, 1);
    assert_eq!(ids(&retrieval.messages), vec!["c0"]);
}

#[test]
fn fatal_errors_are_not_retried() {
    let cancel = CancellationToken::new();
    let mut transport = ScriptedTransport::new(VideoMetadata::live("7"), &cancel);
    transport.metadata = Err("lsd form token not found");
    let mut retriever = retriever(transport, fast_config(), &cancel);

    let err = retriever.collect("7").unwrap_err();

    assert!(matches!(err, ClientError::Bootstrap(_)));
    assert_eq!(retriever.transport().calls, vec![Call::Metadata]);
}

#[test]
fn cancelled_before_start_issues_no_polls() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let transport = ScriptedTransport::new(VideoMetadata::recorded("7", 600.0), &cancel);
    let mut retriever = retriever(transport, fast_config(), &cancel);

    let retrieval = retriever.collect("7").unwrap();

    assert!(retrieval.summary.cancelled);
    assert!(retrieval.messages.is_empty());
    assert_eq!(retriever.transport().calls, vec![Call::Metadata]);
}

#[test]
fn message_limit_stops_the_run() {
    let cancel = CancellationToken::new();
    let transport = ScriptedTransport::new(VideoMetadata::recorded("7", 600.0), &cancel);
    let config = RetrievalConfig {
        max_messages: Some(2),
        ..fast_config()
    };
    let mut retriever = retriever(transport, config, &cancel);

    let retrieval = retriever.collect("7").unwrap();

    assert_eq!(retrieval.messages.len(), 2);
    assert!(retrieval.summary.limit_reached);
    assert_eq!(retriever.transport().calls.len(), 3);
}

#[test]
fn malformed_records_do_not_stop_the_loop() {
    let cancel = CancellationToken::new();
    let transport = ScriptedTransport::new(VideoMetadata::live("7"), &cancel).live_reply(
        Reply::Page(vec![comment("2"), Value::Null, json!({"body": {"text": "no id"}}), comment("1")]),
    );
    let mut retriever = retriever(transport, fast_config(), &cancel);

    let retrieval = retriever.collect("7").unwrap();

    assert_eq!(ids(&retrieval.messages), vec!["1", "2"]);
    assert_eq!(retrieval.summary.records_failed, 2);
    assert_eq!(retrieval.summary.diagnostics.records_failed, 2);
}

#[test]
fn sink_can_stop_the_run() {
    let cancel = CancellationToken::new();
    let transport = ScriptedTransport::new(VideoMetadata::recorded("7", 600.0), &cancel);
    let mut retriever = retriever(transport, fast_config(), &cancel);

    let retrieval = retriever
        .run("7", |_| ControlFlow::Break(()))
        .unwrap();

    assert_eq!(retrieval.messages.len(), 1);
    assert!(retrieval.summary.cancelled);
}

#[test]
fn live_video_without_duration_needs_an_end_for_replay() {
    let cancel = CancellationToken::new();
    let transport = ScriptedTransport::new(VideoMetadata::live("7"), &cancel);
    let config = RetrievalConfig {
        start_time: Some(0.0),
        ..fast_config()
    };
    let mut retriever = retriever(transport, config, &cancel);

    let err = retriever.collect("7").unwrap_err();

    assert!(matches!(err, ClientError::Config(_)));
}
