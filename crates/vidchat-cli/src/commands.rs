use std::io::{self, BufWriter};
use std::ops::ControlFlow;

use anyhow::{Context, Result};
use tracing::{info, warn};
use vidchat_cli::interrupt::cancel_on_interrupt;
use vidchat_cli::output::{JsonLinesWriter, is_closed_pipe};
use vidchat_cli::settings::{load_config, load_normalizer, load_rules};
use vidchat_client::{ChatRetriever, RunSummary, video_id_from_url};

use crate::cli::{FetchArgs, RulesArgs};
use crate::summary::print_rules;

/// What a finished fetch reports back to `main`.
pub struct FetchOutcome {
    pub video_id: String,
    pub summary: RunSummary,
}

pub fn run_fetch(args: &FetchArgs) -> Result<FetchOutcome> {
    let video_id = video_id_from_url(&args.video)?;
    let config = load_config(args.config.as_deref(), &args.overrides())?;
    let normalizer = load_normalizer(args.rules.as_deref())?;

    let mut retriever =
        ChatRetriever::connect(config, normalizer).context("failed to open a session")?;
    if let Err(error) = cancel_on_interrupt(retriever.cancellation().clone()) {
        warn!("Ctrl-C will not stop the run cleanly: {error:#}");
    }

    let mut output = JsonLinesWriter::new(BufWriter::new(io::stdout().lock()));
    let mut write_error = None;
    let retrieval = retriever
        .run(&video_id, |message| match output.write_message(message) {
            Ok(()) => ControlFlow::Continue(()),
            Err(err) => {
                write_error = Some(err);
                ControlFlow::Break(())
            }
        })
        .with_context(|| format!("retrieval of video {video_id} failed"))?;

    match write_error {
        Some(err) if is_closed_pipe(&err) => {
            warn!("output closed, stopping");
        }
        Some(err) => return Err(err).context("failed to write messages"),
        None => {}
    }
    info!(written = output.written(), "output complete");

    let diagnostics = &retrieval.summary.diagnostics;
    if !diagnostics.is_clean() {
        info!(
            unknown_keys = diagnostics.unknown_key_count(),
            unknown_variants = diagnostics.unknown_variant_count(),
            transform_failures = diagnostics.transform_failure_count(),
            records_failed = diagnostics.records_failed,
            "normalization diagnostics"
        );
    }

    Ok(FetchOutcome {
        video_id,
        summary: retrieval.summary,
    })
}

pub fn run_rules(args: &RulesArgs) -> Result<()> {
    let rules = load_rules(args.rules.as_deref())?;
    print_rules(&rules);
    Ok(())
}
