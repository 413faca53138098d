//! Ctrl-C handling for the blocking retrieval loop.

use std::future::Future;
use std::io;
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use tracing::{info, warn};
use vidchat_client::CancellationToken;

/// Cancel `token` on the first Ctrl-C.
///
/// The retrieval notices at its next cancellation check, so output already
/// written stays complete and the run summary is still printed.
pub fn cancel_on_interrupt(token: CancellationToken) -> Result<()> {
    watch(token, tokio::signal::ctrl_c()).map(drop)
}

/// Wait for `signal` on a detached thread with its own single-threaded
/// runtime, then cancel `token`.
fn watch<S>(token: CancellationToken, signal: S) -> Result<JoinHandle<()>>
where
    S: Future<Output = io::Result<()>> + Send + 'static,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start the signal runtime")?;
    thread::Builder::new()
        .name("vidchat-interrupt".to_string())
        .spawn(move || {
            runtime.block_on(async move {
                match signal.await {
                    Ok(()) => {
                        info!("interrupt received, stopping after the current request");
                        token.cancel();
                    }
                    Err(error) => warn!(%error, "cannot listen for Ctrl-C"),
                }
            });
        })
        .context("failed to start the interrupt thread")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_cancels_the_token() {
        let token = CancellationToken::new();
        let handle = watch(token.clone(), async { Ok(()) }).unwrap();
        handle.join().unwrap();
        assert!(token.is_cancelled());
    }

    #[test]
    fn listener_failure_leaves_the_run_alone() {
        let token = CancellationToken::new();
        let handle = watch(token.clone(), async { Err(io::Error::other("no terminal")) }).unwrap();
        handle.join().unwrap();
        assert!(!token.is_cancelled());
    }
}
