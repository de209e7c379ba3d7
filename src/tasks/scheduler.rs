use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;
use tokio::time::{interval, sleep, Duration};

use crate::core::state::AppState;
use crate::services::sandbox::SandboxExecutor;
use crate::tasks::judging;

/// Runs the judge worker pool until a shutdown signal arrives: N judge
/// workers draining the pending queue plus a maintenance loop that
/// requeues stale claims left behind by crashed workers.
pub(crate) async fn run(state: AppState) -> Result<()> {
    let executor = Arc::new(SandboxExecutor::from_settings(state.settings().judge()));

    if !executor.is_available().await {
        tracing::warn!(
            interpreter = %state.settings().judge().interpreter,
            "judge interpreter not found; submissions will queue until one is available"
        );
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let concurrency = state.settings().judge().worker_concurrency;

    let mut handles = Vec::with_capacity(concurrency + 1);

    for _ in 0..concurrency {
        handles.push(tokio::spawn(judge_worker(
            state.clone(),
            executor.clone(),
            shutdown_rx.clone(),
        )));
    }

    handles.push(tokio::spawn(requeue_stale_loop(state.clone(), shutdown_rx.clone())));

    crate::core::shutdown::shutdown_signal().await;
    if shutdown_tx.send(true).is_err() {
        tracing::warn!("Failed to broadcast shutdown signal to background tasks");
    }

    for handle in handles {
        if let Err(err) = handle.await {
            tracing::error!(error = %err, "Background task join failed");
        }
    }

    Ok(())
}

async fn judge_worker(
    state: AppState,
    executor: Arc<SandboxExecutor>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        if *shutdown.borrow() {
            break;
        }

        match judging::claim_and_judge(&state, executor.as_ref()).await {
            Ok(true) => continue,
            Ok(false) => {}
            Err(err) => tracing::error!(error = %err, "Failed to judge submission"),
        }

        tokio::select! {
            _ = shutdown.changed() => break,
            _ = sleep(Duration::from_secs(1)) => {}
        }
    }
}

async fn requeue_stale_loop(state: AppState, mut shutdown: watch::Receiver<bool>) {
    let mut tick = interval(Duration::from_secs(60));
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tick.tick() => {
                if let Err(err) = judging::requeue_stale(&state).await {
                    tracing::error!(error = %err, "requeue_stale failed");
                }
            }
        }
    }
}
