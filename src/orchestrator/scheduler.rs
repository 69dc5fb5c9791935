//! Batch scheduler
//!
//! ## Responsibilities
//!
//! Drives one whole aggregation run:
//!
//! 1. **Discovery**: one page-1 probe to learn the total page count
//! 2. **Batching**: pages split into fixed-size batches, processed strictly
//!    one batch at a time
//! 3. **Worker pool**: a small set of sessions allocated per batch and torn
//!    down at batch end, so resource usage never grows with page count
//! 4. **Chunk dispatch**: within a batch, chunks of pages fetched
//!    concurrently, one page per worker, round-robin
//! 5. **Folding**: outcomes accumulated after each chunk's barrier, so the
//!    run state never sees concurrent writers
//! 6. **Failure gate**: a run missing too many pages fails outright rather
//!    than publishing an undercount

use crate::config::Config;
use crate::error::{AppError, AppResult, DiscoveryError};
use crate::infrastructure::transport::{Transport, TransportSession};
use crate::orchestrator::page_task::{self, PageOutcome};
use crate::services::decoder;
use futures::future::join_all;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Result of one aggregation run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub grand_total: u64,
    pub processed_pages: usize,
    pub failed_pages: Vec<usize>,
    pub total_pages: usize,
}

/// Running accumulator, mutated only between chunk barriers
#[derive(Debug, Default)]
struct RunState {
    grand_total: u64,
    processed: usize,
    failed_pages: Vec<usize>,
}

impl RunState {
    fn fold(&mut self, outcome: PageOutcome) {
        match outcome {
            PageOutcome::Success { page_sum } => {
                self.grand_total += page_sum;
                self.processed += 1;
            }
            PageOutcome::Failure { page, reason } => {
                warn!("⚠️ page {} failed: {}", page, reason);
                self.failed_pages.push(page);
            }
        }
    }
}

/// Run the full aggregation: discovery, batched fetch, failure gate.
pub async fn run_aggregation(transport: &dyn Transport, config: &Config) -> AppResult<RunReport> {
    let total_pages = discover_total_pages(transport, config).await?;
    info!("📊 detected {} total pages", total_pages);

    let page_timeout = Duration::from_millis(config.page_timeout_ms);
    let page_retry_delay = Duration::from_millis(config.page_retry_delay_ms);

    let pages: Vec<usize> = (1..=total_pages).collect();
    let total_batches = pages.chunks(config.batch_size).count();

    let mut state = RunState::default();

    for (batch_idx, batch) in pages.chunks(config.batch_size).enumerate() {
        log_batch_start(batch_idx + 1, total_batches, batch, total_pages);

        let worker_count = config.max_concurrent.min(batch.len());
        let workers = open_workers(transport, worker_count).await?;

        for chunk in batch.chunks(config.max_concurrent) {
            let tasks = chunk.iter().enumerate().map(|(slot, &page)| {
                let worker = workers[slot % workers.len()].as_ref();
                page_task::fetch_page(
                    worker,
                    &config.leaderboard_url,
                    &config.leaderboard_sum_field,
                    page,
                    page_timeout,
                    page_retry_delay,
                )
            });

            // Barrier: every fetch in the chunk lands before any folding,
            // so RunState needs no lock
            for outcome in join_all(tasks).await {
                state.fold(outcome);
            }
        }

        for worker in &workers {
            worker.close().await;
        }

        log_batch_complete(batch_idx + 1, &state, total_pages);
    }

    let failed = state.failed_pages.len();
    let failure_rate = if total_pages == 0 {
        0.0
    } else {
        failed as f64 / total_pages as f64
    };

    if failure_rate > config.max_failure_rate {
        warn!(
            "❌ {} of {} pages failed ({:.1}%), run total discarded",
            failed,
            total_pages,
            failure_rate * 100.0
        );
        return Err(AppError::HighFailureRate {
            failed,
            total: total_pages,
        });
    }

    if failed > 0 {
        warn!("⚠️ {} pages missing from the total (within tolerance)", failed);
    }
    info!(
        "🏆 aggregation done: {} total across {} of {} pages",
        state.grand_total, state.processed, total_pages
    );

    Ok(RunReport {
        grand_total: state.grand_total,
        processed_pages: state.processed,
        failed_pages: state.failed_pages,
        total_pages,
    })
}

/// Probe page 1 for the pagination envelope. One short-delay retry, then
/// the whole run fails: no pages can be planned without a total.
async fn discover_total_pages(transport: &dyn Transport, config: &Config) -> AppResult<usize> {
    let session = transport
        .open_session()
        .await
        .map_err(AppError::Transport)?;

    let result = match discovery_attempt(session.as_ref(), config).await {
        Ok(total) => Ok(total),
        Err(reason) => {
            warn!("⚠️ page-count discovery failed ({}), retrying once", reason);
            sleep(Duration::from_millis(config.page_retry_delay_ms)).await;
            discovery_attempt(session.as_ref(), config)
                .await
                .map_err(|reason| AppError::Discovery(DiscoveryError::ProbeFailed { reason }))
        }
    };

    session.close().await;
    result
}

async fn discovery_attempt(
    session: &dyn TransportSession,
    config: &Config,
) -> Result<usize, String> {
    let url = format!("{}?page=1", config.leaderboard_url);
    let response = session
        .fetch(&url, Duration::from_millis(config.discovery_timeout_ms))
        .await
        .map_err(|e| e.to_string())?;

    if !response.is_success() {
        return Err(format!("HTTP {}", response.status));
    }

    decoder::decode_total_pages(&response.body).map_err(|e| e.to_string())
}

/// Allocate the batch's worker pool, releasing any partial pool on failure
async fn open_workers(
    transport: &dyn Transport,
    count: usize,
) -> AppResult<Vec<Box<dyn TransportSession>>> {
    let mut workers = Vec::with_capacity(count);
    for _ in 0..count {
        match transport.open_session().await {
            Ok(session) => workers.push(session),
            Err(e) => {
                for worker in &workers {
                    worker.close().await;
                }
                return Err(AppError::Transport(e));
            }
        }
    }
    Ok(workers)
}

// ========== Logging helpers ==========

fn log_batch_start(batch_num: usize, total_batches: usize, batch: &[usize], total: usize) {
    info!("{}", "=".repeat(60));
    info!("📦 batch {}/{}", batch_num, total_batches);
    info!(
        "📄 pages {}-{} of {}",
        batch.first().copied().unwrap_or_default(),
        batch.last().copied().unwrap_or_default(),
        total
    );
    info!("{}", "=".repeat(60));
}

fn log_batch_complete(batch_num: usize, state: &RunState, total: usize) {
    info!("{}", "─".repeat(60));
    info!(
        "✓ batch {} done: {} of {} pages processed, running total {}",
        batch_num, state.processed, total, state.grand_total
    );
    info!("{}", "─".repeat(60));
}
