//! Batch re-processing over caller-supplied records.
//!
//! Every helper isolates failures per item: an item that fails is recorded as
//! a [`FailureRecord`] in its [`ItemOutcome`] and the batch carries on. Network
//! helpers run a bounded worker pool; generation is additionally paced by a
//! [`RateLimiter`] shared by all workers.

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::config::BatchConfig;
use crate::error::FailureRecord;
use crate::extract::{ExtractedContent, fetch_and_extract};
use crate::fetch::FetchConfig;
use crate::postprocess::reclean;
use crate::ratelimit::RateLimiter;
use crate::rewrite::{Layout, RewriteEngine, RewriteRequest, RewriteResult};

/// A stored page as the caller keeps it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub id: u64,
    pub url: String,
    #[serde(default)]
    pub cleaned_text: String,
}

/// Result for one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemOutcome<T> {
    pub id: u64,
    pub result: Result<T, FailureRecord>,
}

/// Per-item outcomes, in input order, with counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport<T> {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<ItemOutcome<T>>,
}

impl<T> BatchReport<T> {
    pub fn from_outcomes(outcomes: Vec<ItemOutcome<T>>) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.result.is_ok()).count();
        Self { processed: outcomes.len(), succeeded, failed: outcomes.len() - succeeded, outcomes }
    }

    pub fn failures(&self) -> impl Iterator<Item = (u64, &FailureRecord)> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().err().map(|f| (o.id, f)))
    }

    fn log_summary(&self, operation: &str) {
        info!(
            operation,
            processed = self.processed,
            succeeded = self.succeeded,
            failed = self.failed,
            "batch finished"
        );
    }
}

/// Re-cleans every record's stored text without refetching.
pub fn reclean_all(records: &[PageRecord]) -> BatchReport<String> {
    let outcomes = records
        .iter()
        .map(|record| ItemOutcome { id: record.id, result: Ok(reclean(&record.cleaned_text)) })
        .collect();

    let report = BatchReport::from_outcomes(outcomes);
    report.log_summary("reclean");
    report
}

/// Refetches and re-extracts every record, `workers` at a time.
pub async fn refetch_all(
    records: &[PageRecord], config: &FetchConfig, workers: usize,
) -> BatchReport<ExtractedContent> {
    let config = Arc::new(config.clone());

    let report = run_bounded(records, workers, |record| {
        let config = Arc::clone(&config);
        async move { fetch_and_extract(&record.url, &config).await.map_err(|e| FailureRecord::from_fetch(&e)) }
    })
    .await;

    report.log_summary("refetch");
    report
}

/// Generates `layout` content for every record.
///
/// Backend calls are paced to `batch.requests_per_minute` across all workers.
/// Records with blank text fail without using a rate slot.
pub async fn generate_all(
    engine: &RewriteEngine, records: &[PageRecord], layout: Layout, batch: &BatchConfig,
) -> BatchReport<RewriteResult> {
    let limiter = RateLimiter::per_minute(batch.requests_per_minute);

    let report = run_bounded(records, batch.workers, |record| {
        let engine = engine.clone();
        let limiter = limiter.clone();
        async move {
            let request = RewriteRequest::new(layout, record.cleaned_text);
            engine.preflight(layout).map_err(|e| FailureRecord::from_rewrite(&e))?;
            request.validate().map_err(|e| FailureRecord::from_rewrite(&e))?;
            limiter.acquire().await;
            engine.generate_request(&request).await.map_err(|e| FailureRecord::from_rewrite(&e))
        }
    })
    .await;

    report.log_summary("generate");
    report
}

async fn run_bounded<T, F, Fut>(records: &[PageRecord], workers: usize, job: F) -> BatchReport<T>
where
    T: Send + 'static,
    F: Fn(PageRecord) -> Fut,
    Fut: Future<Output = Result<T, FailureRecord>> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let mut handles = Vec::with_capacity(records.len());

    for record in records.iter().cloned() {
        let id = record.id;
        let semaphore = Arc::clone(&semaphore);
        let work = job(record);
        let handle = tokio::spawn(async move {
            match semaphore.acquire_owned().await {
                Ok(_permit) => work.await,
                Err(e) => Err(FailureRecord::new(None, &e.to_string())),
            }
        });
        handles.push((id, handle));
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    for (id, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => Err(FailureRecord::new(None, &format!("worker failed: {e}"))),
        };
        if let Err(failure) = &result {
            warn!(id, status = ?failure.http_status, message = %failure.message, "item failed");
        }
        outcomes.push(ItemOutcome { id, result });
    }

    BatchReport::from_outcomes(outcomes)
}
