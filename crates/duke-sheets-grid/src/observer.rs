//! Hooks for watching a paging loader at work.
//!
//! Loaders never log on their own; they report to the observer they were
//! built with. [`TracingObserver`] forwards events to `tracing`,
//! [`NoopObserver`] drops them.

use std::time::Duration;

use crate::error::GridError;

/// Receives lifecycle events from an [`AsyncPagingLoader`](crate::AsyncPagingLoader).
///
/// Page and failure events are raised on the producer thread, timeout and
/// completion events on whichever side detects them. Every method has an
/// empty default.
pub trait LoaderObserver: Send + Sync {
    /// A page was fetched from the source
    fn page_fetched(&self, _page_no: usize, _rows: usize) {}

    /// The source failed; the stream ends with this error
    fn source_failed(&self, _page_no: usize, _page_size: usize, _error: &GridError) {}

    /// Buffered rows were dropped after a failure
    fn rows_discarded(&self, _count: usize) {}

    /// The producer could not enqueue within the offer timeout
    fn offer_timed_out(&self, _page_no: usize, _timeout: Duration) {}

    /// The consumer gave up waiting for the next row
    fn poll_timed_out(&self, _delivered: usize, _timeout: Duration) {}

    /// The producer stopped early because it was cancelled or the consumer left
    fn producer_stopped(&self, _page_no: usize) {}

    /// The producer enqueued end of stream after `pages` pages and `rows` rows
    fn source_exhausted(&self, _pages: usize, _rows: usize) {}
}

/// Observer that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl LoaderObserver for NoopObserver {}

/// Observer that emits `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl LoaderObserver for TracingObserver {
    fn page_fetched(&self, page_no: usize, rows: usize) {
        tracing::debug!(page_no, rows, "Fetched grid data page");
    }

    fn source_failed(&self, page_no: usize, page_size: usize, error: &GridError) {
        let cause = std::error::Error::source(error)
            .map(ToString::to_string)
            .unwrap_or_default();
        tracing::error!(page_no, page_size, %cause, "Failed to get grid data from source");
    }

    fn rows_discarded(&self, count: usize) {
        tracing::warn!(count, "Discarded buffered grid rows after failure");
    }

    fn offer_timed_out(&self, page_no: usize, timeout: Duration) {
        tracing::warn!(page_no, ?timeout, "Timed out enqueuing grid rows");
    }

    fn poll_timed_out(&self, delivered: usize, timeout: Duration) {
        tracing::warn!(delivered, ?timeout, "Timed out waiting for grid rows");
    }

    fn producer_stopped(&self, page_no: usize) {
        tracing::debug!(page_no, "Grid data producer stopped before end of source");
    }

    fn source_exhausted(&self, pages: usize, rows: usize) {
        tracing::debug!(pages, rows, "Grid data source exhausted");
    }
}
