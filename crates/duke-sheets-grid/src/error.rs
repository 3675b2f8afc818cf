//! Error types for duke-sheets-grid

use std::time::Duration;

use thiserror::Error;

/// Boxed error used at application seams (data sources and listeners)
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias using [`GridError`]
pub type GridResult<T> = std::result::Result<T, GridError>;

/// Errors that can occur while loading or writing grid data
#[derive(Debug, Error)]
pub enum GridError {
    /// The data source failed while fetching a page
    #[error("error while fetching grid data from source (page {page_no}, page size {page_size})")]
    Source {
        page_no: usize,
        page_size: usize,
        #[source]
        source: BoxError,
    },

    /// The producer could not enqueue a row in time
    #[error("timed out after {timeout:?} enqueuing rows of page {page_no}")]
    OfferTimeout { page_no: usize, timeout: Duration },

    /// The consumer waited too long for the next row
    #[error("timed out after {timeout:?} waiting for grid data ({delivered} rows delivered)")]
    PollTimeout { timeout: Duration, delivered: usize },

    /// The producer went away without signaling end of stream
    #[error("grid data producer stopped without end of stream ({delivered} rows delivered)")]
    ProducerLost { delivered: usize },

    /// The row listener failed
    #[error("row listener failed at row {index}")]
    Listener {
        index: usize,
        #[source]
        source: BoxError,
    },

    /// A grid sink failed outside of a row callback
    #[error("grid sink failed: {0}")]
    Sink(#[source] BoxError),

    /// `get_row_data` was called before `load_data`
    #[error("grid data requested before load_data was called")]
    NotLoaded,

    /// `load_data` was called twice
    #[error("load_data was already called on this loader")]
    AlreadyLoaded,

    /// The loader has already been drained
    #[error("grid data was already consumed; loaders are single-pass")]
    AlreadyConsumed,

    /// Invalid loader or writer options
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// The producer thread could not be started
    #[error("failed to spawn grid data producer: {0}")]
    Spawn(#[source] std::io::Error),

    /// Pages of a sequential source were requested out of order
    #[error("page {requested} requested, but the source can only serve page {expected}")]
    OutOfOrderPage { expected: usize, requested: usize },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV library error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl GridError {
    /// Returns true for the two timeout variants
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            GridError::OfferTimeout { .. } | GridError::PollTimeout { .. }
        )
    }
}
