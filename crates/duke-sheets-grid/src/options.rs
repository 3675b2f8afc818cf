//! Loader and writer options

use std::time::Duration;

use crate::error::{GridError, GridResult};

/// Default number of rows requested per page
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Default time the producer waits for room in the queue
pub const DEFAULT_OFFER_TIMEOUT: Duration = Duration::from_secs(60);

/// Default time the consumer waits for the next row
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// What happens to rows still buffered in the queue when the source fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferedRowsPolicy {
    /// Hand buffered rows to the listener, then report the failure
    #[default]
    Deliver,
    /// Drop buffered rows and report the failure on the next poll
    Discard,
}

/// Options for [`AsyncPagingLoader`](crate::AsyncPagingLoader)
#[derive(Debug, Clone)]
pub struct PagingOptions {
    /// Rows requested per page (default: 1000)
    pub page_size: usize,
    /// How long the producer may block on a full queue (default: 1 minute)
    pub offer_timeout: Duration,
    /// How long the consumer may block on an empty queue (default: 5 minutes)
    pub poll_timeout: Duration,
    /// Handling of buffered rows on source failure
    pub buffered_on_failure: BufferedRowsPolicy,
}

impl Default for PagingOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            offer_timeout: DEFAULT_OFFER_TIMEOUT,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            buffered_on_failure: BufferedRowsPolicy::default(),
        }
    }
}

impl PagingOptions {
    /// Options with the given page size and default timeouts
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            page_size,
            ..Default::default()
        }
    }

    /// Queue capacity: two pages, so the producer can stay one page ahead
    pub fn queue_capacity(&self) -> usize {
        self.page_size.saturating_mul(2)
    }

    /// Check the options before a producer is started
    pub fn validate(&self) -> GridResult<()> {
        if self.page_size == 0 {
            return Err(GridError::InvalidOptions(
                "page_size must be greater than 0".to_string(),
            ));
        }
        if self.offer_timeout.is_zero() {
            return Err(GridError::InvalidOptions(
                "offer_timeout must be greater than 0".to_string(),
            ));
        }
        if self.poll_timeout.is_zero() {
            return Err(GridError::InvalidOptions(
                "poll_timeout must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Options for [`GridWriter::write_grid`](crate::GridWriter::write_grid)
#[derive(Debug, Clone)]
pub struct GridWriteOptions {
    /// Write a header row of column labels (default: true)
    pub include_header: bool,
    /// Empty cells written before the first column of every row
    pub column_offset: usize,
}

impl Default for GridWriteOptions {
    fn default() -> Self {
        Self {
            include_header: true,
            column_offset: 0,
        }
    }
}

/// Options for [`CsvPageSource`](crate::CsvPageSource)
#[derive(Debug, Clone)]
pub struct CsvSourceOptions {
    /// Field delimiter (default: comma)
    pub delimiter: u8,
    /// Quote character (default: double quote)
    pub quote: u8,
}

impl Default for CsvSourceOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
        }
    }
}
