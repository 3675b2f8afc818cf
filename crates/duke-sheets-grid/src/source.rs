//! Page-oriented data sources

use crate::error::BoxError;

/// Supplies grid rows one page at a time.
///
/// `fetch` is called with `page_no` = 1, 2, 3, ... and a fixed `page_size`.
/// A page shorter than `page_size` (or empty) marks the end of the data, and
/// `fetch` is not called again afterwards. An error is terminal for the
/// stream; there are no retries.
///
/// Any `FnMut(usize, usize) -> Result<Vec<R>, BoxError>` closure is a source:
///
/// ```
/// use duke_sheets_grid::{AsyncPagingLoader, BoxError, GridDataLoader};
///
/// let source = |page_no: usize, page_size: usize| -> Result<Vec<u32>, BoxError> {
///     let start = (page_no - 1) * page_size;
///     Ok((start..(start + page_size).min(25)).map(|n| n as u32).collect())
/// };
///
/// let mut loader = AsyncPagingLoader::with_page_size(source, 10);
/// loader.load_data().unwrap();
///
/// let mut rows = Vec::new();
/// loader.get_row_data(|_, row| rows.push(row)).unwrap();
/// assert_eq!(rows.len(), 25);
/// ```
pub trait GridDataSource: Send + 'static {
    /// Row type produced by this source
    type Row: Send + 'static;

    /// Fetch one page of rows
    fn fetch(&mut self, page_no: usize, page_size: usize) -> Result<Vec<Self::Row>, BoxError>;
}

impl<F, R> GridDataSource for F
where
    F: FnMut(usize, usize) -> Result<Vec<R>, BoxError> + Send + 'static,
    R: Send + 'static,
{
    type Row = R;

    fn fetch(&mut self, page_no: usize, page_size: usize) -> Result<Vec<R>, BoxError> {
        self(page_no, page_size)
    }
}
