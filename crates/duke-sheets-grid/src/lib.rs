//! # duke-sheets-grid
//!
//! Row loading for grid writers.
//!
//! A grid writer pulls its rows from a [`GridDataLoader`]. Two loaders are
//! provided:
//!
//! - [`ListLoader`] hands out rows that are already in memory, synchronously.
//! - [`AsyncPagingLoader`] fetches pages from a slow [`GridDataSource`] on a
//!   background thread and streams single rows through a bounded queue, so
//!   the writer never holds more than two pages at once.
//!
//! [`GridWriter`] combines a loader with [`GridColumn`] definitions and writes
//! the result to a [`GridSink`] such as [`CsvGridSink`].
//!
//! ## Example
//!
//! ```rust
//! use duke_sheets_grid::{
//!     AsyncPagingLoader, BoxError, CsvGridSink, GridCell, GridColumn, GridWriteOptions,
//!     GridWriter,
//! };
//!
//! // A source with 25 rows, served 10 at a time
//! let source = |page_no: usize, page_size: usize| -> Result<Vec<(u32, String)>, BoxError> {
//!     let start = (page_no - 1) * page_size;
//!     let end = (start + page_size).min(25);
//!     Ok((start..end).map(|n| (n as u32, format!("item {n}"))).collect())
//! };
//!
//! let columns = vec![
//!     GridColumn::new("id", |row: &(u32, String)| GridCell::from(row.0)),
//!     GridColumn::new("name", |row: &(u32, String)| GridCell::text(row.1.as_str())).label("Name"),
//! ];
//!
//! let mut loader = AsyncPagingLoader::with_page_size(source, 10);
//! let mut sink = CsvGridSink::new(Vec::new());
//! let written =
//!     GridWriter::write_grid(&mut loader, &columns, &mut sink, &GridWriteOptions::default())
//!         .unwrap();
//!
//! assert_eq!(written, 25);
//! let csv = String::from_utf8(sink.into_inner().unwrap()).unwrap();
//! assert!(csv.starts_with("id,Name\n0,item 0\n"));
//! ```

mod cancel;
mod cell;
mod column;
mod csv_io;
mod error;
mod item;
mod list;
mod loader;
mod observer;
mod options;
mod paging;
pub mod queue;
mod source;
mod writer;

pub use cancel::CancellationToken;
pub use cell::{GridCell, RowFields};
pub use column::GridColumn;
pub use csv_io::{CsvGridSink, CsvPageSource, CsvRow};
pub use error::{BoxError, GridError, GridResult};
pub use item::StreamItem;
pub use list::ListLoader;
pub use loader::GridDataLoader;
pub use observer::{LoaderObserver, NoopObserver, TracingObserver};
pub use options::{
    BufferedRowsPolicy, CsvSourceOptions, GridWriteOptions, PagingOptions, DEFAULT_OFFER_TIMEOUT,
    DEFAULT_PAGE_SIZE, DEFAULT_POLL_TIMEOUT,
};
pub use paging::AsyncPagingLoader;
pub use source::GridDataSource;
pub use writer::{GridSink, GridWriter};
