//! Loader over rows that are already in memory

use crate::error::{BoxError, GridError, GridResult};
use crate::loader::GridDataLoader;

/// Synchronous [`GridDataLoader`] over a `Vec` of rows.
///
/// `load_data` does nothing; `get_row_data` walks the rows once on the
/// caller's thread. No queue, no thread, no timeouts.
#[derive(Debug, Clone)]
pub struct ListLoader<R> {
    rows: Option<Vec<R>>,
}

impl<R> ListLoader<R> {
    /// Create a loader over `rows`
    pub fn new(rows: Vec<R>) -> Self {
        Self { rows: Some(rows) }
    }

    /// Number of rows not yet delivered
    pub fn len(&self) -> usize {
        self.rows.as_ref().map_or(0, Vec::len)
    }

    /// True if there is nothing left to deliver
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<R> From<Vec<R>> for ListLoader<R> {
    fn from(rows: Vec<R>) -> Self {
        Self::new(rows)
    }
}

impl<R> FromIterator<R> for ListLoader<R> {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<R> GridDataLoader for ListLoader<R> {
    type Row = R;

    fn load_data(&mut self) -> GridResult<()> {
        Ok(())
    }

    fn try_get_row_data(
        &mut self,
        listener: &mut dyn FnMut(usize, R) -> Result<(), BoxError>,
    ) -> GridResult<()> {
        let rows = self.rows.take().ok_or(GridError::AlreadyConsumed)?;

        for (index, row) in rows.into_iter().enumerate() {
            listener(index, row).map_err(|source| GridError::Listener { index, source })?;
        }

        Ok(())
    }
}
