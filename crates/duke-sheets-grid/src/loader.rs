//! The contract between grid writers and row providers

use crate::error::{BoxError, GridResult};

/// Feeds rows of a grid to a writer.
///
/// Call [`load_data`](Self::load_data) once, then drain the rows with exactly
/// one call to [`get_row_data`](Self::get_row_data) or
/// [`try_get_row_data`](Self::try_get_row_data). The listener receives
/// `(index, row)` on the caller's thread, indices counting up from 0 with no
/// gaps, rows in source order. Loaders are single-pass.
pub trait GridDataLoader {
    /// Row type handed to the listener
    type Row;

    /// Begin acquiring data. May spawn background work.
    fn load_data(&mut self) -> GridResult<()>;

    /// Drain all rows into a fallible listener.
    ///
    /// A listener error stops the drain and is returned as
    /// [`GridError::Listener`](crate::GridError::Listener).
    fn try_get_row_data(
        &mut self,
        listener: &mut dyn FnMut(usize, Self::Row) -> Result<(), BoxError>,
    ) -> GridResult<()>;

    /// Drain all rows into a listener.
    fn get_row_data<F>(&mut self, mut listener: F) -> GridResult<()>
    where
        F: FnMut(usize, Self::Row),
        Self: Sized,
    {
        self.try_get_row_data(&mut |index, row| {
            listener(index, row);
            Ok(())
        })
    }
}

impl<L: GridDataLoader + ?Sized> GridDataLoader for Box<L> {
    type Row = L::Row;

    fn load_data(&mut self) -> GridResult<()> {
        (**self).load_data()
    }

    fn try_get_row_data(
        &mut self,
        listener: &mut dyn FnMut(usize, Self::Row) -> Result<(), BoxError>,
    ) -> GridResult<()> {
        (**self).try_get_row_data(listener)
    }
}
