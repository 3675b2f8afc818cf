//! Writing loader rows into a grid sink

use crate::cell::GridCell;
use crate::column::GridColumn;
use crate::error::{BoxError, GridError, GridResult};
use crate::list::ListLoader;
use crate::loader::GridDataLoader;
use crate::options::GridWriteOptions;

/// Destination for grid rows, one call per output row.
///
/// Implemented by spreadsheet writers; [`CsvGridSink`](crate::CsvGridSink)
/// is the built-in one.
pub trait GridSink {
    /// Write one row of cells
    fn write_row(&mut self, cells: &[GridCell]) -> Result<(), BoxError>;

    /// Flush buffered output
    fn flush(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl GridSink for Vec<Vec<GridCell>> {
    fn write_row(&mut self, cells: &[GridCell]) -> Result<(), BoxError> {
        self.push(cells.to_vec());
        Ok(())
    }
}

/// Grid writer
pub struct GridWriter;

impl GridWriter {
    /// Drain `loader` into `sink`, one output row per loader row.
    ///
    /// Calls `load_data` on the loader, writes the header row when
    /// `options.include_header` is set, then the data rows. A column spanning
    /// several cells writes its value followed by empty cells. Returns the
    /// number of data rows written.
    pub fn write_grid<L, K>(
        loader: &mut L,
        columns: &[GridColumn<L::Row>],
        sink: &mut K,
        options: &GridWriteOptions,
    ) -> GridResult<usize>
    where
        L: GridDataLoader + ?Sized,
        K: GridSink + ?Sized,
    {
        loader.load_data()?;

        let width = options.column_offset + columns.iter().map(GridColumn::span).sum::<usize>();
        let mut cells = Vec::with_capacity(width);

        if options.include_header {
            fill_row(&mut cells, options.column_offset, columns, |column| {
                GridCell::text(column.header_label())
            });
            sink.write_row(&cells).map_err(GridError::Sink)?;
        }

        let mut written = 0;
        loader.try_get_row_data(&mut |_, row| {
            fill_row(&mut cells, options.column_offset, columns, |column| {
                column.value(&row)
            });
            sink.write_row(&cells)?;
            written += 1;
            Ok(())
        })?;

        sink.flush().map_err(GridError::Sink)?;
        Ok(written)
    }

    /// Write in-memory rows through a [`ListLoader`]
    pub fn write_rows<R, K>(
        rows: Vec<R>,
        columns: &[GridColumn<R>],
        sink: &mut K,
        options: &GridWriteOptions,
    ) -> GridResult<usize>
    where
        K: GridSink + ?Sized,
    {
        Self::write_grid(&mut ListLoader::new(rows), columns, sink, options)
    }
}

fn fill_row<R, F>(cells: &mut Vec<GridCell>, offset: usize, columns: &[GridColumn<R>], mut value: F)
where
    F: FnMut(&GridColumn<R>) -> GridCell,
{
    cells.clear();
    cells.resize(offset, GridCell::Empty);
    for column in columns {
        cells.push(value(column));
        for _ in 1..column.span() {
            cells.push(GridCell::Empty);
        }
    }
}
