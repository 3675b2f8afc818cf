//! CSV adapters: a paged source reading CSV and a sink writing it

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

use csv::StringRecord;

use crate::cell::{GridCell, RowFields};
use crate::error::{BoxError, GridError, GridResult};
use crate::options::CsvSourceOptions;
use crate::source::GridDataSource;
use crate::writer::GridSink;

/// One data record of a CSV file, with access to its header names
#[derive(Debug, Clone)]
pub struct CsvRow {
    headers: Arc<StringRecord>,
    record: StringRecord,
}

impl CsvRow {
    /// Raw value of the named column
    pub fn get(&self, name: &str) -> Option<&str> {
        let position = self.headers.iter().position(|header| header == name)?;
        self.record.get(position)
    }

    /// Number of fields in this record
    pub fn len(&self) -> usize {
        self.record.len()
    }

    /// True if the record has no fields
    pub fn is_empty(&self) -> bool {
        self.record.is_empty()
    }

    /// Header names of the file this row came from
    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }
}

impl RowFields for CsvRow {
    fn field(&self, name: &str) -> Option<GridCell> {
        self.get(name).map(GridCell::detect)
    }
}

/// [`GridDataSource`] reading pages of records from CSV.
///
/// The first record names the fields. Pages have to be requested in order
/// (1, 2, 3, ...) since the reader only moves forward.
#[derive(Debug)]
pub struct CsvPageSource<Rd: Read> {
    reader: csv::Reader<Rd>,
    headers: Arc<StringRecord>,
    next_page: usize,
}

impl CsvPageSource<File> {
    /// Open a CSV file
    pub fn from_path<P: AsRef<Path>>(path: P, options: &CsvSourceOptions) -> GridResult<Self> {
        let file = File::open(path)?;
        Self::from_reader(file, options)
    }
}

impl<Rd: Read> CsvPageSource<Rd> {
    /// Read CSV from any reader. The header record is read immediately.
    pub fn from_reader(reader: Rd, options: &CsvSourceOptions) -> GridResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let headers = Arc::new(reader.headers()?.clone());

        Ok(Self {
            reader,
            headers,
            next_page: 1,
        })
    }

    /// Header names of the input
    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }
}

impl<Rd: Read + Send + 'static> GridDataSource for CsvPageSource<Rd> {
    type Row = CsvRow;

    fn fetch(&mut self, page_no: usize, page_size: usize) -> Result<Vec<CsvRow>, BoxError> {
        if page_no != self.next_page {
            return Err(Box::new(GridError::OutOfOrderPage {
                expected: self.next_page,
                requested: page_no,
            }));
        }
        self.next_page += 1;

        let mut page = Vec::with_capacity(page_size.min(4096));
        let mut record = StringRecord::new();
        while page.len() < page_size && self.reader.read_record(&mut record)? {
            page.push(CsvRow {
                headers: Arc::clone(&self.headers),
                record: record.clone(),
            });
        }
        Ok(page)
    }
}

/// [`GridSink`] writing rows as CSV records
pub struct CsvGridSink<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvGridSink<W> {
    /// Write comma-separated records to `writer`
    pub fn new(writer: W) -> Self {
        Self::with_delimiter(writer, b',')
    }

    /// Write records separated by `delimiter`
    pub fn with_delimiter(writer: W, delimiter: u8) -> Self {
        let writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(writer);
        Self { writer }
    }

    /// Flush and return the underlying writer
    pub fn into_inner(self) -> GridResult<W> {
        self.writer
            .into_inner()
            .map_err(|e| GridError::Io(e.into_error()))
    }
}

impl<W: Write> GridSink for CsvGridSink<W> {
    fn write_row(&mut self, cells: &[GridCell]) -> Result<(), BoxError> {
        self.writer
            .write_record(cells.iter().map(ToString::to_string))?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), BoxError> {
        self.writer.flush()?;
        Ok(())
    }
}
