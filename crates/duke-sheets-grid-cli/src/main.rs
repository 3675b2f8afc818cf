//! Duke Grid CLI - stream CSV grids through the paged loader

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use clap::{Args, Parser, Subcommand};
use duke_sheets_grid::{
    AsyncPagingLoader, BufferedRowsPolicy, CsvGridSink, CsvPageSource, CsvRow, CsvSourceOptions,
    GridColumn, GridDataLoader, GridError, GridWriteOptions, GridWriter, LoaderObserver, PagingOptions,
    TracingObserver, DEFAULT_PAGE_SIZE,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "duke-grid")]
#[command(author, version, about = "Stream CSV grids page by page")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy selected columns of a CSV file, reading it page by page
    Export {
        /// Input CSV file (first row holds the field names)
        input: PathBuf,

        /// Output CSV file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Fields to export, comma separated (default: all)
        #[arg(short, long, value_delimiter = ',')]
        columns: Vec<String>,

        /// Skip the header row in the output
        #[arg(long)]
        no_header: bool,

        /// Field delimiter for input and output (default: comma)
        #[arg(short, long, default_value = ",")]
        delimiter: char,

        #[command(flatten)]
        paging: PagingArgs,
    },

    /// Count the rows of a CSV file, reading it page by page
    Count {
        /// Input CSV file
        input: PathBuf,

        /// Field delimiter (default: comma)
        #[arg(short, long, default_value = ",")]
        delimiter: char,

        #[command(flatten)]
        paging: PagingArgs,
    },
}

#[derive(Args)]
struct PagingArgs {
    /// Rows fetched per page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: usize,

    /// Seconds the reader may wait for the writer to make room
    #[arg(long, default_value_t = 60)]
    offer_timeout_secs: u64,

    /// Seconds the writer may wait for the next row
    #[arg(long, default_value_t = 300)]
    poll_timeout_secs: u64,

    /// Drop already-read rows instead of writing them when the input fails
    #[arg(long)]
    discard_buffered: bool,
}

impl PagingArgs {
    fn options(&self) -> PagingOptions {
        PagingOptions {
            page_size: self.page_size,
            offer_timeout: Duration::from_secs(self.offer_timeout_secs),
            poll_timeout: Duration::from_secs(self.poll_timeout_secs),
            buffered_on_failure: if self.discard_buffered {
                BufferedRowsPolicy::Discard
            } else {
                BufferedRowsPolicy::Deliver
            },
        }
    }
}

/// Counts pages on top of the usual tracing output
#[derive(Default)]
struct PageCounter {
    pages: AtomicUsize,
}

impl LoaderObserver for PageCounter {
    fn page_fetched(&self, page_no: usize, rows: usize) {
        self.pages.fetch_add(1, Ordering::Relaxed);
        TracingObserver.page_fetched(page_no, rows);
    }

    fn source_failed(&self, page_no: usize, page_size: usize, error: &GridError) {
        TracingObserver.source_failed(page_no, page_size, error);
    }

    fn rows_discarded(&self, count: usize) {
        TracingObserver.rows_discarded(count);
    }

    fn offer_timed_out(&self, page_no: usize, timeout: Duration) {
        TracingObserver.offer_timed_out(page_no, timeout);
    }

    fn poll_timed_out(&self, delivered: usize, timeout: Duration) {
        TracingObserver.poll_timed_out(delivered, timeout);
    }

    fn producer_stopped(&self, page_no: usize) {
        TracingObserver.producer_stopped(page_no);
    }

    fn source_exhausted(&self, pages: usize, rows: usize) {
        TracingObserver.source_exhausted(pages, rows);
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Export {
            input,
            output,
            columns,
            no_header,
            delimiter,
            paging,
        } => export(
            &input,
            output.as_deref(),
            &columns,
            !no_header,
            delimiter,
            &paging,
        ),
        Commands::Count {
            input,
            delimiter,
            paging,
        } => count(&input, delimiter, &paging),
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn open_source(input: &Path, delimiter: char) -> Result<CsvPageSource<File>> {
    ensure!(
        delimiter.is_ascii(),
        "Delimiter must be a single ASCII character, got '{}'",
        delimiter
    );
    let options = CsvSourceOptions {
        delimiter: delimiter as u8,
        ..Default::default()
    };
    CsvPageSource::from_path(input, &options)
        .with_context(|| format!("Failed to open '{}'", input.display()))
}

fn export(
    input: &Path,
    output: Option<&Path>,
    fields: &[String],
    include_header: bool,
    delimiter: char,
    paging: &PagingArgs,
) -> Result<()> {
    let source = open_source(input, delimiter)?;

    let fields: Vec<String> = if fields.is_empty() {
        source.headers().iter().map(str::to_string).collect()
    } else {
        for field in fields {
            ensure!(
                source.headers().iter().any(|header| header == field),
                "Column '{}' not found in '{}'",
                field,
                input.display()
            );
        }
        fields.to_vec()
    };
    // Copy raw text so values are not reformatted on the way through
    let columns: Vec<GridColumn<CsvRow>> = fields
        .into_iter()
        .map(|field| {
            let key = field.clone();
            GridColumn::new(field, move |row: &CsvRow| {
                row.get(&key).unwrap_or_default().into()
            })
        })
        .collect();

    let writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path)
                .with_context(|| format!("Failed to create '{}'", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    let mut sink = CsvGridSink::with_delimiter(writer, delimiter as u8);

    let mut loader = AsyncPagingLoader::with_options(source, paging.options());
    let options = GridWriteOptions {
        include_header,
        ..Default::default()
    };
    let written = GridWriter::write_grid(&mut loader, &columns, &mut sink, &options)
        .with_context(|| format!("Failed to export '{}'", input.display()))?;
    sink.into_inner().context("Failed to flush output")?;

    if let Some(path) = output {
        eprintln!("Wrote {} rows to '{}'", written, path.display());
    }

    Ok(())
}

fn count(input: &Path, delimiter: char, paging: &PagingArgs) -> Result<()> {
    let source = open_source(input, delimiter)?;
    let counter = Arc::new(PageCounter::default());
    let mut loader = AsyncPagingLoader::with_options(source, paging.options())
        .with_shared_observer(counter.clone());

    loader
        .load_data()
        .with_context(|| format!("Failed to start reading '{}'", input.display()))?;
    let mut rows = 0usize;
    loader
        .get_row_data(|_, _| rows += 1)
        .with_context(|| format!("Failed to read '{}'", input.display()))?;

    println!("File: {}", input.display());
    println!("Rows: {}", rows);
    println!("Pages: {}", counter.pages.load(Ordering::Relaxed));

    Ok(())
}
