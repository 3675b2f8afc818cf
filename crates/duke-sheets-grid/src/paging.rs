//! Asynchronous paged loading.
//!
//! [`AsyncPagingLoader`] runs a producer thread that pulls pages from a
//! [`GridDataSource`] and pushes single rows through a bounded queue. The
//! caller drains that queue in [`GridDataLoader::get_row_data`]. Memory stays
//! bounded at two pages of rows; both sides wait with a timeout so a stalled
//! partner turns into an error instead of a hang.

use std::mem;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::cancel::CancellationToken;
use crate::error::{BoxError, GridError, GridResult};
use crate::item::StreamItem;
use crate::loader::GridDataLoader;
use crate::observer::{LoaderObserver, TracingObserver};
use crate::options::{BufferedRowsPolicy, PagingOptions};
use crate::queue::{self, OfferError, PollError, QueueConsumer, QueueProducer};
use crate::source::GridDataSource;

const PRODUCER_THREAD_NAME: &str = "duke-grid-producer";

/// [`GridDataLoader`] that fetches pages on a background thread.
///
/// `load_data` spawns the producer; `get_row_data` must then be called once
/// on the same loader. Dropping the loader before the stream is drained
/// cancels the producer.
pub struct AsyncPagingLoader<S: GridDataSource> {
    options: PagingOptions,
    observer: Arc<dyn LoaderObserver>,
    state: LoaderState<S>,
}

enum LoaderState<S: GridDataSource> {
    Idle(S),
    Running(Running<S::Row>),
    Finished,
}

struct Running<R> {
    queue: QueueConsumer<StreamItem<R>>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl<S: GridDataSource> AsyncPagingLoader<S> {
    /// Create a loader with default options (1000 rows per page)
    pub fn new(source: S) -> Self {
        Self::with_options(source, PagingOptions::default())
    }

    /// Create a loader with a custom page size and default timeouts
    pub fn with_page_size(source: S, page_size: usize) -> Self {
        Self::with_options(source, PagingOptions::with_page_size(page_size))
    }

    /// Create a loader with explicit options
    pub fn with_options(source: S, options: PagingOptions) -> Self {
        Self {
            options,
            observer: Arc::new(TracingObserver),
            state: LoaderState::Idle(source),
        }
    }

    /// Replace the observer (default: [`TracingObserver`])
    pub fn with_observer<O: LoaderObserver + 'static>(self, observer: O) -> Self {
        self.with_shared_observer(Arc::new(observer))
    }

    /// Replace the observer with one that is shared with other code
    pub fn with_shared_observer(mut self, observer: Arc<dyn LoaderObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// The options this loader was built with
    pub fn options(&self) -> &PagingOptions {
        &self.options
    }

    fn drain(
        &self,
        running: Running<S::Row>,
        listener: &mut dyn FnMut(usize, S::Row) -> Result<(), BoxError>,
    ) -> GridResult<()> {
        let Running {
            queue,
            cancel,
            handle,
        } = running;
        let timeout = self.options.poll_timeout;
        let mut delivered = 0usize;

        let outcome = loop {
            match queue.poll(timeout) {
                Ok(StreamItem::Row(row)) => {
                    if let Err(source) = listener(delivered, row) {
                        break Err(GridError::Listener {
                            index: delivered,
                            source,
                        });
                    }
                    delivered += 1;
                }
                Ok(StreamItem::EndOfStream) => break Ok(()),
                Ok(StreamItem::EndOfStreamWithError(error)) => break Err(error),
                Err(PollError::Timeout) => {
                    self.observer.poll_timed_out(delivered, timeout);
                    break Err(GridError::PollTimeout { timeout, delivered });
                }
                Err(PollError::Disconnected) => break Err(GridError::ProducerLost { delivered }),
            }
        };

        match outcome {
            Ok(()) => {
                drop(queue);
                // End of stream is the producer's last action
                if handle.join().is_err() {
                    return Err(GridError::ProducerLost { delivered });
                }
                Ok(())
            }
            Err(error) => {
                // The producer may be blocked in the source; do not wait for it
                cancel.cancel();
                drop(queue);
                Err(error)
            }
        }
    }
}

impl<S: GridDataSource> GridDataLoader for AsyncPagingLoader<S> {
    type Row = S::Row;

    fn load_data(&mut self) -> GridResult<()> {
        self.options.validate()?;

        let source = match mem::replace(&mut self.state, LoaderState::Finished) {
            LoaderState::Idle(source) => source,
            other => {
                self.state = other;
                return Err(GridError::AlreadyLoaded);
            }
        };

        let (producer_queue, consumer_queue) = queue::bounded(self.options.queue_capacity());
        let cancel = CancellationToken::new();
        let producer = PagingProducer {
            source,
            queue: producer_queue,
            options: self.options.clone(),
            cancel: cancel.clone(),
            observer: Arc::clone(&self.observer),
        };

        let handle = thread::Builder::new()
            .name(PRODUCER_THREAD_NAME.to_string())
            .spawn(move || producer.run())
            .map_err(GridError::Spawn)?;

        self.state = LoaderState::Running(Running {
            queue: consumer_queue,
            cancel,
            handle,
        });
        Ok(())
    }

    fn try_get_row_data(
        &mut self,
        listener: &mut dyn FnMut(usize, S::Row) -> Result<(), BoxError>,
    ) -> GridResult<()> {
        match mem::replace(&mut self.state, LoaderState::Finished) {
            LoaderState::Running(running) => self.drain(running, listener),
            LoaderState::Idle(source) => {
                self.state = LoaderState::Idle(source);
                Err(GridError::NotLoaded)
            }
            LoaderState::Finished => Err(GridError::AlreadyConsumed),
        }
    }
}

impl<S: GridDataSource> Drop for AsyncPagingLoader<S> {
    fn drop(&mut self) {
        if let LoaderState::Running(running) = &self.state {
            running.cancel.cancel();
        }
    }
}

/// Why the producer left its fetch loop early
enum Halt {
    /// Cancelled, or the consumer went away
    Stopped,
    /// A row could not be enqueued in time
    OfferTimeout,
    /// The source returned an error
    Source(BoxError),
}

/// Background half of an [`AsyncPagingLoader`]
struct PagingProducer<S: GridDataSource> {
    source: S,
    queue: QueueProducer<StreamItem<S::Row>>,
    options: PagingOptions,
    cancel: CancellationToken,
    observer: Arc<dyn LoaderObserver>,
}

impl<S: GridDataSource> PagingProducer<S> {
    fn run(mut self) {
        let mut page_no = 1;

        match self.produce(&mut page_no) {
            Ok(rows) => self.observer.source_exhausted(page_no, rows),
            Err(Halt::Stopped) => self.observer.producer_stopped(page_no),
            Err(Halt::OfferTimeout) => {
                let timeout = self.options.offer_timeout;
                self.observer.offer_timed_out(page_no, timeout);
                self.discard_buffered();
                self.finish_with_error(page_no, GridError::OfferTimeout { page_no, timeout });
            }
            Err(Halt::Source(source)) => {
                let page_size = self.options.page_size;
                let error = GridError::Source {
                    page_no,
                    page_size,
                    source,
                };
                self.observer.source_failed(page_no, page_size, &error);
                if self.options.buffered_on_failure == BufferedRowsPolicy::Discard {
                    self.discard_buffered();
                }
                self.finish_with_error(page_no, error);
            }
        }
    }

    /// Fetch and enqueue pages until a short page, returning the row count
    fn produce(&mut self, page_no: &mut usize) -> Result<usize, Halt> {
        let page_size = self.options.page_size;
        let mut rows = 0;

        loop {
            self.check_cancelled()?;

            let page = self
                .source
                .fetch(*page_no, page_size)
                .map_err(Halt::Source)?;
            let len = page.len();
            self.observer.page_fetched(*page_no, len);

            for row in page {
                self.enqueue(StreamItem::Row(row))?;
            }
            rows += len;

            if len < page_size {
                self.enqueue(StreamItem::EndOfStream)?;
                return Ok(rows);
            }
            *page_no += 1;
        }
    }

    fn enqueue(&self, item: StreamItem<S::Row>) -> Result<(), Halt> {
        self.check_cancelled()?;
        match self.queue.offer(item, self.options.offer_timeout) {
            Ok(()) => Ok(()),
            Err(OfferError::Timeout(_)) => Err(Halt::OfferTimeout),
            Err(OfferError::Closed(_)) => Err(Halt::Stopped),
        }
    }

    fn check_cancelled(&self) -> Result<(), Halt> {
        if self.cancel.is_cancelled() {
            Err(Halt::Stopped)
        } else {
            Ok(())
        }
    }

    fn discard_buffered(&self) {
        let count = self.queue.clear();
        if count > 0 {
            self.observer.rows_discarded(count);
        }
    }

    /// Enqueue the terminal error item. If even that cannot be enqueued the
    /// producer just exits; the consumer then sees a disconnect or times out.
    fn finish_with_error(&self, page_no: usize, error: GridError) {
        let timeout = self.options.offer_timeout;
        let item = StreamItem::EndOfStreamWithError(error);
        if let Err(OfferError::Timeout(_)) = self.queue.offer(item, timeout) {
            self.observer.offer_timed_out(page_no, timeout);
        }
    }
}
