//! Behavior of the asynchronous paging loader across the thread boundary

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use duke_sheets_grid::{
    AsyncPagingLoader, BoxError, BufferedRowsPolicy, GridDataLoader, GridError, LoaderObserver,
    NoopObserver, PagingOptions,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

/// Source serving `0..total` in pages, recording every page number it is asked for
fn numbered_source(
    total: usize,
    requested: Arc<Mutex<Vec<usize>>>,
) -> impl FnMut(usize, usize) -> Result<Vec<usize>, BoxError> + Send + 'static {
    move |page_no, page_size| {
        requested.lock().unwrap().push(page_no);
        let start = (page_no - 1) * page_size;
        let end = (start + page_size).min(total);
        Ok((start.min(end)..end).collect())
    }
}

fn drain<L: GridDataLoader>(loader: &mut L) -> (Vec<usize>, Vec<L::Row>, Result<(), GridError>) {
    let mut indices = Vec::new();
    let mut rows = Vec::new();
    let result = loader.get_row_data(|index, row| {
        indices.push(index);
        rows.push(row);
    });
    (indices, rows, result)
}

fn options(page_size: usize) -> PagingOptions {
    PagingOptions {
        page_size,
        offer_timeout: Duration::from_secs(5),
        poll_timeout: Duration::from_secs(5),
        ..Default::default()
    }
}

/// Records observer events for assertions
#[derive(Default)]
struct RecordingObserver {
    pages: Mutex<Vec<(usize, usize)>>,
    stopped: Mutex<Option<mpsc::Sender<usize>>>,
    discarded: Mutex<Option<mpsc::Sender<usize>>>,
    exhausted: AtomicUsize,
}

impl LoaderObserver for RecordingObserver {
    fn page_fetched(&self, page_no: usize, rows: usize) {
        self.pages.lock().unwrap().push((page_no, rows));
    }

    fn producer_stopped(&self, page_no: usize) {
        if let Some(tx) = self.stopped.lock().unwrap().as_ref() {
            let _ = tx.send(page_no);
        }
    }

    fn rows_discarded(&self, count: usize) {
        if let Some(tx) = self.discarded.lock().unwrap().as_ref() {
            let _ = tx.send(count);
        }
    }

    fn source_exhausted(&self, _pages: usize, rows: usize) {
        self.exhausted.store(rows, Ordering::SeqCst);
    }
}

#[test]
fn test_delivers_2500_rows_in_three_pages() {
    let requested = Arc::new(Mutex::new(Vec::new()));
    let observer = Arc::new(RecordingObserver::default());
    let mut loader = AsyncPagingLoader::new(numbered_source(2500, Arc::clone(&requested)))
        .with_shared_observer(observer.clone());
    assert_eq!(loader.options().page_size, 1000);

    loader.load_data().unwrap();
    let (indices, rows, result) = drain(&mut loader);

    result.unwrap();
    assert_eq!(rows, (0..2500).collect::<Vec<_>>());
    assert_eq!(indices, (0..2500).collect::<Vec<_>>());
    assert_eq!(*requested.lock().unwrap(), vec![1, 2, 3]);
    assert_eq!(
        *observer.pages.lock().unwrap(),
        vec![(1, 1000), (2, 1000), (3, 500)]
    );
    assert_eq!(observer.exhausted.load(Ordering::SeqCst), 2500);
}

#[test]
fn test_empty_source() {
    let requested = Arc::new(Mutex::new(Vec::new()));
    let mut loader = AsyncPagingLoader::with_options(
        numbered_source(0, Arc::clone(&requested)),
        options(10),
    );

    loader.load_data().unwrap();
    let (indices, rows, result) = drain(&mut loader);

    result.unwrap();
    assert!(indices.is_empty());
    assert!(rows.is_empty());
    assert_eq!(*requested.lock().unwrap(), vec![1]);
}

#[test]
fn test_full_pages_then_empty_page() {
    let requested = Arc::new(Mutex::new(Vec::new()));
    let mut loader = AsyncPagingLoader::with_options(
        numbered_source(30, Arc::clone(&requested)),
        options(10),
    );

    loader.load_data().unwrap();
    let (indices, rows, result) = drain(&mut loader);

    result.unwrap();
    assert_eq!(rows, (0..30).collect::<Vec<_>>());
    assert_eq!(indices.last(), Some(&29));
    // The empty fourth page ends the stream and nothing is fetched after it
    assert_eq!(*requested.lock().unwrap(), vec![1, 2, 3, 4]);
}

#[test]
fn test_oversized_page_counts_as_full() {
    let source = |page_no: usize, _page_size: usize| -> Result<Vec<usize>, BoxError> {
        Ok(match page_no {
            1 => (0..7).collect(),
            2 => vec![7],
            _ => unreachable!("fetched past the short page"),
        })
    };
    let mut loader = AsyncPagingLoader::with_options(source, options(5));

    loader.load_data().unwrap();
    let (_, rows, result) = drain(&mut loader);

    result.unwrap();
    assert_eq!(rows, (0..8).collect::<Vec<_>>());
}

fn failing_on_page_two(
    page_no: usize,
    page_size: usize,
) -> Result<Vec<usize>, BoxError> {
    match page_no {
        1 => Ok((0..page_size).collect()),
        2 => Err("database connection reset".into()),
        _ => Ok((0..page_size).map(|n| n + 1000).collect()),
    }
}

#[test]
fn test_source_failure_delivers_buffered_rows_then_fails() {
    let mut loader = AsyncPagingLoader::with_options(failing_on_page_two, options(10))
        .with_observer(NoopObserver);

    loader.load_data().unwrap();
    let (indices, rows, result) = drain(&mut loader);

    let err = result.unwrap_err();
    match &err {
        GridError::Source {
            page_no, page_size, ..
        } => {
            assert_eq!(*page_no, 2);
            assert_eq!(*page_size, 10);
        }
        other => panic!("expected source error, got {other:?}"),
    }
    let cause = std::error::Error::source(&err).unwrap();
    assert_eq!(cause.to_string(), "database connection reset");

    assert_eq!(rows, (0..10).collect::<Vec<_>>());
    assert_eq!(indices, (0..10).collect::<Vec<_>>());
}

#[test]
fn test_source_failure_can_discard_buffered_rows() {
    let (row_started_tx, row_started_rx) = mpsc::channel::<()>();
    let (discarded_tx, discarded_rx) = mpsc::channel();
    let observer = Arc::new(RecordingObserver {
        discarded: Mutex::new(Some(discarded_tx)),
        ..Default::default()
    });

    // Page 2 fails only once the listener is busy with row 0, so rows 1..10
    // are still sitting in the queue when the failure happens
    let source = move |page_no: usize, page_size: usize| -> Result<Vec<usize>, BoxError> {
        match page_no {
            1 => Ok((0..page_size).collect()),
            _ => {
                row_started_rx.recv_timeout(Duration::from_secs(5))?;
                Err("database connection reset".into())
            }
        }
    };
    let options = PagingOptions {
        buffered_on_failure: BufferedRowsPolicy::Discard,
        ..options(10)
    };
    let mut loader =
        AsyncPagingLoader::with_options(source, options).with_shared_observer(observer);

    loader.load_data().unwrap();
    let mut rows = Vec::new();
    let mut discarded = None;
    let result = loader.get_row_data(|_, row| {
        if rows.is_empty() {
            row_started_tx.send(()).unwrap();
            discarded = Some(discarded_rx.recv_timeout(Duration::from_secs(5)).unwrap());
        }
        rows.push(row);
    });

    assert!(matches!(result, Err(GridError::Source { page_no: 2, .. })));
    assert_eq!(rows, vec![0]);
    assert_eq!(discarded, Some(9));
}

#[test]
fn test_poll_timeout_stops_the_producer() {
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let (stopped_tx, stopped_rx) = mpsc::channel();
    let observer = Arc::new(RecordingObserver {
        stopped: Mutex::new(Some(stopped_tx)),
        ..Default::default()
    });
    let requested = Arc::new(Mutex::new(Vec::new()));
    let fetched = Arc::clone(&requested);

    // Page 1 is full, so only cancellation keeps page 2 from being fetched
    let source = move |page_no: usize, page_size: usize| -> Result<Vec<usize>, BoxError> {
        fetched.lock().unwrap().push(page_no);
        if page_no == 1 {
            release_rx.recv_timeout(Duration::from_secs(5))?;
        }
        Ok((0..page_size).collect())
    };
    let options = PagingOptions {
        page_size: 4,
        poll_timeout: Duration::from_millis(50),
        ..Default::default()
    };
    let mut loader =
        AsyncPagingLoader::with_options(source, options).with_shared_observer(observer);

    loader.load_data().unwrap();
    let (_, rows, result) = drain(&mut loader);
    assert!(rows.is_empty());
    assert!(matches!(result, Err(GridError::PollTimeout { .. })));

    release_tx.send(()).unwrap();
    let page_no = stopped_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(page_no, 1);
    assert_eq!(*requested.lock().unwrap(), vec![1]);
}

#[test]
fn test_unbounded_poll_timeout() {
    let requested = Arc::new(Mutex::new(Vec::new()));
    let options = PagingOptions {
        page_size: 4,
        poll_timeout: Duration::MAX,
        ..Default::default()
    };
    options.validate().unwrap();
    let mut loader = AsyncPagingLoader::with_options(numbered_source(3, requested), options)
        .with_observer(NoopObserver);

    loader.load_data().unwrap();
    let (indices, rows, result) = drain(&mut loader);

    result.unwrap();
    assert_eq!(rows, vec![0, 1, 2]);
    assert_eq!(indices, vec![0, 1, 2]);
}

#[test]
fn test_unbounded_offer_timeout() {
    let requested = Arc::new(Mutex::new(Vec::new()));
    let options = PagingOptions {
        page_size: 2,
        offer_timeout: Duration::from_secs(u64::MAX),
        poll_timeout: Duration::from_secs(5),
        ..Default::default()
    };
    options.validate().unwrap();
    let mut loader = AsyncPagingLoader::with_options(numbered_source(7, requested), options)
        .with_observer(NoopObserver);

    loader.load_data().unwrap();
    let (_, rows, result) = drain(&mut loader);

    result.unwrap();
    assert_eq!(rows, (0..7).collect::<Vec<_>>());
}

#[test]
fn test_poll_timeout_when_source_stalls() {
    let source = |_page_no: usize, _page_size: usize| -> Result<Vec<u8>, BoxError> {
        thread::sleep(Duration::from_millis(500));
        Ok(Vec::new())
    };
    let options = PagingOptions {
        page_size: 10,
        poll_timeout: Duration::from_millis(50),
        ..Default::default()
    };
    let mut loader = AsyncPagingLoader::with_options(source, options).with_observer(NoopObserver);

    loader.load_data().unwrap();
    let (_, rows, result) = drain(&mut loader);

    assert!(rows.is_empty());
    let err = result.unwrap_err();
    assert!(err.is_timeout());
    assert!(matches!(
        err,
        GridError::PollTimeout { delivered: 0, .. }
    ));
}

#[test]
fn test_offer_timeout_when_listener_stalls() {
    let source = |_page_no: usize, page_size: usize| -> Result<Vec<usize>, BoxError> {
        Ok((0..page_size).collect())
    };
    let options = PagingOptions {
        page_size: 1,
        offer_timeout: Duration::from_millis(100),
        poll_timeout: Duration::from_secs(5),
        ..Default::default()
    };
    let mut loader = AsyncPagingLoader::with_options(source, options).with_observer(NoopObserver);

    loader.load_data().unwrap();
    let mut delivered = 0;
    let result = loader.get_row_data(|_, _| {
        if delivered == 0 {
            thread::sleep(Duration::from_millis(800));
        }
        delivered += 1;
    });

    assert!(matches!(result, Err(GridError::OfferTimeout { .. })));
    // Rows still buffered when the producer gave up are dropped
    assert!(delivered <= 1);
}

#[test]
fn test_listener_error_stops_the_stream() {
    let requested = Arc::new(Mutex::new(Vec::new()));
    let mut loader = AsyncPagingLoader::with_options(
        numbered_source(usize::MAX, Arc::clone(&requested)),
        options(4),
    )
    .with_observer(NoopObserver);

    loader.load_data().unwrap();
    let mut seen = Vec::new();
    let result = loader.try_get_row_data(&mut |index, row| {
        if index == 5 {
            return Err("sheet is full".into());
        }
        seen.push(row);
        Ok(())
    });

    match result {
        Err(GridError::Listener { index, source }) => {
            assert_eq!(index, 5);
            assert_eq!(source.to_string(), "sheet is full");
        }
        other => panic!("expected listener error, got {other:?}"),
    }
    assert_eq!(seen, vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_dropping_loader_stops_producer() {
    let (tx, rx) = mpsc::channel();
    let observer = Arc::new(RecordingObserver {
        stopped: Mutex::new(Some(tx)),
        ..Default::default()
    });
    let requested = Arc::new(Mutex::new(Vec::new()));
    let mut loader = AsyncPagingLoader::with_options(
        numbered_source(usize::MAX, Arc::clone(&requested)),
        options(8),
    )
    .with_shared_observer(observer);

    loader.load_data().unwrap();
    drop(loader);

    let page_no = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(page_no >= 1);
}

#[test]
fn test_panicking_source_reports_producer_lost() {
    let source = |page_no: usize, page_size: usize| -> Result<Vec<usize>, BoxError> {
        if page_no == 2 {
            panic!("source blew up");
        }
        Ok((0..page_size).collect())
    };
    let mut loader = AsyncPagingLoader::with_options(source, options(3)).with_observer(NoopObserver);

    loader.load_data().unwrap();
    let (_, rows, result) = drain(&mut loader);

    assert_eq!(rows, vec![0, 1, 2]);
    assert!(matches!(result, Err(GridError::ProducerLost { delivered: 3 })));
}

#[test]
fn test_works_as_trait_object() {
    let requested = Arc::new(Mutex::new(Vec::new()));
    let mut loader: Box<dyn GridDataLoader<Row = usize>> = Box::new(
        AsyncPagingLoader::with_options(numbered_source(5, requested), options(2)),
    );

    loader.load_data().unwrap();
    let (_, rows, result) = drain(&mut loader);

    result.unwrap();
    assert_eq!(rows, vec![0, 1, 2, 3, 4]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_rows_arrive_in_source_order(total in 0usize..300, page_size in 1usize..40) {
        let requested = Arc::new(Mutex::new(Vec::new()));
        let mut loader = AsyncPagingLoader::with_options(
            numbered_source(total, Arc::clone(&requested)),
            options(page_size),
        )
        .with_observer(NoopObserver);

        loader.load_data().unwrap();
        let (indices, rows, result) = drain(&mut loader);

        prop_assert!(result.is_ok());
        prop_assert_eq!(&rows, &(0..total).collect::<Vec<_>>());
        prop_assert_eq!(&indices, &(0..total).collect::<Vec<_>>());
        // One fetch per full page plus the final short (possibly empty) one
        prop_assert_eq!(requested.lock().unwrap().len(), total / page_size + 1);
    }
}
