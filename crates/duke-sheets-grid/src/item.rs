//! Items carried from the paging producer to the consumer

use crate::error::GridError;

/// One unit on the row queue.
///
/// The producer enqueues exactly one end-of-stream item, with or without an
/// error, and never enqueues anything after it.
#[derive(Debug)]
pub enum StreamItem<R> {
    /// A data row, in source order
    Row(R),
    /// The source is exhausted
    EndOfStream,
    /// The stream stopped because of a failure
    EndOfStreamWithError(GridError),
}
