//! Progress reporting.
//!
//! Progress reporting is side-effect only: executors advance a sink exactly
//! once per item actually processed, and the sink has no influence on
//! control flow.

use tracing::debug;

/// A sink for iteration progress.
pub trait Progress {
    /// Signals the start of a run with the total item count, when known.
    fn begin(&mut self, _total: Option<usize>) {}

    /// Records that `n` more items were processed.
    fn advance(&mut self, n: usize);

    /// Signals the end of a run.
    fn finish(&mut self) {}
}

/// A progress sink that emits tracing debug events.
#[derive(Debug, Default)]
pub struct LogProgress {
    processed: usize,
    total: Option<usize>,
}

impl LogProgress {
    /// Creates a new LogProgress.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of items processed so far.
    pub fn processed(&self) -> usize {
        self.processed
    }
}

impl Progress for LogProgress {
    fn begin(&mut self, total: Option<usize>) {
        self.processed = 0;
        self.total = total;
    }

    fn advance(&mut self, n: usize) {
        self.processed += n;
        match self.total {
            Some(total) => debug!("processed {}/{} samples", self.processed, total),
            None => debug!("processed {} samples", self.processed),
        }
    }

    fn finish(&mut self) {
        debug!("finished after {} samples", self.processed);
    }
}

/// A progress sink that discards all events.
#[derive(Debug, Default)]
pub struct NullProgress;

impl Progress for NullProgress {
    fn advance(&mut self, _n: usize) {}
}
