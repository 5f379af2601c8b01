//! Minimum spacing between provider requests.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::time::{sleep_until, Instant};

/// Default spacing between the starts of consecutive turns.
pub const DEFAULT_REQUEST_INTERVAL: Duration = Duration::from_millis(5_000);

/// Default extra pause taken after each group of turns when batching is on.
pub const DEFAULT_BATCH_PAUSE: Duration = Duration::from_millis(10_000);

/// Scheduling policy consulted before an instrument's provider requests and
/// before the retry that follows a re-negotiation.
pub trait PacingGate: Send {
    /// Resolve once the next request may start.
    fn wait_turn<'a>(&'a mut self) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BatchPause {
    size: usize,
    pause: Duration,
}

/// Enforces at least `interval` between the starts of consecutive turns.
///
/// The first call returns immediately. With a batch pause set, the turn that
/// opens each new group of `size` turns waits `interval + pause` instead.
/// Built on tokio's clock, so tests can pause and advance time instead of
/// sleeping.
#[derive(Debug, Clone)]
pub struct MinIntervalGate {
    interval: Duration,
    batch: Option<BatchPause>,
    turns: usize,
    last_start: Option<Instant>,
}

impl MinIntervalGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            batch: None,
            turns: 0,
            last_start: None,
        }
    }

    /// Pause an extra `pause` after every `size` turns. A `size` of zero
    /// turns batching off.
    pub fn with_batch_pause(mut self, size: usize, pause: Duration) -> Self {
        self.batch = (size > 0).then_some(BatchPause { size, pause });
        self
    }

    fn next_deadline(&self, last: Instant) -> Instant {
        let deadline = last + self.interval;
        match self.batch {
            Some(batch) if self.turns % batch.size == 0 => deadline + batch.pause,
            _ => deadline,
        }
    }
}

impl Default for MinIntervalGate {
    fn default() -> Self {
        Self::new(DEFAULT_REQUEST_INTERVAL)
    }
}

impl PacingGate for MinIntervalGate {
    fn wait_turn<'a>(&'a mut self) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            if let Some(last) = self.last_start {
                sleep_until(self.next_deadline(last)).await;
            }
            self.turns += 1;
            self.last_start = Some(Instant::now());
        })
    }
}

/// A gate that never waits.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unpaced;

impl PacingGate for Unpaced {
    fn wait_turn<'a>(&'a mut self) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async {})
    }
}
