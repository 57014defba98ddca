use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::{RestError, Result};

/// Single-lane limiter enforcing a minimum idle gap between requests.
///
/// Callers queue on `lane` to start a request, so requests sharing one
/// limiter start one at a time and never closer than `delay` after the
/// previous one finished. The timestamp lives behind a plain mutex that is
/// never held across an await, so finishing a request never waits on callers
/// queued in the lane.
#[derive(Debug)]
pub(crate) struct RateLimiter {
    delay: Duration,
    lane: tokio::sync::Mutex<()>,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub(crate) fn new(delay: Duration) -> Self {
        Self {
            delay,
            lane: tokio::sync::Mutex::new(()),
            last_request: Mutex::new(None),
        }
    }

    /// Waits until `delay` has elapsed since the previous request, then
    /// stamps the marker before the new request is sent.
    ///
    /// A request completing during the wait moves the marker forward; the
    /// wait is extended until the gap holds against the latest stamp.
    pub(crate) async fn throttle(&self, cancel: &CancellationToken) -> Result<()> {
        let _lane = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(RestError::Cancelled),
            guard = self.lane.lock() => guard,
        };

        while let Some(ready_at) = self.ready_at() {
            if ready_at <= Instant::now() {
                break;
            }

            #[cfg(feature = "tracing")]
            tracing::debug!(
                wait_ms = (ready_at - Instant::now()).as_millis() as u64,
                "rate limit delay before request"
            );

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(RestError::Cancelled),
                () = sleep_until(ready_at) => {}
            }
        }

        self.stamp();
        Ok(())
    }

    /// Moves the marker to the end of the request that just finished.
    pub(crate) fn mark_complete(&self) {
        self.stamp();
    }

    fn ready_at(&self) -> Option<Instant> {
        self.last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .map(|previous| previous + self.delay)
    }

    fn stamp(&self) {
        *self
            .last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
    }
}
