//! Retry loop driven by a fixed delay sequence.
//!
//! Each attempt's result is classified into an [`AttemptOutcome`]; only
//! transient outcomes (no response, HTTP 503) consume the retry budget. Every
//! other failure is translated into a [`RestError`] on the spot.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::{transport::TransportFailure, wire, ApiError, RestError, Result};

const SERVICE_UNAVAILABLE: u16 = 503;

/// Classified result of one transport attempt.
#[derive(Debug)]
pub(crate) enum AttemptOutcome {
    Success(String),
    /// No response or 503; worth retrying while budget remains.
    Retryable(TransportFailure),
    /// TLS failure; never retried.
    SecureChannel(TransportFailure),
    Fatal(TransportFailure),
}

impl AttemptOutcome {
    pub(crate) fn classify(result: std::result::Result<String, TransportFailure>) -> Self {
        match result {
            Ok(body) => Self::Success(body),
            Err(failure @ TransportFailure::SecureChannel(_)) => Self::SecureChannel(failure),
            Err(failure @ TransportFailure::NoResponse(_)) => Self::Retryable(failure),
            Err(failure @ TransportFailure::Status { status, .. })
                if status == SERVICE_UNAVAILABLE =>
            {
                Self::Retryable(failure)
            }
            Err(failure) => Self::Fatal(failure),
        }
    }
}

/// Delays, in order, before each retry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct RetryPolicy {
    sequence: Vec<Duration>,
}

impl RetryPolicy {
    pub(crate) fn from_secs(sequence: &[u64]) -> Self {
        Self {
            sequence: sequence.iter().copied().map(Duration::from_secs).collect(),
        }
    }

    /// Runs `attempt` until it succeeds, fails fatally, or the sequence is
    /// exhausted. With an empty sequence exactly one attempt is made.
    pub(crate) async fn execute<F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut attempt: F,
    ) -> Result<String>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<std::result::Result<String, TransportFailure>>>,
    {
        let mut retry = 0usize;
        loop {
            let result = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(RestError::Cancelled),
                result = attempt() => result?,
            };

            let failure = match AttemptOutcome::classify(result) {
                AttemptOutcome::Success(body) => return Ok(body),
                AttemptOutcome::SecureChannel(failure) => return Err(translate_failure(failure)),
                AttemptOutcome::Fatal(failure) => return Err(translate_failure(failure)),
                AttemptOutcome::Retryable(failure) => failure,
            };

            let Some(delay) = self.sequence.get(retry).copied() else {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    retries = self.sequence.len(),
                    "no retries left: {failure}"
                );
                return Err(translate_failure(failure));
            };

            #[cfg(feature = "tracing")]
            tracing::warn!(
                retry = retry + 1,
                max_retries = self.sequence.len(),
                delay_secs = delay.as_secs(),
                "transient failure, retrying: {failure}"
            );

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(RestError::Cancelled),
                () = tokio::time::sleep(delay) => {}
            }
            retry += 1;
        }
    }
}

/// Converts a final failure into the error surfaced to the caller.
///
/// A status failure whose body is not an API error envelope is returned as is;
/// envelope parse errors are never surfaced in its place.
pub(crate) fn translate_failure(failure: TransportFailure) -> RestError {
    match failure {
        TransportFailure::NoResponse(source) => RestError::Transport(source),
        TransportFailure::SecureChannel(source) => RestError::SecureChannel { source },
        TransportFailure::Status { status, body } => {
            match serde_json::from_str::<wire::ErrorEnvelope>(&body) {
                Ok(envelope) => RestError::Api(ApiError::from_wire(envelope.error, status)),
                Err(_) => RestError::Http { status, body },
            }
        }
    }
}
