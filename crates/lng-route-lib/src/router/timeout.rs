//! Deadline wrapper for in-process routers

use super::{MaritimeRouter, RouteRequest, RouteResponse, RoutingError};
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

/// Runs the wrapped router on a worker thread and gives up after `timeout`
///
/// A call that times out is abandoned: its worker thread finishes in the
/// background and its result is discarded.
pub struct TimeoutRouter<R> {
    inner: Arc<R>,
    timeout: Duration,
}

impl<R: MaritimeRouter + 'static> TimeoutRouter<R> {
    pub fn new(inner: R, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(inner),
            timeout,
        }
    }

    #[inline]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl<R: MaritimeRouter + 'static> MaritimeRouter for TimeoutRouter<R> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn route(&self, request: &RouteRequest) -> Result<RouteResponse, RoutingError> {
        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        let request = request.clone();

        thread::Builder::new()
            .name("maritime-router".to_string())
            .spawn(move || {
                // The receiver is gone if the caller already timed out
                let _ = tx.send(inner.route(&request));
            })?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    "Router {} did not answer within {:?}",
                    self.inner.name(),
                    self.timeout
                );
                Err(RoutingError::Timeout {
                    after: self.timeout,
                })
            }
            Err(RecvTimeoutError::Disconnected) => Err(RoutingError::Backend {
                reason: format!("router {} stopped without answering", self.inner.name()),
            }),
        }
    }
}
