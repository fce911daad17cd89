//! Tracing spans for registry and synchronisation work.

use std::path::Path;
use std::time::Instant;

use tracing::{field, info_span, Span};

/// Span covering a registry read of the checkout at `root`.
pub fn registry_span(root: &Path) -> Span {
    info_span!("registry", root = %root.display(), error = field::Empty)
}

/// Span covering one synchronisation pass (`git`, `members`, `projects`).
pub fn sync_span(pass: &str) -> Span {
    info_span!("sync", pass = %pass, error = field::Empty)
}

/// Span covering a call to a remote service.
pub fn remote_span(service: &str, operation: &str) -> Span {
    info_span!("remote", service = %service, op = %operation, error = field::Empty)
}

/// Record an error on the current span.
pub fn record_error(error: &dyn std::error::Error) {
    Span::current().record("error", field::display(error));
}

/// Logs the elapsed time of an operation when finished.
pub struct Timer {
    start: Instant,
    operation: &'static str,
}

impl Timer {
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }

    pub fn finish(self) {
        tracing::debug!(
            operation = %self.operation,
            duration_ms = %self.start.elapsed().as_millis(),
            "operation completed"
        );
    }
}

/// Time a block of code and log its duration at debug level.
#[macro_export]
macro_rules! timed {
    ($name:expr, $body:expr) => {{
        let _timer = $crate::spans::Timer::start($name);
        let result = $body;
        _timer.finish();
        result
    }};
}
