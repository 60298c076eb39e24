//! Request timing and completion logging.

use crate::result::ResultCode;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Measures one `send` and logs how it ended
#[derive(Debug, Clone, Default)]
pub struct RequestTimer {
    start_time: Option<Instant>,
}

impl RequestTimer {
    /// Create an idle timer
    #[must_use]
    pub fn new() -> Self {
        Self { start_time: None }
    }

    /// Start timing a request
    pub fn start_timing(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Time since `start_timing`, if started
    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        self.start_time.map(|start| start.elapsed())
    }

    /// Log request completion with timing
    ///
    /// Non-success statuses are logged at WARN.
    pub fn log_completion(&self, status: &str, endpoint: &str) {
        if let Some(elapsed) = self.elapsed() {
            let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
            if status == ResultCode::SUCCESS.status() {
                info!("Request completed: POST {} - {} ({:.2}ms)", endpoint, status, elapsed_ms);
            } else {
                warn!("Request completed: POST {} - {} ({:.2}ms)", endpoint, status, elapsed_ms);
            }
        }
    }
}
