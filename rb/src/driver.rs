//! Poll loop driver
//!
//! Owns the cursor and runs [`Poller`] cycles forever on a fixed interval.
//! Only a fatal cycle error ends the loop.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::{debug, error, info, warn};

use crate::config::PollConfig;
use crate::error::CycleError;
use crate::poller::{CycleReport, Poller};

/// Start of the next fetch window, as a Unix timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PollCursor(i64);

impl PollCursor {
    pub fn new(timestamp: i64) -> Self {
        Self(timestamp)
    }

    /// Cursor at the current wall-clock time
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp())
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    /// Move the cursor forward; older timestamps are ignored
    pub fn advance(&mut self, to: i64) -> bool {
        if to < self.0 {
            warn!(current = self.0, reported = to, "Ignoring cursor older than current");
            return false;
        }
        self.0 = to;
        true
    }
}

/// Runs poll cycles on a fixed interval
pub struct Driver {
    poller: Poller,
    config: PollConfig,
    cursor: PollCursor,
    last_failure: Option<String>,
}

impl Driver {
    pub fn new(poller: Poller, config: PollConfig, cursor: PollCursor) -> Self {
        Self {
            poller,
            config,
            cursor,
            last_failure: None,
        }
    }

    pub fn cursor(&self) -> PollCursor {
        self.cursor
    }

    /// Run a single cycle and apply its cursor update
    ///
    /// Panics inside the cycle are caught and reported as
    /// [`CycleError::Panicked`].
    pub async fn run_once(&mut self) -> Result<CycleReport, CycleError> {
        let cursor = self.cursor.value();
        let result = AssertUnwindSafe(self.poller.run_cycle(cursor))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(CycleError::Panicked(panic_message(payload.as_ref()))));

        match &result {
            Ok(report) => {
                if let Some(next) = report.next_cursor
                    && self.cursor.advance(next)
                {
                    debug!(cursor = next, "Cursor advanced");
                }
                self.last_failure = None;
            }
            Err(e) => {
                if e.is_fatal() {
                    error!(error = %e, cursor, "Fatal poll cycle failure");
                } else {
                    error!(error = %e, cursor, "Poll cycle failed");
                }
                self.report_failure(e).await;
            }
        }

        result
    }

    /// Forward a failure to the chat, once per distinct failure in a row
    async fn report_failure(&mut self, e: &CycleError) {
        if !self.config.notify_errors {
            return;
        }

        let text = format!("Program failure: {}", e);
        if self.last_failure.as_deref() == Some(text.as_str()) {
            debug!("Same failure as last cycle, not re-sending");
            return;
        }

        self.poller.notifier().notify(&text).await;
        self.last_failure = Some(text);
    }

    /// Run the poll loop until a fatal error
    pub async fn run(mut self) -> Result<(), CycleError> {
        info!(
            interval_secs = self.config.interval_secs,
            cursor = self.cursor.value(),
            "Poll loop started"
        );

        loop {
            if let Err(e) = self.run_once().await
                && e.is_fatal()
            {
                return Err(e);
            }

            tokio::time::sleep(self.config.interval()).await;
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
