//! ReviewBot - homework review status notifier
//!
//! Polls the homework status API on a fixed interval and sends a Telegram
//! message for every homework whose review status changed since the last
//! poll.
//!
//! # Modules
//!
//! - [`response`] - shape validation for API payloads
//! - [`status`] - review status codes and verdict text
//! - [`homework`] - homework records and notification text
//! - [`poller`] - one fetch-validate-notify cycle
//! - [`driver`] - the interval loop and its cursor
//! - [`source`] / [`notify`] - HTTP fetch and chat delivery seams
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod cli;
pub mod config;
pub mod driver;
pub mod error;
pub mod homework;
pub mod notify;
pub mod poller;
pub mod response;
pub mod source;
pub mod status;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use config::{ApiConfig, Config, PollConfig, Secrets, TelegramConfig};
pub use driver::{Driver, PollCursor};
pub use error::{CycleError, FetchError, ItemError, NotifyError, ResponseError};
pub use homework::{Homework, parse_status};
pub use notify::{MessageSink, Notifier, TelegramSink};
pub use poller::{CycleReport, Poller};
pub use response::{ValidatedResponse, check_response};
pub use source::{PracticumClient, RawReply, StatusSource};
pub use status::ReviewStatus;
