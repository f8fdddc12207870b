//! One fetch-validate-notify cycle

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{CycleError, ResponseError};
use crate::homework::parse_status;
use crate::notify::Notifier;
use crate::response::check_response;
use crate::source::StatusSource;

/// What a completed cycle did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Messages composed for valid items
    pub composed: usize,
    /// Messages the sink accepted
    pub delivered: usize,
    /// Items skipped for missing fields or unknown statuses
    pub skipped: usize,
    /// Cursor reported by a fully validated response
    pub next_cursor: Option<i64>,
}

/// Runs single poll cycles against a status source
pub struct Poller {
    source: Arc<dyn StatusSource>,
    notifier: Notifier,
}

impl Poller {
    pub fn new(source: Arc<dyn StatusSource>, notifier: Notifier) -> Self {
        Self { source, notifier }
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Run one cycle starting from `cursor`
    ///
    /// An empty batch is a successful cycle with nothing to report.
    pub async fn run_cycle(&self, cursor: i64) -> Result<CycleReport, CycleError> {
        debug!(cursor, "run_cycle: fetching");
        let reply = self.source.fetch(cursor).await?;

        if !reply.is_success() {
            return Err(CycleError::RemoteUnavailable { status: reply.status });
        }

        let payload: Value = serde_json::from_slice(&reply.body)?;

        let validated = match check_response(&payload) {
            Ok(v) => v,
            Err(ResponseError::Empty) => {
                debug!(cursor, "run_cycle: no homework updates");
                return Ok(CycleReport::default());
            }
            Err(e) => return Err(e.into()),
        };

        let mut report = CycleReport {
            next_cursor: validated.current_date,
            ..Default::default()
        };

        for (index, item) in validated.homeworks.iter().enumerate() {
            let message = match parse_status(item) {
                Ok(m) => m,
                Err(e) => {
                    warn!(index, error = %e, "Skipping homework record");
                    report.skipped += 1;
                    continue;
                }
            };

            report.composed += 1;
            if self.notifier.notify(&message).await {
                report.delivered += 1;
            }
        }

        info!(
            composed = report.composed,
            delivered = report.delivered,
            skipped = report.skipped,
            next_cursor = ?report.next_cursor,
            "Poll cycle complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::mock::MockSink;
    use crate::source::RawReply;
    use crate::source::mock::{MockSource, Scripted};
    use serde_json::json;

    fn poller(source: MockSource, sink: Arc<MockSink>) -> Poller {
        Poller::new(Arc::new(source), Notifier::new(sink, "chat"))
    }

    #[tokio::test]
    async fn test_single_approved_homework() {
        let sink = Arc::new(MockSink::new());
        let source = MockSource::json(vec![json!({
            "homeworks": [{"homework_name": "HW1", "status": "approved"}],
            "current_date": 1000
        })]);
        let poller = poller(source, sink.clone());

        let report = poller.run_cycle(500).await.unwrap();

        assert_eq!(
            sink.messages(),
            vec!["Changed review status for \"HW1\". Работа проверена: ревьюеру всё понравилось. Ура!".to_string()]
        );
        assert_eq!(report.next_cursor, Some(1000));
        assert_eq!(report.composed, 1);
        assert_eq!(report.delivered, 1);
    }

    #[tokio::test]
    async fn test_every_item_in_batch_is_sent_in_order() {
        let sink = Arc::new(MockSink::new());
        let source = MockSource::json(vec![json!({
            "homeworks": [
                {"homework_name": "HW1", "status": "reviewing"},
                {"homework_name": "HW2", "status": "rejected"},
                {"homework_name": "HW3", "status": "approved"}
            ],
            "current_date": 2000
        })]);
        let poller = poller(source, sink.clone());

        let report = poller.run_cycle(0).await.unwrap();

        let messages = sink.messages();
        assert_eq!(messages.len(), 3);
        assert!(messages[0].contains("\"HW1\""));
        assert!(messages[1].contains("\"HW2\""));
        assert!(messages[2].contains("\"HW3\""));
        assert_eq!(report.delivered, 3);
    }

    #[tokio::test]
    async fn test_empty_batch_is_quiet() {
        let sink = Arc::new(MockSink::new());
        let source = MockSource::json(vec![json!({"homeworks": [], "current_date": 1000})]);
        let poller = poller(source, sink.clone());

        let report = poller.run_cycle(0).await.unwrap();

        assert!(sink.messages().is_empty());
        assert_eq!(report, CycleReport::default());
    }

    #[tokio::test]
    async fn test_unknown_status_skips_only_that_item() {
        let sink = Arc::new(MockSink::new());
        let source = MockSource::json(vec![json!({
            "homeworks": [
                {"homework_name": "HW2", "status": "bogus"},
                {"status": "approved"},
                {"homework_name": "HW3", "status": "approved"}
            ],
            "current_date": 3000
        })]);
        let poller = poller(source, sink.clone());

        let report = poller.run_cycle(0).await.unwrap();

        assert_eq!(sink.messages().len(), 1);
        assert!(sink.messages()[0].contains("\"HW3\""));
        assert_eq!(report.skipped, 2);
        assert_eq!(report.next_cursor, Some(3000));
    }

    #[tokio::test]
    async fn test_bogus_only_batch_sends_nothing() {
        let sink = Arc::new(MockSink::new());
        let source = MockSource::json(vec![json!({"homeworks": [{"homework_name": "HW2", "status": "bogus"}]})]);
        let poller = poller(source, sink.clone());

        let report = poller.run_cycle(0).await.unwrap();

        assert!(sink.messages().is_empty());
        assert_eq!(report.skipped, 1);
        assert_eq!(report.next_cursor, None);
    }

    #[tokio::test]
    async fn test_server_error_is_recoverable() {
        let sink = Arc::new(MockSink::new());
        let source = MockSource::new(vec![Scripted::Reply(RawReply {
            status: 500,
            body: b"oops".to_vec(),
        })]);
        let poller = poller(source, sink.clone());

        let err = poller.run_cycle(0).await.unwrap_err();

        assert!(matches!(err, CycleError::RemoteUnavailable { status: 500 }));
        assert!(!err.is_fatal());
        assert!(sink.messages().is_empty());
    }

    #[tokio::test]
    async fn test_undecodable_body() {
        let sink = Arc::new(MockSink::new());
        let source = MockSource::new(vec![Scripted::Reply(RawReply {
            status: 200,
            body: b"<html>".to_vec(),
        })]);
        let poller = poller(source, sink);

        let err = poller.run_cycle(0).await.unwrap_err();
        assert!(matches!(err, CycleError::Decode(_)));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn test_homeworks_not_a_list() {
        let sink = Arc::new(MockSink::new());
        let source = MockSource::json(vec![json!({"homeworks": {"homework_name": "HW1"}, "current_date": 1000})]);
        let poller = poller(source, sink.clone());

        let err = poller.run_cycle(0).await.unwrap_err();
        assert!(matches!(err, CycleError::InvalidResponse(ResponseError::NotAList)));
        assert!(sink.messages().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_is_fatal() {
        let sink = Arc::new(MockSink::new());
        let source = MockSource::new(vec![Scripted::TransportFailure]);
        let poller = poller(source, sink);

        let err = poller.run_cycle(0).await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_delivery_failure_does_not_fail_cycle() {
        let sink = Arc::new(MockSink::failing());
        let source = MockSource::json(vec![json!({
            "homeworks": [
                {"homework_name": "HW1", "status": "approved"},
                {"homework_name": "HW2", "status": "approved"}
            ],
            "current_date": 1000
        })]);
        let poller = poller(source, sink.clone());

        let report = poller.run_cycle(0).await.unwrap();
        assert_eq!(report.composed, 2);
        assert_eq!(report.delivered, 0);
        assert_eq!(sink.messages().len(), 2);
        assert_eq!(report.next_cursor, Some(1000));
    }

    #[tokio::test]
    async fn test_fetch_uses_given_cursor() {
        let sink = Arc::new(MockSink::new());
        let source = Arc::new(MockSource::json(vec![json!({"homeworks": []})]));
        let poller = Poller::new(source.clone(), Notifier::new(sink, "chat"));

        poller.run_cycle(1234).await.unwrap();
        assert_eq!(source.cursors(), vec![1234]);
    }
}
