//! Paginated status pull driven by a webhook notification.
//!
//! Each round checks the notification, pulls one page, verifies the page
//! signature and hands every result to the caller before deciding whether to
//! continue. The gateway tracks the offset itself, so there is no cursor. The
//! first error of any kind ends the run; results already emitted stay emitted.

use std::fmt;
use std::sync::Arc;

use crate::clock::Clock;
use crate::models::{Notification, OrderResult, OrderResultSet};
use crate::pipeline::RequestPipeline;
use crate::requests::StatusPullRequest;
use crate::signature::SignatureService;
use crate::Result;

/// Totals of a completed run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PullSummary {
    /// Pages fetched and verified.
    pub pages: usize,
    /// Results handed to the callback.
    pub results: usize,
}

pub struct StatusPullCoordinator {
    pipeline: Arc<RequestPipeline>,
    signer: Arc<SignatureService>,
    clock: Arc<dyn Clock>,
}

impl StatusPullCoordinator {
    pub fn new(pipeline: Arc<RequestPipeline>, signer: Arc<SignatureService>, clock: Arc<dyn Clock>) -> Self {
        Self {
            pipeline,
            signer,
            clock,
        }
    }

    /// Pull every page for `notification`, calling `on_result` per result in
    /// the order received.
    ///
    /// The notification is re-checked for freshness and authenticity before
    /// every page, since it can age while earlier pages are fetched.
    #[tracing::instrument(skip_all, fields(event = notification.event_name()))]
    pub async fn run<F>(&self, notification: &Notification, mut on_result: F) -> Result<PullSummary>
    where
        F: FnMut(OrderResult) + Send,
    {
        let mut summary = PullSummary::default();

        loop {
            if let Err(e) = notification.ensure_usable(&self.signer, self.clock.now()) {
                tracing::warn!(error = %e, "notification rejected");
                return Err(e);
            }

            let page: OrderResultSet = self
                .pipeline
                .send_expecting(&StatusPullRequest::new(notification))
                .await?;

            if let Err(e) = page.ensure_authentic(&self.signer) {
                tracing::warn!(page = summary.pages + 1, "result page signature rejected");
                return Err(e);
            }

            let more = page.more_available();
            let results = page.into_order_results();
            tracing::debug!(page = summary.pages + 1, results = results.len(), more, "result page verified");

            summary.pages += 1;
            for result in results {
                summary.results += 1;
                on_result(result);
            }

            if !more {
                return Ok(summary);
            }
        }
    }

    /// [`Self::run`], collecting the results.
    pub async fn run_collect(&self, notification: &Notification) -> Result<Vec<OrderResult>> {
        let mut collected = Vec::new();
        self.run(notification, |result| collected.push(result)).await?;
        Ok(collected)
    }
}

impl fmt::Debug for StatusPullCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusPullCoordinator")
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::pipeline::Gateway;
    use crate::requests::STATUS_PULL_PATH;
    use crate::test_utils::{fixtures, MockTransport};
    use crate::token::AccessTokenProvider;
    use crate::transport::{HttpMethod, HttpResponse};
    use crate::OmnikassaErrorCode;
    use chrono::Duration;

    const NOW: &str = "2020-01-01T12:00:00Z";

    fn results_path() -> String {
        format!("{}{}", STATUS_PULL_PATH, fixtures::EVENT_NAME)
    }

    struct Harness {
        transport: Arc<MockTransport>,
        clock: Arc<FixedClock>,
        coordinator: StatusPullCoordinator,
        signer: SignatureService,
    }

    fn harness() -> Harness {
        let transport = Arc::new(MockTransport::new());
        let clock = Arc::new(FixedClock::at(NOW));
        let gateway = Gateway::new("https://www.example.com/sandbox", transport.clone());
        let tokens = Arc::new(AccessTokenProvider::new(
            gateway.clone(),
            fixtures::REFRESH_TOKEN,
            clock.clone(),
        ));
        let pipeline = Arc::new(RequestPipeline::new(gateway, tokens));
        let signer = fixtures::signature_service();
        let coordinator = StatusPullCoordinator::new(pipeline, Arc::new(signer.clone()), clock.clone());
        Harness {
            transport,
            clock,
            coordinator,
            signer,
        }
    }

    impl Harness {
        fn notification(&self) -> Notification {
            fixtures::signed_notification(&self.signer, self.clock.now() + Duration::minutes(10))
        }

        fn page(&self, more: bool, ids: &[&str]) -> serde_json::Value {
            let results = ids
                .iter()
                .map(|id| fixtures::order_result_json_for(id, fixtures::ORDER_STATUS_TIME_3_DIGITS))
                .collect();
            fixtures::signed_page(&self.signer, more, results)
        }

        fn queue(&self, page: serde_json::Value) {
            self.transport.reply_json(HttpMethod::Get, &results_path(), 200, page);
        }
    }

    fn ids(results: &[OrderResult]) -> Vec<&str> {
        results.iter().map(OrderResult::merchant_order_id).collect()
    }

    #[tokio::test]
    async fn test_single_page() {
        let h = harness();
        h.queue(h.page(false, &["a", "b"]));

        let mut seen = Vec::new();
        let summary = h
            .coordinator
            .run(&h.notification(), |r| seen.push(r))
            .await
            .unwrap();

        assert_eq!(ids(&seen), vec!["a", "b"]);
        assert_eq!(summary, PullSummary { pages: 1, results: 2 });

        let requests = h.transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].header("Authorization"),
            Some(format!("Bearer {}", fixtures::AUTHENTICATION_TOKEN).as_str())
        );
    }

    #[tokio::test]
    async fn test_all_pages_emitted_in_order() {
        let h = harness();
        h.queue(h.page(true, &["a", "b"]));
        h.queue(h.page(true, &["c"]));
        h.queue(h.page(false, &["d", "e"]));

        let results = h.coordinator.run_collect(&h.notification()).await.unwrap();

        assert_eq!(ids(&results), vec!["a", "b", "c", "d", "e"]);
        assert_eq!(h.transport.count(HttpMethod::Get, &results_path()), 3);
    }

    #[tokio::test]
    async fn test_forged_second_page_stops_run() {
        let h = harness();
        h.queue(h.page(true, &["a"]));
        let mut forged = h.page(true, &["b"]);
        forged["signature"] = fixtures::ORDER_RESULT_SET_SIGNATURE.into();
        h.queue(forged);
        h.queue(h.page(false, &["c"]));

        let mut seen = Vec::new();
        let err = h
            .coordinator
            .run(&h.notification(), |r| seen.push(r))
            .await
            .unwrap_err();

        assert_eq!(err.code(), OmnikassaErrorCode::Authenticity);
        assert_eq!(ids(&seen), vec!["a"]);
        assert_eq!(h.transport.count(HttpMethod::Get, &results_path()), 2);
    }

    #[tokio::test]
    async fn test_failed_page_aborts() {
        let h = harness();
        h.queue(h.page(true, &["a"]));
        h.transport.reply(
            HttpMethod::Get,
            &results_path(),
            HttpResponse::new(500, "<html>Internal Server Error</html>"),
        );

        let mut seen = Vec::new();
        let err = h
            .coordinator
            .run(&h.notification(), |r| seen.push(r))
            .await
            .unwrap_err();

        assert_eq!(err.code(), OmnikassaErrorCode::TransportFailure);
        assert_eq!(ids(&seen), vec!["a"]);
    }

    #[tokio::test]
    async fn test_expiring_notification_rejected_before_pull() {
        let h = harness();
        h.queue(h.page(false, &["a"]));
        let notification =
            fixtures::signed_notification(&h.signer, h.clock.now() + Duration::seconds(20));

        let err = h.coordinator.run_collect(&notification).await.unwrap_err();

        assert_eq!(err.code(), OmnikassaErrorCode::Freshness);
        assert!(h.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_forged_notification_rejected_before_pull() {
        let h = harness();
        let json = fixtures::notification_json("2099-01-01T00:00:00.000+01:00", fixtures::NOTIFICATION_SIGNATURE);
        let notification = Notification::from_json(&json.to_string()).unwrap();

        let err = h.coordinator.run_collect(&notification).await.unwrap_err();

        assert_eq!(err.code(), OmnikassaErrorCode::Authenticity);
        assert!(h.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_empty_final_page() {
        let h = harness();
        h.queue(h.page(false, &[]));

        let summary = h.coordinator.run(&h.notification(), |_| {}).await.unwrap();
        assert_eq!(summary, PullSummary { pages: 1, results: 0 });
    }
}
