//! High-level client tying configuration, transport and services together.

use std::sync::Arc;

use crate::clock::Clock;
use crate::config::OmnikassaConfig;
use crate::models::{MerchantOrder, Notification, OrderResult};
use crate::pipeline::{Gateway, RequestPipeline};
use crate::pull::{PullSummary, StatusPullCoordinator};
use crate::requests::{OrderAnnounceRequest, OrderAnnounceResponse};
use crate::signature::SignatureService;
use crate::token::AccessTokenProvider;
use crate::transport::HttpTransport;
use crate::Result;

/// Entry point for one configured webshop.
///
/// Cheap to clone; clones share the access token cache.
#[derive(Clone)]
pub struct Omnikassa {
    pipeline: Arc<RequestPipeline>,
    signer: Arc<SignatureService>,
    clock: Arc<dyn Clock>,
}

impl Omnikassa {
    /// Build a client over the reqwest transport.
    #[cfg(feature = "http-client")]
    pub fn new(config: OmnikassaConfig) -> Result<Self> {
        config.validate()?;
        let transport = crate::transport::ReqwestTransport::new(config.timeout())?;
        Self::with_transport(config, Arc::new(transport), Arc::new(crate::clock::SystemClock))
    }

    /// Build a client over an injected transport and clock.
    pub fn with_transport(
        config: OmnikassaConfig,
        transport: Arc<dyn HttpTransport>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        let signer = Arc::new(config.signature_service()?);
        let gateway = Gateway::new(config.base_url(), transport);
        let tokens = Arc::new(AccessTokenProvider::new(
            gateway.clone(),
            config.refresh_token.clone(),
            clock.clone(),
        ));

        tracing::debug!(base_url = gateway.base_url(), "omnikassa client configured");
        Ok(Self {
            pipeline: Arc::new(RequestPipeline::new(gateway, tokens)),
            signer,
            clock,
        })
    }

    pub fn signature_service(&self) -> &SignatureService {
        &self.signer
    }

    pub fn token_provider(&self) -> &Arc<AccessTokenProvider> {
        self.pipeline.tokens()
    }

    /// Parse a webhook body.
    pub fn notification_from_json(&self, json: &str) -> Result<Notification> {
        Notification::from_json(json)
    }

    /// Announce `order` and return the verified redirect.
    #[tracing::instrument(skip_all, fields(merchant_order_id = order.merchant_order_id()))]
    pub async fn announce_order(&self, order: MerchantOrder) -> Result<OrderAnnounceResponse> {
        let request = OrderAnnounceRequest::new(order, self.clock.now().fixed_offset(), &self.signer)?;
        let response: OrderAnnounceResponse = self.pipeline.send_expecting(&request).await?;

        if let Err(e) = response.ensure_authentic(&self.signer) {
            tracing::warn!("order announce response signature rejected");
            return Err(e);
        }
        Ok(response)
    }

    /// Pull all results for `notification`, calling `on_result` for each.
    pub async fn status_pull<F>(&self, notification: &Notification, on_result: F) -> Result<PullSummary>
    where
        F: FnMut(OrderResult) + Send,
    {
        self.coordinator().run(notification, on_result).await
    }

    /// Pull all results for `notification` into a vector.
    pub async fn status_pull_collect(&self, notification: &Notification) -> Result<Vec<OrderResult>> {
        self.coordinator().run_collect(notification).await
    }

    fn coordinator(&self) -> StatusPullCoordinator {
        StatusPullCoordinator::new(self.pipeline.clone(), self.signer.clone(), self.clock.clone())
    }
}

impl std::fmt::Debug for Omnikassa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Omnikassa")
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}
