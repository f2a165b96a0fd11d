//! Mail rendering and delivery to the configured endpoint

use std::sync::Arc;

use super::store::ConfigStore;
use super::types::{
    DeliveryFailure, DeliveryOutcome, MailingError, MailingResult, OutboundMessage, RenderRequest,
};

/// Header carrying the delivery endpoint credential
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Renders mail templates and hands rendered mail to the delivery endpoint.
///
/// Holds no configuration of its own: every call reads the current snapshot
/// from the [`ConfigStore`] it was built with.
pub struct MailDispatcher {
    store: Arc<ConfigStore>,
    http_client: reqwest::Client,
}

impl MailDispatcher {
    /// Create a dispatcher reading from the given store
    pub fn new(store: Arc<ConfigStore>) -> Self {
        Self::with_client(store, reqwest::Client::new())
    }

    /// Create a dispatcher with a preconfigured HTTP client
    pub fn with_client(store: Arc<ConfigStore>, http_client: reqwest::Client) -> Self {
        Self { store, http_client }
    }

    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    /// Render a template against the request values.
    ///
    /// Output is not sanitized; escape untrusted input in `values` beforehand.
    #[tracing::instrument(
        name = "mailing.render",
        skip(self, request),
        fields(template = %request.template_name())
    )]
    pub fn render(&self, request: &RenderRequest) -> MailingResult<String> {
        let config = self.store.check_ready()?;
        let name = request.template_name();

        match config.templates().get(name) {
            Some(source) if !source.is_empty() => {}
            _ => return Err(MailingError::TemplateNotFound(name.to_string())),
        }

        config.renderer().render(name, &request.values)
    }

    /// POST the whole batch to the delivery endpoint in a single request.
    ///
    /// Only `SetupIncomplete` is returned as an error; delivery problems are
    /// reported through [`DeliveryOutcome::Failed`].
    #[tracing::instrument(
        name = "mailing.send",
        skip(self, messages),
        fields(message_count = messages.len())
    )]
    pub async fn send(&self, messages: &[OutboundMessage]) -> MailingResult<DeliveryOutcome> {
        let config = self.store.check_ready()?;

        let mut request = self
            .http_client
            .post(config.endpoint_url())
            .header(API_KEY_HEADER, config.api_key())
            .json(messages);

        if let Some(timeout) = config.timeout() {
            request = request.timeout(timeout);
        }

        let outcome = match request.send().await {
            Ok(response) if response.status().is_success() => DeliveryOutcome::Delivered {
                status: response.status().as_u16(),
            },
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response.text().await.ok().filter(|body| !body.is_empty());
                DeliveryOutcome::Failed(DeliveryFailure::Status { status, body })
            }
            Err(e) => DeliveryOutcome::Failed(classify_transport_error(&e)),
        };

        match &outcome {
            DeliveryOutcome::Delivered { status } => {
                tracing::debug!(status = *status, "Mail batch accepted by delivery endpoint");
            }
            DeliveryOutcome::Failed(failure) => {
                tracing::warn!(error = %failure, "Mail delivery failed");
            }
        }

        Ok(outcome)
    }
}

fn classify_transport_error(error: &reqwest::Error) -> DeliveryFailure {
    if error.is_timeout() {
        DeliveryFailure::Timeout
    } else if error.is_connect() {
        DeliveryFailure::Connect(error.to_string())
    } else {
        DeliveryFailure::Transport(error.to_string())
    }
}
