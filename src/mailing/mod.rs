//! Mail templating and dispatch.
//!
//! This module provides:
//! - A configuration store that loads HTML templates from disk once and
//!   validates the delivery credentials
//! - A dispatcher that renders templates with caller-supplied values
//! - Delivery of rendered mail to an HTTP endpoint authenticated by `X-Api-Key`
//!
//! # Example
//!
//! ```ignore
//! let store = create_config_store();
//! store.setup(
//!     SetupOptions::new("https://mail.example.com/send", api_key)
//!         .template("default", "templates/default.html")
//!         .template("welcome", "templates/welcome.html"),
//! )?;
//!
//! let dispatcher = MailDispatcher::new(store.clone());
//! let html = dispatcher.render(
//!     &RenderRequest::new(json!({"name": "Ann"})).with_template("welcome"),
//! )?;
//!
//! let outcome = dispatcher
//!     .send(&[OutboundMessage {
//!         to: "ann@example.com".to_string(),
//!         from: "noreply@example.com".to_string(),
//!         subject: "Welcome".to_string(),
//!         html,
//!     }])
//!     .await?;
//!
//! if !outcome.is_delivered() {
//!     tracing::error!(?outcome, "welcome mail not delivered");
//! }
//! ```

mod dispatcher;
mod renderer;
mod store;
mod types;

pub use dispatcher::{MailDispatcher, API_KEY_HEADER};
pub use renderer::TemplateRenderer;
pub use store::{create_config_store, ConfigStore, MailConfiguration, SetupOptions};
pub use types::{
    DeliveryFailure, DeliveryOutcome, MailingError, MailingResult, OutboundMessage, RenderRequest,
    TemplateSet, TemplateSyntax, DEFAULT_TEMPLATE,
};
