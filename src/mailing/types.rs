//! Mailing types and error definitions

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the template used when a render request does not name one.
pub const DEFAULT_TEMPLATE: &str = "default";

/// Mailing-specific error type
#[derive(Debug, Error)]
pub enum MailingError {
    #[error("Template file not found for \"{name}\": {}", .path.display())]
    TemplateFileNotFound { name: String, path: PathBuf },

    #[error("Failed to read template \"{name}\" from {}: {source}", .path.display())]
    TemplateRead {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("A non-empty \"default\" template is required")]
    MissingDefaultTemplate,

    #[error("Missing credential for mailing service: {0} is not provided")]
    MissingCredential(&'static str),

    #[error("Invalid template syntax configuration: {0}")]
    InvalidSyntax(#[source] minijinja::Error),

    #[error("Template \"{name}\" failed to compile: {source}")]
    TemplateSyntax {
        name: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("Mailing service is not set up; run setup before rendering or sending mail")]
    SetupIncomplete,

    #[error("Template \"{0}\" not found. Check the setup process")]
    TemplateNotFound(String),

    #[error("Failed to render template \"{name}\": {source}")]
    Render {
        name: String,
        #[source]
        source: minijinja::Error,
    },
}

/// Result type for mailing operations
pub type MailingResult<T> = Result<T, MailingError>;

/// Delimiter flavour used when compiling templates.
///
/// Both flavours share the same expression language (substitution,
/// conditionals, loops, filters); only the tag delimiters differ.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateSyntax {
    /// `<%= value %>` or `<%- value %>`, `<% tag %>`, `<%# comment %>`
    #[default]
    Ejs,
    /// `{{ value }}`, `{% tag %}`, `{# comment #}`
    Jinja,
}

/// Loaded template sources keyed by template name.
///
/// Always contains a non-empty [`DEFAULT_TEMPLATE`] entry once built by setup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateSet {
    sources: HashMap<String, String>,
}

impl TemplateSet {
    pub(crate) fn insert(&mut self, name: String, source: String) {
        self.sources.insert(name, source);
    }

    /// Get the source text of a template
    pub fn get(&self, name: &str) -> Option<&str> {
        self.sources.get(name).map(String::as_str)
    }

    /// Check if a template exists
    pub fn contains(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    /// Template names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sources.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.sources.iter()
    }
}

/// Request to render a template with caller-supplied values
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RenderRequest {
    /// Template to render; falls back to `"default"`
    #[serde(default)]
    pub template_name: Option<String>,

    /// Values referenced by the template. Not type checked.
    #[serde(default)]
    pub values: serde_json::Value,
}

impl RenderRequest {
    /// Render the default template with the given values
    pub fn new(values: serde_json::Value) -> Self {
        Self {
            template_name: None,
            values,
        }
    }

    /// Select a named template
    pub fn with_template(mut self, name: impl Into<String>) -> Self {
        self.template_name = Some(name.into());
        self
    }

    /// Name of the template this request resolves to
    pub fn template_name(&self) -> &str {
        self.template_name.as_deref().unwrap_or(DEFAULT_TEMPLATE)
    }
}

/// A rendered mail handed to the delivery endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub html: String,
}

/// Why a delivery attempt failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryFailure {
    #[error("delivery request timed out")]
    Timeout,

    #[error("could not connect to delivery endpoint: {0}")]
    Connect(String),

    #[error("delivery endpoint returned status {status}")]
    Status { status: u16, body: Option<String> },

    #[error("delivery request failed: {0}")]
    Transport(String),
}

/// Result of a single `send` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The endpoint answered with a 2xx status
    Delivered { status: u16 },
    Failed(DeliveryFailure),
}

impl DeliveryOutcome {
    /// `true` if the whole batch was accepted by the endpoint
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }

    /// The failure reason, if any
    pub fn failure(&self) -> Option<&DeliveryFailure> {
        match self {
            DeliveryOutcome::Delivered { .. } => None,
            DeliveryOutcome::Failed(failure) => Some(failure),
        }
    }
}

impl From<DeliveryOutcome> for bool {
    fn from(outcome: DeliveryOutcome) -> Self {
        outcome.is_delivered()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_request_defaults_to_default_template() {
        let request = RenderRequest::new(json!({"name": "Ann"}));
        assert_eq!(request.template_name(), "default");

        let request = request.with_template("welcome");
        assert_eq!(request.template_name(), "welcome");
    }

    #[test]
    fn test_render_request_deserialize_without_name() {
        let request: RenderRequest = serde_json::from_value(json!({
            "values": {"name": "Ann"}
        }))
        .unwrap();

        assert_eq!(request.template_name(), "default");
        assert_eq!(request.values["name"], "Ann");
    }

    #[test]
    fn test_outbound_message_field_names() {
        let message = OutboundMessage {
            to: "ann@example.com".to_string(),
            from: "noreply@example.com".to_string(),
            subject: "Hi".to_string(),
            html: "<p>Hi</p>".to_string(),
        };

        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(
            value,
            json!({
                "to": "ann@example.com",
                "from": "noreply@example.com",
                "subject": "Hi",
                "html": "<p>Hi</p>"
            })
        );
    }

    #[test]
    fn test_delivery_outcome_as_bool() {
        assert!(bool::from(DeliveryOutcome::Delivered { status: 202 }));

        let failed = DeliveryOutcome::Failed(DeliveryFailure::Status {
            status: 500,
            body: None,
        });
        assert!(!failed.is_delivered());
        assert!(matches!(
            failed.failure(),
            Some(DeliveryFailure::Status { status: 500, .. })
        ));
    }

    #[test]
    fn test_template_syntax_deserialize() {
        let syntax: TemplateSyntax = serde_json::from_value(json!("ejs")).unwrap();
        assert_eq!(syntax, TemplateSyntax::Ejs);
        assert_eq!(TemplateSyntax::default(), TemplateSyntax::Ejs);
    }
}
