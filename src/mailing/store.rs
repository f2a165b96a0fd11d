//! Configuration store: validated templates, endpoint and credential

use std::collections::HashMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use super::renderer::TemplateRenderer;
use super::types::{MailingError, MailingResult, TemplateSet, TemplateSyntax, DEFAULT_TEMPLATE};

/// Everything the setup call needs
#[derive(Debug, Clone, Default)]
pub struct SetupOptions {
    /// Template name to file path; must contain `"default"`
    pub templates: HashMap<String, PathBuf>,

    /// Delivery endpoint the rendered mail is POSTed to
    pub endpoint_url: String,

    /// Sent as `X-Api-Key` with every delivery request
    pub api_key: String,

    pub syntax: TemplateSyntax,

    /// Per-request timeout for delivery; `None` uses the transport default
    pub timeout: Option<Duration>,
}

impl SetupOptions {
    pub fn new(endpoint_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Register a template file
    pub fn template(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.templates.insert(name.into(), path.into());
        self
    }

    pub fn syntax(mut self, syntax: TemplateSyntax) -> Self {
        self.syntax = syntax;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Immutable configuration produced by a successful setup
pub struct MailConfiguration {
    templates: TemplateSet,
    renderer: TemplateRenderer,
    endpoint_url: String,
    api_key: String,
    syntax: TemplateSyntax,
    timeout: Option<Duration>,
}

impl MailConfiguration {
    /// Read, validate and compile everything named in `options`.
    ///
    /// Nothing is shared until this returns, so a failure leaves no trace.
    pub fn load(options: SetupOptions) -> MailingResult<Self> {
        let default_path = options
            .templates
            .get(DEFAULT_TEMPLATE)
            .ok_or(MailingError::MissingDefaultTemplate)?;

        let mut templates = TemplateSet::default();
        templates.insert(
            DEFAULT_TEMPLATE.to_string(),
            read_template(DEFAULT_TEMPLATE, default_path)?,
        );

        for (name, path) in &options.templates {
            if name == DEFAULT_TEMPLATE {
                continue;
            }
            templates.insert(name.clone(), read_template(name, path)?);
        }

        if templates
            .get(DEFAULT_TEMPLATE)
            .map_or(true, |source| source.is_empty())
        {
            return Err(MailingError::MissingDefaultTemplate);
        }

        if options.api_key.trim().is_empty() {
            return Err(MailingError::MissingCredential("api_key"));
        }
        if options.endpoint_url.trim().is_empty() {
            return Err(MailingError::MissingCredential("endpoint_url"));
        }

        let renderer = TemplateRenderer::compile(&templates, options.syntax)?;

        Ok(Self {
            templates,
            renderer,
            endpoint_url: options.endpoint_url,
            api_key: options.api_key,
            syntax: options.syntax,
            timeout: options.timeout,
        })
    }

    pub fn templates(&self) -> &TemplateSet {
        &self.templates
    }

    pub fn renderer(&self) -> &TemplateRenderer {
        &self.renderer
    }

    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn syntax(&self) -> TemplateSyntax {
        self.syntax
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl fmt::Debug for MailConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailConfiguration")
            .field("templates", &self.templates.names())
            .field("endpoint_url", &self.endpoint_url)
            .field("api_key", &"<redacted>")
            .field("syntax", &self.syntax)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn read_template(name: &str, path: &Path) -> MailingResult<String> {
    std::fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => MailingError::TemplateFileNotFound {
            name: name.to_string(),
            path: path.to_path_buf(),
        },
        _ => MailingError::TemplateRead {
            name: name.to_string(),
            path: path.to_path_buf(),
            source,
        },
    })
}

/// Holder of the process-wide mailing configuration.
///
/// Starts unconfigured and becomes ready after the first successful
/// [`setup`](ConfigStore::setup). Later setups replace the whole
/// configuration; failed setups change nothing.
#[derive(Debug, Default)]
pub struct ConfigStore {
    current: RwLock<Option<Arc<MailConfiguration>>>,
}

impl ConfigStore {
    /// Create an unconfigured store
    pub fn new() -> Self {
        Self::default()
    }

    /// Load templates from disk and validate credentials
    pub fn setup(&self, options: SetupOptions) -> MailingResult<()> {
        let requested = options.templates.len();
        let configuration = MailConfiguration::load(options)?;

        let mut current = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *current = Some(Arc::new(configuration));

        tracing::info!(templates = requested, "Loaded {} e-mail template(s)", requested);
        Ok(())
    }

    /// Snapshot of the current configuration, or `SetupIncomplete`
    pub fn check_ready(&self) -> MailingResult<Arc<MailConfiguration>> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
            .ok_or(MailingError::SetupIncomplete)
    }

    pub fn is_ready(&self) -> bool {
        self.check_ready().is_ok()
    }

    /// Names of loaded templates; empty while unconfigured
    pub fn template_names(&self) -> Vec<String> {
        self.check_ready()
            .map(|config| config.templates().names())
            .unwrap_or_default()
    }
}

/// Create an Arc-wrapped, unconfigured store
pub fn create_config_store() -> Arc<ConfigStore> {
    Arc::new(ConfigStore::new())
}
