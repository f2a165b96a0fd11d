use config::{Config, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::Result;
use crate::mailing::{SetupOptions, TemplateSyntax};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    pub mailing: MailingConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailingConfig {
    /// Delivery endpoint URL
    #[serde(default)]
    pub endpoint_url: String,
    /// Credential sent as X-Api-Key to the delivery endpoint
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub syntax: TemplateSyntax,
    /// Delivery request timeout in seconds (0 disables the timeout)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Template name -> file path; must contain "default"
    #[serde(default)]
    pub templates: HashMap<String, PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
    /// Key required in the X-API-Key header of inbound API calls
    pub key: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8082
}

fn default_request_timeout() -> u64 {
    30 // 30 seconds
}

impl Settings {
    pub fn new() -> Result<Self> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8082)?
            .set_default("mailing.request_timeout_secs", 30)?
            .set_default("logging.format", "pretty")?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables
            // MAILER__SERVER__PORT, MAILER__MAILING__API_KEY, MAILER__MAILING__TEMPLATES__DEFAULT, etc.
            .add_source(
                Environment::with_prefix("MAILER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        Ok(builder.build()?.try_deserialize()?)
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl MailingConfig {
    /// Build the options for `ConfigStore::setup`
    pub fn setup_options(&self) -> SetupOptions {
        let mut options = SetupOptions::new(self.endpoint_url.clone(), self.api_key.clone())
            .syntax(self.syntax);
        options.templates = self.templates.clone();

        if self.request_timeout_secs > 0 {
            options = options.timeout(Duration::from_secs(self.request_timeout_secs));
        }

        options
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
        }
    }
}
