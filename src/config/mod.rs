mod settings;

pub use settings::{ApiConfig, LogFormat, LoggingConfig, MailingConfig, ServerConfig, Settings};
