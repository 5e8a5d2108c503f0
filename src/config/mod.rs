//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Configuration is loaded with the
//! `SWITCHBOARD` prefix and nested values use double underscores as
//! separators. Malformed or missing required settings fail at process
//! startup, never at turn time.
//!
//! # Example
//!
//! ```no_run
//! use switchboard::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod bots;
mod error;
mod logger;
mod nlu;
mod server;
mod session;
mod transport;

pub use bots::{BotsConfig, DialogBotConfig, EchoBotConfig, HelpdeskBotConfig, QnaBotConfig};
pub use error::{ConfigError, ValidationError};
pub use logger::{LoggerConfig, LoggerSinkKind, PostgresLoggerConfig, RestLoggerConfig};
pub use nlu::NluConfig;
pub use server::ServerConfig;
pub use session::{SessionConfig, SessionStoreKind};
pub use transport::TransportConfig;

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// HTTP ingress (host, port, logging)
    #[serde(default)]
    pub server: ServerConfig,

    /// Session persistence (memory vs. networked cache)
    #[serde(default)]
    pub session: SessionConfig,

    /// Primary NLU service
    #[serde(default)]
    pub nlu: NluConfig,

    /// Secondary backends
    #[serde(default)]
    pub bots: BotsConfig,

    /// Conversation analytics sink
    #[serde(default)]
    pub logger: LoggerConfig,

    /// Outbound channel transport
    #[serde(default)]
    pub transport: TransportConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Loads a `.env` file if present, then reads environment variables
    /// with the `SWITCHBOARD` prefix, `__` separating nested values:
    /// `SWITCHBOARD__SERVER__PORT=3978` -> `server.port = 3978`.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("SWITCHBOARD")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration sections
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.session.validate()?;
        self.nlu.validate()?;
        self.bots.validate()?;
        self.logger.validate()?;
        self.transport.validate()?;
        Ok(())
    }
}
