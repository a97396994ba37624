// Configuration module entry point
// Loads gateway configuration from file, environment and defaults

mod types;

pub use types::{
    Config, ErrorPolicy, GatewayConfig, LoggingConfig, ServerConfig, DEFAULT_READ_CHUNK_SIZE,
};

/// Default config file name (without extension)
pub const DEFAULT_CONFIG_PATH: &str = "gateway";

impl Config {
    /// Load configuration from the default file
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from specified file path (without extension)
    /// The file is optional; environment variables use the `GATEWAY_` prefix
    /// and `__` between sections, e.g. `GATEWAY_SERVER__PORT=9000`
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("GATEWAY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("server.host", "")?
            .set_default("server.port", 8888)?
            .set_default("server.backlog", 128)?
            .set_default("server.on_error", "continue")?
            .set_default("gateway.read_chunk_size", DEFAULT_READ_CHUNK_SIZE as u64)?
            .set_default("gateway.protocol_literal", "1.1")?
            .set_default("gateway.server_software", "WSGIServer 0.2")?
            .set_default("logging.level", "info")?
            .set_default("logging.trace", true)?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values the server cannot run with
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.gateway.read_chunk_size == 0 {
            return Err(config::ConfigError::Message(
                "gateway.read_chunk_size must be at least 1".to_string(),
            ));
        }
        if self.server.backlog <= 0 {
            return Err(config::ConfigError::Message(format!(
                "server.backlog must be positive, got {}",
                self.server.backlog
            )));
        }
        Ok(())
    }
}
