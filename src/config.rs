// src/config.rs

use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub kraken_api_url: String,
    /// Pause between trade-history pages, in milliseconds.
    pub trade_page_delay_ms: u64,
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("bind_addr", "0.0.0.0:3000")?
            .set_default("kraken_api_url", crate::connectors::kraken::KRAKEN_API_URL)?
            .set_default("trade_page_delay_ms", 200u64)?
            .add_source(File::with_name("Settings").required(false))
            .add_source(config::Environment::with_prefix("APP"));

        let config = builder.build()?;
        config.try_deserialize()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            kraken_api_url: crate::connectors::kraken::KRAKEN_API_URL.to_string(),
            trade_page_delay_ms: 200,
        }
    }
}
