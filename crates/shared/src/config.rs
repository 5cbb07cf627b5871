//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Bookkeeping kernel tunables.
    #[serde(default)]
    pub kernel: KernelConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Kernel tunables seeded into the settings registry at bootstrap.
#[derive(Debug, Clone, Deserialize)]
pub struct KernelConfig {
    /// Low-stock threshold given to newly created crops, in kg.
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold_kg: Decimal,
    /// Gap between ledger and physical inventory that flags a discrepancy.
    #[serde(default = "default_discrepancy_tolerance")]
    pub discrepancy_tolerance: Decimal,
    /// Whether a sale return moves the restocked cost back out of COGS.
    #[serde(default = "default_sale_return_reverses_cogs")]
    pub sale_return_reverses_cogs: bool,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            low_stock_threshold_kg: default_low_stock_threshold(),
            discrepancy_tolerance: default_discrepancy_tolerance(),
            sale_return_reverses_cogs: default_sale_return_reverses_cogs(),
        }
    }
}

fn default_low_stock_threshold() -> Decimal {
    Decimal::ONE_HUNDRED
}

fn default_discrepancy_tolerance() -> Decimal {
    Decimal::ONE
}

fn default_sale_return_reverses_cogs() -> bool {
    true
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones winning: `config/default`, `config/{RUN_MODE}`,
    /// then `GRANARY__SECTION__KEY` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("GRANARY").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
