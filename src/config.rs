use std::sync::Arc;
use std::time::Duration;

use access::BcryptHasher;
use access::password::DEFAULT_BCRYPT_COST;
use anyhow::Result;
use config::{Config, Environment, File};
use sea_orm::Database;
use serde::Deserialize;
use tracing::{debug, info};

use crate::schemas::AppState;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://learnhub.db?mode=rwc";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Runtime settings. Sources, lowest precedence first: built-in defaults,
/// an optional `learnhub.{toml,yaml,json}` file, then environment variables
/// (`DATABASE_URL`, `BIND_ADDRESS`, `BCRYPT_COST`, `REQUEST_TIMEOUT_SECS`).
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database_url: String,
    pub bind_address: String,
    pub bcrypt_cost: u32,
    pub request_timeout_secs: u64,
}

impl Settings {
    /// Load settings, reading a `.env` file first if one exists.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings: Settings = Config::builder()
            .set_default("database_url", DEFAULT_DATABASE_URL)?
            .set_default("bind_address", DEFAULT_BIND_ADDRESS)?
            .set_default("bcrypt_cost", i64::from(DEFAULT_BCRYPT_COST))?
            .set_default("request_timeout_secs", DEFAULT_REQUEST_TIMEOUT_SECS as i64)?
            .add_source(File::with_name("learnhub").required(false))
            .add_source(Environment::default().try_parsing(true))
            .build()?
            .try_deserialize()?;

        debug!(?settings, "Settings loaded");
        Ok(settings)
    }

    /// Apply command line overrides on top of the loaded values.
    pub fn with_overrides(mut self, database_url: Option<String>, bind_address: Option<String>) -> Self {
        if let Some(database_url) = database_url {
            self.database_url = database_url;
        }
        if let Some(bind_address) = bind_address {
            self.bind_address = bind_address;
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Connect to the database and build the shared handler state.
pub async fn initialize_app_state(settings: &Settings) -> Result<AppState> {
    info!("Connecting to database: {}", settings.database_url);
    let db = Database::connect(&settings.database_url).await?;

    debug!("Using bcrypt cost {}", settings.bcrypt_cost);
    Ok(AppState {
        db,
        hasher: Arc::new(BcryptHasher::new(settings.bcrypt_cost)),
    })
}
