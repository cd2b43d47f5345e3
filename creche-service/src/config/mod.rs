use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct CrecheConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub store: StoreConfig,
    pub receipts: ReceiptConfig,
    pub billing: BillingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub mongodb_uri: Option<String>,
    pub database: String,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    MongoDb,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReceiptConfig {
    pub local_path: String,
}

/// Tariffs used when neither the child nor the creche settings carry one.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct BillingSettings {
    pub default_monthly_fee: i64,
    pub default_registration_fee: i64,
}

impl Default for BillingSettings {
    fn default() -> Self {
        Self {
            default_monthly_fee: 150_000,
            default_registration_fee: 50_000,
        }
    }
}

impl CrecheConfig {
    pub fn load() -> Result<Self, AppError> {
        // Common config (handles .env and APP__ prefix)
        let common_config = core_config::Config::load()?;

        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let backend: StoreBackend = get_env("STORE_BACKEND", Some("mongodb"), false)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;
        if is_prod && backend == StoreBackend::Memory {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "STORE_BACKEND=memory is not allowed in production"
            )));
        }

        let mongodb_uri = match backend {
            StoreBackend::MongoDb => Some(get_env(
                "MONGODB_URI",
                Some("mongodb://localhost:27017"),
                is_prod,
            )?),
            StoreBackend::Memory => None,
        };

        let defaults = BillingSettings::default();

        Ok(CrecheConfig {
            common: common_config,
            store: StoreConfig {
                backend,
                mongodb_uri,
                database: get_env("MONGODB_DATABASE", Some("creche_db"), is_prod)?,
            },
            receipts: ReceiptConfig {
                local_path: get_env("RECEIPTS_LOCAL_PATH", Some("storage"), is_prod)?,
            },
            billing: BillingSettings {
                default_monthly_fee: parse_amount(
                    "DEFAULT_MONTHLY_FEE",
                    defaults.default_monthly_fee,
                )?,
                default_registration_fee: parse_amount(
                    "DEFAULT_REGISTRATION_FEE",
                    defaults.default_registration_fee,
                )?,
            },
        })
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "mongodb" | "mongo" => Ok(StoreBackend::MongoDb),
            _ => Err(format!("Invalid store backend: {}", s)),
        }
    }
}

fn parse_amount(key: &str, default: i64) -> Result<i64, AppError> {
    match env::var(key) {
        Ok(val) => {
            let amount: i64 = val.trim().parse().map_err(|_| {
                AppError::ConfigError(anyhow::anyhow!("{} must be an integer, got {}", key, val))
            })?;
            if amount < 0 {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} cannot be negative",
                    key
                )));
            }
            Ok(amount)
        }
        Err(_) => Ok(default),
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}
