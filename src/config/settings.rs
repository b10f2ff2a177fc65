//! Application settings read from environment variables.
//!
//! `.env` is loaded by `main` before these are read, so values may come from
//! either place.

use crate::config::database::get_database_url;
use crate::core::session::DEFAULT_SESSION_MAX_AGE_DAYS;
use crate::errors::{Error, Result};
use std::env::VarError;

/// Default location of the catalog seed file.
pub const DEFAULT_CATALOG_PATH: &str = "catalog.toml";

/// Runtime settings for the storefront.
#[derive(Debug, Clone)]
pub struct AppSettings {
    /// Database connection string (`DATABASE_URL`)
    pub database_url: String,
    /// Path of the catalog seed file (`CATALOG_PATH`)
    pub catalog_path: String,
    /// Lifetime of the guest session cookies in days (`SESSION_MAX_AGE_DAYS`)
    pub session_max_age_days: i64,
}

impl AppSettings {
    /// Reads settings from the environment, applying defaults for unset values.
    ///
    /// # Errors
    /// Returns an error if `SESSION_MAX_AGE_DAYS` is set but is not a positive integer,
    /// or if `CATALOG_PATH` or `SESSION_MAX_AGE_DAYS` is not valid Unicode.
    pub fn from_env() -> Result<Self> {
        let session_max_age_days = match optional_var(std::env::var("SESSION_MAX_AGE_DAYS"))? {
            Some(raw) => parse_max_age_days(&raw)?,
            None => DEFAULT_SESSION_MAX_AGE_DAYS,
        };
        let catalog_path = optional_var(std::env::var("CATALOG_PATH"))?
            .unwrap_or_else(|| DEFAULT_CATALOG_PATH.to_string());

        Ok(Self {
            database_url: get_database_url(),
            catalog_path,
            session_max_age_days,
        })
    }
}

/// Unset variables are `None`; set but non-Unicode ones are an error.
fn optional_var(value: std::result::Result<String, VarError>) -> Result<Option<String>> {
    match value {
        Ok(raw) => Ok(Some(raw)),
        Err(VarError::NotPresent) => Ok(None),
        Err(e @ VarError::NotUnicode(_)) => Err(e.into()),
    }
}

fn parse_max_age_days(raw: &str) -> Result<i64> {
    match raw.trim().parse::<i64>() {
        Ok(days) if days > 0 => Ok(days),
        _ => Err(Error::Config {
            message: format!("SESSION_MAX_AGE_DAYS must be a positive integer, got '{raw}'"),
        }),
    }
}
