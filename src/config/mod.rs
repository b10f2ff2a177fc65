/// Catalog seed loading from catalog.toml
pub mod catalog;

/// Database connection and schema management
pub mod database;

/// Environment-driven application settings
pub mod settings;
