use lambda_http::Error;

use crate::bulk::UpdateStrategy;

pub const DEFAULT_TABLE: &str = "InventoryTable";

/// Settings read once per cold start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub table: String,
    pub strategy: UpdateStrategy,
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let table = lookup("INVENTORY_TABLE")
            .filter(|table| !table.is_empty())
            .unwrap_or_else(|| DEFAULT_TABLE.to_string());
        let strategy = match lookup("PRICE_UPDATE_STRATEGY") {
            Some(raw) if !raw.is_empty() => raw.parse()?,
            _ => UpdateStrategy::default(),
        };
        Ok(Self { table, strategy })
    }
}
