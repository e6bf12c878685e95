//! Bulk price updates: select items (optionally by category) and change the
//! price of each one.
//!
//! Two strategies produce the same result set. [`FanOutUpdater`] reads the
//! candidates and issues one conditional update per item concurrently;
//! [`StatementUpdater`] hands the whole change to the store's statement path.
//! Neither is transactional: if one write fails the call fails, and writes
//! that already landed stay applied.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use futures::future::try_join_all;
use serde_json::Value;
use thiserror::Error as ThisError;
use tracing::info;

use crate::error::{ApiError, StoreError};
use crate::model::Inventory;
use crate::pricing::PriceChange;
use crate::store::InventoryStore;

/// Body field carrying the change amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeField {
    Discount,
    Price,
}

impl ChangeField {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeField::Discount => "discount",
            ChangeField::Price => "price",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BulkUpdate {
    pub change: PriceChange,
    pub category: Option<String>,
}

impl BulkUpdate {
    /// Reads `{ <field>: number, category?: string }`.
    ///
    /// A falsy change value (absent, `null`, `0`, `false`, `""`) is reported
    /// as a missing field before the store is touched.
    pub fn from_body(body: &Value, field: ChangeField) -> Result<Self, ApiError> {
        let name = field.as_str();
        let raw = match body.get(name) {
            Some(value) if !is_falsy(value) => value,
            _ => return Err(ApiError::missing_field(name)),
        };
        let amount = raw
            .as_f64()
            .ok_or_else(|| ApiError::validation(format!("{name} must be a `number` type")))?;

        let change = match field {
            ChangeField::Discount if !(0.0..=100.0).contains(&amount) => {
                return Err(ApiError::validation("discount must be between 0 and 100"));
            }
            ChangeField::Discount => PriceChange::Discount(amount),
            ChangeField::Price if amount < 0.0 => {
                return Err(ApiError::validation("price must be greater than or equal to 0"));
            }
            ChangeField::Price => PriceChange::Set(amount),
        };

        let category = match body.get("category") {
            None | Some(Value::Null) => None,
            Some(Value::String(category)) if category.is_empty() => None,
            Some(Value::String(category)) => Some(category.clone()),
            Some(_) => return Err(ApiError::validation("category must be a `string` type")),
        };

        Ok(Self { change, category })
    }

    /// Runs the update and returns every touched item with its new price, in
    /// the order the store produced the candidates.
    pub async fn apply(
        &self,
        store: &dyn InventoryStore,
        updater: &dyn PriceUpdater,
    ) -> Result<Vec<Inventory>, StoreError> {
        let updated = updater
            .update_prices(store, self.change, self.category.as_deref())
            .await?;
        info!(
            change = ?self.change,
            category = ?self.category,
            count = updated.len(),
            "applied bulk price update"
        );
        Ok(updated)
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

#[async_trait]
pub trait PriceUpdater: Send + Sync {
    async fn update_prices(
        &self,
        store: &dyn InventoryStore,
        change: PriceChange,
        category: Option<&str>,
    ) -> Result<Vec<Inventory>, StoreError>;
}

/// One conditional write per candidate, all in flight at once.
#[derive(Debug, Default, Clone, Copy)]
pub struct FanOutUpdater;

#[async_trait]
impl PriceUpdater for FanOutUpdater {
    async fn update_prices(
        &self,
        store: &dyn InventoryStore,
        change: PriceChange,
        category: Option<&str>,
    ) -> Result<Vec<Inventory>, StoreError> {
        let candidates = match category {
            Some(category) => store.scan_by_category(category).await?,
            None => store.scan_all().await?,
        };

        try_join_all(
            candidates
                .iter()
                .map(|item| store.update_price(&item.inventory_id, change.apply(item.price))),
        )
        .await
    }
}

/// Delegates to the store's server-side statement path.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatementUpdater;

#[async_trait]
impl PriceUpdater for StatementUpdater {
    async fn update_prices(
        &self,
        store: &dyn InventoryStore,
        change: PriceChange,
        category: Option<&str>,
    ) -> Result<Vec<Inventory>, StoreError> {
        store.update_prices_by_statement(change, category).await
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UpdateStrategy {
    #[default]
    FanOut,
    Statement,
}

impl UpdateStrategy {
    pub fn updater(self) -> Box<dyn PriceUpdater> {
        match self {
            UpdateStrategy::FanOut => Box::new(FanOutUpdater),
            UpdateStrategy::Statement => Box::new(StatementUpdater),
        }
    }
}

#[derive(Debug, ThisError)]
#[error("unknown price update strategy `{0}`, expected `fan-out` or `statement`")]
pub struct UnknownStrategy(pub String);

impl FromStr for UpdateStrategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fan-out" | "fanout" => Ok(UpdateStrategy::FanOut),
            "statement" => Ok(UpdateStrategy::Statement),
            _ => Err(UnknownStrategy(s.to_string())),
        }
    }
}

impl fmt::Display for UpdateStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateStrategy::FanOut => f.write_str("fan-out"),
            UpdateStrategy::Statement => f.write_str("statement"),
        }
    }
}
