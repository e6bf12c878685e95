use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::{Inventory, InventoryPage};
use crate::pricing::PriceChange;

mod attr;
mod dynamo;
mod memory;

pub use dynamo::DynamoStore;
pub use memory::MemoryStore;

/// Persistence for inventory records.
///
/// Handlers only ever see this trait; `DynamoStore` backs the deployed
/// function and `MemoryStore` backs local runs and tests.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<Inventory>, StoreError>;

    /// One page of a full scan, resuming after `start_after` when given.
    async fn scan_page(
        &self,
        limit: i32,
        start_after: Option<&str>,
    ) -> Result<InventoryPage, StoreError>;

    /// Every record, following continuation tokens until the table is exhausted.
    async fn scan_all(&self) -> Result<Vec<Inventory>, StoreError>;

    async fn scan_by_category(&self, category: &str) -> Result<Vec<Inventory>, StoreError>;

    async fn put(&self, inventory: &Inventory) -> Result<(), StoreError>;

    /// Sets the price of an existing record and returns the record as stored.
    /// Fails with [`StoreError::Missing`] if the record is gone.
    async fn update_price(&self, id: &str, price: f64) -> Result<Inventory, StoreError>;

    /// Applies `change` to every record in `category` (or every record) with
    /// server-side statements instead of one request per item.
    async fn update_prices_by_statement(
        &self,
        change: PriceChange,
        category: Option<&str>,
    ) -> Result<Vec<Inventory>, StoreError>;
}
