use std::collections::{BTreeMap, HashSet};
use std::ops::Bound;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::InventoryStore;
use crate::error::StoreError;
use crate::model::{Inventory, InventoryPage, PageKey};
use crate::pricing::PriceChange;

/// In-process store ordered by `inventoryId`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<BTreeMap<String, Inventory>>,
    failing: RwLock<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later price write to `id` fail with a backend error.
    pub async fn fail_updates_for(&self, id: impl Into<String>) {
        self.failing.write().await.insert(id.into());
    }

    async fn check_writable(&self, id: &str) -> Result<(), StoreError> {
        if self.failing.read().await.contains(id) {
            return Err(StoreError::Backend(format!("write to `{id}` rejected")));
        }
        Ok(())
    }

    async fn matching(&self, category: Option<&str>) -> Vec<Inventory> {
        self.items
            .read()
            .await
            .values()
            .filter(|item| category.is_none_or(|category| item.category == category))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn get(&self, id: &str) -> Result<Option<Inventory>, StoreError> {
        Ok(self.items.read().await.get(id).cloned())
    }

    async fn scan_page(
        &self,
        limit: i32,
        start_after: Option<&str>,
    ) -> Result<InventoryPage, StoreError> {
        let items = self.items.read().await;
        let start = start_after.map_or(Bound::Unbounded, Bound::Excluded);
        let mut rest = items.range::<str, _>((start, Bound::Unbounded)).map(|(_, item)| item);

        let inventories: Vec<Inventory> = rest
            .by_ref()
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect();
        let last_evaluated_key = match rest.next() {
            Some(_) => inventories.last().map(|item| PageKey {
                inventory_id: item.inventory_id.clone(),
            }),
            None => None,
        };

        Ok(InventoryPage {
            inventories,
            last_evaluated_key,
        })
    }

    async fn scan_all(&self) -> Result<Vec<Inventory>, StoreError> {
        Ok(self.matching(None).await)
    }

    async fn scan_by_category(&self, category: &str) -> Result<Vec<Inventory>, StoreError> {
        Ok(self.matching(Some(category)).await)
    }

    async fn put(&self, inventory: &Inventory) -> Result<(), StoreError> {
        self.items
            .write()
            .await
            .insert(inventory.inventory_id.clone(), inventory.clone());
        Ok(())
    }

    async fn update_price(&self, id: &str, price: f64) -> Result<Inventory, StoreError> {
        self.check_writable(id).await?;
        let mut items = self.items.write().await;
        let item = items
            .get_mut(id)
            .ok_or_else(|| StoreError::Missing(id.to_string()))?;
        item.price = price;
        Ok(item.clone())
    }

    async fn update_prices_by_statement(
        &self,
        change: PriceChange,
        category: Option<&str>,
    ) -> Result<Vec<Inventory>, StoreError> {
        let mut updated = Vec::new();
        for candidate in self.matching(category).await {
            updated.push(
                self.update_price(&candidate.inventory_id, change.apply(candidate.price))
                    .await?,
            );
        }
        Ok(updated)
    }
}
