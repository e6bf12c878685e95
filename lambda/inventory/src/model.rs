use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// A validated creation payload, before an identifier is assigned.
///
/// Fields outside the fixed set are kept and stored as sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInventory {
    pub name: String,
    pub price: f64,
    pub supplier: Map<String, Value>,
    pub category: String,
    pub current_stock: Number,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A stored inventory record, keyed by `inventoryId`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(rename = "inventoryId")]
    pub inventory_id: String,
    pub name: String,
    pub price: f64,
    pub supplier: Map<String, Value>,
    pub category: String,
    pub current_stock: Number,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Inventory {
    pub fn new(inventory_id: impl Into<String>, draft: NewInventory) -> Self {
        Self {
            inventory_id: inventory_id.into(),
            name: draft.name,
            price: draft.price,
            supplier: draft.supplier,
            category: draft.category,
            current_stock: draft.current_stock,
            extra: draft.extra,
        }
    }
}

/// Continuation token handed back by a paged scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageKey {
    #[serde(rename = "inventoryId")]
    pub inventory_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryPage {
    pub inventories: Vec<Inventory>,
    #[serde(rename = "LastEvaluatedKey", skip_serializing_if = "Option::is_none")]
    pub last_evaluated_key: Option<PageKey>,
}
