use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::operation::scan::builders::ScanFluentBuilder;
use aws_sdk_dynamodb::types::{AttributeValue, BatchStatementRequest, ReturnValue};
use aws_sdk_dynamodb::Client;
use async_trait::async_trait;
use tracing::debug;

use super::attr::{inventory_to_item, item_to_inventory};
use super::InventoryStore;
use crate::error::StoreError;
use crate::model::{Inventory, InventoryPage, PageKey};
use crate::pricing::PriceChange;

const KEY: &str = "inventoryId";

// BatchExecuteStatement accepts at most 25 statements per call.
const STATEMENT_BATCH: usize = 25;

/// Inventory table in DynamoDB, keyed by `inventoryId`.
#[derive(Debug, Clone)]
pub struct DynamoStore {
    client: Client,
    table: String,
}

impl DynamoStore {
    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    fn scan_request(&self, category: Option<&str>) -> ScanFluentBuilder {
        let request = self.client.scan().table_name(&self.table);
        match category {
            Some(category) => request
                .filter_expression("#category = :category")
                .expression_attribute_names("#category", "category")
                .expression_attribute_values(":category", AttributeValue::S(category.to_string())),
            None => request,
        }
    }

    async fn scan_exhaustive(&self, category: Option<&str>) -> Result<Vec<Inventory>, StoreError> {
        let mut inventories = Vec::new();
        let mut start_key = None;
        loop {
            let output = self
                .scan_request(category)
                .set_exclusive_start_key(start_key)
                .send()
                .await
                .map_err(backend)?;

            for item in output.items() {
                inventories.push(item_to_inventory(item)?);
            }

            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }
        debug!(table = %self.table, ?category, count = inventories.len(), "scanned inventory");
        Ok(inventories)
    }
}

fn backend<E>(err: E) -> StoreError
where
    E: std::error::Error + 'static,
{
    StoreError::Backend(DisplayErrorContext(err).to_string())
}

#[async_trait]
impl InventoryStore for DynamoStore {
    async fn get(&self, id: &str) -> Result<Option<Inventory>, StoreError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table)
            .key(KEY, AttributeValue::S(id.to_string()))
            .send()
            .await
            .map_err(backend)?;

        output.item().map(item_to_inventory).transpose()
    }

    async fn scan_page(
        &self,
        limit: i32,
        start_after: Option<&str>,
    ) -> Result<InventoryPage, StoreError> {
        let mut request = self.client.scan().table_name(&self.table).limit(limit);
        if let Some(id) = start_after {
            request = request.exclusive_start_key(KEY, AttributeValue::S(id.to_string()));
        }
        let output = request.send().await.map_err(backend)?;

        let inventories = output
            .items()
            .iter()
            .map(item_to_inventory)
            .collect::<Result<Vec<_>, _>>()?;
        let last_evaluated_key = output
            .last_evaluated_key()
            .and_then(|key| key.get(KEY))
            .and_then(|value| value.as_s().ok())
            .map(|id| PageKey {
                inventory_id: id.clone(),
            });

        Ok(InventoryPage {
            inventories,
            last_evaluated_key,
        })
    }

    async fn scan_all(&self) -> Result<Vec<Inventory>, StoreError> {
        self.scan_exhaustive(None).await
    }

    async fn scan_by_category(&self, category: &str) -> Result<Vec<Inventory>, StoreError> {
        self.scan_exhaustive(Some(category)).await
    }

    async fn put(&self, inventory: &Inventory) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(inventory_to_item(inventory)?))
            .send()
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn update_price(&self, id: &str, price: f64) -> Result<Inventory, StoreError> {
        let output = self
            .client
            .update_item()
            .table_name(&self.table)
            .key(KEY, AttributeValue::S(id.to_string()))
            .update_expression("SET #price = :price")
            .expression_attribute_names("#price", "price")
            .expression_attribute_values(":price", AttributeValue::N(price.to_string()))
            .condition_expression("attribute_exists(inventoryId)")
            .return_values(ReturnValue::AllNew)
            .send()
            .await
            .map_err(|err| {
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_conditional_check_failed_exception())
                {
                    StoreError::Missing(id.to_string())
                } else {
                    backend(err)
                }
            })?;

        let attributes = output
            .attributes()
            .ok_or_else(|| StoreError::Missing(id.to_string()))?;
        item_to_inventory(attributes)
    }

    async fn update_prices_by_statement(
        &self,
        change: PriceChange,
        category: Option<&str>,
    ) -> Result<Vec<Inventory>, StoreError> {
        let candidates = self.scan_exhaustive(category).await?;
        // PartiQL updates must name the full key, so one statement per item
        // travels in each batch.
        let statement = format!("UPDATE \"{}\" SET price=? WHERE inventoryId=?", self.table);

        let mut updated = Vec::with_capacity(candidates.len());
        for chunk in candidates.chunks(STATEMENT_BATCH) {
            let statements = chunk
                .iter()
                .map(|item| {
                    BatchStatementRequest::builder()
                        .statement(&statement)
                        .parameters(AttributeValue::N(change.apply(item.price).to_string()))
                        .parameters(AttributeValue::S(item.inventory_id.clone()))
                        .build()
                        .map_err(backend)
                })
                .collect::<Result<Vec<_>, _>>()?;

            let output = self
                .client
                .batch_execute_statement()
                .set_statements(Some(statements))
                .send()
                .await
                .map_err(backend)?;

            for (item, response) in chunk.iter().zip(output.responses()) {
                if let Some(error) = response.error() {
                    return Err(StoreError::Statement {
                        id: item.inventory_id.clone(),
                        reason: error.message().unwrap_or_default().to_string(),
                    });
                }
                let mut item = item.clone();
                item.price = change.apply(item.price);
                updated.push(item);
            }
        }
        debug!(table = %self.table, count = updated.len(), "applied price statements");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use aws_sdk_dynamodb::operation::batch_execute_statement::BatchExecuteStatementOutput;
    use aws_sdk_dynamodb::operation::scan::ScanOutput;
    use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
    use aws_sdk_dynamodb::types::error::ConditionalCheckFailedException;
    use aws_sdk_dynamodb::types::{
        BatchStatementError, BatchStatementErrorCodeEnum, BatchStatementResponse,
    };
    use aws_smithy_mocks::{mock, mock_client, RuleMode};

    use super::*;

    const TABLE: &str = "InventoryTable";
    const STATEMENT: &str = "UPDATE \"InventoryTable\" SET price=? WHERE inventoryId=?";

    fn item(id: &str, category: &str, price: f64) -> HashMap<String, AttributeValue> {
        HashMap::from([
            (KEY.to_string(), AttributeValue::S(id.to_string())),
            ("name".to_string(), AttributeValue::S(format!("item {id}"))),
            ("price".to_string(), AttributeValue::N(price.to_string())),
            (
                "supplier".to_string(),
                AttributeValue::M(HashMap::from([(
                    "name".to_string(),
                    AttributeValue::S("Acme".to_string()),
                )])),
            ),
            ("category".to_string(), AttributeValue::S(category.to_string())),
            ("current_stock".to_string(), AttributeValue::N("4".to_string())),
        ])
    }

    fn ok_responses(count: usize) -> BatchExecuteStatementOutput {
        BatchExecuteStatementOutput::builder()
            .set_responses(Some(vec![BatchStatementResponse::builder().build(); count]))
            .build()
    }

    #[tokio::test]
    async fn category_scan_follows_every_page() {
        let first = mock!(aws_sdk_dynamodb::Client::scan)
            .match_requests(|req| req.exclusive_start_key().is_none())
            .then_output(|| {
                ScanOutput::builder()
                    .items(item("a", "tools", 10.0))
                    .last_evaluated_key(KEY, AttributeValue::S("a".to_string()))
                    .build()
            });
        let second = mock!(aws_sdk_dynamodb::Client::scan)
            .match_requests(|req| {
                req.exclusive_start_key()
                    .and_then(|key| key.get(KEY))
                    .is_some_and(|id| id == &AttributeValue::S("a".to_string()))
                    && req.filter_expression() == Some("#category = :category")
            })
            .then_output(|| ScanOutput::builder().items(item("b", "tools", 20.0)).build());
        let client = mock_client!(aws_sdk_dynamodb, RuleMode::MatchAny, [&first, &second]);
        let store = DynamoStore::new(client, TABLE);

        let found = store.scan_by_category("tools").await.unwrap();

        let ids: Vec<&str> = found.iter().map(|item| item.inventory_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(first.num_calls(), 1);
        assert_eq!(second.num_calls(), 1);
    }

    #[tokio::test]
    async fn page_exposes_the_continuation_key() {
        let rule = mock!(aws_sdk_dynamodb::Client::scan)
            .match_requests(|req| {
                req.limit() == Some(2)
                    && req
                        .exclusive_start_key()
                        .and_then(|key| key.get(KEY))
                        .is_some_and(|id| id == &AttributeValue::S("a".to_string()))
            })
            .then_output(|| {
                ScanOutput::builder()
                    .items(item("b", "tools", 1.0))
                    .items(item("c", "tools", 2.0))
                    .last_evaluated_key(KEY, AttributeValue::S("c".to_string()))
                    .build()
            });
        let client = mock_client!(aws_sdk_dynamodb, [&rule]);
        let store = DynamoStore::new(client, TABLE);

        let page = store.scan_page(2, Some("a")).await.unwrap();

        assert_eq!(page.inventories.len(), 2);
        assert_eq!(
            page.last_evaluated_key,
            Some(PageKey {
                inventory_id: "c".to_string()
            })
        );
    }

    #[tokio::test]
    async fn failed_condition_means_the_item_is_missing() {
        let rule = mock!(aws_sdk_dynamodb::Client::update_item).then_error(|| {
            UpdateItemError::ConditionalCheckFailedException(
                ConditionalCheckFailedException::builder()
                    .message("The conditional request failed")
                    .build(),
            )
        });
        let client = mock_client!(aws_sdk_dynamodb, [&rule]);
        let store = DynamoStore::new(client, TABLE);

        let err = store.update_price("ghost", 5.0).await.unwrap_err();

        assert!(matches!(err, StoreError::Missing(id) if id == "ghost"));
    }

    #[tokio::test]
    async fn statements_travel_in_batches_of_25() {
        let scan = mock!(aws_sdk_dynamodb::Client::scan).then_output(|| {
            let mut output = ScanOutput::builder();
            for n in 0..26 {
                output = output.items(item(&format!("item-{n:02}"), "tools", 100.0));
            }
            output.build()
        });
        let full = mock!(aws_sdk_dynamodb::Client::batch_execute_statement)
            .match_requests(|req| {
                req.statements().len() == 25
                    && req.statements().iter().all(|statement| {
                        statement.statement() == STATEMENT
                            && statement.parameters().first()
                                == Some(&AttributeValue::N("90".to_string()))
                    })
            })
            .then_output(|| ok_responses(25));
        let rest = mock!(aws_sdk_dynamodb::Client::batch_execute_statement)
            .match_requests(|req| req.statements().len() == 1)
            .then_output(|| ok_responses(1));
        let client = mock_client!(aws_sdk_dynamodb, RuleMode::MatchAny, [&scan, &full, &rest]);
        let store = DynamoStore::new(client, TABLE);

        let updated = store
            .update_prices_by_statement(PriceChange::Discount(10.0), None)
            .await
            .unwrap();

        assert_eq!(updated.len(), 26);
        assert!(updated.iter().all(|item| item.price == 90.0));
        assert_eq!(updated[25].inventory_id, "item-25");
        assert_eq!(full.num_calls(), 1);
        assert_eq!(rest.num_calls(), 1);
    }

    #[tokio::test]
    async fn a_rejected_statement_fails_the_update() {
        let scan = mock!(aws_sdk_dynamodb::Client::scan).then_output(|| {
            ScanOutput::builder()
                .items(item("a", "tools", 10.0))
                .items(item("b", "tools", 20.0))
                .build()
        });
        let batch = mock!(aws_sdk_dynamodb::Client::batch_execute_statement).then_output(|| {
            BatchExecuteStatementOutput::builder()
                .responses(BatchStatementResponse::builder().build())
                .responses(
                    BatchStatementResponse::builder()
                        .error(
                            BatchStatementError::builder()
                                .code(BatchStatementErrorCodeEnum::ConditionalCheckFailed)
                                .message("item deleted")
                                .build(),
                        )
                        .build(),
                )
                .build()
        });
        let client = mock_client!(aws_sdk_dynamodb, RuleMode::MatchAny, [&scan, &batch]);
        let store = DynamoStore::new(client, TABLE);

        let err = store
            .update_prices_by_statement(PriceChange::Set(1.0), Some("tools"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StoreError::Statement { id, reason } if id == "b" && reason == "item deleted"
        ));
    }
}
