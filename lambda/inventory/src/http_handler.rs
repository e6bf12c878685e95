use std::sync::Arc;

use lambda_http::http::StatusCode;
use lambda_http::{Body, Error, Request, RequestExt, Response};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::bulk::{BulkUpdate, ChangeField, PriceUpdater, UpdateStrategy};
use crate::error::{ApiError, StoreError};
use crate::model::Inventory;
use crate::response::json_response;
use crate::store::InventoryStore;
use crate::validate::validate_inventory;

const DEFAULT_LIMIT: i32 = 10;

/// Handles shared by every invocation of a warm function.
pub struct AppState {
    store: Arc<dyn InventoryStore>,
    updater: Box<dyn PriceUpdater>,
}

impl AppState {
    pub fn new(store: Arc<dyn InventoryStore>, strategy: UpdateStrategy) -> Self {
        Self {
            store,
            updater: strategy.updater(),
        }
    }
}

type Outcome = Result<(StatusCode, Value), ApiError>;

pub async fn function_handler(state: &AppState, event: Request) -> Result<Response<Body>, Error> {
    let method = event.method().as_str();
    let path = event.uri().path().trim_end_matches('/');
    info!(method, path, "handling inventory request");

    let outcome = match (method, path) {
        ("POST", "/inventory") => create_inventory(state, &event).await,
        ("GET", "/inventory") => list_inventory(state, &event).await,
        ("POST", "/inventory/discount") => update_prices(state, &event, ChangeField::Discount).await,
        ("PUT", "/inventory") => update_prices(state, &event, ChangeField::Price).await,
        ("GET", p) if item_id(p).is_some() => get_inventory(state, &event).await,
        _ => {
            return json_response(StatusCode::NOT_FOUND, &json!({ "error": "route not found" }));
        }
    };

    match outcome {
        Ok((status, body)) => json_response(status, &body),
        Err(ApiError::Store(err)) => {
            error!(error = %err, method, path, "inventory store request failed");
            Err(err.into())
        }
        Err(err) => {
            warn!(error = %err, method, path, "rejected inventory request");
            err.into_response()
        }
    }
}

async fn create_inventory(state: &AppState, event: &Request) -> Outcome {
    let draft = validate_inventory(parse_body(event)?)?;
    let inventory = Inventory::new(Uuid::new_v4().to_string(), draft);

    state.store.put(&inventory).await?;
    info!(inventory_id = %inventory.inventory_id, "created inventory");

    Ok((StatusCode::CREATED, to_body(&inventory)?))
}

async fn get_inventory(state: &AppState, event: &Request) -> Outcome {
    let params = event.path_parameters();
    let id = match params.first("id") {
        Some(id) if !id.is_empty() => id,
        _ => item_id(event.uri().path().trim_end_matches('/')).unwrap_or_default(),
    };

    match state.store.get(id).await? {
        Some(inventory) => Ok((StatusCode::OK, to_body(&inventory)?)),
        None => Err(ApiError::not_found()),
    }
}

async fn list_inventory(state: &AppState, event: &Request) -> Outcome {
    let query = event.query_string_parameters();
    let limit = match query.first("limit").filter(|raw| !raw.is_empty()) {
        Some(raw) => raw
            .parse::<i32>()
            .ok()
            .filter(|limit| *limit > 0)
            .ok_or_else(|| ApiError::validation("limit must be a positive integer"))?,
        None => DEFAULT_LIMIT,
    };
    let last_key = query.first("last_key").filter(|key| !key.is_empty());

    let page = state.store.scan_page(limit, last_key).await?;
    Ok((StatusCode::OK, to_body(&page)?))
}

async fn update_prices(state: &AppState, event: &Request, field: ChangeField) -> Outcome {
    let request = BulkUpdate::from_body(&parse_body(event)?, field)?;
    let inventories = request
        .apply(state.store.as_ref(), state.updater.as_ref())
        .await?;

    Ok((StatusCode::OK, to_body(&UpdatedInventories { inventories: &inventories })?))
}

#[derive(Serialize)]
struct UpdatedInventories<'a> {
    inventories: &'a [Inventory],
}

/// The single segment after `/inventory/`, if that is all the path holds.
fn item_id(path: &str) -> Option<&str> {
    path.strip_prefix("/inventory/")
        .filter(|id| !id.is_empty() && !id.contains('/'))
}

fn parse_body(event: &Request) -> Result<Value, ApiError> {
    serde_json::from_slice(event.body().as_ref()).map_err(|err| ApiError::Parse(err.to_string()))
}

fn to_body<T: Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|err| StoreError::from(err).into())
}
