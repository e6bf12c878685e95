use std::sync::Arc;

use inventory::config::Config;
use inventory::http_handler::{function_handler, AppState};
use inventory::store::DynamoStore;
use lambda_http::{run, service_fn, tracing, Error};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::init_default_subscriber();

    let settings = Config::from_env()?;
    let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let client = aws_sdk_dynamodb::Client::new(&config);
    tracing::info!(table = %settings.table, strategy = %settings.strategy, "inventory function starting");

    let state = AppState::new(Arc::new(DynamoStore::new(client, settings.table)), settings.strategy);

    run(service_fn(|event| function_handler(&state, event))).await
}
