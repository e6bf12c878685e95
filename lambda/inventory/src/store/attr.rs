use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use serde_json::{Map, Number, Value};

use crate::error::StoreError;
use crate::model::Inventory;

pub(crate) type Item = HashMap<String, AttributeValue>;

pub(crate) fn to_attribute(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(flag) => AttributeValue::Bool(*flag),
        Value::Number(number) => AttributeValue::N(number.to_string()),
        Value::String(text) => AttributeValue::S(text.clone()),
        Value::Array(values) => AttributeValue::L(values.iter().map(to_attribute).collect()),
        Value::Object(fields) => AttributeValue::M(to_item(fields)),
    }
}

pub(crate) fn to_item(fields: &Map<String, Value>) -> Item {
    fields
        .iter()
        .map(|(name, value)| (name.clone(), to_attribute(value)))
        .collect()
}

pub(crate) fn from_attribute(name: &str, attribute: &AttributeValue) -> Result<Value, StoreError> {
    let value = match attribute {
        AttributeValue::S(text) => Value::String(text.clone()),
        AttributeValue::N(raw) => Value::Number(parse_number(name, raw)?),
        AttributeValue::Bool(flag) => Value::Bool(*flag),
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::L(values) => Value::Array(
            values
                .iter()
                .map(|value| from_attribute(name, value))
                .collect::<Result<_, _>>()?,
        ),
        AttributeValue::M(fields) => Value::Object(from_item(fields)?),
        AttributeValue::Ss(values) => Value::Array(values.iter().cloned().map(Value::String).collect()),
        AttributeValue::Ns(values) => Value::Array(
            values
                .iter()
                .map(|raw| parse_number(name, raw).map(Value::Number))
                .collect::<Result<_, _>>()?,
        ),
        other => {
            return Err(StoreError::Decode {
                attribute: name.to_string(),
                reason: format!("unsupported attribute {other:?}"),
            })
        }
    };
    Ok(value)
}

pub(crate) fn from_item(item: &Item) -> Result<Map<String, Value>, StoreError> {
    item.iter()
        .map(|(name, attribute)| Ok((name.clone(), from_attribute(name, attribute)?)))
        .collect()
}

pub(crate) fn inventory_to_item(inventory: &Inventory) -> Result<Item, StoreError> {
    match serde_json::to_value(inventory)? {
        Value::Object(fields) => Ok(to_item(&fields)),
        other => Err(StoreError::Decode {
            attribute: "inventoryId".to_string(),
            reason: format!("record serialized to {other}"),
        }),
    }
}

pub(crate) fn item_to_inventory(item: &Item) -> Result<Inventory, StoreError> {
    Ok(serde_json::from_value(Value::Object(from_item(item)?))?)
}

fn parse_number(name: &str, raw: &str) -> Result<Number, StoreError> {
    raw.parse::<Number>().map_err(|err| StoreError::Decode {
        attribute: name.to_string(),
        reason: err.to_string(),
    })
}
