use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::model::NewInventory;

#[derive(Debug, Clone, Copy)]
enum Kind {
    Text,
    Number,
    NonNegative,
    Object,
}

impl Kind {
    fn type_name(self) -> &'static str {
        match self {
            Kind::Text => "string",
            Kind::Number | Kind::NonNegative => "number",
            Kind::Object => "object",
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            Kind::Text => value.is_string(),
            Kind::Number | Kind::NonNegative => value.is_number(),
            Kind::Object => value.is_object(),
        }
    }
}

const INVENTORY_FIELDS: [(&str, Kind); 5] = [
    ("name", Kind::Text),
    ("price", Kind::NonNegative),
    ("supplier", Kind::Object),
    ("category", Kind::Text),
    ("current_stock", Kind::Number),
];

/// Checks a decoded creation body.
///
/// Every field is checked, so the error carries one message per bad field
/// rather than stopping at the first. A caller-supplied `inventoryId` is
/// dropped.
pub fn validate_inventory(body: Value) -> Result<NewInventory, ApiError> {
    let Value::Object(mut fields) = body else {
        return Err(ApiError::validation("body must be a JSON object"));
    };

    let errors: Vec<String> = INVENTORY_FIELDS
        .iter()
        .filter_map(|&(name, kind)| check_field(&fields, name, kind))
        .collect();
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    fields.remove("inventoryId");
    serde_json::from_value(Value::Object(fields))
        .map_err(|err| ApiError::validation(err.to_string()))
}

fn check_field(fields: &Map<String, Value>, name: &str, kind: Kind) -> Option<String> {
    match fields.get(name) {
        None | Some(Value::Null) => Some(format!("{name} is a required field")),
        Some(Value::String(text)) if text.is_empty() => Some(format!("{name} is a required field")),
        Some(value) if !kind.matches(value) => {
            Some(format!("{name} must be a `{}` type", kind.type_name()))
        }
        Some(Value::Number(number))
            if matches!(kind, Kind::NonNegative) && number.as_f64().is_some_and(|n| n < 0.0) =>
        {
            Some(format!("{name} must be greater than or equal to 0"))
        }
        Some(_) => None,
    }
}
