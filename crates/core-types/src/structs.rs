use crate::error::CoreError;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// The integer identifier used by every relation of the store
/// (`OrderCustomizationID`, `OrderID`, `IngredientID`, `CategoryID`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(i64);

impl RecordId {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> i64 {
        self.0
    }

    /// Parses a path segment into an identifier for the named field.
    pub fn parse_field(field: &str, raw: &str) -> Result<Self, CoreError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CoreError::MissingField(field.to_string()));
        }
        trimmed
            .parse::<i64>()
            .map(Self)
            .map_err(|_| CoreError::InvalidInput(field.to_string(), format!("'{}' is not an integer", raw)))
    }

    /// Reads an identifier out of a JSON value. Integers and strings holding an
    /// integer are accepted; `null` counts as absent.
    pub fn from_json(field: &str, value: Option<&Value>) -> Result<Self, CoreError> {
        match value {
            None | Some(Value::Null) => Err(CoreError::MissingField(field.to_string())),
            Some(Value::Number(n)) => n.as_i64().map(Self).ok_or_else(|| {
                CoreError::InvalidInput(field.to_string(), format!("{} is not an integer", n))
            }),
            Some(Value::String(s)) => Self::parse_field(field, s),
            Some(other) => Err(CoreError::InvalidInput(
                field.to_string(),
                format!("expected an integer, got {}", json_type_name(other)),
            )),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The `CategoryID` path segment of the ingredient lookup.
///
/// An integer segment binds as an integer. Anything else is kept verbatim and
/// bound as text, so the store matches no category and the lookup is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryKey {
    Id(RecordId),
    Raw(String),
}

impl CategoryKey {
    pub const FIELD: &'static str = "CategoryID";

    /// Never fails: non-integer segments become [`CategoryKey::Raw`].
    pub fn lenient(raw: &str) -> Self {
        match RecordId::parse_field(Self::FIELD, raw) {
            Ok(id) => Self::Id(id),
            Err(_) => Self::Raw(raw.to_string()),
        }
    }

    /// Rejects anything that is not an integer.
    pub fn strict(raw: &str) -> Result<Self, CoreError> {
        RecordId::parse_field(Self::FIELD, raw).map(Self::Id)
    }
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{}", id),
            Self::Raw(raw) => write!(f, "{:?}", raw),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// The body of `POST /ordercustomizations` and `PUT /ordercustomizations/:id`
/// as it arrives on the wire, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomizationPayload {
    #[serde(rename = "OrderID", default)]
    pub order_id: Option<Value>,
    #[serde(rename = "IngredientID", default)]
    pub ingredient_id: Option<Value>,
}

impl CustomizationPayload {
    /// Checks presence and type of both identifiers.
    pub fn validate(&self) -> Result<CustomizationDraft, CoreError> {
        Ok(CustomizationDraft {
            order_id: RecordId::from_json("OrderID", self.order_id.as_ref())?,
            ingredient_id: RecordId::from_json("IngredientID", self.ingredient_id.as_ref())?,
        })
    }
}

/// A validated customization, ready to be bound to an INSERT or UPDATE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomizationDraft {
    pub order_id: RecordId,
    pub ingredient_id: RecordId,
}
