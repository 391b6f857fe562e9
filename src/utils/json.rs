use bson::{Bson, Document as BsonDocument};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Number, Value};

use crate::errors::{FieldViolation, ServiceError};

/// Converts a JSON object into a `bson::Document`.
///
/// # Errors
/// Returns `ServiceError::Validation` when `val` is not an object or holds values BSON cannot carry.
pub fn json_to_document(val: &Value) -> Result<BsonDocument, ServiceError> {
    let obj = val.as_object().ok_or_else(|| {
        ServiceError::Validation(vec![FieldViolation::new("body", val.clone(), "expected a JSON object")])
    })?;
    BsonDocument::try_from(obj.clone()).map_err(|e| {
        ServiceError::Validation(vec![FieldViolation::new("body", val.clone(), e.to_string())])
    })
}

/// Converts a stored value to its wire form: object ids as hex, dates as ISO-8601 UTC.
#[must_use]
pub fn bson_to_json(val: &Bson) -> Value {
    match val {
        Bson::Null | Bson::Undefined => Value::Null,
        Bson::Boolean(b) => Value::Bool(*b),
        Bson::Int32(i) => Value::from(*i),
        Bson::Int64(i) => Value::from(*i),
        Bson::Double(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
        Bson::String(s) | Bson::Symbol(s) => Value::String(s.clone()),
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => Value::String(date_to_iso(*dt)),
        Bson::Array(items) => Value::Array(items.iter().map(bson_to_json).collect()),
        Bson::Document(d) => document_to_json(d),
        Bson::Decimal128(d) => Value::String(d.to_string()),
        other => Value::String(other.to_string()),
    }
}

#[must_use]
pub fn document_to_json(doc: &BsonDocument) -> Value {
    Value::Object(doc.iter().map(|(k, v)| (k.clone(), bson_to_json(v))).collect::<Map<_, _>>())
}

#[must_use]
pub fn date_to_iso(dt: bson::DateTime) -> String {
    DateTime::<Utc>::from_timestamp_millis(dt.timestamp_millis())
        .map_or_else(|| dt.timestamp_millis().to_string(), |d| d.to_rfc3339_opts(SecondsFormat::Millis, true))
}
