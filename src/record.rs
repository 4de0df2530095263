//! Canonical record and batch types.
//!
//! A record serializes as `{"recordId": ..., "data": {...}}`, the shape used on
//! both sides of the wire.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Field mapping of a record. Keeps the order fields appeared in the inbound JSON.
pub type Fields = Map<String, JsonValue>;

/// Id given to records that arrive without one.
pub const PLACEHOLDER_RECORD_ID: &str = "1";

/// One unit of input/output data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(
        rename = "recordId",
        alias = "RecordId",
        default = "placeholder_id",
        deserialize_with = "lenient_id"
    )]
    pub id: String,

    #[serde(rename = "data", alias = "Data", default, deserialize_with = "lenient_fields")]
    pub fields: Fields,
}

impl Record {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Record with the placeholder id.
    pub fn anonymous(fields: Fields) -> Self {
        Self::new(PLACEHOLDER_RECORD_ID, fields)
    }
}

/// Ordered collection of records processed in one invocation.
///
/// Serializes as the `{"values": [...]}` envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    #[serde(rename = "values")]
    pub records: Vec<Record>,
}

impl Batch {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record ids in batch order.
    pub fn ids(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.id.as_str()).collect()
    }
}

impl From<Vec<Record>> for Batch {
    fn from(records: Vec<Record>) -> Self {
        Self::new(records)
    }
}

fn placeholder_id() -> String {
    PLACEHOLDER_RECORD_ID.to_string()
}

/// Render a record id from any JSON scalar; null means "absent".
pub(crate) fn id_from_json(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = JsonValue::deserialize(deserializer)?;
    Ok(id_from_json(&value).unwrap_or_else(placeholder_id))
}

/// Anything but an object reads as no fields.
fn lenient_fields<'de, D>(deserializer: D) -> Result<Fields, D::Error>
where
    D: Deserializer<'de>,
{
    match JsonValue::deserialize(deserializer)? {
        JsonValue::Object(fields) => Ok(fields),
        JsonValue::Null => Ok(Fields::new()),
        other => {
            tracing::debug!(kind = json_kind(&other), "Record data is not an object, using no fields");
            Ok(Fields::new())
        }
    }
}

pub(crate) fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_serializes_wire_names() {
        let mut fields = Fields::new();
        fields.insert("priority".to_string(), json!(3));
        let record = Record::new("7", fields);

        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value, json!({"recordId": "7", "data": {"priority": 3}}));
    }

    #[test]
    fn test_record_missing_id_gets_placeholder() {
        let record: Record = serde_json::from_value(json!({"data": {"a": 1}})).unwrap();

        assert_eq!(record.id, PLACEHOLDER_RECORD_ID);
        assert_eq!(record.fields.get("a"), Some(&json!(1)));
    }

    #[test]
    fn test_record_numeric_id_is_stringified() {
        let record: Record = serde_json::from_value(json!({"recordId": 42})).unwrap();

        assert_eq!(record.id, "42");
        assert!(record.fields.is_empty());
    }

    #[test]
    fn test_record_null_data_is_empty() {
        let record: Record =
            serde_json::from_value(json!({"RecordId": "a", "Data": null})).unwrap();

        assert_eq!(record.id, "a");
        assert!(record.fields.is_empty());
    }

    #[test]
    fn test_record_non_object_data_is_empty() {
        let text: Record =
            serde_json::from_value(json!({"recordId": "b", "data": "oops"})).unwrap();
        let list: Record =
            serde_json::from_value(json!({"recordId": "c", "data": [1, 2]})).unwrap();

        assert_eq!(text.id, "b");
        assert!(text.fields.is_empty());
        assert_eq!(list.id, "c");
        assert!(list.fields.is_empty());
    }

    #[test]
    fn test_batch_ids_in_order() {
        let batch = Batch::new(vec![
            Record::new("b", Fields::new()),
            Record::new("a", Fields::new()),
        ]);

        assert_eq!(batch.ids(), vec!["b", "a"]);
        assert_eq!(batch.len(), 2);
    }
}
