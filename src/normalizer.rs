//! Inbound payload normalization.
//!
//! Turns a request body of unknown shape into a canonical [`Batch`]. Two shapes
//! are accepted: the `{"values": [{"recordId", "data"}]}` envelope, and a bare
//! JSON object that becomes a single record.

use serde::Deserialize;
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::record::{id_from_json, json_kind, Batch, Fields, Record, PLACEHOLDER_RECORD_ID};

/// Property that marks the batch envelope.
const ENVELOPE_PROPERTY: &str = "values";

/// Property carrying the record id on a bare object.
const RECORD_ID_PROPERTY: &str = "recordId";

/// Batch-fatal normalization failure.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("request body is not a JSON object: {0}")]
    BodyUnparseable(#[source] serde_json::Error),

    #[error("request body is JSON but not an object (found {0})")]
    NotAnObject(&'static str),
}

/// Shape the request body was recognised as.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Canonical envelope with at least one record.
    Envelope(Vec<Record>),
    /// Bare object treated as a single record.
    Bare(Record),
}

impl Payload {
    pub fn is_envelope(&self) -> bool {
        matches!(self, Payload::Envelope(_))
    }

    pub fn into_batch(self) -> Batch {
        match self {
            Payload::Envelope(records) => Batch::new(records),
            Payload::Bare(record) => Batch::new(vec![record]),
        }
    }
}

#[derive(Debug, Deserialize)]
struct InboundEnvelope {
    // Items are read one by one so a malformed record cannot fail the batch
    #[serde(default, alias = "Values")]
    values: Option<Vec<JsonValue>>,
}

/// Normalize a request body into a batch.
///
/// # Errors
/// [`NormalizeError`] when the body is neither the envelope nor a JSON object.
pub fn normalize(body: &[u8]) -> Result<Batch, NormalizeError> {
    classify_body(body).map(Payload::into_batch)
}

/// Recognise the shape of a request body.
///
/// # Arguments
/// * `body` - Raw request body
///
/// # Returns
/// * `Ok(Payload::Envelope(records))` - envelope with a non-empty `values` array
/// * `Ok(Payload::Bare(record))` - anything else that is a JSON object
/// * `Err(NormalizeError)` - not JSON, or JSON that is not an object
pub fn classify_body(body: &[u8]) -> Result<Payload, NormalizeError> {
    match serde_json::from_slice::<InboundEnvelope>(body) {
        Ok(InboundEnvelope {
            values: Some(items),
        }) if !items.is_empty() => {
            return Ok(Payload::Envelope(items.into_iter().map(record_from_item).collect()))
        }
        Ok(_) => tracing::debug!("Envelope has no records, reading body as a single object"),
        Err(err) => tracing::debug!(error = %err, "Body is not a batch envelope, reading as a single object"),
    }

    let value: JsonValue = serde_json::from_slice(body).map_err(NormalizeError::BodyUnparseable)?;

    match value {
        JsonValue::Object(object) => Ok(Payload::Bare(record_from_object(object))),
        other => Err(NormalizeError::NotAnObject(json_kind(&other))),
    }
}

/// Build one envelope record; anything unreadable keeps its slot with no fields.
fn record_from_item(item: JsonValue) -> Record {
    if !item.is_object() {
        tracing::debug!(kind = json_kind(&item), "Envelope item is not an object, keeping it without fields");
        return Record::anonymous(Fields::new());
    }

    serde_json::from_value::<Record>(item).unwrap_or_else(|err| {
        tracing::debug!(error = %err, "Envelope item is not a record, keeping it without fields");
        Record::anonymous(Fields::new())
    })
}

/// Build one record from a bare object.
///
/// Copies properties in document order and stops at the first property named
/// `values` (any case): that property and everything after it are left out.
fn record_from_object(object: Fields) -> Record {
    let id = object
        .get(RECORD_ID_PROPERTY)
        .and_then(id_from_json)
        .unwrap_or_else(|| PLACEHOLDER_RECORD_ID.to_string());

    let mut fields = Fields::new();
    for (name, value) in object {
        if name.eq_ignore_ascii_case(ENVELOPE_PROPERTY) {
            tracing::debug!(property = %name, "Stopped copying bare object fields at envelope property");
            break;
        }
        fields.insert(name, value);
    }

    Record::new(id, fields)
}
