//! Storage path extraction from record fields.
//!
//! The field that holds a document's path is not fixed across indexers, so
//! extraction is layered: a list of well-known field names first, then a scan
//! for any value that looks like a path.

use serde_json::Value as JsonValue;

use crate::record::Fields;

/// Field names checked for a storage path, most specific first.
pub const KNOWN_PATH_FIELDS: [&str; 6] = [
    "storagePath",
    "metadata_storage_path",
    "path",
    "blobUri",
    "blobUriOriginal",
    "data",
];

/// Trait for locating a storage path in a record's fields.
///
/// Implement this trait to add a new way of finding the path. Implementations
/// must not fail: return `None` when nothing qualifies.
pub trait PathExtractor: Send + Sync {
    /// Extract a path string from the fields, if one can be found.
    fn extract(&self, fields: &Fields) -> Option<String>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}

/// Looks up a fixed list of field names, in order, by exact key.
#[derive(Debug, Clone)]
pub struct KnownFields {
    names: Vec<String>,
}

impl KnownFields {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl Default for KnownFields {
    fn default() -> Self {
        Self::new(KNOWN_PATH_FIELDS)
    }
}

impl PathExtractor for KnownFields {
    fn extract(&self, fields: &Fields) -> Option<String> {
        self.names
            .iter()
            .filter_map(|name| fields.get(name))
            .find(|value| !value.is_null())
            .map(value_to_string)
    }

    fn name(&self) -> &str {
        "known_fields"
    }
}

/// Returns the first value whose string form contains the separator.
///
/// "First" follows the field mapping's iteration order, which is the order
/// fields appeared in the inbound JSON. When several fields qualify, which
/// one wins is an accident of the payload's layout.
#[derive(Debug, Clone)]
pub struct SeparatorScan {
    separator: char,
}

impl SeparatorScan {
    pub fn new(separator: char) -> Self {
        Self { separator }
    }
}

impl Default for SeparatorScan {
    fn default() -> Self {
        Self::new('/')
    }
}

impl PathExtractor for SeparatorScan {
    fn extract(&self, fields: &Fields) -> Option<String> {
        fields
            .values()
            .filter(|value| !value.is_null())
            .map(value_to_string)
            .find(|candidate| candidate.contains(self.separator))
    }

    fn name(&self) -> &str {
        "separator_scan"
    }
}

/// Tries each extractor in turn and returns the first hit.
pub struct LayeredExtractor {
    layers: Vec<Box<dyn PathExtractor>>,
}

impl LayeredExtractor {
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Append an extractor; it is tried after all previously added ones.
    pub fn with_layer(mut self, layer: Box<dyn PathExtractor>) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.name()).collect()
    }
}

impl Default for LayeredExtractor {
    /// Known field names, then the `/` scan.
    fn default() -> Self {
        Self::new()
            .with_layer(Box::new(KnownFields::default()))
            .with_layer(Box::new(SeparatorScan::default()))
    }
}

impl PathExtractor for LayeredExtractor {
    fn extract(&self, fields: &Fields) -> Option<String> {
        self.layers.iter().find_map(|layer| {
            let found = layer.extract(fields);
            if found.is_some() {
                tracing::trace!(layer = layer.name(), "Path extracted");
            }
            found
        })
    }

    fn name(&self) -> &str {
        "layered"
    }
}

/// String form of a field value: strings as-is, everything else as compact JSON.
pub fn value_to_string(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
