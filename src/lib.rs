//! # folder-priority: Rule-Based Document Priority Classifier
//!
//! Assigns a numeric priority to each record of a search-indexing batch by
//! matching the document's storage path against configurable folder rules.
//! Every record of a readable batch gets a priority; only a body that cannot be
//! read as any batch is rejected.
//!
//! ## Pipeline
//!
//! - **Rules** (`rules`): `Guides:1;Manuals:5` → case-folded rule set + default priority
//! - **Normalizer** (`normalizer`): envelope or bare object → [`Batch`]
//! - **Extraction** (`extraction`): known path fields, then a `/` scan
//! - **Resolver** (`resolver`): longest-key substring match, or anchor/segment decoding
//!
//! ## Example
//!
//! ```
//! use folder_priority::{classify, PriorityConfig};
//!
//! let config = PriorityConfig::default()
//!     .with_rules("Guides:1;Manuals:5")
//!     .with_default_priority(9999);
//!
//! let batch = classify(&config, br#"{"recordId":"42","storagePath":"/a/Manuals/x"}"#).unwrap();
//! assert_eq!(batch.records[0].id, "42");
//! assert_eq!(batch.records[0].fields["priority"], 5);
//! ```

// Core modules
pub mod rules;
pub mod record;
pub mod normalizer;
pub mod extraction;
pub mod resolver;

// Invocation wiring
pub mod config;
pub mod processor;

// HTTP surface
pub mod api;

// Re-export key types
pub use rules::{parse_default_priority, parse_rules, Priority, RuleSet, UNRANKED_PRIORITY};
pub use record::{Batch, Fields, Record, PLACEHOLDER_RECORD_ID};
pub use normalizer::{classify_body, normalize, NormalizeError, Payload};
pub use extraction::{KnownFields, LayeredExtractor, PathExtractor, SeparatorScan, KNOWN_PATH_FIELDS};
pub use resolver::{
    ResolutionStrategy, Resolver, SegmentDecoder, SegmentMiss, StrategyKind, SubstringMatch,
    SEGMENT_FALLBACK_PRIORITY,
};
pub use config::{OutputContract, PriorityConfig};
pub use processor::{classify, PriorityProcessor};
