//! Batch classification.
//!
//! Coordinates one invocation:
//! 1. Build the rule set, extractor and resolver from [`PriorityConfig`]
//! 2. Normalize the request body into a [`Batch`]
//! 3. For each record: extract the path, resolve a priority, write it back
//!
//! Records are independent; the processor holds no mutable state and can be
//! shared across threads.

use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::config::{OutputContract, PriorityConfig};
use crate::extraction::PathExtractor;
use crate::normalizer::{normalize, NormalizeError};
use crate::record::{Batch, Fields, Record};
use crate::resolver::{ResolutionStrategy, Resolver};
use crate::rules::{Priority, RuleSet};

/// Assigns a priority to every record of a batch.
pub struct PriorityProcessor {
    rules: RuleSet,
    extractor: Box<dyn PathExtractor>,
    resolver: Resolver,
    output: OutputContract,
}

impl PriorityProcessor {
    /// Create a processor from its parts.
    pub fn new(
        rules: RuleSet,
        extractor: Box<dyn PathExtractor>,
        resolver: Resolver,
        output: OutputContract,
    ) -> Self {
        Self {
            rules,
            extractor,
            resolver,
            output,
        }
    }

    /// Build a processor for one invocation; loads the rule set.
    ///
    /// # Example
    /// ```
    /// use folder_priority::{PriorityConfig, PriorityProcessor};
    ///
    /// let config = PriorityConfig::default().with_rules("Manuals:5");
    /// let processor = PriorityProcessor::from_config(&config);
    /// assert_eq!(processor.resolve_path(Some("/a/Manuals/x")), 5);
    /// ```
    pub fn from_config(config: &PriorityConfig) -> Self {
        Self::new(
            config.rule_set(),
            Box::new(config.extractor()),
            config.resolver(),
            config.output,
        )
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn output(&self) -> OutputContract {
        self.output
    }

    /// Resolve a priority for an optional path.
    ///
    /// Absent or blank paths get the rule set's default priority whatever the
    /// strategy.
    pub fn resolve_path(&self, path: Option<&str>) -> Priority {
        match path {
            Some(path) if !path.trim().is_empty() => self.resolver.resolve(path, &self.rules),
            _ => self.rules.default_priority(),
        }
    }

    /// Compute a record's priority without modifying it.
    pub fn priority_for(&self, record: &Record) -> Priority {
        let path = self.extractor.extract(&record.fields);
        if path.is_none() {
            tracing::debug!(record_id = %record.id, "No path field found, using default priority");
        }
        self.resolve_path(path.as_deref())
    }

    /// Compute and write a record's priority according to the output contract.
    pub fn assign(&self, record: &mut Record) -> Priority {
        let priority = self.priority_for(record);
        let value = JsonValue::from(priority);

        match self.output {
            OutputContract::Merge => {
                record.fields.insert(self.output.key().to_string(), value);
            }
            OutputContract::Replace => {
                let mut fields = Fields::new();
                fields.insert(self.output.key().to_string(), value);
                record.fields = fields;
            }
        }

        priority
    }

    /// Assign priorities to every record, keeping batch order.
    pub fn process(&self, mut batch: Batch) -> Batch {
        for record in &mut batch.records {
            self.assign(record);
        }
        batch
    }

    /// Normalize a request body and classify it.
    ///
    /// # Errors
    /// [`NormalizeError`] when the body cannot be read as any batch; no record
    /// is processed in that case.
    pub fn process_body(&self, body: &[u8]) -> Result<Batch, NormalizeError> {
        let invocation_id = Uuid::new_v4();
        let batch = normalize(body).map_err(|err| {
            tracing::warn!(%invocation_id, error = %err, "Rejected unparseable batch");
            err
        })?;

        if self.rules.is_empty() {
            tracing::warn!(
                %invocation_id,
                "No folder priority rules configured; every record gets the default priority"
            );
        }

        let batch = self.process(batch);

        tracing::info!(
            %invocation_id,
            records = batch.len(),
            rules = self.rules.len(),
            strategy = self.resolver.name(),
            "Classified batch"
        );

        Ok(batch)
    }
}

/// Classify a request body with a freshly loaded configuration.
pub fn classify(config: &PriorityConfig, body: &[u8]) -> Result<Batch, NormalizeError> {
    PriorityProcessor::from_config(config).process_body(body)
}
