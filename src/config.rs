//! Per-invocation configuration.
//!
//! Everything the classifier reads from its environment is captured once into a
//! [`PriorityConfig`] value at the start of an invocation and passed down from
//! there; nothing below this module touches process-wide state.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::extraction::LayeredExtractor;
use crate::resolver::{
    Resolver, SegmentDecoder, StrategyKind, DEFAULT_ANCHOR, DEFAULT_SEGMENT_PREFIX,
    SEGMENT_FALLBACK_PRIORITY,
};
use crate::rules::{parse_default_priority, Priority, RuleSet};

pub const RULES_VAR: &str = "FOLDER_PRIORITY_RULES";
pub const DEFAULT_PRIORITY_VAR: &str = "FOLDER_PRIORITY_DEFAULT";
pub const STRATEGY_VAR: &str = "FOLDER_PRIORITY_STRATEGY";
pub const ANCHOR_VAR: &str = "FOLDER_PRIORITY_ANCHOR";
pub const SEGMENT_PREFIX_VAR: &str = "FOLDER_PRIORITY_SEGMENT_PREFIX";
pub const SEGMENT_FALLBACK_VAR: &str = "FOLDER_PRIORITY_SEGMENT_FALLBACK";
pub const OUTPUT_VAR: &str = "FOLDER_PRIORITY_OUTPUT";

/// How the computed priority is written back into a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputContract {
    /// Keep the original fields and add `priority`.
    #[default]
    Merge,
    /// Replace the fields with a single `folderPriority`.
    Replace,
}

impl OutputContract {
    /// Field the priority is written under.
    pub fn key(&self) -> &'static str {
        match self {
            OutputContract::Merge => "priority",
            OutputContract::Replace => "folderPriority",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputContract::Merge => "merge",
            OutputContract::Replace => "replace",
        }
    }
}

impl fmt::Display for OutputContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown output contract '{0}' (expected merge or replace)")]
pub struct UnknownOutputContract(pub String);

impl FromStr for OutputContract {
    type Err = UnknownOutputContract;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "merge" | "priority" => Ok(OutputContract::Merge),
            "replace" | "folderpriority" => Ok(OutputContract::Replace),
            _ => Err(UnknownOutputContract(s.to_string())),
        }
    }
}

/// Configuration for one classification invocation.
///
/// Raw rule and default-priority strings are kept as given so that the rule
/// set is built by the loader, with its logging, at invocation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityConfig {
    /// Rule string, `key:priority;key:priority`
    pub rules: Option<String>,

    /// Default priority as configured
    pub default_priority: Option<String>,

    pub strategy: StrategyKind,

    /// Anchor folder for segment decoding
    pub anchor: String,

    /// Prefix expected on the folder after the anchor
    pub segment_prefix: String,

    /// Priority when segment decoding fails
    pub segment_fallback: Priority,

    pub output: OutputContract,
}

impl Default for PriorityConfig {
    fn default() -> Self {
        Self {
            rules: None,
            default_priority: None,
            strategy: StrategyKind::default(),
            anchor: DEFAULT_ANCHOR.to_string(),
            segment_prefix: DEFAULT_SEGMENT_PREFIX.to_string(),
            segment_fallback: SEGMENT_FALLBACK_PRIORITY,
            output: OutputContract::default(),
        }
    }
}

impl PriorityConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through a key → value lookup.
    ///
    /// Unset or invalid values fall back to their defaults; invalid values are
    /// logged.
    ///
    /// # Example
    /// ```
    /// use std::collections::HashMap;
    /// use folder_priority::config::{PriorityConfig, RULES_VAR};
    ///
    /// let vars = HashMap::from([(RULES_VAR, "Guides:1")]);
    /// let config = PriorityConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
    /// assert_eq!(config.rules.as_deref(), Some("Guides:1"));
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let strategy = lookup(STRATEGY_VAR)
            .map(|raw| {
                raw.parse::<StrategyKind>().unwrap_or_else(|err| {
                    tracing::warn!("{}, using {}", err, defaults.strategy);
                    defaults.strategy
                })
            })
            .unwrap_or(defaults.strategy);

        let output = lookup(OUTPUT_VAR)
            .map(|raw| {
                raw.parse::<OutputContract>().unwrap_or_else(|err| {
                    tracing::warn!("{}, using {}", err, defaults.output);
                    defaults.output
                })
            })
            .unwrap_or(defaults.output);

        let segment_fallback = lookup(SEGMENT_FALLBACK_VAR)
            .and_then(|raw| match raw.trim().parse::<Priority>() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(value = %raw, "Segment fallback priority is not an integer, using {}", SEGMENT_FALLBACK_PRIORITY);
                    None
                }
            })
            .unwrap_or(defaults.segment_fallback);

        Self {
            rules: lookup(RULES_VAR),
            default_priority: lookup(DEFAULT_PRIORITY_VAR),
            strategy,
            anchor: non_blank(lookup(ANCHOR_VAR)).unwrap_or(defaults.anchor),
            segment_prefix: non_blank(lookup(SEGMENT_PREFIX_VAR)).unwrap_or(defaults.segment_prefix),
            segment_fallback,
            output,
        }
    }

    pub fn with_rules(mut self, rules: impl Into<String>) -> Self {
        self.rules = Some(rules.into());
        self
    }

    pub fn with_default_priority(mut self, default_priority: Priority) -> Self {
        self.default_priority = Some(default_priority.to_string());
        self
    }

    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_output(mut self, output: OutputContract) -> Self {
        self.output = output;
        self
    }

    /// Build the rule set for this invocation.
    pub fn rule_set(&self) -> RuleSet {
        RuleSet::load(self.rules.as_deref(), self.default_priority.as_deref())
    }

    /// Effective default priority, without building the rules.
    pub fn effective_default_priority(&self) -> Priority {
        parse_default_priority(self.default_priority.as_deref())
    }

    pub fn segment_decoder(&self) -> SegmentDecoder {
        SegmentDecoder::new(&self.anchor, &self.segment_prefix, self.segment_fallback)
    }

    pub fn resolver(&self) -> Resolver {
        Resolver::new(self.strategy, self.segment_decoder())
    }

    pub fn extractor(&self) -> LayeredExtractor {
        LayeredExtractor::default()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
