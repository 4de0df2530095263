//! Priority resolution strategies.
//!
//! Two ways of turning a path into a priority:
//!
//! - [`SubstringMatch`]: case-insensitive substring match against the rule set,
//!   longest key first.
//! - [`SegmentDecoder`]: finds an anchor folder in the path and decodes the
//!   priority digit embedded in the folder that follows it.
//!
//! [`Resolver`] is the policy a deployment picks between them. Resolution never
//! fails; every failure mode degrades to a fallback priority.

use std::fmt;
use std::str::FromStr;

use percent_encoding::percent_decode_str;
use thiserror::Error;
use url::Url;

use crate::rules::{fold_key, Priority, RuleSet};

/// Priority used by [`SegmentDecoder`] when the path cannot be decoded.
pub const SEGMENT_FALLBACK_PRIORITY: Priority = 999;

/// Default anchor folder for segment decoding.
pub const DEFAULT_ANCHOR: &str = "4142_Guides";

/// Default prefix expected on the folder following the anchor.
pub const DEFAULT_SEGMENT_PREFIX: &str = "4142";

/// Base used to resolve paths that carry no URI scheme.
const RELATIVE_BASE: &str = "file:///";

/// Trait for priority resolution policies.
pub trait ResolutionStrategy: Send + Sync {
    /// Resolve a non-blank path to a priority.
    fn resolve(&self, path: &str, rules: &RuleSet) -> Priority;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Longest-key-first substring matching.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringMatch;

impl SubstringMatch {
    /// Find the most specific rule contained in `path`.
    ///
    /// # Returns
    /// `Some((key, priority))` for the longest matching key, `None` if no key matches
    pub fn find<'r>(&self, path: &str, rules: &'r RuleSet) -> Option<(&'r str, Priority)> {
        let haystack = fold_key(path);
        rules
            .by_specificity()
            .iter()
            .find(|(key, _)| haystack.contains(key.as_str()))
            .map(|(key, priority)| (key.as_str(), *priority))
    }
}

impl ResolutionStrategy for SubstringMatch {
    fn resolve(&self, path: &str, rules: &RuleSet) -> Priority {
        if path.trim().is_empty() {
            return rules.default_priority();
        }

        match self.find(path, rules) {
            Some((key, priority)) => {
                tracing::debug!(path, rule = key, priority, "Matched folder rule");
                priority
            }
            None => {
                tracing::debug!(path, "No folder rule matched");
                rules.default_priority()
            }
        }
    }

    fn name(&self) -> &'static str {
        "substring"
    }
}

/// Why segment decoding did not produce a priority.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SegmentMiss {
    #[error("path is not a valid URI: {0}")]
    InvalidUri(String),

    #[error("URI has no hierarchical path")]
    NoPath,

    #[error("anchor segment '{0}' not found")]
    AnchorMissing(String),

    #[error("no segment follows anchor '{0}'")]
    NoFollowingSegment(String),

    #[error("segment '{segment}' does not start with '{prefix}' followed by a character")]
    PrefixMismatch { segment: String, prefix: String },

    #[error("character '{0}' after the prefix is not a digit")]
    NotADigit(char),
}

/// Decodes priority from the folder that follows a fixed anchor folder.
///
/// For anchor `4142_Guides` and prefix `4142`, the path
/// `/docs/4142_Guides/41421_Subfolder/file.pdf` decodes to `1 + 1 = 2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentDecoder {
    anchor: String,
    prefix: String,
    fallback: Priority,
}

impl SegmentDecoder {
    pub fn new(anchor: impl Into<String>, prefix: impl Into<String>, fallback: Priority) -> Self {
        Self {
            anchor: anchor.into(),
            prefix: prefix.into(),
            fallback,
        }
    }

    pub fn anchor(&self) -> &str {
        &self.anchor
    }

    pub fn fallback(&self) -> Priority {
        self.fallback
    }

    /// Decode the priority from a path.
    ///
    /// # Errors
    /// A [`SegmentMiss`] naming the step that failed.
    pub fn decode(&self, path: &str) -> Result<Priority, SegmentMiss> {
        let segments = path_segments(path)?;

        let anchor_at = segments
            .iter()
            .position(|s| s.to_lowercase() == self.anchor.to_lowercase())
            .ok_or_else(|| SegmentMiss::AnchorMissing(self.anchor.clone()))?;

        let following = segments
            .get(anchor_at + 1)
            .ok_or_else(|| SegmentMiss::NoFollowingSegment(self.anchor.clone()))?;

        let marker = following
            .strip_prefix(self.prefix.as_str())
            .and_then(|rest| rest.chars().next())
            .ok_or_else(|| SegmentMiss::PrefixMismatch {
                segment: following.clone(),
                prefix: self.prefix.clone(),
            })?;

        let digit = marker.to_digit(10).ok_or(SegmentMiss::NotADigit(marker))?;

        Ok(digit as Priority + 1)
    }
}

impl Default for SegmentDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_ANCHOR, DEFAULT_SEGMENT_PREFIX, SEGMENT_FALLBACK_PRIORITY)
    }
}

impl ResolutionStrategy for SegmentDecoder {
    fn resolve(&self, path: &str, _rules: &RuleSet) -> Priority {
        match self.decode(path) {
            Ok(priority) => {
                tracing::debug!(path, priority, "Decoded priority from path segment");
                priority
            }
            Err(miss) => {
                tracing::debug!(path, reason = %miss, fallback = self.fallback, "Segment decoding failed");
                self.fallback
            }
        }
    }

    fn name(&self) -> &'static str {
        "segment"
    }
}

/// Split a path or URI into non-empty, percent-decoded segments.
fn path_segments(path: &str) -> Result<Vec<String>, SegmentMiss> {
    let trimmed = path.trim();
    let url = match Url::parse(trimmed) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(RELATIVE_BASE)
            .and_then(|base| base.join(trimmed))
            .map_err(|e| SegmentMiss::InvalidUri(e.to_string()))?,
        Err(e) => return Err(SegmentMiss::InvalidUri(e.to_string())),
    };

    let segments = url.path_segments().ok_or(SegmentMiss::NoPath)?;

    Ok(segments
        .filter(|s| !s.is_empty())
        .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
        .collect())
}

/// Which strategy a deployment resolves with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyKind {
    /// Substring match against the rule set.
    #[default]
    Substring,
    /// Anchor/prefix segment decoding.
    Segment,
    /// Segment decoding when the path has the structured shape, substring otherwise.
    Auto,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Substring => "substring",
            StrategyKind::Segment => "segment",
            StrategyKind::Auto => "auto",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown resolution strategy '{0}' (expected substring, segment or auto)")]
pub struct UnknownStrategy(pub String);

impl FromStr for StrategyKind {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "substring" | "a" => Ok(StrategyKind::Substring),
            "segment" | "b" => Ok(StrategyKind::Segment),
            "auto" => Ok(StrategyKind::Auto),
            _ => Err(UnknownStrategy(s.to_string())),
        }
    }
}

/// The configured resolution policy.
#[derive(Debug, Clone)]
pub enum Resolver {
    Substring(SubstringMatch),
    Segment(SegmentDecoder),
    Auto {
        substring: SubstringMatch,
        segment: SegmentDecoder,
    },
}

impl Resolver {
    pub fn new(kind: StrategyKind, segment: SegmentDecoder) -> Self {
        match kind {
            StrategyKind::Substring => Resolver::Substring(SubstringMatch),
            StrategyKind::Segment => Resolver::Segment(segment),
            StrategyKind::Auto => Resolver::Auto {
                substring: SubstringMatch,
                segment,
            },
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Resolver::Substring(_) => StrategyKind::Substring,
            Resolver::Segment(_) => StrategyKind::Segment,
            Resolver::Auto { .. } => StrategyKind::Auto,
        }
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Resolver::Substring(SubstringMatch)
    }
}

impl ResolutionStrategy for Resolver {
    fn resolve(&self, path: &str, rules: &RuleSet) -> Priority {
        match self {
            Resolver::Substring(strategy) => strategy.resolve(path, rules),
            Resolver::Segment(strategy) => strategy.resolve(path, rules),
            Resolver::Auto { substring, segment } => match segment.decode(path) {
                Ok(priority) => priority,
                Err(_) => substring.resolve(path, rules),
            },
        }
    }

    fn name(&self) -> &'static str {
        self.kind().as_str()
    }
}
