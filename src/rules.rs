//! Folder rule loading.
//!
//! Parses the `key:priority;key:priority` rule grammar into an ordered,
//! case-folded mapping and pairs it with a default priority.

use indexmap::IndexMap;

/// Integer classification attached to every record.
pub type Priority = i32;

/// Sentinel used when a rule's priority or the default priority cannot be parsed.
pub const UNRANKED_PRIORITY: Priority = 9999;

const ENTRY_SEPARATOR: char = ';';
const KEY_SEPARATOR: char = ':';

/// Immutable set of folder rules plus the default priority.
///
/// Keys are stored lowercased. Insertion order is kept only as the
/// tie-break for keys of equal length; matching itself goes by
/// [`RuleSet::by_specificity`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    rules: IndexMap<String, Priority>,
    // match order, fixed at construction
    ordered: Vec<(String, Priority)>,
    default_priority: Priority,
}

impl RuleSet {
    /// Create a rule set from already-parsed rules.
    ///
    /// Keys are case-folded; if two keys fold to the same value the later one wins.
    pub fn new<I, K>(rules: I, default_priority: Priority) -> Self
    where
        I: IntoIterator<Item = (K, Priority)>,
        K: AsRef<str>,
    {
        let mut folded = IndexMap::new();
        for (key, priority) in rules {
            folded.insert(fold_key(key.as_ref()), priority);
        }

        Self::from_parts(folded, default_priority)
    }

    /// Load a rule set from the raw configuration values.
    ///
    /// # Arguments
    /// * `rules_raw` - Rule string (`Guides:1;Manuals:5`), absent when unconfigured
    /// * `default_raw` - Default priority string, absent when unconfigured
    ///
    /// # Returns
    /// A rule set. Never fails: bad input degrades to empty rules and
    /// [`UNRANKED_PRIORITY`].
    pub fn load(rules_raw: Option<&str>, default_raw: Option<&str>) -> Self {
        Self::from_parts(parse_rules(rules_raw), parse_default_priority(default_raw))
    }

    fn from_parts(rules: IndexMap<String, Priority>, default_priority: Priority) -> Self {
        let mut ordered: Vec<(String, Priority)> =
            rules.iter().map(|(k, p)| (k.clone(), *p)).collect();
        // sort_by is stable, so equal lengths keep insertion order
        ordered.sort_by(|(a, _), (b, _)| b.chars().count().cmp(&a.chars().count()));

        Self {
            rules,
            ordered,
            default_priority,
        }
    }

    /// Priority used when no rule applies or no path is available.
    pub fn default_priority(&self) -> Priority {
        self.default_priority
    }

    /// Look up a rule by key, case-insensitively.
    pub fn get(&self, key: &str) -> Option<Priority> {
        self.rules.get(&fold_key(key)).copied()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterate rules in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Priority)> {
        self.rules.iter().map(|(k, p)| (k.as_str(), *p))
    }

    /// Rules ordered most specific first: longest key first, ties kept in
    /// insertion order.
    pub fn by_specificity(&self) -> &[(String, Priority)] {
        &self.ordered
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::from_parts(IndexMap::new(), UNRANKED_PRIORITY)
    }
}

/// Parse a rule string into a case-folded key → priority mapping.
///
/// Entries are separated by `;` and split on their first `:`. Entries with
/// no `:` or an empty key are skipped. Unparseable priorities register the
/// key with [`UNRANKED_PRIORITY`]. Duplicate keys: last occurrence wins.
///
/// # Example
/// ```
/// use folder_priority::rules::parse_rules;
///
/// let rules = parse_rules(Some("Guides:1; Manuals : 5"));
/// assert_eq!(rules.get("guides"), Some(&1));
/// assert_eq!(rules.get("manuals"), Some(&5));
/// ```
pub fn parse_rules(raw: Option<&str>) -> IndexMap<String, Priority> {
    let mut rules = IndexMap::new();

    let raw = match raw.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => {
            tracing::debug!("No folder priority rules configured");
            return rules;
        }
    };

    for entry in raw.split(ENTRY_SEPARATOR) {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }

        let Some((key, priority)) = entry.split_once(KEY_SEPARATOR) else {
            tracing::warn!(entry, "Skipping rule entry without ':' separator");
            continue;
        };

        let key = key.trim();
        if key.is_empty() {
            tracing::warn!(entry, "Skipping rule entry with empty key");
            continue;
        }

        let priority = priority.trim().parse::<Priority>().unwrap_or_else(|_| {
            tracing::warn!(
                key,
                priority = priority.trim(),
                "Rule priority is not an integer, using {}",
                UNRANKED_PRIORITY
            );
            UNRANKED_PRIORITY
        });

        rules.insert(fold_key(key), priority);
    }

    rules
}

/// Parse the default priority, falling back to [`UNRANKED_PRIORITY`].
pub fn parse_default_priority(raw: Option<&str>) -> Priority {
    match raw.map(str::trim) {
        None | Some("") => UNRANKED_PRIORITY,
        Some(value) => value.parse().unwrap_or_else(|_| {
            tracing::warn!(value, "Default priority is not an integer, using {}", UNRANKED_PRIORITY);
            UNRANKED_PRIORITY
        }),
    }
}

pub(crate) fn fold_key(key: &str) -> String {
    key.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn test_parse_rules_case_folds_keys() {
        let rules = parse_rules(Some("Guides:1;Manuals:5"));

        assert_eq!(rules.len(), 2);
        assert_eq!(rules.get("guides"), Some(&1));
        assert_eq!(rules.get("manuals"), Some(&5));
        assert!(rules.get("Guides").is_none());
    }

    #[test]
    fn test_parse_rules_unparseable_priority_keeps_key() {
        let rules = parse_rules(Some("Guides:1;Reports:oops"));

        assert_eq!(rules.get("reports"), Some(&UNRANKED_PRIORITY));
        assert_eq!(rules.get("guides"), Some(&1));
    }

    #[test]
    fn test_parse_rules_drops_empty_entries() {
        let rules = parse_rules(Some(";;Guides:1;;  ;Manuals:5;"));

        assert_eq!(rules.len(), 2);
    }

    #[test]
    fn test_parse_rules_trims_whitespace() {
        let rules = parse_rules(Some("  Guides :  1 ;\tManuals:5\n"));

        assert_eq!(rules.get("guides"), Some(&1));
        assert_eq!(rules.get("manuals"), Some(&5));
    }

    #[test]
    fn test_parse_rules_splits_on_first_colon_only() {
        let rules = parse_rules(Some("Archive:3:7"));

        // "3:7" is not an integer
        assert_eq!(rules.get("archive"), Some(&UNRANKED_PRIORITY));
    }

    #[test]
    fn test_parse_rules_skips_entries_without_colon() {
        let rules = parse_rules(Some("Guides;Manuals:5"));

        assert_eq!(rules.len(), 1);
        assert!(rules.get("guides").is_none());
    }

    #[test]
    fn test_parse_rules_skips_empty_key() {
        let rules = parse_rules(Some(":4;Manuals:5"));

        assert_eq!(rules.len(), 1);
        assert!(rules.get("").is_none());
    }

    #[test]
    fn test_parse_rules_duplicate_key_last_wins() {
        let rules = parse_rules(Some("Guides:1;Manuals:5;GUIDES:3"));

        assert_eq!(rules.len(), 2);
        assert_eq!(rules.get("guides"), Some(&3));
        // keeps the position of the first occurrence
        assert_eq!(rules.get_index(0), Some((&"guides".to_string(), &3)));
    }

    #[test]
    fn test_parse_rules_negative_priority() {
        let rules = parse_rules(Some("Urgent:-1"));

        assert_eq!(rules.get("urgent"), Some(&-1));
    }

    #[traced_test]
    #[test]
    fn test_parse_rules_missing_input_is_quiet() {
        assert!(parse_rules(None).is_empty());
        assert!(parse_rules(Some("   ")).is_empty());

        // loaded on every readiness check, so no warning here
        assert!(!logs_contain("WARN"));
    }

    #[test]
    fn test_parse_default_priority() {
        assert_eq!(parse_default_priority(Some("7")), 7);
        assert_eq!(parse_default_priority(Some(" 42 ")), 42);
        assert_eq!(parse_default_priority(Some("seven")), UNRANKED_PRIORITY);
        assert_eq!(parse_default_priority(Some("")), UNRANKED_PRIORITY);
        assert_eq!(parse_default_priority(None), UNRANKED_PRIORITY);
    }

    #[test]
    fn test_rule_set_load() {
        let rule_set = RuleSet::load(Some("Guides:1"), Some("50"));

        assert_eq!(rule_set.len(), 1);
        assert_eq!(rule_set.default_priority(), 50);
        assert_eq!(rule_set.get("GUIDES"), Some(1));
    }

    #[test]
    fn test_rule_set_new_folds_and_dedupes() {
        let rule_set = RuleSet::new([("Guides", 1), ("guides", 2)], 10);

        assert_eq!(rule_set.len(), 1);
        assert_eq!(rule_set.get("guides"), Some(2));
    }

    #[test]
    fn test_by_specificity_longest_first_stable() {
        let rule_set = RuleSet::new([("ab", 1), ("abcd", 2), ("cd", 3), ("abc", 4)], 0);

        let keys: Vec<&str> = rule_set.by_specificity().iter().map(|(k, _)| k.as_str()).collect();

        assert_eq!(keys, vec!["abcd", "abc", "ab", "cd"]);
    }

    #[test]
    fn test_by_specificity_computed_once_per_rule_set() {
        let rule_set = RuleSet::load(Some("Guides:1;Guides/Internal:0;Manuals:5"), Some("7"));

        let first = rule_set.by_specificity().as_ptr();
        let second = rule_set.by_specificity().as_ptr();

        assert_eq!(first, second);
        assert_eq!(
            rule_set.by_specificity(),
            &[
                ("guides/internal".to_string(), 0),
                ("manuals".to_string(), 5),
                ("guides".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_default_rule_set_is_empty() {
        let rule_set = RuleSet::default();

        assert!(rule_set.is_empty());
        assert_eq!(rule_set.default_priority(), UNRANKED_PRIORITY);
    }
}
