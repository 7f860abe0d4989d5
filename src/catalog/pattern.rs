use std::collections::HashMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::units::is_canonical;
use super::CatalogError;

/// Recognition rule for one test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternRule {
    pub test_key: String,
    pub display_name: String,
    /// Clinical category used for report grouping ("Hematology", ...).
    pub category: String,
    /// Labels matched case-insensitively. Whitespace inside an alias matches
    /// any whitespace run; dots and slashes tolerate surrounding spaces.
    pub aliases: Vec<String>,
    /// Canonical unit assumed when the text carries none.
    pub expected_unit: Option<String>,
    /// Per-rule override of the adjacency window, in characters.
    #[serde(default)]
    pub window: Option<usize>,
    /// Physiologically plausible `[min, max]`; outside values are warned on.
    #[serde(default)]
    pub plausible_range: Option<(f64, f64)>,
}

/// A rule plus its compiled alias recognizer.
#[derive(Debug)]
pub(crate) struct CompiledRule {
    pub(crate) rule: PatternRule,
    pub(crate) recognizer: Regex,
}

/// Immutable set of pattern rules, keyed by test key.
#[derive(Debug)]
pub struct PatternCatalog {
    rules: Vec<CompiledRule>,
    index: HashMap<String, usize>,
}

impl PatternCatalog {
    /// Validate and compile a rule set. Any malformed entry is a
    /// configuration fault.
    pub fn new(rules: Vec<PatternRule>) -> Result<Self, CatalogError> {
        let mut compiled = Vec::with_capacity(rules.len());
        let mut index = HashMap::with_capacity(rules.len());

        for rule in rules {
            validate_rule(&rule)?;
            if index.contains_key(&rule.test_key) {
                return Err(CatalogError::DuplicateTestKey(rule.test_key));
            }
            let recognizer = compile_aliases(&rule)?;
            index.insert(rule.test_key.clone(), compiled.len());
            compiled.push(CompiledRule { rule, recognizer });
        }

        Ok(Self {
            rules: compiled,
            index,
        })
    }

    /// All rules in declaration order.
    pub fn all_rules(&self) -> impl Iterator<Item = &PatternRule> {
        self.rules.iter().map(|c| &c.rule)
    }

    pub fn rule(&self, test_key: &str) -> Option<&PatternRule> {
        self.index.get(test_key).map(|&i| &self.rules[i].rule)
    }

    pub fn category_of(&self, test_key: &str) -> Option<&str> {
        self.rule(test_key).map(|r| r.category.as_str())
    }

    /// Declaration index of a rule; used as a stable tie-breaker.
    pub fn order_of(&self, test_key: &str) -> Option<usize> {
        self.index.get(test_key).copied()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub(crate) fn compiled(&self) -> &[CompiledRule] {
        &self.rules
    }
}

fn validate_rule(rule: &PatternRule) -> Result<(), CatalogError> {
    let key_ok = !rule.test_key.is_empty()
        && rule
            .test_key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if !key_ok {
        return Err(CatalogError::InvalidTestKey(rule.test_key.clone()));
    }
    if rule.aliases.is_empty() {
        return Err(CatalogError::EmptyAliases(rule.test_key.clone()));
    }
    if rule.aliases.iter().any(|a| a.trim().is_empty()) {
        return Err(CatalogError::BlankAlias(rule.test_key.clone()));
    }
    if rule.category.trim().is_empty() {
        return Err(CatalogError::MissingCategory(rule.test_key.clone()));
    }
    if let Some(unit) = &rule.expected_unit {
        if !is_canonical(unit) {
            return Err(CatalogError::UnknownUnit {
                unit: unit.clone(),
                context: format!("pattern rule '{}'", rule.test_key),
            });
        }
    }
    if let Some((min, max)) = rule.plausible_range {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(CatalogError::InvalidPlausibleRange(rule.test_key.clone()));
        }
    }
    if rule.window == Some(0) {
        return Err(CatalogError::InvalidWindow(rule.test_key.clone()));
    }
    Ok(())
}

/// Build one case-insensitive alternation for every alias of a rule,
/// longest alias first so that "Total Cholesterol" beats "Cholesterol".
fn compile_aliases(rule: &PatternRule) -> Result<Regex, CatalogError> {
    let mut aliases: Vec<&str> = rule.aliases.iter().map(|a| a.trim()).collect();
    aliases.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));

    let alternation = aliases
        .iter()
        .map(|a| alias_pattern(a))
        .collect::<Vec<_>>()
        .join("|");

    Regex::new(&format!("(?i)(?:{alternation})")).map_err(|e| CatalogError::Pattern {
        test_key: rule.test_key.clone(),
        reason: e.to_string(),
    })
}

fn alias_pattern(alias: &str) -> String {
    let mut out = String::new();
    let starts_word = alias.chars().next().is_some_and(|c| c.is_alphanumeric());
    let ends_word = alias.chars().last().is_some_and(|c| c.is_alphanumeric());

    if starts_word {
        out.push_str(r"\b");
    }

    // Whitespace is emitted lazily so that a separator following it can
    // absorb it: "Cholesterol - HDL" also matches "Cholesterol-HDL".
    let mut pending_space = false;
    for ch in alias.chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        let separator = matches!(ch, '.' | '/' | '-');
        if pending_space && !separator && !out.ends_with(r"\s*") {
            out.push_str(r"\s+");
        }
        pending_space = false;
        match ch {
            '.' => out.push_str(r"\.\s*"),
            '/' => out.push_str(r"\s*/\s*"),
            '-' => out.push_str(r"\s*-\s*"),
            _ => out.push_str(&regex::escape(&ch.to_string())),
        }
    }

    if ends_word {
        out.push_str(r"\b");
    }
    out
}
