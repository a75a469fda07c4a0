//! Keyword rule compiler (`data/keywords.json`).
//!
//! File shape:
//! ```json
//! { "groups": [ { "name": "money",
//!                 "keywords": [ { "pattern": "\\$", "threadID": "MONEY_THREAD_ID", "priority": 1 } ] } ] }
//! ```
//! `threadID` is a symbolic key; the concrete thread identifier comes from
//! the environment (see `AppConfig::rule_destinations`). A TOML file with the same shape is accepted too.
//!
//! Loading is all-or-nothing: one bad pattern or unknown key rejects the file.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::Deserialize;

use crate::error::RuleError;

const THREAD_ID_SUFFIX: &str = "_THREAD_ID";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RuleSpec {
    #[serde(default)]
    pub groups: Vec<RuleGroup>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuleGroup {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<RawKeyword>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawKeyword {
    pub pattern: String,
    #[serde(rename = "threadID")]
    pub thread_id: String,
    #[serde(default)]
    pub priority: i32,
}

impl RuleSpec {
    /// Every destination key the file refers to, in declaration order.
    pub fn destination_keys(&self) -> impl Iterator<Item = &str> {
        self.groups
            .iter()
            .flat_map(|g| g.keywords.iter().map(|k| k.thread_id.as_str()))
    }
}

/// A compiled, immutable routing rule.
#[derive(Debug, Clone)]
pub struct RoutingRule {
    pub pattern: Regex,
    pub destination: String,
    pub priority: i32,
}

/// Read and decode a rule file. `.toml` selects TOML, anything else JSON.
pub fn load_rule_spec(path: &Path) -> Result<RuleSpec, RuleError> {
    let content = fs::read_to_string(path).map_err(|source| RuleError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let is_toml = path
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    if is_toml {
        Ok(toml::from_str(&content)?)
    } else {
        Ok(serde_json::from_str(&content)?)
    }
}

/// Compile every keyword into a case-insensitive matcher and resolve its
/// destination key. Output is sorted by priority, declaration order on ties.
pub fn compile_rules(
    spec: &RuleSpec,
    destinations: &HashMap<String, String>,
) -> Result<Vec<RoutingRule>, RuleError> {
    let mut rules = Vec::new();
    for group in &spec.groups {
        for raw in &group.keywords {
            let pattern = RegexBuilder::new(&raw.pattern)
                .case_insensitive(true)
                .build()
                .map_err(|source| RuleError::Pattern {
                    group: group.name.clone(),
                    pattern: raw.pattern.clone(),
                    source,
                })?;
            let destination = destinations.get(&raw.thread_id).cloned().ok_or_else(|| {
                RuleError::UnknownDestination {
                    group: group.name.clone(),
                    key: raw.thread_id.clone(),
                }
            })?;
            rules.push(RoutingRule {
                pattern,
                destination,
                priority: raw.priority,
            });
        }
    }

    // sort_by_key is stable
    rules.sort_by_key(|r| r.priority);
    Ok(rules)
}

/// Collect every `*_THREAD_ID` pair from the given variables. Empty values
/// count as unset.
pub fn destinations_from_vars<I>(vars: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = (String, String)>,
{
    vars.into_iter()
        .filter(|(k, v)| k.ends_with(THREAD_ID_SUFFIX) && !v.trim().is_empty())
        .map(|(k, v)| (k, v.trim().to_string()))
        .collect()
}
