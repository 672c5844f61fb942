//! Ranked name-pattern rules that order catalog entries for presentation.
//!
//! A rule matches an entry when the entry's protocol is listed in `types` and
//! any of the `names` regexes finds a match in the entry name
//! (case-insensitive). Entries matching no rule fall to rank 99 (WMTS) or
//! 100 (everything else).

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Protocol};

/// Rank given to unmatched WMTS entries.
pub const DEFAULT_WMTS_RANK: u32 = 99;
/// Rank given to all other unmatched entries.
pub const DEFAULT_RANK: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortRule {
    pub rank: u32,
    pub names: Vec<String>,
    pub types: Vec<Protocol>,
}

#[derive(Debug, Deserialize)]
pub struct SortRulesFile {
    pub rules: Vec<SortRule>,
}

fn rule(rank: u32, names: &[&str], types: &[Protocol]) -> SortRule {
    SortRule {
        rank,
        names: names.iter().map(|n| (*n).to_owned()).collect(),
        types: types.to_vec(),
    }
}

/// The built-in table: background maps first, then aerial imagery, then the
/// topographic and elevation series.
#[must_use]
pub fn default_sort_rules() -> Vec<SortRule> {
    use Protocol::{Wms, Wmts};
    vec![
        rule(0, &["^standaard$", "^grijs$", "^pastel$", "^water$"], &[Wmts]),
        rule(
            5,
            &["^actueel_ortho25$", "^actueel_orthohr$", "^actueel_ortho25ir$"],
            &[Wmts],
        ),
        rule(10, &["^top+"], &[Wmts]),
        rule(20, &["opentopo+"], &[Wmts]),
        rule(30, &["^ahn", "dtm", "dsm"], &[Wmts, Wms]),
        rule(40, &["^bgt", "^brk", "kadastralekaart"], &[Wmts, Wms]),
        rule(50, &["^cbs_", "^wijkenbuurten"], &[Wms]),
    ]
}

/// Load and validate a sort-rule table from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_sort_rules(path: &Path) -> Result<Vec<SortRule>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SortRulesIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: SortRulesFile = serde_yaml::from_str(&content)?;
    validate_sort_rules(&file.rules)?;

    Ok(file.rules)
}

fn validate_sort_rules(rules: &[SortRule]) -> Result<(), ConfigError> {
    let mut seen_ranks = HashSet::new();

    for rule in rules {
        if rule.rank >= DEFAULT_WMTS_RANK {
            return Err(ConfigError::Validation(format!(
                "rank {} collides with the fallback ranks; use a rank below {DEFAULT_WMTS_RANK}",
                rule.rank
            )));
        }
        if !seen_ranks.insert(rule.rank) {
            return Err(ConfigError::Validation(format!(
                "duplicate rank {}",
                rule.rank
            )));
        }
        if rule.names.is_empty() || rule.names.iter().any(|n| n.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "rule with rank {} needs at least one non-empty name pattern",
                rule.rank
            )));
        }
        if rule.types.is_empty() {
            return Err(ConfigError::Validation(format!(
                "rule with rank {} needs at least one service type",
                rule.rank
            )));
        }
    }

    Ok(())
}
