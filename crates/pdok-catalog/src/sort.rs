//! Presentation order of catalog entries.
//!
//! Each entry gets the rank of the first rule (lowest rank) whose protocol
//! list contains the entry's protocol and one of whose patterns matches the
//! entry name anywhere, case-insensitively. Entries are then grouped by rank
//! in ascending order; the order inside a rank is the input order.

use pdok_core::sort_rules::{DEFAULT_RANK, DEFAULT_WMTS_RANK};
use pdok_core::{CatalogEntry, Protocol, SortRule};
use regex::{Regex, RegexBuilder};

use crate::error::CatalogError;

struct CompiledRule {
    rank: u32,
    patterns: Vec<Regex>,
    types: Vec<Protocol>,
}

/// A rule table with its name patterns compiled.
pub struct SortTable {
    rules: Vec<CompiledRule>,
}

impl SortTable {
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidPattern`] for the first pattern that
    /// fails to compile.
    pub fn compile(rules: &[SortRule]) -> Result<Self, CatalogError> {
        let mut compiled = rules
            .iter()
            .map(|rule| {
                let patterns = rule
                    .names
                    .iter()
                    .map(|pattern| {
                        RegexBuilder::new(pattern)
                            .case_insensitive(true)
                            .build()
                            .map_err(|source| CatalogError::InvalidPattern {
                                pattern: pattern.clone(),
                                rank: rule.rank,
                                source,
                            })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(CompiledRule {
                    rank: rule.rank,
                    patterns,
                    types: rule.types.clone(),
                })
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;
        compiled.sort_by_key(|rule| rule.rank);
        Ok(Self { rules: compiled })
    }

    /// Rank of a single entry.
    #[must_use]
    pub fn rank(&self, entry: &CatalogEntry) -> u32 {
        let protocol = entry.protocol();
        self.rules
            .iter()
            .find(|rule| {
                rule.types.contains(&protocol)
                    && rule.patterns.iter().any(|p| p.is_match(&entry.name))
            })
            .map_or_else(|| fallback_rank(protocol), |rule| rule.rank)
    }
}

fn fallback_rank(protocol: Protocol) -> u32 {
    if protocol == Protocol::Wmts {
        DEFAULT_WMTS_RANK
    } else {
        DEFAULT_RANK
    }
}

/// Orders `entries` by rank, keeping input order within a rank.
#[must_use]
pub fn sort_entries(entries: Vec<CatalogEntry>, table: &SortTable) -> Vec<CatalogEntry> {
    let mut ranked: Vec<(u32, CatalogEntry)> = entries
        .into_iter()
        .map(|entry| (table.rank(&entry), entry))
        .collect();
    // `sort_by_key` is stable.
    ranked.sort_by_key(|(rank, _)| *rank);
    ranked.into_iter().map(|(_, entry)| entry).collect()
}
