//! The harvest pipeline: catalog query, service resolution, capabilities
//! fetch, flattening, optional ordering, and the catalog file.
//!
//! Catalog queries run one protocol at a time. Resolution and capabilities
//! fetching are the two concurrent phases, each bounded by
//! `fan_out_workers` and each awaited as a whole batch before the next
//! stage starts.

mod summary;

use std::path::PathBuf;

use anyhow::Context;
use pdok_catalog::{
    flatten_services, join_and_dedup, sort_entries, write_catalog, SortTable, WriteOptions,
};
use pdok_core::{default_sort_rules, load_sort_rules, AppConfig, CatalogRecordRef, Protocol};
use pdok_harvest::{fan_out, CapabilitiesFetcher, CswClient};

pub(crate) use summary::HarvestSummary;

#[derive(Debug, Clone)]
pub(crate) struct SpiderOptions {
    pub output: PathBuf,
    /// Per-protocol record limit, `0` for all.
    pub max_records: usize,
    /// Single-record mode: skips the per-protocol catalog query.
    pub md_id: Option<String>,
    pub protocols: Vec<Protocol>,
    pub sort: bool,
    pub sort_rules: Option<PathBuf>,
    pub write: WriteOptions,
}

/// Runs the whole pipeline and writes the catalog file.
///
/// Individual services that cannot be resolved or harvested are logged and
/// counted in the returned summary; they never fail the run.
///
/// # Errors
///
/// Fails on an unreadable or invalid sort-rule file, an HTTP client that
/// cannot be built, or an output file that cannot be written.
pub(crate) async fn run_spider(
    config: &AppConfig,
    options: &SpiderOptions,
) -> anyhow::Result<HarvestSummary> {
    let sort_table = if options.sort {
        Some(build_sort_table(options)?)
    } else {
        None
    };

    let csw = CswClient::from_config(config).context("failed to build catalog client")?;
    let fetcher = CapabilitiesFetcher::new(config.http_timeout_secs, &config.user_agent)
        .context("failed to build capabilities client")?;
    let workers = config.fan_out_workers.max(1);

    let records = collect_records(&csw, config, options).await;
    tracing::info!(records = records.len(), "catalog records collected");

    let resolved = fan_out(&records, workers, |record| csw.resolve_service(record)).await;
    let services = join_and_dedup(&records, resolved);
    tracing::info!(services = services.len(), "services to harvest");

    let results = fan_out(&services, workers, |service| fetcher.fetch(service)).await;

    let mut harvested = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(capabilities) => harvested.push(capabilities),
            Err(failure) => failures.push(failure),
        }
    }

    let mut entries = flatten_services(&harvested);
    if let Some(table) = &sort_table {
        entries = sort_entries(entries, table);
    }

    write_catalog(&options.output, &entries, options.write)
        .with_context(|| format!("failed to write catalog to {}", options.output.display()))?;

    let summary = HarvestSummary::new(harvested.len(), entries.len(), &failures);
    summary.log();
    Ok(summary)
}

fn build_sort_table(options: &SpiderOptions) -> anyhow::Result<SortTable> {
    let rules = match &options.sort_rules {
        Some(path) => load_sort_rules(path)
            .with_context(|| format!("invalid sort rules in {}", path.display()))?,
        None => default_sort_rules(),
    };
    Ok(SortTable::compile(&rules)?)
}

/// Catalog records to harvest. A failed query for one protocol is logged and
/// leaves the other protocols unaffected.
async fn collect_records(
    csw: &CswClient,
    config: &AppConfig,
    options: &SpiderOptions,
) -> Vec<CatalogRecordRef> {
    if let Some(md_id) = &options.md_id {
        return vec![CatalogRecordRef {
            md_id: md_id.clone(),
            protocol: None,
        }];
    }

    let mut records = Vec::new();
    for &protocol in &options.protocols {
        match csw
            .query_records(&config.owner, protocol, options.max_records)
            .await
        {
            Ok(found) => {
                tracing::info!(%protocol, count = found.len(), "queried catalog");
                records.extend(found);
            }
            Err(e) => {
                tracing::error!(%protocol, error = %e, "catalog query failed; continuing without this protocol");
            }
        }
    }
    records
}

#[cfg(test)]
#[path = "spider_test.rs"]
mod tests;
