//! Joining resolved services back onto catalog records, and collapsing
//! records that point at the same capabilities URL.

use std::collections::HashMap;

use pdok_core::{CatalogRecordRef, ResolvedService};

/// Inner join of `records` and `resolved` on `md_id`, in record order.
///
/// Fields of the resolved service take precedence over the record's; a
/// record without a resolved counterpart is dropped. When `resolved` holds
/// several services for one `md_id`, the last one wins.
#[must_use]
pub fn join_by_md_id(
    records: &[CatalogRecordRef],
    resolved: Vec<ResolvedService>,
) -> Vec<ResolvedService> {
    let mut by_md_id: HashMap<String, ResolvedService> = HashMap::with_capacity(resolved.len());
    for service in resolved {
        by_md_id.insert(service.md_id.clone(), service);
    }

    records
        .iter()
        .filter_map(|record| {
            let service = by_md_id.get(&record.md_id)?;
            Some(ResolvedService {
                md_id: record.md_id.clone(),
                protocol: service.protocol.or(record.protocol),
                url: service.url.clone(),
            })
        })
        .collect()
}

/// Keeps one service per capabilities URL.
///
/// A URL keeps the position of its first occurrence and the value of its
/// last: PDOK registers some services under several metadata records, and
/// the later record is the one retained.
#[must_use]
pub fn dedup_by_url(services: Vec<ResolvedService>) -> Vec<ResolvedService> {
    let mut index_by_url: HashMap<String, usize> = HashMap::with_capacity(services.len());
    let mut unique: Vec<ResolvedService> = Vec::with_capacity(services.len());

    for service in services {
        if let Some(&index) = index_by_url.get(&service.url) {
            tracing::debug!(
                url = %service.url,
                replaced_md_id = %unique[index].md_id,
                md_id = %service.md_id,
                "duplicate capabilities url; keeping later record"
            );
            unique[index] = service;
        } else {
            index_by_url.insert(service.url.clone(), unique.len());
            unique.push(service);
        }
    }

    unique
}

/// Join, drop services without a URL, then dedup by URL.
#[must_use]
pub fn join_and_dedup(
    records: &[CatalogRecordRef],
    resolved: Vec<ResolvedService>,
) -> Vec<ResolvedService> {
    let joined = join_by_md_id(records, resolved);
    let total = joined.len();

    let with_url: Vec<ResolvedService> = joined
        .into_iter()
        .filter(ResolvedService::has_url)
        .collect();
    let dropped = total - with_url.len();
    if dropped > 0 {
        tracing::warn!(dropped, "dropping catalog records without a service url");
    }

    dedup_by_url(with_url)
}
