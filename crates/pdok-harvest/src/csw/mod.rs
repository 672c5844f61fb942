//! Client for the PDOK metadata catalog (CSW 2.0.2).
//!
//! Discovers service records per owner and protocol, and resolves a record
//! to the `GetCapabilities` URL of the service it describes.

mod response;
mod service_url;

use std::time::Duration;

use pdok_core::{AppConfig, CatalogRecordRef, Protocol, ResolvedService};
use reqwest::{Client, Url};

use crate::error::HarvestError;
use crate::retry::retry_with_backoff;

pub use response::{parse_record_uris, parse_records_page, RecordsPage};
pub use service_url::{capabilities_url, CANONICAL_TILES_URL, TILES_SERVICE_MARKER};

pub(crate) use response::exception_message;

/// Upper bound on result pages per query. Guards against a catalog whose
/// `nextRecord` never reaches zero.
pub(crate) const MAX_PAGES: usize = 1000;

const CSW_RECORD_SCHEMA: &str = "http://www.opengis.net/cat/csw/2.0.2";

/// HTTP client for a CSW catalog endpoint.
///
/// Catalog requests are retried on transient failures (network errors, 429,
/// 5xx) with exponential backoff.
pub struct CswClient {
    client: Client,
    base_url: Url,
    page_size: u32,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl CswClient {
    /// Creates a client for the catalog configured in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Http`] if the `reqwest::Client` cannot be
    /// constructed, or [`HarvestError::InvalidUrl`] for a bad catalog URL.
    pub fn from_config(config: &AppConfig) -> Result<Self, HarvestError> {
        let mut client =
            Self::with_base_url(&config.csw_url, config.http_timeout_secs, &config.user_agent)?;
        client.page_size = config.csw_page_size.max(1);
        client.max_retries = config.csw_max_retries;
        client.backoff_base_secs = config.csw_retry_backoff_base_secs;
        Ok(client)
    }

    /// Creates a client with default paging (50) and no retries, pointed at
    /// `base_url` (a wiremock server in tests).
    ///
    /// # Errors
    ///
    /// Same as [`Self::from_config`].
    pub fn with_base_url(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, HarvestError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        let base_url = Url::parse(base_url.trim()).map_err(|e| HarvestError::InvalidUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            page_size: 50,
            max_retries: 0,
            backoff_base_secs: 0,
        })
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Fetches one page of record identifiers for `owner` + `protocol`,
    /// starting at the 1-based `start_position`.
    ///
    /// # Errors
    ///
    /// - [`HarvestError::Http`] / [`HarvestError::UnexpectedStatus`] after retries.
    /// - [`HarvestError::ServiceException`] if the catalog rejects the query.
    /// - [`HarvestError::Xml`] / [`HarvestError::UnexpectedDocument`] for an
    ///   unreadable response.
    pub async fn get_records_page(
        &self,
        owner: &str,
        protocol: Protocol,
        start_position: u32,
        max_records: u32,
    ) -> Result<RecordsPage, HarvestError> {
        let url = self.get_records_url(owner, protocol, start_position, max_records);
        let body = self.get_text(url).await?;
        parse_records_page(&body, self.base_url.as_str())
    }

    /// Collects every record of `owner` for `protocol`, following
    /// `nextRecord` until the catalog reports no further pages or
    /// `max_results` records were collected (`0` means unbounded).
    ///
    /// # Errors
    ///
    /// Propagates any error from [`Self::get_records_page`], and returns
    /// [`HarvestError::PaginationLimit`] after [`MAX_PAGES`] pages.
    pub async fn query_records(
        &self,
        owner: &str,
        protocol: Protocol,
        max_results: usize,
    ) -> Result<Vec<CatalogRecordRef>, HarvestError> {
        let mut records: Vec<CatalogRecordRef> = Vec::new();
        let mut start_position = 1u32;
        let mut page_count = 0usize;

        loop {
            page_count += 1;
            if page_count > MAX_PAGES {
                return Err(HarvestError::PaginationLimit {
                    protocol: protocol.to_string(),
                    max_pages: MAX_PAGES,
                });
            }

            let page_size = if max_results == 0 {
                self.page_size
            } else {
                let remaining = max_results.saturating_sub(records.len());
                u32::try_from(remaining).map_or(self.page_size, |r| r.min(self.page_size))
            };

            let page = self
                .get_records_page(owner, protocol, start_position, page_size)
                .await?;
            let returned = page.identifiers.len();

            records.extend(page.identifiers.into_iter().map(|md_id| CatalogRecordRef {
                md_id,
                protocol: Some(protocol),
            }));

            tracing::debug!(
                %protocol,
                start_position,
                returned,
                matched = page.matched,
                next_record = page.next_record,
                "fetched catalog page"
            );

            if max_results > 0 && records.len() >= max_results {
                records.truncate(max_results);
                break;
            }
            if page.next_record == 0 || returned == 0 {
                break;
            }
            if page.next_record <= start_position {
                tracing::warn!(
                    %protocol,
                    start_position,
                    next_record = page.next_record,
                    "catalog returned a non-advancing nextRecord; stopping pagination"
                );
                break;
            }
            start_position = page.next_record;
        }

        Ok(records)
    }

    /// Fetches the resource URIs declared in a full metadata record.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::get_records_page`].
    pub async fn get_record_uris(&self, md_id: &str) -> Result<Vec<String>, HarvestError> {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("service", "CSW")
            .append_pair("version", "2.0.2")
            .append_pair("request", "GetRecordById")
            .append_pair("id", md_id)
            .append_pair("elementSetName", "full")
            .append_pair("outputSchema", CSW_RECORD_SCHEMA);
        let body = self.get_text(url).await?;
        parse_record_uris(&body, self.base_url.as_str())
    }

    /// Resolves a record to its service's capabilities URL.
    ///
    /// Never fails: a record without resource URIs, with an unusable URI, or
    /// whose metadata cannot be fetched is logged and returned with an empty
    /// `url`, to be dropped at the join stage.
    pub async fn resolve_service(&self, record: &CatalogRecordRef) -> ResolvedService {
        let uris = match self.get_record_uris(&record.md_id).await {
            Ok(uris) => uris,
            Err(e) => {
                tracing::error!(md_id = %record.md_id, error = %e, "failed to retrieve metadata record");
                return ResolvedService::unresolved(record);
            }
        };

        let Some(first) = uris.first() else {
            tracing::error!(md_id = %record.md_id, "no service url found in metadata record");
            return ResolvedService::unresolved(record);
        };

        match capabilities_url(first, record.protocol) {
            Ok((protocol, url)) => ResolvedService {
                md_id: record.md_id.clone(),
                protocol: Some(protocol),
                url,
            },
            Err(e) => {
                tracing::error!(md_id = %record.md_id, uri = %first, error = %e, "unusable service url in metadata record");
                ResolvedService::unresolved(record)
            }
        }
    }

    fn get_records_url(
        &self,
        owner: &str,
        protocol: Protocol,
        start_position: u32,
        max_records: u32,
    ) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("service", "CSW")
            .append_pair("version", "2.0.2")
            .append_pair("request", "GetRecords")
            .append_pair("typeNames", "csw:Record")
            .append_pair("resultType", "results")
            .append_pair("elementSetName", "brief")
            .append_pair("outputSchema", CSW_RECORD_SCHEMA)
            .append_pair("startPosition", &start_position.to_string())
            .append_pair("maxRecords", &max_records.to_string())
            .append_pair("constraintLanguage", "CQL_TEXT")
            .append_pair("constraint_language_version", "1.1.0")
            .append_pair("constraint", &records_constraint(owner, protocol));
        url
    }

    async fn get_text(&self, url: Url) -> Result<String, HarvestError> {
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.clone();
            async move {
                let response = self.client.get(url.clone()).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(HarvestError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: url.to_string(),
                    });
                }
                Ok(response.text().await?)
            }
        })
        .await
    }
}

/// CQL filter selecting service records of one owner and protocol.
fn records_constraint(owner: &str, protocol: Protocol) -> String {
    let owner = owner.replace('\'', "''");
    format!(
        "type='service' AND OrganisationName='{owner}' AND protocol='{}'",
        protocol.csw_name()
    )
}
