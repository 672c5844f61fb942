//! Decoding of CSW 2.0.2 `GetRecords` and `GetRecordById` responses.
//!
//! ## Shapes
//!
//! A results page:
//! ```text
//! <csw:GetRecordsResponse>
//!   <csw:SearchResults numberOfRecordsMatched="120" numberOfRecordsReturned="50" nextRecord="51">
//!     <csw:BriefRecord><dc:identifier>…</dc:identifier>…</csw:BriefRecord>
//! ```
//! `nextRecord="0"` marks the last page.
//!
//! A full record carries its resource URIs as `dc:URI` (and sometimes
//! `dct:references`) elements.

use crate::capabilities::common::check_root;
use crate::error::HarvestError;
use crate::xml::{parse_document, XmlElement};

/// One page of catalog search results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordsPage {
    pub identifiers: Vec<String>,
    pub matched: u32,
    /// 1-based position of the next page, `0` when the results are exhausted.
    pub next_record: u32,
}

/// Parses a `GetRecords` response body.
///
/// # Errors
///
/// Returns [`HarvestError::ServiceException`] for an OWS exception report and
/// [`HarvestError::UnexpectedDocument`] for any other unexpected root.
pub fn parse_records_page(xml: &str, context: &str) -> Result<RecordsPage, HarvestError> {
    let root = parse_document(xml, context)?;
    check_root(&root, &["GetRecordsResponse"], context)?;

    let Some(results) = root.child("SearchResults") else {
        return Ok(RecordsPage {
            identifiers: Vec::new(),
            matched: 0,
            next_record: 0,
        });
    };

    let identifiers = results
        .children
        .iter()
        .filter_map(|record| record.child_text("identifier"))
        .map(str::to_owned)
        .collect();

    Ok(RecordsPage {
        identifiers,
        matched: numeric_attr(results, "numberOfRecordsMatched"),
        next_record: numeric_attr(results, "nextRecord"),
    })
}

/// Parses a `GetRecordById` response body into the record's resource URIs,
/// `dc:URI` entries first. An empty response (unknown identifier) yields no
/// URIs.
///
/// # Errors
///
/// Same conditions as [`parse_records_page`].
pub fn parse_record_uris(xml: &str, context: &str) -> Result<Vec<String>, HarvestError> {
    let root = parse_document(xml, context)?;
    check_root(&root, &["GetRecordByIdResponse"], context)?;

    let uris = root
        .descendants_named("URI")
        .into_iter()
        .chain(root.descendants_named("references"))
        .map(XmlElement::text)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect();

    Ok(uris)
}

/// The exception text of an OWS `ExceptionReport` or WMS
/// `ServiceExceptionReport`, `None` for any other document.
pub(crate) fn exception_message(root: &XmlElement) -> Option<String> {
    if root.name != "ExceptionReport" && root.name != "ServiceExceptionReport" {
        return None;
    }
    let texts: Vec<&str> = root
        .descendants_named("ExceptionText")
        .into_iter()
        .chain(root.descendants_named("ServiceException"))
        .map(XmlElement::text)
        .filter(|t| !t.is_empty())
        .collect();
    if texts.is_empty() {
        Some("(no exception text)".to_owned())
    } else {
        Some(texts.join("; "))
    }
}

fn numeric_attr(element: &XmlElement, name: &str) -> u32 {
    element
        .attr(name)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}
