//! Records flowing through the harvest pipeline, from catalog reference to
//! the flattened [`CatalogEntry`] written to disk.
//!
//! Protocol-specific fields live in the [`LayerDetail`] and [`EntryDetail`]
//! variants, so a WFS entry can never carry a `style` and a WMS entry always
//! carries exactly one.

use serde::{Deserialize, Serialize};

use crate::Protocol;

/// One metadata-catalog record that points at a candidate service.
///
/// `protocol` is `None` in single-identifier mode, where the catalog was not
/// queried per protocol and the protocol is inferred during resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRecordRef {
    pub md_id: String,
    pub protocol: Option<Protocol>,
}

/// A catalog record resolved to its `GetCapabilities` URL.
///
/// `url` is empty when the metadata record declared no usable resource URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedService {
    pub md_id: String,
    pub protocol: Option<Protocol>,
    pub url: String,
}

impl ResolvedService {
    /// A resolution that failed; dropped at the join stage.
    #[must_use]
    pub fn unresolved(record: &CatalogRecordRef) -> Self {
        Self {
            md_id: record.md_id.clone(),
            protocol: record.protocol,
            url: String::new(),
        }
    }

    #[must_use]
    pub fn has_url(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

/// Parsed capabilities document of one service.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceCapabilities {
    pub md_id: String,
    pub protocol: Protocol,
    pub url: String,
    pub title: String,
    pub abstract_text: String,
    pub keywords: Vec<String>,
    /// Comma-separated output formats of the service's map/feature/coverage
    /// operation. Empty for WMTS, where formats are declared per layer.
    pub formats: String,
    pub layers: Vec<LayerDescriptor>,
}

/// One layer, feature type or coverage advertised by a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerDescriptor {
    pub name: String,
    pub title: String,
    pub abstract_text: String,
    /// Metadata identifier of the dataset behind the layer, empty if unknown.
    pub dataset_md_id: String,
    pub detail: LayerDetail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerDetail {
    Wms {
        styles: Vec<String>,
        /// Comma-separated CRS identifiers.
        crs: String,
        /// Scale denominators as declared, empty when absent.
        minscale: String,
        maxscale: String,
    },
    Wfs,
    Wcs,
    Wmts {
        tilematrixsets: String,
        imgformats: String,
    },
}

/// The flattened unit of the output file: one addressable map layer, and for
/// WMS one (layer, style) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub service_url: String,
    pub service_title: String,
    pub service_abstract: String,
    pub service_md_id: String,
    pub dataset_md_id: String,
    #[serde(flatten)]
    pub detail: EntryDetail,
}

/// Protocol-specific entry fields, tagged by `service_type` in JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "service_type", rename_all = "lowercase")]
pub enum EntryDetail {
    Wms {
        style: String,
        crs: String,
        minscale: String,
        maxscale: String,
        imgformats: String,
    },
    Wfs,
    Wcs,
    Wmts {
        tilematrixsets: String,
        imgformats: String,
    },
}

impl CatalogEntry {
    #[must_use]
    pub fn protocol(&self) -> Protocol {
        match self.detail {
            EntryDetail::Wms { .. } => Protocol::Wms,
            EntryDetail::Wfs => Protocol::Wfs,
            EntryDetail::Wcs => Protocol::Wcs,
            EntryDetail::Wmts { .. } => Protocol::Wmts,
        }
    }

    #[must_use]
    pub fn service_type(&self) -> &'static str {
        self.protocol().service_type()
    }

    /// The WMS style of this entry, `None` for other protocols.
    #[must_use]
    pub fn style(&self) -> Option<&str> {
        match &self.detail {
            EntryDetail::Wms { style, .. } => Some(style),
            _ => None,
        }
    }
}
