//! The four OGC protocol families harvested from the catalog.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Wms,
    Wfs,
    Wcs,
    Wmts,
}

impl Protocol {
    pub const ALL: [Protocol; 4] = [Protocol::Wms, Protocol::Wfs, Protocol::Wcs, Protocol::Wmts];

    /// Protocol name as stored in the metadata catalog, e.g. `OGC:WMS`.
    #[must_use]
    pub fn csw_name(self) -> &'static str {
        match self {
            Protocol::Wms => "OGC:WMS",
            Protocol::Wfs => "OGC:WFS",
            Protocol::Wcs => "OGC:WCS",
            Protocol::Wmts => "OGC:WMTS",
        }
    }

    /// Value of the `service=` parameter in a `GetCapabilities` request.
    #[must_use]
    pub fn service_param(self) -> &'static str {
        match self {
            Protocol::Wms => "WMS",
            Protocol::Wfs => "WFS",
            Protocol::Wcs => "WCS",
            Protocol::Wmts => "WMTS",
        }
    }

    /// Lowercase `service_type` written into catalog entries.
    #[must_use]
    pub fn service_type(self) -> &'static str {
        match self {
            Protocol::Wms => "wms",
            Protocol::Wfs => "wfs",
            Protocol::Wcs => "wcs",
            Protocol::Wmts => "wmts",
        }
    }

    /// Guesses the protocol from PDOK path conventions (`.../wms/v1_0`,
    /// `.../wmts`, ...).
    ///
    /// Only whole path segments count, so `/wmts` never reads as `/wms`.
    #[must_use]
    pub fn infer_from_path(path: &str) -> Option<Protocol> {
        let segments: Vec<String> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_ascii_lowercase)
            .collect();
        [Protocol::Wmts, Protocol::Wms, Protocol::Wfs, Protocol::Wcs]
            .into_iter()
            .find(|p| segments.iter().any(|s| s == p.service_type()))
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.csw_name())
    }
}

impl FromStr for Protocol {
    type Err = CoreError;

    /// Accepts `wms`, `WMS` and `OGC:WMS` style spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let bare = trimmed
            .get(..4)
            .filter(|prefix| prefix.eq_ignore_ascii_case("ogc:"))
            .map_or(trimmed, |_| &trimmed[4..]);
        match bare.to_ascii_lowercase().as_str() {
            "wms" => Ok(Protocol::Wms),
            "wfs" => Ok(Protocol::Wfs),
            "wcs" => Ok(Protocol::Wcs),
            "wmts" => Ok(Protocol::Wmts),
            _ => Err(CoreError::UnknownProtocol(s.to_owned())),
        }
    }
}
