//! Turning a metadata record's resource URI into a `GetCapabilities` URL.

use pdok_core::Protocol;
use reqwest::Url;

use crate::error::HarvestError;

/// Path fragment of the tile service that PDOK registers under many
/// per-layer URIs.
pub const TILES_SERVICE_MARKER: &str = "/tiles/service/wmts";

/// The single endpoint all tile-service URIs are folded into.
pub const CANONICAL_TILES_URL: &str = "https://geodata.nationaalgeoregister.nl/tiles/service/wmts";

/// Builds the capabilities request URL for a resource URI.
///
/// Drops any query string and fragment, infers the protocol from the path
/// when `protocol` is `None`, folds tile-service URIs into
/// [`CANONICAL_TILES_URL`], and appends `request=GetCapabilities&service=..`.
///
/// # Errors
///
/// Returns [`HarvestError::InvalidUrl`] if the URI does not parse or its
/// protocol cannot be determined.
pub fn capabilities_url(
    resource_uri: &str,
    protocol: Option<Protocol>,
) -> Result<(Protocol, String), HarvestError> {
    let raw = resource_uri.trim();
    let mut url = Url::parse(raw).map_err(|e| HarvestError::InvalidUrl {
        url: raw.to_owned(),
        reason: e.to_string(),
    })?;
    url.set_query(None);
    url.set_fragment(None);

    let protocol = protocol
        .or_else(|| Protocol::infer_from_path(url.path()))
        .ok_or_else(|| HarvestError::InvalidUrl {
            url: raw.to_owned(),
            reason: "cannot infer service protocol from path".to_owned(),
        })?;

    if url.path().to_ascii_lowercase().contains(TILES_SERVICE_MARKER) {
        url = Url::parse(CANONICAL_TILES_URL).map_err(|e| HarvestError::InvalidUrl {
            url: CANONICAL_TILES_URL.to_owned(),
            reason: e.to_string(),
        })?;
    }

    url.query_pairs_mut()
        .append_pair("request", "GetCapabilities")
        .append_pair("service", protocol.service_param());

    Ok((protocol, url.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_existing_query_and_appends_capabilities_request() {
        let (protocol, url) = capabilities_url(
            "https://service.pdok.nl/rws/nwbwegen/wms/v1_0?request=GetCapabilities&service=wms",
            Some(Protocol::Wms),
        )
        .unwrap();
        assert_eq!(protocol, Protocol::Wms);
        assert_eq!(
            url,
            "https://service.pdok.nl/rws/nwbwegen/wms/v1_0?request=GetCapabilities&service=WMS"
        );
    }

    #[test]
    fn infers_protocol_when_unknown() {
        let (protocol, url) =
            capabilities_url("https://service.pdok.nl/kadaster/bestuurlijkegebieden/wfs/v1_0", None)
                .unwrap();
        assert_eq!(protocol, Protocol::Wfs);
        assert!(url.ends_with("wfs/v1_0?request=GetCapabilities&service=WFS"));
    }

    #[test]
    fn known_protocol_wins_over_path() {
        let (protocol, url) =
            capabilities_url("https://service.pdok.nl/x/wms/v1_0", Some(Protocol::Wcs)).unwrap();
        assert_eq!(protocol, Protocol::Wcs);
        assert!(url.ends_with("service=WCS"));
    }

    #[test]
    fn folds_tile_service_variants() {
        let (protocol, url) = capabilities_url(
            "https://geodata.nationaalgeoregister.nl/tiles/service/wmts/brtachtergrondkaart/EPSG:28992/{z}/{x}/{y}.png",
            None,
        )
        .unwrap();
        assert_eq!(protocol, Protocol::Wmts);
        assert_eq!(
            url,
            "https://geodata.nationaalgeoregister.nl/tiles/service/wmts?request=GetCapabilities&service=WMTS"
        );
    }

    #[test]
    fn rejects_unparseable_uri() {
        let err = capabilities_url("not a url", Some(Protocol::Wms)).unwrap_err();
        assert!(matches!(err, HarvestError::InvalidUrl { .. }));
    }

    #[test]
    fn rejects_uri_without_recognisable_protocol() {
        let err = capabilities_url("https://example.com/geoserver/ows", None).unwrap_err();
        assert!(err.to_string().contains("cannot infer"));
    }
}
