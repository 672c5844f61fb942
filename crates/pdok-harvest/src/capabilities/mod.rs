//! Fetching and parsing service capabilities documents.
//!
//! Every failure of a single endpoint (network, HTTP status, unreadable or
//! unexpected document, even a panicking parser) is caught here and turned
//! into a [`FetchFailure`] value, so one bad service never disturbs the rest
//! of a fan-out batch.

pub(crate) mod common;
mod wcs;
mod wfs;
mod wms;
mod wmts;

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use pdok_core::{Protocol, ResolvedService, ServiceCapabilities};
use reqwest::Client;

use crate::error::HarvestError;
use crate::xml::parse_document;

/// URL marker of restricted-access services, which are left out of the
/// public catalog on purpose.
pub const SECURE_URL_MARKER: &str = "://secure";

/// Why a service produced no layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// Restricted-access service, skipped by policy. Not an error.
    Skipped,
    /// The endpoint answered with a non-success status.
    HttpStatus { status: u16 },
    /// Connection, TLS or timeout failure.
    Transport { message: String },
    /// The document could not be read as capabilities of the expected protocol.
    Parse { message: String },
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Skipped => write!(f, "skipped (restricted service)"),
            FailureKind::HttpStatus { status } => write!(f, "HTTP status {status}"),
            FailureKind::Transport { message } => write!(f, "transport error: {message}"),
            FailureKind::Parse { message } => write!(f, "parse error: {message}"),
        }
    }
}

/// A service whose capabilities could not be harvested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub md_id: String,
    pub url: String,
    pub kind: FailureKind,
}

impl FetchFailure {
    fn new(service: &ResolvedService, kind: FailureKind) -> Self {
        Self {
            md_id: service.md_id.clone(),
            url: service.url.clone(),
            kind,
        }
    }

    #[must_use]
    pub fn is_skipped(&self) -> bool {
        self.kind == FailureKind::Skipped
    }
}

/// Whether `url` points at a restricted-access service.
///
/// A plain substring test on the host prefix; not a security boundary.
#[must_use]
pub fn is_secure_url(url: &str) -> bool {
    url.contains(SECURE_URL_MARKER)
}

/// Parses a capabilities document of the given protocol.
///
/// # Errors
///
/// Returns a [`HarvestError`] if the body is not well-formed XML, is an OWS
/// exception report, or has the wrong root element for `protocol`.
pub fn parse_capabilities(
    protocol: Protocol,
    xml: &str,
    service: &ResolvedService,
) -> Result<ServiceCapabilities, HarvestError> {
    let root = parse_document(xml, &service.url)?;
    match protocol {
        Protocol::Wms => wms::parse(&root, &service.md_id, &service.url),
        Protocol::Wfs => wfs::parse(&root, &service.md_id, &service.url),
        Protocol::Wcs => wcs::parse(&root, &service.md_id, &service.url),
        Protocol::Wmts => wmts::parse(&root, &service.md_id, &service.url),
    }
}

/// Downloads and parses capabilities documents. Each request is made once;
/// the client timeout is the only limit on a hanging endpoint.
pub struct CapabilitiesFetcher {
    client: Client,
}

impl CapabilitiesFetcher {
    /// # Errors
    ///
    /// Returns [`HarvestError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, HarvestError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    /// Fetches and parses the capabilities of one resolved service.
    ///
    /// Never panics and never propagates an error: see [`FailureKind`] for
    /// the possible outcomes besides success.
    pub async fn fetch(
        &self,
        service: &ResolvedService,
    ) -> Result<ServiceCapabilities, FetchFailure> {
        self.fetch_with_parser(service, parse_capabilities).await
    }

    /// [`Self::fetch`] with a custom document parser.
    ///
    /// A panic inside `parser` is caught and reported as a parse failure.
    pub async fn fetch_with_parser<P>(
        &self,
        service: &ResolvedService,
        parser: P,
    ) -> Result<ServiceCapabilities, FetchFailure>
    where
        P: Fn(Protocol, &str, &ResolvedService) -> Result<ServiceCapabilities, HarvestError>,
    {
        if is_secure_url(&service.url) {
            tracing::debug!(md_id = %service.md_id, url = %service.url, "skipping restricted service");
            return Err(FetchFailure::new(service, FailureKind::Skipped));
        }

        let Some(protocol) = service.protocol else {
            tracing::error!(md_id = %service.md_id, url = %service.url, "service protocol unknown; cannot parse capabilities");
            return Err(FetchFailure::new(
                service,
                FailureKind::Parse {
                    message: "service protocol unknown".to_owned(),
                },
            ));
        };

        let body = match self.get_document(&service.url).await {
            Ok(body) => body,
            Err(HarvestError::UnexpectedStatus { status, .. }) => {
                tracing::error!(
                    md_id = %service.md_id,
                    url = %service.url,
                    status,
                    "capabilities request returned an HTTP error status"
                );
                return Err(FetchFailure::new(service, FailureKind::HttpStatus { status }));
            }
            Err(e) => {
                tracing::error!(
                    md_id = %service.md_id,
                    url = %service.url,
                    error = %e,
                    "capabilities request failed"
                );
                return Err(FetchFailure::new(
                    service,
                    FailureKind::Transport {
                        message: e.to_string(),
                    },
                ));
            }
        };

        let parsed = panic::catch_unwind(AssertUnwindSafe(|| parser(protocol, &body, service)));
        match parsed {
            Ok(Ok(capabilities)) => Ok(capabilities),
            Ok(Err(e)) => {
                tracing::error!(
                    md_id = %service.md_id,
                    url = %service.url,
                    error = ?e,
                    "failed to parse capabilities document"
                );
                Err(FetchFailure::new(
                    service,
                    FailureKind::Parse {
                        message: e.to_string(),
                    },
                ))
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(
                    md_id = %service.md_id,
                    url = %service.url,
                    panic = %message,
                    "capabilities parser panicked"
                );
                Err(FetchFailure::new(service, FailureKind::Parse { message }))
            }
        }
    }

    async fn get_document(&self, url: &str) -> Result<String, HarvestError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }
        Ok(response.text().await?)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "parser panicked".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secure_marker_matches_host_prefix_only() {
        assert!(is_secure_url(
            "https://secure.geodata.nationaalgeoregister.nl/x/wms?request=GetCapabilities"
        ));
        assert!(!is_secure_url(
            "https://service.pdok.nl/secure-things/wms?request=GetCapabilities"
        ));
    }

    #[test]
    fn parse_capabilities_dispatches_on_protocol() {
        let service = ResolvedService {
            md_id: "md".to_owned(),
            protocol: Some(Protocol::Wmts),
            url: "https://example.com/wmts".to_owned(),
        };
        let wmts = r#"<Capabilities xmlns="http://www.opengis.net/wmts/1.0"><Contents/></Capabilities>"#;
        let caps = parse_capabilities(Protocol::Wmts, wmts, &service).unwrap();
        assert_eq!(caps.protocol, Protocol::Wmts);

        let err = parse_capabilities(Protocol::Wms, wmts, &service).unwrap_err();
        assert!(matches!(err, HarvestError::UnexpectedDocument { .. }));

        let err = parse_capabilities(Protocol::Wcs, wmts, &service).unwrap_err();
        assert!(matches!(err, HarvestError::UnexpectedDocument { .. }));
    }

    #[test]
    fn failure_kind_display_is_readable() {
        assert_eq!(
            FailureKind::HttpStatus { status: 500 }.to_string(),
            "HTTP status 500"
        );
        assert!(FailureKind::Skipped.to_string().contains("skipped"));
    }

    #[test]
    fn panic_message_reads_common_payloads() {
        assert_eq!(panic_message(&"boom"), "boom");
        assert_eq!(panic_message(&String::from("bang")), "bang");
        assert_eq!(panic_message(&42u8), "parser panicked");
    }
}
