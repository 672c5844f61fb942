//! Integration tests for `CswClient` against a local `wiremock` catalog.
//!
//! Covers paging through `GetRecords`, the `max_results` cut-off, empty
//! catalogs, exception reports, retries, and record resolution through
//! `GetRecordById`.

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pdok_core::{CatalogRecordRef, Protocol};
use pdok_harvest::{CswClient, HarvestError};

const OWNER: &str = "Beheer PDOK";

fn test_client(server: &MockServer) -> CswClient {
    CswClient::with_base_url(&format!("{}/csw", server.uri()), 5, "pdok-test/0.1")
        .expect("failed to build test CswClient")
}

fn records_page(ids: &[&str], matched: u32, next_record: u32) -> String {
    let records: String = ids
        .iter()
        .map(|id| {
            format!(
                "<csw:BriefRecord><dc:identifier>{id}</dc:identifier>\
                 <dc:title>Service {id}</dc:title><dc:type>service</dc:type></csw:BriefRecord>"
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<csw:GetRecordsResponse xmlns:csw="http://www.opengis.net/cat/csw/2.0.2" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <csw:SearchStatus timestamp="2026-01-01T00:00:00"/>
  <csw:SearchResults numberOfRecordsMatched="{matched}" numberOfRecordsReturned="{}" elementSet="brief" nextRecord="{next_record}">
    {records}
  </csw:SearchResults>
</csw:GetRecordsResponse>"#,
        ids.len()
    )
}

fn full_record(uris: &[&str]) -> String {
    let uris: String = uris
        .iter()
        .map(|u| format!(r#"<dc:URI protocol="OGC:WMS">{u}</dc:URI>"#))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<csw:GetRecordByIdResponse xmlns:csw="http://www.opengis.net/cat/csw/2.0.2" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <csw:Record><dc:identifier>md</dc:identifier>{uris}</csw:Record>
</csw:GetRecordByIdResponse>"#
    )
}

async fn mount_page(server: &MockServer, start: &str, body: String) {
    Mock::given(method("GET"))
        .and(path("/csw"))
        .and(query_param("request", "GetRecords"))
        .and(query_param("startPosition", start))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

// ---------------------------------------------------------------------------
// GetRecords paging
// ---------------------------------------------------------------------------

#[tokio::test]
async fn query_records_follows_next_record_across_pages() {
    let server = MockServer::start().await;
    mount_page(&server, "1", records_page(&["a", "b"], 5, 3)).await;
    mount_page(&server, "3", records_page(&["c", "d"], 5, 5)).await;
    mount_page(&server, "5", records_page(&["e"], 5, 0)).await;

    let client = test_client(&server).with_page_size(2);
    let records = client
        .query_records(OWNER, Protocol::Wms, 0)
        .await
        .expect("query should succeed");

    let ids: Vec<&str> = records.iter().map(|r| r.md_id.as_str()).collect();
    assert_eq!(ids, ["a", "b", "c", "d", "e"]);
    assert!(records.iter().all(|r| r.protocol == Some(Protocol::Wms)));
}

#[tokio::test]
async fn query_records_sends_owner_and_protocol_constraint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/csw"))
        .and(query_param("request", "GetRecords"))
        .and(query_param("constraintLanguage", "CQL_TEXT"))
        .and(query_param(
            "constraint",
            "type='service' AND OrganisationName='Beheer PDOK' AND protocol='OGC:WMTS'",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string(records_page(&["t"], 1, 0)))
        .expect(1)
        .mount(&server)
        .await;

    let records = test_client(&server)
        .query_records(OWNER, Protocol::Wmts, 0)
        .await
        .expect("query should succeed");

    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn query_records_stops_at_max_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/csw"))
        .and(query_param("request", "GetRecords"))
        .and(query_param("startPosition", "1"))
        .and(query_param("maxRecords", "3"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(records_page(&["a", "b", "c"], 40, 4)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let records = test_client(&server)
        .query_records(OWNER, Protocol::Wfs, 3)
        .await
        .expect("query should succeed");

    assert_eq!(records.len(), 3);
}

#[tokio::test]
async fn query_records_truncates_an_oversized_page() {
    let server = MockServer::start().await;
    mount_page(&server, "1", records_page(&["a", "b", "c", "d"], 4, 0)).await;

    let records = test_client(&server)
        .query_records(OWNER, Protocol::Wcs, 2)
        .await
        .expect("query should succeed");

    let ids: Vec<&str> = records.iter().map(|r| r.md_id.as_str()).collect();
    assert_eq!(ids, ["a", "b"]);
}

#[tokio::test]
async fn query_records_returns_empty_for_empty_catalog() {
    let server = MockServer::start().await;
    mount_page(&server, "1", records_page(&[], 0, 0)).await;

    let records = test_client(&server)
        .query_records(OWNER, Protocol::Wms, 0)
        .await
        .expect("query should succeed");

    assert!(records.is_empty());
}

#[tokio::test]
async fn query_records_stops_on_non_advancing_next_record() {
    let server = MockServer::start().await;
    mount_page(&server, "1", records_page(&["a"], 10, 1)).await;

    let records = test_client(&server)
        .query_records(OWNER, Protocol::Wms, 0)
        .await
        .expect("query should succeed");

    assert_eq!(records.len(), 1);
}

// ---------------------------------------------------------------------------
// Errors and retries
// ---------------------------------------------------------------------------

#[tokio::test]
async fn query_records_reports_exception_report() {
    let server = MockServer::start().await;
    let body = r#"<ows:ExceptionReport xmlns:ows="http://www.opengis.net/ows" version="1.2.0">
  <ows:Exception exceptionCode="InvalidParameterValue">
    <ows:ExceptionText>Unknown constraint</ows:ExceptionText>
  </ows:Exception>
</ows:ExceptionReport>"#;
    Mock::given(method("GET"))
        .and(path("/csw"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .query_records(OWNER, Protocol::Wms, 0)
        .await
        .expect_err("exception report must be an error");

    match err {
        HarvestError::ServiceException { message, .. } => {
            assert!(message.contains("Unknown constraint"), "message: {message}");
        }
        other => panic!("expected ServiceException, got: {other:?}"),
    }
}

#[tokio::test]
async fn query_records_without_retries_fails_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/csw"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let err = test_client(&server)
        .query_records(OWNER, Protocol::Wms, 0)
        .await
        .expect_err("503 must be an error");

    assert!(
        matches!(err, HarvestError::UnexpectedStatus { status: 503, .. }),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn query_records_retries_transient_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/csw"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(&server, "1", records_page(&["a"], 1, 0)).await;

    let config = pdok_core::AppConfig {
        csw_url: format!("{}/csw", server.uri()),
        http_timeout_secs: 5,
        csw_max_retries: 2,
        csw_retry_backoff_base_secs: 0,
        ..pdok_core::AppConfig::default()
    };
    let client = CswClient::from_config(&config).expect("client");
    let records = client
        .query_records(OWNER, Protocol::Wms, 0)
        .await
        .expect("retry should recover");

    assert_eq!(records.len(), 1);
}

// ---------------------------------------------------------------------------
// GetRecordById resolution
// ---------------------------------------------------------------------------

#[tokio::test]
async fn resolve_service_builds_capabilities_url_from_first_uri() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/csw"))
        .and(query_param("request", "GetRecordById"))
        .and(query_param("id", "md-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(full_record(&[
            "https://service.pdok.nl/kadaster/bestuurlijkegebieden/wms/v1_0?request=GetCapabilities&service=WMS",
            "https://service.pdok.nl/other/wms/v1_0",
        ])))
        .mount(&server)
        .await;

    let record = CatalogRecordRef {
        md_id: "md-1".to_owned(),
        protocol: Some(Protocol::Wms),
    };
    let resolved = test_client(&server).resolve_service(&record).await;

    assert_eq!(resolved.md_id, "md-1");
    assert_eq!(resolved.protocol, Some(Protocol::Wms));
    assert_eq!(
        resolved.url,
        "https://service.pdok.nl/kadaster/bestuurlijkegebieden/wms/v1_0?request=GetCapabilities&service=WMS"
    );
}

#[tokio::test]
async fn resolve_service_infers_protocol_for_single_record_mode() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/csw"))
        .and(query_param("request", "GetRecordById"))
        .respond_with(ResponseTemplate::new(200).set_body_string(full_record(&[
            "https://service.pdok.nl/rws/nwbwegen/wfs/v1_0?",
        ])))
        .mount(&server)
        .await;

    let record = CatalogRecordRef {
        md_id: "md-2".to_owned(),
        protocol: None,
    };
    let resolved = test_client(&server).resolve_service(&record).await;

    assert_eq!(resolved.protocol, Some(Protocol::Wfs));
    assert_eq!(
        resolved.url,
        "https://service.pdok.nl/rws/nwbwegen/wfs/v1_0?request=GetCapabilities&service=WFS"
    );
}

#[tokio::test]
async fn resolve_service_without_uri_yields_empty_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/csw"))
        .and(query_param("request", "GetRecordById"))
        .respond_with(ResponseTemplate::new(200).set_body_string(full_record(&[])))
        .mount(&server)
        .await;

    let record = CatalogRecordRef {
        md_id: "md-3".to_owned(),
        protocol: Some(Protocol::Wms),
    };
    let resolved = test_client(&server).resolve_service(&record).await;

    assert_eq!(resolved.md_id, "md-3");
    assert!(resolved.url.is_empty());
    assert!(!resolved.has_url());
}

#[tokio::test]
async fn resolve_service_swallows_http_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/csw"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let record = CatalogRecordRef {
        md_id: "md-4".to_owned(),
        protocol: Some(Protocol::Wcs),
    };
    let resolved = test_client(&server).resolve_service(&record).await;

    assert!(resolved.url.is_empty());
    assert_eq!(resolved.protocol, Some(Protocol::Wcs));
}
