//! Pieces shared by the four capabilities parsers.

use pdok_core::Protocol;
use percent_encoding::percent_decode_str;
use reqwest::Url;

use crate::csw::exception_message;
use crate::error::HarvestError;
use crate::xml::XmlElement;

/// Service-level title, abstract and keywords.
#[derive(Debug, Default)]
pub(crate) struct ServiceInfo {
    pub title: String,
    pub abstract_text: String,
    pub keywords: Vec<String>,
}

/// Checks that the document root is one of `expected`, turning exception
/// reports into [`HarvestError::ServiceException`].
pub(crate) fn check_root(
    root: &XmlElement,
    expected: &[&str],
    context: &str,
) -> Result<(), HarvestError> {
    if expected.contains(&root.name.as_str()) {
        return Ok(());
    }
    if let Some(message) = exception_message(root) {
        return Err(HarvestError::ServiceException {
            context: context.to_owned(),
            message,
        });
    }
    Err(HarvestError::UnexpectedDocument {
        context: context.to_owned(),
        found: root.name.clone(),
    })
}

/// Rejects a document that identifies itself as another OGC service.
///
/// WCS 2.0 and WMTS share the `Capabilities` root, so the service is read
/// from `ows:ServiceIdentification/ows:ServiceType` and from the OGC
/// namespaces declared on the root. A document without either is accepted.
pub(crate) fn check_service(
    root: &XmlElement,
    expected: Protocol,
    context: &str,
) -> Result<(), HarvestError> {
    let declared = declared_services(root);
    if declared.is_empty() || declared.contains(&expected) {
        return Ok(());
    }
    let names: Vec<&str> = declared.iter().map(|p| p.service_param()).collect();
    Err(HarvestError::UnexpectedDocument {
        context: context.to_owned(),
        found: format!("{} ({})", root.name, names.join(",")),
    })
}

fn declared_services(root: &XmlElement) -> Vec<Protocol> {
    let mut found = Vec::new();
    let mut note = |token: &str| {
        if let Some(protocol) = Protocol::ALL
            .into_iter()
            .find(|p| token.eq_ignore_ascii_case(p.service_param()))
        {
            if !found.contains(&protocol) {
                found.push(protocol);
            }
        }
    };

    if let Some(service_type) = root.path(&["ServiceIdentification", "ServiceType"]) {
        // "OGC WMTS", "OGC:WCS", "urn:ogc:service:wcs"
        for token in service_type.text().split(|c: char| !c.is_ascii_alphanumeric()) {
            note(token);
        }
    }
    for (_, value) in &root.attributes {
        // http://www.opengis.net/wmts/1.0, http://www.opengis.net/wcs/2.0
        if let Some(rest) = value.trim().strip_prefix("http://www.opengis.net/") {
            note(rest.split('/').next().unwrap_or_default());
        }
    }
    found
}

/// Text of a child element, or an empty string when absent.
pub(crate) fn text_or_empty(element: &XmlElement, name: &str) -> String {
    element.child_text(name).unwrap_or_default().to_owned()
}

/// Reads `ows:ServiceIdentification` (WFS 2.0, WCS 2.0, WMTS).
pub(crate) fn ows_service_info(root: &XmlElement) -> ServiceInfo {
    let Some(identification) = root.child("ServiceIdentification") else {
        return ServiceInfo::default();
    };
    ServiceInfo {
        title: text_or_empty(identification, "Title"),
        abstract_text: text_or_empty(identification, "Abstract"),
        keywords: identification
            .children_named("Keywords")
            .flat_map(|k| k.child_texts("Keyword"))
            .collect(),
    }
}

/// Allowed values of a parameter of an `ows:Operation`, falling back to a
/// parameter declared for all operations.
pub(crate) fn ows_operation_parameter(
    root: &XmlElement,
    operation: &str,
    parameters: &[&str],
) -> Vec<String> {
    let Some(metadata) = root.child("OperationsMetadata") else {
        return Vec::new();
    };

    let from_operation = metadata
        .children_named("Operation")
        .find(|op| op.attr("name") == Some(operation))
        .map(|op| parameter_values(op, parameters))
        .unwrap_or_default();

    if from_operation.is_empty() {
        parameter_values(metadata, parameters)
    } else {
        from_operation
    }
}

fn parameter_values(parent: &XmlElement, parameters: &[&str]) -> Vec<String> {
    parent
        .children_named("Parameter")
        .filter(|p| {
            p.attr("name")
                .is_some_and(|n| parameters.iter().any(|want| n.eq_ignore_ascii_case(want)))
        })
        .flat_map(|p| {
            // OWS 1.1 wraps values in AllowedValues, OWS 1.0 lists them directly.
            let mut values = p.child_texts("Value");
            if let Some(allowed) = p.child("AllowedValues") {
                values.extend(allowed.child_texts("Value"));
            }
            values
        })
        .collect()
}

/// Extracts the `uuid` (preferred) or `id` query parameter of a metadata
/// link, case-insensitively.
///
/// Metadata links in the wild are not always valid URLs (unencoded spaces,
/// missing scheme), so unparseable links fall back to splitting the query
/// string by hand.
pub(crate) fn metadata_id_from_url(link: &str) -> Option<String> {
    let link = link.trim();
    let pairs: Vec<(String, String)> = match Url::parse(link) {
        Ok(url) => url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect(),
        Err(_) => {
            let query = link.split_once('?').map(|(_, q)| q)?;
            query
                .split('&')
                .filter_map(|pair| pair.split_once('='))
                .map(|(k, v)| {
                    (
                        k.to_owned(),
                        percent_decode_str(v).decode_utf8_lossy().into_owned(),
                    )
                })
                .collect()
        }
    };

    ["uuid", "id"].iter().find_map(|wanted| {
        pairs
            .iter()
            .find(|(k, v)| k.eq_ignore_ascii_case(wanted) && !v.trim().is_empty())
            .map(|(_, v)| v.trim().to_owned())
    })
}

/// Joins values into the comma-separated form used in the catalog, dropping
/// duplicates while keeping first-seen order.
pub(crate) fn join_csv<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen: Vec<String> = Vec::new();
    for value in values {
        let value = value.as_ref().trim();
        if !value.is_empty() && !seen.iter().any(|s| s == value) {
            seen.push(value.to_owned());
        }
    }
    seen.join(",")
}
