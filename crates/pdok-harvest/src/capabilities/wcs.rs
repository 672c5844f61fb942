//! WCS 2.0.1 capabilities.
//!
//! Coverage summaries carry no usable dataset metadata link, so
//! `dataset_md_id` stays empty.

use pdok_core::{LayerDescriptor, LayerDetail, Protocol, ServiceCapabilities};

use super::common::{
    check_root, check_service, join_csv, ows_operation_parameter, ows_service_info,
    text_or_empty,
};
use crate::error::HarvestError;
use crate::xml::XmlElement;

pub(crate) fn parse(
    root: &XmlElement,
    md_id: &str,
    url: &str,
) -> Result<ServiceCapabilities, HarvestError> {
    check_root(root, &["Capabilities"], url)?;
    check_service(root, Protocol::Wcs, url)?;

    let info = ows_service_info(root);

    let mut formats = ows_operation_parameter(root, "GetCoverage", &["format", "outputFormat"]);
    if formats.is_empty() {
        // WCS 2.0 lists formats once in ServiceMetadata instead.
        if let Some(metadata) = root.child("ServiceMetadata") {
            formats = metadata.child_texts("formatSupported");
        }
    }

    let layers = root
        .child("Contents")
        .map(|contents| {
            contents
                .children_named("CoverageSummary")
                .filter_map(coverage)
                .collect()
        })
        .unwrap_or_default();

    Ok(ServiceCapabilities {
        md_id: md_id.to_owned(),
        protocol: Protocol::Wcs,
        url: url.to_owned(),
        title: info.title,
        abstract_text: info.abstract_text,
        keywords: info.keywords,
        formats: join_csv(formats),
        layers,
    })
}

fn coverage(summary: &XmlElement) -> Option<LayerDescriptor> {
    // 2.0 uses CoverageId, 1.1 Identifier.
    let name = summary
        .child_text("CoverageId")
        .or_else(|| summary.child_text("Identifier"))?;

    Some(LayerDescriptor {
        name: name.to_owned(),
        title: text_or_empty(summary, "Title"),
        abstract_text: text_or_empty(summary, "Abstract"),
        dataset_md_id: String::new(),
        detail: LayerDetail::Wcs,
    })
}
