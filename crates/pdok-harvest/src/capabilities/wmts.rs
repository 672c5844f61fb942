//! WMTS 1.0.0 capabilities.

use pdok_core::{LayerDescriptor, LayerDetail, Protocol, ServiceCapabilities};

use super::common::{check_root, check_service, join_csv, ows_service_info, text_or_empty};
use crate::error::HarvestError;
use crate::xml::XmlElement;

pub(crate) fn parse(
    root: &XmlElement,
    md_id: &str,
    url: &str,
) -> Result<ServiceCapabilities, HarvestError> {
    check_root(root, &["Capabilities"], url)?;
    check_service(root, Protocol::Wmts, url)?;

    let info = ows_service_info(root);

    let layers = root
        .child("Contents")
        .map(|contents| contents.children_named("Layer").filter_map(layer).collect())
        .unwrap_or_default();

    Ok(ServiceCapabilities {
        md_id: md_id.to_owned(),
        protocol: Protocol::Wmts,
        url: url.to_owned(),
        title: info.title,
        abstract_text: info.abstract_text,
        keywords: info.keywords,
        formats: String::new(),
        layers,
    })
}

fn layer(layer: &XmlElement) -> Option<LayerDescriptor> {
    let name = layer.child_text("Identifier")?;

    let tilematrixsets = join_csv(
        layer
            .children_named("TileMatrixSetLink")
            .filter_map(|link| link.child_text("TileMatrixSet")),
    );

    Some(LayerDescriptor {
        name: name.to_owned(),
        title: text_or_empty(layer, "Title"),
        abstract_text: text_or_empty(layer, "Abstract"),
        dataset_md_id: String::new(),
        detail: LayerDetail::Wmts {
            tilematrixsets,
            imgformats: join_csv(layer.child_texts("Format")),
        },
    })
}
