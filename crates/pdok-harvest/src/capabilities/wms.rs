//! WMS 1.3.0 capabilities (1.1.1 documents are read the same way).
//!
//! Layers nest, and a child layer inherits what it does not declare itself:
//! styles accumulate down the tree, the CRS list and scale denominators are
//! taken from the nearest ancestor that declares them. Only layers with a
//! `<Name>` are addressable and end up in the result.

use std::collections::HashSet;

use pdok_core::{LayerDescriptor, LayerDetail, Protocol, ServiceCapabilities};

use super::common::{check_root, join_csv, metadata_id_from_url, text_or_empty};
use crate::error::HarvestError;
use crate::xml::XmlElement;
use crate::QUIRKS_TARGET;

#[derive(Debug, Clone, Default)]
struct Inherited {
    styles: Vec<String>,
    crs: Vec<String>,
    minscale: String,
    maxscale: String,
}

pub(crate) fn parse(
    root: &XmlElement,
    md_id: &str,
    url: &str,
) -> Result<ServiceCapabilities, HarvestError> {
    check_root(root, &["WMS_Capabilities", "WMT_MS_Capabilities"], url)?;

    let service = root.child("Service");
    let title = service.map(|s| text_or_empty(s, "Title")).unwrap_or_default();
    let abstract_text = service
        .map(|s| text_or_empty(s, "Abstract"))
        .unwrap_or_default();
    let keywords = service
        .and_then(|s| s.child("KeywordList"))
        .map(|k| k.child_texts("Keyword"))
        .unwrap_or_default();

    let formats = root
        .path(&["Capability", "Request", "GetMap"])
        .map(|get_map| join_csv(get_map.child_texts("Format")))
        .unwrap_or_default();

    let mut layers = Vec::new();
    let mut seen = HashSet::new();
    if let Some(capability) = root.child("Capability") {
        for layer in capability.children_named("Layer") {
            collect_layers(layer, &Inherited::default(), url, &mut seen, &mut layers);
        }
    }

    Ok(ServiceCapabilities {
        md_id: md_id.to_owned(),
        protocol: Protocol::Wms,
        url: url.to_owned(),
        title,
        abstract_text,
        keywords,
        formats,
        layers,
    })
}

fn collect_layers(
    layer: &XmlElement,
    parent: &Inherited,
    url: &str,
    seen: &mut HashSet<String>,
    out: &mut Vec<LayerDescriptor>,
) {
    let inherited = resolve_inherited(layer, parent, url);

    if let Some(name) = layer.child_text("Name") {
        if seen.insert(name.to_owned()) {
            out.push(LayerDescriptor {
                name: name.to_owned(),
                title: text_or_empty(layer, "Title"),
                abstract_text: text_or_empty(layer, "Abstract"),
                dataset_md_id: dataset_metadata_id(layer).unwrap_or_default(),
                detail: LayerDetail::Wms {
                    styles: inherited.styles.clone(),
                    crs: inherited.crs.join(","),
                    minscale: inherited.minscale.clone(),
                    maxscale: inherited.maxscale.clone(),
                },
            });
        } else {
            tracing::warn!(target: QUIRKS_TARGET, url, layer = name, "duplicate layer name; keeping the first");
        }
    }

    for child in layer.children_named("Layer") {
        collect_layers(child, &inherited, url, seen, out);
    }
}

fn resolve_inherited(layer: &XmlElement, parent: &Inherited, url: &str) -> Inherited {
    let mut styles = parent.styles.clone();
    for style in layer.children_named("Style") {
        if let Some(name) = style.child_text("Name") {
            if !styles.iter().any(|s| s == name) {
                styles.push(name.to_owned());
            }
        }
    }

    let own_crs = declared_crs(layer, url);
    let crs = if own_crs.is_empty() {
        parent.crs.clone()
    } else {
        own_crs
    };

    let minscale = layer
        .child_text("MinScaleDenominator")
        .map_or_else(|| parent.minscale.clone(), str::to_owned);
    let maxscale = layer
        .child_text("MaxScaleDenominator")
        .map_or_else(|| parent.maxscale.clone(), str::to_owned);

    Inherited {
        styles,
        crs,
        minscale,
        maxscale,
    }
}

/// CRS identifiers of a layer: from its bounding boxes when it has any,
/// otherwise from its `CRS` (1.3.0) or `SRS` (1.1.1) elements. A single
/// element may list several identifiers separated by whitespace.
fn declared_crs(layer: &XmlElement, url: &str) -> Vec<String> {
    let from_boxes: Vec<&str> = layer
        .children_named("BoundingBox")
        .filter_map(|bbox| bbox.attr("CRS").or_else(|| bbox.attr("SRS")))
        .collect();

    let declarations: Vec<&str> = if from_boxes.is_empty() {
        layer
            .children
            .iter()
            .filter(|c| c.name == "CRS" || c.name == "SRS")
            .map(XmlElement::text)
            .collect()
    } else {
        from_boxes
    };

    let mut crs: Vec<String> = Vec::new();
    for token in declarations.iter().flat_map(|d| d.split_whitespace()) {
        if !token.contains(':') {
            tracing::warn!(target: QUIRKS_TARGET, url, crs = token, "CRS declaration without authority prefix");
        }
        if !crs.iter().any(|c| c == token) {
            crs.push(token.to_owned());
        }
    }
    crs
}

/// The dataset identifier from the layer's ISO 19115/19139 (`TC211`)
/// metadata link, if any.
fn dataset_metadata_id(layer: &XmlElement) -> Option<String> {
    layer
        .children_named("MetadataURL")
        .filter(|m| m.attr("type").is_some_and(|t| t.eq_ignore_ascii_case("TC211")))
        .filter_map(|m| m.child("OnlineResource").and_then(|r| r.attr("href")))
        .find_map(metadata_id_from_url)
}
