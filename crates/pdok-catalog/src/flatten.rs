//! Turning parsed capabilities into the flat list of catalog entries.
//!
//! A WMS layer yields one entry per style (one entry with an empty style
//! when it declares none); every other layer yields exactly one entry.

use pdok_core::{CatalogEntry, EntryDetail, LayerDescriptor, LayerDetail, ServiceCapabilities};

/// Flattens every service, in order, into one entry list.
#[must_use]
pub fn flatten_services(services: &[ServiceCapabilities]) -> Vec<CatalogEntry> {
    services.iter().flat_map(flatten_service).collect()
}

/// Catalog entries of a single service.
#[must_use]
pub fn flatten_service(service: &ServiceCapabilities) -> Vec<CatalogEntry> {
    let mut entries = Vec::with_capacity(service.layers.len());
    for layer in &service.layers {
        match &layer.detail {
            LayerDetail::Wms {
                styles,
                crs,
                minscale,
                maxscale,
            } => {
                let wms = |style: &str| EntryDetail::Wms {
                    style: style.to_owned(),
                    crs: crs.clone(),
                    minscale: minscale.clone(),
                    maxscale: maxscale.clone(),
                    imgformats: service.formats.clone(),
                };
                if styles.is_empty() {
                    entries.push(entry(service, layer, wms("")));
                } else {
                    entries.extend(
                        styles
                            .iter()
                            .map(|style| entry(service, layer, wms(style.as_str()))),
                    );
                }
            }
            LayerDetail::Wfs => entries.push(entry(service, layer, EntryDetail::Wfs)),
            LayerDetail::Wcs => entries.push(entry(service, layer, EntryDetail::Wcs)),
            LayerDetail::Wmts {
                tilematrixsets,
                imgformats,
            } => entries.push(entry(
                service,
                layer,
                EntryDetail::Wmts {
                    tilematrixsets: tilematrixsets.clone(),
                    imgformats: imgformats.clone(),
                },
            )),
        }
    }
    entries
}

fn entry(
    service: &ServiceCapabilities,
    layer: &LayerDescriptor,
    detail: EntryDetail,
) -> CatalogEntry {
    CatalogEntry {
        name: layer.name.clone(),
        title: layer.title.clone(),
        abstract_text: layer.abstract_text.clone(),
        service_url: service.url.clone(),
        service_title: service.title.clone(),
        service_abstract: service.abstract_text.clone(),
        service_md_id: service.md_id.clone(),
        dataset_md_id: layer.dataset_md_id.clone(),
        detail,
    }
}

#[cfg(test)]
#[path = "flatten_test.rs"]
mod tests;
