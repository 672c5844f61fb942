//! WFS 2.0.0 capabilities.

use pdok_core::{LayerDescriptor, LayerDetail, Protocol, ServiceCapabilities};

use super::common::{
    check_root, join_csv, metadata_id_from_url, ows_operation_parameter, ows_service_info,
    text_or_empty,
};
use crate::error::HarvestError;
use crate::xml::XmlElement;

pub(crate) fn parse(
    root: &XmlElement,
    md_id: &str,
    url: &str,
) -> Result<ServiceCapabilities, HarvestError> {
    check_root(root, &["WFS_Capabilities"], url)?;

    let info = ows_service_info(root);
    let formats = join_csv(ows_operation_parameter(
        root,
        "GetFeature",
        &["outputFormat"],
    ));

    let layers = root
        .child("FeatureTypeList")
        .map(|list| {
            list.children_named("FeatureType")
                .filter_map(feature_type)
                .collect()
        })
        .unwrap_or_default();

    Ok(ServiceCapabilities {
        md_id: md_id.to_owned(),
        protocol: Protocol::Wfs,
        url: url.to_owned(),
        title: info.title,
        abstract_text: info.abstract_text,
        keywords: info.keywords,
        formats,
        layers,
    })
}

fn feature_type(feature: &XmlElement) -> Option<LayerDescriptor> {
    let name = feature.child_text("Name")?;
    // Only the first metadata link is considered.
    let dataset_md_id = feature
        .child("MetadataURL")
        .and_then(metadata_link)
        .and_then(metadata_id_from_url)
        .unwrap_or_default();

    Some(LayerDescriptor {
        name: name.to_owned(),
        title: text_or_empty(feature, "Title"),
        abstract_text: text_or_empty(feature, "Abstract"),
        dataset_md_id,
        detail: LayerDetail::Wfs,
    })
}

/// WFS 2.0 carries the link in `xlink:href`, 1.1 documents in the element text.
fn metadata_link(element: &XmlElement) -> Option<&str> {
    element
        .attr("href")
        .or_else(|| Some(element.text()).filter(|t| !t.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_document;

    const URL: &str = "https://service.pdok.nl/test/wfs/v1_0?request=GetCapabilities&service=WFS";

    const DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<wfs:WFS_Capabilities version="2.0.0" xmlns:wfs="http://www.opengis.net/wfs/2.0" xmlns:ows="http://www.opengis.net/ows/1.1" xmlns:xlink="http://www.w3.org/1999/xlink">
  <ows:ServiceIdentification>
    <ows:Title>Bestuurlijke Gebieden WFS</ows:Title>
    <ows:Abstract>Gemeenten en provincies</ows:Abstract>
    <ows:Keywords><ows:Keyword>gemeenten</ows:Keyword><ows:Keyword>provincies</ows:Keyword></ows:Keywords>
    <ows:ServiceType>WFS</ows:ServiceType>
  </ows:ServiceIdentification>
  <ows:OperationsMetadata>
    <ows:Operation name="GetFeature">
      <ows:Parameter name="outputFormat">
        <ows:AllowedValues>
          <ows:Value>application/gml+xml; version=3.2</ows:Value>
          <ows:Value>application/json</ows:Value>
        </ows:AllowedValues>
      </ows:Parameter>
    </ows:Operation>
  </ows:OperationsMetadata>
  <wfs:FeatureTypeList>
    <wfs:FeatureType>
      <wfs:Name>bg:gemeentegebied</wfs:Name>
      <wfs:Title>Gemeentegebied</wfs:Title>
      <wfs:DefaultCRS>urn:ogc:def:crs:EPSG::28992</wfs:DefaultCRS>
      <wfs:MetadataURL xlink:href="https://www.nationaalgeoregister.nl/geonetwork/srv/dut/csw?service=CSW&amp;request=GetRecordById&amp;id=ds-gem"/>
      <wfs:MetadataURL xlink:href="https://example.com/csw?id=second"/>
    </wfs:FeatureType>
    <wfs:FeatureType>
      <wfs:Name>bg:provinciegebied</wfs:Name>
      <wfs:Title>Provinciegebied</wfs:Title>
      <wfs:Abstract>Provincies</wfs:Abstract>
    </wfs:FeatureType>
    <wfs:FeatureType>
      <wfs:Title>No name</wfs:Title>
    </wfs:FeatureType>
  </wfs:FeatureTypeList>
</wfs:WFS_Capabilities>"#;

    #[test]
    fn parses_service_and_feature_types() {
        let root = parse_document(DOC, URL).unwrap();
        let caps = parse(&root, "md-wfs", URL).unwrap();

        assert_eq!(caps.protocol, Protocol::Wfs);
        assert_eq!(caps.title, "Bestuurlijke Gebieden WFS");
        assert_eq!(caps.keywords, vec!["gemeenten", "provincies"]);
        assert_eq!(caps.formats, "application/gml+xml; version=3.2,application/json");
        assert_eq!(caps.layers.len(), 2);

        let first = &caps.layers[0];
        assert_eq!(first.name, "bg:gemeentegebied");
        assert_eq!(first.abstract_text, "");
        assert_eq!(first.dataset_md_id, "ds-gem");
        assert_eq!(first.detail, LayerDetail::Wfs);

        let second = &caps.layers[1];
        assert_eq!(second.abstract_text, "Provincies");
        assert_eq!(second.dataset_md_id, "");
    }

    #[test]
    fn empty_feature_type_list_yields_no_layers() {
        let xml = r#"<wfs:WFS_Capabilities xmlns:wfs="http://www.opengis.net/wfs/2.0"/>"#;
        let root = parse_document(xml, URL).unwrap();
        let caps = parse(&root, "md", URL).unwrap();
        assert!(caps.layers.is_empty());
        assert_eq!(caps.title, "");
        assert_eq!(caps.formats, "");
    }
}
