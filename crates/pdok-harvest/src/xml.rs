//! A small owned element tree built on `quick-xml` events.
//!
//! OGC documents nest the fields we need several levels deep and mix
//! namespace prefixes freely (`wms:Layer`, `ows:Title`, `xlink:href`), so
//! elements and attributes are stored under their local names only.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::HarvestError;
use crate::QUIRKS_TARGET;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    /// First direct child with the given local name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Follows a chain of direct children, e.g. `["Capability", "Request", "GetMap"]`.
    #[must_use]
    pub fn path(&self, names: &[&str]) -> Option<&XmlElement> {
        names
            .iter()
            .try_fold(self, |element, name| element.child(name))
    }

    /// Trimmed text of the first child with the given name, if non-empty.
    #[must_use]
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name)
            .map(XmlElement::text)
            .filter(|t| !t.is_empty())
    }

    /// Trimmed texts of all non-empty children with the given name.
    #[must_use]
    pub fn child_texts(&self, name: &str) -> Vec<String> {
        self.children_named(name)
            .map(XmlElement::text)
            .filter(|t| !t.is_empty())
            .map(str::to_owned)
            .collect()
    }

    #[must_use]
    pub fn text(&self) -> &str {
        self.text.trim()
    }

    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// All descendants with the given name, in document order.
    #[must_use]
    pub fn descendants_named(&self, name: &str) -> Vec<&XmlElement> {
        let mut found = Vec::new();
        let mut pending: Vec<&XmlElement> = self.children.iter().rev().collect();
        while let Some(element) = pending.pop() {
            if element.name == name {
                found.push(element);
            }
            pending.extend(element.children.iter().rev());
        }
        found
    }
}

/// Parses a complete XML document into its root element.
///
/// `context` (usually the request URL) is carried into errors and quirk
/// warnings.
///
/// # Errors
///
/// Returns [`HarvestError::Xml`] for syntax errors reported by the reader and
/// [`HarvestError::MalformedXml`] for structural problems (no root, several
/// roots, unclosed elements).
pub fn parse_document(xml: &str, context: &str) -> Result<XmlElement, HarvestError> {
    let mut reader = Reader::from_str(xml.trim_start_matches('\u{feff}'));
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => stack.push(element_from_start(&e, context)),
            Ok(Event::Empty(e)) => {
                let element = element_from_start(&e, context);
                attach(&mut stack, &mut root, element, context)?;
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| malformed(context, "closing tag without an open element"))?;
                attach(&mut stack, &mut root, element, context)?;
            }
            Ok(Event::Text(e)) => {
                if let Some(current) = stack.last_mut() {
                    let text = match e.unescape() {
                        Ok(text) => text.into_owned(),
                        Err(err) => {
                            tracing::warn!(
                                target: QUIRKS_TARGET,
                                context,
                                element = %current.name,
                                error = %err,
                                "undecodable text content; keeping raw text"
                            );
                            String::from_utf8_lossy(&e).into_owned()
                        }
                    };
                    push_text(current, &text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(current) = stack.last_mut() {
                    push_text(current, &String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::Eof) => break,
            Err(source) => {
                return Err(HarvestError::Xml {
                    context: context.to_owned(),
                    source,
                })
            }
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(malformed(
            context,
            &format!("document ended inside <{}>", open.name),
        ));
    }

    root.ok_or_else(|| malformed(context, "document has no root element"))
}

fn element_from_start(start: &BytesStart<'_>, context: &str) -> XmlElement {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let attributes = start
        .attributes()
        .flatten()
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = match attr.unescape_value() {
                Ok(value) => value.into_owned(),
                Err(err) => {
                    tracing::warn!(
                        target: QUIRKS_TARGET,
                        context,
                        element = %name,
                        attribute = %key,
                        error = %err,
                        "undecodable attribute value; keeping raw value"
                    );
                    String::from_utf8_lossy(&attr.value).into_owned()
                }
            };
            (key, value)
        })
        .collect();

    XmlElement {
        name,
        attributes,
        text: String::new(),
        children: Vec::new(),
    }
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
    context: &str,
) -> Result<(), HarvestError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        Ok(())
    } else if root.is_none() {
        *root = Some(element);
        Ok(())
    } else {
        Err(malformed(context, "more than one root element"))
    }
}

fn push_text(element: &mut XmlElement, text: &str) {
    if text.is_empty() {
        return;
    }
    if !element.text.is_empty() {
        element.text.push(' ');
    }
    element.text.push_str(text);
}

fn malformed(context: &str, reason: &str) -> HarvestError {
    HarvestError::MalformedXml {
        context: context.to_owned(),
        reason: reason.to_owned(),
    }
}
