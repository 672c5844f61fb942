//! Serializing the catalog to its JSON file.

use std::path::Path;

use pdok_core::CatalogEntry;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::error::CatalogError;

/// Top-level shape of the output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputLayout {
    /// A bare JSON array of entries.
    #[default]
    Array,
    /// `{"services": [...]}`.
    ServicesObject,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    /// Indent with four spaces instead of writing compact JSON.
    pub pretty: bool,
    pub layout: OutputLayout,
}

#[derive(Serialize)]
struct ServicesDocument<'a> {
    services: &'a [CatalogEntry],
}

/// Renders `entries` as JSON text.
///
/// # Errors
///
/// Returns [`CatalogError::Serialize`] if serialization fails.
pub fn render_catalog(
    entries: &[CatalogEntry],
    options: WriteOptions,
) -> Result<Vec<u8>, CatalogError> {
    match options.layout {
        OutputLayout::Array => to_json(entries, options.pretty),
        OutputLayout::ServicesObject => {
            to_json(&ServicesDocument { services: entries }, options.pretty)
        }
    }
}

/// Writes `entries` to `path`, replacing any existing file. The write is not
/// atomic.
///
/// # Errors
///
/// Returns [`CatalogError::Io`] if the file cannot be written.
pub fn write_catalog(
    path: &Path,
    entries: &[CatalogEntry],
    options: WriteOptions,
) -> Result<(), CatalogError> {
    let bytes = render_catalog(entries, options)?;
    std::fs::write(path, bytes).map_err(|source| CatalogError::Io {
        path: path.display().to_string(),
        source,
    })?;
    tracing::debug!(path = %path.display(), entries = entries.len(), "catalog written");
    Ok(())
}

fn to_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<Vec<u8>, CatalogError> {
    if !pretty {
        return Ok(serde_json::to_vec(value)?);
    }
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(buf)
}
