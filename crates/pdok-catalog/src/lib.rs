//! Offline stages of the catalog spider: joining resolved services to their
//! catalog records, flattening capabilities into catalog entries, ordering
//! them for presentation, and writing the JSON catalog file.

pub mod error;
pub mod flatten;
pub mod join;
pub mod sort;
pub mod writer;

pub use error::CatalogError;
pub use flatten::{flatten_service, flatten_services};
pub use join::{dedup_by_url, join_and_dedup, join_by_md_id};
pub use sort::{sort_entries, SortTable};
pub use writer::{render_catalog, write_catalog, OutputLayout, WriteOptions};
