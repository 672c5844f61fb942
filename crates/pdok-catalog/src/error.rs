use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to write catalog file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize catalog: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid sort pattern \"{pattern}\" (rank {rank}): {source}")]
    InvalidPattern {
        pattern: String,
        rank: u32,
        #[source]
        source: regex::Error,
    },
}
