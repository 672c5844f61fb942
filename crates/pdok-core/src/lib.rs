//! Shared data model and configuration for the PDOK catalog spider.

pub mod app_config;
pub mod config;
pub mod model;
pub mod protocol;
pub mod sort_rules;

use thiserror::Error;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use model::{
    CatalogEntry, CatalogRecordRef, EntryDetail, LayerDescriptor, LayerDetail, ResolvedService,
    ServiceCapabilities,
};
pub use protocol::Protocol;
pub use sort_rules::{default_sort_rules, load_sort_rules, SortRule, SortRulesFile};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown protocol \"{0}\"; expected one of wms, wfs, wcs, wmts")]
    UnknownProtocol(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read sort rules file {path}: {source}")]
    SortRulesIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse sort rules file: {0}")]
    SortRulesParse(#[from] serde_yaml::Error),

    #[error("sort rules validation failed: {0}")]
    Validation(String),
}
