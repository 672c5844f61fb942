use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("XML error in {context}: {source}")]
    Xml {
        context: String,
        #[source]
        source: quick_xml::Error,
    },

    #[error("malformed XML in {context}: {reason}")]
    MalformedXml { context: String, reason: String },

    #[error("unexpected document in {context}: root element <{found}>")]
    UnexpectedDocument { context: String, found: String },

    #[error("service exception from {context}: {message}")]
    ServiceException { context: String, message: String },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("pagination limit reached for {protocol} records: exceeded {max_pages} pages")]
    PaginationLimit { protocol: String, max_pages: usize },
}
