use thiserror::Error as ThisError;

/// Failure of an upstream request, independent of the HTTP client in use.
#[derive(ThisError, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("error sending request to {url}: {message}")]
    Transport { url: String, message: String },
    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: u16 },
    #[error("error reading body from {url}: {message}")]
    Body { url: String, message: String },
}

#[derive(ThisError, Debug)]
pub enum Error {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("failed to decode {source_name} payload: {error}")]
    Decode {
        source_name: &'static str,
        error: serde_json::Error,
    },
    #[error("station name {name:?} could not be repaired: {reason}")]
    Encoding { name: String, reason: String },
    #[error("asset path marker `{0}` not found in page")]
    AssetPathMissing(&'static str),
    #[error("failed to read hotspot csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("hotspot csv is missing columns: {0}")]
    MissingColumns(String),
    #[error("failed to serialize feature properties: {0}")]
    Serialize(serde_json::Error),
    #[error("invalid upstream url {0}")]
    InvalidUrl(String),
    #[error("failed to build http client: {0}")]
    Client(String),
}

impl Error {
    pub fn decode(source_name: &'static str, error: serde_json::Error) -> Self {
        Error::Decode { source_name, error }
    }
}
