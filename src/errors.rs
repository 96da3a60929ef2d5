// errors.rs

/// Errors from the record store, the local cache, or bad caller input.
#[derive(thiserror::Error, Debug)]
pub enum CrmError {
    /// The remote store answered with a non-success status.
    #[error("record store {operation} failed: {status} {body}")]
    Remote {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("{context}: {source}")]
    Transport {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("local cache error: {0}")]
    Cache(#[from] rusqlite::Error),

    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CrmError {
    pub fn transport(context: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            context: context.into(),
            source,
        }
    }

    /// HTTP status the JSON adapter answers with.
    pub fn status_code(&self) -> u16 {
        match self {
            CrmError::NotFound(_) => 404,
            CrmError::BadRequest(_) | CrmError::Config(_) => 400,
            CrmError::Remote { .. } | CrmError::Transport { .. } => 502,
            CrmError::Cache(_)
            | CrmError::Decode(_)
            | CrmError::InvalidUrl(_)
            | CrmError::Internal(_) => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, CrmError>;
