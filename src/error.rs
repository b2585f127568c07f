use thiserror::Error;

#[derive(Error, Debug)]
pub enum CciError {
    #[error("{0}")]
    Config(String),

    #[error("no branch provided")]
    NoBranchSpecified,

    #[error("response error: {status}: {body:?}")]
    ApiError { status: u16, body: String },

    #[error("JSON decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("no pipelines for branch: {0}")]
    NoPipelines(String),

    #[error("operation cancelled by interrupt")]
    Cancelled,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, CciError>;
