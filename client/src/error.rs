use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("reqwest error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("bad status code {code}: {body}")]
    BadStatusCode { code: u16, body: String },

    #[error("json decode error: {0}")]
    JsonDecode(#[from] serde_json::Error),

    #[error("bad url: {0}")]
    Url(#[from] url::ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Please select a file")]
    NoFileSelected,

    #[error("an upload is already in progress")]
    UploadInProgress,
}

pub type Result<T> = std::result::Result<T, ClientError>;
