use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomError {
    #[error("Unexpected end of HTML input while reading {0}")]
    UnexpectedEof(&'static str),
    #[error("Mismatched closing tag </{found}> at byte {offset}")]
    MismatchedClose { found: String, offset: usize },
    #[error("Remote element {handle} is gone")]
    StaleHandle { handle: String },
    #[error("Remote element {handle} failed: {message}")]
    Remote { handle: String, message: String },
    #[error("Remote transport failed: {0}")]
    Transport(String),
    #[error("Remote protocol error: {0}")]
    Protocol(#[from] serde_json::Error),
    #[error("Unexpected remote response to {request}: {response}")]
    UnexpectedResponse { request: String, response: String },
}
