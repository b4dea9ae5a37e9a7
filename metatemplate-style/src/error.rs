use thiserror::Error;

#[derive(Debug, Error)]
pub enum StyleError {
    #[error("CSS syntax error at line {line}: {message} in `{snippet}`")]
    Syntax {
        line: u32,
        message: String,
        snippet: String,
    },
}
