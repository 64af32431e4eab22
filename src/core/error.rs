use std::io;
use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum SquatError {
    #[error("input file not found or not readable: {0}")]
    InputNotFound(PathBuf),
    #[error("feed download failed: {0}")]
    FeedDownload(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("timeout")]
    Timeout,
    #[error("http error: {0}")]
    Http(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("output error: {0}")]
    Output(String),
    #[error("task error: {0}")]
    Task(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<reqwest::Error> for SquatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SquatError::Timeout
        } else if err.is_connect() {
            SquatError::Network(err.to_string())
        } else if err.is_status() {
            SquatError::Http(err.to_string())
        } else {
            SquatError::Network(err.to_string())
        }
    }
}
