use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Token error: {0}")]
    Token(#[from] cardkey_token::Error),

    #[error("Crypto error: {0}")]
    Crypto(#[from] cardkey_crypto::Error),

    #[error("PKI error: {0}")]
    Pki(#[from] cardkey_pki::PkiError),

    #[error("Selection error: {0}")]
    Selection(#[from] cardkey_token::SelectionError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type CliResult<T> = Result<T, CliError>;
