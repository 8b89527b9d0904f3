mod status;
mod store;

pub use status::{StoreStatus, TokenError, TokenErrorCode};
use thiserror::Error;

use crate::types::IdentityHandle;

/// Token模块的错误类型
#[derive(Error, Debug)]
pub enum Error {
    /// 存储查询错误
    #[error("Store error: {0}")]
    StoreError(#[from] StoreStatus),

    /// 令牌提供方错误
    #[error("Token error: {0}")]
    TokenError(#[from] TokenError),

    /// 无法取得身份的密钥
    #[error("Keys unavailable for identity {identity}: {reason}")]
    KeysUnavailable {
        identity: IdentityHandle,
        reason: String,
    },

    /// 身份导入错误
    #[error("Import error: {0}")]
    ImportError(String),

    #[error("Crypto error: {0}")]
    CryptoError(#[from] cardkey_crypto::Error),

    #[error("PKI error: {0}")]
    PkiError(#[from] cardkey_pki::PkiError),

    /// IO错误
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// 其他错误
    #[error("Other error: {0}")]
    Other(String),
}

/// Result类型别名
pub type Result<T> = std::result::Result<T, Error>;
