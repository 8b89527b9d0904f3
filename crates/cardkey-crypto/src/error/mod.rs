use thiserror::Error;

use crate::algorithm::{Algorithm, KeyType};

/// Crypto模块的错误类型
#[derive(Error, Debug)]
pub enum Error {
    #[error("PKCS8 error: {0}")]
    Pkcs8Error(#[from] pkcs8::Error),

    #[error("SPKI error: {0}")]
    SpkiError(#[from] pkcs8::spki::Error),

    #[error("DER error: {0}")]
    DerError(#[from] pkcs8::der::Error),

    #[error("RSA error: {0}")]
    RsaError(#[from] rsa::Error),

    /// 密钥类型不受支持
    #[error("Unsupported key: {0}")]
    UnsupportedKey(String),

    /// 算法与密钥类型不匹配
    #[error("Algorithm {algorithm} cannot be used with a {key_type} key")]
    AlgorithmMismatch {
        algorithm: Algorithm,
        key_type: KeyType,
    },

    /// 其他错误
    #[error("Other error: {0}")]
    Other(String),
}

/// Result类型别名
pub type Result<T> = std::result::Result<T, Error>;
