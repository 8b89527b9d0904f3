use super::Error;
use crate::types::IdentityHandle;

/// 存储相关的错误扩展
impl Error {
    /// 密钥不可用
    pub fn keys_unavailable(identity: &IdentityHandle, reason: impl std::fmt::Display) -> Self {
        Error::KeysUnavailable {
            identity: identity.clone(),
            reason: reason.to_string(),
        }
    }

    /// 证书与私钥不匹配
    pub fn key_mismatch(subject: impl std::fmt::Display) -> Self {
        Error::ImportError(format!(
            "Private key does not match the certificate public key for {subject}"
        ))
    }

    /// 锁错误
    pub fn lock_error(msg: impl std::fmt::Display) -> Self {
        Error::Other(format!("Lock error: {}", msg))
    }
}
