//! Status codes reported by identity stores and token providers

use std::fmt;

use thiserror::Error;

/// 密钥链查询状态码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreStatus {
    ItemNotFound,
    InteractionNotAllowed,
    MissingEntitlement,
    Param,
    Other(i32),
}

impl StoreStatus {
    pub fn code(&self) -> i32 {
        match self {
            StoreStatus::ItemNotFound => -25300,
            StoreStatus::InteractionNotAllowed => -25308,
            StoreStatus::MissingEntitlement => -34018,
            StoreStatus::Param => -50,
            StoreStatus::Other(code) => *code,
        }
    }

    pub fn from_code(code: i32) -> Self {
        match code {
            -25300 => StoreStatus::ItemNotFound,
            -25308 => StoreStatus::InteractionNotAllowed,
            -34018 => StoreStatus::MissingEntitlement,
            -50 => StoreStatus::Param,
            other => StoreStatus::Other(other),
        }
    }

    /// Human-readable message for logs
    pub fn message(&self) -> String {
        match self {
            StoreStatus::ItemNotFound => {
                "The specified item could not be found in the keychain.".to_string()
            }
            StoreStatus::InteractionNotAllowed => "User interaction is not allowed.".to_string(),
            StoreStatus::MissingEntitlement => {
                "A required entitlement isn't present.".to_string()
            }
            StoreStatus::Param => {
                "One or more parameters passed to a function were not valid.".to_string()
            }
            StoreStatus::Other(code) => format!("Unknown store status {code}."),
        }
    }
}

impl fmt::Display for StoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (OSStatus {})", self.message(), self.code())
    }
}

impl std::error::Error for StoreStatus {}

/// 令牌错误码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenErrorCode {
    NotImplemented,
    /// The provider is not reachable and has to be brought to the foreground
    CommunicationError,
    CorruptedData,
    CanceledByUser,
    AuthenticationFailed,
    ObjectNotFound,
    TokenNotFound,
    BadParameter,
    AuthenticationNeeded,
}

impl TokenErrorCode {
    pub fn code(&self) -> i32 {
        match self {
            TokenErrorCode::NotImplemented => -1,
            TokenErrorCode::CommunicationError => -2,
            TokenErrorCode::CorruptedData => -3,
            TokenErrorCode::CanceledByUser => -4,
            TokenErrorCode::AuthenticationFailed => -5,
            TokenErrorCode::ObjectNotFound => -6,
            TokenErrorCode::TokenNotFound => -7,
            TokenErrorCode::BadParameter => -8,
            TokenErrorCode::AuthenticationNeeded => -9,
        }
    }
}

/// Error returned by a provider channel
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (token error {})", .code.code())]
pub struct TokenError {
    pub code: TokenErrorCode,
    pub message: String,
}

impl TokenError {
    pub fn new(code: TokenErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn communication(message: impl Into<String>) -> Self {
        Self::new(TokenErrorCode::CommunicationError, message)
    }

    pub fn is_communication_error(&self) -> bool {
        self.code == TokenErrorCode::CommunicationError
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_round_trip() {
        for status in [
            StoreStatus::ItemNotFound,
            StoreStatus::InteractionNotAllowed,
            StoreStatus::MissingEntitlement,
            StoreStatus::Param,
            StoreStatus::Other(-4),
        ] {
            assert_eq!(StoreStatus::from_code(status.code()), status);
        }
    }

    #[test]
    fn test_display_includes_message() {
        let text = StoreStatus::ItemNotFound.to_string();
        assert!(text.contains("could not be found"));
        assert!(text.contains("-25300"));

        let err = TokenError::communication("provider asleep");
        assert!(err.is_communication_error());
        assert_eq!(err.to_string(), "provider asleep (token error -2)");
    }
}
