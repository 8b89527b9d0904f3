//! User-facing messages for operation outcomes

use serde::Serialize;

use crate::{
    catalog::SelectionError,
    orchestrator::{KeyOperation, OperationFailure, Outcome},
};

pub const DEFAULT_LAUNCH_URL: &str = "vmwarepivd://";
pub const LAUNCH_ACTION: &str = "Open PIV-D";

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct UserPrompt {
    pub title: String,
    pub message: String,
    pub offer_provider_launch: bool,
    pub launch_url: Option<String>,
    pub action: Option<String>,
}

impl UserPrompt {
    fn plain(title: &str, message: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            message: message.into(),
            offer_provider_launch: false,
            launch_url: None,
            action: None,
        }
    }

    /// 将操作结果转换为提示
    pub fn for_outcome(
        operation: KeyOperation,
        message: &str,
        outcome: &Outcome,
        launch_url: &str,
    ) -> Self {
        match outcome {
            Outcome::Success { label, .. } => Self::plain(
                "Success",
                format!("{operation} successful for message: {message}\n using key: {label}"),
            ),
            Outcome::Unconfirmed => Self::plain(
                "Failed",
                format!(
                    "Please ensure a valid identity with {operation} capability is selected. \
                     Refer logs for more details"
                ),
            ),
            Outcome::Failed(OperationFailure::ProviderLaunchNeeded(reason)) => Self {
                title: "Access Suspended".to_string(),
                message: reason.clone(),
                offer_provider_launch: true,
                launch_url: Some(launch_url.to_string()),
                action: Some(LAUNCH_ACTION.to_string()),
            },
            Outcome::Failed(
                OperationFailure::SigningError(reason) | OperationFailure::DecryptionError(reason),
            ) => Self::plain("Error", reason.clone()),
            Outcome::Failed(failure) => Self::plain("Error", failure.to_string()),
        }
    }

    pub fn for_selection_error(error: &SelectionError) -> Self {
        Self::plain("Error", error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IdentityHandle;

    #[test]
    fn test_success_prompt() {
        let outcome = Outcome::Success {
            label: "user01@example.com".to_string(),
            identity: IdentityHandle {
                token_id: "p:1".to_string(),
                object_id: 1,
            },
        };
        let prompt = UserPrompt::for_outcome(
            KeyOperation::EncryptAndDecrypt,
            "hello",
            &outcome,
            DEFAULT_LAUNCH_URL,
        );
        assert_eq!(prompt.title, "Success");
        assert_eq!(
            prompt.message,
            "Encrypt and Decrypt successful for message: hello\n using key: user01@example.com"
        );
        assert!(!prompt.offer_provider_launch);
    }

    #[test]
    fn test_provider_launch_prompt() {
        let outcome = Outcome::Failed(OperationFailure::ProviderLaunchNeeded(
            "Provider not running".to_string(),
        ));
        let prompt =
            UserPrompt::for_outcome(KeyOperation::SignAndVerify, "hi", &outcome, "custom://");
        assert_eq!(prompt.title, "Access Suspended");
        assert!(prompt.offer_provider_launch);
        assert_eq!(prompt.launch_url.as_deref(), Some("custom://"));
        assert_eq!(prompt.action.as_deref(), Some(LAUNCH_ACTION));
    }

    #[test]
    fn test_unconfirmed_and_errors() {
        let prompt = UserPrompt::for_outcome(
            KeyOperation::SignAndVerify,
            "hi",
            &Outcome::Unconfirmed,
            DEFAULT_LAUNCH_URL,
        );
        assert_eq!(prompt.title, "Failed");
        assert!(prompt.message.starts_with(
            "Please ensure a valid identity with Sign and Verify capability is selected."
        ));

        let prompt = UserPrompt::for_outcome(
            KeyOperation::SignAndVerify,
            "hi",
            &Outcome::Failed(OperationFailure::SigningError("Key is locked".to_string())),
            DEFAULT_LAUNCH_URL,
        );
        assert_eq!(prompt.title, "Error");
        assert_eq!(prompt.message, "Key is locked");

        let prompt = UserPrompt::for_outcome(
            KeyOperation::EncryptAndDecrypt,
            "hi",
            &Outcome::Failed(OperationFailure::DecryptionError("Decryption failed".to_string())),
            DEFAULT_LAUNCH_URL,
        );
        assert_eq!(prompt.message, "Decryption failed");

        let prompt = UserPrompt::for_outcome(
            KeyOperation::SignAndVerify,
            "hi",
            &Outcome::Failed(OperationFailure::VerificationError),
            DEFAULT_LAUNCH_URL,
        );
        assert_eq!(prompt.message, "Signature verification failed");

        let prompt = UserPrompt::for_selection_error(&SelectionError::Empty);
        assert_eq!(
            prompt.message,
            "Select atleast one certificate to perform the operation."
        );
    }
}
