//! Runs a two-step key operation over candidate identities
//!
//! Candidates are tried in order. The run stops at the first confirmed
//! success or at the first failure.

use std::fmt;

use cardkey_crypto::{Algorithm, OperationType};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    executor::{self, OperationError},
    keys::{keys_from_identity, Identity},
    provider::Keychain,
    types::IdentityHandle,
};

/// 组合操作
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyOperation {
    SignAndVerify,
    EncryptAndDecrypt,
}

impl KeyOperation {
    pub fn name(&self) -> &'static str {
        match self {
            KeyOperation::SignAndVerify => "Sign and Verify",
            KeyOperation::EncryptAndDecrypt => "Encrypt and Decrypt",
        }
    }
}

impl fmt::Display for KeyOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Closed set of reasons an operation did not succeed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OperationFailure {
    /// The provider has to be launched before keys can be used again
    #[error("{0}")]
    ProviderLaunchNeeded(String),

    #[error("The message is not valid UTF-8")]
    BadInputData,

    #[error("Signing error: {0}")]
    SigningError(String),

    #[error("Signature verification failed")]
    VerificationError,

    #[error("Encryption error: {0}")]
    EncryptionError(String),

    #[error("Decryption error: {0}")]
    DecryptionError(String),

    #[error("Error retrieving keys: {0}")]
    ErrorRetrievingKeys(String),

    #[error("No identity selected")]
    NoIdentitySelected,
}

impl From<OperationError> for OperationFailure {
    fn from(error: OperationError) -> Self {
        match error {
            OperationError::ProviderCommunication(message) => {
                OperationFailure::ProviderLaunchNeeded(message)
            }
            OperationError::Signing(message) => OperationFailure::SigningError(message),
            OperationError::VerificationMismatch => OperationFailure::VerificationError,
            OperationError::Encryption(message) => OperationFailure::EncryptionError(message),
            OperationError::Decryption(message) => OperationFailure::DecryptionError(message),
            unsupported @ OperationError::AlgorithmUnsupported { operation, .. } => {
                let message = unsupported.to_string();
                match operation {
                    OperationType::Sign => OperationFailure::SigningError(message),
                    OperationType::Verify => OperationFailure::VerificationError,
                    OperationType::Encrypt => OperationFailure::EncryptionError(message),
                    OperationType::Decrypt => OperationFailure::DecryptionError(message),
                }
            }
        }
    }
}

/// Result of one orchestrated run
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Success {
        label: String,
        identity: IdentityHandle,
    },
    /// Every candidate finished without a labelled success
    Unconfirmed,
    Failed(OperationFailure),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn needs_provider_launch(&self) -> bool {
        matches!(self, Outcome::Failed(OperationFailure::ProviderLaunchNeeded(_)))
    }
}

/// Algorithms used by the two operations
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationOptions {
    pub sign_algorithm: Algorithm,
    pub encrypt_algorithm: Algorithm,
}

impl Default for OperationOptions {
    fn default() -> Self {
        Self {
            sign_algorithm: Algorithm::RsaSignatureMessagePkcs1v15Sha512,
            encrypt_algorithm: Algorithm::RsaEncryptionPkcs1,
        }
    }
}

/// 操作编排器
pub struct Orchestrator {
    keychain: Keychain,
    options: OperationOptions,
}

impl Orchestrator {
    pub fn new(keychain: Keychain) -> Self {
        Self::with_options(keychain, OperationOptions::default())
    }

    pub fn with_options(keychain: Keychain, options: OperationOptions) -> Self {
        Self { keychain, options }
    }

    pub fn options(&self) -> &OperationOptions {
        &self.options
    }

    /// Run `operation` on `message` with each candidate until one succeeds
    /// with a label or one fails.
    pub fn run(&self, operation: KeyOperation, candidates: &[Identity], message: &[u8]) -> Outcome {
        if candidates.is_empty() {
            warn!(%operation, "no identity to run the operation with");
            return Outcome::Failed(OperationFailure::NoIdentitySelected);
        }
        if std::str::from_utf8(message).is_err() {
            return Outcome::Failed(OperationFailure::BadInputData);
        }

        for identity in candidates {
            match self.perform_on(operation, identity, message) {
                Ok(()) => match identity.label() {
                    Some(label) => {
                        info!(%operation, identity = %identity.handle, %label, "operation succeeded");
                        return Outcome::Success {
                            label,
                            identity: identity.handle.clone(),
                        };
                    }
                    None => {
                        debug!(%operation, identity = %identity.handle, "succeeded without a common name");
                    }
                },
                Err(failure) => {
                    warn!(%operation, identity = %identity.handle, error = %failure, "operation failed");
                    return Outcome::Failed(failure);
                }
            }
        }

        warn!(%operation, "no candidate confirmed the operation");
        Outcome::Unconfirmed
    }

    /// Two-step operation with a single identity
    pub fn perform_on(
        &self,
        operation: KeyOperation,
        identity: &Identity,
        message: &[u8],
    ) -> Result<(), OperationFailure> {
        let pair = keys_from_identity(self.keychain.store(), identity)
            .map_err(|e| OperationFailure::ErrorRetrievingKeys(e.to_string()))?;
        let channel = self.keychain.channel();
        debug!(%operation, identity = %identity.handle, "running operation");

        match operation {
            KeyOperation::SignAndVerify => {
                let algorithm = self.options.sign_algorithm;
                let signature = executor::sign(channel, message, &pair.private_key, algorithm)?;
                executor::verify(message, &signature, &pair.public_key, algorithm)?;
            }
            KeyOperation::EncryptAndDecrypt => {
                let algorithm = self.options.encrypt_algorithm;
                let ciphertext = executor::encrypt(message, &pair.public_key, algorithm)?;
                let plaintext = executor::decrypt(channel, &ciphertext, &pair.private_key, algorithm)?;
                if plaintext != message {
                    return Err(OperationFailure::DecryptionError(
                        "Decryption failed".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}
