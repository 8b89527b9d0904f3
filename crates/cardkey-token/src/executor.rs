//! Sign, verify, encrypt and decrypt against key references
//!
//! Every operation checks that the algorithm fits the key before doing any
//! work, so an unsupported pair never reaches the provider.

use cardkey_crypto::{Algorithm, KeyType, OperationType, PublicKey};
use thiserror::Error;
use tracing::debug;

use crate::{
    error::TokenError,
    provider::ProviderChannel,
    types::PrivateKeyHandle,
};

/// 密码操作错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    #[error("Algorithm {algorithm} does not support {operation} with {} keys", .key_type.name())]
    AlgorithmUnsupported {
        operation: OperationType,
        algorithm: Algorithm,
        key_type: KeyType,
    },

    /// The provider must be brought to the foreground before retrying
    #[error("{0}")]
    ProviderCommunication(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Signature does not match the message")]
    VerificationMismatch,

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Decryption failed: {0}")]
    Decryption(String),
}

fn ensure_supported(
    algorithm: Algorithm,
    key_type: KeyType,
    operation: OperationType,
) -> Result<(), OperationError> {
    if algorithm.supports(key_type, operation) {
        return Ok(());
    }
    debug!(%algorithm, %operation, key_type = key_type.name(), "algorithm not supported");
    Err(OperationError::AlgorithmUnsupported {
        operation,
        algorithm,
        key_type,
    })
}

fn classify(error: TokenError, generic: fn(String) -> OperationError) -> OperationError {
    if error.is_communication_error() {
        OperationError::ProviderCommunication(error.message)
    } else {
        generic(error.to_string())
    }
}

pub fn sign(
    channel: &dyn ProviderChannel,
    data: &[u8],
    key: &PrivateKeyHandle,
    algorithm: Algorithm,
) -> Result<Vec<u8>, OperationError> {
    ensure_supported(algorithm, key.key_type, OperationType::Sign)?;
    channel
        .sign(key, algorithm, data)
        .map_err(|e| classify(e, OperationError::Signing))
}

pub fn verify(
    data: &[u8],
    signature: &[u8],
    public_key: &PublicKey,
    algorithm: Algorithm,
) -> Result<(), OperationError> {
    ensure_supported(algorithm, public_key.key_type(), OperationType::Verify)?;
    match public_key.verify(algorithm, data, signature) {
        Ok(true) => Ok(()),
        Ok(false) => Err(OperationError::VerificationMismatch),
        Err(e) => {
            debug!(error = %e, "signature could not be checked");
            Err(OperationError::VerificationMismatch)
        }
    }
}

pub fn encrypt(
    data: &[u8],
    public_key: &PublicKey,
    algorithm: Algorithm,
) -> Result<Vec<u8>, OperationError> {
    ensure_supported(algorithm, public_key.key_type(), OperationType::Encrypt)?;
    public_key
        .encrypt(algorithm, data)
        .map_err(|e| OperationError::Encryption(e.to_string()))
}

pub fn decrypt(
    channel: &dyn ProviderChannel,
    data: &[u8],
    key: &PrivateKeyHandle,
    algorithm: Algorithm,
) -> Result<Vec<u8>, OperationError> {
    ensure_supported(algorithm, key.key_type, OperationType::Decrypt)?;
    channel
        .decrypt(key, algorithm, data)
        .map_err(|e| classify(e, OperationError::Decryption))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cardkey_pki::{AuthorityConfig, CertificateAuthority, KeyAlgorithm};

    use super::*;
    use crate::{
        keys::{keys_from_identity, Identity},
        store::{SoftKeychain, SoftToken},
    };

    struct Fixture {
        token: Arc<SoftToken>,
        keychain: SoftKeychain,
        identity: Identity,
    }

    fn fixture() -> Fixture {
        let config = AuthorityConfig::default()
            .with_purposes("aes")
            .with_key_algorithms(KeyAlgorithm::P256, KeyAlgorithm::P256);
        let ca = CertificateAuthority::create(config).unwrap();
        let token = Arc::new(SoftToken::with_token_id("p:1"));
        let handle = token.import_issued(&ca.issue("user01").unwrap()[0]).unwrap();
        let keychain = SoftKeychain::new();
        keychain.add_token(token.clone()).unwrap();
        let identity = Identity::resolve(&keychain, &handle).unwrap();
        Fixture {
            token,
            keychain,
            identity,
        }
    }

    #[test]
    fn test_sign_and_verify_p256() {
        let f = fixture();
        let pair = keys_from_identity(&f.keychain, &f.identity).unwrap();
        let alg = Algorithm::EcdsaSignatureMessageX962Sha256;

        let signature = sign(&f.keychain, b"hello", &pair.private_key, alg).unwrap();
        assert!(verify(b"hello", &signature, &pair.public_key, alg).is_ok());
        assert_eq!(
            verify(b"hullo", &signature, &pair.public_key, alg),
            Err(OperationError::VerificationMismatch)
        );
    }

    #[test]
    fn test_unsupported_pairs_never_reach_provider() {
        let f = fixture();
        let pair = keys_from_identity(&f.keychain, &f.identity).unwrap();

        let err = sign(
            &f.keychain,
            b"hello",
            &pair.private_key,
            Algorithm::RsaSignatureMessagePkcs1v15Sha512,
        )
        .unwrap_err();
        assert!(matches!(err, OperationError::AlgorithmUnsupported { .. }));

        let err = decrypt(
            &f.keychain,
            b"data",
            &pair.private_key,
            Algorithm::EcdsaSignatureMessageX962Sha256,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            OperationError::AlgorithmUnsupported {
                operation: OperationType::Decrypt,
                ..
            }
        ));

        let err = encrypt(b"data", &pair.public_key, Algorithm::RsaEncryptionPkcs1).unwrap_err();
        assert!(matches!(err, OperationError::AlgorithmUnsupported { .. }));
        assert_eq!(f.token.request_count(), 0);
    }

    #[test]
    fn test_communication_error_is_classified() {
        let f = fixture();
        let pair = keys_from_identity(&f.keychain, &f.identity).unwrap();
        f.token.suspend();

        let err = sign(
            &f.keychain,
            b"hello",
            &pair.private_key,
            Algorithm::EcdsaSignatureMessageX962Sha256,
        )
        .unwrap_err();
        assert!(matches!(err, OperationError::ProviderCommunication(_)));
    }
}
