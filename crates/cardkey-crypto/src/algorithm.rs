//! Algorithm identifiers for token-backed key operations
//!
//! Every algorithm is bound to exactly one key type and to either the
//! signature pair (sign/verify) or the encryption pair (encrypt/decrypt).

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Asymmetric key families a token can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyType {
    /// RSA of any modulus size
    Rsa,
    /// NIST P-256 (secp256r1)
    P256,
}

impl KeyType {
    pub fn name(&self) -> &'static str {
        match self {
            KeyType::Rsa => "RSA",
            KeyType::P256 => "P-256",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The four primitive operations a key can be asked to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationType {
    Sign,
    Verify,
    Encrypt,
    Decrypt,
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationType::Sign => "sign",
            OperationType::Verify => "verify",
            OperationType::Encrypt => "encrypt",
            OperationType::Decrypt => "decrypt",
        };
        f.write_str(name)
    }
}

/// Supported signature and encryption algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    /// RSA PKCS#1 v1.5 signature over the SHA-256 digest of the message
    RsaSignatureMessagePkcs1v15Sha256,
    /// RSA PKCS#1 v1.5 signature over the SHA-512 digest of the message
    RsaSignatureMessagePkcs1v15Sha512,
    /// RSASSA-PSS with SHA-256 and a digest-sized salt
    RsaSignatureMessagePssSha256,
    /// ECDSA P-256 with SHA-256, DER (X9.62) encoded signature
    EcdsaSignatureMessageX962Sha256,
    /// RSAES PKCS#1 v1.5
    RsaEncryptionPkcs1,
    /// RSAES-OAEP with SHA-256
    RsaEncryptionOaepSha256,
}

impl Algorithm {
    pub const ALL: [Algorithm; 6] = [
        Algorithm::RsaSignatureMessagePkcs1v15Sha256,
        Algorithm::RsaSignatureMessagePkcs1v15Sha512,
        Algorithm::RsaSignatureMessagePssSha256,
        Algorithm::EcdsaSignatureMessageX962Sha256,
        Algorithm::RsaEncryptionPkcs1,
        Algorithm::RsaEncryptionOaepSha256,
    ];

    /// Stable name, identical to the serde representation
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::RsaSignatureMessagePkcs1v15Sha256 => "rsa-signature-message-pkcs1v15-sha256",
            Algorithm::RsaSignatureMessagePkcs1v15Sha512 => "rsa-signature-message-pkcs1v15-sha512",
            Algorithm::RsaSignatureMessagePssSha256 => "rsa-signature-message-pss-sha256",
            Algorithm::EcdsaSignatureMessageX962Sha256 => "ecdsa-signature-message-x962-sha256",
            Algorithm::RsaEncryptionPkcs1 => "rsa-encryption-pkcs1",
            Algorithm::RsaEncryptionOaepSha256 => "rsa-encryption-oaep-sha256",
        }
    }

    /// The only key type this algorithm can run with
    pub fn key_type(&self) -> KeyType {
        match self {
            Algorithm::EcdsaSignatureMessageX962Sha256 => KeyType::P256,
            _ => KeyType::Rsa,
        }
    }

    pub fn is_signature(&self) -> bool {
        matches!(
            self,
            Algorithm::RsaSignatureMessagePkcs1v15Sha256
                | Algorithm::RsaSignatureMessagePkcs1v15Sha512
                | Algorithm::RsaSignatureMessagePssSha256
                | Algorithm::EcdsaSignatureMessageX962Sha256
        )
    }

    pub fn is_encryption(&self) -> bool {
        !self.is_signature()
    }

    /// Compatibility check run before any key operation is attempted
    pub fn supports(&self, key_type: KeyType, operation: OperationType) -> bool {
        if self.key_type() != key_type {
            return false;
        }
        match operation {
            OperationType::Sign | OperationType::Verify => self.is_signature(),
            OperationType::Encrypt | OperationType::Decrypt => self.is_encryption(),
        }
    }

    pub(crate) fn mismatch(&self, key_type: KeyType) -> Error {
        Error::AlgorithmMismatch {
            algorithm: *self,
            key_type,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Algorithm::ALL
            .iter()
            .copied()
            .find(|alg| alg.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Other(format!("Unknown algorithm: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_algorithms_only_sign_and_verify() {
        let alg = Algorithm::RsaSignatureMessagePkcs1v15Sha512;
        assert!(alg.supports(KeyType::Rsa, OperationType::Sign));
        assert!(alg.supports(KeyType::Rsa, OperationType::Verify));
        assert!(!alg.supports(KeyType::Rsa, OperationType::Encrypt));
        assert!(!alg.supports(KeyType::Rsa, OperationType::Decrypt));
    }

    #[test]
    fn test_key_type_must_match() {
        for alg in Algorithm::ALL {
            let other = match alg.key_type() {
                KeyType::Rsa => KeyType::P256,
                KeyType::P256 => KeyType::Rsa,
            };
            for op in [
                OperationType::Sign,
                OperationType::Verify,
                OperationType::Encrypt,
                OperationType::Decrypt,
            ] {
                assert!(!alg.supports(other, op), "{alg} accepted a {other} key");
            }
        }
    }

    #[test]
    fn test_ecdsa_cannot_encrypt() {
        let alg = Algorithm::EcdsaSignatureMessageX962Sha256;
        assert!(alg.supports(KeyType::P256, OperationType::Sign));
        assert!(!alg.supports(KeyType::P256, OperationType::Encrypt));
    }

    #[test]
    fn test_name_parses_back() {
        for alg in Algorithm::ALL {
            assert_eq!(alg.name().parse::<Algorithm>().unwrap(), alg);
        }
        assert!("rsa-encryption-raw".parse::<Algorithm>().is_err());
    }

    #[test]
    fn test_serde_name_matches_display() {
        for alg in Algorithm::ALL {
            let json = serde_json::to_string(&alg).unwrap();
            assert_eq!(json, format!("\"{}\"", alg.name()));
        }
    }
}
