//! Public halves of token keys, as published in certificates

use std::convert::TryFrom;

use pkcs8::{spki::SubjectPublicKeyInfoRef, EncodePublicKey};
use rsa::{traits::PublicKeyParts, RsaPublicKey};
use sha2::{Digest, Sha256};

use crate::{
    algorithm::{Algorithm, KeyType},
    asymmetric::{self, detect_key_type},
    error::{Error, Result},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKey {
    Rsa(RsaPublicKey),
    P256(p256::PublicKey),
}

impl PublicKey {
    /// Parse a SubjectPublicKeyInfo DER structure
    pub fn from_spki_der(der: &[u8]) -> Result<Self> {
        let spki = SubjectPublicKeyInfoRef::try_from(der)?;

        match detect_key_type(spki.algorithm.oid, spki.algorithm.parameters)? {
            KeyType::Rsa => Ok(PublicKey::Rsa(asymmetric::rsa::public_key_from_spki_der(
                der,
            )?)),
            KeyType::P256 => Ok(PublicKey::P256(
                asymmetric::p256::public_key_from_spki_der(der)?,
            )),
        }
    }

    pub fn to_spki_der(&self) -> Result<Vec<u8>> {
        let der = match self {
            PublicKey::Rsa(key) => key.to_public_key_der()?,
            PublicKey::P256(key) => key.to_public_key_der()?,
        };
        Ok(der.as_bytes().to_vec())
    }

    pub fn key_type(&self) -> KeyType {
        match self {
            PublicKey::Rsa(_) => KeyType::Rsa,
            PublicKey::P256(_) => KeyType::P256,
        }
    }

    pub fn size_bits(&self) -> usize {
        match self {
            PublicKey::Rsa(key) => key.size() * 8,
            PublicKey::P256(_) => 256,
        }
    }

    /// SHA-256 over the SPKI DER encoding
    pub fn fingerprint(&self) -> Result<[u8; 32]> {
        let spki = self.to_spki_der()?;
        Ok(Sha256::digest(&spki).into())
    }

    pub fn verify(&self, algorithm: Algorithm, message: &[u8], signature: &[u8]) -> Result<bool> {
        match self {
            PublicKey::Rsa(key) => asymmetric::rsa::verify(key, algorithm, message, signature),
            PublicKey::P256(key) => asymmetric::p256::verify(key, algorithm, message, signature),
        }
    }

    pub fn encrypt(&self, algorithm: Algorithm, plaintext: &[u8]) -> Result<Vec<u8>> {
        match self {
            PublicKey::Rsa(key) => asymmetric::rsa::encrypt(key, algorithm, plaintext),
            PublicKey::P256(_) => Err(Error::AlgorithmMismatch {
                algorithm,
                key_type: KeyType::P256,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asymmetric::P256;

    #[test]
    fn test_spki_roundtrip_keeps_identity() {
        let key = P256::generate().unwrap();
        let spki = key.to_spki_der().unwrap();

        let public = PublicKey::from_spki_der(&spki).unwrap();
        assert_eq!(public.key_type(), KeyType::P256);
        assert_eq!(public.size_bits(), 256);
        assert_eq!(public.to_spki_der().unwrap(), spki);
        assert_eq!(
            public.fingerprint().unwrap(),
            <[u8; 32]>::from(Sha256::digest(&spki))
        );
    }

    #[test]
    fn test_verify_through_public_key() {
        let key = P256::generate().unwrap();
        let alg = Algorithm::EcdsaSignatureMessageX962Sha256;
        let signature = key.sign(alg, b"payload").unwrap();

        let public = PublicKey::P256(key.public_key());
        assert!(public.verify(alg, b"payload", &signature).unwrap());
        assert!(public.encrypt(Algorithm::RsaEncryptionPkcs1, b"x").is_err());
    }
}
