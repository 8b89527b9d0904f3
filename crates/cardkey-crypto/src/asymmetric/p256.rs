use p256::{
    ecdsa::{signature::Signer, signature::Verifier, Signature, SigningKey, VerifyingKey},
    elliptic_curve::rand_core::OsRng,
    PublicKey, SecretKey,
};
use pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};

use crate::{
    algorithm::{Algorithm, KeyType},
    error::Result,
};

pub struct P256 {
    pub inner: SecretKey,
}

impl From<SecretKey> for P256 {
    fn from(value: SecretKey) -> Self {
        Self { inner: value }
    }
}

impl P256 {
    /// Generate a new P-256 key pair
    pub fn generate() -> Result<Self> {
        let secret_key = SecretKey::random(&mut OsRng);
        Ok(secret_key.into())
    }

    /// Import from PKCS8 DER format
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self> {
        let secret_key = SecretKey::from_pkcs8_der(der)?;
        Ok(secret_key.into())
    }

    /// Import from PKCS8 PEM format
    pub fn from_pkcs8_pem(pem: &str) -> Result<Self> {
        let secret_key = SecretKey::from_pkcs8_pem(pem)?;
        Ok(secret_key.into())
    }

    /// Export private key to PKCS8 DER format
    pub fn to_pkcs8_der(&self) -> Result<Vec<u8>> {
        let der = self.inner.to_pkcs8_der()?;
        Ok(der.as_bytes().to_vec())
    }

    /// Export private key to PKCS8 PEM format
    pub fn to_pkcs8_pem(&self) -> Result<String> {
        let pem = self.inner.to_pkcs8_pem(LineEnding::LF)?;
        Ok(pem.to_string())
    }

    /// Export public key to SPKI DER format
    pub fn to_spki_der(&self) -> Result<Vec<u8>> {
        let der = self.inner.public_key().to_public_key_der()?;
        Ok(der.as_bytes().to_vec())
    }

    pub fn public_key(&self) -> PublicKey {
        self.inner.public_key()
    }

    /// Sign data using ECDSA with SHA-256, returning an X9.62 DER signature
    pub fn sign(&self, algorithm: Algorithm, message: &[u8]) -> Result<Vec<u8>> {
        if algorithm != Algorithm::EcdsaSignatureMessageX962Sha256 {
            return Err(algorithm.mismatch(KeyType::P256));
        }
        let signing_key = SigningKey::from(&self.inner);
        let signature: Signature = signing_key.sign(message);
        Ok(signature.to_der().as_bytes().to_vec())
    }
}

/// Verify a P-256 ECDSA signature; undecodable signatures verify as `false`
pub fn verify(
    public_key: &PublicKey,
    algorithm: Algorithm,
    message: &[u8],
    signature: &[u8],
) -> Result<bool> {
    if algorithm != Algorithm::EcdsaSignatureMessageX962Sha256 {
        return Err(algorithm.mismatch(KeyType::P256));
    }
    let verifying_key = VerifyingKey::from(public_key);
    let signature = match Signature::from_der(signature) {
        Ok(sig) => sig,
        Err(_) => return Ok(false),
    };
    Ok(verifying_key.verify(message, &signature).is_ok())
}

/// Import public key from SPKI DER format
pub fn public_key_from_spki_der(der: &[u8]) -> Result<PublicKey> {
    PublicKey::from_public_key_der(der).map_err(Into::into)
}
