//! Asymmetric private keys
//!
//! `PrivateKey` wraps the concrete key families and dispatches operations
//! by algorithm. PKCS#8 imports detect the family from the algorithm OID.

pub mod p256;
pub mod rsa;

use std::convert::TryFrom;

use const_oid::ObjectIdentifier;
use pkcs8::{spki::der::asn1::AnyRef, PrivateKeyInfo};

pub use self::p256::P256;
pub use self::rsa::Rsa;
use crate::{
    algorithm::{Algorithm, KeyType},
    error::{Error, Result},
    public_key::PublicKey,
};

pub enum PrivateKey {
    Rsa(Rsa),
    P256(P256),
}

impl From<Rsa> for PrivateKey {
    fn from(value: Rsa) -> Self {
        PrivateKey::Rsa(value)
    }
}

impl From<P256> for PrivateKey {
    fn from(value: P256) -> Self {
        PrivateKey::P256(value)
    }
}

impl PrivateKey {
    /// 根据 PKCS#8 DER 数据加载私钥，自动识别 RSA / P-256
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self> {
        let info = PrivateKeyInfo::try_from(der)
            .map_err(|e| Error::UnsupportedKey(format!("Failed to parse PKCS#8: {e}")))?;

        match detect_key_type(info.algorithm.oid, info.algorithm.parameters)? {
            KeyType::Rsa => Ok(Rsa::from_pkcs8_der(der)?.into()),
            KeyType::P256 => Ok(P256::from_pkcs8_der(der)?.into()),
        }
    }

    pub fn to_pkcs8_der(&self) -> Result<Vec<u8>> {
        match self {
            PrivateKey::Rsa(key) => key.to_pkcs8_der(),
            PrivateKey::P256(key) => key.to_pkcs8_der(),
        }
    }

    pub fn to_pkcs8_pem(&self) -> Result<String> {
        match self {
            PrivateKey::Rsa(key) => key.to_pkcs8_pem(),
            PrivateKey::P256(key) => key.to_pkcs8_pem(),
        }
    }

    pub fn key_type(&self) -> KeyType {
        match self {
            PrivateKey::Rsa(_) => KeyType::Rsa,
            PrivateKey::P256(_) => KeyType::P256,
        }
    }

    pub fn size_bits(&self) -> usize {
        match self {
            PrivateKey::Rsa(key) => key.size(),
            PrivateKey::P256(_) => 256,
        }
    }

    pub fn public_key(&self) -> PublicKey {
        match self {
            PrivateKey::Rsa(key) => PublicKey::Rsa(key.public_key()),
            PrivateKey::P256(key) => PublicKey::P256(key.public_key()),
        }
    }

    pub fn sign(&self, algorithm: Algorithm, message: &[u8]) -> Result<Vec<u8>> {
        match self {
            PrivateKey::Rsa(key) => key.sign(algorithm, message),
            PrivateKey::P256(key) => key.sign(algorithm, message),
        }
    }

    pub fn decrypt(&self, algorithm: Algorithm, ciphertext: &[u8]) -> Result<Vec<u8>> {
        match self {
            PrivateKey::Rsa(key) => key.decrypt(algorithm, ciphertext),
            // P-256 has no encryption scheme here
            PrivateKey::P256(_) => Err(algorithm.mismatch(KeyType::P256)),
        }
    }
}

pub(crate) fn detect_key_type(
    oid: ObjectIdentifier,
    parameters: Option<AnyRef<'_>>,
) -> Result<KeyType> {
    if oid == const_oid::db::rfc5912::RSA_ENCRYPTION {
        return Ok(KeyType::Rsa);
    }

    if oid == const_oid::db::rfc5912::ID_EC_PUBLIC_KEY {
        let params = parameters.ok_or_else(|| {
            Error::UnsupportedKey("EC key is missing curve parameters".to_string())
        })?;
        let curve_oid = parse_curve_oid(params)?;
        if curve_oid == const_oid::db::rfc5912::SECP_256_R_1 {
            return Ok(KeyType::P256);
        }
        return Err(Error::UnsupportedKey(format!(
            "Unsupported EC curve OID: {curve_oid}"
        )));
    }

    Err(Error::UnsupportedKey(format!(
        "Unsupported key algorithm OID: {oid}"
    )))
}

fn parse_curve_oid(any: AnyRef<'_>) -> Result<ObjectIdentifier> {
    ObjectIdentifier::try_from(any)
        .map_err(|e| Error::UnsupportedKey(format!("Failed to parse curve OID: {e}")))
}
