use std::time::{SystemTime, UNIX_EPOCH};

use cardkey_crypto::{KeyType, PublicKey};
use const_oid::{
    db::{rfc4519, rfc5280},
    ObjectIdentifier,
};
use der::{
    asn1::{Ia5StringRef, PrintableStringRef, Utf8StringRef},
    Any, Decode, Encode, Tag, Tagged,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use x509_cert::{
    ext::pkix::{name::GeneralName, ExtendedKeyUsage as EkuExtension, KeyUsage as KuExtension, SubjectAltName},
    name::Name,
    time::Time,
};

use crate::{
    error::{PkiError, Result},
    purpose::{ExtendedKeyUsage, KeyUsage},
};

/// 已解析的X.509证书，同时保留原始DER
#[derive(Debug, Clone)]
pub struct Certificate {
    der: Vec<u8>,
    inner: x509_cert::Certificate,
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for Certificate {}

impl Certificate {
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let inner = x509_cert::Certificate::from_der(der)
            .map_err(|e| PkiError::ParseError(format!("Failed to parse DER: {e}")))?;
        Ok(Self {
            der: der.to_vec(),
            inner,
        })
    }

    pub fn from_pem(pem_data: &[u8]) -> Result<Self> {
        let pem = pem::parse(pem_data)
            .map_err(|e| PkiError::ParseError(format!("Failed to parse PEM: {e}")))?;
        if pem.tag() != "CERTIFICATE" {
            return Err(PkiError::ParseError(format!(
                "Unexpected PEM label: {}",
                pem.tag()
            )));
        }
        Self::from_der(pem.contents())
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    pub fn to_pem(&self) -> String {
        pem::encode(&pem::Pem::new("CERTIFICATE", self.der.clone()))
    }

    pub fn x509(&self) -> &x509_cert::Certificate {
        &self.inner
    }

    /// Subject common name, `None` when the subject carries no readable CN
    pub fn common_name(&self) -> Option<String> {
        name_attribute(&self.inner.tbs_certificate.subject)
    }

    pub fn issuer_common_name(&self) -> Option<String> {
        name_attribute(&self.inner.tbs_certificate.issuer)
    }

    pub fn subject(&self) -> String {
        self.inner.tbs_certificate.subject.to_string()
    }

    pub fn issuer(&self) -> String {
        self.inner.tbs_certificate.issuer.to_string()
    }

    pub fn serial_hex(&self) -> String {
        hex::encode(self.inner.tbs_certificate.serial_number.as_bytes())
    }

    pub fn fingerprint_sha256(&self) -> String {
        hex::encode(Sha256::digest(&self.der))
    }

    pub fn is_ca(&self) -> bool {
        self.inner
            .tbs_certificate
            .get::<x509_cert::ext::pkix::BasicConstraints>()
            .ok()
            .flatten()
            .map(|(_, bc)| bc.ca)
            .unwrap_or(false)
    }

    /// Key usage bits, `None` when the certificate has no key usage extension
    pub fn key_usages(&self) -> Result<Option<Vec<KeyUsage>>> {
        let ext = self
            .inner
            .tbs_certificate
            .get::<KuExtension>()
            .map_err(|e| PkiError::ParseError(format!("Bad key usage extension: {e}")))?;

        Ok(ext.map(|(_, ku)| {
            let flags = [
                (ku.digital_signature(), KeyUsage::DigitalSignature),
                (ku.non_repudiation(), KeyUsage::NonRepudiation),
                (ku.key_encipherment(), KeyUsage::KeyEncipherment),
                (ku.data_encipherment(), KeyUsage::DataEncipherment),
                (ku.key_agreement(), KeyUsage::KeyAgreement),
                (ku.key_cert_sign(), KeyUsage::KeyCertSign),
                (ku.crl_sign(), KeyUsage::CrlSign),
                (ku.encipher_only(), KeyUsage::EncipherOnly),
                (ku.decipher_only(), KeyUsage::DecipherOnly),
            ];
            flags
                .into_iter()
                .filter_map(|(set, usage)| set.then_some(usage))
                .collect()
        }))
    }

    pub fn extended_key_usages(&self) -> Result<Vec<ExtendedKeyUsage>> {
        let ext = self
            .inner
            .tbs_certificate
            .get::<EkuExtension>()
            .map_err(|e| PkiError::ParseError(format!("Bad extended key usage extension: {e}")))?;

        let Some((_, eku)) = ext else {
            return Ok(Vec::new());
        };

        Ok(eku.0.iter().map(extended_key_usage).collect())
    }

    /// RFC 822 names from the subject alternative name extension
    pub fn email_addresses(&self) -> Result<Vec<String>> {
        let ext = self
            .inner
            .tbs_certificate
            .get::<SubjectAltName>()
            .map_err(|e| PkiError::ParseError(format!("Bad subject alternative name: {e}")))?;

        Ok(ext
            .map(|(_, san)| {
                san.0
                    .iter()
                    .filter_map(|name| match name {
                        GeneralName::Rfc822Name(email) => Some(email.to_string()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    pub fn public_key(&self) -> Result<PublicKey> {
        let spki = self
            .inner
            .tbs_certificate
            .subject_public_key_info
            .to_der()
            .map_err(|e| PkiError::ParseError(format!("Failed to encode SPKI: {e}")))?;
        Ok(PublicKey::from_spki_der(&spki)?)
    }

    pub fn not_before(&self) -> u64 {
        unix_seconds(&self.inner.tbs_certificate.validity.not_before)
    }

    pub fn not_after(&self) -> u64 {
        unix_seconds(&self.inner.tbs_certificate.validity.not_after)
    }

    pub fn is_currently_valid(&self) -> bool {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        self.not_before() <= now && now <= self.not_after()
    }

    /// 证书摘要
    pub fn info(&self) -> Result<CertificateInfo> {
        let public_key = self.public_key()?;
        Ok(CertificateInfo {
            common_name: self.common_name(),
            subject: self.subject(),
            issuer: self.issuer(),
            serial_number: self.serial_hex(),
            not_before: self.not_before(),
            not_after: self.not_after(),
            key_type: public_key.key_type(),
            key_size_bits: public_key.size_bits(),
            key_usages: self.key_usages()?,
            extended_key_usages: self.extended_key_usages()?,
            email_addresses: self.email_addresses()?,
            fingerprint_sha256: self.fingerprint_sha256(),
            is_ca: self.is_ca(),
        })
    }
}

/// 证书信息结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateInfo {
    pub common_name: Option<String>,
    pub subject: String,
    pub issuer: String,
    /// 序列号（十六进制）
    pub serial_number: String,
    /// 生效时间（Unix秒）
    pub not_before: u64,
    /// 失效时间（Unix秒）
    pub not_after: u64,
    pub key_type: KeyType,
    pub key_size_bits: usize,
    /// `None` 表示证书没有密钥用途扩展
    pub key_usages: Option<Vec<KeyUsage>>,
    pub extended_key_usages: Vec<ExtendedKeyUsage>,
    pub email_addresses: Vec<String>,
    pub fingerprint_sha256: String,
    pub is_ca: bool,
}

fn name_attribute(name: &Name) -> Option<String> {
    name.0
        .iter()
        .flat_map(|rdn| rdn.0.iter())
        .find(|atv| atv.oid == rfc4519::CN)
        .and_then(|atv| directory_string(&atv.value))
}

fn directory_string(value: &Any) -> Option<String> {
    match value.tag() {
        Tag::Utf8String => value
            .decode_as::<Utf8StringRef<'_>>()
            .ok()
            .map(|s| s.to_string()),
        Tag::PrintableString => value
            .decode_as::<PrintableStringRef<'_>>()
            .ok()
            .map(|s| s.to_string()),
        Tag::Ia5String => value
            .decode_as::<Ia5StringRef<'_>>()
            .ok()
            .map(|s| s.to_string()),
        _ => None,
    }
}

fn extended_key_usage(oid: &ObjectIdentifier) -> ExtendedKeyUsage {
    let known = [
        (rfc5280::ID_KP_SERVER_AUTH, ExtendedKeyUsage::ServerAuth),
        (rfc5280::ID_KP_CLIENT_AUTH, ExtendedKeyUsage::ClientAuth),
        (rfc5280::ID_KP_CODE_SIGNING, ExtendedKeyUsage::CodeSigning),
        (rfc5280::ID_KP_EMAIL_PROTECTION, ExtendedKeyUsage::EmailProtection),
        (rfc5280::ID_KP_TIME_STAMPING, ExtendedKeyUsage::TimeStamping),
        (rfc5280::ID_KP_OCSP_SIGNING, ExtendedKeyUsage::OcspSigning),
    ];
    known
        .into_iter()
        .find(|(known_oid, _)| known_oid == oid)
        .map(|(_, usage)| usage)
        .unwrap_or_else(|| ExtendedKeyUsage::Other(oid.to_string()))
}

fn unix_seconds(time: &Time) -> u64 {
    time.to_unix_duration().as_secs()
}
