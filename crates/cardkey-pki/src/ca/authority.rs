//! 测试证书颁发机构
//!
//! Issues a self-signed authority and client identities whose key usages
//! follow the configured certificate purposes.

use std::{
    fs,
    path::{Path, PathBuf},
};

use cardkey_crypto::{PrivateKey, Rsa};
use rand::RngCore;
use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, DnValue, Ia5String, IsCa,
    KeyPair, KeyUsagePurpose, PrintableString, SanType, PKCS_ECDSA_P256_SHA256, PKCS_RSA_SHA256,
};
use time::{Duration, OffsetDateTime};
use tracing::{debug, info};

use super::config::{AuthorityConfig, KeyAlgorithm};
use crate::{
    cert::{encode_pem, Certificate},
    error::{PkiError, Result},
    purpose::CertificatePurpose,
};

/// OID of the PKCS#9 emailAddress attribute
const EMAIL_ADDRESS_ARCS: [u64; 7] = [1, 2, 840, 113549, 1, 9, 1];

pub struct CertificateAuthority {
    config: AuthorityConfig,
    purposes: Vec<Vec<CertificatePurpose>>,
    key: KeyPair,
    cert: rcgen::Certificate,
    certificate: Certificate,
    private_key_der: Vec<u8>,
}

/// A client certificate together with its PKCS#8 private key
#[derive(Debug, Clone)]
pub struct IssuedIdentity {
    pub client_name: String,
    pub email: String,
    /// File name stem, e.g. `user01_Auth` or `user01` for the default purposes
    pub stem: String,
    pub purposes: Vec<CertificatePurpose>,
    pub certificate: Certificate,
    pub private_key_der: Vec<u8>,
}

impl IssuedIdentity {
    pub fn private_key(&self) -> Result<PrivateKey> {
        Ok(PrivateKey::from_pkcs8_der(&self.private_key_der)?)
    }

    /// 写入 `<stem>.cer.pem` 和 `<stem>.key.pem`
    pub fn write_to(&self, dir: impl AsRef<Path>) -> Result<(PathBuf, PathBuf)> {
        write_pair(
            dir.as_ref(),
            &self.stem,
            self.certificate.der(),
            &self.private_key_der,
        )
    }
}

impl CertificateAuthority {
    /// 创建自签名CA
    pub fn create(config: AuthorityConfig) -> Result<Self> {
        let parse = config.validate()?;
        let (key, private_key_der) = generate_key(config.key_algorithm)?;

        let mut params = CertificateParams::default();
        params.distinguished_name = distinguished_name(&config, &config.common_name(), None)?;
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.key_usages = vec![
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::CrlSign,
            KeyUsagePurpose::DigitalSignature,
        ];
        set_validity(&mut params, config.validity_days);

        let cert = params
            .self_signed(&key)
            .map_err(|e| PkiError::GenerationError(format!("Failed to create authority: {e}")))?;
        let certificate = Certificate::from_der(cert.der())?;

        info!(
            common_name = %config.common_name(),
            certificates_per_client = parse.certificates.len(),
            "created certificate authority"
        );

        Ok(Self {
            purposes: parse.certificates,
            config,
            key,
            cert,
            certificate,
            private_key_der,
        })
    }

    pub fn config(&self) -> &AuthorityConfig {
        &self.config
    }

    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    /// Purpose sets issued for every client
    pub fn purposes(&self) -> &[Vec<CertificatePurpose>] {
        &self.purposes
    }

    /// Split a client specifier into a name and an email address.
    ///
    /// An email address keeps its local part as the name. Anything else is
    /// the name, and the email is composed with the configured domain.
    pub fn client_name_and_email(&self, client: &str) -> (String, String) {
        match client.split_once('@') {
            Some((name, _)) => (name.to_string(), client.to_string()),
            None => (client.to_string(), format!("{client}@{}", self.config.domain)),
        }
    }

    /// 为一个客户端签发所有用途组合的证书
    pub fn issue(&self, client: &str) -> Result<Vec<IssuedIdentity>> {
        let (client_name, email) = self.client_name_and_email(client);
        let default_suffix = CertificatePurpose::suffix(&CertificatePurpose::ALL);

        let mut issued = Vec::new();
        for purposes in &self.purposes {
            let mut suffix = CertificatePurpose::suffix(purposes);
            if suffix == default_suffix {
                suffix.clear();
            }

            for copy in 1..=self.config.copies {
                let copy_suffix = if self.config.copies > 1 {
                    copy.to_string()
                } else {
                    String::new()
                };
                let stem = format!("{client_name}{suffix}{copy_suffix}");
                debug!(%stem, %email, "issuing client certificate");

                let (certificate, private_key_der) = self.issue_one(&email, purposes)?;
                issued.push(IssuedIdentity {
                    client_name: client_name.clone(),
                    email: email.clone(),
                    stem,
                    purposes: purposes.clone(),
                    certificate,
                    private_key_der,
                });
            }
        }

        info!(client, count = issued.len(), "issued client certificates");
        Ok(issued)
    }

    pub fn issue_all<S: AsRef<str>>(&self, clients: &[S]) -> Result<Vec<IssuedIdentity>> {
        let mut issued = Vec::new();
        for client in clients {
            issued.extend(self.issue(client.as_ref())?);
        }
        Ok(issued)
    }

    /// 写入CA证书和私钥
    pub fn write_authority(&self, dir: impl AsRef<Path>) -> Result<(PathBuf, PathBuf)> {
        write_pair(
            dir.as_ref(),
            &self.config.authority_stem,
            self.certificate.der(),
            &self.private_key_der,
        )
    }

    fn issue_one(
        &self,
        email: &str,
        purposes: &[CertificatePurpose],
    ) -> Result<(Certificate, Vec<u8>)> {
        let (key, private_key_der) = generate_key(self.config.client_key_algorithm)?;

        let mut params = CertificateParams::default();
        params.distinguished_name = distinguished_name(&self.config, email, Some(email))?;
        params.is_ca = IsCa::ExplicitNoCa;
        params.subject_alt_names = vec![SanType::Rfc822Name(ia5(email)?)];
        params.key_usages = CertificatePurpose::combined_key_usages(purposes)
            .into_iter()
            .map(|usage| usage.to_rcgen())
            .collect();
        params.extended_key_usages = CertificatePurpose::combined_extended_key_usages(purposes)
            .iter()
            .filter_map(|usage| usage.to_rcgen())
            .collect();
        params.use_authority_key_identifier_extension = true;
        set_validity(&mut params, self.config.client_validity_days);

        let cert = params
            .signed_by(&key, &self.cert, &self.key)
            .map_err(|e| PkiError::GenerationError(format!("Failed to sign certificate: {e}")))?;

        Ok((Certificate::from_der(cert.der())?, private_key_der))
    }
}

fn generate_key(algorithm: KeyAlgorithm) -> Result<(KeyPair, Vec<u8>)> {
    match algorithm {
        KeyAlgorithm::Rsa2048 => {
            let rsa = Rsa::generate_2048()?;
            let pem = rsa.to_pkcs8_pem()?;
            let key = KeyPair::from_pkcs8_pem_and_sign_algo(&pem, &PKCS_RSA_SHA256)
                .map_err(|e| PkiError::GenerationError(format!("Failed to load RSA key: {e}")))?;
            Ok((key, rsa.to_pkcs8_der()?))
        }
        KeyAlgorithm::P256 => {
            let key = KeyPair::generate_for(&PKCS_ECDSA_P256_SHA256)
                .map_err(|e| PkiError::GenerationError(format!("Failed to generate key: {e}")))?;
            let der = key.serialize_der();
            Ok((key, der))
        }
    }
}

fn distinguished_name(
    config: &AuthorityConfig,
    common_name: &str,
    email: Option<&str>,
) -> Result<DistinguishedName> {
    let country = PrintableString::try_from(config.country.as_str())
        .map_err(|e| PkiError::ConfigError(format!("Invalid country code: {e}")))?;

    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, common_name);
    dn.push(DnType::CountryName, DnValue::PrintableString(country));
    dn.push(DnType::StateOrProvinceName, config.state.as_str());
    dn.push(DnType::LocalityName, config.locality.as_str());
    if let Some(email) = email {
        dn.push(
            DnType::CustomDnType(EMAIL_ADDRESS_ARCS.to_vec()),
            DnValue::Ia5String(ia5(email)?),
        );
    }
    dn.push(DnType::OrganizationName, config.organisation.as_str());
    dn.push(DnType::OrganizationalUnitName, config.organisational_unit.as_str());
    Ok(dn)
}

fn set_validity(params: &mut CertificateParams, days: u32) {
    // 提前一小时生效
    let not_before = OffsetDateTime::now_utc() - Duration::hours(1);
    params.not_before = not_before;
    params.not_after = not_before + Duration::days(days as i64);

    let mut serial_number = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut serial_number);
    serial_number[0] &= 0x7f;
    params.serial_number = Some(serial_number.to_vec().into());
}

fn ia5(value: &str) -> Result<Ia5String> {
    Ia5String::try_from(value.to_string())
        .map_err(|e| PkiError::ConfigError(format!("\"{value}\" is not an IA5 string: {e}")))
}

fn write_pair(
    dir: &Path,
    stem: &str,
    certificate_der: &[u8],
    private_key_der: &[u8],
) -> Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(dir)?;
    let cert_path = dir.join(format!("{stem}.cer.pem"));
    let key_path = dir.join(format!("{stem}.key.pem"));
    fs::write(&cert_path, encode_pem("CERTIFICATE", certificate_der))?;
    fs::write(&key_path, encode_pem("PRIVATE KEY", private_key_der))?;
    Ok((cert_path, key_path))
}

#[cfg(test)]
mod tests {
    use cardkey_crypto::{Algorithm, KeyType};

    use super::*;
    use crate::purpose::{ExtendedKeyUsage, KeyUsage};

    fn fast_config() -> AuthorityConfig {
        AuthorityConfig::default().with_key_algorithms(KeyAlgorithm::P256, KeyAlgorithm::P256)
    }

    #[test]
    fn test_authority_certificate() {
        let ca = CertificateAuthority::create(fast_config()).unwrap();
        let cert = ca.certificate();
        assert_eq!(cert.common_name().as_deref(), Some("authority.example.com"));
        assert!(cert.is_ca());
        assert!(cert.is_currently_valid());
    }

    #[test]
    fn test_client_name_and_email() {
        let ca = CertificateAuthority::create(fast_config()).unwrap();
        assert_eq!(
            ca.client_name_and_email("user01"),
            ("user01".to_string(), "user01@example.com".to_string())
        );
        assert_eq!(
            ca.client_name_and_email("jo@corp.test"),
            ("jo".to_string(), "jo@corp.test".to_string())
        );
    }

    #[test]
    fn test_default_purposes_issue_one_unsuffixed_certificate() {
        let ca = CertificateAuthority::create(fast_config()).unwrap();
        let issued = ca.issue("user01").unwrap();
        assert_eq!(issued.len(), 1);

        let identity = &issued[0];
        assert_eq!(identity.stem, "user01");
        let cert = &identity.certificate;
        assert_eq!(cert.common_name().as_deref(), Some("user01@example.com"));
        assert_eq!(cert.email_addresses().unwrap(), vec!["user01@example.com"]);
        assert_eq!(
            cert.issuer_common_name().as_deref(),
            Some("authority.example.com")
        );
        assert!(!cert.is_ca());

        let usages = cert.key_usages().unwrap().unwrap();
        for usage in [
            KeyUsage::DigitalSignature,
            KeyUsage::NonRepudiation,
            KeyUsage::KeyEncipherment,
            KeyUsage::DataEncipherment,
            KeyUsage::KeyAgreement,
        ] {
            assert!(usages.contains(&usage), "missing {usage}");
        }
        let ekus = cert.extended_key_usages().unwrap();
        assert!(ekus.contains(&ExtendedKeyUsage::ClientAuth));
        assert!(ekus.contains(&ExtendedKeyUsage::EmailProtection));
    }

    #[test]
    fn test_split_purposes_and_copies() {
        let config = fast_config().with_purposes("a,es").with_copies(2);
        let ca = CertificateAuthority::create(config).unwrap();
        let stems: Vec<String> = ca
            .issue("user02")
            .unwrap()
            .into_iter()
            .map(|identity| identity.stem)
            .collect();
        assert_eq!(
            stems,
            vec![
                "user02_Auth1",
                "user02_Auth2",
                "user02_Encr_Sign1",
                "user02_Encr_Sign2"
            ]
        );
    }

    #[test]
    fn test_authentication_only_certificate() {
        let ca = CertificateAuthority::create(fast_config().with_purposes("a")).unwrap();
        let identity = ca.issue("auth-only").unwrap().remove(0);
        let usages = identity.certificate.key_usages().unwrap().unwrap();
        assert_eq!(usages, vec![KeyUsage::KeyEncipherment, KeyUsage::KeyAgreement]);
        assert_eq!(
            identity.certificate.extended_key_usages().unwrap(),
            vec![ExtendedKeyUsage::ClientAuth]
        );
    }

    #[test]
    fn test_rsa_client_key_matches_certificate() {
        let config = fast_config().with_key_algorithms(KeyAlgorithm::P256, KeyAlgorithm::Rsa2048);
        let ca = CertificateAuthority::create(config).unwrap();
        let identity = ca.issue("rsa-user").unwrap().remove(0);

        let key = identity.private_key().unwrap();
        assert_eq!(key.key_type(), KeyType::Rsa);
        assert_eq!(key.public_key(), identity.certificate.public_key().unwrap());

        let alg = Algorithm::RsaSignatureMessagePkcs1v15Sha512;
        let signature = key.sign(alg, b"hello").unwrap();
        assert!(identity
            .certificate
            .public_key()
            .unwrap()
            .verify(alg, b"hello", &signature)
            .unwrap());
    }

    #[test]
    fn test_write_files() {
        let dir = tempfile::tempdir().unwrap();
        let ca = CertificateAuthority::create(fast_config()).unwrap();
        let (ca_cert, ca_key) = ca.write_authority(dir.path()).unwrap();
        assert!(ca_cert.ends_with("authority.cer.pem"));
        assert!(ca_key.exists());

        let identity = ca.issue("user03").unwrap().remove(0);
        let (cert_path, key_path) = identity.write_to(dir.path()).unwrap();
        assert!(cert_path.ends_with("user03.cer.pem"));
        let key_pem = fs::read_to_string(key_path).unwrap();
        assert!(key_pem.contains("BEGIN PRIVATE KEY"));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = fast_config().with_location("ABC", "s", "l");
        assert!(CertificateAuthority::create(config).is_err());
    }
}
