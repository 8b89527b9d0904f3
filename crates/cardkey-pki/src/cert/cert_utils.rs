use std::{fs, path::Path};

use super::types::Certificate;
use crate::error::{PkiError, Result};

const PEM_CERTIFICATE_HEADER: &[u8] = b"-----BEGIN CERTIFICATE-----";

/// 导入证书
///
/// # Arguments
/// * `cert_data` - 证书数据（PEM或DER格式）
pub fn import_certificate(cert_data: &[u8]) -> Result<Certificate> {
    let trimmed = trim_leading_whitespace(cert_data);
    if trimmed.starts_with(PEM_CERTIFICATE_HEADER) {
        Certificate::from_pem(trimmed)
            .map_err(|e| PkiError::ImportError(format!("Invalid PEM certificate: {e}")))
    } else {
        Certificate::from_der(cert_data)
            .map_err(|e| PkiError::ImportError(format!("Invalid DER certificate: {e}")))
    }
}

/// 导出证书
///
/// # Arguments
/// * `cert` - 证书
/// * `format` - 导出格式（"PEM" 或 "DER"）
pub fn export_certificate(cert: &Certificate, format: &str) -> Result<Vec<u8>> {
    match format.to_uppercase().as_str() {
        "DER" => Ok(cert.der().to_vec()),
        "PEM" => Ok(cert.to_pem().into_bytes()),
        _ => Err(PkiError::ExportError(format!(
            "Unsupported format: {format}"
        ))),
    }
}

/// Read every certificate from a PEM bundle, skipping non-certificate blocks
pub fn import_pem_bundle(pem_data: &[u8]) -> Result<Vec<Certificate>> {
    let blocks = pem::parse_many(pem_data)
        .map_err(|e| PkiError::ImportError(format!("Failed to parse PEM: {e}")))?;

    blocks
        .iter()
        .filter(|block| block.tag() == "CERTIFICATE")
        .map(|block| Certificate::from_der(block.contents()))
        .collect()
}

pub fn load_certificate_file(path: impl AsRef<Path>) -> Result<Certificate> {
    let data = fs::read(path)?;
    import_certificate(&data)
}

/// PEM-encode arbitrary DER under the given label
pub fn encode_pem(label: &str, der: &[u8]) -> String {
    pem::encode(&pem::Pem::new(label, der.to_vec()))
}

pub fn write_pem_file(path: impl AsRef<Path>, label: &str, der: &[u8]) -> Result<()> {
    fs::write(path, encode_pem(label, der))?;
    Ok(())
}

fn trim_leading_whitespace(data: &[u8]) -> &[u8] {
    let start = data
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(data.len());
    &data[start..]
}

#[cfg(test)]
mod tests {
    use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair, PKCS_ECDSA_P256_SHA256};

    use super::*;
    use crate::{
        ca::{AuthorityConfig, CertificateAuthority, KeyAlgorithm},
        purpose::{ExtendedKeyUsage, KeyUsage},
    };

    /// Client certificate issued by a P-256 test authority
    fn issued(client: &str, purposes: &str) -> Certificate {
        let config = AuthorityConfig::default()
            .with_purposes(purposes)
            .with_key_algorithms(KeyAlgorithm::P256, KeyAlgorithm::P256);
        let ca = CertificateAuthority::create(config).unwrap();
        ca.issue(client).unwrap().remove(0).certificate
    }

    /// Default rcgen parameters carry no extensions at all
    fn bare_self_signed(common_name: &str) -> Certificate {
        let key = KeyPair::generate_for(&PKCS_ECDSA_P256_SHA256).unwrap();
        let mut params = CertificateParams::default();
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, common_name);
        params.distinguished_name = dn;
        let cert = params.self_signed(&key).unwrap();
        Certificate::from_der(cert.der()).unwrap()
    }

    #[test]
    fn test_export_import_certificate() {
        let cert = issued("user01", "s");

        let der_data = export_certificate(&cert, "DER").unwrap();
        assert_eq!(import_certificate(&der_data).unwrap(), cert);

        let pem_data = export_certificate(&cert, "pem").unwrap();
        assert!(pem_data.starts_with(PEM_CERTIFICATE_HEADER));
        assert_eq!(import_certificate(&pem_data).unwrap(), cert);

        assert!(export_certificate(&cert, "PFX").is_err());
    }

    #[test]
    fn test_common_name_and_usages() {
        let cert = issued("user01", "s");
        assert!(cert.x509().tbs_certificate.extensions.is_some());
        assert_eq!(cert.common_name().as_deref(), Some("user01@example.com"));
        assert_eq!(
            cert.key_usages().unwrap(),
            Some(vec![KeyUsage::DigitalSignature, KeyUsage::NonRepudiation])
        );
        assert_eq!(
            cert.extended_key_usages().unwrap(),
            vec![ExtendedKeyUsage::EmailProtection]
        );
        assert_eq!(cert.fingerprint_sha256().len(), 64);
    }

    #[test]
    fn test_missing_key_usage_extension() {
        let cert = bare_self_signed("no usages");
        assert!(cert.x509().tbs_certificate.extensions.is_none());
        assert_eq!(cert.common_name().as_deref(), Some("no usages"));
        assert_eq!(cert.key_usages().unwrap(), None);
        assert!(cert.extended_key_usages().unwrap().is_empty());
    }

    #[test]
    fn test_bundle_and_files() {
        let first = issued("first", "a");
        let second = bare_self_signed("second");
        let mut bundle = first.to_pem();
        bundle.push_str(&encode_pem("PRIVATE KEY", b"not a certificate"));
        bundle.push_str(&second.to_pem());

        let certs = import_pem_bundle(bundle.as_bytes()).unwrap();
        assert_eq!(certs, vec![first.clone(), second]);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("first.cer.pem");
        write_pem_file(&path, "CERTIFICATE", first.der()).unwrap();
        assert_eq!(load_certificate_file(&path).unwrap(), first);
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(
            import_certificate(b"definitely not DER"),
            Err(PkiError::ImportError(_))
        ));
    }
}
