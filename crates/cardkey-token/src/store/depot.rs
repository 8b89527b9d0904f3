use std::{fs, path::Path};

use cardkey_pki::load_certificate_file;
use tracing::{debug, info, warn};

use super::soft::SoftToken;
use crate::error::{Error, Result};

const CERT_SUFFIX: &str = ".cer.pem";
const KEY_SUFFIX: &str = ".key.pem";

/// Build a token from the `<stem>.cer.pem` / `<stem>.key.pem` pairs in a
/// depot directory. Authority certificates and certificates without a key
/// file are skipped.
pub fn load_depot(dir: impl AsRef<Path>, provider_id: &str) -> Result<SoftToken> {
    let dir = dir.as_ref();
    let token = SoftToken::new(provider_id);

    let mut stems: Vec<String> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter_map(|name| name.strip_suffix(CERT_SUFFIX).map(str::to_string))
        .collect();
    stems.sort();

    for stem in stems {
        let key_path = dir.join(format!("{stem}{KEY_SUFFIX}"));
        if !key_path.exists() {
            warn!(%stem, "certificate has no private key file, skipping");
            continue;
        }

        let certificate = load_certificate_file(dir.join(format!("{stem}{CERT_SUFFIX}")))?;
        if certificate.is_ca() {
            debug!(%stem, "skipping authority certificate");
            continue;
        }

        let key_pem = fs::read_to_string(&key_path)?;
        let key = pem::parse(key_pem)
            .map_err(|e| Error::ImportError(format!("{}: {e}", key_path.display())))?;
        if key.tag() != "PRIVATE KEY" {
            return Err(Error::ImportError(format!(
                "{}: expected a PKCS#8 PRIVATE KEY, found {}",
                key_path.display(),
                key.tag()
            )));
        }

        let handle = token.import_identity(certificate, key.contents())?;
        debug!(%stem, identity = %handle, "loaded identity from depot");
    }

    info!(
        depot = %dir.display(),
        token_id = %token.token_id(),
        identities = token.len(),
        "loaded depot"
    );
    Ok(token)
}

#[cfg(test)]
mod tests {
    use cardkey_pki::{AuthorityConfig, CertificateAuthority, KeyAlgorithm};

    use super::*;

    #[test]
    fn test_load_issued_identities() {
        let dir = tempfile::tempdir().unwrap();
        let config = AuthorityConfig::default()
            .with_purposes("a,es")
            .with_key_algorithms(KeyAlgorithm::P256, KeyAlgorithm::P256);
        let ca = CertificateAuthority::create(config).unwrap();
        ca.write_authority(dir.path()).unwrap();
        for identity in ca.issue_all(&["user01", "user02"]).unwrap() {
            identity.write_to(dir.path()).unwrap();
        }
        // certificate without a key
        let orphan = ca.issue("orphan").unwrap().remove(0);
        let (_, key_path) = orphan.write_to(dir.path()).unwrap();
        fs::remove_file(key_path).unwrap();

        let token = load_depot(dir.path(), "com.example.pivd").unwrap();
        assert_eq!(token.len(), 4);
        assert!(token.token_id().starts_with("com.example.pivd:"));
    }

    #[test]
    fn test_missing_directory() {
        let err = load_depot("/definitely/not/here", "p").err().unwrap();
        assert!(matches!(err, Error::IoError(_)));
    }
}
