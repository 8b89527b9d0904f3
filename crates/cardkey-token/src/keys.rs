//! Identity resolution and key pair extraction

use cardkey_crypto::PublicKey;
use cardkey_pki::Certificate;
use tracing::debug;

use crate::{
    error::{Error, Result},
    provider::IdentityStore,
    types::{IdentityHandle, PrivateKeyHandle},
};

/// An identity handle together with its certificate
#[derive(Clone, Debug, PartialEq)]
pub struct Identity {
    pub handle: IdentityHandle,
    pub certificate: Certificate,
}

impl Identity {
    pub fn resolve(store: &dyn IdentityStore, handle: &IdentityHandle) -> Result<Self> {
        let certificate = store.copy_certificate(handle)?;
        Ok(Self {
            handle: handle.clone(),
            certificate,
        })
    }

    /// Common name of the certificate, used to label results
    pub fn label(&self) -> Option<String> {
        self.certificate.common_name()
    }
}

/// Public key and private key reference of one identity
#[derive(Debug)]
pub struct KeyPair<'a> {
    pub identity: &'a Identity,
    pub public_key: PublicKey,
    pub private_key: PrivateKeyHandle,
}

/// 从身份中提取密钥对
///
/// Both halves must resolve; otherwise the whole pair is unavailable.
pub fn keys_from_identity<'a>(
    store: &dyn IdentityStore,
    identity: &'a Identity,
) -> Result<KeyPair<'a>> {
    let private_key = store
        .copy_private_key(&identity.handle)
        .map_err(|status| Error::keys_unavailable(&identity.handle, status))?;
    let public_key = identity
        .certificate
        .public_key()
        .map_err(|e| Error::keys_unavailable(&identity.handle, e))?;

    if public_key.key_type() != private_key.key_type {
        return Err(Error::keys_unavailable(
            &identity.handle,
            format!(
                "certificate key is {} but private key is {}",
                public_key.key_type().name(),
                private_key.key_type.name()
            ),
        ));
    }

    debug!(
        identity = %identity.handle,
        key_type = public_key.key_type().name(),
        size_bits = private_key.size_bits,
        "resolved key pair"
    );
    Ok(KeyPair {
        identity,
        public_key,
        private_key,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cardkey_pki::{AuthorityConfig, CertificateAuthority, KeyAlgorithm};

    use super::*;
    use crate::store::{SoftKeychain, SoftToken};

    fn keychain() -> (Arc<SoftToken>, SoftKeychain, IdentityHandle) {
        let config = AuthorityConfig::default()
            .with_purposes("aes")
            .with_key_algorithms(KeyAlgorithm::P256, KeyAlgorithm::P256);
        let ca = CertificateAuthority::create(config).unwrap();
        let token = Arc::new(SoftToken::with_token_id("p:1"));
        let handle = token.import_issued(&ca.issue("user01").unwrap()[0]).unwrap();
        let keychain = SoftKeychain::new();
        keychain.add_token(token.clone()).unwrap();
        (token, keychain, handle)
    }

    #[test]
    fn test_keys_from_identity() {
        let (_token, keychain, handle) = keychain();
        let identity = Identity::resolve(&keychain, &handle).unwrap();
        assert_eq!(identity.label().as_deref(), Some("user01@example.com"));

        let pair = keys_from_identity(&keychain, &identity).unwrap();
        assert_eq!(pair.private_key.identity, handle);
        assert_eq!(pair.public_key, identity.certificate.public_key().unwrap());
    }

    #[test]
    fn test_removed_private_key_is_unavailable() {
        let (token, keychain, handle) = keychain();
        let identity = Identity::resolve(&keychain, &handle).unwrap();
        token.remove_identity(&handle).unwrap();

        let err = keys_from_identity(&keychain, &identity).unwrap_err();
        assert!(matches!(err, Error::KeysUnavailable { .. }));
    }
}
