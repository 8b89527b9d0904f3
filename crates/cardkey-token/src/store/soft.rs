//! In-memory software token
//!
//! Holds certificate + private key pairs and answers store queries and
//! provider requests the way a smart card token would. Private keys never
//! leave the token; callers only get handles.

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
        Arc, RwLock,
    },
};

use base64::{engine::general_purpose, Engine as _};
use cardkey_crypto::{Algorithm, PrivateKey};
use cardkey_pki::{Certificate, IssuedIdentity, KeyUsage};
use rand::RngCore;
use tracing::{debug, info};

use crate::{
    error::{Error, Result, StoreStatus, TokenError, TokenErrorCode},
    provider::{ChannelResult, IdentityStore, ProviderChannel, StoreResult},
    types::{IdentityHandle, IdentityQuery, MatchLimit, PrivateKeyHandle},
};

struct TokenObject {
    certificate: Certificate,
    private_key: PrivateKey,
    can_sign: bool,
    can_decrypt: bool,
}

/// Type alias for the token object map
type TokenObjects = RwLock<BTreeMap<u64, TokenObject>>;

pub struct SoftToken {
    token_id: String,
    objects: TokenObjects,
    next_object_id: AtomicU64,
    suspended: AtomicBool,
    requests: AtomicUsize,
}

impl SoftToken {
    /// New empty token with id `<provider_id>:<random suffix>`
    pub fn new(provider_id: &str) -> Self {
        let mut suffix = [0u8; 6];
        rand::thread_rng().fill_bytes(&mut suffix);
        let token_id = format!(
            "{provider_id}:{}",
            general_purpose::URL_SAFE_NO_PAD.encode(suffix)
        );
        Self::with_token_id(token_id)
    }

    pub fn with_token_id(token_id: impl Into<String>) -> Self {
        Self {
            token_id: token_id.into(),
            objects: RwLock::new(BTreeMap::new()),
            next_object_id: AtomicU64::new(1),
            suspended: AtomicBool::new(false),
            requests: AtomicUsize::new(0),
        }
    }

    pub fn token_id(&self) -> &str {
        &self.token_id
    }

    /// 导入证书和对应的PKCS#8私钥
    pub fn import_identity(
        &self,
        certificate: Certificate,
        private_key_der: &[u8],
    ) -> Result<IdentityHandle> {
        let private_key = PrivateKey::from_pkcs8_der(private_key_der)?;
        if private_key.public_key() != certificate.public_key()? {
            return Err(Error::key_mismatch(certificate.subject()));
        }

        let (can_sign, can_decrypt) = capabilities(&certificate)?;
        let object_id = self.next_object_id.fetch_add(1, Ordering::SeqCst);
        let handle = IdentityHandle {
            token_id: self.token_id.clone(),
            object_id,
        };

        debug!(
            identity = %handle,
            common_name = ?certificate.common_name(),
            can_sign,
            can_decrypt,
            "imported identity"
        );

        let mut objects = self
            .objects
            .write()
            .map_err(|_| Error::lock_error("Failed to acquire write lock"))?;
        objects.insert(
            object_id,
            TokenObject {
                certificate,
                private_key,
                can_sign,
                can_decrypt,
            },
        );
        Ok(handle)
    }

    pub fn import_issued(&self, identity: &IssuedIdentity) -> Result<IdentityHandle> {
        self.import_identity(identity.certificate.clone(), &identity.private_key_der)
    }

    pub fn remove_identity(&self, handle: &IdentityHandle) -> Result<bool> {
        if handle.token_id != self.token_id {
            return Ok(false);
        }
        let mut objects = self
            .objects
            .write()
            .map_err(|_| Error::lock_error("Failed to acquire write lock"))?;
        Ok(objects.remove(&handle.object_id).is_some())
    }

    pub fn len(&self) -> usize {
        self.objects.read().map(|objects| objects.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make every private key request fail with a communication error,
    /// as when the provider app is no longer running
    pub fn suspend(&self) {
        info!(token_id = %self.token_id, "token suspended");
        self.suspended.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        info!(token_id = %self.token_id, "token resumed");
        self.suspended.store(false, Ordering::SeqCst);
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::SeqCst)
    }

    /// Number of sign and decrypt requests received, including refused ones
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn matching(&self, query: &IdentityQuery) -> StoreResult<Vec<IdentityHandle>> {
        let objects = self.objects.read().map_err(|_| StoreStatus::Other(-1))?;
        Ok(objects
            .iter()
            .filter(|(_, object)| query.matches(&self.token_id, object.can_sign, object.can_decrypt))
            .map(|(object_id, _)| IdentityHandle {
                token_id: self.token_id.clone(),
                object_id: *object_id,
            })
            .collect())
    }

    fn certificate(&self, object_id: u64) -> StoreResult<Certificate> {
        let objects = self.objects.read().map_err(|_| StoreStatus::Other(-1))?;
        objects
            .get(&object_id)
            .map(|object| object.certificate.clone())
            .ok_or(StoreStatus::ItemNotFound)
    }

    fn private_key_handle(&self, identity: &IdentityHandle) -> StoreResult<PrivateKeyHandle> {
        let objects = self.objects.read().map_err(|_| StoreStatus::Other(-1))?;
        let object = objects
            .get(&identity.object_id)
            .ok_or(StoreStatus::ItemNotFound)?;
        Ok(PrivateKeyHandle {
            identity: identity.clone(),
            key_type: object.private_key.key_type(),
            size_bits: object.private_key.size_bits(),
        })
    }

    fn with_private_key<T>(
        &self,
        key: &PrivateKeyHandle,
        operation: impl FnOnce(&TokenObject) -> ChannelResult<T>,
    ) -> ChannelResult<T> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.is_suspended() {
            return Err(TokenError::communication(
                "The token provider is not running. Launch it to resume access.",
            ));
        }

        let objects = self.objects.read().map_err(|_| {
            TokenError::new(TokenErrorCode::CorruptedData, "Failed to acquire read lock")
        })?;
        let object = objects.get(&key.identity.object_id).ok_or_else(|| {
            TokenError::new(
                TokenErrorCode::ObjectNotFound,
                format!("No key for {}", key.identity),
            )
        })?;
        operation(object)
    }

    fn sign(&self, key: &PrivateKeyHandle, algorithm: Algorithm, data: &[u8]) -> ChannelResult<Vec<u8>> {
        self.with_private_key(key, |object| {
            if !object.can_sign {
                return Err(TokenError::new(
                    TokenErrorCode::BadParameter,
                    "Key usage does not permit signing",
                ));
            }
            object
                .private_key
                .sign(algorithm, data)
                .map_err(|e| TokenError::new(TokenErrorCode::BadParameter, e.to_string()))
        })
    }

    fn decrypt(
        &self,
        key: &PrivateKeyHandle,
        algorithm: Algorithm,
        data: &[u8],
    ) -> ChannelResult<Vec<u8>> {
        self.with_private_key(key, |object| {
            if !object.can_decrypt {
                return Err(TokenError::new(
                    TokenErrorCode::BadParameter,
                    "Key usage does not permit decryption",
                ));
            }
            object
                .private_key
                .decrypt(algorithm, data)
                .map_err(|e| TokenError::new(TokenErrorCode::CorruptedData, e.to_string()))
        })
    }
}

/// Signing and decryption capability from the key usage extension.
/// A certificate without the extension allows both.
fn capabilities(certificate: &Certificate) -> Result<(bool, bool)> {
    let usages = match certificate.key_usages()? {
        Some(usages) => usages,
        None => return Ok((true, true)),
    };
    let can_sign = usages
        .iter()
        .any(|u| matches!(u, KeyUsage::DigitalSignature | KeyUsage::NonRepudiation));
    let can_decrypt = usages
        .iter()
        .any(|u| matches!(u, KeyUsage::KeyEncipherment | KeyUsage::DataEncipherment));
    Ok((can_sign, can_decrypt))
}

/// Aggregates software tokens behind the store and channel traits
#[derive(Default)]
pub struct SoftKeychain {
    tokens: RwLock<Vec<Arc<SoftToken>>>,
}

impl SoftKeychain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_token(&self, token: Arc<SoftToken>) -> Result<()> {
        let mut tokens = self
            .tokens
            .write()
            .map_err(|_| Error::lock_error("Failed to acquire write lock"))?;
        info!(token_id = %token.token_id(), identities = token.len(), "token inserted");
        tokens.push(token);
        Ok(())
    }

    pub fn token(&self, token_id: &str) -> Option<Arc<SoftToken>> {
        self.tokens
            .read()
            .ok()?
            .iter()
            .find(|token| token.token_id() == token_id)
            .cloned()
    }

    pub fn tokens(&self) -> Vec<Arc<SoftToken>> {
        self.tokens
            .read()
            .map(|tokens| tokens.clone())
            .unwrap_or_default()
    }

    fn token_for_store(&self, token_id: &str) -> StoreResult<Arc<SoftToken>> {
        self.token(token_id).ok_or(StoreStatus::ItemNotFound)
    }

    fn token_for_channel(&self, key: &PrivateKeyHandle) -> ChannelResult<Arc<SoftToken>> {
        self.token(&key.identity.token_id).ok_or_else(|| {
            TokenError::new(
                TokenErrorCode::TokenNotFound,
                format!("Token {} is not present", key.identity.token_id),
            )
        })
    }
}

impl IdentityStore for SoftKeychain {
    fn token_ids(&self) -> StoreResult<Vec<String>> {
        let tokens = self.tokens.read().map_err(|_| StoreStatus::Other(-1))?;
        Ok(tokens.iter().map(|t| t.token_id().to_string()).collect())
    }

    fn copy_matching(&self, query: &IdentityQuery) -> StoreResult<Vec<IdentityHandle>> {
        let tokens = self.tokens.read().map_err(|_| StoreStatus::Other(-1))?;

        let mut handles = Vec::new();
        for token in tokens.iter() {
            handles.extend(token.matching(query)?);
        }
        if query.match_limit == MatchLimit::One {
            handles.truncate(1);
        }

        if handles.is_empty() {
            return Err(StoreStatus::ItemNotFound);
        }
        Ok(handles)
    }

    fn copy_certificate(&self, identity: &IdentityHandle) -> StoreResult<Certificate> {
        self.token_for_store(&identity.token_id)?
            .certificate(identity.object_id)
    }

    fn copy_private_key(&self, identity: &IdentityHandle) -> StoreResult<PrivateKeyHandle> {
        self.token_for_store(&identity.token_id)?
            .private_key_handle(identity)
    }
}

impl ProviderChannel for SoftKeychain {
    fn sign(&self, key: &PrivateKeyHandle, algorithm: Algorithm, data: &[u8]) -> ChannelResult<Vec<u8>> {
        self.token_for_channel(key)?.sign(key, algorithm, data)
    }

    fn decrypt(
        &self,
        key: &PrivateKeyHandle,
        algorithm: Algorithm,
        data: &[u8],
    ) -> ChannelResult<Vec<u8>> {
        self.token_for_channel(key)?.decrypt(key, algorithm, data)
    }
}
