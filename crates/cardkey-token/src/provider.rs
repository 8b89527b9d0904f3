// provider.rs
use std::sync::Arc;

use cardkey_crypto::Algorithm;
use cardkey_pki::Certificate;

use crate::{
    error::{StoreStatus, TokenError},
    types::{IdentityHandle, IdentityQuery, PrivateKeyHandle},
};

pub type StoreResult<T> = std::result::Result<T, StoreStatus>;
pub type ChannelResult<T> = std::result::Result<T, TokenError>;

/// Keychain-like store of token identities, queried by attributes
pub trait IdentityStore: Send + Sync {
    fn token_ids(&self) -> StoreResult<Vec<String>>;

    fn copy_matching(&self, query: &IdentityQuery) -> StoreResult<Vec<IdentityHandle>>;

    fn copy_certificate(&self, identity: &IdentityHandle) -> StoreResult<Certificate>;
    fn copy_private_key(&self, identity: &IdentityHandle) -> StoreResult<PrivateKeyHandle>;
}

/// Channel to the token provider; the only place private keys are used
pub trait ProviderChannel: Send + Sync {
    fn sign(&self, key: &PrivateKeyHandle, algorithm: Algorithm, data: &[u8])
        -> ChannelResult<Vec<u8>>;
    fn decrypt(
        &self,
        key: &PrivateKeyHandle,
        algorithm: Algorithm,
        data: &[u8],
    ) -> ChannelResult<Vec<u8>>;
}

/// Store and provider channel as seen by the consumer
#[derive(Clone)]
pub struct Keychain {
    store: Arc<dyn IdentityStore>,
    channel: Arc<dyn ProviderChannel>,
}

impl Keychain {
    /// Use one backend for both the store and the channel
    pub fn new<T>(backend: Arc<T>) -> Self
    where
        T: IdentityStore + ProviderChannel + 'static,
    {
        Self {
            store: backend.clone(),
            channel: backend,
        }
    }

    pub fn store(&self) -> &dyn IdentityStore {
        self.store.as_ref()
    }

    pub fn channel(&self) -> &dyn ProviderChannel {
        self.channel.as_ref()
    }
}
