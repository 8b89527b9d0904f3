mod depot;
mod soft;

use std::{path::PathBuf, sync::Arc};

pub use depot::load_depot;
pub use soft::{SoftKeychain, SoftToken};

use crate::error::Result;

/// Where a software token gets its identities from
#[derive(Clone, Debug)]
pub enum TokenSource {
    Empty,
    Depot(PathBuf),
}

/// Token configuration
#[derive(Clone, Debug)]
pub struct TokenConfig {
    pub provider_id: String,
    pub source: TokenSource,
    /// Start with the provider unreachable
    pub suspended: bool,
}

/// Factory function to create a software token based on configuration
pub fn create_token(config: &TokenConfig) -> Result<Arc<SoftToken>> {
    let token = match &config.source {
        TokenSource::Empty => SoftToken::new(&config.provider_id),
        TokenSource::Depot(path) => load_depot(path, &config.provider_id)?,
    };
    if config.suspended {
        token.suspend();
    }
    Ok(Arc::new(token))
}

/// Build a keychain holding one token per configuration
pub fn create_keychain(configs: &[TokenConfig]) -> Result<Arc<SoftKeychain>> {
    let keychain = SoftKeychain::new();
    for config in configs {
        keychain.add_token(create_token(config)?)?;
    }
    Ok(Arc::new(keychain))
}
