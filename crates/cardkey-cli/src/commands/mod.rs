pub mod auth;
pub mod issue;
pub mod list;
pub mod operate;
pub mod purposes;

use std::{path::PathBuf, sync::Arc};

use cardkey_token::{
    create_token, IdentityCatalog, Keychain, SoftKeychain, SoftToken, TokenConfig, TokenSource,
};
use tracing::warn;

use crate::{error::CliResult, settings::Settings};

/// Token backend and catalog shared by the identity commands
pub struct Session {
    pub settings: Settings,
    pub token: Arc<SoftToken>,
    pub keychain: Arc<SoftKeychain>,
}

impl Session {
    pub fn open(settings: Settings, depot: Option<PathBuf>, suspended: bool) -> CliResult<Self> {
        let depot = depot.unwrap_or_else(|| settings.depot.path.clone());
        let source = if depot.is_dir() {
            TokenSource::Depot(depot)
        } else {
            warn!(depot = %depot.display(), "depot directory not found, token is empty");
            TokenSource::Empty
        };

        let token = create_token(&TokenConfig {
            provider_id: settings.provider.provider_id.clone(),
            source,
            suspended,
        })?;
        let keychain = Arc::new(SoftKeychain::new());
        keychain.add_token(token.clone())?;

        Ok(Self {
            settings,
            token,
            keychain,
        })
    }

    pub fn catalog(&self) -> IdentityCatalog {
        IdentityCatalog::load(
            self.keychain.as_ref(),
            self.settings.provider.allowed_provider_ids.as_deref(),
        )
    }

    /// Catalog with the given indices selected
    pub fn catalog_with_selection(&self, select: &[usize]) -> CliResult<IdentityCatalog> {
        let mut catalog = self.catalog();
        for index in select {
            catalog.select(*index)?;
        }
        Ok(catalog)
    }

    pub fn keychain(&self) -> Keychain {
        Keychain::new(self.keychain.clone())
    }
}
