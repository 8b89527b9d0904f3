//! Discovered identities and the user's selection

use cardkey_pki::CertificateInfo;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    keys::Identity,
    provider::IdentityStore,
    query::find_identities,
    types::{Capability, IdentityHandle},
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Select atleast one certificate to perform the operation.")]
    Empty,

    /// Holds the number of selected identities
    #[error(
        "As part of this demo we support single certificate for authentication to \
         demonstrate retries. Please ensure a valid certificate with authentication \
         capablity is selected"
    )]
    NotExactlyOne(usize),

    #[error("No identity at index {0}")]
    IndexOutOfRange(usize),
}

/// Short description of an identity for listings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentitySummary {
    pub handle: IdentityHandle,
    /// Empty when the certificate has no common name
    pub common_name: String,
    pub selected: bool,
}

/// 身份目录
#[derive(Clone, Debug, Default)]
pub struct IdentityCatalog {
    identities: Vec<Identity>,
    selection: Vec<IdentityHandle>,
}

impl IdentityCatalog {
    /// Query every identity and keep those whose certificate can be copied
    pub fn load(store: &dyn IdentityStore, provider_ids: Option<&[String]>) -> Self {
        let identities: Vec<Identity> = find_identities(store, Capability::All, provider_ids)
            .iter()
            .filter_map(|handle| match Identity::resolve(store, handle) {
                Ok(identity) => Some(identity),
                Err(e) => {
                    warn!(identity = %handle, error = %e, "skipping identity");
                    None
                }
            })
            .collect();
        info!(count = identities.len(), "identity catalog loaded");
        Self::from_identities(identities)
    }

    pub fn from_identities(identities: Vec<Identity>) -> Self {
        Self {
            identities,
            selection: Vec::new(),
        }
    }

    pub fn identities(&self) -> &[Identity] {
        &self.identities
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    /// Add the identity at `index` to the selection, or remove it when
    /// already selected. Returns whether it is selected afterwards.
    pub fn toggle(&mut self, index: usize) -> Result<bool, SelectionError> {
        let handle = self.handle_at(index)?;
        if let Some(position) = self.selection.iter().position(|h| *h == handle) {
            self.selection.remove(position);
            Ok(false)
        } else {
            self.selection.push(handle);
            Ok(true)
        }
    }

    pub fn select(&mut self, index: usize) -> Result<(), SelectionError> {
        if !self.is_selected(index) {
            self.toggle(index)?;
        }
        Ok(())
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.identities
            .get(index)
            .is_some_and(|identity| self.selection.contains(&identity.handle))
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Selected identities in selection order
    pub fn selected(&self) -> Vec<&Identity> {
        self.selection
            .iter()
            .filter_map(|handle| self.identities.iter().find(|i| i.handle == *handle))
            .collect()
    }

    /// Selected identities if any, otherwise every identity
    pub fn operation_candidates(&self) -> Vec<Identity> {
        if self.selection.is_empty() {
            self.identities.clone()
        } else {
            self.selected().into_iter().cloned().collect()
        }
    }

    pub fn require_selection(&self) -> Result<Vec<Identity>, SelectionError> {
        if self.selection.is_empty() {
            return Err(SelectionError::Empty);
        }
        Ok(self.operation_candidates())
    }

    /// The single identity used to answer client certificate challenges
    pub fn authentication_identity(&self) -> Result<&Identity, SelectionError> {
        let selected = self.selected();
        match selected.as_slice() {
            [identity] => Ok(*identity),
            others => Err(SelectionError::NotExactlyOne(others.len())),
        }
    }

    pub fn summaries(&self) -> Vec<IdentitySummary> {
        self.identities
            .iter()
            .map(|identity| IdentitySummary {
                handle: identity.handle.clone(),
                common_name: identity.label().unwrap_or_default(),
                selected: self.selection.contains(&identity.handle),
            })
            .collect()
    }

    /// Detailed certificate information, skipping certificates that fail to
    /// decode
    pub fn certificate_infos(&self) -> Vec<CertificateInfo> {
        self.identities
            .iter()
            .filter_map(|identity| identity.certificate.info().ok())
            .collect()
    }

    fn handle_at(&self, index: usize) -> Result<IdentityHandle, SelectionError> {
        self.identities
            .get(index)
            .map(|identity| identity.handle.clone())
            .ok_or(SelectionError::IndexOutOfRange(index))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cardkey_pki::{AuthorityConfig, CertificateAuthority, KeyAlgorithm};

    use super::*;
    use crate::store::{SoftKeychain, SoftToken};

    fn catalog() -> IdentityCatalog {
        let config = AuthorityConfig::default()
            .with_purposes("aes")
            .with_key_algorithms(KeyAlgorithm::P256, KeyAlgorithm::P256);
        let ca = CertificateAuthority::create(config).unwrap();
        let token = Arc::new(SoftToken::with_token_id("p:1"));
        for identity in ca.issue_all(&["user01", "user02", "user03"]).unwrap() {
            token.import_issued(&identity).unwrap();
        }
        let keychain = SoftKeychain::new();
        keychain.add_token(token).unwrap();
        IdentityCatalog::load(&keychain, None)
    }

    #[test]
    fn test_toggle_selection() {
        let mut catalog = catalog();
        assert_eq!(catalog.len(), 3);

        assert!(catalog.toggle(2).unwrap());
        assert!(catalog.toggle(0).unwrap());
        assert!(catalog.is_selected(0));
        assert!(!catalog.is_selected(1));

        let names: Vec<_> = catalog
            .selected()
            .iter()
            .filter_map(|i| i.label())
            .collect();
        assert_eq!(names, vec!["user03@example.com", "user01@example.com"]);

        assert!(!catalog.toggle(2).unwrap());
        assert_eq!(catalog.selected().len(), 1);
        assert_eq!(catalog.toggle(7), Err(SelectionError::IndexOutOfRange(7)));
    }

    #[test]
    fn test_candidates_fall_back_to_all() {
        let mut catalog = catalog();
        assert_eq!(catalog.operation_candidates().len(), 3);
        assert_eq!(catalog.require_selection(), Err(SelectionError::Empty));

        catalog.select(1).unwrap();
        catalog.select(1).unwrap();
        let candidates = catalog.require_selection().unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].handle, catalog.identities()[1].handle);
    }

    #[test]
    fn test_authentication_needs_exactly_one() {
        let mut catalog = catalog();
        let err = catalog.authentication_identity().unwrap_err();
        assert_eq!(err, SelectionError::NotExactlyOne(0));
        assert_eq!(
            err.to_string(),
            "As part of this demo we support single certificate for authentication to \
             demonstrate retries. Please ensure a valid certificate with authentication \
             capablity is selected"
        );
        catalog.select(0).unwrap();
        assert!(catalog.authentication_identity().is_ok());
        catalog.select(1).unwrap();
        assert_eq!(
            catalog.authentication_identity().unwrap_err(),
            SelectionError::NotExactlyOne(2)
        );
        catalog.clear_selection();
        assert!(catalog.selected().is_empty());
    }

    #[test]
    fn test_summaries() {
        let mut catalog = catalog();
        catalog.select(1).unwrap();
        let summaries = catalog.summaries();
        assert_eq!(summaries[0].common_name, "user01@example.com");
        assert!(summaries[1].selected);
        assert_eq!(catalog.certificate_infos().len(), 3);
    }

    #[test]
    fn test_empty_store() {
        let keychain = SoftKeychain::new();
        let catalog = IdentityCatalog::load(&keychain, None);
        assert!(catalog.is_empty());
    }
}
