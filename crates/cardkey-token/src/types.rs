use std::fmt;

use cardkey_crypto::KeyType;
use serde::{Deserialize, Serialize};

/// Non-owning reference to an identity held by a token
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct IdentityHandle {
    /// `<provider id>:<token suffix>`
    pub token_id: String,
    pub object_id: u64,
}

impl fmt::Display for IdentityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.token_id, self.object_id)
    }
}

/// Names a private key inside the provider; carries no key material
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct PrivateKeyHandle {
    pub identity: IdentityHandle,
    pub key_type: KeyType,
    pub size_bits: usize,
}

/// 身份能力
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    Signing,
    Decryption,
    Authentication,
    All,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::Signing => "signing",
            Capability::Decryption => "decryption",
            Capability::Authentication => "authentication",
            Capability::All => "all",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MatchLimit {
    One,
    All,
}

/// Attribute query against an identity store
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IdentityQuery {
    pub token_id: Option<String>,
    pub can_sign: Option<bool>,
    pub can_decrypt: Option<bool>,
    pub match_limit: MatchLimit,
}

impl Default for IdentityQuery {
    fn default() -> Self {
        Self {
            token_id: None,
            can_sign: None,
            can_decrypt: None,
            match_limit: MatchLimit::All,
        }
    }
}

impl IdentityQuery {
    /// Authentication and `All` add no predicate; stores carry no
    /// authentication flag.
    pub fn for_capability(capability: Capability) -> Self {
        let mut query = Self::default();
        match capability {
            Capability::Signing => query.can_sign = Some(true),
            Capability::Decryption => query.can_decrypt = Some(true),
            Capability::Authentication | Capability::All => {}
        }
        query
    }

    pub fn with_token_id(mut self, token_id: impl Into<String>) -> Self {
        self.token_id = Some(token_id.into());
        self
    }

    pub fn with_match_limit(mut self, match_limit: MatchLimit) -> Self {
        self.match_limit = match_limit;
        self
    }

    pub fn matches(&self, token_id: &str, can_sign: bool, can_decrypt: bool) -> bool {
        if let Some(wanted) = &self.token_id {
            if wanted != token_id {
                return false;
            }
        }
        if let Some(wanted) = self.can_sign {
            if wanted != can_sign {
                return false;
            }
        }
        if let Some(wanted) = self.can_decrypt {
            if wanted != can_decrypt {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_predicates() {
        let signing = IdentityQuery::for_capability(Capability::Signing);
        assert_eq!(signing.can_sign, Some(true));
        assert_eq!(signing.can_decrypt, None);

        let decryption = IdentityQuery::for_capability(Capability::Decryption);
        assert_eq!(decryption.can_decrypt, Some(true));
        assert_eq!(decryption.can_sign, None);

        for capability in [Capability::Authentication, Capability::All] {
            let query = IdentityQuery::for_capability(capability);
            assert_eq!(query, IdentityQuery::default());
        }
    }

    #[test]
    fn test_query_matching() {
        let query = IdentityQuery::for_capability(Capability::Signing).with_token_id("p:1");
        assert!(query.matches("p:1", true, false));
        assert!(!query.matches("p:1", false, true));
        assert!(!query.matches("p:2", true, true));
    }
}
