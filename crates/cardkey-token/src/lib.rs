//! 智能卡令牌身份的使用方核心
//!
//! Discovers identities by capability, resolves their key references and
//! runs sign/verify and encrypt/decrypt through the token provider.

pub mod catalog;
pub mod challenge;
pub mod error;
pub mod executor;
pub mod keys;
pub mod orchestrator;
pub mod prompt;
pub mod provider;
pub mod query;
pub mod store;
pub mod types;

pub use catalog::{IdentityCatalog, IdentitySummary, SelectionError};
pub use challenge::{
    Challenge, ChallengeResponder, ClientCredential, Disposition, Persistence, ProtectionSpace,
};
pub use error::{Error, Result, StoreStatus, TokenError, TokenErrorCode};
pub use executor::OperationError;
pub use keys::{keys_from_identity, Identity, KeyPair};
pub use orchestrator::{KeyOperation, OperationFailure, OperationOptions, Orchestrator, Outcome};
pub use prompt::{UserPrompt, DEFAULT_LAUNCH_URL};
pub use provider::{IdentityStore, Keychain, ProviderChannel};
pub use query::{filter_token_ids, find_identities};
pub use store::{
    create_keychain, create_token, load_depot, SoftKeychain, SoftToken, TokenConfig, TokenSource,
};
pub use types::{Capability, IdentityHandle, IdentityQuery, MatchLimit, PrivateKeyHandle};
