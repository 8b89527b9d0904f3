//! Cryptographic primitives behind token-held keys
//!
//! RSA and P-256 keys with algorithm-selected signing, verification,
//! encryption and decryption.

pub mod algorithm;
pub mod asymmetric;
pub mod error;
pub mod public_key;

pub use algorithm::{Algorithm, KeyType, OperationType};
pub use asymmetric::{PrivateKey, Rsa, P256};
pub use error::{Error, Result};
pub use public_key::PublicKey;
