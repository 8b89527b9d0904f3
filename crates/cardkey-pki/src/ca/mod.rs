pub mod authority;
pub mod config;

pub use authority::{CertificateAuthority, IssuedIdentity};
pub use config::{AuthorityConfig, KeyAlgorithm};
