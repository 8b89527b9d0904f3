//! Cardkey PKI - 证书解析与测试CA
//!
//! 提供X.509证书摘要、证书用途说明解析，以及用于签发测试身份的CA

pub mod ca;
pub mod cert;
pub mod error;
pub mod purpose;

pub use ca::{AuthorityConfig, CertificateAuthority, IssuedIdentity, KeyAlgorithm};
pub use cert::{
    export_certificate, import_certificate, import_pem_bundle, load_certificate_file, Certificate,
    CertificateInfo,
};
pub use error::{PkiError, Result};
pub use purpose::{CertificatePurpose, ExtendedKeyUsage, KeyUsage, PurposeParse};
