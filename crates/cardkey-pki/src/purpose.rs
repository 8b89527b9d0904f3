//! 证书用途
//!
//! A certificate can carry any combination of the three purposes below. A
//! purposes specifier such as `"Auth,EncryptSign"` (short form `"a,es"`)
//! describes a set of certificates, one per comma-separated group.

use std::fmt;

use serde::{Deserialize, Serialize};

/// X.509 key usage bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyUsage {
    DigitalSignature,
    NonRepudiation,
    KeyEncipherment,
    DataEncipherment,
    KeyAgreement,
    KeyCertSign,
    CrlSign,
    EncipherOnly,
    DecipherOnly,
}

impl KeyUsage {
    pub fn name(&self) -> &'static str {
        match self {
            KeyUsage::DigitalSignature => "digitalSignature",
            KeyUsage::NonRepudiation => "nonRepudiation",
            KeyUsage::KeyEncipherment => "keyEncipherment",
            KeyUsage::DataEncipherment => "dataEncipherment",
            KeyUsage::KeyAgreement => "keyAgreement",
            KeyUsage::KeyCertSign => "keyCertSign",
            KeyUsage::CrlSign => "cRLSign",
            KeyUsage::EncipherOnly => "encipherOnly",
            KeyUsage::DecipherOnly => "decipherOnly",
        }
    }

    pub(crate) fn to_rcgen(self) -> rcgen::KeyUsagePurpose {
        use rcgen::KeyUsagePurpose;

        match self {
            KeyUsage::DigitalSignature => KeyUsagePurpose::DigitalSignature,
            KeyUsage::NonRepudiation => KeyUsagePurpose::ContentCommitment,
            KeyUsage::KeyEncipherment => KeyUsagePurpose::KeyEncipherment,
            KeyUsage::DataEncipherment => KeyUsagePurpose::DataEncipherment,
            KeyUsage::KeyAgreement => KeyUsagePurpose::KeyAgreement,
            KeyUsage::KeyCertSign => KeyUsagePurpose::KeyCertSign,
            KeyUsage::CrlSign => KeyUsagePurpose::CrlSign,
            KeyUsage::EncipherOnly => KeyUsagePurpose::EncipherOnly,
            KeyUsage::DecipherOnly => KeyUsagePurpose::DecipherOnly,
        }
    }
}

impl fmt::Display for KeyUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// X.509 extended key usages this crate recognises by name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExtendedKeyUsage {
    ServerAuth,
    ClientAuth,
    CodeSigning,
    EmailProtection,
    TimeStamping,
    OcspSigning,
    /// Any other purpose, by dotted OID
    Other(String),
}

impl ExtendedKeyUsage {
    pub(crate) fn to_rcgen(&self) -> Option<rcgen::ExtendedKeyUsagePurpose> {
        use rcgen::ExtendedKeyUsagePurpose;

        match self {
            ExtendedKeyUsage::ServerAuth => Some(ExtendedKeyUsagePurpose::ServerAuth),
            ExtendedKeyUsage::ClientAuth => Some(ExtendedKeyUsagePurpose::ClientAuth),
            ExtendedKeyUsage::CodeSigning => Some(ExtendedKeyUsagePurpose::CodeSigning),
            ExtendedKeyUsage::EmailProtection => Some(ExtendedKeyUsagePurpose::EmailProtection),
            ExtendedKeyUsage::TimeStamping => Some(ExtendedKeyUsagePurpose::TimeStamping),
            ExtendedKeyUsage::OcspSigning => Some(ExtendedKeyUsagePurpose::OcspSigning),
            ExtendedKeyUsage::Other(_) => None,
        }
    }
}

impl fmt::Display for ExtendedKeyUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtendedKeyUsage::ServerAuth => f.write_str("serverAuth"),
            ExtendedKeyUsage::ClientAuth => f.write_str("clientAuth"),
            ExtendedKeyUsage::CodeSigning => f.write_str("codeSigning"),
            ExtendedKeyUsage::EmailProtection => f.write_str("emailProtection"),
            ExtendedKeyUsage::TimeStamping => f.write_str("timeStamping"),
            ExtendedKeyUsage::OcspSigning => f.write_str("OCSPSigning"),
            ExtendedKeyUsage::Other(oid) => f.write_str(oid),
        }
    }
}

/// 客户端证书用途
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CertificatePurpose {
    Authentication,
    Encryption,
    Signature,
}

impl CertificatePurpose {
    pub const ALL: [CertificatePurpose; 3] = [
        CertificatePurpose::Authentication,
        CertificatePurpose::Encryption,
        CertificatePurpose::Signature,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CertificatePurpose::Authentication => "Authentication",
            CertificatePurpose::Encryption => "Encryption",
            CertificatePurpose::Signature => "Signature",
        }
    }

    pub fn key_usages(&self) -> &'static [KeyUsage] {
        match self {
            CertificatePurpose::Authentication => {
                &[KeyUsage::KeyEncipherment, KeyUsage::KeyAgreement]
            }
            CertificatePurpose::Encryption => &[KeyUsage::DataEncipherment],
            CertificatePurpose::Signature => {
                &[KeyUsage::NonRepudiation, KeyUsage::DigitalSignature]
            }
        }
    }

    pub fn extended_key_usages(&self) -> &'static [ExtendedKeyUsage] {
        match self {
            CertificatePurpose::Authentication => &[ExtendedKeyUsage::ClientAuth],
            CertificatePurpose::Encryption | CertificatePurpose::Signature => {
                &[ExtendedKeyUsage::EmailProtection]
            }
        }
    }

    /// Word used in the long form of a purposes specifier
    pub fn human_suffix(&self) -> &'static str {
        match self {
            CertificatePurpose::Authentication => "Auth",
            CertificatePurpose::Encryption => "Encrypt",
            CertificatePurpose::Signature => "Sign",
        }
    }

    /// The default specifier: one certificate with every purpose
    pub fn human_suffixes() -> String {
        Self::ALL.iter().map(|p| p.human_suffix()).collect()
    }

    /// File name suffix for a purpose set, e.g. `_Auth_Encr_Sign`
    pub fn suffix(purposes: &[CertificatePurpose]) -> String {
        purposes
            .iter()
            .map(|p| format!("_{}", &p.name()[..4]))
            .collect()
    }

    /// Union of key usages over a purpose set, in first-seen order
    pub fn combined_key_usages(purposes: &[CertificatePurpose]) -> Vec<KeyUsage> {
        let mut usages = Vec::new();
        for usage in purposes.iter().flat_map(|p| p.key_usages()) {
            if !usages.contains(usage) {
                usages.push(*usage);
            }
        }
        usages
    }

    pub fn combined_extended_key_usages(purposes: &[CertificatePurpose]) -> Vec<ExtendedKeyUsage> {
        let mut usages: Vec<ExtendedKeyUsage> = Vec::new();
        for usage in purposes.iter().flat_map(|p| p.extended_key_usages()) {
            if !usages.contains(usage) {
                usages.push(usage.clone());
            }
        }
        usages
    }

    /// Reduce a specifier to lower-case initials, keeping group separators.
    ///
    /// In a mixed-case specifier every upper-case letter starts a purpose and
    /// lower-case letters are skipped. An all lower-case specifier is already
    /// in short form. Any other character ends the current group.
    pub fn short_form(specifier: &str) -> String {
        let all_lower = is_lower(specifier);
        let mut short = String::new();
        let mut start_group = true;

        for ch in specifier.chars() {
            if start_group {
                if ch.is_lowercase() || ch.is_uppercase() {
                    short.extend(ch.to_lowercase());
                    start_group = false;
                }
                continue;
            }

            if ch.is_uppercase() {
                short.extend(ch.to_lowercase());
                continue;
            }

            if all_lower && ch.is_lowercase() {
                short.push(ch);
                continue;
            }

            if !ch.is_lowercase() {
                short.push(',');
                start_group = true;
            }
        }

        short
    }

    pub fn parse_purposes_specifier(specifier: &str) -> PurposeParse {
        let short_form = Self::short_form(specifier);
        let mut certificates: Vec<Vec<CertificatePurpose>> = Vec::new();
        let mut reports = Vec::new();
        let mut ok = true;

        for group in short_form.split(',') {
            let mut purposes = Vec::new();
            let mut repeated = false;
            for initial in group.chars() {
                let found = Self::ALL
                    .iter()
                    .find(|p| p.name().to_lowercase().starts_with(initial));
                if let Some(purpose) = found {
                    if purposes.contains(purpose) {
                        repeated = true;
                    }
                    purposes.push(*purpose);
                }
            }

            let duplicate = certificates.iter().any(|earlier| {
                earlier.len() == purposes.len() && earlier.iter().all(|p| purposes.contains(p))
            });

            let error = if repeated {
                Some("Repeated purpose")
            } else if duplicate {
                Some("Duplicate")
            } else if purposes.is_empty() {
                Some("No purposes")
            } else if group.chars().count() != purposes.len() {
                Some("Mismatch")
            } else {
                None
            };

            let names = purposes
                .iter()
                .map(|p| p.name())
                .collect::<Vec<_>>()
                .join(",");
            reports.push(format!("{} \"{}\" {}", error.unwrap_or("OK"), group, names));
            ok = ok && error.is_none();
            certificates.push(purposes);
        }

        PurposeParse {
            ok: ok && !certificates.is_empty(),
            short_form,
            certificates,
            reports,
        }
    }
}

impl fmt::Display for CertificatePurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of parsing a purposes specifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurposeParse {
    pub short_form: String,
    /// One purpose list per certificate to issue
    pub certificates: Vec<Vec<CertificatePurpose>>,
    pub ok: bool,
    /// One report line per certificate
    pub reports: Vec<String>,
}

fn is_lower(s: &str) -> bool {
    let mut cased = false;
    for ch in s.chars() {
        if ch.is_uppercase() {
            return false;
        }
        if ch.is_lowercase() {
            cased = true;
        }
    }
    cased
}

#[cfg(test)]
mod tests {
    use super::*;
    use CertificatePurpose::*;

    #[test]
    fn test_short_form() {
        assert_eq!(CertificatePurpose::short_form("AuthEncryptSign"), "aes");
        assert_eq!(CertificatePurpose::short_form("Auth,EncryptSign"), "a,es");
        assert_eq!(CertificatePurpose::short_form("aes"), "aes");
        assert_eq!(CertificatePurpose::short_form("a,es"), "a,es");
        assert_eq!(CertificatePurpose::short_form("Sign Auth"), "s,a");
    }

    #[test]
    fn test_default_specifier() {
        assert_eq!(CertificatePurpose::human_suffixes(), "AuthEncryptSign");

        let parse = CertificatePurpose::parse_purposes_specifier("AuthEncryptSign");
        assert!(parse.ok);
        assert_eq!(parse.certificates, vec![vec![Authentication, Encryption, Signature]]);
        assert_eq!(parse.reports, vec!["OK \"aes\" Authentication,Encryption,Signature"]);
        assert_eq!(
            CertificatePurpose::suffix(&parse.certificates[0]),
            "_Auth_Encr_Sign"
        );
    }

    #[test]
    fn test_two_certificates() {
        let parse = CertificatePurpose::parse_purposes_specifier("a,es");
        assert!(parse.ok);
        assert_eq!(
            parse.certificates,
            vec![vec![Authentication], vec![Encryption, Signature]]
        );
    }

    #[test]
    fn test_failure_reports() {
        let repeated = CertificatePurpose::parse_purposes_specifier("aa");
        assert!(!repeated.ok);
        assert!(repeated.reports[0].starts_with("Repeated purpose"));

        let duplicate = CertificatePurpose::parse_purposes_specifier("es,se");
        assert!(!duplicate.ok);
        assert_eq!(duplicate.reports[0], "OK \"es\" Encryption,Signature");
        assert!(duplicate.reports[1].starts_with("Duplicate"));

        let mismatch = CertificatePurpose::parse_purposes_specifier("ax");
        assert!(!mismatch.ok);
        assert_eq!(mismatch.reports[0], "Mismatch \"ax\" Authentication");

        let empty = CertificatePurpose::parse_purposes_specifier("");
        assert!(!empty.ok);
        assert!(empty.reports[0].starts_with("No purposes"));
    }

    #[test]
    fn test_combined_usages_are_deduplicated() {
        let ekus = CertificatePurpose::combined_extended_key_usages(&[Encryption, Signature]);
        assert_eq!(ekus, vec![ExtendedKeyUsage::EmailProtection]);

        let usages = CertificatePurpose::combined_key_usages(&[Authentication, Signature]);
        assert_eq!(
            usages,
            vec![
                KeyUsage::KeyEncipherment,
                KeyUsage::KeyAgreement,
                KeyUsage::NonRepudiation,
                KeyUsage::DigitalSignature
            ]
        );
    }
}
