//! CA配置管理
//!
//! 提供测试CA的配置结构和默认值

use serde::{Deserialize, Serialize};

use crate::{
    error::{PkiError, Result},
    purpose::{CertificatePurpose, PurposeParse},
};

/// CA配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorityConfig {
    /// 附加到非邮箱客户端名称后的域名
    pub domain: String,
    /// CA文件名主干，CA的CN为 `{stem}.{domain}`
    pub authority_stem: String,
    /// 国家（两个字符）
    pub country: String,
    /// 省/州
    pub state: String,
    /// 城市
    pub locality: String,
    /// 组织
    pub organisation: String,
    /// 组织单位
    pub organisational_unit: String,
    /// 证书用途说明，例如 "AuthEncryptSign" 或 "a,es"
    pub purposes: String,
    /// 每张证书的副本数，每个副本有独立私钥
    pub copies: u32,
    /// CA证书有效期（天）
    pub validity_days: u32,
    /// 客户端证书有效期（天）
    pub client_validity_days: u32,
    /// CA密钥算法
    pub key_algorithm: KeyAlgorithm,
    /// 客户端密钥算法
    pub client_key_algorithm: KeyAlgorithm,
}

/// 支持的密钥算法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyAlgorithm {
    /// RSA 2048 (默认)
    Rsa2048,
    /// ECDSA P-256
    P256,
}

impl Default for KeyAlgorithm {
    fn default() -> Self {
        Self::Rsa2048
    }
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            domain: "example.com".to_string(),
            authority_stem: "authority".to_string(),
            country: "UK".to_string(),
            state: "Example State".to_string(),
            locality: "Example Locality".to_string(),
            organisation: "Example Organisation".to_string(),
            organisational_unit: "Example Unit".to_string(),
            purposes: CertificatePurpose::human_suffixes(),
            copies: 1,
            validity_days: 3650,
            client_validity_days: 365,
            key_algorithm: KeyAlgorithm::default(),
            client_key_algorithm: KeyAlgorithm::default(),
        }
    }
}

impl AuthorityConfig {
    pub fn common_name(&self) -> String {
        format!("{}.{}", self.authority_stem, self.domain)
    }

    /// 设置地理位置信息
    pub fn with_location(mut self, country: &str, state: &str, locality: &str) -> Self {
        self.country = country.to_string();
        self.state = state.to_string();
        self.locality = locality.to_string();
        self
    }

    pub fn with_purposes(mut self, purposes: &str) -> Self {
        self.purposes = purposes.to_string();
        self
    }

    pub fn with_copies(mut self, copies: u32) -> Self {
        self.copies = copies;
        self
    }

    pub fn with_key_algorithms(mut self, authority: KeyAlgorithm, client: KeyAlgorithm) -> Self {
        self.key_algorithm = authority;
        self.client_key_algorithm = client;
        self
    }

    /// 校验配置并解析用途说明
    pub fn validate(&self) -> Result<PurposeParse> {
        if self.country.chars().count() > 2 {
            return Err(PkiError::ConfigError(format!(
                "Country code \"{}\" is longer than 2 characters",
                self.country
            )));
        }
        if self.domain.is_empty() {
            return Err(PkiError::ConfigError("Domain must not be empty".to_string()));
        }
        if self.copies == 0 {
            return Err(PkiError::ConfigError("Copies must be at least 1".to_string()));
        }

        let parse = CertificatePurpose::parse_purposes_specifier(&self.purposes);
        if !parse.ok {
            return Err(PkiError::PurposesError {
                specifier: self.purposes.clone(),
                reports: parse.reports,
            });
        }
        Ok(parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AuthorityConfig::default();
        assert_eq!(config.common_name(), "authority.example.com");
        assert_eq!(config.purposes, "AuthEncryptSign");
        let parse = config.validate().unwrap();
        assert_eq!(parse.certificates.len(), 1);
    }

    #[test]
    fn test_country_code_length() {
        let config = AuthorityConfig::default().with_location("GBR", "State", "Town");
        assert!(matches!(config.validate(), Err(PkiError::ConfigError(_))));
    }

    #[test]
    fn test_bad_purposes() {
        let config = AuthorityConfig::default().with_purposes("aa");
        match config.validate() {
            Err(PkiError::PurposesError { reports, .. }) => {
                assert!(reports[0].starts_with("Repeated purpose"))
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AuthorityConfig =
            serde_json::from_str(r#"{"domain": "corp.test", "key_algorithm": "p256"}"#).unwrap();
        assert_eq!(config.domain, "corp.test");
        assert_eq!(config.key_algorithm, KeyAlgorithm::P256);
        assert_eq!(config.country, "UK");
    }
}
