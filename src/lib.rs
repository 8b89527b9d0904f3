//! # Cardkey
//!
//! 智能卡令牌身份的发现、密钥操作和客户端认证
//!
//! ## 模块
//!
//! - `cardkey_crypto` - RSA / P-256 基础加密原语
//! - `cardkey_pki` - 证书、用途和测试CA
//! - `cardkey_token` - 身份查询、密钥操作和编排

// Re-export all sub-crates
pub use cardkey_crypto;
pub use cardkey_pki;
pub use cardkey_token;
