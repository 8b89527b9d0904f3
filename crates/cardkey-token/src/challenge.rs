//! TLS authentication challenge handling

use cardkey_pki::Certificate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{keys::Identity, types::IdentityHandle};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ProtectionSpace {
    ServerTrust,
    ClientCertificate,
    Other(String),
}

/// An authentication challenge raised by the HTTP transport
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Challenge {
    pub host: String,
    pub protection_space: ProtectionSpace,
    pub previous_failure_count: u32,
}

impl Challenge {
    pub fn new(host: impl Into<String>, protection_space: ProtectionSpace) -> Self {
        Self {
            host: host.into(),
            protection_space,
            previous_failure_count: 0,
        }
    }

    pub fn with_previous_failures(mut self, count: u32) -> Self {
        self.previous_failure_count = count;
        self
    }
}

/// How long a credential may be kept by the transport
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Persistence {
    None,
    ForSession,
    Permanent,
}

/// Identity plus its certificate chain, handed to the transport
#[derive(Clone, Debug, PartialEq)]
pub struct ClientCredential {
    pub identity: IdentityHandle,
    pub certificates: Vec<Certificate>,
    pub persistence: Persistence,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Disposition {
    /// `None` asks the transport to evaluate server trust itself
    UseCredential(Option<ClientCredential>),
    CancelChallenge,
    PerformDefaultHandling,
}

/// 客户端证书质询应答器
#[derive(Clone, Debug)]
pub struct ChallengeResponder {
    max_previous_failures: u32,
}

impl Default for ChallengeResponder {
    fn default() -> Self {
        Self {
            max_previous_failures: 3,
        }
    }
}

impl ChallengeResponder {
    pub fn new(max_previous_failures: u32) -> Self {
        Self {
            max_previous_failures,
        }
    }

    pub fn respond(&self, challenge: &Challenge, identity: Option<&Identity>) -> Disposition {
        if challenge.previous_failure_count > self.max_previous_failures {
            warn!(
                host = %challenge.host,
                failures = challenge.previous_failure_count,
                "too many failed attempts, cancelling challenge"
            );
            return Disposition::CancelChallenge;
        }

        match &challenge.protection_space {
            ProtectionSpace::ServerTrust => {
                debug!(host = %challenge.host, "server trust challenge");
                Disposition::UseCredential(None)
            }
            ProtectionSpace::ClientCertificate => match identity {
                Some(identity) => {
                    info!(host = %challenge.host, identity = %identity.handle, "presenting client certificate");
                    Disposition::UseCredential(Some(ClientCredential {
                        identity: identity.handle.clone(),
                        certificates: vec![identity.certificate.clone()],
                        persistence: Persistence::None,
                    }))
                }
                None => {
                    warn!(host = %challenge.host, "client certificate requested but no identity selected");
                    Disposition::CancelChallenge
                }
            },
            ProtectionSpace::Other(method) => {
                debug!(host = %challenge.host, %method, "default handling");
                Disposition::PerformDefaultHandling
            }
        }
    }
}
