//! Capability-filtered identity discovery

use tracing::{debug, warn};

use crate::{
    provider::IdentityStore,
    types::{Capability, IdentityHandle, IdentityQuery, MatchLimit},
};

/// Token ids belonging to any of the given providers (case-insensitive
/// substring match)
pub fn filter_token_ids(token_ids: &[String], provider_ids: &[String]) -> Vec<String> {
    token_ids
        .iter()
        .filter(|token_id| {
            let token_id = token_id.to_lowercase();
            provider_ids
                .iter()
                .any(|provider| token_id.contains(&provider.to_lowercase()))
        })
        .cloned()
        .collect()
}

/// 查询具备指定能力的身份
///
/// Store failures are logged and yield no identities. With a provider
/// allowlist each matching token is queried on its own and contributes at
/// most one identity.
pub fn find_identities(
    store: &dyn IdentityStore,
    capability: Capability,
    provider_ids: Option<&[String]>,
) -> Vec<IdentityHandle> {
    let query = IdentityQuery::for_capability(capability);

    let Some(provider_ids) = provider_ids else {
        return match store.copy_matching(&query.with_match_limit(MatchLimit::All)) {
            Ok(handles) => {
                debug!(%capability, count = handles.len(), "identity query");
                handles
            }
            Err(status) => {
                warn!(%capability, code = status.code(), "identity query failed: {}", status.message());
                Vec::new()
            }
        };
    };

    let token_ids = match store.token_ids() {
        Ok(ids) => ids,
        Err(status) => {
            warn!(code = status.code(), "listing tokens failed: {}", status.message());
            return Vec::new();
        }
    };

    let mut handles = Vec::new();
    for token_id in filter_token_ids(&token_ids, provider_ids) {
        let token_query = query
            .clone()
            .with_token_id(token_id.clone())
            .with_match_limit(MatchLimit::One);
        match store.copy_matching(&token_query) {
            Ok(found) => handles.extend(found),
            Err(status) => warn!(
                %token_id,
                %capability,
                code = status.code(),
                "identity query failed: {}",
                status.message()
            ),
        }
    }
    debug!(%capability, count = handles.len(), "identity query by provider");
    handles
}
