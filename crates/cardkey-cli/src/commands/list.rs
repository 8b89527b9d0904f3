use cardkey_token::{find_identities, Capability, Identity};
use colored::Colorize;

use super::Session;
use crate::error::CliResult;

pub fn handle(session: &Session, capability: Option<Capability>, json: bool) -> CliResult<()> {
    let identities: Vec<Identity> = match capability {
        Some(capability) => {
            let store = session.keychain.as_ref();
            let allowed = session.settings.provider.allowed_provider_ids.as_deref();
            find_identities(store, capability, allowed)
                .iter()
                .filter_map(|handle| Identity::resolve(store, handle).ok())
                .collect()
        }
        None => session.catalog().identities().to_vec(),
    };

    if json {
        let infos = identities
            .iter()
            .map(|identity| identity.certificate.info())
            .collect::<Result<Vec<_>, _>>()?;
        println!("{}", serde_json::to_string_pretty(&infos)?);
        return Ok(());
    }

    let title = match capability {
        Some(capability) => format!("{capability} 身份:"),
        None => "所有身份:".to_string(),
    };
    println!("{}", title.cyan());
    let token = &session.token;
    if token.is_suspended() {
        println!("  令牌: {} {}", token.token_id(), "(已暂停)".yellow());
    } else {
        println!("  令牌: {}", token.token_id());
    }

    if identities.is_empty() {
        println!("  {}", "未找到身份".yellow());
        return Ok(());
    }

    for (index, identity) in identities.iter().enumerate() {
        let certificate = &identity.certificate;
        println!(
            "  [{}] {}",
            index,
            identity.label().unwrap_or_default().bold()
        );
        println!("      句柄: {}", identity.handle);
        println!("      序列号: {}", certificate.serial_hex());
        println!("      颁发者: {}", certificate.issuer());
        if let Ok(Some(usages)) = certificate.key_usages() {
            let names: Vec<&str> = usages.iter().map(|u| u.name()).collect();
            println!("      密钥用途: {}", names.join(", "));
        }
        if let Ok(usages) = certificate.extended_key_usages() {
            if !usages.is_empty() {
                let names: Vec<String> = usages.iter().map(|u| u.to_string()).collect();
                println!("      扩展用途: {}", names.join(", "));
            }
        }
        println!("      SHA-256: {}", certificate.fingerprint_sha256());
        if let Ok(public_key) = certificate.public_key() {
            let fingerprint = public_key.fingerprint()?;
            println!(
                "      公钥: {} {} 位, 指纹 {}",
                public_key.key_type().name(),
                public_key.size_bits(),
                hex::encode(&fingerprint[..8])
            );
        }
    }

    Ok(())
}
