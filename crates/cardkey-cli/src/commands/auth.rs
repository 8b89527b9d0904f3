use cardkey_token::{Challenge, ChallengeResponder, Disposition, ProtectionSpace, UserPrompt};
use colored::Colorize;

use super::{operate::print_prompt, Session};
use crate::error::{CliError, CliResult};

/// Walk through the challenges a client-certificate protected request
/// raises and show how each is answered.
pub fn handle(session: &Session, select: &[usize], url: Option<String>) -> CliResult<()> {
    let catalog = session.catalog_with_selection(select)?;
    let identity = match catalog.authentication_identity() {
        Ok(identity) => identity,
        Err(error) => return print_prompt(&UserPrompt::for_selection_error(&error), false),
    };

    let auth = &session.settings.auth;
    let url = url.unwrap_or_else(|| auth.url.clone());
    let host = host_of(&url)?;

    println!("{}", format!("认证请求: {url}").cyan());
    println!("  使用身份: {}", identity.label().unwrap_or_default());
    println!("  超时: {} 秒", auth.timeout_secs);

    let responder = ChallengeResponder::new(auth.max_previous_failures);
    let challenges = [
        Challenge::new(host.clone(), ProtectionSpace::ServerTrust),
        Challenge::new(host, ProtectionSpace::ClientCertificate),
    ];

    for challenge in &challenges {
        let disposition = responder.respond(challenge, Some(identity));
        let space = match &challenge.protection_space {
            ProtectionSpace::ServerTrust => "server trust".to_string(),
            ProtectionSpace::ClientCertificate => "client certificate".to_string(),
            ProtectionSpace::Other(method) => method.clone(),
        };
        let answer = match &disposition {
            Disposition::UseCredential(None) => "default trust evaluation".to_string(),
            Disposition::UseCredential(Some(credential)) => format!(
                "credential {} ({} certificate, persistence {:?})",
                credential.identity,
                credential.certificates.len(),
                credential.persistence
            ),
            Disposition::CancelChallenge => "cancel".to_string(),
            Disposition::PerformDefaultHandling => "default handling".to_string(),
        };
        println!("  {} {} -> {}", "•".cyan(), space, answer);
    }

    println!("{} 已准备客户端证书", "✓".green());
    Ok(())
}

fn host_of(url: &str) -> CliResult<String> {
    let rest = url
        .split_once("://")
        .map(|(_, rest)| rest)
        .ok_or_else(|| CliError::InvalidInput(format!("Not a URL: {url}")))?;
    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if host.is_empty() {
        return Err(CliError::InvalidInput(format!("URL has no host: {url}")));
    }
    Ok(host.to_string())
}
