use std::{fs, path::PathBuf};

use cardkey_pki::{AuthorityConfig, CertificateAuthority};
use colored::Colorize;

use crate::error::CliResult;

pub struct IssueArgs {
    pub clients: Vec<String>,
    pub output: PathBuf,
    pub purposes: Option<String>,
    pub copies: Option<u32>,
}

pub fn handle(mut config: AuthorityConfig, args: IssueArgs) -> CliResult<()> {
    if let Some(purposes) = args.purposes {
        config = config.with_purposes(&purposes);
    }
    if let Some(copies) = args.copies {
        config = config.with_copies(copies);
    }

    println!("{}", format!("创建CA: {}", config.common_name()).cyan());
    let authority = CertificateAuthority::create(config)?;

    if !args.output.exists() {
        fs::create_dir_all(&args.output)?;
    }
    let (cert_path, _) = authority.write_authority(&args.output)?;
    println!("{} CA证书已保存到: {:?}", "✓".green(), cert_path);

    for identity in authority.issue_all(args.clients.as_slice())? {
        let (cert_path, key_path) = identity.write_to(&args.output)?;
        let purposes: Vec<&str> = identity.purposes.iter().map(|p| p.name()).collect();
        println!(
            "{} {} [{}]",
            "✓".green(),
            identity.email.bold(),
            purposes.join(", ")
        );
        println!("    证书: {:?}", cert_path);
        println!("    私钥: {:?}", key_path);
        println!(
            "    指纹: {}",
            &identity.certificate.fingerprint_sha256()[..16]
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use cardkey_pki::KeyAlgorithm;

    use super::*;

    #[test]
    fn test_issue_writes_depot() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("depot");
        let config = AuthorityConfig::default()
            .with_key_algorithms(KeyAlgorithm::P256, KeyAlgorithm::P256);

        handle(
            config,
            IssueArgs {
                clients: vec!["user01".to_string()],
                output: output.clone(),
                purposes: Some("a,es".to_string()),
                copies: None,
            },
        )
        .unwrap();

        assert!(output.join("authority.cer.pem").exists());
        assert!(output.join("user01_Auth.cer.pem").exists());
        assert!(output.join("user01_Encr_Sign.key.pem").exists());
    }
}
