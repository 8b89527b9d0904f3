use cardkey_pki::CertificatePurpose;
use colored::Colorize;

use crate::error::{CliError, CliResult};

pub fn handle(specifier: &str, json: bool) -> CliResult<()> {
    let parsed = CertificatePurpose::parse_purposes_specifier(specifier);

    if json {
        println!("{}", serde_json::to_string_pretty(&parsed)?);
    } else {
        println!("{}", format!("用途说明: {specifier}").cyan());
        println!("  简写: {}", parsed.short_form);
        for report in &parsed.reports {
            println!("  {report}");
        }
    }

    if !parsed.ok {
        return Err(CliError::InvalidInput(format!(
            "Invalid purposes specifier \"{specifier}\""
        )));
    }
    Ok(())
}
