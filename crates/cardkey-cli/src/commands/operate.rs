//! Sign+verify and encrypt+decrypt through the orchestrator

use cardkey_crypto::Algorithm;
use cardkey_token::{KeyOperation, Orchestrator, UserPrompt};
use colored::Colorize;
use tracing::info;

use super::Session;
use crate::error::CliResult;

pub struct OperateArgs {
    pub message: String,
    pub select: Vec<usize>,
    pub algorithm: Option<Algorithm>,
    pub json: bool,
}

pub fn handle(session: &Session, operation: KeyOperation, args: OperateArgs) -> CliResult<()> {
    let catalog = session.catalog_with_selection(&args.select)?;

    let candidates = if session.settings.operations.require_selection {
        match catalog.require_selection() {
            Ok(candidates) => candidates,
            Err(error) => {
                print_prompt(&UserPrompt::for_selection_error(&error), args.json)?;
                return Ok(());
            }
        }
    } else {
        catalog.operation_candidates()
    };

    let mut options = session.settings.operations.algorithms;
    if let Some(algorithm) = args.algorithm {
        match operation {
            KeyOperation::SignAndVerify => options.sign_algorithm = algorithm,
            KeyOperation::EncryptAndDecrypt => options.encrypt_algorithm = algorithm,
        }
    }
    info!(
        %operation,
        candidates = candidates.len(),
        sign_algorithm = %options.sign_algorithm,
        encrypt_algorithm = %options.encrypt_algorithm,
        "running operation"
    );

    let orchestrator = Orchestrator::with_options(session.keychain(), options);
    let outcome = orchestrator.run(operation, &candidates, args.message.as_bytes());
    let prompt = UserPrompt::for_outcome(
        operation,
        &args.message,
        &outcome,
        &session.settings.provider.launch_url,
    );
    print_prompt(&prompt, args.json)
}

pub fn print_prompt(prompt: &UserPrompt, json: bool) -> CliResult<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(prompt)?);
        return Ok(());
    }

    let title = match prompt.title.as_str() {
        "Success" => format!("{} {}", "✓".green(), prompt.title.green()),
        "Access Suspended" => format!("! {}", prompt.title).yellow().to_string(),
        _ => format!("{} {}", "✗".red(), prompt.title.red()),
    };
    println!("{title}");
    println!("{}", prompt.message);

    if let (Some(action), Some(url)) = (&prompt.action, &prompt.launch_url) {
        println!();
        println!("{}: {}", action.cyan(), url);
    }
    Ok(())
}
