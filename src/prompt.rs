use colored::*;
use std::io::{self, BufRead, Write};
use tracing::error;

use pan_renumber::error::Error;
use pan_renumber::model::{RemoteNode, RenamedItem};
use pan_renumber::orchestrator::{DestinationDecision, DestinationPolicy};
use pan_renumber::scanner::{FailureDecision, FailurePolicy};

pub fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let stdin = io::stdin();
    prompt_confirm_from(&mut stdin.lock(), prompt, default)
}

fn prompt_confirm_from<R: BufRead>(
    input: &mut R,
    prompt: &str,
    default: Option<bool>,
) -> io::Result<bool> {
    let mut line = String::new();

    loop {
        line.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        if input.read_line(&mut line)? == 0 {
            // EOF: nobody is there to answer
            return Ok(default.unwrap_or(false));
        }

        match line.trim().to_uppercase().as_str() {
            "Y" | "YES" => return Ok(true),
            "N" | "NO" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}

/// Read one trimmed line; empty on EOF.
pub fn prompt_line(prompt: &str) -> io::Result<String> {
    print!("{}: ", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Asks the operator whether to skip a subtree whose listing failed.
pub struct AskOnFailure;

impl FailurePolicy for AskOnFailure {
    fn on_list_failure(&self, directory: &RemoteNode, err: &Error) -> FailureDecision {
        println!(
            "{} {} ({})",
            "Could not list".red(),
            directory.path.bold(),
            err
        );
        match prompt_confirm("Skip this folder and continue?", Some(true)) {
            Ok(true) => FailureDecision::Skip,
            Ok(false) => FailureDecision::Abort,
            Err(err) => {
                error!("Reading answer failed: {}", err);
                FailureDecision::Abort
            }
        }
    }
}

/// Asks for a destination id when none could be resolved.
pub struct AskForDestination;

impl DestinationPolicy for AskForDestination {
    fn on_unresolved(&self, renamed: &[RenamedItem]) -> DestinationDecision {
        println!(
            "{} {} files were renamed but the destination folder is unknown.",
            "!".yellow(),
            renamed.len()
        );
        match prompt_confirm("Enter a destination folder id by hand?", Some(false)) {
            Ok(true) => match prompt_line("Destination folder id") {
                Ok(id) => DestinationDecision::Manual(id),
                Err(err) => {
                    error!("Reading destination failed: {}", err);
                    DestinationDecision::RenameOnly
                }
            },
            Ok(false) => DestinationDecision::RenameOnly,
            Err(err) => {
                error!("Reading answer failed: {}", err);
                DestinationDecision::RenameOnly
            }
        }
    }
}
