//! The built-in `help` command.

use crate::command::{Command, Invocation};

pub const HELP_COMMAND_NAME: &str = "help";
pub const HELP_SHORT_DESCRIPTION: &str = "get more information about a command";

const HELP_DOCUMENTATION: &str = "\
Without an argument, lists every available command.
With a command name, prints that command's documentation and options.";

/// `help [command]`. Unknown names (and `help` itself) fall back to the
/// default listing. Never fails.
pub fn help_command() -> Command {
    Command::build(
        HELP_COMMAND_NAME.to_string(),
        HELP_SHORT_DESCRIPTION.to_string(),
        Box::new(show_help),
    )
    .with_documentation(HELP_DOCUMENTATION)
}

fn show_help(invocation: &Invocation<'_>) -> anyhow::Result<()> {
    let dispatcher = invocation.dispatcher();
    let target = invocation
        .tail()
        .first()
        .filter(|name| name.as_str() != HELP_COMMAND_NAME)
        .and_then(|name| dispatcher.lookup(name));

    match target {
        Some(command) => dispatcher.print_command_help(command),
        None => dispatcher.print_default_help(),
    }
    Ok(())
}
