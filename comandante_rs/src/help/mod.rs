//! Help text: the all-commands listing and per-command detail.
//!
//! Default listing layout:
//!
//! ```text
//! {description}
//!
//! Usage:
//! 	{binary} command [arguments]
//!
//! Available commands: 
//! {padded name}  {short description}
//!
//! Use "{binary} help [command]" for more information about a command.
//! ```
//!
//! The last line only appears when a `help` command is registered.

mod builtin;
mod printable;

use std::io::{self, Write};

use crate::command::Command;

pub use builtin::{HELP_COMMAND_NAME, HELP_SHORT_DESCRIPTION, help_command};
pub use printable::{PrintableCommand, collect_printable};

/// Renders help for one registry snapshot.
#[derive(Debug, Clone, Copy)]
pub struct HelpRenderer<'a> {
    binary_name: &'a str,
    description: &'a str,
    commands: &'a [Command],
}

impl<'a> HelpRenderer<'a> {
    pub fn new(binary_name: &'a str, description: &'a str, commands: &'a [Command]) -> Self {
        Self {
            binary_name,
            description,
            commands,
        }
    }

    /// Aligned, name-sorted rows for the listing. Built fresh on every call.
    pub fn printable_commands(&self) -> Vec<PrintableCommand> {
        collect_printable(self.commands)
    }

    fn shows_help_hint(&self) -> bool {
        self.commands
            .iter()
            .any(|cmd| cmd.name() == HELP_COMMAND_NAME)
    }

    pub fn render_default(&self, w: &mut dyn Write) -> io::Result<()> {
        write!(
            w,
            "{}\n\nUsage:\n\t{} command [arguments]\n\nAvailable commands: ",
            self.description, self.binary_name
        )?;
        for row in self.printable_commands() {
            write!(w, "\n{}  {}", row.padded_name, row.description)?;
        }
        writeln!(w)?;
        if self.shows_help_hint() {
            write!(
                w,
                "\nUse \"{} help [command]\" for more information about a command.\n",
                self.binary_name
            )?;
        }
        writeln!(w)
    }

    /// Name line, documentation, then the option listing when the command
    /// declares options.
    pub fn render_command_detail(&self, w: &mut dyn Write, command: &Command) -> io::Result<()> {
        writeln!(w, "{} {}", self.binary_name, command.name())?;
        let documentation = command.documentation();
        if !documentation.is_empty() {
            write!(w, "{}", documentation)?;
            if !documentation.ends_with('\n') {
                writeln!(w)?;
            }
        }

        if let Some(flags) = command.declared_flags() {
            write!(w, "\noptions\n")?;
            flags.print_defaults(w)?;
        }
        Ok(())
    }
}
