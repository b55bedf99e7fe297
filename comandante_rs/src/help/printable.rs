//! Rendering-only projection of a command for the default listing.

use std::cmp::Ordering;

use crate::command::Command;

/// A command name padded to the listing's column width, plus its one line
/// description. Ordered by the padded name only.
#[derive(Debug, Clone)]
pub struct PrintableCommand {
    pub padded_name: String,
    pub description: String,
}

impl PartialEq for PrintableCommand {
    fn eq(&self, other: &Self) -> bool {
        self.padded_name == other.padded_name
    }
}

impl Eq for PrintableCommand {}

impl PartialOrd for PrintableCommand {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PrintableCommand {
    fn cmp(&self, other: &Self) -> Ordering {
        self.padded_name.cmp(&other.padded_name)
    }
}

/// Pad every name to the longest one, then sort.
///
/// The sort key is the padded string, so padding has to happen first.
pub fn collect_printable(commands: &[Command]) -> Vec<PrintableCommand> {
    let width = commands
        .iter()
        .map(|cmd| cmd.name().chars().count())
        .max()
        .unwrap_or(0);

    let mut printable: Vec<PrintableCommand> = commands
        .iter()
        .map(|cmd| PrintableCommand {
            padded_name: format!("{:<width$}", cmd.name(), width = width),
            description: cmd.short_description().to_string(),
        })
        .collect();
    printable.sort();
    printable
}
