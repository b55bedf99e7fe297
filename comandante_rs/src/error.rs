//! Error types for registration, flag parsing and dispatch.

use thiserror::Error;

/// Everything that can go wrong between registering a command and running it.
#[derive(Debug, Error)]
pub enum ComandanteError {
    /// A constructor argument was rejected (currently: empty command name).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A command with the same name is already registered.
    #[error("A command with the name '{0}' already exists")]
    DuplicateCommand(String),

    /// No command matched the requested name. Only produced in strict mode.
    #[error("unknown command '{name}'{}", suggestion_suffix(.suggestion))]
    UnknownCommand {
        name: String,
        suggestion: Option<String>,
    },

    /// A command's tail arguments could not be parsed into its option-set,
    /// or its post-parse hook rejected them.
    #[error("{command}: {message}")]
    FlagParse { command: String, message: String },

    /// `-h`/`--help` appeared among a command's flags.
    #[error("help requested for '{0}'")]
    HelpRequested(String),

    /// Whatever the command's action reported, passed through untouched.
    #[error(transparent)]
    Action(#[from] anyhow::Error),
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean '{}'?)", s),
        None => String::new(),
    }
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, ComandanteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_message_names_the_command() {
        let err = ComandanteError::DuplicateCommand("test".into());
        assert_eq!(
            err.to_string(),
            "A command with the name 'test' already exists"
        );
    }

    #[test]
    fn unknown_command_mentions_suggestion_when_present() {
        let err = ComandanteError::UnknownCommand {
            name: "hlep".into(),
            suggestion: Some("help".into()),
        };
        assert_eq!(err.to_string(), "unknown command 'hlep' (did you mean 'help'?)");

        let err = ComandanteError::UnknownCommand {
            name: "zzz".into(),
            suggestion: None,
        };
        assert_eq!(err.to_string(), "unknown command 'zzz'");
    }

    #[test]
    fn action_errors_display_verbatim() {
        let err = ComandanteError::from(anyhow::anyhow!("disk on fire"));
        assert_eq!(err.to_string(), "disk on fire");
        assert!(matches!(err, ComandanteError::Action(_)));
    }
}
