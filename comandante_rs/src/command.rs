//! Command records and the context an action runs in.

use std::fmt;

use crate::dispatch::Comandante;
use crate::error::{ComandanteError, Result};
use crate::flags::FlagSet;

/// Action body. Receives the invocation context; zero-argument actions are
/// wrapped by [`Command::new`].
pub type ActionFn = dyn Fn(&Invocation<'_>) -> anyhow::Result<()>;
/// Declares a command's options against its option-set.
pub type FlagInitFn = dyn Fn(&mut FlagSet);
/// Runs after the option-set is populated, for cross-option checks.
pub type FlagPostParseFn = dyn Fn(&FlagSet) -> anyhow::Result<()>;

/// One invocable unit: `your-binary <name> [flags] [args]`.
pub struct Command {
    name: String,
    short_description: String,
    documentation: String,
    action: Box<ActionFn>,
    flag_init: Option<Box<FlagInitFn>>,
    flag_post_parse: Option<Box<FlagPostParseFn>>,
    flags: FlagSet,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("short_description", &self.short_description)
            .field("has_flag_init", &self.flag_init.is_some())
            .field("has_flag_post_parse", &self.flag_post_parse.is_some())
            .finish_non_exhaustive()
    }
}

impl Command {
    /// Creates a command with a name, a one line description and an action
    /// that runs when the command is invoked.
    pub fn new<F>(
        name: impl Into<String>,
        short_description: impl Into<String>,
        action: F,
    ) -> Result<Self>
    where
        F: Fn() -> anyhow::Result<()> + 'static,
    {
        Self::with_context(name, short_description, move |_: &Invocation<'_>| action())
    }

    /// Like [`Command::new`], but the action gets the [`Invocation`]: the
    /// dispatcher, the argument vector and the parsed option-set.
    pub fn with_context<F>(
        name: impl Into<String>,
        short_description: impl Into<String>,
        action: F,
    ) -> Result<Self>
    where
        F: Fn(&Invocation<'_>) -> anyhow::Result<()> + 'static,
    {
        let name = name.into();
        if name.is_empty() {
            return Err(ComandanteError::InvalidArgument(
                "command name must not be empty".to_string(),
            ));
        }
        Ok(Self::build(name, short_description.into(), Box::new(action)))
    }

    pub(crate) fn build(name: String, short_description: String, action: Box<ActionFn>) -> Self {
        Self {
            flags: FlagSet::new(name.clone()),
            name,
            short_description,
            documentation: String::new(),
            action,
            flag_init: None,
            flag_post_parse: None,
        }
    }

    /// Longer help text shown by `help <command>`.
    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = documentation.into();
        self
    }

    /// Hook that declares the command's options. Only called when the command
    /// is selected for execution or its detail help is rendered.
    pub fn with_flag_init<F>(mut self, init: F) -> Self
    where
        F: Fn(&mut FlagSet) + 'static,
    {
        self.flag_init = Some(Box::new(init));
        self
    }

    /// Hook run after the options are parsed. An error here is treated like
    /// a flag-parse error.
    pub fn with_flag_post_parse<F>(mut self, post_parse: F) -> Self
    where
        F: Fn(&FlagSet) -> anyhow::Result<()> + 'static,
    {
        self.flag_post_parse = Some(Box::new(post_parse));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn short_description(&self) -> &str {
        &self.short_description
    }

    pub fn documentation(&self) -> &str {
        &self.documentation
    }

    pub fn has_flag_init(&self) -> bool {
        self.flag_init.is_some()
    }

    /// Option-set from the last [`Command::configure_flags`] call. Empty until
    /// the command has been selected.
    pub fn flags(&self) -> &FlagSet {
        &self.flags
    }

    /// Fresh option-set populated by the flag-init hook, for usage listings.
    /// `None` when the command declares no options hook.
    pub fn declared_flags(&self) -> Option<FlagSet> {
        let init = self.flag_init.as_ref()?;
        let mut flags = FlagSet::new(self.name.clone());
        init(&mut flags);
        Some(flags)
    }

    /// Declare options on a fresh option-set, parse `tail` into it and run the
    /// post-parse hook.
    ///
    /// The option-set is kept even when parsing fails, so bindings hold their
    /// defaults.
    pub fn configure_flags<S: AsRef<str>>(&mut self, tail: &[S]) -> Result<()> {
        let mut flags = FlagSet::new(self.name.clone());
        if let Some(init) = &self.flag_init {
            init(&mut flags);
        }
        let parsed = flags.parse(tail);
        self.flags = flags;
        parsed?;

        if let Some(post_parse) = &self.flag_post_parse {
            post_parse(&self.flags).map_err(|e| ComandanteError::FlagParse {
                command: self.name.clone(),
                message: e.to_string(),
            })?;
        }
        Ok(())
    }

    /// Run the action. Its error comes back as [`ComandanteError::Action`].
    pub fn invoke(&self, invocation: &Invocation<'_>) -> Result<()> {
        (self.action)(invocation).map_err(ComandanteError::Action)
    }
}

/// Everything an action can see while it runs.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    dispatcher: &'a Comandante,
    command: &'a Command,
    argv: &'a [String],
}

impl<'a> Invocation<'a> {
    pub fn new(dispatcher: &'a Comandante, command: &'a Command, argv: &'a [String]) -> Self {
        Self {
            dispatcher,
            command,
            argv,
        }
    }

    pub fn dispatcher(&self) -> &'a Comandante {
        self.dispatcher
    }

    pub fn command(&self) -> &'a Command {
        self.command
    }

    /// The full argument vector `run` was called with.
    pub fn argv(&self) -> &'a [String] {
        self.argv
    }

    /// Tokens after the command name.
    pub fn tail(&self) -> &'a [String] {
        self.argv.get(2..).unwrap_or_default()
    }

    pub fn flags(&self) -> &'a FlagSet {
        self.command.flags()
    }

    /// Positional arguments: what the option parser left over, or the whole
    /// tail for commands without options.
    pub fn args(&self) -> &'a [String] {
        if self.command.has_flag_init() {
            self.command.flags().args()
        } else {
            self.tail()
        }
    }
}
