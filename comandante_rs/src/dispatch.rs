//! The command registry and the run protocol.
//!
//! ```text
//! argv ─▶ argv[1] ─▶ lookup ─▶ flag-init ─▶ parse argv[2..] ─▶ post-parse ─▶ action
//!            │          │
//!            └──────────┴──▶ (missing, -h/--help, unknown) default help
//! ```

use std::cell::RefCell;
use std::fmt;
use std::io::{self, Write};

use strsim::levenshtein;
use tracing::{debug, warn};

use crate::command::{Command, Invocation};
use crate::config::DispatchConfig;
use crate::error::{ComandanteError, Result};
use crate::help::{HelpRenderer, help_command};

/// Registry of commands for one binary.
pub struct Comandante {
    binary_name: String,
    description: String,
    commands: Vec<Command>,
    config: DispatchConfig,
    output: RefCell<Box<dyn Write>>,
}

impl fmt::Debug for Comandante {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Comandante")
            .field("binary_name", &self.binary_name)
            .field("description", &self.description)
            .field(
                "commands",
                &self.commands.iter().map(Command::name).collect::<Vec<_>>(),
            )
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Comandante {
    /// New registry with the default (lenient) configuration. Help goes to
    /// stderr until [`Comandante::set_output`] says otherwise.
    pub fn new(binary_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::with_config(binary_name, description, DispatchConfig::default())
    }

    pub fn with_config(
        binary_name: impl Into<String>,
        description: impl Into<String>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            binary_name: binary_name.into(),
            description: description.into(),
            commands: Vec::new(),
            config,
            output: RefCell::new(Box::new(io::stderr())),
        }
    }

    pub fn binary_name(&self) -> &str {
        &self.binary_name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Redirect help output.
    pub fn set_output<W: Write + 'static>(&mut self, output: W) {
        self.output = RefCell::new(Box::new(output));
    }

    /// Add a command. Fails, leaving the registry untouched, when the name
    /// is already taken.
    pub fn register(&mut self, command: Command) -> Result<()> {
        if self.lookup(command.name()).is_some() {
            return Err(ComandanteError::DuplicateCommand(command.name().to_string()));
        }
        debug!(command = command.name(), "registered command");
        self.commands.push(command);
        Ok(())
    }

    /// Register the built-in `help` command. A second call fails with
    /// [`ComandanteError::DuplicateCommand`].
    pub fn include_help(&mut self) -> Result<()> {
        self.register(help_command())
    }

    pub fn lookup(&self, name: &str) -> Option<&Command> {
        self.commands.iter().find(|cmd| cmd.name() == name)
    }

    /// Registered commands in registration order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Find the command named by `argv[1]` and run it.
    ///
    /// A missing name, `-h`/`--help`, and (in lenient mode) an unknown name
    /// print the default help and succeed. In strict mode an unknown name is
    /// [`ComandanteError::UnknownCommand`] and flag errors abort the run; in
    /// lenient mode flag errors are logged and the action runs anyway.
    pub fn run<I, S>(&mut self, argv: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv: Vec<String> = argv.into_iter().map(Into::into).collect();

        let Some(name) = argv.get(1) else {
            debug!("no command given");
            self.print_default_help();
            return Ok(());
        };
        if is_help_token(name) {
            debug!(token = %name, "help requested");
            self.print_default_help();
            return Ok(());
        }

        let Some(index) = self.commands.iter().position(|cmd| cmd.name() == name) else {
            let suggestion = self.suggest(name);
            debug!(command = %name, ?suggestion, "unknown command");
            self.print_default_help();
            if self.config.strict {
                return Err(ComandanteError::UnknownCommand {
                    name: name.clone(),
                    suggestion,
                });
            }
            return Ok(());
        };

        let strict = self.config.strict;
        let command = &mut self.commands[index];
        if command.has_flag_init() {
            match command.configure_flags(&argv[2..]) {
                Ok(()) => {}
                Err(ComandanteError::HelpRequested(_)) => {
                    self.print_command_help(&self.commands[index]);
                    return Ok(());
                }
                Err(err) if strict => return Err(err),
                Err(err) => {
                    warn!(command = %name, error = %err, "ignoring flag parse error");
                }
            }
        }

        let this = &*self;
        let command = &this.commands[index];
        debug!(command = command.name(), "invoking command");
        command.invoke(&Invocation::new(this, command, &argv))
    }

    /// [`Comandante::run`] over the process arguments.
    pub fn run_from_env(&mut self) -> Result<()> {
        self.run(std::env::args())
    }

    /// Write the all-commands listing to `w`.
    pub fn render_default_help(&self, w: &mut dyn Write) -> io::Result<()> {
        self.renderer().render_default(w)
    }

    /// Write the documentation and options of `command` to `w`.
    pub fn render_command_help(&self, w: &mut dyn Write, command: &Command) -> io::Result<()> {
        self.renderer().render_command_detail(w, command)
    }

    /// Default help to the configured output. Write errors are logged only.
    pub fn print_default_help(&self) {
        let mut out = self.output.borrow_mut();
        let written = self.render_default_help(&mut **out).and_then(|()| out.flush());
        if let Err(e) = written {
            debug!(error = %e, "failed to write default help");
        }
    }

    /// Detail help for `command` to the configured output.
    pub fn print_command_help(&self, command: &Command) {
        let mut out = self.output.borrow_mut();
        let written = self
            .render_command_help(&mut **out, command)
            .and_then(|()| out.flush());
        if let Err(e) = written {
            debug!(command = command.name(), error = %e, "failed to write command help");
        }
    }

    fn renderer(&self) -> HelpRenderer<'_> {
        HelpRenderer::new(&self.binary_name, &self.description, &self.commands)
    }

    /// Closest registered name within the configured edit distance.
    fn suggest(&self, name: &str) -> Option<String> {
        let max = self.config.suggestion_distance;
        if max == 0 {
            return None;
        }
        self.commands
            .iter()
            .map(|cmd| (cmd.name(), levenshtein(name, cmd.name())))
            .filter(|(_, distance)| *distance <= max)
            .min_by_key(|(_, distance)| *distance)
            .map(|(candidate, _)| candidate.to_string())
    }
}

fn is_help_token(token: &str) -> bool {
    token == "--help" || token == "-h"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::Flag;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Cloneable in-memory sink so tests can read what the dispatcher wrote.
    #[derive(Clone, Default)]
    struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).expect("utf8")
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn noop() -> anyhow::Result<()> {
        Ok(())
    }

    fn captured(com: &mut Comandante) -> SharedBuffer {
        let buffer = SharedBuffer::default();
        com.set_output(buffer.clone());
        buffer
    }

    #[test]
    fn test_comandante_new() {
        let c = Comandante::new("binaryName", "binaryDescription");
        assert_eq!(c.binary_name(), "binaryName");
        assert_eq!(c.description(), "binaryDescription");
        assert!(c.commands().is_empty());
        assert!(!c.config().strict);
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut c = Comandante::new("bin", "");
        c.register(Command::new("test", "first", noop).expect("command"))
            .expect("first registration");

        let err = c
            .register(Command::new("test", "second", noop).expect("command"))
            .expect_err("duplicate");
        assert!(matches!(err, ComandanteError::DuplicateCommand(ref n) if n == "test"));
        assert_eq!(c.commands().len(), 1);
        assert_eq!(c.commands()[0].short_description(), "first");
    }

    #[test]
    fn test_lookup() {
        let mut c = Comandante::new("bin", "");
        c.register(Command::new("a", "", noop).expect("command"))
            .expect("register");
        c.register(Command::new("b", "", noop).expect("command"))
            .expect("register");

        let found = c.lookup("b").expect("b is registered");
        assert!(std::ptr::eq(found, &c.commands()[1]));
        assert!(c.lookup("c").is_none());
        assert!(c.lookup("B").is_none());
    }

    #[test]
    fn test_run_invokes_action() {
        let mut c = Comandante::new("bin", "");
        let _out = captured(&mut c);
        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);
        c.register(
            Command::new("test", "short description", move || {
                flag.set(true);
                Ok(())
            })
            .expect("command"),
        )
        .expect("register");

        c.run(["bin", "test"]).expect("run");
        assert!(ran.get(), "the command didn't run");
    }

    #[test]
    fn test_run_passes_action_errors_through() {
        let mut c = Comandante::new("bin", "");
        c.register(
            Command::new("fail", "always fails", || anyhow::bail!("boom")).expect("command"),
        )
        .expect("register");

        let err = c.run(["bin", "fail"]).expect_err("action error");
        assert!(matches!(err, ComandanteError::Action(_)));
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_run_without_command_prints_help() {
        let mut outputs = Vec::new();
        for argv in [vec!["bin"], vec!["bin", "--help"], vec!["bin", "-h"], vec!["bin", "nope"]] {
            let mut c = Comandante::new("bin", "Handles things");
            let out = captured(&mut c);
            c.register(Command::new("other", "does stuff", noop).expect("command"))
                .expect("register");
            c.run(argv).expect("lenient run never fails");
            outputs.push(out.contents());
        }

        assert!(outputs[0].contains("Handles things"));
        assert!(outputs.iter().all(|o| o == &outputs[0]));
    }

    #[test]
    fn test_strict_mode_reports_unknown_command() {
        let mut c = Comandante::with_config("bin", "", DispatchConfig::strict());
        let out = captured(&mut c);
        c.register(Command::new("deploy", "", noop).expect("command"))
            .expect("register");

        let err = c.run(["bin", "deplyo"]).expect_err("strict");
        match err {
            ComandanteError::UnknownCommand { name, suggestion } => {
                assert_eq!(name, "deplyo");
                assert_eq!(suggestion.as_deref(), Some("deploy"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(out.contents().contains("Available commands:"));
    }

    #[test]
    fn test_suggestions_can_be_disabled() {
        let config = DispatchConfig {
            strict: true,
            suggestion_distance: 0,
        };
        let mut c = Comandante::with_config("bin", "", config);
        let _out = captured(&mut c);
        c.register(Command::new("deploy", "", noop).expect("command"))
            .expect("register");

        let err = c.run(["bin", "deplo"]).expect_err("strict");
        assert!(matches!(err, ComandanteError::UnknownCommand { suggestion: None, .. }));
    }

    fn flagged_command(value: &Flag<String>, ran: &Rc<Cell<bool>>) -> Command {
        let bound = value.clone();
        let ran = Rc::clone(ran);
        Command::new("test", "short", move || {
            ran.set(true);
            Ok(())
        })
        .expect("command")
        .with_flag_init(move |fs| fs.string_var(&bound, "testing", "", "This is the usage"))
    }

    #[test]
    fn test_run_parses_command_flags() {
        let value = Flag::new(String::new());
        let ran = Rc::new(Cell::new(false));
        let mut c = Comandante::new("bin", "");
        c.register(flagged_command(&value, &ran)).expect("register");

        c.run(["bin", "test", "--testing=value"]).expect("run");
        assert!(ran.get());
        assert_eq!(value.get(), "value");
    }

    #[test]
    fn test_lenient_mode_runs_action_despite_flag_errors() {
        let value = Flag::new(String::new());
        let ran = Rc::new(Cell::new(false));
        let mut c = Comandante::new("bin", "");
        c.register(flagged_command(&value, &ran)).expect("register");

        c.run(["bin", "test", "--unknown=1"]).expect("lenient");
        assert!(ran.get());
        assert_eq!(value.get(), "");
    }

    #[test]
    fn test_strict_mode_aborts_on_flag_errors() {
        let value = Flag::new(String::new());
        let ran = Rc::new(Cell::new(false));
        let mut c = Comandante::with_config("bin", "", DispatchConfig::strict());
        c.register(flagged_command(&value, &ran)).expect("register");

        let err = c.run(["bin", "test", "--unknown=1"]).expect_err("strict");
        assert!(matches!(err, ComandanteError::FlagParse { .. }));
        assert!(!ran.get());
    }

    #[test]
    fn test_post_parse_errors_follow_the_policy() {
        for (config, should_run) in [
            (DispatchConfig::default(), true),
            (DispatchConfig::strict(), false),
        ] {
            let value = Flag::new(String::new());
            let ran = Rc::new(Cell::new(false));
            let mut c = Comandante::with_config("bin", "", config);
            c.register(
                flagged_command(&value, &ran)
                    .with_flag_post_parse(|_| anyhow::bail!("testing is required")),
            )
            .expect("register");

            let result = c.run(["bin", "test"]);
            assert_eq!(ran.get(), should_run);
            if should_run {
                result.expect("lenient mode swallows post-parse errors");
            } else {
                let err = result.expect_err("strict mode aborts");
                assert_eq!(err.to_string(), "test: testing is required");
            }
        }
    }

    #[test]
    fn test_command_help_flag_prints_detail_without_running() {
        let value = Flag::new(String::new());
        let ran = Rc::new(Cell::new(false));
        let mut c = Comandante::new("bin", "");
        let out = captured(&mut c);
        c.register(flagged_command(&value, &ran)).expect("register");

        c.run(["bin", "test", "--help"]).expect("help");
        assert!(!ran.get());
        assert!(out.contents().starts_with("bin test\n"));
        assert!(out.contents().contains("--testing string"));
    }

    #[test]
    fn test_action_sees_invocation() {
        let seen = Rc::new(RefCell::new(Vec::<String>::new()));
        let sink = Rc::clone(&seen);
        let mut c = Comandante::new("bin", "");
        c.register(
            Command::with_context("echo", "echo args", move |inv| {
                assert_eq!(inv.dispatcher().binary_name(), "bin");
                assert_eq!(inv.command().name(), "echo");
                sink.borrow_mut().extend(inv.args().iter().cloned());
                Ok(())
            })
            .expect("command"),
        )
        .expect("register");

        c.run(["bin", "echo", "a", "--b"]).expect("run");
        assert_eq!(*seen.borrow(), ["a", "--b"]);
    }

    #[test]
    fn test_include_help_twice_fails() {
        let mut c = Comandante::new("bin", "");
        c.include_help().expect("first");
        let err = c.include_help().expect_err("second");
        assert!(matches!(err, ComandanteError::DuplicateCommand(ref n) if n == "help"));
        assert_eq!(c.commands().len(), 1);
    }
}
