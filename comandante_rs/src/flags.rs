//! Per-command option-set.
//!
//! A [`FlagSet`] is declared by a command's flag-init hook, parsed from the
//! tokens that follow the command name, and then read either through the
//! [`Flag`] bindings captured by the action or by name via [`FlagSet::get`].
//! Parsing is delegated to clap's builder API; the usage listing printed by
//! [`FlagSet::print_defaults`] is our own.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::io::{self, Write};
use std::rc::Rc;

use clap::builder::ValueParser;
use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, ColorChoice};

use crate::error::{ComandanteError, Result};

/// clap id of the catch-all positional that collects non-flag tokens.
const POSITIONAL_ID: &str = "__comandante_args";

/// Tokens that request help when they show up among a command's flags.
const HELP_TOKENS: &[&str] = &["-h", "-help", "--help"];

/// A type an option can hold.
pub trait FlagValue: Clone + Send + Sync + 'static {
    /// Word shown after the option name in usage listings. Empty for booleans.
    const TYPE_NAME: &'static str;
    /// Boolean options may be given bare (`--verbose`) and only take a value
    /// through `=` (`--verbose=false`).
    const IS_BOOL: bool = false;

    /// Parse one command line token.
    fn parse_token(raw: &str) -> std::result::Result<Self, String>;

    /// Zero values are left out of the "(default ...)" suffix.
    fn is_zero(&self) -> bool;

    /// Rendering used in usage listings.
    fn render(&self) -> String;
}

impl FlagValue for String {
    const TYPE_NAME: &'static str = "string";

    fn parse_token(raw: &str) -> std::result::Result<Self, String> {
        Ok(raw.to_string())
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn render(&self) -> String {
        format!("{:?}", self)
    }
}

impl FlagValue for bool {
    const TYPE_NAME: &'static str = "";
    const IS_BOOL: bool = true;

    fn parse_token(raw: &str) -> std::result::Result<Self, String> {
        match raw {
            "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
            "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
            other => Err(format!("invalid boolean value '{}'", other)),
        }
    }

    fn is_zero(&self) -> bool {
        !*self
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

macro_rules! numeric_flag_value {
    ($ty:ty, $type_name:literal, $zero:expr) => {
        impl FlagValue for $ty {
            const TYPE_NAME: &'static str = $type_name;

            fn parse_token(raw: &str) -> std::result::Result<Self, String> {
                raw.parse::<$ty>().map_err(|e| e.to_string())
            }

            fn is_zero(&self) -> bool {
                *self == $zero
            }

            fn render(&self) -> String {
                self.to_string()
            }
        }
    };
}

numeric_flag_value!(i64, "int", 0);
numeric_flag_value!(u64, "uint", 0);
numeric_flag_value!(f64, "float", 0.0);

/// Shared binding cell for one option value.
///
/// Clones point at the same value: hand one clone to the flag-init hook and
/// keep another in the action closure.
#[derive(Debug, Default)]
pub struct Flag<T>(Rc<RefCell<T>>);

impl<T> Clone for Flag<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T: Clone> Flag<T> {
    pub fn new(value: T) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }

    /// Current value.
    pub fn get(&self) -> T {
        self.0.borrow().clone()
    }

    pub fn set(&self, value: T) {
        *self.0.borrow_mut() = value;
    }
}

struct FlagSpec {
    name: String,
    usage: String,
    type_name: &'static str,
    is_bool: bool,
    default_repr: Option<String>,
    default: Box<dyn Any>,
    arg: Arg,
    apply: Box<dyn Fn(&ArgMatches)>,
}

/// The options one command accepts, plus the outcome of the last parse.
pub struct FlagSet {
    command: String,
    specs: Vec<FlagSpec>,
    definition_errors: Vec<String>,
    matches: Option<ArgMatches>,
    args: Vec<String>,
}

impl fmt::Debug for FlagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlagSet")
            .field("command", &self.command)
            .field("flags", &self.names().collect::<Vec<_>>())
            .field("parsed", &self.matches.is_some())
            .field("args", &self.args)
            .finish()
    }
}

impl FlagSet {
    /// Empty option-set owned by `command`.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            specs: Vec::new(),
            definition_errors: Vec::new(),
            matches: None,
            args: Vec::new(),
        }
    }

    /// Name of the owning command.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Declare an option bound to `flag`. The binding is reset to `default`.
    ///
    /// Declaring a name twice, or a name that is empty, starts with `-` or
    /// contains `=`, is reported when the set is parsed.
    pub fn var<T: FlagValue>(&mut self, flag: &Flag<T>, name: &str, default: T, usage: &str) {
        if name.is_empty() || name.starts_with('-') || name.contains('=') {
            self.definition_errors
                .push(format!("bad flag name '{}'", name));
            return;
        }
        if self.spec(name).is_some() {
            self.definition_errors
                .push(format!("flag redefined: {}", name));
            return;
        }

        flag.set(default.clone());

        let mut arg = Arg::new(name.to_string())
            .long(name.to_string())
            .action(ArgAction::Set)
            .value_parser(ValueParser::new(|raw: &str| T::parse_token(raw)));
        arg = if T::IS_BOOL {
            arg.num_args(0..=1)
                .require_equals(true)
                .default_missing_value("true")
        } else {
            arg.num_args(1)
                .allow_hyphen_values(true)
                .value_name(T::TYPE_NAME)
        };

        let binding = flag.clone();
        let id = name.to_string();
        let apply = move |matches: &ArgMatches| {
            if let Ok(Some(value)) = matches.try_get_one::<T>(&id) {
                binding.set(value.clone());
            }
        };

        self.specs.push(FlagSpec {
            name: name.to_string(),
            usage: usage.to_string(),
            type_name: T::TYPE_NAME,
            is_bool: T::IS_BOOL,
            default_repr: (!default.is_zero()).then(|| default.render()),
            default: Box::new(default),
            arg,
            apply: Box::new(apply),
        });
    }

    /// Declare an option and return a fresh binding for it.
    pub fn declare<T: FlagValue>(&mut self, name: &str, default: T, usage: &str) -> Flag<T> {
        let flag = Flag::new(default.clone());
        self.var(&flag, name, default, usage);
        flag
    }

    pub fn string_var(&mut self, flag: &Flag<String>, name: &str, default: &str, usage: &str) {
        self.var(flag, name, default.to_string(), usage);
    }

    pub fn bool_var(&mut self, flag: &Flag<bool>, name: &str, default: bool, usage: &str) {
        self.var(flag, name, default, usage);
    }

    pub fn int_var(&mut self, flag: &Flag<i64>, name: &str, default: i64, usage: &str) {
        self.var(flag, name, default, usage);
    }

    pub fn uint_var(&mut self, flag: &Flag<u64>, name: &str, default: u64, usage: &str) {
        self.var(flag, name, default, usage);
    }

    pub fn float_var(&mut self, flag: &Flag<f64>, name: &str, default: f64, usage: &str) {
        self.var(flag, name, default, usage);
    }

    pub fn string(&mut self, name: &str, default: &str, usage: &str) -> Flag<String> {
        self.declare(name, default.to_string(), usage)
    }

    pub fn bool(&mut self, name: &str, default: bool, usage: &str) -> Flag<bool> {
        self.declare(name, default, usage)
    }

    pub fn int(&mut self, name: &str, default: i64, usage: &str) -> Flag<i64> {
        self.declare(name, default, usage)
    }

    pub fn uint(&mut self, name: &str, default: u64, usage: &str) -> Flag<u64> {
        self.declare(name, default, usage)
    }

    pub fn float(&mut self, name: &str, default: f64, usage: &str) -> Flag<f64> {
        self.declare(name, default, usage)
    }

    /// Declared option names, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().map(|spec| spec.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Parse `tokens` into the declared options and update their bindings.
    ///
    /// Parsing stops at the first positional token (or after `--`); that
    /// token and everything after it is available from [`FlagSet::args`].
    pub fn parse<I, S>(&mut self, tokens: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tokens: Vec<String> = tokens
            .into_iter()
            .map(|token| self.normalize(token.as_ref()))
            .collect();
        self.matches = None;
        self.args.clear();

        if let Some(message) = self.definition_errors.first() {
            return Err(self.parse_error(message.clone()));
        }
        if self.wants_help(&tokens) {
            return Err(ComandanteError::HelpRequested(self.command.clone()));
        }

        let matches = self
            .clap_command()
            .try_get_matches_from(tokens)
            .map_err(|e| self.parse_error(clap_message(&e)))?;

        for spec in &self.specs {
            (spec.apply)(&matches);
        }
        self.args = matches
            .get_many::<String>(POSITIONAL_ID)
            .map(|values| values.cloned().collect())
            .unwrap_or_default();
        self.matches = Some(matches);
        Ok(())
    }

    /// Whether the last successful parse populated this set.
    pub fn parsed(&self) -> bool {
        self.matches.is_some()
    }

    /// Parsed value of `name`, or its default when it wasn't given (or the
    /// set hasn't been parsed). `None` for undeclared names or a type that
    /// doesn't match the declaration.
    pub fn get<T: FlagValue>(&self, name: &str) -> Option<T> {
        let spec = self.spec(name)?;
        let parsed = self
            .matches
            .as_ref()
            .and_then(|matches| matches.try_get_one::<T>(name).ok().flatten());
        match parsed {
            Some(value) => Some(value.clone()),
            None => spec.default.downcast_ref::<T>().cloned(),
        }
    }

    /// Whether `name` was given explicitly on the command line.
    pub fn is_set(&self, name: &str) -> bool {
        if self.spec(name).is_none() {
            return false;
        }
        self.matches
            .as_ref()
            .and_then(|matches| matches.value_source(name))
            .is_some_and(|source| source == ValueSource::CommandLine)
    }

    /// Tokens left over after the options: the first positional and
    /// everything following it.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Write one usage entry per declared option, sorted by name.
    pub fn print_defaults(&self, w: &mut dyn Write) -> io::Result<()> {
        let mut specs: Vec<&FlagSpec> = self.specs.iter().collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));

        for spec in specs {
            write!(w, "  --{}", spec.name)?;
            if !spec.type_name.is_empty() {
                write!(w, " {}", spec.type_name)?;
            }
            write!(w, "\n    \t{}", spec.usage)?;
            if let Some(default) = &spec.default_repr {
                write!(w, " (default {})", default)?;
            }
            writeln!(w)?;
        }
        Ok(())
    }

    fn spec(&self, name: &str) -> Option<&FlagSpec> {
        self.specs.iter().find(|spec| spec.name == name)
    }

    fn parse_error(&self, message: String) -> ComandanteError {
        ComandanteError::FlagParse {
            command: self.command.clone(),
            message,
        }
    }

    /// `-name[=value]` for a declared name becomes `--name[=value]`.
    fn normalize(&self, token: &str) -> String {
        match token.strip_prefix('-') {
            Some(rest) if !rest.starts_with('-') => {
                let name = rest.split('=').next().unwrap_or(rest);
                if self.spec(name).is_some() {
                    format!("-{}", token)
                } else {
                    token.to_string()
                }
            }
            _ => token.to_string(),
        }
    }

    fn wants_help(&self, tokens: &[String]) -> bool {
        if self.spec("h").is_some() || self.spec("help").is_some() {
            return false;
        }
        // Same stopping rule as the parser: `--` or the first positional.
        let mut tokens = tokens.iter();
        while let Some(token) = tokens.next() {
            if token == "--" || !token.starts_with('-') {
                return false;
            }
            if HELP_TOKENS.contains(&token.as_str()) {
                return true;
            }
            let name = token.trim_start_matches('-');
            let takes_value = !name.contains('=')
                && self.spec(name).is_some_and(|spec| !spec.is_bool);
            if takes_value {
                tokens.next();
            }
        }
        false
    }

    fn clap_command(&self) -> clap::Command {
        let mut cmd = clap::Command::new(self.command.clone())
            .no_binary_name(true)
            .disable_help_flag(true)
            .disable_version_flag(true)
            .args_override_self(true)
            .color(ColorChoice::Never);
        for spec in &self.specs {
            cmd = cmd.arg(spec.arg.clone());
        }
        cmd.arg(
            Arg::new(POSITIONAL_ID)
                .value_name("args")
                .num_args(1..)
                .trailing_var_arg(true)
                .value_parser(ValueParser::string()),
        )
    }
}

/// First line of a clap error without its `error: ` prefix.
fn clap_message(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let first = rendered.lines().next().unwrap_or_default();
    first.strip_prefix("error: ").unwrap_or(first).trim().to_string()
}
