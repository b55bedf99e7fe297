//! # comandante
//!
//! Sub-command dispatch for command line programs.
//!
//! Register named commands on a [`Comandante`], hand it the process
//! arguments, and it picks the command named by the first argument, parses
//! that command's own flags from the rest, and runs its action. When no
//! command matches (or help is asked for) it prints a generated listing of
//! every command instead.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use comandante::{Comandante, Command, Flag};
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut app = Comandante::new("greeter", "Says hello in several ways");
//!     app.include_help()?;
//!
//!     let name = Flag::new(String::from("world"));
//!     let bound = name.clone();
//!     app.register(
//!         Command::new("hello", "print a greeting", move || {
//!             println!("hello, {}", name.get());
//!             Ok(())
//!         })?
//!         .with_documentation("Prints a greeting for --name.")
//!         .with_flag_init(move |fs| fs.string_var(&bound, "name", "world", "who to greet")),
//!     )?;
//!
//!     app.run_from_env()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Behaviour worth knowing
//!
//! - `greeter`, `greeter --help` and `greeter unknown` all print the default
//!   listing and succeed, unless [`DispatchConfig::strict`] is set.
//! - Flags are only declared when their command is selected; `greeter hello
//!   --help` prints that command's documentation and options.
//! - The library logs through `tracing` and never installs a subscriber.

#![doc(html_root_url = "https://docs.rs/comandante/0.3.0")]

/// Command records, hooks and the [`Invocation`] context actions receive.
pub mod command;

/// Dispatch configuration loaded from `.comandante.toml`.
pub mod config;

/// The registry and run protocol.
pub mod dispatch;

pub mod error;

/// Per-command option-set backed by clap's builder API.
pub mod flags;

/// Default listing, per-command detail and the built-in `help` command.
pub mod help;

pub use command::{Command, Invocation};
pub use config::DispatchConfig;
pub use dispatch::Comandante;
pub use error::{ComandanteError, Result};
pub use flags::{Flag, FlagSet, FlagValue};
pub use help::{HelpRenderer, PrintableCommand, help_command};
