//! Demo program for the comandante library.
//!
//! `comandante-demo` lists its commands, `comandante-demo help greet`
//! documents one of them. Put `strict = true` in `.comandante.toml` to turn
//! unknown commands and bad flags into errors.

use std::path::Path;
use std::process::ExitCode;

use comandante::{Comandante, Command, DispatchConfig, Flag};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const GREET_DOCUMENTATION: &str = "\
Prints a greeting.

Examples:
  comandante-demo greet --name=Ana
  comandante-demo greet --shout --times 3";

fn init_logging() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
}

fn greet_command() -> comandante::Result<Command> {
    let name = Flag::new(String::from("world"));
    let shout = Flag::new(false);
    let times = Flag::new(1_u64);

    let (name_opt, shout_opt, times_opt) = (name.clone(), shout.clone(), times.clone());
    let command = Command::new("greet", "print a greeting", move || {
        let mut line = format!("Hello, {}!", name.get());
        if shout.get() {
            line = line.to_uppercase();
        }
        for _ in 0..times.get() {
            println!("{}", line);
        }
        Ok(())
    })?
    .with_documentation(GREET_DOCUMENTATION)
    .with_flag_init(move |fs| {
        fs.string_var(&name_opt, "name", "world", "who to greet");
        fs.bool_var(&shout_opt, "shout", false, "print the greeting in capitals");
        fs.uint_var(&times_opt, "times", 1, "how many times to print it");
    })
    .with_flag_post_parse(|fs| {
        let times = fs.get::<u64>("times").unwrap_or(1);
        anyhow::ensure!(times >= 1, "--times must be at least 1");
        Ok(())
    });
    Ok(command)
}

fn echo_command() -> comandante::Result<Command> {
    Command::with_context("echo", "print the arguments back", |invocation| {
        println!("{}", invocation.args().join(" "));
        Ok(())
    })
    .map(|cmd| cmd.with_documentation("Prints its arguments separated by single spaces."))
}

fn version_command() -> comandante::Result<Command> {
    Command::new("version", "show version information", || {
        println!("comandante-demo {}", env!("CARGO_PKG_VERSION"));
        Ok(())
    })
}

fn build_app(config: DispatchConfig) -> comandante::Result<Comandante> {
    let mut app = Comandante::with_config(
        "comandante-demo",
        "comandante-demo - a tiny program built on comandante",
        config,
    );
    app.include_help()?;
    app.register(greet_command()?)?;
    app.register(echo_command()?)?;
    app.register(version_command()?)?;
    Ok(app)
}

fn main() -> ExitCode {
    init_logging();

    let config = DispatchConfig::load(Path::new("."));
    debug!(?config, "loaded dispatch config");

    match build_app(config).and_then(|mut app| app.run_from_env()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("comandante-demo: {}", e);
            ExitCode::FAILURE
        }
    }
}
