//! The taskmill application: a registry of command plugins plus the
//! resolved configuration they run against.
//!
//! Every command, built in or declared by the user, is a [`CommandFactory`]
//! stored in a [`PluginRegistry`]. Running `taskmill NAME ARGS...` resolves
//! `NAME`, builds its [`CommandSpec`], and dispatches `ARGS` with the
//! context from the config file.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use anyhow::{Context, Result, anyhow};

use taskmill_core::plugin::PluginListing;
use taskmill_core::{CommandSpec, PluginLoadError, PluginRegistry, SpecError};

use crate::builtin;
use crate::config::TaskmillConfig;

/// What every command target returns.
pub type Outcome = Result<()>;

/// A fully built command.
pub type Command = CommandSpec<Outcome>;

/// Builds a command bound to the running application.
pub type CommandFactory = fn(&Rc<App>) -> Result<Command, SpecError>;

/// Command run when none is named.
pub const DEFAULT_COMMAND: &str = "help";

/// Plugin category for commands.
pub const COMMAND_CATEGORY: &str = "command";

pub struct App {
    config: TaskmillConfig,
    commands: RefCell<PluginRegistry<CommandFactory>>,
    out: RefCell<Box<dyn Write>>,
}

impl App {
    /// Build the application, writing command output to stdout.
    pub fn new(config: TaskmillConfig) -> Result<Rc<Self>> {
        Self::with_output(config, std::io::stdout())
    }

    pub fn with_output(config: TaskmillConfig, out: impl Write + 'static) -> Result<Rc<Self>> {
        let commands = builtin::build_registry(&config)?;
        Ok(Rc::new(Self {
            config,
            commands: RefCell::new(commands),
            out: RefCell::new(Box::new(out)),
        }))
    }

    pub fn config(&self) -> &TaskmillConfig {
        &self.config
    }

    /// Run `args`: the first token names the command unless it is missing
    /// or looks like a flag, in which case [`DEFAULT_COMMAND`] gets all of
    /// them.
    pub fn run(self: &Rc<Self>, args: &[String]) -> Result<()> {
        let (name, tokens) = match args.split_first() {
            Some((first, rest)) if !first.starts_with('-') => (first.as_str(), rest),
            _ => (DEFAULT_COMMAND, args),
        };

        let span = tracing::info_span!("command", command = name);
        let _guard = span.enter();

        let spec = self.command_spec(name)?;
        let context = self.config.context_for(name)?;
        spec.dispatch(tokens, &context)?
    }

    /// Resolve the factory registered under `name`.
    pub fn resolve_command(&self, name: &str) -> Result<CommandFactory, PluginLoadError> {
        self.commands.borrow_mut().resolve(name)
    }

    /// Resolve `name` and build its command.
    pub fn command_spec(self: &Rc<Self>, name: &str) -> Result<Command> {
        let factory = self.resolve_command(name).map_err(|e| match e {
            PluginLoadError::NotRegistered { .. } => {
                anyhow!("unknown command {name:?}; run `taskmill help` for a list")
            }
            other => anyhow::Error::new(other),
        })?;
        factory(self).with_context(|| format!("invalid definition for command {name:?}"))
    }

    /// Registered command names in registration order.
    pub fn command_names(&self) -> Vec<String> {
        self.commands
            .borrow()
            .names()
            .into_iter()
            .map(str::to_owned)
            .collect()
    }

    pub fn describe_commands(&self) -> Vec<PluginListing> {
        self.commands.borrow().describe()
    }

    /// Write one block of output followed by a newline.
    pub fn write(&self, text: &str) -> Result<()> {
        let mut out = self.out.borrow_mut();
        writeln!(out, "{text}").context("failed to write output")?;
        out.flush().context("failed to write output")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFile;
    use crate::test_util::SharedBuf;

    fn app_with(file: ConfigFile) -> (Rc<App>, SharedBuf) {
        let buf = SharedBuf::default();
        let config = TaskmillConfig {
            file,
            extensions_dir: "/nonexistent/taskmill/extensions.d".into(),
            ..TaskmillConfig::default()
        };
        (App::with_output(config, buf.clone()).unwrap(), buf)
    }

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_arguments_runs_help() {
        let (app, buf) = app_with(ConfigFile::default());
        app.run(&[]).unwrap();
        let out = buf.contents();
        assert!(out.contains("Commands:"), "{out}");
        assert!(out.contains("plugins"), "{out}");
    }

    #[test]
    fn leading_flag_goes_to_default_command() {
        let (app, buf) = app_with(ConfigFile::default());
        app.run(&args(&["--width", "12"])).unwrap();
        assert!(buf.contents().contains("Commands:"));
    }

    #[test]
    fn unknown_command_is_reported() {
        let (app, _) = app_with(ConfigFile::default());
        let err = app.run(&args(&["frobnicate"])).unwrap_err();
        assert!(err.to_string().contains("unknown command \"frobnicate\""), "{err}");
    }

    #[test]
    fn argument_errors_name_the_command() {
        let (app, _) = app_with(ConfigFile::default());
        let err = app.run(&args(&["plugins", "--bogus"])).unwrap_err();
        assert!(err.to_string().contains("\"plugins\""), "{err}");
    }

    #[test]
    fn lazy_builtin_resolves_on_first_use() {
        let (app, _) = app_with(ConfigFile::default());
        let before = app.describe_commands();
        let config = before.iter().find(|l| l.name == "config").unwrap();
        assert!(!config.resolved);

        app.command_spec("config").unwrap();
        let after = app.describe_commands();
        assert!(after.iter().find(|l| l.name == "config").unwrap().resolved);
    }

    #[test]
    fn config_declared_commands_are_registered() {
        let file: ConfigFile = toml::from_str(
            "[plugins.command]\nshow = \"taskmill.cmd:config\"\nbroken = \"nowhere:cmd\"\n",
        )
        .unwrap();
        let (app, _) = app_with(file);

        assert_eq!(app.command_names(), ["help", "plugins", "config", "broken", "show"]);
        assert_eq!(app.command_spec("show").unwrap().name(), "config");

        let err = app.run(&args(&["broken"])).unwrap_err();
        assert!(err.to_string().contains("nowhere"), "{err}");
    }

    #[test]
    fn context_from_config_reaches_the_command() {
        let file: ConfigFile =
            toml::from_str("[commands.plugins]\nformat = \"json\"\n").unwrap();
        let (app, buf) = app_with(file);
        app.run(&args(&["plugins"])).unwrap();
        assert!(buf.contents().trim_start().starts_with('['), "{}", buf.contents());
    }
}
