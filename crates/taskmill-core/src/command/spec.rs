//! Command definitions: an ordered option list plus a dispatch target.

use std::collections::{HashMap, HashSet};
use std::fmt;

use super::error::{CommandError, SpecError};
use super::option::{OptionSpec, OptionType};
use super::params::{ParamValue, Params};
use super::parser::CommandParser;

/// The function a command dispatches to with `(params, positional_args)`.
pub type DispatchTarget<R> = Box<dyn Fn(&Params, &[String]) -> R>;

/// Declarative description of a sub-command.
///
/// Construction validates the option list, so every `CommandSpec` in
/// existence has unique option names and unambiguous flags.
pub struct CommandSpec<R> {
    name: String,
    purpose: String,
    usage: String,
    options: Vec<OptionSpec>,
    target: DispatchTarget<R>,
}

impl<R> CommandSpec<R> {
    pub fn new<F>(
        name: impl Into<String>,
        options: Vec<OptionSpec>,
        target: F,
    ) -> Result<Self, SpecError>
    where
        F: Fn(&Params, &[String]) -> R + 'static,
    {
        let name = name.into();
        validate_options(&name, &options)?;
        Ok(Self {
            name,
            purpose: String::new(),
            usage: String::new(),
            options,
            target: Box::new(target),
        })
    }

    /// One-line description shown in command listings.
    pub fn purpose(mut self, text: impl Into<String>) -> Self {
        self.purpose = text.into();
        self
    }

    /// Positional-argument synopsis, e.g. `[TASK ...]`.
    pub fn usage(mut self, text: impl Into<String>) -> Self {
        self.usage = text.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn purpose_text(&self) -> &str {
        &self.purpose
    }

    pub fn options(&self) -> &[OptionSpec] {
        &self.options
    }

    /// Look up a declared option by name.
    pub fn option(&self, name: &str) -> Option<&OptionSpec> {
        self.options.iter().find(|o| o.name == name)
    }

    pub fn parser(&self) -> CommandParser<'_> {
        CommandParser::new(&self.name, &self.options)
    }

    /// Parse `tokens` with `context` layered over the declared defaults.
    pub fn parse(
        &self,
        tokens: &[String],
        context: &Params,
    ) -> Result<(Params, Vec<String>), CommandError> {
        self.parser().parse(tokens, context)
    }

    /// Parse, then invoke the target. The target's result is returned
    /// unchanged; a failed parse never reaches the target.
    pub fn dispatch(&self, tokens: &[String], context: &Params) -> Result<R, CommandError> {
        let (params, args) = self.parse(tokens, context)?;
        tracing::debug!(command = %self.name, positional = args.len(), "dispatching command");
        Ok(self.execute(&params, &args))
    }

    /// Invoke the target with already-parsed parameters.
    pub fn execute(&self, params: &Params, args: &[String]) -> R {
        (self.target)(params, args)
    }

    /// Render the full help text for this command.
    pub fn help(&self) -> String {
        let mut out = String::new();
        if !self.purpose.is_empty() {
            out.push_str(&self.purpose);
            out.push_str("\n\n");
        }
        out.push_str(&format!("Usage: {}", self.name));
        if !self.options.is_empty() {
            out.push_str(" [OPTIONS]");
        }
        if !self.usage.is_empty() {
            out.push(' ');
            out.push_str(&self.usage);
        }
        out.push('\n');

        let blocks: Vec<Vec<String>> = self
            .options
            .iter()
            .map(OptionSpec::help_doc)
            .filter(|doc| !doc.is_empty())
            .collect();
        if !blocks.is_empty() {
            out.push_str("\nOptions:\n");
            for line in blocks.iter().flatten() {
                out.push_str("  ");
                out.push_str(line);
                out.push('\n');
            }
        }
        out
    }
}

impl<R> fmt::Debug for CommandSpec<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Check the invariants every command relies on during parsing.
fn validate_options(command: &str, options: &[OptionSpec]) -> Result<(), SpecError> {
    let mut names = HashSet::new();
    // alias -> option name that claimed it
    let mut aliases: HashMap<String, &str> = HashMap::new();

    for opt in options {
        if !names.insert(opt.name.as_str()) {
            return Err(SpecError::DuplicateName {
                command: command.to_owned(),
                option: opt.name.clone(),
            });
        }

        if opt.inverse.is_some() && opt.kind != OptionType::Boolean {
            return Err(SpecError::InverseOnNonBoolean {
                command: command.to_owned(),
                option: opt.name.clone(),
            });
        }

        if !opt.default.matches(opt.kind) {
            return Err(SpecError::DefaultTypeMismatch {
                command: command.to_owned(),
                option: opt.name.clone(),
                expected: opt.kind,
            });
        }

        if opt.kind == OptionType::Choice {
            if opt.choices.is_empty() {
                return Err(SpecError::EmptyChoices {
                    command: command.to_owned(),
                    option: opt.name.clone(),
                });
            }
            if let ParamValue::Str(value) = &opt.default {
                if !opt.is_choice(value) {
                    return Err(SpecError::DefaultNotAChoice {
                        command: command.to_owned(),
                        option: opt.name.clone(),
                        value: value.clone(),
                    });
                }
            }
        }

        let mut claimed = Vec::new();
        if let Some(short) = opt.short {
            if !short.is_ascii_alphanumeric() {
                return Err(invalid_alias(command, opt, short.to_string()));
            }
            claimed.push(format!("-{short}"));
        }
        for long in opt.long.iter().chain(opt.inverse.iter()) {
            if !valid_long(long) {
                return Err(invalid_alias(command, opt, long.clone()));
            }
            claimed.push(format!("--{long}"));
        }
        for alias in claimed {
            if let Some(first) = aliases.insert(alias.clone(), opt.name.as_str()) {
                return Err(SpecError::DuplicateAlias {
                    command: command.to_owned(),
                    alias,
                    first: first.to_owned(),
                    second: opt.name.clone(),
                });
            }
        }
    }
    Ok(())
}

fn valid_long(long: &str) -> bool {
    !long.is_empty() && !long.starts_with('-') && !long.contains('=') && !long.contains(' ')
}

fn invalid_alias(command: &str, opt: &OptionSpec, alias: String) -> SpecError {
    SpecError::InvalidAlias {
        command: command.to_owned(),
        option: opt.name.clone(),
        alias,
    }
}
