use thiserror::Error;

use super::option::OptionType;

/// An unknown or malformed command-line token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("error parsing {command:?} arguments: {message}")]
pub struct ArgumentError {
    /// Name of the command being parsed.
    pub command: String,
    /// Human-readable description of the offending token.
    pub message: String,
}

impl ArgumentError {
    pub fn new(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            message: message.into(),
        }
    }
}

/// A value that could not be converted to its option's declared type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid value {value:?} for option {option:?}: {reason}")]
pub struct TypeCoercionError {
    /// Name of the option the value was meant for.
    pub option: String,
    /// The raw value as supplied.
    pub value: String,
    pub reason: String,
}

impl TypeCoercionError {
    pub fn new(
        option: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            option: option.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by [`super::CommandParser::parse`] and
/// [`super::CommandSpec::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    #[error(transparent)]
    TypeCoercion(#[from] TypeCoercionError),
}

/// Errors raised while building a [`super::CommandSpec`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    #[error("command {command:?}: duplicate option name {option:?}")]
    DuplicateName { command: String, option: String },

    #[error("command {command:?}: flag {alias} is claimed by both {first:?} and {second:?}")]
    DuplicateAlias {
        command: String,
        alias: String,
        first: String,
        second: String,
    },

    #[error("command {command:?}: invalid flag {alias:?} on option {option:?}")]
    InvalidAlias {
        command: String,
        option: String,
        alias: String,
    },

    #[error("command {command:?}: option {option:?} declares an inverse but is not boolean")]
    InverseOnNonBoolean { command: String, option: String },

    #[error("command {command:?}: default for option {option:?} is not a valid {expected}")]
    DefaultTypeMismatch {
        command: String,
        option: String,
        expected: OptionType,
    },

    #[error("command {command:?}: choice option {option:?} declares no choices")]
    EmptyChoices { command: String, option: String },

    #[error("command {command:?}: default {value:?} of option {option:?} is not one of its choices")]
    DefaultNotAChoice {
        command: String,
        option: String,
        value: String,
    },
}
