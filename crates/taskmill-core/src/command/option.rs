//! Declarative option definitions and value coercion.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use super::error::TypeCoercionError;
use super::params::ParamValue;

/// The declared type of an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    String,
    Integer,
    Boolean,
    List,
    Choice,
}

impl OptionType {
    /// The default used when an option declares none.
    pub fn empty_value(self) -> ParamValue {
        match self {
            Self::String | Self::Choice => ParamValue::Str(String::new()),
            Self::Integer => ParamValue::Int(0),
            Self::Boolean => ParamValue::Bool(false),
            Self::List => ParamValue::List(Vec::new()),
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::List => "list",
            Self::Choice => "choice",
        };
        f.write_str(s)
    }
}

impl FromStr for OptionType {
    type Err = OptionTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(Self::String),
            "integer" => Ok(Self::Integer),
            "boolean" => Ok(Self::Boolean),
            "list" => Ok(Self::List),
            "choice" => Ok(Self::Choice),
            other => Err(OptionTypeParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`OptionType`] string.
#[derive(Debug, Clone)]
pub struct OptionTypeParseError(pub String);

impl fmt::Display for OptionTypeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid option type: {:?}", self.0)
    }
}

impl std::error::Error for OptionTypeParseError {}

/// One allowed value of a [`OptionType::Choice`] option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub value: String,
    pub description: String,
}

/// Declarative description of a single command option.
///
/// Use one of the typed constructors ([`OptionSpec::string`],
/// [`OptionSpec::boolean`], ...) and chain builder setters:
///
/// ```
/// use taskmill_core::OptionSpec;
///
/// let opt = OptionSpec::boolean("flag")
///     .short('f')
///     .long("flagon")
///     .default(true)
///     .inverse("flagoff")
///     .help("toggle the flag");
/// assert!(!opt.takes_value());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSpec {
    /// Key in the resulting [`super::Params`]; unique within a command.
    pub name: String,
    pub short: Option<char>,
    pub long: Option<String>,
    pub kind: OptionType,
    pub default: ParamValue,
    /// Long flag that sets this (boolean) option to `false`.
    pub inverse: Option<String>,
    pub help: String,
    /// Placeholder shown for the value in help output. Defaults to `ARG`.
    pub metavar: Option<String>,
    /// Environment variable that overrides the default when set.
    pub env_var: Option<String>,
    pub choices: Vec<Choice>,
}

impl OptionSpec {
    /// Create an option of `kind` with the type's empty default.
    pub fn new(name: impl Into<String>, kind: OptionType) -> Self {
        Self {
            name: name.into(),
            short: None,
            long: None,
            kind,
            default: kind.empty_value(),
            inverse: None,
            help: String::new(),
            metavar: None,
            env_var: None,
            choices: Vec::new(),
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, OptionType::String)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, OptionType::Integer)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, OptionType::Boolean)
    }

    pub fn list(name: impl Into<String>) -> Self {
        Self::new(name, OptionType::List)
    }

    /// Create a choice option. The first choice becomes the default.
    pub fn choice<V, D>(name: impl Into<String>, choices: impl IntoIterator<Item = (V, D)>) -> Self
    where
        V: Into<String>,
        D: Into<String>,
    {
        let mut opt = Self::new(name, OptionType::Choice);
        opt.choices = choices
            .into_iter()
            .map(|(value, description)| Choice {
                value: value.into(),
                description: description.into(),
            })
            .collect();
        if let Some(first) = opt.choices.first() {
            opt.default = ParamValue::Str(first.value.clone());
        }
        opt
    }

    pub fn short(mut self, flag: char) -> Self {
        self.short = Some(flag);
        self
    }

    pub fn long(mut self, flag: impl Into<String>) -> Self {
        self.long = Some(flag.into());
        self
    }

    pub fn default(mut self, value: impl Into<ParamValue>) -> Self {
        self.default = value.into();
        self
    }

    pub fn inverse(mut self, flag: impl Into<String>) -> Self {
        self.inverse = Some(flag.into());
        self
    }

    pub fn help(mut self, text: impl Into<String>) -> Self {
        self.help = text.into();
        self
    }

    pub fn metavar(mut self, metavar: impl Into<String>) -> Self {
        self.metavar = Some(metavar.into());
        self
    }

    pub fn env_var(mut self, var: impl Into<String>) -> Self {
        self.env_var = Some(var.into());
        self
    }

    /// Boolean options never consume a value token.
    pub fn takes_value(&self) -> bool {
        self.kind != OptionType::Boolean
    }

    pub fn is_choice(&self, value: &str) -> bool {
        self.choices.iter().any(|c| c.value == value)
    }

    /// Convert a raw string (a command-line token, an environment variable
    /// or a string from config) to this option's type.
    ///
    /// Strings for [`OptionType::List`] are split on commas; command-line
    /// occurrences are appended one at a time by the parser instead.
    pub fn coerce_str(&self, raw: &str) -> Result<ParamValue, TypeCoercionError> {
        match self.kind {
            OptionType::String => Ok(ParamValue::Str(raw.to_owned())),
            OptionType::Integer => raw.trim().parse::<i64>().map(ParamValue::Int).map_err(|e| {
                TypeCoercionError::new(&self.name, raw, format!("expected an integer ({e})"))
            }),
            OptionType::Boolean => parse_bool(raw).map(ParamValue::Bool).ok_or_else(|| {
                TypeCoercionError::new(&self.name, raw, "expected a boolean (true/false)")
            }),
            OptionType::List => Ok(ParamValue::List(
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_owned)
                    .collect(),
            )),
            OptionType::Choice => self.check_choice(raw).map(|()| ParamValue::Str(raw.to_owned())),
        }
    }

    /// Convert an already-typed value (e.g. from context) to this option's
    /// type. Strings are coerced with [`OptionSpec::coerce_str`].
    pub fn coerce_value(&self, value: &ParamValue) -> Result<ParamValue, TypeCoercionError> {
        match (self.kind, value) {
            (_, ParamValue::Str(raw)) => self.coerce_str(raw),
            (OptionType::Choice, ParamValue::Int(_) | ParamValue::Bool(_)) => {
                self.coerce_str(&value.to_string())
            }
            (OptionType::String, ParamValue::Int(_) | ParamValue::Bool(_)) => {
                Ok(ParamValue::Str(value.to_string()))
            }
            (kind, v) if v.matches(kind) => Ok(v.clone()),
            (kind, v) => Err(TypeCoercionError::new(
                &self.name,
                v.to_string(),
                format!("expected a {kind} value"),
            )),
        }
    }

    fn check_choice(&self, raw: &str) -> Result<(), TypeCoercionError> {
        if self.is_choice(raw) {
            return Ok(());
        }
        let allowed: Vec<&str> = self.choices.iter().map(|c| c.value.as_str()).collect();
        Err(TypeCoercionError::new(
            &self.name,
            raw,
            format!("expected one of: {}", allowed.join(", ")),
        ))
    }

    /// Flag signatures as shown in help, e.g. `["-f ARG", "--file=ARG"]`.
    pub fn signatures(&self) -> Vec<String> {
        let metavar = self.metavar.as_deref().unwrap_or("ARG");
        let mut sigs = Vec::new();
        if let Some(short) = self.short {
            if self.takes_value() {
                sigs.push(format!("-{short} {metavar}"));
            } else {
                sigs.push(format!("-{short}"));
            }
        }
        if let Some(long) = &self.long {
            if self.takes_value() {
                sigs.push(format!("--{long}={metavar}"));
            } else {
                sigs.push(format!("--{long}"));
            }
        }
        sigs
    }

    /// Render the help block for this option.
    ///
    /// Options without any flag (config/context only) render nothing. An
    /// inverse flag is listed even when the option has no flag of its own.
    pub fn help_doc(&self) -> Vec<String> {
        let sigs = self.signatures();
        let mut lines = Vec::new();
        if !sigs.is_empty() {
            lines.push(sigs.join(", "));
            lines.extend(self.help_text());
        }
        if let Some(inverse) = &self.inverse {
            lines.push(format!("--{inverse}"));
            let target = match (&self.long, self.short) {
                (Some(long), _) => format!("opposite of --{long}"),
                (None, Some(short)) => format!("opposite of -{short}"),
                (None, None) => format!("sets {} to false", self.name),
            };
            lines.push(format!("    {target}"));
        }
        lines
    }

    fn help_text(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let mut text = self.help.clone();
        let default_shown = match &self.default {
            ParamValue::Str(s) if s.is_empty() => None,
            ParamValue::List(l) if l.is_empty() => None,
            other => Some(other.to_string()),
        };
        if let Some(default) = default_shown {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(&format!("[default: {default}]"));
        }
        if let Some(var) = &self.env_var {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(&format!("[env: {var}]"));
        }
        if !text.is_empty() {
            lines.push(format!("    {text}"));
        }
        for choice in &self.choices {
            if choice.description.is_empty() {
                lines.push(format!("      {}", choice.value));
            } else {
                lines.push(format!("      {}: {}", choice.value, choice.description));
            }
        }
        lines
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sets_type_defaults() {
        assert_eq!(OptionSpec::string("s").default, ParamValue::Str(String::new()));
        assert_eq!(OptionSpec::integer("i").default, ParamValue::Int(0));
        assert_eq!(OptionSpec::boolean("b").default, ParamValue::Bool(false));
        assert_eq!(OptionSpec::list("l").default, ParamValue::List(vec![]));
    }

    #[test]
    fn choice_defaults_to_first_value() {
        let opt = OptionSpec::choice("fmt", [("text", "plain"), ("json", "machine")]);
        assert_eq!(opt.default, ParamValue::Str("text".into()));
        assert!(opt.is_choice("json"));
        assert!(!opt.is_choice("yaml"));
    }

    #[test]
    fn coerce_integer() {
        let opt = OptionSpec::integer("jobs");
        assert_eq!(opt.coerce_str("12").unwrap(), ParamValue::Int(12));
        let err = opt.coerce_str("twelve").unwrap_err();
        assert_eq!(err.option, "jobs");
        assert_eq!(err.value, "twelve");
    }

    #[test]
    fn coerce_boolean_strings() {
        let opt = OptionSpec::boolean("b");
        for raw in ["true", "YES", "1", "on"] {
            assert_eq!(opt.coerce_str(raw).unwrap(), ParamValue::Bool(true), "{raw}");
        }
        for raw in ["false", "No", "0", "off"] {
            assert_eq!(opt.coerce_str(raw).unwrap(), ParamValue::Bool(false), "{raw}");
        }
        assert!(opt.coerce_str("maybe").is_err());
    }

    #[test]
    fn coerce_list_splits_commas() {
        let opt = OptionSpec::list("l");
        assert_eq!(opt.coerce_str("a, b,,c").unwrap(), ParamValue::from(vec!["a", "b", "c"]));
    }

    #[test]
    fn coerce_choice_rejects_unknown() {
        let opt = OptionSpec::choice("fmt", [("text", ""), ("json", "")]);
        let err = opt.coerce_str("yaml").unwrap_err();
        assert!(err.reason.contains("text, json"), "{err}");
    }

    #[test]
    fn coerce_value_accepts_matching_and_rejects_mismatched() {
        let opt = OptionSpec::integer("n");
        assert_eq!(opt.coerce_value(&ParamValue::Int(3)).unwrap(), ParamValue::Int(3));
        assert_eq!(opt.coerce_value(&ParamValue::Str("4".into())).unwrap(), ParamValue::Int(4));
        assert!(opt.coerce_value(&ParamValue::Bool(true)).is_err());

        let opt = OptionSpec::string("s");
        assert_eq!(opt.coerce_value(&ParamValue::Int(5)).unwrap(), ParamValue::Str("5".into()));
        assert!(opt.coerce_value(&ParamValue::from(vec!["x"])).is_err());
    }

    #[test]
    fn signatures_for_valued_and_boolean() {
        let opt = OptionSpec::string("file").short('f').long("file").metavar("PATH");
        assert_eq!(opt.signatures(), vec!["-f PATH", "--file=PATH"]);

        let opt = OptionSpec::boolean("v").short('v').long("verbose");
        assert_eq!(opt.signatures(), vec!["-v", "--verbose"]);
    }

    #[test]
    fn help_doc_lists_default_env_choices_and_inverse() {
        let opt = OptionSpec::boolean("flag")
            .long("flagon")
            .short('f')
            .default(true)
            .inverse("flagoff")
            .env_var("FLAG")
            .help("a flag");
        let doc = opt.help_doc();
        assert_eq!(doc[0], "-f, --flagon");
        assert_eq!(doc[1], "    a flag [default: true] [env: FLAG]");
        assert_eq!(doc[2], "--flagoff");
        assert_eq!(doc[3], "    opposite of --flagon");

        let opt = OptionSpec::choice("fmt", [("text", "plain text"), ("json", "")]).long("format");
        let doc = opt.help_doc();
        assert!(doc.contains(&"      text: plain text".to_string()));
        assert!(doc.contains(&"      json".to_string()));
    }

    #[test]
    fn help_doc_empty_without_flags() {
        assert!(OptionSpec::string("hidden").help("x").help_doc().is_empty());
    }

    #[test]
    fn help_doc_lists_inverse_without_own_flag() {
        let opt = OptionSpec::boolean("color").default(true).inverse("no-color");
        assert_eq!(opt.help_doc(), vec!["--no-color", "    sets color to false"]);

        let opt = OptionSpec::boolean("quiet").short('q').inverse("loud");
        let doc = opt.help_doc();
        assert_eq!(doc[0], "-q");
        assert_eq!(&doc[doc.len() - 2..], ["--loud", "    opposite of -q"]);
    }

    #[test]
    fn option_type_parse_roundtrip() {
        for kind in ["string", "integer", "boolean", "list", "choice"] {
            let parsed: OptionType = kind.parse().unwrap();
            assert_eq!(parsed.to_string(), kind);
        }
        assert!("float".parse::<OptionType>().is_err());
    }
}
