//! Token parsing and layered parameter resolution.
//!
//! Parsing happens in two phases. Tokenizing maps every flag to the
//! [`OptionSpec`] it names and fails on the first unknown or malformed
//! token. Only once the whole token list is accepted are the override
//! layers built and merged, so a failed parse has no partial effect.

use std::collections::{HashMap, HashSet};

use tracing::Span;

use super::error::{ArgumentError, CommandError, TypeCoercionError};
use super::option::{OptionSpec, OptionType};
use super::params::{ParamValue, Params};

/// Where a layer's values came from, lowest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LayerSource {
    Default,
    Environment,
    Context,
    CommandLine,
}

impl std::fmt::Display for LayerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Default => "default",
            Self::Environment => "environment",
            Self::Context => "context",
            Self::CommandLine => "command line",
        };
        f.write_str(s)
    }
}

/// One override layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    pub source: LayerSource,
    pub values: Params,
}

impl Layer {
    /// Merge layers left-to-right; later layers win.
    pub fn merge(layers: &[Layer]) -> Params {
        let mut merged = Params::new();
        for layer in layers {
            merged.extend(&layer.values);
        }
        merged
    }

    /// The highest-precedence layer that sets `name`.
    pub fn source_of(layers: &[Layer], name: &str) -> Option<LayerSource> {
        layers
            .iter()
            .rev()
            .find(|layer| layer.values.contains(name))
            .map(|layer| layer.source)
    }
}

/// What a recognized flag means.
#[derive(Clone, Copy)]
enum Alias<'a> {
    /// The option's own flag.
    Set(&'a OptionSpec),
    /// A boolean option's inverse flag.
    Unset(&'a OptionSpec),
}

/// A single accepted option occurrence.
enum Occurrence<'a> {
    Flag(&'a OptionSpec, bool),
    Value(&'a OptionSpec, String),
}

impl<'a> Occurrence<'a> {
    fn option(&self) -> &'a OptionSpec {
        match self {
            Self::Flag(opt, _) | Self::Value(opt, _) => opt,
        }
    }
}

/// Parser for one command's option list.
pub struct CommandParser<'a> {
    command: &'a str,
    options: &'a [OptionSpec],
    shorts: HashMap<char, Alias<'a>>,
    longs: HashMap<&'a str, Alias<'a>>,
    span: Span,
}

impl<'a> CommandParser<'a> {
    /// Build the flag tables for `options`.
    ///
    /// `options` are expected to have passed [`super::CommandSpec`]
    /// validation; with duplicated flags the last option wins.
    pub fn new(command: &'a str, options: &'a [OptionSpec]) -> Self {
        let mut shorts = HashMap::new();
        let mut longs = HashMap::new();
        for opt in options {
            if let Some(short) = opt.short {
                shorts.insert(short, Alias::Set(opt));
            }
            if let Some(long) = &opt.long {
                longs.insert(long.as_str(), Alias::Set(opt));
            }
            if let Some(inverse) = &opt.inverse {
                longs.insert(inverse.as_str(), Alias::Unset(opt));
            }
        }
        Self {
            command,
            options,
            shorts,
            longs,
            span: Span::none(),
        }
    }

    /// Emit parse diagnostics inside `span`.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Parse `tokens`, reading environment overrides from the process
    /// environment.
    pub fn parse(
        &self,
        tokens: &[String],
        context: &Params,
    ) -> Result<(Params, Vec<String>), CommandError> {
        self.parse_with_env(tokens, context, |var| std::env::var(var).ok())
    }

    /// Parse `tokens` with an explicit environment lookup.
    pub fn parse_with_env<E>(
        &self,
        tokens: &[String],
        context: &Params,
        env: E,
    ) -> Result<(Params, Vec<String>), CommandError>
    where
        E: Fn(&str) -> Option<String>,
    {
        let (layers, positional) = self.resolve_layers(tokens, context, env)?;
        Ok((Layer::merge(&layers), positional))
    }

    /// Build the ordered override layers without merging them.
    pub fn resolve_layers<E>(
        &self,
        tokens: &[String],
        context: &Params,
        env: E,
    ) -> Result<(Vec<Layer>, Vec<String>), CommandError>
    where
        E: Fn(&str) -> Option<String>,
    {
        let _guard = self.span.enter();

        let (occurrences, positional) = self.tokenize(tokens)?;

        // Options set on the command line win regardless of what lower
        // layers hold, so a bad lower-layer value for them is not fatal.
        let overridden: HashSet<&str> = occurrences
            .iter()
            .map(|occurrence| occurrence.option().name.as_str())
            .collect();

        let mut layers = vec![
            Layer {
                source: LayerSource::Default,
                values: self.default_layer(),
            },
            Layer {
                source: LayerSource::Environment,
                values: self.environment_layer(&env, &overridden)?,
            },
            Layer {
                source: LayerSource::Context,
                values: self.context_layer(context, &overridden)?,
            },
        ];
        let below = Layer::merge(&layers);
        layers.push(Layer {
            source: LayerSource::CommandLine,
            values: self.command_line_layer(occurrences, &below)?,
        });

        tracing::trace!(
            command = self.command,
            positional = positional.len(),
            "parsed command arguments"
        );
        Ok((layers, positional))
    }

    fn default_layer(&self) -> Params {
        self.options
            .iter()
            .map(|opt| (opt.name.clone(), opt.default.clone()))
            .collect()
    }

    fn environment_layer<E>(
        &self,
        env: &E,
        overridden: &HashSet<&str>,
    ) -> Result<Params, TypeCoercionError>
    where
        E: Fn(&str) -> Option<String>,
    {
        let mut values = Params::new();
        for opt in self.options {
            let Some(var) = &opt.env_var else { continue };
            if let Some(raw) = env(var.as_str()) {
                if let Some(value) = self.lower_value(opt.coerce_str(&raw), overridden)? {
                    values.insert(opt.name.clone(), value);
                }
            }
        }
        Ok(values)
    }

    fn context_layer(
        &self,
        context: &Params,
        overridden: &HashSet<&str>,
    ) -> Result<Params, TypeCoercionError> {
        let mut values = Params::new();
        for (name, value) in context.iter() {
            match self.options.iter().find(|o| o.name == name) {
                Some(opt) => {
                    if let Some(value) = self.lower_value(opt.coerce_value(value), overridden)? {
                        values.insert(name, value);
                    }
                }
                None => {
                    tracing::debug!(
                        command = self.command,
                        key = name,
                        "ignoring context value for unknown option"
                    );
                }
            }
        }
        Ok(values)
    }

    /// A coerced lower-layer value. Failures are dropped for options the
    /// command line sets and returned otherwise.
    fn lower_value(
        &self,
        coerced: Result<ParamValue, TypeCoercionError>,
        overridden: &HashSet<&str>,
    ) -> Result<Option<ParamValue>, TypeCoercionError> {
        match coerced {
            Ok(value) => Ok(Some(value)),
            Err(e) if overridden.contains(e.option.as_str()) => {
                tracing::debug!(
                    command = self.command,
                    option = %e.option,
                    value = %e.value,
                    "ignoring invalid value for option set on the command line"
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// List occurrences append to the value the lower layers resolved.
    fn command_line_layer(
        &self,
        occurrences: Vec<Occurrence<'a>>,
        below: &Params,
    ) -> Result<Params, TypeCoercionError> {
        let mut values = Params::new();
        let mut lists: Vec<(&str, Vec<String>)> = Vec::new();

        for occurrence in occurrences {
            match occurrence {
                Occurrence::Flag(opt, on) => {
                    values.insert(opt.name.clone(), on);
                }
                Occurrence::Value(opt, raw) if opt.kind == OptionType::List => {
                    match lists.iter_mut().find(|(name, _)| *name == opt.name) {
                        Some((_, items)) => items.push(raw),
                        None => {
                            let mut items = below
                                .get_list(&opt.name)
                                .map(<[String]>::to_vec)
                                .unwrap_or_default();
                            items.push(raw);
                            lists.push((opt.name.as_str(), items));
                        }
                    }
                }
                Occurrence::Value(opt, raw) => {
                    values.insert(opt.name.clone(), opt.coerce_str(&raw)?);
                }
            }
        }
        for (name, items) in lists {
            values.insert(name, ParamValue::List(items));
        }
        Ok(values)
    }

    /// Split `tokens` into option occurrences and the positional remainder.
    ///
    /// Option processing stops at `--` or at the first token that is not a
    /// flag; everything from there on is positional.
    fn tokenize(&self, tokens: &[String]) -> Result<(Vec<Occurrence<'a>>, Vec<String>), ArgumentError> {
        let mut occurrences = Vec::new();
        let mut i = 0;

        while i < tokens.len() {
            let token = tokens[i].as_str();

            if token == "--" {
                i += 1;
                break;
            }

            if let Some(body) = token.strip_prefix("--") {
                let (name, inline) = match body.split_once('=') {
                    Some((name, value)) => (name, Some(value)),
                    None => (body, None),
                };
                let alias = self
                    .longs
                    .get(name)
                    .copied()
                    .ok_or_else(|| self.error(format!("unrecognized option --{name}")))?;

                match alias {
                    Alias::Set(opt) if opt.takes_value() => {
                        let value = match inline {
                            Some(v) => v.to_owned(),
                            None => {
                                i += 1;
                                tokens.get(i).cloned().ok_or_else(|| {
                                    self.error(format!("option --{name} requires a value"))
                                })?
                            }
                        };
                        occurrences.push(Occurrence::Value(opt, value));
                    }
                    Alias::Set(opt) | Alias::Unset(opt) => {
                        if inline.is_some() {
                            return Err(self.error(format!("option --{name} does not take a value")));
                        }
                        occurrences.push(Occurrence::Flag(opt, matches!(alias, Alias::Set(_))));
                    }
                }
                i += 1;
                continue;
            }

            if let Some(cluster) = token.strip_prefix('-').filter(|rest| !rest.is_empty()) {
                for (offset, flag) in cluster.char_indices() {
                    let opt = match self.shorts.get(&flag) {
                        Some(Alias::Set(opt)) => *opt,
                        _ => return Err(self.error(format!("unrecognized option -{flag}"))),
                    };
                    if !opt.takes_value() {
                        occurrences.push(Occurrence::Flag(opt, true));
                        continue;
                    }
                    let attached = &cluster[offset + flag.len_utf8()..];
                    let value = if attached.is_empty() {
                        i += 1;
                        tokens.get(i).cloned().ok_or_else(|| {
                            self.error(format!("option -{flag} requires a value"))
                        })?
                    } else {
                        attached.to_owned()
                    };
                    occurrences.push(Occurrence::Value(opt, value));
                    break;
                }
                i += 1;
                continue;
            }

            // First positional token ends option processing.
            break;
        }

        Ok((occurrences, tokens[i.min(tokens.len())..].to_vec()))
    }

    fn error(&self, message: String) -> ArgumentError {
        ArgumentError::new(self.command, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn options() -> Vec<OptionSpec> {
        vec![
            OptionSpec::boolean("flag")
                .long("flagon")
                .short('f')
                .default(true)
                .inverse("flagoff"),
            OptionSpec::boolean("verbose").short('v').long("verbose"),
            OptionSpec::string("file").short('o').long("file").default("out.txt"),
            OptionSpec::integer("jobs").short('n').long("jobs").default(1).env_var("JOBS"),
            OptionSpec::list("list").short('l').long("list"),
            OptionSpec::choice("fmt", [("text", ""), ("json", "")]).long("format"),
        ]
    }

    fn parse(tokens: &[&str]) -> Result<(Params, Vec<String>), CommandError> {
        let opts = options();
        CommandParser::new("test", &opts).parse_with_env(&toks(tokens), &Params::new(), |_| None)
    }

    #[test]
    fn defaults_fill_every_option() {
        let (params, args) = parse(&[]).unwrap();
        assert_eq!(params.len(), 6);
        assert_eq!(params.get_bool("flag"), Some(true));
        assert_eq!(params.get_str("file"), Some("out.txt"));
        assert_eq!(params.get_int("jobs"), Some(1));
        assert_eq!(params.get_list("list"), Some(&[][..]));
        assert_eq!(params.get_str("fmt"), Some("text"));
        assert!(args.is_empty());
    }

    #[test]
    fn inverse_flag_clears_same_field() {
        let (params, _) = parse(&["--flagoff"]).unwrap();
        assert_eq!(params.get_bool("flag"), Some(false));
        assert!(!params.contains("flagoff"));

        let (params, _) = parse(&["--flagoff", "-f"]).unwrap();
        assert_eq!(params.get_bool("flag"), Some(true));
    }

    #[test]
    fn short_and_long_forms_agree() {
        let (short, _) = parse(&["-o", "a.txt"]).unwrap();
        let (long, _) = parse(&["--file=a.txt"]).unwrap();
        let (long_sep, _) = parse(&["--file", "a.txt"]).unwrap();
        assert_eq!(short, long);
        assert_eq!(long, long_sep);
    }

    #[test]
    fn attached_short_value_and_clusters() {
        let (params, _) = parse(&["-vn4"]).unwrap();
        assert_eq!(params.get_bool("verbose"), Some(true));
        assert_eq!(params.get_int("jobs"), Some(4));

        let (params, _) = parse(&["-oresult.txt"]).unwrap();
        assert_eq!(params.get_str("file"), Some("result.txt"));
    }

    #[test]
    fn list_accumulates_occurrences() {
        let (params, _) = parse(&["-l", "a", "--list=b", "-lc"]).unwrap();
        assert_eq!(params.get_list("list").unwrap(), ["a", "b", "c"]);
    }

    #[test]
    fn positional_stops_option_processing() {
        let (params, args) = parse(&["-v", "build", "-n", "3"]).unwrap();
        assert_eq!(params.get_bool("verbose"), Some(true));
        assert_eq!(params.get_int("jobs"), Some(1));
        assert_eq!(args, toks(&["build", "-n", "3"]));
    }

    #[test]
    fn double_dash_and_lone_dash() {
        let (_, args) = parse(&["--", "-v"]).unwrap();
        assert_eq!(args, toks(&["-v"]));

        let (_, args) = parse(&["-", "x"]).unwrap();
        assert_eq!(args, toks(&["-", "x"]));
    }

    #[test]
    fn unknown_flags_fail() {
        let err = parse(&["--nope"]).unwrap_err();
        assert!(
            matches!(err, CommandError::Argument(ref e) if e.command == "test" && e.message.contains("--nope")),
            "got {err}"
        );
        assert!(matches!(parse(&["-x"]).unwrap_err(), CommandError::Argument(_)));
        // Inverse flags are long-only; an abbreviation is not a match.
        assert!(matches!(parse(&["--flago"]).unwrap_err(), CommandError::Argument(_)));
    }

    #[test]
    fn missing_and_unexpected_values_fail() {
        assert!(matches!(parse(&["--jobs"]).unwrap_err(), CommandError::Argument(_)));
        assert!(matches!(parse(&["-n"]).unwrap_err(), CommandError::Argument(_)));
        assert!(matches!(parse(&["--verbose=yes"]).unwrap_err(), CommandError::Argument(_)));
        assert!(matches!(parse(&["--flagoff=1"]).unwrap_err(), CommandError::Argument(_)));
    }

    #[test]
    fn coercion_errors_name_option_and_value() {
        let err = parse(&["--jobs=many"]).unwrap_err();
        assert!(
            matches!(err, CommandError::TypeCoercion(ref e) if e.option == "jobs" && e.value == "many"),
            "got {err}"
        );

        let err = parse(&["--format", "yaml"]).unwrap_err();
        assert!(matches!(err, CommandError::TypeCoercion(ref e) if e.option == "fmt" && e.value == "yaml"));
    }

    #[test]
    fn layer_precedence_default_env_context_cli() {
        let opts = options();
        let parser = CommandParser::new("test", &opts);
        let env = |var: &str| (var == "JOBS").then(|| "2".to_string());

        let (params, _) = parser.parse_with_env(&[], &Params::new(), env).unwrap();
        assert_eq!(params.get_int("jobs"), Some(2));

        let context = Params::new().with("jobs", 3);
        let (params, _) = parser.parse_with_env(&[], &context, env).unwrap();
        assert_eq!(params.get_int("jobs"), Some(3));

        let (params, _) = parser.parse_with_env(&toks(&["-n", "4"]), &context, env).unwrap();
        assert_eq!(params.get_int("jobs"), Some(4));
    }

    #[test]
    fn context_values_are_coerced_and_unknown_keys_ignored() {
        let opts = options();
        let parser = CommandParser::new("test", &opts);
        let context = Params::new()
            .with("jobs", "8")
            .with("list", "x,y")
            .with("verbose", "yes")
            .with("unrelated", 1);
        let (params, _) = parser.parse_with_env(&[], &context, |_| None).unwrap();
        assert_eq!(params.get_int("jobs"), Some(8));
        assert_eq!(params.get_list("list").unwrap(), ["x", "y"]);
        assert_eq!(params.get_bool("verbose"), Some(true));
        assert!(!params.contains("unrelated"));
    }

    #[test]
    fn bad_context_value_fails() {
        let opts = options();
        let parser = CommandParser::new("test", &opts);
        let context = Params::new().with("fmt", "yaml");
        let err = parser.parse_with_env(&[], &context, |_| None).unwrap_err();
        assert!(matches!(err, CommandError::TypeCoercion(_)));
    }

    #[test]
    fn cli_list_appends_to_context_list() {
        let opts = options();
        let parser = CommandParser::new("test", &opts);
        let context = Params::new().with("list", vec!["from-config"]);
        let (params, _) = parser
            .parse_with_env(&toks(&["-l", "cli", "-l", "more"]), &context, |_| None)
            .unwrap();
        assert_eq!(params.get_list("list").unwrap(), ["from-config", "cli", "more"]);
    }

    #[test]
    fn cli_list_appends_to_declared_default() {
        let opts = vec![OptionSpec::list("list").short('l').default(vec!["base"])];
        let parser = CommandParser::new("test", &opts);
        let (params, _) = parser
            .parse_with_env(&toks(&["-l", "a"]), &Params::new(), |_| None)
            .unwrap();
        assert_eq!(params.get_list("list").unwrap(), ["base", "a"]);

        let (params, _) = parser
            .parse_with_env(&[], &Params::new(), |_| None)
            .unwrap();
        assert_eq!(params.get_list("list").unwrap(), ["base"]);
    }

    #[test]
    fn invalid_env_value_is_ignored_when_cli_sets_option() {
        let opts = options();
        let parser = CommandParser::new("test", &opts);
        let env = |var: &str| (var == "JOBS").then(|| "lots".to_owned());

        let (params, _) = parser
            .parse_with_env(&toks(&["-n", "3"]), &Params::new(), env)
            .unwrap();
        assert_eq!(params.get_int("jobs"), Some(3));

        let err = parser
            .parse_with_env(&[], &Params::new(), env)
            .unwrap_err();
        assert!(
            matches!(err, CommandError::TypeCoercion(ref e) if e.option == "jobs" && e.value == "lots"),
            "got {err}"
        );
    }

    #[test]
    fn invalid_context_value_is_ignored_when_cli_sets_option() {
        let opts = options();
        let parser = CommandParser::new("test", &opts);
        let context = Params::new().with("jobs", "many").with("fmt", "xml");

        let (params, _) = parser
            .parse_with_env(&toks(&["-n", "3", "--format", "json"]), &context, |_| None)
            .unwrap();
        assert_eq!(params.get_int("jobs"), Some(3));
        assert_eq!(params.get_str("fmt"), Some("json"));

        let err = parser
            .parse_with_env(&toks(&["-n", "3"]), &context, |_| None)
            .unwrap_err();
        assert!(
            matches!(err, CommandError::TypeCoercion(ref e) if e.option == "fmt"),
            "got {err}"
        );
    }

    #[test]
    fn source_of_reports_winning_layer() {
        let opts = options();
        let parser = CommandParser::new("test", &opts);
        let context = Params::new().with("file", "ctx.txt");
        let (layers, _) = parser
            .resolve_layers(&toks(&["-v"]), &context, |_| None)
            .unwrap();
        assert_eq!(Layer::source_of(&layers, "verbose"), Some(LayerSource::CommandLine));
        assert_eq!(Layer::source_of(&layers, "file"), Some(LayerSource::Context));
        assert_eq!(Layer::source_of(&layers, "jobs"), Some(LayerSource::Default));
        assert_eq!(Layer::source_of(&layers, "missing"), None);
    }
}
