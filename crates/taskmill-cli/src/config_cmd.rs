//! `taskmill config` command: show where each option value of a command
//! comes from.
//!
//! `taskmill config plugins --format json` prints every option of
//! `plugins` with the value it would receive and the layer that set it
//! (default, environment, context from the config file, or the given
//! arguments).

use std::fmt::Write as _;
use std::rc::Rc;

use taskmill_core::{CommandSpec, Layer, OptionSpec, Params, SpecError};

use crate::app::{App, Command, Outcome};

pub fn command(app: &Rc<App>) -> Result<Command, SpecError> {
    let app = Rc::clone(app);
    let spec = CommandSpec::new(
        "config",
        vec![
            OptionSpec::boolean("sources")
                .short('s')
                .long("sources")
                .default(true)
                .inverse("no-sources")
                .help("show which layer set each value"),
        ],
        move |params: &Params, args: &[String]| run(&app, params, args),
    )?;
    Ok(spec
        .purpose("show the effective options of a command")
        .usage("[COMMAND [ARGS...]]"))
}

fn run(app: &Rc<App>, params: &Params, args: &[String]) -> Outcome {
    let show_sources = params.get_bool("sources").unwrap_or(true);
    match args.split_first() {
        Some((name, rest)) => app.write(&effective_options(app, name, rest, show_sources)?),
        None => app.write(&config_summary(app)),
    }
}

/// One line per option of `name`: its merged value and winning layer.
fn effective_options(
    app: &Rc<App>,
    name: &str,
    tokens: &[String],
    show_sources: bool,
) -> anyhow::Result<String> {
    let spec = app.command_spec(name)?;
    let context = app.config().context_for(name)?;
    let (layers, positional) =
        spec.parser()
            .resolve_layers(tokens, &context, |var| std::env::var(var).ok())?;
    let merged = Layer::merge(&layers);

    let width = spec.options().iter().map(|o| o.name.len()).max().unwrap_or(0);
    let mut out = format!("{}:\n", spec.name());
    for opt in spec.options() {
        let value = merged.get(&opt.name).map(ToString::to_string).unwrap_or_default();
        let _ = write!(out, "  {:<width$} = {value}", opt.name);
        if show_sources {
            if let Some(source) = Layer::source_of(&layers, &opt.name) {
                let _ = write!(out, "  ({source})");
            }
        }
        out.push('\n');
    }
    if !positional.is_empty() {
        let _ = writeln!(out, "  positional: {}", positional.join(" "));
    }
    out.truncate(out.trim_end().len());
    Ok(out)
}

/// Where configuration was loaded from.
fn config_summary(app: &Rc<App>) -> String {
    let config = app.config();
    let mut out = String::new();
    match &config.source {
        Some(path) => {
            let _ = writeln!(out, "config file: {}", path.display());
        }
        None => out.push_str("config file: (none)\n"),
    }
    let _ = writeln!(out, "extensions:  {}", config.extensions_dir.display());
    let _ = writeln!(out, "global keys: {}", config.file.global.len());
    let commands: Vec<&str> = config.file.commands.keys().map(String::as_str).collect();
    if !commands.is_empty() {
        let _ = writeln!(out, "per-command: {}", commands.join(", "));
    }
    out.truncate(out.trim_end().len());
    out
}
