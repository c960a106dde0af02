//! `taskmill help` command: list commands, or show one command's options.

use std::fmt::Write as _;
use std::rc::Rc;

use taskmill_core::{CommandSpec, OptionSpec, Params, SpecError};

use crate::app::{App, Command, Outcome};

pub fn command(app: &Rc<App>) -> Result<Command, SpecError> {
    let app = Rc::clone(app);
    let spec = CommandSpec::new(
        "help",
        vec![
            OptionSpec::integer("width")
                .short('w')
                .long("width")
                .default(12)
                .metavar("COLS")
                .help("width of the command name column"),
        ],
        move |params: &Params, args: &[String]| run(&app, params, args),
    )?;
    Ok(spec
        .purpose("show available commands, or the options of one command")
        .usage("[COMMAND]"))
}

fn run(app: &Rc<App>, params: &Params, args: &[String]) -> Outcome {
    match args.first() {
        Some(name) => {
            let spec = app.command_spec(name)?;
            app.write(spec.help().trim_end())
        }
        None => {
            let width = params
                .get_int("width")
                .and_then(|w| usize::try_from(w).ok())
                .unwrap_or(0);
            app.write(&overview(app, width))
        }
    }
}

/// The command listing shown by a bare `taskmill help`.
fn overview(app: &Rc<App>, width: usize) -> String {
    let mut out = String::from("taskmill: typed sub-commands with pluggable extensions\n\n");
    out.push_str("Usage: taskmill [--config PATH] COMMAND [ARGS...]\n\nCommands:\n");
    for name in app.command_names() {
        // A broken plugin must not hide the rest of the listing.
        let purpose = match app.command_spec(&name) {
            Ok(spec) => spec.purpose_text().to_owned(),
            Err(e) => format!("(unavailable: {e:#})"),
        };
        let _ = writeln!(out, "  {name:<width$}  {purpose}");
    }
    out.push_str("\nRun `taskmill help COMMAND` to see a command's options.");
    out
}
