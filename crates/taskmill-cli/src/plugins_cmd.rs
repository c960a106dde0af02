//! `taskmill plugins` command: list registered command plugins.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::rc::Rc;

use anyhow::Context;
use serde::Serialize;

use taskmill_core::plugin::PluginListing;
use taskmill_core::{CommandSpec, OptionSpec, Params, SpecError};

use crate::app::{App, Command, Outcome};

/// Category shown for plugins registered as concrete objects.
const BUILTIN_CATEGORY: &str = "builtin";

#[derive(Debug, Serialize)]
struct Row {
    #[serde(flatten)]
    listing: PluginListing,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub fn command(app: &Rc<App>) -> Result<Command, SpecError> {
    let app = Rc::clone(app);
    let spec = CommandSpec::new(
        "plugins",
        vec![
            OptionSpec::string("category")
                .short('c')
                .long("category")
                .metavar("NAME")
                .help("only list plugins of this category (`builtin` for concrete ones)"),
            OptionSpec::boolean("resolve")
                .short('r')
                .long("resolve")
                .inverse("no-resolve")
                .help("load every listed plugin and report failures"),
            OptionSpec::choice(
                "format",
                [("text", "one line per plugin"), ("json", "a JSON array")],
            )
            .long("format")
            .env_var("TASKMILL_PLUGINS_FORMAT")
            .help("output format"),
            OptionSpec::list("only")
                .short('o')
                .long("only")
                .metavar("NAMES")
                .help("only list these plugins (repeatable, comma-separated)"),
        ],
        move |params: &Params, _: &[String]| run(&app, params),
    )?;
    Ok(spec.purpose("list registered command plugins and where they load from"))
}

fn category_of(listing: &PluginListing) -> &str {
    listing.category.as_deref().unwrap_or(BUILTIN_CATEGORY)
}

fn run(app: &Rc<App>, params: &Params) -> Outcome {
    let category = params.get_str("category").unwrap_or_default();
    let only = params.get_list("only").unwrap_or_default();
    let selected = |listing: &PluginListing| {
        (category.is_empty() || category_of(listing) == category)
            && (only.is_empty() || only.contains(&listing.name))
    };

    let mut errors = BTreeMap::new();
    if params.get_bool("resolve") == Some(true) {
        for listing in app.describe_commands().iter().filter(|l| selected(*l)) {
            if let Err(e) = app.resolve_command(&listing.name) {
                errors.insert(listing.name.clone(), e.to_string());
            }
        }
    }

    let rows: Vec<Row> = app
        .describe_commands()
        .into_iter()
        .filter(|l| selected(l))
        .map(|listing| {
            let error = errors.remove(&listing.name);
            Row { listing, error }
        })
        .collect();

    match params.get_str("format") {
        Some("json") => {
            let json =
                serde_json::to_string_pretty(&rows).context("failed to serialize plugin listing")?;
            app.write(&json)
        }
        _ => app.write(&render_text(&rows)),
    }
}

fn render_text(rows: &[Row]) -> String {
    if rows.is_empty() {
        return "no plugins match".to_owned();
    }
    let width = rows.iter().map(|r| r.listing.name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for row in rows {
        let marker = if row.listing.resolved { '*' } else { ' ' };
        let _ = write!(
            out,
            "[{marker}] {:<width$}  {:<8}",
            row.listing.name,
            category_of(&row.listing)
        );
        if let Some(location) = &row.listing.location {
            let _ = write!(out, "  {location}");
        }
        out.push('\n');
        if let Some(error) = &row.error {
            let _ = writeln!(out, "    error: {error}");
        }
    }
    out.truncate(out.trim_end().len());
    out
}
