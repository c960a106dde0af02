mod app;
mod builtin;
mod config;
mod config_cmd;
mod help_cmd;
mod plugins_cmd;

#[cfg(test)]
mod test_util;

use std::path::PathBuf;

use clap::Parser;

use app::App;
use config::TaskmillConfig;

#[derive(Parser)]
#[command(
    name = "taskmill",
    version,
    about = "Typed sub-commands with pluggable extensions"
)]
struct Cli {
    /// Config file (overrides TASKMILL_CONFIG env var)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Command to run followed by its arguments (default: help)
    #[arg(
        value_name = "COMMAND",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    args: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = TaskmillConfig::resolve(cli.config.as_deref())?;
    let app = App::new(config)?;

    if let Err(e) = app.run(&cli.args) {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
    Ok(())
}
