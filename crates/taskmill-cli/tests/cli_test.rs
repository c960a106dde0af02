//! End-to-end tests for the `taskmill` binary.
//!
//! Each test runs the compiled binary with an isolated config directory so
//! the developer's own `~/.config/taskmill` never leaks in.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn taskmill(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_taskmill"))
        .args(args)
        .env("XDG_CONFIG_HOME", home)
        .env_remove("TASKMILL_CONFIG")
        .env_remove("TASKMILL_EXTENSIONS_DIR")
        .env_remove("TASKMILL_PLUGINS_FORMAT")
        .env("RUST_LOG", "error")
        .output()
        .expect("failed to run taskmill binary")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn write_config(home: &Path, contents: &str) {
    let dir = home.join("taskmill");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), contents).unwrap();
}

#[test]
fn bare_invocation_lists_commands() {
    let home = TempDir::new().unwrap();
    let out = taskmill(home.path(), &[]);
    assert!(out.status.success(), "{}", stderr(&out));
    let text = stdout(&out);
    for name in ["help", "plugins", "config"] {
        assert!(text.contains(name), "missing {name} in:\n{text}");
    }
}

#[test]
fn unknown_command_exits_non_zero() {
    let home = TempDir::new().unwrap();
    let out = taskmill(home.path(), &["frobnicate"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("unknown command"), "{}", stderr(&out));
}

#[test]
fn config_file_context_and_plugins() {
    let home = TempDir::new().unwrap();
    write_config(
        home.path(),
        r#"
[commands.plugins]
format = "json"

[plugins.command]
settings = "taskmill.cmd:config"
"#,
    );

    let out = taskmill(home.path(), &["plugins", "--only", "settings"]);
    assert!(out.status.success(), "{}", stderr(&out));
    let rows: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(rows[0]["name"], "settings");
    assert_eq!(rows[0]["location"], "taskmill.cmd:config");

    let out = taskmill(home.path(), &["settings", "plugins"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(stdout(&out).contains("(context)"), "{}", stdout(&out));
}

#[test]
fn extension_manifests_register_commands() {
    let home = TempDir::new().unwrap();
    let ext = home.path().join("taskmill").join("extensions.d");
    std::fs::create_dir_all(&ext).unwrap();
    std::fs::write(
        ext.join("aliases.toml"),
        "[extensions.command]\nls = \"taskmill.cmd:plugins\"\n",
    )
    .unwrap();

    let out = taskmill(home.path(), &["ls", "--format", "json"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(stdout(&out).contains("\"ls\""), "{}", stdout(&out));
}

#[test]
fn explicit_config_flag_must_exist() {
    let home = TempDir::new().unwrap();
    let missing = home.path().join("missing.toml");
    let out = taskmill(home.path(), &["--config", missing.to_str().unwrap(), "help"]);
    assert!(!out.status.success());
}
