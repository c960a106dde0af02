//! Built-in command plugins and registry assembly.
//!
//! Registration order decides listing order and, for duplicate names, the
//! winner (later registrations replace earlier ones):
//!
//! 1. built-in commands (`help` and `plugins` as concrete factories,
//!    `config` as a lazy `taskmill.cmd:config` entry)
//! 2. extension manifests in the extensions directory
//! 3. the config file's `[plugins.command]` table

use anyhow::{Context, Result};

use taskmill_core::{ManifestDir, ModuleTable, Namespace, PluginRegistry};

use crate::app::{COMMAND_CATEGORY, CommandFactory};
use crate::config::TaskmillConfig;
use crate::{config_cmd, help_cmd, plugins_cmd};

/// Module exporting every built-in command factory.
pub const BUILTIN_MODULE: &str = "taskmill.cmd";

/// The modules command locations can point into.
pub fn modules() -> ModuleTable<CommandFactory> {
    ModuleTable::new().with(
        Namespace::new(BUILTIN_MODULE)
            .with("help", help_cmd::command as CommandFactory)
            .with("plugins", plugins_cmd::command as CommandFactory)
            .with("config", config_cmd::command as CommandFactory),
    )
}

/// Assemble the command registry for `config`.
pub fn build_registry(config: &TaskmillConfig) -> Result<PluginRegistry<CommandFactory>> {
    let mut registry = PluginRegistry::new(modules())
        .with_span(tracing::debug_span!("plugins", category = COMMAND_CATEGORY));

    registry.add_resolved("help", help_cmd::command as CommandFactory);
    registry.add_resolved("plugins", plugins_cmd::command as CommandFactory);
    registry.add(
        COMMAND_CATEGORY,
        [("config", format!("{BUILTIN_MODULE}:config"))],
    );

    let manifests = ManifestDir::new(config.extensions_dir.clone());
    registry
        .add_from_external_declarations(COMMAND_CATEGORY, &manifests)
        .with_context(|| {
            format!(
                "failed to load extension manifests from {}",
                manifests.path().display()
            )
        })?;

    if let Some(declared) = config.plugins(COMMAND_CATEGORY) {
        registry.add(
            COMMAND_CATEGORY,
            declared.iter().map(|(name, location)| (name.as_str(), location.as_str())),
        );
    }

    tracing::debug!(count = registry.len(), "command registry ready");
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFile;

    fn config_in(dir: &std::path::Path, file: ConfigFile) -> TaskmillConfig {
        TaskmillConfig {
            file,
            extensions_dir: dir.to_path_buf(),
            ..TaskmillConfig::default()
        }
    }

    #[test]
    fn builtin_module_exports_every_command() {
        let table = modules();
        assert_eq!(table.module_names(), [BUILTIN_MODULE]);
    }

    #[test]
    fn builtins_only() {
        let tmp = tempfile::TempDir::new().unwrap();
        let registry = build_registry(&config_in(tmp.path(), ConfigFile::default())).unwrap();
        assert_eq!(registry.names(), ["help", "plugins", "config"]);

        let listing = registry.describe();
        assert!(listing[0].resolved);
        assert_eq!(listing[2].location.as_deref(), Some("taskmill.cmd:config"));
        assert!(!listing[2].resolved);
    }

    #[test]
    fn manifests_then_config_file_last_write_wins() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("10-aliases.toml"),
            "[extensions.command]\nshow = \"taskmill.cmd:config\"\nls = \"taskmill.cmd:plugins\"\n",
        )
        .unwrap();
        let file: ConfigFile =
            toml::from_str("[plugins.command]\nls = \"taskmill.cmd:help\"\n").unwrap();

        let mut registry = build_registry(&config_in(tmp.path(), file)).unwrap();
        assert_eq!(registry.names(), ["help", "plugins", "config", "ls", "show"]);

        let listing = registry.describe();
        let ls = listing.iter().find(|l| l.name == "ls").unwrap();
        assert_eq!(ls.location.as_deref(), Some("taskmill.cmd:help"));

        assert!(registry.resolve("show").is_ok());
    }

    #[test]
    fn unreadable_manifest_is_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("bad.toml"), "[extensions.command\n").unwrap();
        let err = build_registry(&config_in(tmp.path(), ConfigFile::default())).unwrap_err();
        assert!(err.to_string().contains("extension manifests"), "{err}");
    }
}
