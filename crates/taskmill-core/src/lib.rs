//! Command parsing, plugin loading and task discovery for taskmill.
//!
//! The crate is split into three independent layers:
//!
//! - [`command`]: declarative [`OptionSpec`]/[`CommandSpec`] definitions and
//!   the [`CommandParser`] that turns raw tokens plus inherited context into
//!   fully populated [`Params`].
//! - [`plugin`]: the [`PluginRegistry`], a name-addressed collection of
//!   concrete objects and lazily imported `module:attribute` locations.
//! - [`discovery`]: [`TaskDiscovery`], which lists the task generators a
//!   loaded module defines, in declaration order.
//!
//! ```text
//! argv ──> CommandSpec::dispatch ──> CommandParser ──> (Params, positional) ──> target
//!
//! config ──> PluginRegistry::add ──┐
//! manifests ──> add_from_external ─┴─> resolve(name) ──ModuleImporter──> T
//!
//! LoadedModule ──> TaskDiscovery::scan ──> Vec<TaskGeneratorRef>
//! ```

pub mod command;
pub mod discovery;
pub mod plugin;

pub use command::{
    ArgumentError, CommandError, CommandParser, CommandSpec, Layer, LayerSource, OptionSpec,
    OptionType, ParamValue, Params, SpecError, TypeCoercionError,
};
pub use discovery::{
    DEFAULT_TASK_PREFIX, DiscoveryError, LoadedModule, TaskDiscovery, TaskGeneratorRef,
    TaskModule,
};
pub use plugin::{
    DeclarationSource, ManifestDir, ModuleImporter, ModuleTable, Namespace, PluginEntry,
    PluginLoadError, PluginLocation, PluginRegistry, PluginSlot, StaticDeclarations,
};
