//! Task discovery: list the task generators a loaded module defines.
//!
//! A task generator is any callable defined directly in the module whose
//! name starts with the task prefix (`task_` by default). The prefix is
//! stripped to form the task name, and results are ordered by declaration
//! position, which is the order the author wrote them, never alphabetical.

pub mod module;

use thiserror::Error;
use tracing::Span;

pub use module::{LoadedModule, MemberKind, ModuleMember, Origin, TaskModule, TaskModuleBuilder};

/// Prefix marking a module-level callable as a task generator.
pub const DEFAULT_TASK_PREFIX: &str = "task_";

/// Errors produced while loading or building a task module.
///
/// Discovery itself never fails; these come from the loading side and are
/// propagated unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    #[error("failed to load module {module:?}: {message}")]
    Load { module: String, message: String },

    #[error("module {module:?} defines {name:?} more than once")]
    DuplicateMember { module: String, name: String },

    #[error(
        "module {module:?}: {first:?} and {second:?} share declaration position {position}"
    )]
    DuplicatePosition {
        module: String,
        position: u32,
        first: String,
        second: String,
    },
}

/// A discovered task generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskGeneratorRef<F> {
    /// Member name with the prefix removed.
    pub name: String,
    pub generator: F,
    /// Declaration position, kept for diagnostics.
    pub position: u32,
}

/// Scans loaded modules for task generators.
#[derive(Debug, Clone)]
pub struct TaskDiscovery {
    prefix: String,
    span: Span,
}

impl Default for TaskDiscovery {
    fn default() -> Self {
        Self::new(DEFAULT_TASK_PREFIX)
    }
}

impl TaskDiscovery {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            span: Span::none(),
        }
    }

    /// Emit discovery diagnostics inside `span`.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// List `module`'s task generators in declaration order.
    pub fn scan<F, M>(&self, module: &M) -> Vec<TaskGeneratorRef<F>>
    where
        F: Clone,
        M: LoadedModule<F> + ?Sized,
    {
        let _guard = self.span.enter();
        let mut found: Vec<TaskGeneratorRef<F>> = module
            .members()
            .iter()
            .filter(|m| m.origin == Origin::Defined)
            .filter_map(|m| {
                let generator = m.callable()?;
                let name = m.name.strip_prefix(self.prefix.as_str())?;
                if name.is_empty() {
                    tracing::debug!(module = module.name(), member = %m.name, "skipping bare task prefix");
                    return None;
                }
                Some(TaskGeneratorRef {
                    name: name.to_owned(),
                    generator: generator.clone(),
                    position: m.position,
                })
            })
            .collect();
        found.sort_by_key(|t| t.position);

        tracing::debug!(
            module = module.name(),
            prefix = %self.prefix,
            count = found.len(),
            "discovered task generators"
        );
        found
    }
}

/// [`TaskDiscovery::scan`] with an explicit prefix.
pub fn scan<F, M>(module: &M, prefix: &str) -> Vec<TaskGeneratorRef<F>>
where
    F: Clone,
    M: LoadedModule<F> + ?Sized,
{
    TaskDiscovery::new(prefix).scan(module)
}

/// [`TaskDiscovery::scan`] with [`DEFAULT_TASK_PREFIX`].
pub fn scan_default<F, M>(module: &M) -> Vec<TaskGeneratorRef<F>>
where
    F: Clone,
    M: LoadedModule<F> + ?Sized,
{
    TaskDiscovery::default().scan(module)
}

/// The module's own configuration table, or an empty table.
pub fn module_config<F, M>(module: &M) -> toml::Table
where
    M: LoadedModule<F> + ?Sized,
{
    module.config().cloned().unwrap_or_default()
}
