//! Shared test utilities for taskmill integration tests.
//!
//! Provides:
//! - [`CountingImporter`]: a [`ModuleImporter`] wrapper that counts import
//!   attempts, to observe lazy loading from the outside.
//! - [`Widget`] and [`widget_modules`]: a small plugin object type and a
//!   module table exporting a few of them.
//! - [`sample_task_module`]: a task module whose declaration order differs
//!   from alphabetical order.
//! - [`tokens`]: `&[&str]` -> `Vec<String>` for argument lists.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use taskmill_core::{ModuleImporter, ModuleTable, Namespace, TaskModule};

/// A plugin object with identity, for `Arc::ptr_eq` checks.
#[derive(Debug, PartialEq, Eq)]
pub struct Widget {
    pub label: String,
}

impl Widget {
    pub fn new(label: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            label: label.into(),
        })
    }
}

/// Module table with `widgets.basic:{plain,fancy}` and `widgets.extra:shiny`.
pub fn widget_modules() -> ModuleTable<Arc<Widget>> {
    ModuleTable::new()
        .with(
            Namespace::new("widgets.basic")
                .with("plain", Widget::new("plain"))
                .with("fancy", Widget::new("fancy")),
        )
        .with(Namespace::new("widgets.extra").with("shiny", Widget::new("shiny")))
}

/// Wraps an importer and counts calls to `import`, per module and total.
pub struct CountingImporter<I> {
    inner: I,
    total: AtomicUsize,
    per_module: Mutex<HashMap<String, usize>>,
}

impl<I> CountingImporter<I> {
    pub fn new(inner: I) -> Arc<Self> {
        Arc::new(Self {
            inner,
            total: AtomicUsize::new(0),
            per_module: Mutex::new(HashMap::new()),
        })
    }

    /// Total number of import attempts, successful or not.
    pub fn imports(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    /// Number of import attempts for `module`.
    pub fn imports_of(&self, module: &str) -> usize {
        self.per_module
            .lock()
            .expect("import counter poisoned")
            .get(module)
            .copied()
            .unwrap_or(0)
    }
}

impl<T, I: ModuleImporter<T>> ModuleImporter<T> for CountingImporter<I> {
    fn import(&self, module: &str) -> Option<Arc<Namespace<T>>> {
        self.total.fetch_add(1, Ordering::SeqCst);
        *self
            .per_module
            .lock()
            .expect("import counter poisoned")
            .entry(module.to_owned())
            .or_default() += 1;
        self.inner.import(module)
    }
}

/// A task generator in tests: returns the names of the tasks it creates.
pub type Generator = fn() -> Vec<&'static str>;

fn zeta_tasks() -> Vec<&'static str> {
    vec!["zeta:compile"]
}

fn alpha_tasks() -> Vec<&'static str> {
    vec!["alpha:lint", "alpha:test"]
}

fn helper_tasks() -> Vec<&'static str> {
    vec![]
}

/// A module declaring `task_zeta` before `task_alpha`, plus members that
/// must not be discovered.
pub fn sample_task_module() -> TaskModule<Generator> {
    let config: toml::Table = toml::from_str("default_tasks = [\"zeta\"]\nverbosity = 2")
        .expect("sample module config is valid TOML");
    TaskModule::builder("tasks")
        .value("SETTINGS")
        .define("task_zeta", zeta_tasks as Generator)
        .define("make_helper", helper_tasks as Generator)
        .import("task_imported", "shared", helper_tasks as Generator)
        .define("task_alpha", alpha_tasks as Generator)
        .config(config)
        .build()
        .expect("sample module has unique names and positions")
}

/// Build an owned argument list.
pub fn tokens(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
