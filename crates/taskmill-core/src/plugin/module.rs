//! Importable modules: named namespaces of plugin objects.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The attributes exported by one importable module.
#[derive(Clone)]
pub struct Namespace<T> {
    name: String,
    attributes: HashMap<String, T>,
}

impl<T> Namespace<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: HashMap::new(),
        }
    }

    /// Builder-style [`Namespace::insert`].
    pub fn with(mut self, attribute: impl Into<String>, value: T) -> Self {
        self.insert(attribute, value);
        self
    }

    pub fn insert(&mut self, attribute: impl Into<String>, value: T) -> Option<T> {
        self.attributes.insert(attribute.into(), value)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, attribute: &str) -> Option<&T> {
        self.attributes.get(attribute)
    }

    /// Attribute names, sorted.
    pub fn attributes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.attributes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<T> fmt::Debug for Namespace<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("name", &self.name)
            .field("attributes", &self.attributes())
            .finish()
    }
}

/// Locates modules by identifier.
///
/// This is the only side-effecting step of plugin resolution. The registry
/// calls it at most once per entry.
pub trait ModuleImporter<T> {
    /// Import `module`, or `None` if no such module exists.
    fn import(&self, module: &str) -> Option<Arc<Namespace<T>>>;
}

impl<T, I> ModuleImporter<T> for Arc<I>
where
    I: ModuleImporter<T> + ?Sized,
{
    fn import(&self, module: &str) -> Option<Arc<Namespace<T>>> {
        (**self).import(module)
    }
}

impl<T, I> ModuleImporter<T> for &I
where
    I: ModuleImporter<T> + ?Sized,
{
    fn import(&self, module: &str) -> Option<Arc<Namespace<T>>> {
        (**self).import(module)
    }
}

/// An in-process table of importable modules, populated at startup.
pub struct ModuleTable<T> {
    modules: HashMap<String, Arc<Namespace<T>>>,
}

impl<T> Default for ModuleTable<T> {
    fn default() -> Self {
        Self {
            modules: HashMap::new(),
        }
    }
}

impl<T> ModuleTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module under its namespace name, replacing any module
    /// already registered under that name.
    pub fn register(&mut self, namespace: Namespace<T>) -> Option<Arc<Namespace<T>>> {
        self.modules
            .insert(namespace.name().to_owned(), Arc::new(namespace))
    }

    /// Builder-style [`ModuleTable::register`].
    pub fn with(mut self, namespace: Namespace<T>) -> Self {
        self.register(namespace);
        self
    }

    pub fn contains(&self, module: &str) -> bool {
        self.modules.contains_key(module)
    }

    /// Module names, sorted.
    pub fn module_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.modules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<T> ModuleImporter<T> for ModuleTable<T> {
    fn import(&self, module: &str) -> Option<Arc<Namespace<T>>> {
        self.modules.get(module).cloned()
    }
}

impl<T> fmt::Debug for ModuleTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleTable")
            .field("modules", &self.module_names())
            .finish()
    }
}
