//! Plugin registry: a named collection of concrete and lazily imported
//! plugin objects.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use tracing::Span;

use super::declarations::{DeclarationError, DeclarationSource};
use super::error::PluginLoadError;
use super::location::PluginLocation;
use super::module::ModuleImporter;

/// A lazy reference to an object addressed by `module:attribute`.
///
/// The first [`PluginEntry::load`] imports the module and caches the
/// outcome; every later call returns the cached outcome.
#[derive(Clone)]
pub struct PluginEntry<T> {
    category: String,
    name: String,
    location: String,
    loaded: Option<Result<T, PluginLoadError>>,
}

impl<T: Clone> PluginEntry<T> {
    pub fn new(
        category: impl Into<String>,
        name: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
            location: location.into(),
            loaded: None,
        }
    }

    /// Return the category the entry was registered under.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Return the entry's registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the `module:attr` reference to load.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Whether a load has succeeded.
    pub fn is_loaded(&self) -> bool {
        matches!(self.loaded, Some(Ok(_)))
    }

    /// Resolve the entry, importing its module on the first call only.
    pub fn load(&mut self, importer: &dyn ModuleImporter<T>) -> Result<T, PluginLoadError> {
        if let Some(outcome) = &self.loaded {
            return outcome.clone();
        }
        let outcome = self.import(importer);
        match &outcome {
            Ok(_) => tracing::debug!(
                category = %self.category,
                name = %self.name,
                location = %self.location,
                "loaded plugin"
            ),
            Err(e) => tracing::warn!(error = %e, "failed to load plugin"),
        }
        self.loaded = Some(outcome.clone());
        outcome
    }

    fn import(&self, importer: &dyn ModuleImporter<T>) -> Result<T, PluginLoadError> {
        let location: PluginLocation =
            self.location
                .parse()
                .map_err(|_| PluginLoadError::MalformedLocation {
                    category: self.category.clone(),
                    name: self.name.clone(),
                    location: self.location.clone(),
                })?;

        let namespace =
            importer
                .import(&location.module)
                .ok_or_else(|| PluginLoadError::ModuleNotFound {
                    category: self.category.clone(),
                    name: self.name.clone(),
                    module: location.module.clone(),
                })?;

        namespace
            .get(&location.attribute)
            .cloned()
            .ok_or_else(|| PluginLoadError::AttributeNotFound {
                category: self.category.clone(),
                name: self.name.clone(),
                module: location.module.clone(),
                attribute: location.attribute.clone(),
            })
    }
}

impl<T> fmt::Debug for PluginEntry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginEntry")
            .field("category", &self.category)
            .field("name", &self.name)
            .field("location", &self.location)
            .field("loaded", &matches!(self.loaded, Some(Ok(_))))
            .finish()
    }
}

/// A registry value: either a concrete object or a lazy entry.
#[derive(Clone)]
pub enum PluginSlot<T> {
    Resolved(T),
    Lazy(PluginEntry<T>),
}

impl<T: Clone> PluginSlot<T> {
    /// Yield the concrete object, loading a lazy entry if needed.
    pub fn resolve(&mut self, importer: &dyn ModuleImporter<T>) -> Result<T, PluginLoadError> {
        match self {
            Self::Resolved(value) => Ok(value.clone()),
            Self::Lazy(entry) => entry.load(importer),
        }
    }

    pub fn is_resolved(&self) -> bool {
        match self {
            Self::Resolved(_) => true,
            Self::Lazy(entry) => entry.is_loaded(),
        }
    }
}

/// Listing information for one registry entry, without resolving it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginListing {
    pub name: String,
    /// `None` for concrete objects added with [`PluginRegistry::add_resolved`].
    pub category: Option<String>,
    pub location: Option<String>,
    pub resolved: bool,
}

/// A collection of plugins keyed by name, in insertion order.
///
/// Re-registering a name replaces the previous value in place (last write
/// wins, no error).
///
/// # Example
///
/// ```
/// use taskmill_core::{ModuleTable, Namespace, PluginRegistry};
///
/// let modules = ModuleTable::new().with(Namespace::new("reporters").with("json", "JSON"));
/// let mut registry = PluginRegistry::new(modules);
/// registry.add("reporter", [("json", "reporters:json")]);
/// assert_eq!(registry.resolve("json").unwrap(), "JSON");
/// ```
pub struct PluginRegistry<T> {
    importer: Box<dyn ModuleImporter<T>>,
    slots: Vec<(String, PluginSlot<T>)>,
    index: HashMap<String, usize>,
    span: Span,
}

impl<T: Clone> PluginRegistry<T> {
    /// Create an empty registry that imports modules through `importer`.
    pub fn new(importer: impl ModuleImporter<T> + 'static) -> Self {
        Self {
            importer: Box::new(importer),
            slots: Vec::new(),
            index: HashMap::new(),
            span: Span::none(),
        }
    }

    /// Emit registry diagnostics inside `span`.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Insert a lazy entry for every `(name, location)` pair.
    pub fn add<I, N, L>(&mut self, category: &str, plugins: I)
    where
        I: IntoIterator<Item = (N, L)>,
        N: Into<String>,
        L: Into<String>,
    {
        for (name, location) in plugins {
            let name = name.into();
            let entry = PluginEntry::new(category, name.clone(), location);
            self.insert(name, PluginSlot::Lazy(entry));
        }
    }

    /// Insert every extension `source` declares for `category`.
    ///
    /// Returns the number of entries inserted; zero is not an error.
    pub fn add_from_external_declarations(
        &mut self,
        category: &str,
        source: &dyn DeclarationSource,
    ) -> Result<usize, DeclarationError> {
        let declarations = source.declarations(category)?;
        let count = declarations.len();
        self.add(
            category,
            declarations.into_iter().map(|d| (d.name, d.location)),
        );
        let _guard = self.span.enter();
        tracing::debug!(category, count, "added externally declared plugins");
        Ok(count)
    }

    /// Insert a concrete object.
    pub fn add_resolved(&mut self, name: impl Into<String>, value: T) {
        self.insert(name.into(), PluginSlot::Resolved(value));
    }

    fn insert(&mut self, name: String, slot: PluginSlot<T>) {
        match self.index.get(&name) {
            Some(&i) => {
                let _guard = self.span.enter();
                if let (PluginSlot::Lazy(old), PluginSlot::Lazy(new)) = (&self.slots[i].1, &slot) {
                    tracing::debug!(
                        name = %name,
                        old = old.location(),
                        new = new.location(),
                        "replacing plugin registration"
                    );
                } else {
                    tracing::debug!(name = %name, "replacing plugin registration");
                }
                self.slots[i].1 = slot;
            }
            None => {
                self.index.insert(name.clone(), self.slots.len());
                self.slots.push((name, slot));
            }
        }
    }

    /// Resolve `name` to a concrete object.
    pub fn resolve(&mut self, name: &str) -> Result<T, PluginLoadError> {
        let _guard = self.span.enter();
        let &i = self
            .index
            .get(name)
            .ok_or_else(|| PluginLoadError::NotRegistered {
                name: name.to_owned(),
            })?;
        self.slots[i].1.resolve(self.importer.as_ref())
    }

    /// Resolve every entry and return `(name, object)` pairs in insertion
    /// order. Fails on the first entry that cannot be resolved.
    pub fn to_map(&mut self) -> Result<Vec<(String, T)>, PluginLoadError> {
        let _guard = self.span.enter();
        let importer = self.importer.as_ref();
        self.slots
            .iter_mut()
            .map(|(name, slot)| Ok((name.clone(), slot.resolve(importer)?)))
            .collect()
    }

    /// Describe every entry without resolving anything.
    pub fn describe(&self) -> Vec<PluginListing> {
        self.slots
            .iter()
            .map(|(name, slot)| match slot {
                PluginSlot::Resolved(_) => PluginListing {
                    name: name.clone(),
                    category: None,
                    location: None,
                    resolved: true,
                },
                PluginSlot::Lazy(entry) => PluginListing {
                    name: name.clone(),
                    category: Some(entry.category().to_owned()),
                    location: Some(entry.location().to_owned()),
                    resolved: entry.is_loaded(),
                },
            })
            .collect()
    }

    /// Return the slot registered as `name`.
    pub fn get(&self, name: &str) -> Option<&PluginSlot<T>> {
        self.index.get(name).map(|&i| &self.slots[i].1)
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Registered names in insertion order.
    pub fn names(&self) -> Vec<&str> {
        self.slots.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Return the number of registered names.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl<T> fmt::Debug for PluginRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field(
                "plugins",
                &self.slots.iter().map(|(n, _)| n).collect::<Vec<_>>(),
            )
            .finish()
    }
}
