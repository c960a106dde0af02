//! Loaded modules with explicit declaration order.

use std::collections::{HashMap, HashSet};

use super::DiscoveryError;

/// Where a module member comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Defined by the module itself.
    Defined,
    /// Re-exported from another module.
    Imported { from: String },
}

/// What a module member is.
#[derive(Debug, Clone)]
pub enum MemberKind<F> {
    Callable(F),
    /// Anything that cannot be called (constants, configuration, ...).
    Value,
}

/// A top-level member of a loaded module.
#[derive(Debug, Clone)]
pub struct ModuleMember<F> {
    pub name: String,
    /// Declaration position; distinct across a module's members.
    pub position: u32,
    pub origin: Origin,
    pub kind: MemberKind<F>,
}

impl<F> ModuleMember<F> {
    pub fn callable(&self) -> Option<&F> {
        match &self.kind {
            MemberKind::Callable(f) => Some(f),
            MemberKind::Value => None,
        }
    }
}

/// An already-loaded module as seen by task discovery.
///
/// Loading (and any failure to load) belongs to the implementor; discovery
/// only reads what is exposed here.
pub trait LoadedModule<F> {
    fn name(&self) -> &str;

    fn members(&self) -> &[ModuleMember<F>];

    /// Module-level configuration, if the module declares any.
    fn config(&self) -> Option<&toml::Table> {
        None
    }
}

/// A module populated through explicit registration.
///
/// Members registered with [`TaskModuleBuilder::define`] receive increasing
/// positions in registration order, which is the order discovery reports.
#[derive(Debug, Clone)]
pub struct TaskModule<F> {
    name: String,
    members: Vec<ModuleMember<F>>,
    config: Option<toml::Table>,
}

impl<F> TaskModule<F> {
    pub fn builder(name: impl Into<String>) -> TaskModuleBuilder<F> {
        TaskModuleBuilder {
            name: name.into(),
            members: Vec::new(),
            next_position: 0,
            config: None,
        }
    }
}

impl<F> LoadedModule<F> for TaskModule<F> {
    fn name(&self) -> &str {
        &self.name
    }

    fn members(&self) -> &[ModuleMember<F>] {
        &self.members
    }

    fn config(&self) -> Option<&toml::Table> {
        self.config.as_ref()
    }
}

/// Builder for [`TaskModule`].
pub struct TaskModuleBuilder<F> {
    name: String,
    members: Vec<ModuleMember<F>>,
    next_position: u32,
    config: Option<toml::Table>,
}

impl<F> TaskModuleBuilder<F> {
    /// Define a callable at the next position.
    pub fn define(self, name: impl Into<String>, callable: F) -> Self {
        let position = self.next_position;
        self.push(name.into(), position, Origin::Defined, MemberKind::Callable(callable))
    }

    /// Define a callable at an explicit position (e.g. a source line).
    pub fn define_at(self, name: impl Into<String>, position: u32, callable: F) -> Self {
        self.push(name.into(), position, Origin::Defined, MemberKind::Callable(callable))
    }

    /// Re-export a callable defined by module `from`.
    pub fn import(self, name: impl Into<String>, from: impl Into<String>, callable: F) -> Self {
        let position = self.next_position;
        let origin = Origin::Imported { from: from.into() };
        self.push(name.into(), position, origin, MemberKind::Callable(callable))
    }

    /// Define a non-callable member.
    pub fn value(self, name: impl Into<String>) -> Self {
        let position = self.next_position;
        self.push(name.into(), position, Origin::Defined, MemberKind::Value)
    }

    /// Attach module-level configuration.
    pub fn config(mut self, table: toml::Table) -> Self {
        self.config = Some(table);
        self
    }

    fn push(mut self, name: String, position: u32, origin: Origin, kind: MemberKind<F>) -> Self {
        self.next_position = self.next_position.max(position.saturating_add(1));
        self.members.push(ModuleMember {
            name,
            position,
            origin,
            kind,
        });
        self
    }

    /// Finish the module, rejecting duplicate names and positions.
    pub fn build(self) -> Result<TaskModule<F>, DiscoveryError> {
        let mut names = HashSet::new();
        let mut positions: HashMap<u32, &str> = HashMap::new();
        for member in &self.members {
            if !names.insert(member.name.as_str()) {
                return Err(DiscoveryError::DuplicateMember {
                    module: self.name.clone(),
                    name: member.name.clone(),
                });
            }
            if let Some(first) = positions.insert(member.position, &member.name) {
                return Err(DiscoveryError::DuplicatePosition {
                    module: self.name.clone(),
                    position: member.position,
                    first: first.to_owned(),
                    second: member.name.clone(),
                });
            }
        }
        Ok(TaskModule {
            name: self.name,
            members: self.members,
            config: self.config,
        })
    }
}
