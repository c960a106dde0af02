use thiserror::Error;

/// Failure to resolve a plugin to a concrete object.
///
/// A failed resolution affects only the entry being resolved; every other
/// entry of the registry stays independently resolvable. The failure is
/// remembered: resolving the same entry again returns the same error
/// without another import attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PluginLoadError {
    #[error("no plugin named {name:?} is registered")]
    NotRegistered { name: String },

    #[error(
        "{category} plugin {name:?}: malformed location {location:?} (expected <module>:<attribute>)"
    )]
    MalformedLocation {
        category: String,
        name: String,
        location: String,
    },

    #[error("{category} plugin {name:?}: module {module:?} not found")]
    ModuleNotFound {
        category: String,
        name: String,
        module: String,
    },

    #[error("{category} plugin {name:?}: module {module:?} has no attribute {attribute:?}")]
    AttributeNotFound {
        category: String,
        name: String,
        module: String,
        attribute: String,
    },
}
