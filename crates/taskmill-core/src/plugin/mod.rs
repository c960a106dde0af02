//! String-addressed, lazily loaded extension points.
//!
//! A [`PluginRegistry`] maps names to either a concrete object or a
//! [`PluginEntry`] holding a `module:attribute` location. Entries are
//! imported through a [`ModuleImporter`] the first time they are resolved
//! and cached for the life of the registry.
//!
//! # Architecture
//!
//! ```text
//! config [plugins.<category>] ──add()──────────────┐
//! DeclarationSource ──add_from_external_declarations()──┤
//!                                                   v
//!                                  PluginRegistry { name -> PluginSlot }
//!                                                   |
//!                                     resolve(name) |
//!                                                   v
//!                 PluginSlot::Lazy ──ModuleImporter::import(module)──> Namespace
//!                                                   |
//!                                      get(attribute), cache
//!                                                   v
//!                                                   T
//! ```

pub mod declarations;
pub mod error;
pub mod location;
pub mod module;
pub mod registry;

pub use declarations::{Declaration, DeclarationError, DeclarationSource, ManifestDir, StaticDeclarations};
pub use error::PluginLoadError;
pub use location::{LocationParseError, PluginLocation};
pub use module::{ModuleImporter, ModuleTable, Namespace};
pub use registry::{PluginEntry, PluginListing, PluginRegistry, PluginSlot};
