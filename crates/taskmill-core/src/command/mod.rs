//! Typed command-line options per sub-command.
//!
//! A [`CommandSpec`] pairs an ordered list of [`OptionSpec`]s with a dispatch
//! target. Parsing merges four override layers left-to-right:
//!
//! ```text
//! Default ──> Environment ──> Context ──> CommandLine
//! ```
//!
//! so the resulting [`Params`] always holds a value for every option.

pub mod error;
pub mod option;
pub mod params;
pub mod parser;
pub mod spec;

pub use error::{ArgumentError, CommandError, SpecError, TypeCoercionError};
pub use option::{Choice, OptionSpec, OptionType};
pub use params::{ParamValue, Params};
pub use parser::{CommandParser, Layer, LayerSource};
pub use spec::CommandSpec;
