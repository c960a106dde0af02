use std::fmt;
use std::str::FromStr;

/// A parsed `module:attribute` plugin address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PluginLocation {
    pub module: String,
    pub attribute: String,
}

impl fmt::Display for PluginLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.attribute)
    }
}

impl FromStr for PluginLocation {
    type Err = LocationParseError;

    /// Exactly one `:` separator, with non-empty parts on both sides.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(module), Some(attribute), None)
                if !module.trim().is_empty() && !attribute.trim().is_empty() =>
            {
                Ok(Self {
                    module: module.trim().to_owned(),
                    attribute: attribute.trim().to_owned(),
                })
            }
            _ => Err(LocationParseError(s.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`PluginLocation`] string.
#[derive(Debug, Clone)]
pub struct LocationParseError(pub String);

impl fmt::Display for LocationParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid plugin location: {:?}", self.0)
    }
}

impl std::error::Error for LocationParseError {}
