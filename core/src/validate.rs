//! Declarative source validation.
//!
//! [`ParserDefinitionError`] is the single hard error of the parsing core. It
//! is raised when a declarative source cannot be bound to a parser, either
//! because the source is structurally broken (checked here) or because its
//! arguments contradict a parser's column assumptions (checked by the parser
//! itself).
//!
//! # Examples
//!
//! ```
//! use hostfacts_core::*;
//!
//! let sources = vec![
//!     CommandSource::new("RpmPackages", "/bin/rpm", ["-qa"]),
//!     CommandSource::new("RpmPackages", "/bin/rpm", ["-qa", "--nodigest"]),
//! ];
//! let errors = validate_catalog(&sources);
//! assert_eq!(
//!     errors,
//!     vec![ParserDefinitionError::DuplicateSource("RpmPackages".to_string())]
//! );
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::CommandSource;

/// A declarative source is incompatible with the parser it is bound to.
///
/// Each variant names the violated rule; [`rule`](Self::rule) returns a
/// stable identifier for it and [`source_name`](Self::source_name) the
/// offending source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParserDefinitionError {
    /// Source name is empty or whitespace-only.
    #[error("source name cannot be empty")]
    EmptySourceName,
    /// Source has no command to run.
    #[error("source `{0}` has an empty command")]
    EmptyCommand(String),
    /// Two sources in one catalog share a name.
    #[error("duplicate source in catalog: {0}")]
    DuplicateSource(String),
    /// No registered parser handles the source's command.
    #[error("source `{source_name}`: no parser handles command `{command}`")]
    NoParser {
        source_name: String,
        command: String,
    },
    /// The source's command is not one the parser reads.
    #[error("source `{source_name}`: command `{command}` is not handled by the {parser} parser")]
    UnsupportedCommand {
        source_name: String,
        parser: String,
        command: String,
    },
    /// The source is restricted to platforms the parser does not cover.
    #[error("source `{source_name}`: the {parser} parser only reads {platform} output")]
    UnsupportedPlatform {
        source_name: String,
        parser: String,
        platform: String,
    },
    /// An output field is named more than once in a format specifier.
    #[error("source `{source_name}`: output field `{field}` is named more than once")]
    DuplicateField { source_name: String, field: String },
    /// The command-line output field is followed by other fields.
    #[error("source `{source_name}`: command-line field `{field}` must be the last output field")]
    CommandLineNotLast { source_name: String, field: String },
    /// A field every record needs is absent from the output fields.
    #[error("source `{source_name}`: output fields do not include `{field}`")]
    MissingField { source_name: String, field: String },
}

impl ParserDefinitionError {
    /// Stable identifier of the violated rule.
    pub fn rule(&self) -> &'static str {
        match self {
            Self::EmptySourceName => "empty_source_name",
            Self::EmptyCommand(_) => "empty_command",
            Self::DuplicateSource(_) => "duplicate_source",
            Self::NoParser { .. } => "no_parser",
            Self::UnsupportedCommand { .. } => "unsupported_command",
            Self::UnsupportedPlatform { .. } => "unsupported_platform",
            Self::DuplicateField { .. } => "duplicate_field",
            Self::CommandLineNotLast { .. } => "command_line_not_last",
            Self::MissingField { .. } => "missing_field",
        }
    }

    /// Name of the offending source, when the error concerns one source.
    pub fn source_name(&self) -> Option<&str> {
        match self {
            Self::EmptySourceName => None,
            Self::EmptyCommand(name) | Self::DuplicateSource(name) => Some(name),
            Self::NoParser { source_name, .. }
            | Self::UnsupportedCommand { source_name, .. }
            | Self::UnsupportedPlatform { source_name, .. }
            | Self::DuplicateField { source_name, .. }
            | Self::CommandLineNotLast { source_name, .. }
            | Self::MissingField { source_name, .. } => Some(source_name),
        }
    }
}

/// Validates the structure of a single source.
///
/// # Examples
///
/// ```
/// use hostfacts_core::*;
///
/// assert!(validate_source(&CommandSource::new("Dmi", "/usr/sbin/dmidecode", ["-q"])).is_empty());
///
/// let errors = validate_source(&CommandSource::new("Dmi", "  ", ["-q"]));
/// assert_eq!(errors, vec![ParserDefinitionError::EmptyCommand("Dmi".to_string())]);
/// ```
pub fn validate_source(source: &CommandSource) -> Vec<ParserDefinitionError> {
    let mut errors = Vec::new();

    if source.name.trim().is_empty() {
        errors.push(ParserDefinitionError::EmptySourceName);
        return errors;
    }

    if source.command.trim().is_empty() || source.basename().is_empty() {
        errors.push(ParserDefinitionError::EmptyCommand(source.name.clone()));
    }

    errors
}

/// Validates a catalog of sources: structure of each source plus unique
/// names across the catalog.
///
/// Every source is checked; errors are returned in catalog order.
pub fn validate_catalog(sources: &[CommandSource]) -> Vec<ParserDefinitionError> {
    let mut errors = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for source in sources {
        errors.extend(validate_source(source));
        let name = source.name.trim();
        if !name.is_empty() && !seen.insert(name) {
            errors.push(ParserDefinitionError::DuplicateSource(name.to_string()));
        }
    }

    errors
}
