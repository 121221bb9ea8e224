//! Lookup of parsers by kind or by command.

use hostfacts_core::{
    CommandOutput, CommandSource, HostContext, ParserDefinitionError, command_basename,
};
use tracing::{debug, warn};

use crate::parser::strategies::{DmidecodeParser, DpkgParser, PsParser, RpmParser, YumParser};
use crate::parser::{CommandParser, ParserKind, RecordStream};

/// Set of parsers available to a caller.
///
/// Built explicitly and passed around; there is no process-wide registry.
///
/// # Examples
///
/// ```
/// use hostfacts_core::{CommandOutput, HostContext};
/// use hostfacts_parsers::{ParserKind, ParserRegistry};
///
/// let registry = ParserRegistry::with_defaults();
/// assert_eq!(registry.for_command("/usr/bin/dpkg-query").map(|p| p.kind()), Some(ParserKind::Dpkg));
///
/// let output = CommandOutput::new("/bin/rpm", ["-qa"], "less-436-9.el5\n");
/// let records: Vec<_> = registry.parse(ParserKind::Rpm, &output, &HostContext::default()).collect();
/// assert_eq!(records.len(), 1);
/// ```
pub struct ParserRegistry {
    parsers: Vec<Box<dyn CommandParser>>,
}

impl ParserRegistry {
    /// Creates a registry with no parsers.
    pub fn empty() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    /// Creates a registry holding every bundled parser.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(YumParser));
        registry.register(Box::new(RpmParser));
        registry.register(Box::new(DpkgParser));
        registry.register(Box::new(DmidecodeParser));
        registry.register(Box::new(PsParser));
        registry
    }

    /// Adds a parser, replacing any registered parser of the same kind.
    pub fn register(&mut self, parser: Box<dyn CommandParser>) {
        let kind = parser.kind();
        self.parsers.retain(|existing| existing.kind() != kind);
        self.parsers.push(parser);
    }

    pub fn get(&self, kind: ParserKind) -> Option<&dyn CommandParser> {
        self.parsers
            .iter()
            .find(|parser| parser.kind() == kind)
            .map(|parser| &**parser)
    }

    /// Finds the parser reading output of `command`, matched by basename.
    pub fn for_command(&self, command: &str) -> Option<&dyn CommandParser> {
        let basename = command_basename(command);
        self.parsers
            .iter()
            .find(|parser| parser.tools().contains(&basename))
            .map(|parser| &**parser)
    }

    /// Registered kinds, in registration order.
    pub fn kinds(&self) -> Vec<ParserKind> {
        self.parsers.iter().map(|parser| parser.kind()).collect()
    }

    /// Parses with the parser of `kind`; an unregistered kind yields nothing.
    pub fn parse<'a>(
        &self,
        kind: ParserKind,
        output: &'a CommandOutput,
        context: &HostContext,
    ) -> RecordStream<'a> {
        match self.get(kind) {
            Some(parser) => parser.parse(output, context),
            None => {
                warn!(parser = %kind, "no parser registered");
                Box::new(std::iter::empty())
            }
        }
    }

    /// Returns every problem in a catalog of sources.
    ///
    /// Structural checks run first. Each source is then bound to the parser
    /// handling its command and checked by that parser; sources no parser
    /// handles are reported as [`ParserDefinitionError::NoParser`].
    pub fn catalog_errors(&self, sources: &[CommandSource]) -> Vec<ParserDefinitionError> {
        let mut errors = hostfacts_core::validate_catalog(sources);

        for source in sources {
            match self.for_command(&source.command) {
                Some(parser) => errors.extend(parser.source_errors(source)),
                None if source.command.trim().is_empty() => {}
                None => errors.push(ParserDefinitionError::NoParser {
                    source_name: source.name.clone(),
                    command: source.command.clone(),
                }),
            }
        }
        errors
    }

    /// Checks a catalog of sources; every problem is logged and the first
    /// one is returned.
    pub fn validate_catalog(&self, sources: &[CommandSource]) -> Result<(), ParserDefinitionError> {
        let errors = self.catalog_errors(sources);
        for err in &errors {
            warn!(source = err.source_name().unwrap_or("-"), rule = err.rule(), "{err}");
        }
        match errors.into_iter().next() {
            Some(err) => Err(err),
            None => {
                debug!(sources = sources.len(), "catalog validated");
                Ok(())
            }
        }
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_register_every_kind() {
        assert_eq!(ParserRegistry::with_defaults().kinds(), ParserKind::ALL.to_vec());
    }

    #[test]
    fn test_for_command_matches_basename() {
        let registry = ParserRegistry::with_defaults();
        let kind = |command: &str| registry.for_command(command).map(|parser| parser.kind());

        assert_eq!(kind("/usr/bin/dnf"), Some(ParserKind::Yum));
        assert_eq!(kind("ps"), Some(ParserKind::Ps));
        assert_eq!(kind("/usr/sbin/dmidecode"), Some(ParserKind::Dmidecode));
        assert_eq!(kind("/usr/bin/lsof"), None);
    }

    #[test]
    fn test_register_replaces_same_kind() {
        let mut registry = ParserRegistry::with_defaults();
        registry.register(Box::new(RpmParser));
        assert_eq!(registry.kinds().len(), ParserKind::ALL.len());
        assert_eq!(registry.kinds().last(), Some(&ParserKind::Rpm));
    }

    #[test]
    fn test_empty_registry_parses_nothing() {
        let output = CommandOutput::new("/bin/rpm", ["-qa"], "less-436-9.el5\n");
        let registry = ParserRegistry::empty();
        assert_eq!(
            registry
                .parse(ParserKind::Rpm, &output, &HostContext::default())
                .count(),
            0
        );
    }

    #[test]
    fn test_catalog_reports_unhandled_commands() {
        let registry = ParserRegistry::with_defaults();
        let sources = vec![
            CommandSource::new("Packages", "/bin/rpm", ["-qa"]),
            CommandSource::new("OpenFiles", "/usr/bin/lsof", ["-n"]),
        ];

        let errors = registry.catalog_errors(&sources);
        assert_eq!(
            errors,
            vec![ParserDefinitionError::NoParser {
                source_name: "OpenFiles".to_string(),
                command: "/usr/bin/lsof".to_string(),
            }]
        );
        assert!(registry.validate_catalog(&sources).is_err());
    }

    #[test]
    fn test_empty_catalog_is_valid() {
        assert!(ParserRegistry::with_defaults().validate_catalog(&[]).is_ok());
    }
}
