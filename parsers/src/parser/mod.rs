//! Per-tool command output parsers.
//!
//! Every parser implements [`CommandParser`]: a uniform `parse` entry point
//! turning one [`CommandOutput`] into a lazy stream of [`ParsedRecord`]s, and
//! a `validate` entry point checking declarative sources before they are
//! bound to the parser.
//!
//! - **yum**: `yum list installed` package listing
//! - **rpm**: `rpm -qa` name-version-release tokens
//! - **dpkg**: `dpkg --list` status-prefixed table
//! - **dmidecode**: sectioned hardware inventory
//! - **ps**: process listing whose columns depend on the invocation
//!
//! Parsers own no state. Calling `parse` twice with the same input yields
//! the same records; the returned stream is consumed once.

pub mod anomaly;
pub mod fields;
pub mod layout;
pub mod strategies;

use hostfacts_core::{
    CommandOutput, CommandSource, HostContext, ParsedRecord, ParserDefinitionError,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Lazy, finite sequence of records produced by one `parse` call.
pub type RecordStream<'a> = Box<dyn Iterator<Item = ParsedRecord> + 'a>;

/// Platform every bundled parser reads output from.
pub const LINUX: &str = "Linux";

/// Identity of a registered parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum ParserKind {
    Yum,
    Rpm,
    Dpkg,
    Dmidecode,
    Ps,
}

impl ParserKind {
    /// All kinds, in registration order.
    pub const ALL: [ParserKind; 5] = [
        ParserKind::Yum,
        ParserKind::Rpm,
        ParserKind::Dpkg,
        ParserKind::Dmidecode,
        ParserKind::Ps,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Yum => "yum",
            Self::Rpm => "rpm",
            Self::Dpkg => "dpkg",
            Self::Dmidecode => "dmidecode",
            Self::Ps => "ps",
        }
    }
}

impl std::fmt::Display for ParserKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.label())
    }
}

/// A parser for one tool's output grammar.
pub trait CommandParser: Send + Sync {
    fn kind(&self) -> ParserKind;

    /// Command basenames whose output this parser reads.
    fn tools(&self) -> &'static [&'static str];

    /// Platform whose tool output this parser reads.
    fn platform(&self) -> &'static str {
        LINUX
    }

    /// Turns captured output into records.
    ///
    /// Never fails: content problems surface as
    /// [`ParsedRecord::Anomaly`] entries and unparsable lines are skipped.
    fn parse<'a>(&self, output: &'a CommandOutput, context: &HostContext) -> RecordStream<'a>;

    /// Returns every reason `source` cannot feed this parser.
    fn source_errors(&self, source: &CommandSource) -> Vec<ParserDefinitionError> {
        binding_errors(self.kind(), self.tools(), self.platform(), source)
    }

    /// Returns the errors of every source, in source order.
    fn definition_errors(&self, sources: &[CommandSource]) -> Vec<ParserDefinitionError> {
        sources
            .iter()
            .flat_map(|source| self.source_errors(source))
            .collect()
    }

    /// Checks that every source can feed this parser.
    ///
    /// All sources are examined and each failure is logged; the first one is
    /// returned. An empty slice passes.
    fn validate(&self, sources: &[CommandSource]) -> Result<(), ParserDefinitionError> {
        let errors = self.definition_errors(sources);
        for err in &errors {
            warn!(parser = %self.kind(), rule = err.rule(), "{err}");
        }
        match errors.into_iter().next() {
            Some(err) => Err(err),
            None => {
                debug!(parser = %self.kind(), sources = sources.len(), "sources validated");
                Ok(())
            }
        }
    }
}

/// Checks that a source runs one of `tools` on a platform the parser reads.
pub(crate) fn binding_errors(
    kind: ParserKind,
    tools: &[&str],
    platform: &str,
    source: &CommandSource,
) -> Vec<ParserDefinitionError> {
    let mut errors = Vec::new();

    if !tools.contains(&source.basename()) {
        errors.push(ParserDefinitionError::UnsupportedCommand {
            source_name: source.name.clone(),
            parser: kind.to_string(),
            command: source.command.clone(),
        });
    }
    if !source.supports_os(platform) {
        errors.push(ParserDefinitionError::UnsupportedPlatform {
            source_name: source.name.clone(),
            parser: kind.to_string(),
            platform: platform.to_string(),
        });
    }

    errors
}

pub(crate) fn log_parse_start(kind: ParserKind, output: &CommandOutput, context: &HostContext) {
    debug!(
        parser = %kind,
        host = context.host_label(),
        command = %output.command,
        args = ?output.args,
        exit_status = output.exit_status,
        duration_seconds = output.duration_seconds,
        stdout_bytes = output.stdout.len(),
        stderr_bytes = output.stderr.len(),
        "parsing command output"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_errors_accept_matching_source() {
        let source = CommandSource::new("RpmList", "/bin/rpm", ["-qa"]).with_supported_os(["Linux"]);
        assert!(binding_errors(ParserKind::Rpm, &["rpm"], LINUX, &source).is_empty());
    }

    #[test]
    fn test_binding_errors_report_command_and_platform() {
        let source =
            CommandSource::new("WinList", "C:/wmic", ["product"]).with_supported_os(["Windows"]);
        let errors = binding_errors(ParserKind::Rpm, &["rpm"], LINUX, &source);

        let rules: Vec<_> = errors.iter().map(ParserDefinitionError::rule).collect();
        assert_eq!(rules, vec!["unsupported_command", "unsupported_platform"]);
    }

    #[test]
    fn test_kind_labels_are_lowercase_tool_names() {
        let labels: Vec<_> = ParserKind::ALL.iter().map(|kind| kind.label()).collect();
        assert_eq!(labels, vec!["yum", "rpm", "dpkg", "dmidecode", "ps"]);
    }
}
