//! Parsers turning captured command output into typed host facts.
//!
//! Each bundled parser reads one tool's output grammar and emits
//! [`ParsedRecord`]s: software packages (yum, rpm, dpkg), a hardware summary
//! (dmidecode) or processes (ps), with [`Anomaly`] records for problems the
//! parser recognized along the way. Parsers never fail on bad content; the
//! only hard error is a [`ParserDefinitionError`] raised when a declarative
//! source cannot be bound to a parser.
//!
//! # Main entry points
//!
//! - [`parse_command_output`]: pick the parser by command basename, parse,
//!   and summarize.
//! - [`ParserRegistry`]: lookup by [`ParserKind`] or command, catalog
//!   validation.
//! - [`parser::CommandParser`]: the trait every parser implements.
//!
//! # Example
//!
//! ```
//! use hostfacts_core::{CommandOutput, HostContext};
//! use hostfacts_parsers::parse_command_output;
//!
//! let stdout = "\
//! Installed Packages
//! ConsoleKit.x86_64          0.4.1-3.el6          @base
//! ConsoleKit-libs.x86_64     0.4.1-3.el6          @base
//! ";
//! let output = CommandOutput::new("/usr/bin/yum", ["list", "installed", "-q"], stdout);
//!
//! let run = parse_command_output(&output, &HostContext::default()).unwrap();
//! assert_eq!(run.report.packages, 2);
//! let first = run.records[0].as_package().unwrap();
//! assert_eq!(first.name, "ConsoleKit");
//! assert_eq!(first.publisher.as_deref(), Some("@base"));
//! ```
//!
//! [`Anomaly`]: hostfacts_core::Anomaly
//! [`ParserDefinitionError`]: hostfacts_core::ParserDefinitionError

pub mod output;
pub mod parser;
pub mod registry;
pub mod report;

pub use output::{OutputFormat, format_records, format_report, format_reports};
pub use parser::{CommandParser, ParserKind, RecordStream};
pub use registry::ParserRegistry;
pub use report::ParseReport;

use hostfacts_core::{CommandOutput, HostContext, ParsedRecord};

/// Records of one parse together with their summary.
#[derive(Debug, Clone)]
pub struct ParseRun {
    pub records: Vec<ParsedRecord>,
    pub report: ParseReport,
}

/// Parses `output` with the parser for `kind` and summarizes the result.
pub fn parse_with_report(
    registry: &ParserRegistry,
    kind: ParserKind,
    output: &CommandOutput,
    context: &HostContext,
) -> ParseRun {
    let records: Vec<ParsedRecord> = registry.parse(kind, output, context).collect();
    let report = ParseReport::from_records(kind, output, context, &records);
    ParseRun { records, report }
}

/// Parses `output` with the bundled parser matching its command.
///
/// Returns `None` when no bundled parser reads output of that command.
pub fn parse_command_output(output: &CommandOutput, context: &HostContext) -> Option<ParseRun> {
    let registry = ParserRegistry::with_defaults();
    let kind = registry.for_command(&output.command)?.kind();
    Some(parse_with_report(&registry, kind, output, context))
}
