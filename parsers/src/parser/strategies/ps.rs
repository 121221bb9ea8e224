//! `ps` parser.
//!
//! Which columns appear, and in what order, depends on the invocation, so
//! rows are read positionally against the [`PsLayout`] derived from the
//! captured arguments.

use std::str::FromStr;
use std::str::Lines;

use hostfacts_core::{
    CommandOutput, CommandSource, HostContext, ParsedRecord, ParserDefinitionError, Process,
    command_basename,
};
use tracing::{trace, warn};

use super::with_output_anomalies;
use crate::parser::anomaly::AnomalyReporter;
use crate::parser::fields::{SplitPolicy, split_columns};
use crate::parser::layout::{PsField, PsLayout};
use crate::parser::{CommandParser, ParserKind, RecordStream, binding_errors, log_parse_start};

const REPORTER: AnomalyReporter = AnomalyReporter::new("ps");

/// Symptom reported when the invocation's columns cannot be read reliably.
pub const UNUSABLE_FORMAT: &str = "Unusable ps output format.";

/// Reads `ps` process listings.
#[derive(Debug, Default, Clone, Copy)]
pub struct PsParser;

impl CommandParser for PsParser {
    fn kind(&self) -> ParserKind {
        ParserKind::Ps
    }

    fn tools(&self) -> &'static [&'static str] {
        &["ps"]
    }

    fn parse<'a>(&self, output: &'a CommandOutput, context: &HostContext) -> RecordStream<'a> {
        log_parse_start(self.kind(), output, context);

        let layout = PsLayout::from_args(&output.args);
        if let Some(problem) = layout.problems().into_iter().next() {
            warn!(command = %output.command, args = ?output.args, "unusable ps layout: {problem}");
            let mut anomaly = REPORTER.parser_anomaly(UNUSABLE_FORMAT);
            anomaly.explanation = Some(problem.to_string());
            let anomaly = REPORTER.with_finding(anomaly, [output.args.join(" ").as_str()]);
            return with_output_anomalies(
                REPORTER,
                output,
                &[],
                std::iter::once(ParsedRecord::Anomaly(anomaly)),
            );
        }

        let processes = PsRows {
            lines: output.stdout.lines(),
            header_pending: layout.has_header(),
            layout,
            output,
        }
        .map(ParsedRecord::Process);

        with_output_anomalies(REPORTER, output, &[], processes)
    }

    /// Binding errors first; the layout is only checked for sources that
    /// actually run `ps` on a supported platform.
    fn source_errors(&self, source: &CommandSource) -> Vec<ParserDefinitionError> {
        let errors = binding_errors(self.kind(), self.tools(), self.platform(), source);
        if !errors.is_empty() {
            return errors;
        }
        PsLayout::from_args(&source.args).defects(&source.name)
    }
}

struct PsRows<'a> {
    lines: Lines<'a>,
    header_pending: bool,
    layout: PsLayout,
    output: &'a CommandOutput,
}

impl Iterator for PsRows<'_> {
    type Item = Process;

    fn next(&mut self) -> Option<Process> {
        for line in self.lines.by_ref() {
            if line.trim().is_empty() {
                continue;
            }
            if self.header_pending {
                self.header_pending = false;
                continue;
            }
            match process_from_row(line, &self.layout, self.output) {
                Some(process) => return Some(process),
                None => trace!(line, "skipping ps row without a numeric pid"),
            }
        }
        None
    }
}

fn process_from_row(line: &str, layout: &PsLayout, output: &CommandOutput) -> Option<Process> {
    let cols = split_columns(
        line,
        &SplitPolicy::Whitespace {
            max_columns: Some(layout.len()),
        },
    );

    let mut process = Process::default();
    let mut has_pid = false;

    for (idx, entry) in layout.fields().iter().enumerate() {
        let value = cols.get(idx);
        match &entry.field {
            PsField::Pid => {
                process.pid = value.parse().ok()?;
                has_pid = true;
            }
            PsField::Ppid => process.ppid = number(value),
            PsField::Comm => process.name = value.to_string(),
            PsField::User => process.username = Some(value.to_string()).filter(|v| !v.is_empty()),
            PsField::RealUid => process.real_uid = number(value),
            PsField::EffectiveUid => process.effective_uid = number(value),
            PsField::SavedUid => process.saved_uid = number(value),
            PsField::RealGid => process.real_gid = number(value),
            PsField::EffectiveGid => process.effective_gid = number(value),
            PsField::SavedGid => process.saved_gid = number(value),
            PsField::Tty => process.terminal = terminal(value),
            PsField::Stat => process.status = Some(value.to_string()).filter(|v| !v.is_empty()),
            PsField::Nice => process.nice = number(value),
            PsField::Threads => process.num_threads = number(value),
            PsField::CpuPercent => process.cpu_percent = number(value),
            PsField::MemPercent => process.memory_percent = number(value),
            PsField::Rss => process.rss_size = number(value),
            PsField::Vsz => process.vms_size = number(value),
            PsField::CpuTime => process.user_cpu_time = parse_cpu_time(value),
            PsField::CommandLine => process.cmdline = reconstruct_cmdline(value, output),
            PsField::Ignored(_) => {}
        }
    }

    if !has_pid {
        return None;
    }
    if process.name.is_empty() {
        if let Some(argv0) = process.cmdline.first() {
            process.name = command_name(argv0).to_string();
        }
    }
    Some(process)
}

/// Parses a numeric column; `-`, empty and garbage read as zero.
fn number<T: FromStr + Default>(value: &str) -> T {
    value.parse().unwrap_or_default()
}

fn terminal(value: &str) -> Option<String> {
    match value {
        "" | "?" | "-" => None,
        tty => Some(tty.to_string()),
    }
}

/// Process name derived from argv[0]: basename, with the brackets of kernel
/// threads removed.
fn command_name(argv0: &str) -> &str {
    let name = argv0
        .strip_prefix('[')
        .and_then(|inner| inner.strip_suffix(']'))
        .unwrap_or(argv0);
    if name.len() == argv0.len() {
        command_basename(name)
    } else {
        name
    }
}

/// Converts `[dd-]hh:mm:ss` or `mm:ss` (seconds may carry decimals) to
/// seconds. Unreadable values are zero.
///
/// # Examples
///
/// ```
/// use hostfacts_parsers::parser::strategies::ps::parse_cpu_time;
///
/// assert_eq!(parse_cpu_time("00:01:05"), 65.0);
/// assert_eq!(parse_cpu_time("2-00:00:01"), 172_801.0);
/// assert_eq!(parse_cpu_time("1:02.50"), 62.5);
/// assert_eq!(parse_cpu_time("-"), 0.0);
/// ```
pub fn parse_cpu_time(value: &str) -> f64 {
    let (days, clock) = match value.split_once('-') {
        Some((days, clock)) => match days.parse::<f64>() {
            Ok(days) => (days, clock),
            Err(_) => return 0.0,
        },
        None => (0.0, value),
    };

    let parts: Vec<&str> = clock.split(':').collect();
    if !(2..=3).contains(&parts.len()) {
        return 0.0;
    }
    parts
        .iter()
        .try_fold(0.0_f64, |total, part| {
            part.parse::<f64>().ok().map(|unit| total * 60.0 + unit)
        })
        .map_or(0.0, |seconds| days * 86_400.0 + seconds)
}

/// Splits the command-line column into argv.
///
/// `ps` prints argv joined by spaces, so arguments containing spaces cannot
/// be recovered in general. When the row is the captured invocation itself,
/// the exact arguments are known and used instead.
///
/// # Examples
///
/// ```
/// use hostfacts_core::CommandOutput;
/// use hostfacts_parsers::parser::strategies::ps::reconstruct_cmdline;
///
/// let output = CommandOutput::new("/bin/ps", ["-ef"], "");
/// assert_eq!(reconstruct_cmdline("ps -ef", &output), vec!["ps", "-ef"]);
/// assert_eq!(
///     reconstruct_cmdline("/usr/sbin/sshd -D", &output),
///     vec!["/usr/sbin/sshd", "-D"]
/// );
/// ```
pub fn reconstruct_cmdline(column: &str, output: &CommandOutput) -> Vec<String> {
    let column = column.trim();
    let (argv0, rest) = column
        .split_once(char::is_whitespace)
        .map_or((column, ""), |(argv0, rest)| (argv0, rest.trim()));

    if !argv0.is_empty()
        && command_basename(argv0) == output.basename()
        && rest == output.args.join(" ")
    {
        return std::iter::once(output.basename().to_string())
            .chain(output.args.iter().cloned())
            .collect();
    }
    column.split_whitespace().map(str::to_string).collect()
}
