//! `dpkg --list` parser.
//!
//! The table is preceded by a legend and a `+++-====-...` rule whose
//! segments give the width of each column. Rows start with a three-letter
//! status: desired action, current state, error flag.

use std::str::Lines;
use std::sync::LazyLock;

use hostfacts_core::{CommandOutput, HostContext, ParsedRecord, SoftwarePackage};
use tracing::trace;

use super::with_output_anomalies;
use crate::parser::anomaly::{AnomalyReporter, ErrorSignature};
use crate::parser::fields::{SplitPolicy, fits_fixed_width, split_columns};
use crate::parser::{CommandParser, ParserKind, RecordStream, log_parse_start};

const REPORTER: AnomalyReporter = AnomalyReporter::new("dpkg");

static STATUS_DB_SIGNATURES: LazyLock<Vec<ErrorSignature>> = LazyLock::new(|| {
    const SYMPTOM: &str = "Broken dpkg status database.";
    vec![
        ErrorSignature::new(
            r"parsing file '/var/lib/dpkg/(status|available)'",
            SYMPTOM,
            "dpkg could not parse its package status file",
        ),
        ErrorSignature::new(
            r"dpkg: error: .*(database|status)",
            SYMPTOM,
            "dpkg reported an error reading its package database",
        ),
        ErrorSignature::new(
            r"dpkg was interrupted",
            "Interrupted dpkg transaction.",
            "a previous dpkg run did not finish; package states may be stale",
        ),
    ]
});

/// Reads `dpkg --list` and `dpkg-query -l` tables.
#[derive(Debug, Default, Clone, Copy)]
pub struct DpkgParser;

impl CommandParser for DpkgParser {
    fn kind(&self) -> ParserKind {
        ParserKind::Dpkg
    }

    fn tools(&self) -> &'static [&'static str] {
        &["dpkg", "dpkg-query"]
    }

    fn parse<'a>(&self, output: &'a CommandOutput, context: &HostContext) -> RecordStream<'a> {
        log_parse_start(self.kind(), output, context);

        let packages = DpkgRows {
            lines: output.stdout.lines(),
            table: None,
        }
        .map(ParsedRecord::Package);

        with_output_anomalies(REPORTER, output, &STATUS_DB_SIGNATURES, packages)
    }
}

/// Column geometry read from the `+++-===` rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableHeader {
    /// Widths of every column but the last, which runs to end of line.
    widths: Vec<usize>,
    columns: usize,
}

impl TableHeader {
    /// Reads the rule line, or `None` if `line` is not one.
    ///
    /// # Examples
    ///
    /// ```
    /// use hostfacts_parsers::parser::strategies::dpkg::TableHeader;
    ///
    /// let header = TableHeader::from_rule("+++-======-=====-=====-=======").unwrap();
    /// assert_eq!(header.columns(), 5);
    /// assert!(header.has_architecture());
    /// assert!(TableHeader::from_rule("||/ Name  Version").is_none());
    /// ```
    pub fn from_rule(line: &str) -> Option<Self> {
        let line = line.trim_end();
        if !line.starts_with("+++-") {
            return None;
        }
        let segments: Vec<usize> = line.split('-').map(str::len).collect();
        if segments.len() < 4 || segments.iter().any(|width| *width == 0) {
            return None;
        }
        Some(Self {
            widths: segments[..segments.len() - 1].to_vec(),
            columns: segments.len(),
        })
    }

    /// Number of columns including status.
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// `true` for dpkg versions that print an architecture column.
    pub fn has_architecture(&self) -> bool {
        self.columns >= 5
    }

    /// Maps a row to a package, slicing fixed-width when the row still lines
    /// up with the rule and splitting on whitespace otherwise.
    pub fn package_from_row(&self, line: &str) -> Option<SoftwarePackage> {
        let cols = if fits_fixed_width(line, &self.widths) {
            split_columns(line, &SplitPolicy::FixedWidth(&self.widths))
        } else {
            trace!(line, "dpkg row overflows header widths");
            split_columns(
                line,
                &SplitPolicy::Whitespace {
                    max_columns: Some(self.columns),
                },
            )
        };

        let name = cols.non_empty(1)?;
        let version = cols.non_empty(2)?;
        let mut package = SoftwarePackage::installed(name, version);

        let description = if self.has_architecture() {
            if let Some(architecture) = cols.non_empty(3) {
                package = package.with_architecture(architecture);
            }
            cols.non_empty(4)
        } else {
            cols.non_empty(3)
        };
        if let Some(description) = description {
            package = package.with_description(description);
        }
        Some(package)
    }
}

/// `true` when the status says the package is installed and carries no
/// error flag (`ii `, `hi `), as opposed to removed (`rc`) or broken (`iHR`).
pub fn is_installed(line: &str) -> bool {
    let status = line.as_bytes();
    status.get(1) == Some(&b'i') && status.get(2).is_none_or(|flag| flag.is_ascii_whitespace())
}

struct DpkgRows<'a> {
    lines: Lines<'a>,
    table: Option<TableHeader>,
}

impl Iterator for DpkgRows<'_> {
    type Item = SoftwarePackage;

    fn next(&mut self) -> Option<SoftwarePackage> {
        for line in self.lines.by_ref() {
            let Some(table) = &self.table else {
                self.table = TableHeader::from_rule(line);
                continue;
            };
            if !is_installed(line) {
                continue;
            }
            if let Some(package) = table.package_from_row(line) {
                return Some(package);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEGACY: &str = "\
Desired=Unknown/Install/Remove/Purge/Hold
| Status=Not/Inst/Conf-files/Unpacked/halF-conf/Half-inst/trig-aWait/Trig-pend
|/ Err?=(none)/Reinst-required (Status,Err: uppercase=bad)
||/ Name                Version             Description
+++-===================-===================-=====================================
ii  acpi-support-base   0.109-11            scripts for handling base ACPI events
rc  aptitude            0.6.3-3.2           terminal-based package manager
ii  libstdc++6-4.4-dev-extra 4.4.5-8        GNU Standard C++ Library v3 (development files)
iHR broken-pkg          1.0                 half installed
hi  held-pkg            2.0                 held but installed
";

    fn packages(stdout: &str) -> Vec<SoftwarePackage> {
        let output = CommandOutput::new("/usr/bin/dpkg", ["--list"], stdout);
        DpkgParser
            .parse(&output, &HostContext::default())
            .filter_map(|record| record.as_package().cloned())
            .collect()
    }

    #[test]
    fn test_only_installed_rows_become_packages() {
        let names: Vec<_> = packages(LEGACY).into_iter().map(|pkg| pkg.name).collect();
        assert_eq!(
            names,
            vec!["acpi-support-base", "libstdc++6-4.4-dev-extra", "held-pkg"]
        );
    }

    #[test]
    fn test_legacy_rows_have_description_but_no_architecture() {
        let pkgs = packages(LEGACY);
        assert_eq!(pkgs[0].version, "0.109-11");
        assert_eq!(pkgs[0].architecture, None);
        assert_eq!(
            pkgs[0].description.as_deref(),
            Some("scripts for handling base ACPI events")
        );
    }

    #[test]
    fn test_overflowing_row_falls_back_to_whitespace() {
        let pkgs = packages(LEGACY);
        assert_eq!(pkgs[1].version, "4.4.5-8");
        assert_eq!(
            pkgs[1].description.as_deref(),
            Some("GNU Standard C++ Library v3 (development files)")
        );
    }

    #[test]
    fn test_architecture_column() {
        let stdout = "\
||/ Name           Version      Architecture Description
+++-==============-============-============-=================================
ii  adduser        3.118        all          add and remove users and groups
ii  apt            1.8.2.3      amd64        commandline package manager
";
        let pkgs = packages(stdout);
        assert_eq!(pkgs.len(), 2);
        assert_eq!(pkgs[1].name, "apt");
        assert_eq!(pkgs[1].architecture.as_deref(), Some("amd64"));
        assert_eq!(
            pkgs[1].description.as_deref(),
            Some("commandline package manager")
        );
    }

    #[test]
    fn test_rows_without_header_are_ignored() {
        assert!(packages("ii  adduser 3.118 all add users\n").is_empty());
    }

    #[test]
    fn test_status_database_errors_are_reported() {
        let output = CommandOutput::new("/usr/bin/dpkg", ["--list"], "").with_stderr(
            "dpkg: error: parsing file '/var/lib/dpkg/status' near line 5 package 'x':\n",
        );
        let records: Vec<_> = DpkgParser.parse(&output, &HostContext::default()).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].as_anomaly().map(|anomaly| anomaly.symptom.as_str()),
            Some("Broken dpkg status database.")
        );
    }
}
