//! `yum list installed` parser.
//!
//! Rows are `name.arch  version  repository`. Yum wraps a row whose
//! `name.arch` is too wide for its column: the name stands alone and the
//! version and repository follow on the next line.

use std::iter::Peekable;
use std::str::Lines;

use hostfacts_core::{CommandOutput, HostContext, ParsedRecord, SoftwarePackage};

use super::{rpmdb_signatures, with_output_anomalies};
use crate::parser::anomaly::AnomalyReporter;
use crate::parser::fields::{SplitPolicy, split_columns};
use crate::parser::{CommandParser, ParserKind, RecordStream, log_parse_start};

const REPORTER: AnomalyReporter = AnomalyReporter::new("yum");

const WHITESPACE: SplitPolicy<'static> = SplitPolicy::Whitespace { max_columns: None };

/// Reads `yum list installed` (and `dnf list installed`) listings.
#[derive(Debug, Default, Clone, Copy)]
pub struct YumParser;

impl CommandParser for YumParser {
    fn kind(&self) -> ParserKind {
        ParserKind::Yum
    }

    fn tools(&self) -> &'static [&'static str] {
        &["yum", "dnf"]
    }

    fn parse<'a>(&self, output: &'a CommandOutput, context: &HostContext) -> RecordStream<'a> {
        log_parse_start(self.kind(), output, context);

        let packages = YumRows {
            lines: output.stdout.lines().peekable(),
        }
        .map(ParsedRecord::Package);

        with_output_anomalies(REPORTER, output, rpmdb_signatures(), packages)
    }
}

struct YumRows<'a> {
    lines: Peekable<Lines<'a>>,
}

impl Iterator for YumRows<'_> {
    type Item = SoftwarePackage;

    fn next(&mut self) -> Option<SoftwarePackage> {
        while let Some(line) = self.lines.next() {
            let cols = split_columns(line, &WHITESPACE);

            let (name_arch, version, repository) = match cols.len() {
                3 => (cols.get(0), cols.get(1), cols.get(2)),
                1 if cols.get(0).contains('.') => {
                    let continued = self
                        .lines
                        .peek()
                        .copied()
                        .map(|next| split_columns(next, &WHITESPACE))
                        .filter(|next| next.len() == 2 && starts_with_version(next.get(0)));
                    let Some(next) = continued else {
                        continue;
                    };
                    self.lines.next();
                    (cols.get(0), next.get(0), next.get(1))
                }
                _ => continue,
            };

            if let Some(package) = package_from_row(name_arch, version, repository) {
                return Some(package);
            }
        }
        None
    }
}

fn starts_with_version(first: &str) -> bool {
    first.starts_with(|ch: char| ch.is_ascii_digit())
}

/// Builds a package from one logical row, or `None` for header-like rows.
///
/// # Examples
///
/// ```
/// use hostfacts_parsers::parser::strategies::yum::package_from_row;
///
/// let pkg = package_from_row("ConsoleKit.x86_64", "0.4.1-3.el6", "@base").unwrap();
/// assert_eq!(pkg.name, "ConsoleKit");
/// assert_eq!(pkg.architecture.as_deref(), Some("x86_64"));
/// assert_eq!(pkg.publisher.as_deref(), Some("@base"));
///
/// assert!(package_from_row("Loaded", "plugins:", "fastestmirror").is_none());
/// ```
pub fn package_from_row(name_arch: &str, version: &str, repository: &str) -> Option<SoftwarePackage> {
    let (name, architecture) = name_arch.rsplit_once('.')?;
    if name.is_empty() || architecture.is_empty() || version.is_empty() {
        return None;
    }
    Some(
        SoftwarePackage::installed(name, version)
            .with_architecture(architecture)
            .with_publisher(repository),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packages(stdout: &str) -> Vec<SoftwarePackage> {
        let output = CommandOutput::new("/usr/bin/yum", ["list", "installed", "-q"], stdout);
        YumParser
            .parse(&output, &HostContext::default())
            .filter_map(|record| record.as_package().cloned())
            .collect()
    }

    #[test]
    fn test_headers_are_skipped() {
        let stdout = "Loaded plugins: fastestmirror, security\n\
                      Installed Packages\n\
                      ConsoleKit.x86_64        0.4.1-3.el6          @base\n";
        let pkgs = packages(stdout);
        assert_eq!(pkgs.len(), 1);
        assert_eq!(pkgs[0].version, "0.4.1-3.el6");
    }

    #[test]
    fn test_wrapped_rows_are_joined() {
        let stdout = "Installed Packages\n\
                      python-backports-ssl_match_hostname.noarch\n\
                      \x20                        3.4.0.2-4.el6        @epel\n\
                      zlib.x86_64              1.2.3-29.el6         @anaconda-CentOS-201303020151.x86_64/6.4\n";
        let pkgs = packages(stdout);

        assert_eq!(pkgs.len(), 2);
        assert_eq!(pkgs[0].name, "python-backports-ssl_match_hostname");
        assert_eq!(pkgs[0].architecture.as_deref(), Some("noarch"));
        assert_eq!(pkgs[0].version, "3.4.0.2-4.el6");
        assert_eq!(pkgs[0].publisher.as_deref(), Some("@epel"));
        assert_eq!(pkgs[1].name, "zlib");
    }

    #[test]
    fn test_orphan_name_line_is_dropped() {
        let stdout = "lonely.noarch\nConsoleKit.x86_64 0.4.1-3.el6 @base\n";
        let pkgs = packages(stdout);
        assert_eq!(pkgs.len(), 1);
        assert_eq!(pkgs[0].name, "ConsoleKit");
    }

    #[test]
    fn test_names_keep_inner_dots() {
        let pkgs = packages("perl-Net-SSLeay.1.35.x86_64 1.35-10.el6 @base\n");
        assert_eq!(pkgs[0].name, "perl-Net-SSLeay.1.35");
        assert_eq!(pkgs[0].architecture.as_deref(), Some("x86_64"));
    }
}
