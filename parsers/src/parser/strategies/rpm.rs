//! `rpm -qa` parser.
//!
//! Each whitespace-separated token is `name-version-release`. Package names
//! may contain hyphens themselves (`gcc-c++`, `libstdc++-devel`), so tokens
//! are segmented from the right.

use hostfacts_core::{CommandOutput, HostContext, ParsedRecord, SoftwarePackage};
use tracing::trace;

use super::{rpmdb_signatures, with_output_anomalies};
use crate::parser::anomaly::AnomalyReporter;
use crate::parser::{CommandParser, ParserKind, RecordStream, log_parse_start};

const REPORTER: AnomalyReporter = AnomalyReporter::new("rpm");

/// Reads `rpm -qa` listings.
#[derive(Debug, Default, Clone, Copy)]
pub struct RpmParser;

impl CommandParser for RpmParser {
    fn kind(&self) -> ParserKind {
        ParserKind::Rpm
    }

    fn tools(&self) -> &'static [&'static str] {
        &["rpm"]
    }

    fn parse<'a>(&self, output: &'a CommandOutput, context: &HostContext) -> RecordStream<'a> {
        log_parse_start(self.kind(), output, context);

        let packages = output
            .stdout
            .split_whitespace()
            .filter_map(split_package_token)
            .map(|(name, version)| ParsedRecord::Package(SoftwarePackage::installed(name, version)));

        with_output_anomalies(REPORTER, output, rpmdb_signatures(), packages)
    }
}

/// Splits `name-version-release` into `(name, "version-release")`.
///
/// A token with a single hyphen yields `(name, version)`. Tokens whose name
/// does not start with an alphanumeric character, or whose version does not
/// start with a digit, are rejected.
///
/// # Examples
///
/// ```
/// use hostfacts_parsers::parser::strategies::rpm::split_package_token;
///
/// assert_eq!(split_package_token("gcc-c++-4.1.2-55.el5"), Some(("gcc-c++", "4.1.2-55.el5".to_string())));
/// assert_eq!(split_package_token("less-436"), Some(("less", "436".to_string())));
/// assert_eq!(split_package_token("-not-valid.123.el5"), None);
/// ```
pub fn split_package_token(token: &str) -> Option<(&str, String)> {
    let mut parts = token.rsplitn(3, '-');
    let last = parts.next()?;
    let middle = parts.next()?;

    let (name, version) = match parts.next() {
        Some(name) => (name, format!("{middle}-{last}")),
        None => (middle, last.to_string()),
    };

    let valid = name.starts_with(|ch: char| ch.is_ascii_alphanumeric())
        && version.starts_with(|ch: char| ch.is_ascii_digit())
        && !version.ends_with('-');
    if !valid {
        trace!(token, "skipping malformed rpm token");
        return None;
    }
    Some((name, version))
}
