//! Anomaly construction for parsers.
//!
//! Parsers never fail on bad content. When they recognize a problem they can
//! name, they emit an [`Anomaly`] built here and keep going.

use hostfacts_core::{Anomaly, AnomalyType, CommandOutput};
use regex::Regex;

/// Maximum number of raw lines kept in an anomaly's `finding`.
pub const MAX_FINDING_LINES: usize = 10;

/// A known error message printed by a tool and the symptom it indicates.
#[derive(Debug, Clone)]
pub struct ErrorSignature {
    pattern: Regex,
    symptom: &'static str,
    explanation: &'static str,
}

impl ErrorSignature {
    /// Creates a signature from a static pattern.
    ///
    /// # Panics
    ///
    /// Panics if `pattern` is not a valid regex. Signatures are compile-time
    /// constants, so a failure is a programmer error.
    pub fn new(pattern: &str, symptom: &'static str, explanation: &'static str) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("static regex must compile"),
            symptom,
            explanation,
        }
    }

    pub fn symptom(&self) -> &'static str {
        self.symptom
    }

    pub fn is_match(&self, line: &str) -> bool {
        self.pattern.is_match(line)
    }
}

/// Builds anomalies on behalf of one parser.
///
/// # Examples
///
/// ```
/// use hostfacts_parsers::parser::anomaly::{AnomalyReporter, ErrorSignature};
///
/// let reporter = AnomalyReporter::new("rpm");
/// let signatures = [ErrorSignature::new(
///     r"rpmdbNextIterator: skipping h#",
///     "Broken rpm database.",
///     "rpm skipped unreadable header records",
/// )];
/// let stderr = "error: rpmdbNextIterator: skipping h#  1\nerror: rpmdbNextIterator: skipping h#  2\n";
///
/// let anomalies = reporter.scan_stderr(stderr, &signatures);
/// assert_eq!(anomalies.len(), 1);
/// assert_eq!(anomalies[0].symptom, "Broken rpm database.");
/// assert_eq!(anomalies[0].finding.len(), 2);
/// assert_eq!(anomalies[0].generated_by, "rpm");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AnomalyReporter {
    generated_by: &'static str,
}

impl AnomalyReporter {
    pub const fn new(generated_by: &'static str) -> Self {
        Self { generated_by }
    }

    /// Creates a parser anomaly with the given symptom.
    pub fn parser_anomaly(&self, symptom: &str) -> Anomaly {
        let mut anomaly = Anomaly::new(AnomalyType::ParserAnomaly, symptom.trim());
        anomaly.generated_by = self.generated_by.to_string();
        anomaly
    }

    /// Appends raw lines to an anomaly's finding, up to [`MAX_FINDING_LINES`].
    pub fn with_finding<'l, I>(&self, mut anomaly: Anomaly, lines: I) -> Anomaly
    where
        I: IntoIterator<Item = &'l str>,
    {
        extend_finding(&mut anomaly, lines);
        anomaly
    }

    /// Reports a non-zero exit status, if any.
    pub fn exit_status(&self, output: &CommandOutput) -> Option<Anomaly> {
        if output.exit_status == 0 {
            return None;
        }
        let mut anomaly = self.parser_anomaly(&format!(
            "Command exited with status {}.",
            output.exit_status
        ));
        anomaly.explanation = Some(format!(
            "`{}` reported failure; its output may be incomplete",
            output.command
        ));
        Some(anomaly)
    }

    /// Scans stderr for known error signatures.
    ///
    /// Yields at most one anomaly per distinct symptom no matter how many
    /// lines or signatures matched, in signature order.
    pub fn scan_stderr(&self, stderr: &str, signatures: &[ErrorSignature]) -> Vec<Anomaly> {
        let mut anomalies: Vec<Anomaly> = Vec::new();

        for signature in signatures {
            let mut matched = stderr
                .lines()
                .filter(|line| signature.is_match(line))
                .peekable();
            if matched.peek().is_none() {
                continue;
            }

            match anomalies
                .iter_mut()
                .find(|anomaly| anomaly.symptom == signature.symptom)
            {
                Some(existing) => extend_finding(existing, matched),
                None => {
                    let mut anomaly = self.parser_anomaly(signature.symptom);
                    anomaly.explanation = Some(signature.explanation.to_string());
                    anomalies.push(self.with_finding(anomaly, matched));
                }
            }
        }

        if !anomalies.is_empty() {
            tracing::warn!(
                parser = self.generated_by,
                symptoms = ?anomalies.iter().map(|a| a.symptom.as_str()).collect::<Vec<_>>(),
                "error signatures matched in stderr"
            );
        }
        anomalies
    }
}

fn extend_finding<'l, I>(anomaly: &mut Anomaly, lines: I)
where
    I: IntoIterator<Item = &'l str>,
{
    let room = MAX_FINDING_LINES.saturating_sub(anomaly.finding.len());
    anomaly
        .finding
        .extend(lines.into_iter().take(room).map(|line| line.trim().to_string()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn broken_db_signatures() -> Vec<ErrorSignature> {
        vec![
            ErrorSignature::new(r"rpmdbNextIterator: skipping h#", "Broken rpm database.", "a"),
            ErrorSignature::new(r"rpmdb: .*DB_RUNRECOVERY", "Broken rpm database.", "b"),
            ErrorSignature::new(r"cannot open Packages index", "Unreadable rpm index.", "c"),
        ]
    }

    #[test]
    fn test_scan_stderr_merges_signatures_with_same_symptom() {
        let reporter = AnomalyReporter::new("rpm");
        let stderr = "error: rpmdbNextIterator: skipping h#  4\n\
                      rpmdb: PANIC: fatal region error detected; run recovery DB_RUNRECOVERY\n";

        let anomalies = reporter.scan_stderr(stderr, &broken_db_signatures());
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].finding.len(), 2);
        assert_eq!(anomalies[0].explanation.as_deref(), Some("a"));
    }

    #[test]
    fn test_scan_stderr_ignores_unrelated_lines() {
        let reporter = AnomalyReporter::new("rpm");
        assert!(
            reporter
                .scan_stderr("warning: something benign\n", &broken_db_signatures())
                .is_empty()
        );
        assert!(reporter.scan_stderr("", &broken_db_signatures()).is_empty());
    }

    #[test]
    fn test_finding_is_capped() {
        let reporter = AnomalyReporter::new("rpm");
        let stderr = (0..50)
            .map(|i| format!("error: rpmdbNextIterator: skipping h# {i}"))
            .collect::<Vec<_>>()
            .join("\n");

        let anomalies = reporter.scan_stderr(&stderr, &broken_db_signatures());
        assert_eq!(anomalies[0].finding.len(), MAX_FINDING_LINES);
    }

    #[test]
    fn test_exit_status_only_reports_failures() {
        let reporter = AnomalyReporter::new("dpkg");
        let ok = CommandOutput::new("/usr/bin/dpkg", ["--list"], "");
        assert!(reporter.exit_status(&ok).is_none());

        let failed = ok.with_exit_status(2);
        let anomaly = reporter.exit_status(&failed).expect("non-zero status is reported");
        assert_eq!(anomaly.symptom, "Command exited with status 2.");
        assert_eq!(anomaly.generated_by, "dpkg");
    }
}
