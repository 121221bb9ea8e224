//! Structured summary of one parse.

use hostfacts_core::{CommandOutput, HostContext, ParsedRecord, RecordKind};
use serde::{Deserialize, Serialize};

use crate::parser::ParserKind;

/// Per-command parse report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseReport {
    pub parser: ParserKind,
    pub command: String,
    pub args: Vec<String>,
    /// Host the output was collected from, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub exit_status: i32,
    pub duration_seconds: f64,
    pub stdout_lines: usize,
    pub stderr_lines: usize,
    pub packages: usize,
    pub hardware: usize,
    pub processes: usize,
    pub anomalies: usize,
    /// Distinct anomaly symptoms, in first-seen order.
    pub anomaly_symptoms: Vec<String>,
}

impl ParseReport {
    /// Summarizes the records one parser produced for `output`.
    ///
    /// # Examples
    ///
    /// ```
    /// use hostfacts_core::{CommandOutput, HostContext, ParsedRecord, SoftwarePackage};
    /// use hostfacts_parsers::{ParseReport, ParserKind};
    ///
    /// let output = CommandOutput::new("/bin/rpm", ["-qa"], "less-436-9.el5\n");
    /// let records = vec![ParsedRecord::Package(SoftwarePackage::installed("less", "436-9.el5"))];
    ///
    /// let report = ParseReport::from_records(ParserKind::Rpm, &output, &HostContext::default(), &records);
    /// assert_eq!(report.packages, 1);
    /// assert_eq!(report.stdout_lines, 1);
    /// assert!(report.is_clean());
    /// ```
    pub fn from_records(
        parser: ParserKind,
        output: &CommandOutput,
        context: &HostContext,
        records: &[ParsedRecord],
    ) -> Self {
        let count = |kind: RecordKind| {
            records
                .iter()
                .filter(|record| record.kind() == kind)
                .count()
        };

        let mut anomaly_symptoms: Vec<String> = Vec::new();
        for anomaly in records.iter().filter_map(ParsedRecord::as_anomaly) {
            if !anomaly_symptoms.contains(&anomaly.symptom) {
                anomaly_symptoms.push(anomaly.symptom.clone());
            }
        }

        Self {
            parser,
            command: output.command.clone(),
            args: output.args.clone(),
            host: context.hostname.clone(),
            exit_status: output.exit_status,
            duration_seconds: output.duration_seconds,
            stdout_lines: output.stdout.lines().count(),
            stderr_lines: output.stderr.lines().count(),
            packages: count(RecordKind::Package),
            hardware: count(RecordKind::Hardware),
            processes: count(RecordKind::Process),
            anomalies: count(RecordKind::Anomaly),
            anomaly_symptoms,
        }
    }

    /// `true` when the parse produced no anomalies.
    pub fn is_clean(&self) -> bool {
        self.anomalies == 0
    }

    /// Number of non-anomaly records.
    pub fn facts(&self) -> usize {
        self.packages + self.hardware + self.processes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostfacts_core::{Anomaly, AnomalyType, SoftwarePackage};

    fn anomaly(symptom: &str) -> ParsedRecord {
        ParsedRecord::Anomaly(Anomaly::new(AnomalyType::ParserAnomaly, symptom))
    }

    #[test]
    fn test_counts_by_kind_and_dedups_symptoms() {
        let output = CommandOutput::new("/bin/rpm", ["-qa"], "a-1\nb-2\n")
            .with_stderr("error: rpmdbNextIterator: skipping h# 1\n")
            .with_exit_status(1);
        let records = vec![
            anomaly("Command exited with status 1."),
            ParsedRecord::Package(SoftwarePackage::installed("a", "1")),
            ParsedRecord::Package(SoftwarePackage::installed("b", "2")),
            anomaly("Broken rpm database."),
            anomaly("Broken rpm database."),
        ];
        let context = HostContext::new("web-1", "Linux");

        let report = ParseReport::from_records(ParserKind::Rpm, &output, &context, &records);
        assert_eq!(report.packages, 2);
        assert_eq!(report.anomalies, 3);
        assert_eq!(report.facts(), 2);
        assert_eq!(
            report.anomaly_symptoms,
            vec!["Command exited with status 1.", "Broken rpm database."]
        );
        assert_eq!(report.host.as_deref(), Some("web-1"));
        assert_eq!(report.stderr_lines, 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_report_serializes_parser_lowercase() {
        let output = CommandOutput::new("/bin/ps", ["-ef"], "");
        let report =
            ParseReport::from_records(ParserKind::Ps, &output, &HostContext::default(), &[]);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["parser"], "ps");
        assert!(json.get("host").is_none());
    }
}
