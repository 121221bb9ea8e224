//! Output formatting for records and reports.

use hostfacts_core::{HardwareInfo, ParsedRecord};

use crate::report::ParseReport;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OutputFormat {
    Json,
    Yaml,
    Table,
}

/// Formats parsed records in the requested output format.
pub fn format_records(records: &[ParsedRecord], format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(records)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(records).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Table => Ok(records_to_table(records)),
    }
}

/// Formats a parse report in the requested output format.
pub fn format_report(report: &ParseReport, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(report)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(report).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Table => Ok(report_to_table(report)),
    }
}

/// Formats several reports, one row each in table form.
pub fn format_reports(reports: &[ParseReport], format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(reports)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(reports).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Table => Ok(reports.iter().map(report_to_table).collect()),
    }
}

fn records_to_table(records: &[ParsedRecord]) -> String {
    let mut out = String::new();

    for record in records {
        let line = match record {
            ParsedRecord::Package(pkg) => format!(
                "package   {:<32} {:<24} {:<8} {}",
                pkg.name,
                pkg.version,
                pkg.architecture.as_deref().unwrap_or("-"),
                pkg.publisher.as_deref().unwrap_or("-"),
            ),
            ParsedRecord::Process(process) => format!(
                "process   {:>7} {:>7} {:<16} {:<10} {}",
                process.pid,
                process.ppid,
                process.name,
                process.username.as_deref().unwrap_or("-"),
                process.cmdline.join(" "),
            ),
            ParsedRecord::Hardware(hw) => hardware_to_table(hw),
            ParsedRecord::Anomaly(anomaly) => {
                let mut line = format!("anomaly   [{}] {}", anomaly.generated_by, anomaly.symptom);
                if let Some(ref explanation) = anomaly.explanation {
                    line.push_str(&format!(" ({explanation})"));
                }
                line
            }
        };
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out
}

fn hardware_to_table(hw: &HardwareInfo) -> String {
    let fields = [
        ("serial", &hw.serial_number),
        ("manufacturer", &hw.system_manufacturer),
        ("product", &hw.system_product_name),
        ("uuid", &hw.system_uuid),
        ("bios", &hw.bios_version),
    ];
    let mut line = String::from("hardware ");
    for (label, value) in fields {
        if let Some(value) = value {
            line.push_str(&format!(" {label}={value}"));
        }
    }
    line
}

fn report_to_table(report: &ParseReport) -> String {
    let mut out = String::new();
    let status = if report.is_clean() { "OK" } else { "ANOMALY" };
    out.push_str(&format!(
        "{:<24} {:<10} {:<8} facts={} anomalies={} lines={}",
        report.command,
        report.parser,
        status,
        report.facts(),
        report.anomalies,
        report.stdout_lines,
    ));
    if !report.anomaly_symptoms.is_empty() {
        out.push_str(&format!("  [{}]", report.anomaly_symptoms.join("; ")));
    }
    out.push('\n');
    out
}
