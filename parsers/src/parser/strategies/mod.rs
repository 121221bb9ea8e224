//! Bundled parsers, one per tool output grammar.

pub mod dmidecode;
pub mod dpkg;
pub mod ps;
pub mod rpm;
pub mod yum;

pub use dmidecode::DmidecodeParser;
pub use dpkg::DpkgParser;
pub use ps::PsParser;
pub use rpm::RpmParser;
pub use yum::YumParser;

use std::sync::LazyLock;

use hostfacts_core::{CommandOutput, ParsedRecord};

use super::RecordStream;
use super::anomaly::{AnomalyReporter, ErrorSignature};

/// Error messages printed by rpm-backed tools when the package database is
/// damaged.
static RPMDB_SIGNATURES: LazyLock<Vec<ErrorSignature>> = LazyLock::new(|| {
    const SYMPTOM: &str = "Broken rpm database.";
    vec![
        ErrorSignature::new(
            r"rpmdbNextIterator: skipping h#",
            SYMPTOM,
            "rpm skipped package headers it could not read; the listing is incomplete",
        ),
        ErrorSignature::new(
            r"rpmdb: .*(DB_RUNRECOVERY|PANIC)",
            SYMPTOM,
            "the Berkeley DB environment behind the rpm database needs recovery",
        ),
        ErrorSignature::new(
            r"error: db\d error\(-?\d+\)",
            SYMPTOM,
            "rpm reported a low-level database error",
        ),
        ErrorSignature::new(
            r"cannot open Packages (index|database)",
            SYMPTOM,
            "the rpm Packages database could not be opened",
        ),
    ]
});

pub(crate) fn rpmdb_signatures() -> &'static [ErrorSignature] {
    &RPMDB_SIGNATURES
}

/// Wraps per-line records with the anomalies derived from the whole output:
/// the exit-status anomaly first, then `records`, then stderr signature hits.
///
/// Stderr is scanned only once `records` is exhausted.
pub(crate) fn with_output_anomalies<'a, I>(
    reporter: AnomalyReporter,
    output: &'a CommandOutput,
    signatures: &'static [ErrorSignature],
    records: I,
) -> RecordStream<'a>
where
    I: Iterator<Item = ParsedRecord> + 'a,
{
    let exit = reporter.exit_status(output).map(ParsedRecord::Anomaly);
    let stderr = std::iter::once_with(move || reporter.scan_stderr(&output.stderr, signatures))
        .flatten()
        .map(ParsedRecord::Anomaly);

    Box::new(exit.into_iter().chain(records).chain(stderr))
}
