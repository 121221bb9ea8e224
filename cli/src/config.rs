//! Source catalogs and capture files read by the CLI.
//!
//! # Example catalog
//!
//! ```yaml
//! version: "1.0"
//! sources:
//!   - name: GoodPsArgs1
//!     doc: ps with the default format.
//!     cmd: /bin/ps
//!     args: ["-ef"]
//!     supported_os: [Linux]
//!   - name: RedhatPackagesList
//!     cmd: /bin/rpm
//!     args: ["-qa"]
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use hostfacts_core::{CommandOutput, CommandSource, HostContext};
use hostfacts_parsers::ParserKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading CLI inputs.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// A named list of declarative command sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceCatalog {
    /// Catalog format version (e.g. `"1.0"`).
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub sources: Vec<CommandSource>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl SourceCatalog {
    /// Loads a catalog from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let catalog = serde_yaml::from_reader(BufReader::new(file))?;
        Ok(catalog)
    }
}

/// One captured command execution as stored on disk.
///
/// The [`CommandOutput`] fields sit at the top level, next to optional host
/// context and an explicit parser choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capture {
    #[serde(flatten)]
    pub output: CommandOutput,
    #[serde(default)]
    pub host: HostContext,
    /// Overrides parser selection by command basename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parser: Option<ParserKind>,
}

impl Capture {
    /// Loads a capture; `.yaml`/`.yml` files are read as YAML, anything else
    /// as JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

        let capture = if is_yaml {
            serde_yaml::from_reader(reader)?
        } else {
            serde_json::from_reader(reader)?
        };
        Ok(capture)
    }
}
