//! Record type definitions for facts extracted from command output.
//!
//! Every parser emits [`ParsedRecord`] values. The variants carry the typed
//! payload for one fact and serialize with a `kind` discriminator so that
//! consumers never need to guess a record's shape.

use serde::{Deserialize, Serialize};

/// Installation state of a software package.
///
/// # Examples
///
/// ```
/// use hostfacts_core::InstallState;
///
/// assert_eq!(InstallState::default(), InstallState::Unknown);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InstallState {
    /// Package is fully installed.
    Installed,
    /// State could not be determined from the listing.
    #[default]
    Unknown,
}

/// A package reported by a package manager listing.
///
/// # Examples
///
/// ```
/// use hostfacts_core::{InstallState, SoftwarePackage};
///
/// let pkg = SoftwarePackage::installed("less", "436-9.el5")
///     .with_architecture("x86_64");
/// assert_eq!(pkg.install_state, InstallState::Installed);
/// assert_eq!(pkg.architecture.as_deref(), Some("x86_64"));
/// assert!(pkg.publisher.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftwarePackage {
    /// Package name (e.g. "libstdc++-devel")
    pub name: String,
    /// Version string as reported, including any release suffix
    pub version: String,
    /// Target architecture (e.g. "x86_64", "amd64", "all")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<String>,
    /// Repository or vendor tag (e.g. "@base")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    /// One-line description when the listing carries one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Installation state
    pub install_state: InstallState,
}

impl SoftwarePackage {
    /// Creates an installed package with only name and version set.
    pub fn installed(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            architecture: None,
            publisher: None,
            description: None,
            install_state: InstallState::Installed,
        }
    }

    /// Sets the architecture.
    pub fn with_architecture(mut self, architecture: impl Into<String>) -> Self {
        self.architecture = Some(architecture.into());
        self
    }

    /// Sets the publisher/repository tag.
    pub fn with_publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = Some(publisher.into());
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Hardware inventory of one host.
///
/// Fields that the inventory output omits stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_manufacturer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_product_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_sku_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_asset_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bios_vendor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bios_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bios_release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bios_rom_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bios_revision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseboard_manufacturer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseboard_product_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseboard_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseboard_serial_number: Option<String>,
}

impl HardwareInfo {
    /// Returns `true` when no field was populated.
    ///
    /// # Examples
    ///
    /// ```
    /// use hostfacts_core::HardwareInfo;
    ///
    /// let mut info = HardwareInfo::default();
    /// assert!(info.is_empty());
    /// info.serial_number = Some("2UA25107BB".into());
    /// assert!(!info.is_empty());
    /// ```
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One process from a process listing.
///
/// Numeric columns that the listing did not include (or reported as a
/// placeholder) are zero; text columns are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Process {
    pub pid: u32,
    pub ppid: u32,
    /// Short executable name
    pub name: String,
    /// Full command line, argv[0] first
    pub cmdline: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub effective_uid: u32,
    pub real_uid: u32,
    pub saved_uid: u32,
    pub effective_gid: u32,
    pub real_gid: u32,
    pub saved_gid: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub nice: i32,
    pub num_threads: u32,
    pub cpu_percent: f64,
    /// Accumulated CPU time in seconds
    pub user_cpu_time: f64,
    pub memory_percent: f64,
    /// Resident set size as reported by the tool (KiB for procps)
    pub rss_size: u64,
    /// Virtual memory size as reported by the tool (KiB for procps)
    pub vms_size: u64,
}

/// Classification of an [`Anomaly`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyType {
    /// Raised by a parser while reading collected output.
    #[default]
    ParserAnomaly,
    /// Raised by later analysis of collected facts.
    AnalysisAnomaly,
    /// Recorded by an operator.
    ManualAnomaly,
}

/// A detected irregularity in collected data.
///
/// Anomalies are emitted next to normal records instead of failing the
/// parse.
///
/// # Examples
///
/// ```
/// use hostfacts_core::{Anomaly, AnomalyType};
///
/// let anomaly = Anomaly::new(AnomalyType::ParserAnomaly, "Broken rpm database.");
/// assert_eq!(anomaly.symptom, "Broken rpm database.");
/// assert!(anomaly.finding.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anomaly {
    #[serde(rename = "type")]
    pub anomaly_type: AnomalyType,
    /// Short diagnostic string
    pub symptom: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// Name of the component that raised the anomaly
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub generated_by: String,
    /// Raw lines that triggered the anomaly
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub finding: Vec<String>,
}

impl Anomaly {
    pub fn new(anomaly_type: AnomalyType, symptom: impl Into<String>) -> Self {
        Self {
            anomaly_type,
            symptom: symptom.into(),
            explanation: None,
            generated_by: String::new(),
            finding: Vec::new(),
        }
    }
}

/// Discriminator of a [`ParsedRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Package,
    Hardware,
    Process,
    Anomaly,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Package => write!(f, "package"),
            Self::Hardware => write!(f, "hardware"),
            Self::Process => write!(f, "process"),
            Self::Anomaly => write!(f, "anomaly"),
        }
    }
}

/// One fact produced by a parser.
///
/// # Examples
///
/// ```
/// use hostfacts_core::{ParsedRecord, RecordKind, SoftwarePackage};
///
/// let record = ParsedRecord::Package(SoftwarePackage::installed("glib2", "2.12.3-4.el5_3.1"));
/// assert_eq!(record.kind(), RecordKind::Package);
/// assert_eq!(record.as_package().map(|p| p.name.as_str()), Some("glib2"));
/// assert!(record.as_anomaly().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
pub enum ParsedRecord {
    Package(SoftwarePackage),
    Hardware(HardwareInfo),
    Process(Process),
    Anomaly(Anomaly),
}

impl ParsedRecord {
    /// Returns the variant discriminator.
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Package(_) => RecordKind::Package,
            Self::Hardware(_) => RecordKind::Hardware,
            Self::Process(_) => RecordKind::Process,
            Self::Anomaly(_) => RecordKind::Anomaly,
        }
    }

    pub fn as_package(&self) -> Option<&SoftwarePackage> {
        match self {
            Self::Package(pkg) => Some(pkg),
            _ => None,
        }
    }

    pub fn as_hardware(&self) -> Option<&HardwareInfo> {
        match self {
            Self::Hardware(info) => Some(info),
            _ => None,
        }
    }

    pub fn as_process(&self) -> Option<&Process> {
        match self {
            Self::Process(process) => Some(process),
            _ => None,
        }
    }

    pub fn as_anomaly(&self) -> Option<&Anomaly> {
        match self {
            Self::Anomaly(anomaly) => Some(anomaly),
            _ => None,
        }
    }
}
