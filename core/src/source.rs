//! Command invocations: what was run, what it printed, and what may be run.

use serde::{Deserialize, Serialize};

/// Returns the final path component of a command path.
///
/// # Examples
///
/// ```
/// use hostfacts_core::command_basename;
///
/// assert_eq!(command_basename("/usr/bin/dpkg"), "dpkg");
/// assert_eq!(command_basename("ps"), "ps");
/// assert_eq!(command_basename("/sbin/"), "");
/// ```
pub fn command_basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Captured result of one command execution.
///
/// This is the input to every parser. The capture is produced by an
/// external collector; parsers only read it.
///
/// # Examples
///
/// ```
/// use hostfacts_core::CommandOutput;
///
/// let output = CommandOutput::new("/bin/rpm", ["-qa"], "less-436-9.el5\n");
/// assert_eq!(output.basename(), "rpm");
/// assert_eq!(output.exit_status, 0);
/// assert!(output.stderr.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandOutput {
    /// Command path as invoked (e.g. "/bin/ps")
    pub command: String,
    /// Arguments in invocation order, excluding argv[0]
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    #[serde(default)]
    pub exit_status: i32,
    /// Wall-clock time the command took
    #[serde(default)]
    pub duration_seconds: f64,
}

impl CommandOutput {
    /// Creates a capture with a zero exit status and empty stderr.
    pub fn new<I, S>(command: &str, args: I, stdout: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            stdout: stdout.to_string(),
            ..Default::default()
        }
    }

    pub fn with_stderr(mut self, stderr: &str) -> Self {
        self.stderr = stderr.to_string();
        self
    }

    pub fn with_exit_status(mut self, exit_status: i32) -> Self {
        self.exit_status = exit_status;
        self
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration_seconds = seconds;
        self
    }

    /// Basename of the invoked command.
    pub fn basename(&self) -> &str {
        command_basename(&self.command)
    }
}

/// Read-only description of the host the output was collected on.
///
/// Parsers use it for log context only; parsing results never depend on it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
}

impl HostContext {
    pub fn new(hostname: impl Into<String>, os: impl Into<String>) -> Self {
        Self {
            hostname: Some(hostname.into()),
            os: Some(os.into()),
        }
    }

    /// Hostname for log fields, `"-"` when unknown.
    pub fn host_label(&self) -> &str {
        self.hostname.as_deref().unwrap_or("-")
    }
}

/// Declarative description of a command to collect and the parser input it
/// produces.
///
/// # Examples
///
/// ```
/// use hostfacts_core::CommandSource;
///
/// let source = CommandSource::new("GoodPsArgs1", "/bin/ps", ["-ef"])
///     .with_supported_os(["Linux"]);
/// assert_eq!(source.basename(), "ps");
/// assert!(source.supports_os("linux"));
/// assert!(!source.supports_os("Windows"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSource {
    /// Unique source name
    pub name: String,
    /// Optional human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    /// Command path to execute
    #[serde(alias = "cmd")]
    pub command: String,
    /// Ordered argument list
    #[serde(default)]
    pub args: Vec<String>,
    /// Platforms the source applies to (empty = any)
    #[serde(default)]
    pub supported_os: Vec<String>,
}

impl CommandSource {
    pub fn new<I, S>(name: &str, command: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.to_string(),
            doc: None,
            command: command.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            supported_os: Vec::new(),
        }
    }

    pub fn with_doc(mut self, doc: &str) -> Self {
        self.doc = Some(doc.to_string());
        self
    }

    pub fn with_supported_os<I, S>(mut self, platforms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supported_os = platforms.into_iter().map(Into::into).collect();
        self
    }

    /// Basename of the source's command.
    pub fn basename(&self) -> &str {
        command_basename(&self.command)
    }

    /// Returns `true` when the source applies to `platform`.
    ///
    /// An empty `supported_os` list applies everywhere. Comparison ignores
    /// ASCII case.
    pub fn supports_os(&self, platform: &str) -> bool {
        self.supported_os.is_empty()
            || self
                .supported_os
                .iter()
                .any(|os| os.eq_ignore_ascii_case(platform))
    }
}
