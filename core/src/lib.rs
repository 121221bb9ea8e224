//! Core record types and declarative source primitives.
//!
//! This crate defines the data shared by every command-output parser:
//!
//! - [`ParsedRecord`]: tagged fact emitted by a parser, one of
//!   [`SoftwarePackage`], [`HardwareInfo`], [`Process`] or [`Anomaly`].
//! - [`CommandOutput`]: a captured command execution (command, arguments,
//!   stdout, stderr, exit status, duration), the input to parsing.
//! - [`HostContext`]: read-only description of the collecting host.
//! - [`CommandSource`]: a declarative description of a command to collect.
//!
//! Validation ([`validate_source`], [`validate_catalog`]) catches structural
//! source errors. Parser-specific checks live with the parsers and report the
//! same [`ParserDefinitionError`].
//!
//! # Example
//!
//! ```
//! use hostfacts_core::*;
//!
//! let output = CommandOutput::new("/bin/rpm", ["-qa"], "less-436-9.el5\n")
//!     .with_stderr("error: rpmdbNextIterator: skipping h# 12")
//!     .with_duration(0.4);
//! assert_eq!(output.basename(), "rpm");
//!
//! let record = ParsedRecord::Package(SoftwarePackage::installed("less", "436-9.el5"));
//! assert_eq!(record.kind(), RecordKind::Package);
//!
//! let source = CommandSource::new("RedhatPackagesList", "/bin/rpm", ["-qa"])
//!     .with_supported_os(["Linux"]);
//! assert!(validate_source(&source).is_empty());
//! ```

mod source;
mod types;
mod validate;

pub use source::{CommandOutput, CommandSource, HostContext, command_basename};
pub use types::*;
pub use validate::{ParserDefinitionError, validate_catalog, validate_source};
