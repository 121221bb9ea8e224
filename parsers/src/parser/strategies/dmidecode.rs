//! `dmidecode` parser.
//!
//! Output is a series of blank-line separated structures. Each starts with a
//! `Handle 0x...` line followed by a title such as `System Information`, then
//! tab-indented `Key: Value` lines. Doubly indented lines continue list
//! values (`Characteristics:`) and are ignored.

use hostfacts_core::{CommandOutput, HardwareInfo, HostContext, ParsedRecord};
use tracing::debug;

use super::with_output_anomalies;
use crate::parser::anomaly::AnomalyReporter;
use crate::parser::fields::{indent_depth, split_blocks, split_key_value};
use crate::parser::{CommandParser, ParserKind, RecordStream, log_parse_start};

const REPORTER: AnomalyReporter = AnomalyReporter::new("dmidecode");

/// Values firmware vendors leave in unset fields.
const PLACEHOLDERS: [&str; 7] = [
    "Not Specified",
    "Not Present",
    "Not Available",
    "To Be Filled By O.E.M.",
    "To be filled by O.E.M.",
    "Default string",
    "None",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Bios,
    System,
    BaseBoard,
}

impl Section {
    fn from_title(title: &str) -> Option<Self> {
        match title.trim() {
            "BIOS Information" => Some(Self::Bios),
            "System Information" => Some(Self::System),
            "Base Board Information" => Some(Self::BaseBoard),
            _ => None,
        }
    }
}

/// Reads `dmidecode` hardware inventories.
#[derive(Debug, Default, Clone, Copy)]
pub struct DmidecodeParser;

impl DmidecodeParser {
    /// Collects BIOS, system and base board facts into one value.
    ///
    /// Sections that are absent leave their fields unset; when a section
    /// appears more than once the first value wins.
    ///
    /// # Examples
    ///
    /// ```
    /// use hostfacts_core::CommandOutput;
    /// use hostfacts_parsers::parser::strategies::DmidecodeParser;
    ///
    /// let stdout = "Handle 0x0001, DMI type 1, 27 bytes\n\
    ///               System Information\n\
    ///               \tManufacturer: Hewlett-Packard\n\
    ///               \tSerial Number: 2UA25107BB\n\
    ///               \tSKU Number: Not Specified\n";
    /// let output = CommandOutput::new("/usr/sbin/dmidecode", ["-q"], stdout);
    ///
    /// let hardware = DmidecodeParser.parse_hardware(&output);
    /// assert_eq!(hardware.serial_number.as_deref(), Some("2UA25107BB"));
    /// assert_eq!(hardware.system_sku_number, None);
    /// ```
    pub fn parse_hardware(&self, output: &CommandOutput) -> HardwareInfo {
        let mut hardware = HardwareInfo::default();

        for block in split_blocks(&output.stdout) {
            let mut lines = block.iter().copied();
            let Some(section) = lines
                .by_ref()
                .find(|line| indent_depth(line) == 0 && !line.starts_with("Handle 0x"))
                .and_then(Section::from_title)
            else {
                continue;
            };

            for line in lines.filter(|line| indent_depth(line) == 1) {
                let Some((key, value)) = split_key_value(line, ':') else {
                    continue;
                };
                if let Some(value) = meaningful(value) {
                    assign(&mut hardware, section, key, value);
                }
            }
        }

        debug!(
            serial_number = hardware.serial_number.as_deref(),
            manufacturer = hardware.system_manufacturer.as_deref(),
            "dmidecode inventory parsed"
        );
        hardware
    }
}

impl CommandParser for DmidecodeParser {
    fn kind(&self) -> ParserKind {
        ParserKind::Dmidecode
    }

    fn tools(&self) -> &'static [&'static str] {
        &["dmidecode"]
    }

    fn parse<'a>(&self, output: &'a CommandOutput, context: &HostContext) -> RecordStream<'a> {
        log_parse_start(self.kind(), output, context);

        let parser = *self;
        let hardware =
            std::iter::once_with(move || ParsedRecord::Hardware(parser.parse_hardware(output)));
        with_output_anomalies(REPORTER, output, &[], hardware)
    }
}

fn meaningful(value: &str) -> Option<&str> {
    let value = value.trim();
    if value.is_empty() || PLACEHOLDERS.contains(&value) {
        None
    } else {
        Some(value)
    }
}

fn assign(hardware: &mut HardwareInfo, section: Section, key: &str, value: &str) {
    let slot = match (section, key) {
        (Section::Bios, "Vendor") => &mut hardware.bios_vendor,
        (Section::Bios, "Version") => &mut hardware.bios_version,
        (Section::Bios, "Release Date") => &mut hardware.bios_release_date,
        (Section::Bios, "ROM Size") => &mut hardware.bios_rom_size,
        (Section::Bios, "BIOS Revision") => &mut hardware.bios_revision,
        (Section::System, "Manufacturer") => &mut hardware.system_manufacturer,
        (Section::System, "Product Name") => &mut hardware.system_product_name,
        (Section::System, "Serial Number") => &mut hardware.serial_number,
        (Section::System, "UUID") => &mut hardware.system_uuid,
        (Section::System, "SKU Number") => &mut hardware.system_sku_number,
        (Section::System, "Family") => &mut hardware.system_family,
        (Section::System, "Asset Tag") => &mut hardware.system_asset_tag,
        (Section::BaseBoard, "Manufacturer") => &mut hardware.baseboard_manufacturer,
        (Section::BaseBoard, "Product Name") => &mut hardware.baseboard_product_name,
        (Section::BaseBoard, "Version") => &mut hardware.baseboard_version,
        (Section::BaseBoard, "Serial Number") => &mut hardware.baseboard_serial_number,
        _ => return,
    };
    slot.get_or_insert_with(|| value.to_string());
}
