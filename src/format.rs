//! Source formats and the decoding strategy used for each.
//!
//! Recovered Juno-106 banks turn up in a handful of shapes:
//!
//! * the `.106` librarian container, starting with the literal `!j106\`
//! * hex dump text, one row of `offset<TAB>byte byte ...` per line, usually
//!   with each parameter split into two nibbles
//! * annotated listings, free text where a bracketed run of hex bytes holds
//!   the patch names
//! * a stream of SysEx patch dump messages
//!
//! [`sniff`] identifies the shape from the start of the data and
//! [`FormatVariant`] carries the layout details for decoding it.

use std::fmt::{Display, Formatter};
use std::io::{Error, ErrorKind};

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::io::sysex::{ROLAND_ID, SYSEX_START};

/// Literal at the start of every `.106` container.
pub const CONTAINER_MAGIC: &[u8; 6] = b"!j106\\";

/// Number of leading bytes examined when sniffing.
const SNIFF_BYTE_COUNT: usize = 2048;

/// Number of leading lines examined when sniffing text.
const SNIFF_LINE_COUNT: usize = 8;

/// First switch byte used when the source has none: 8' range, saw wave on,
/// pulse off and chorus off (bits 1, 4 and 5).
pub const DEFAULT_SWITCH_1: u8 = 0x32;

/// Second switch byte used when the source has none: HPF step 2 (inverted
/// field value 1 in bits 3-4), PWM from the LFO, VCA from the envelope and
/// positive VCF polarity.
pub const DEFAULT_SWITCH_2: u8 = 0x08;

lazy_static! {
    static ref LISTING_LINE: Regex =
        Regex::new(r"\[\s*[0-9A-Fa-f]{2}(?:\s+[0-9A-Fa-f]{2})*\s*\]").unwrap();
    static ref HEX_DUMP_LINE: Regex =
        Regex::new(r"^[0-9A-Fa-f]+:?(?:\t|\s+)[0-9A-Fa-f]{2}(?:\s+[0-9A-Fa-f]{2})*").unwrap();
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceFormat {
    Container,
    HexDump,
    AnnotatedListing,
    SysEx,
}

impl Display for SourceFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            SourceFormat::Container => "container",
            SourceFormat::HexDump => "hex dump",
            SourceFormat::AnnotatedListing => "annotated listing",
            SourceFormat::SysEx => "SysEx",
        };
        f.write_str(msg)
    }
}

/// The source matched none of the known formats.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnrecognizedFormatError {
    pub source_name: Option<String>,
}

impl Display for UnrecognizedFormatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.source_name {
            Some(name) => write!(f, "{name} is not a recognized Juno-106 dump"),
            None => f.write_str("Not a recognized Juno-106 dump"),
        }
    }
}

impl std::error::Error for UnrecognizedFormatError {}

impl UnrecognizedFormatError {
    pub fn into_io_error(self) -> Error {
        Error::new(ErrorKind::InvalidData, self)
    }

    /// Determine if an I/O error was caused by an unrecognized format.
    pub fn is(error: &Error) -> bool {
        error
            .get_ref()
            .map_or(false, |inner| inner.is::<UnrecognizedFormatError>())
    }
}

/// Order of the two hex digits that make up one byte in a nibble dump.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NibbleOrder {
    #[default]
    HighFirst,
    LowFirst,
}

impl NibbleOrder {
    /// Join two nibble tokens into one byte. Only the low four bits of the low
    /// nibble are used.
    pub fn combine(&self, first: u8, second: u8) -> u8 {
        let (high, low) = match self {
            NibbleOrder::HighFirst => (first, second),
            NibbleOrder::LowFirst => (second, first),
        };
        (high << 4) | (low & 0x0f)
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct ContainerLayout {
    /// Drop librarian entries such as "Library" that are not patches.
    pub skip_metadata_entries: bool,

    /// Put the slot code in front of names that do not start with it.
    pub prefix_slot_codes: bool,
}

/// A hex dump where each parameter byte is split over two tokens. Recombined
/// bytes are limited to seven bits.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct NibbleLayout {
    pub order: NibbleOrder,

    /// The dump does not hold the switch bytes so these are used.
    pub default_switch1: u8,
    pub default_switch2: u8,

    /// Skip the 16 byte header when the dump starts with a container magic.
    pub skip_container_header: bool,
}

impl NibbleLayout {
    /// Tokens that make up one patch.
    pub const STRIDE: usize = 32;
}

impl Default for NibbleLayout {
    fn default() -> Self {
        Self {
            order: NibbleOrder::HighFirst,
            default_switch1: DEFAULT_SWITCH_1,
            default_switch2: DEFAULT_SWITCH_2,
            skip_container_header: true,
        }
    }
}

/// A hex dump of plain bytes with a fixed stride per patch.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct RawLayout {
    /// Bytes per patch. The patch data is at the start of the stride.
    pub stride: usize,

    pub skip_container_header: bool,
}

impl Default for RawLayout {
    fn default() -> Self {
        Self {
            stride: 32,
            skip_container_header: true,
        }
    }
}

/// How to decode a source.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FormatVariant {
    Container(ContainerLayout),
    NibbleHexDump(NibbleLayout),
    RawHexDump(RawLayout),
    AnnotatedListing,
    SysEx,
}

impl FormatVariant {
    pub fn source_format(&self) -> SourceFormat {
        match self {
            FormatVariant::Container(_) => SourceFormat::Container,
            FormatVariant::NibbleHexDump(_) | FormatVariant::RawHexDump(_) => {
                SourceFormat::HexDump
            }
            FormatVariant::AnnotatedListing => SourceFormat::AnnotatedListing,
            FormatVariant::SysEx => SourceFormat::SysEx,
        }
    }
}

impl From<SourceFormat> for FormatVariant {
    /// The usual layout for the format.
    fn from(format: SourceFormat) -> Self {
        match format {
            SourceFormat::Container => FormatVariant::Container(Default::default()),
            SourceFormat::HexDump => FormatVariant::NibbleHexDump(Default::default()),
            SourceFormat::AnnotatedListing => FormatVariant::AnnotatedListing,
            SourceFormat::SysEx => FormatVariant::SysEx,
        }
    }
}

/// Identify the format of a source from its first bytes.
pub fn sniff(data: &[u8]) -> Result<SourceFormat, UnrecognizedFormatError> {
    if data.starts_with(CONTAINER_MAGIC) {
        debug!("Found container magic");
        return Ok(SourceFormat::Container);
    }
    if data.starts_with(&[SYSEX_START, ROLAND_ID]) {
        debug!("Found Roland SysEx");
        return Ok(SourceFormat::SysEx);
    }

    let head = &data[..data.len().min(SNIFF_BYTE_COUNT)];
    let text = String::from_utf8_lossy(head);
    let lines: Vec<&str> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(SNIFF_LINE_COUNT)
        .collect();

    // Listings are checked first because their lines may also start with a
    // number followed by hex bytes.
    if lines.iter().any(|line| LISTING_LINE.is_match(line)) {
        debug!("Found bracketed hex run");
        return Ok(SourceFormat::AnnotatedListing);
    }
    if lines.iter().any(|line| HEX_DUMP_LINE.is_match(line)) {
        debug!("Found hex dump row");
        return Ok(SourceFormat::HexDump);
    }

    Err(UnrecognizedFormatError { source_name: None })
}
