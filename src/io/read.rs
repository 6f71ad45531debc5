//! Decoding patch records from each source format.

use std::io::{Cursor, Error, ErrorKind, Read, Seek, SeekFrom};

use lazy_static::lazy_static;
use log::{debug, trace, warn};
use regex::Regex;

use crate::anomaly::{Anomaly, DecodeReport};
use crate::format::*;
use crate::io::names::{container_name, parse_hex_token, recover_listing_names, NAME_WINDOW};
use crate::io::source::Source;
use crate::io::sysex::{SysExMessage, SysExReader};
use crate::patch::PatchRecord;
use crate::slot::SlotCode;
use crate::text::clean_name;
use crate::{PARAMETER_COUNT, PATCH_COUNT, PATCH_DATA_LENGTH};

/// Bytes in one row of a hex dump. Anything after them is the ASCII column.
const HEX_DUMP_ROW_WIDTH: usize = 16;

/// Length of the header when a hex dump starts with a container header.
const DUMP_HEADER_LENGTH: usize = 16;

/// Librarian entries in a container that are not patches.
const CONTAINER_METADATA_NAMES: [&str; 4] = ["Library", "Factory Patches", "(position)", ""];

lazy_static! {
    static ref COLUMN_GAP: Regex = Regex::new(r"\s{2,}").unwrap();
    static ref ROW_OFFSET: Regex = Regex::new(r"^[0-9A-Fa-f]+:?$").unwrap();
}

/// The records recovered from one source.
#[derive(Clone, Debug, PartialEq)]
pub struct Decoded {
    pub variant: FormatVariant,
    pub records: Vec<PatchRecord>,
    pub report: DecodeReport,
}

/// Decode a source with the given strategy.
pub fn decode(source: &Source, variant: FormatVariant) -> Result<Decoded, Error> {
    debug!(
        "Decoding {} as {}",
        source.name.as_deref().unwrap_or("<unnamed>"),
        variant.source_format()
    );
    let mut report = DecodeReport::default();
    let records = match variant {
        FormatVariant::Container(layout) => decode_container(source.bytes(), &layout, &mut report)?,
        FormatVariant::NibbleHexDump(layout) => decode_nibble_dump(source, &layout, &mut report),
        FormatVariant::RawHexDump(layout) => decode_raw_dump(source, &layout, &mut report)?,
        FormatVariant::AnnotatedListing => recover_listing_names(source, &mut report)
            .into_iter()
            .map(PatchRecord::placeholder)
            .collect(),
        FormatVariant::SysEx => decode_sysex(source.bytes())?,
    };
    Ok(Decoded {
        variant,
        records,
        report,
    })
}

/// Identify the format of the source then decode it with the usual layout.
pub fn decode_sniffed(source: &Source) -> Result<Decoded, Error> {
    let format = source.sniff()?;
    decode(source, format.into())
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ContainerEntry {
    Patch {
        name: String,
        block: [u8; PATCH_DATA_LENGTH],
    },

    /// A name with less than a full block after it.
    Truncated { name: String, available: u64 },

    /// The data has ended.
    End,
}

/// Reads the entries of a `.106` container.
pub struct ContainerReader<T: Read + Seek> {
    inner: T,
    length: u64,
}

impl<T: Read + Seek> ContainerReader<T> {
    /// Check the magic at the start of the container.
    pub fn new(mut inner: T) -> Result<Self, Error> {
        let length = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(0))?;

        let mut magic = [0u8; CONTAINER_MAGIC.len()];
        inner.read_exact(&mut magic).map_err(|_| {
            Error::new(ErrorKind::InvalidData, "Container is shorter than its magic")
        })?;
        if &magic != CONTAINER_MAGIC {
            return Err(UnrecognizedFormatError { source_name: None }.into_io_error());
        }
        Ok(Self { inner, length })
    }

    pub(crate) fn stream_position(&mut self) -> Result<u64, Error> {
        self.inner.stream_position()
    }

    fn remaining(&mut self) -> Result<u64, Error> {
        Ok(self.length.saturating_sub(self.stream_position()?))
    }

    /// The next name and patch block.
    pub fn read_entry(&mut self) -> Result<ContainerEntry, Error> {
        let start = self.stream_position()?;
        if start >= self.length {
            return Ok(ContainerEntry::End);
        }

        let mut window = Vec::with_capacity(NAME_WINDOW);
        (&mut self.inner)
            .take(NAME_WINDOW as u64)
            .read_to_end(&mut window)?;
        let (name, used) = container_name(&window);
        self.inner.seek(SeekFrom::Start(start + used as u64))?;

        let available = self.remaining()?;
        if available < PATCH_DATA_LENGTH as u64 {
            return Ok(ContainerEntry::Truncated { name, available });
        }

        let mut block = [0u8; PATCH_DATA_LENGTH];
        self.inner.read_exact(&mut block)?;
        trace!("entry {name:?} at position {start}");
        Ok(ContainerEntry::Patch { name, block })
    }
}

/// Entries of a container, up to one full memory.
pub fn decode_container(
    data: &[u8],
    layout: &ContainerLayout,
    report: &mut DecodeReport,
) -> Result<Vec<PatchRecord>, Error> {
    let mut reader = ContainerReader::new(Cursor::new(data))?;
    let mut records = Vec::new();

    while records.len() < PATCH_COUNT {
        let (name, block) = match reader.read_entry()? {
            ContainerEntry::Patch { name, block } => (name, block),
            ContainerEntry::Truncated { name, available } => {
                debug!("Entry {name:?} has only {available} bytes");
                report.push(Anomaly::TruncatedData {
                    slot: records.len(),
                    available: available as usize,
                    expected: PATCH_DATA_LENGTH,
                });
                break;
            }
            ContainerEntry::End => break,
        };

        if layout.skip_metadata_entries
            && CONTAINER_METADATA_NAMES.contains(&clean_name(&name).as_str())
        {
            debug!("Skipping librarian entry {name:?}");
            continue;
        }

        let mut record = PatchRecord::from_block(name, &block);
        match SlotCode::from_index(records.len()) {
            Some(slot) if layout.prefix_slot_codes && record.slot_code() != Some(slot) => {
                record.name = format!("{slot} {}", record.name).trim().to_owned();
            }
            _ => {}
        }
        records.push(record);
    }

    debug!("Container holds {} patches", records.len());
    Ok(records)
}

/// The hex column of a dump row: everything after the offset, which is
/// followed by a tab or by whitespace. Rows without an offset are not data.
fn hex_column(line: &str) -> Option<&str> {
    let (offset, rest) = match line.split_once('\t') {
        Some((offset, rest)) => (offset, rest.split('\t').next().unwrap_or_default()),
        None => line.split_once(char::is_whitespace)?,
    };
    if !ROW_OFFSET.is_match(offset.trim()) {
        trace!("Not a dump row: {line:?}");
        return None;
    }

    // A trailing segment after a wide gap with no hex bytes at all is the
    // ASCII column. Gaps between hex bytes are kept.
    let rest = rest.trim();
    match COLUMN_GAP.find_iter(rest).last() {
        Some(gap)
            if rest[gap.end()..]
                .split_whitespace()
                .all(|token| parse_hex_token(token).is_none()) =>
        {
            Some(&rest[..gap.start()])
        }
        _ => Some(rest),
    }
}

/// The bytes of a hex dump in order. Tokens that are not hex bytes are
/// skipped.
pub fn hex_dump_bytes(source: &Source, report: &mut DecodeReport) -> Vec<u8> {
    let mut bytes = Vec::new();
    for (line_number, line) in source.lines() {
        let Some(column) = hex_column(line.trim()) else {
            continue;
        };

        let mut row = 0;
        for token in column.split_whitespace() {
            if row == HEX_DUMP_ROW_WIDTH {
                break;
            }
            match parse_hex_token(token) {
                Some(byte) => {
                    bytes.push(byte);
                    row += 1;
                }
                None => report.push(Anomaly::InvalidTokenSkip {
                    line: line_number,
                    token: token.to_owned(),
                }),
            }
        }
    }
    debug!("Hex dump holds {} bytes", bytes.len());
    bytes
}

/// Join pairs of nibble tokens into seven bit bytes. A trailing unpaired
/// token is ignored.
pub fn combine_nibbles(tokens: &[u8], order: NibbleOrder) -> Vec<u8> {
    tokens
        .chunks_exact(2)
        .map(|pair| order.combine(pair[0], pair[1]) & PatchRecord::PARAMETER_MAX)
        .collect()
}

fn strip_dump_header(bytes: &mut Vec<u8>, skip: bool) {
    if skip && bytes.starts_with(&CONTAINER_MAGIC[..2]) {
        debug!("Skipping {DUMP_HEADER_LENGTH} byte header");
        bytes.drain(..bytes.len().min(DUMP_HEADER_LENGTH));
    }
}

/// Slot `index` of a dump split into `stride` sized chunks, possibly short.
fn stride_chunk(bytes: &[u8], index: usize, stride: usize) -> &[u8] {
    let start = (index * stride).min(bytes.len());
    let end = (start + stride).min(bytes.len());
    &bytes[start..end]
}

/// Always 128 records. The switch bytes come from the layout.
pub fn decode_nibble_dump(
    source: &Source,
    layout: &NibbleLayout,
    report: &mut DecodeReport,
) -> Vec<PatchRecord> {
    let mut tokens = hex_dump_bytes(source, report);
    strip_dump_header(&mut tokens, layout.skip_container_header);

    SlotCode::all()
        .map(|slot| {
            let index = slot.index();
            let chunk = stride_chunk(&tokens, index, NibbleLayout::STRIDE);
            let parameters = combine_nibbles(chunk, layout.order);
            if chunk.len() == NibbleLayout::STRIDE {
                let mut block = [0; PATCH_DATA_LENGTH];
                block[..PARAMETER_COUNT].copy_from_slice(&parameters);
                block[PARAMETER_COUNT] = layout.default_switch1;
                block[PARAMETER_COUNT + 1] = layout.default_switch2;
                PatchRecord::from_block(slot.placeholder_name(), &block)
            } else {
                report.push(Anomaly::TruncatedData {
                    slot: index,
                    available: chunk.len(),
                    expected: NibbleLayout::STRIDE,
                });
                PatchRecord::from_partial(slot.placeholder_name(), &parameters)
            }
        })
        .collect()
}

/// Always 128 records, each the start of a fixed stride.
pub fn decode_raw_dump(
    source: &Source,
    layout: &RawLayout,
    report: &mut DecodeReport,
) -> Result<Vec<PatchRecord>, Error> {
    if layout.stride < PATCH_DATA_LENGTH {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            format!(
                "Stride of {} is shorter than a patch of {PATCH_DATA_LENGTH} bytes",
                layout.stride
            ),
        ));
    }

    let mut bytes = hex_dump_bytes(source, report);
    strip_dump_header(&mut bytes, layout.skip_container_header);

    Ok(SlotCode::all()
        .map(|slot| {
            let index = slot.index();
            let chunk = stride_chunk(&bytes, index, layout.stride);
            if chunk.len() < PATCH_DATA_LENGTH {
                report.push(Anomaly::TruncatedData {
                    slot: index,
                    available: chunk.len(),
                    expected: PATCH_DATA_LENGTH,
                });
            }
            PatchRecord::from_partial(slot.placeholder_name(), chunk)
        })
        .collect())
}

/// Patch dumps in a SysEx stream, in the order they appear.
pub fn decode_sysex(data: &[u8]) -> Result<Vec<PatchRecord>, Error> {
    let mut records = Vec::new();
    for message in SysExReader::new(data) {
        let message = message?;
        match SysExMessage::parse(&message) {
            Ok(SysExMessage::PatchDump { block, .. }) => {
                let Some(slot) = SlotCode::from_index(records.len()) else {
                    warn!("Ignoring patch dumps after the first {PATCH_COUNT}");
                    break;
                };
                records.push(PatchRecord::from_block(slot.placeholder_name(), &block));
            }
            Ok(other) => debug!("Ignoring {other:?}"),
            Err(error) => debug!("Ignoring message: {error}"),
        }
    }
    debug!("SysEx holds {} patches", records.len());
    Ok(records)
}
