//! Writing recovered patches.
//!
//! Every writer consumes a list of records. None of them change the records,
//! the formats only differ in presentation.

use std::io::{Result, Write};

use log::trace;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Serializer;

use crate::io::sysex::SysExMessage;
use crate::patch::PatchRecord;
use crate::slot::SlotCode;
use crate::state::PatchState;
use crate::text::escape_c_string;
use crate::{PATCH_COUNT, PATCH_DATA_LENGTH};

/// The patch number in a dump is not used when loading so it is always zero.
const SYSEX_PATCH_NUMBER: u8 = 0;

const TABLE_STRUCT: &str = "FactoryPresetData";
const TABLE_ARRAY: &str = "junoFactoryPresets";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LibraryJson<'a> {
    library_name: &'a str,
    presets: Vec<PresetJson>,
}

#[derive(Debug, Serialize)]
struct PresetJson {
    name: String,
    state: String,
}

/// One patch dump message per record.
pub fn write_sysex<W: Write>(writer: &mut W, records: &[PatchRecord], channel: u8) -> Result<()> {
    for record in records {
        let message = SysExMessage::patch_dump(channel, SYSEX_PATCH_NUMBER, &record.block());
        writer.write_all(&message.to_bytes())?;
    }
    trace!("Wrote {} SysEx patch dumps", records.len());
    Ok(())
}

/// A JSON preset library where each preset carries its attribute state.
pub fn write_json_library<W: Write>(
    writer: &mut W,
    library_name: &str,
    records: &[PatchRecord],
) -> Result<()> {
    let library = LibraryJson {
        library_name,
        presets: records
            .iter()
            .map(|record| PresetJson {
                name: record.name.clone(),
                state: PatchState::from(record).to_string(),
            })
            .collect(),
    };

    let formatter = PrettyFormatter::with_indent(b"  ");
    let mut serializer = Serializer::with_formatter(&mut *writer, formatter);
    library.serialize(&mut serializer)?;
    writer.write_all(b"\n")
}

/// The name and attribute state of each record, one per line.
pub fn write_state_list<W: Write>(writer: &mut W, records: &[PatchRecord]) -> Result<()> {
    for record in records {
        writeln!(writer, "{}\t{}", record.name, PatchState::from(record))?;
    }
    Ok(())
}

/// Exactly one entry per slot. Slots beyond the records get a placeholder
/// name and zero data.
pub fn table_entries(records: &[PatchRecord]) -> Vec<(String, [u8; PATCH_DATA_LENGTH])> {
    SlotCode::all()
        .map(|slot| match records.get(slot.index()) {
            Some(record) => (record.name.clone(), record.block()),
            None => (slot.placeholder_name(), [0; PATCH_DATA_LENGTH]),
        })
        .collect()
}

/// A C header declaring a static table of all 128 patches.
pub fn write_table<W: Write>(writer: &mut W, records: &[PatchRecord]) -> Result<()> {
    writeln!(writer, "#pragma once")?;
    writeln!(writer)?;
    writeln!(writer, "struct {TABLE_STRUCT} {{")?;
    writeln!(writer, "    const char* name;")?;
    writeln!(writer, "    unsigned char bytes[{PATCH_DATA_LENGTH}];")?;
    writeln!(writer, "}};")?;
    writeln!(writer)?;
    writeln!(writer, "/**")?;
    writeln!(writer, " * Roland Juno-106 patches, banks A and B.")?;
    writeln!(writer, " */")?;
    writeln!(writer, "static const {TABLE_STRUCT} {TABLE_ARRAY}[{PATCH_COUNT}] = {{")?;
    for (name, block) in table_entries(records) {
        let bytes: Vec<String> = block.iter().map(|byte| format!("0x{byte:02X}")).collect();
        writeln!(
            writer,
            "    {{\"{}\", {{{}}}}},",
            escape_c_string(&name),
            bytes.join(",")
        )?;
    }
    writeln!(writer, "}};")
}
