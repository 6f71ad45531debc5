//! The [Roland Juno-106](https://en.wikipedia.org/wiki/Roland_Juno-106) is a
//! polyphonic analog synth from 1984. It stores 128 patches of 18 bytes each,
//! organized as two banks of eight groups of eight.
//!
//! Patch banks survive in librarian containers, hex dump text, annotated
//! listings and SysEx captures. This library recovers the patches from any of
//! them and writes them as SysEx, a JSON preset library, a C table or plain
//! text.
//!
//! ```no_run
//! use juno106_recover::{decode_sniffed, write_sysex, Source};
//!
//! let source = Source::read_file("factory.106")?;
//! let decoded = decode_sniffed(&source)?;
//! println!("{}", decoded.report);
//! write_sysex(&mut std::io::stdout(), &decoded.records, 0)?;
//! # Ok::<(), std::io::Error>(())
//! ```

pub use anomaly::*;
pub use io::*;
pub use patch::*;
pub use slot::*;
pub use state::*;
pub use switches::*;

mod anomaly;
pub mod format;
mod io;
pub mod job;
mod patch;
mod slot;
mod state;
mod switches;
mod text;

/// Patches held in the memory of the synth.
pub const PATCH_COUNT: usize = 128;

/// Sliders and knobs stored as one byte each.
pub const PARAMETER_COUNT: usize = 16;

/// The parameters followed by the two switch bytes.
pub const PATCH_DATA_LENGTH: usize = PARAMETER_COUNT + 2;

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    pub(crate) fn test_data_path(components: &[&str]) -> PathBuf {
        let mut parts = vec!["tests"];
        parts.extend_from_slice(components);
        parts.iter().collect::<PathBuf>()
    }
}
