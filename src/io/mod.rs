//! Reading dumps and writing recovered patches.
//!
//! Functionality that touches byte streams should be confined to this module
//! where possible.
//!
//! # Container Format
//!
//! A `.106` container starts with the six byte literal `!j106\`. Each entry
//! that follows is a name ended by a zero byte and then the eighteen bytes of
//! patch data. Some librarians wrote fixed width names of sixteen bytes with
//! no terminator.

pub use self::names::*;
pub use self::read::*;
pub use self::source::*;
pub use self::write::*;

mod names;
mod read;
mod source;
pub mod sysex;
mod write;
