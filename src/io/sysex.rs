//! Juno-106 System Exclusive messages.
//!
//! | Message          | Bytes |
//! |------------------|-------|
//! | Patch dump       | `F0 41 30 <channel> <patch> <18 bytes> F7` |
//! | Manual mode      | `F0 41 31 <channel> 00 F7` |
//! | Parameter change | `F0 41 32 <channel> <parameter> <value> F7` |

use std::io::{Error, ErrorKind, Read};

use byteorder::ReadBytesExt;
use log::{debug, trace};
use strum_macros::FromRepr;

use crate::PATCH_DATA_LENGTH;

pub const SYSEX_START: u8 = 0xf0;
pub const SYSEX_END: u8 = 0xf7;
pub const ROLAND_ID: u8 = 0x41;

/// Length of a complete patch dump message including the framing.
pub const PATCH_DUMP_LENGTH: usize = 5 + PATCH_DATA_LENGTH + 1;

/// Highest parameter number in a parameter change. Numbers up to 0x0f are the
/// sliders, 0x10 and 0x11 are the switch bytes.
pub const PARAMETER_ID_MAX: u8 = 0x11;

const DATA_MASK: u8 = 0x7f;
const CHANNEL_MASK: u8 = 0x0f;

/// Longest message accepted when reading a stream.
const MESSAGE_LENGTH_MAX: usize = 256;

#[derive(Clone, Copy, Debug, Eq, FromRepr, PartialEq)]
#[repr(u8)]
pub enum MessageType {
    // The discriminants correspond to the command byte.
    PatchDump = 0x30,
    ManualMode = 0x31,
    ParameterChange = 0x32,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SysExMessage {
    PatchDump {
        channel: u8,
        patch_number: u8,
        block: [u8; PATCH_DATA_LENGTH],
    },
    ManualMode {
        channel: u8,
    },
    ParameterChange {
        channel: u8,
        parameter: u8,
        value: u8,
    },
}

impl SysExMessage {
    /// Patch dump of one block. Data bytes are limited to seven bits when
    /// written.
    pub fn patch_dump(channel: u8, patch_number: u8, block: &[u8; PATCH_DATA_LENGTH]) -> Self {
        SysExMessage::PatchDump {
            channel,
            patch_number,
            block: *block,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![SYSEX_START, ROLAND_ID];
        match self {
            SysExMessage::PatchDump {
                channel,
                patch_number,
                block,
            } => {
                bytes.push(MessageType::PatchDump as u8);
                bytes.push(channel & CHANNEL_MASK);
                bytes.push(patch_number & DATA_MASK);
                for (index, byte) in block.iter().enumerate() {
                    if byte & !DATA_MASK != 0 {
                        debug!("Dropping bit 7 of patch byte {index} ({byte:#04x})");
                    }
                    bytes.push(byte & DATA_MASK);
                }
            }
            SysExMessage::ManualMode { channel } => {
                bytes.push(MessageType::ManualMode as u8);
                bytes.push(channel & CHANNEL_MASK);
                bytes.push(0);
            }
            SysExMessage::ParameterChange {
                channel,
                parameter,
                value,
            } => {
                bytes.push(MessageType::ParameterChange as u8);
                bytes.push(channel & CHANNEL_MASK);
                bytes.push(parameter & DATA_MASK);
                bytes.push(value & DATA_MASK);
            }
        }
        bytes.push(SYSEX_END);
        bytes
    }

    /// Parse one complete message, including the start and end bytes.
    pub fn parse(message: &[u8]) -> Result<Self, Error> {
        let invalid = |msg: String| Error::new(ErrorKind::InvalidData, msg);

        if message.len() < 5
            || message[0] != SYSEX_START
            || message[message.len() - 1] != SYSEX_END
        {
            return Err(invalid(format!(
                "{} bytes are not a framed SysEx message",
                message.len()
            )));
        }
        if message[1] != ROLAND_ID {
            return Err(invalid(format!(
                "Manufacturer {:#04x} is not Roland",
                message[1]
            )));
        }
        let message_type = MessageType::from_repr(message[2])
            .ok_or_else(|| invalid(format!("Unknown message type {:#04x}", message[2])))?;
        let channel = message[3] & CHANNEL_MASK;
        let body = &message[4..message.len() - 1];

        match message_type {
            MessageType::PatchDump if body.len() == PATCH_DATA_LENGTH + 1 => {
                let mut block = [0; PATCH_DATA_LENGTH];
                block.copy_from_slice(&body[1..]);
                Ok(SysExMessage::PatchDump {
                    channel,
                    patch_number: body[0],
                    block,
                })
            }
            MessageType::ManualMode if body.len() <= 1 => Ok(SysExMessage::ManualMode { channel }),
            MessageType::ParameterChange if body.len() == 2 => {
                if body[0] > PARAMETER_ID_MAX {
                    return Err(invalid(format!("Unknown parameter {:#04x}", body[0])));
                }
                Ok(SysExMessage::ParameterChange {
                    channel,
                    parameter: body[0],
                    value: body[1],
                })
            }
            _ => Err(invalid(format!(
                "{message_type:?} message has an unexpected length of {}",
                message.len()
            ))),
        }
    }
}

/// Splits a byte stream into SysEx messages.
pub struct SysExReader<T: Read> {
    inner: T,
}

impl<T: Read> SysExReader<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// The next framed message. Bytes between messages are ignored. Returns
    /// `None` at the end of the stream.
    pub fn read_message(&mut self) -> Result<Option<Vec<u8>>, Error> {
        // Find the start
        loop {
            match self.read_byte()? {
                Some(SYSEX_START) => break,
                Some(byte) => trace!("Skipping {byte:#04x} outside of a message"),
                None => return Ok(None),
            }
        }

        let mut message = vec![SYSEX_START];
        loop {
            match self.read_byte()? {
                Some(SYSEX_END) => {
                    message.push(SYSEX_END);
                    return Ok(Some(message));
                }
                Some(byte) if message.len() < MESSAGE_LENGTH_MAX => message.push(byte),
                Some(_) => {
                    return Err(Error::new(
                        ErrorKind::InvalidData,
                        format!("SysEx message is longer than {MESSAGE_LENGTH_MAX} bytes"),
                    ))
                }
                None => {
                    debug!("Stream ended inside a message of {} bytes", message.len());
                    return Ok(None);
                }
            }
        }
    }

    fn read_byte(&mut self) -> Result<Option<u8>, Error> {
        match self.inner.read_u8() {
            Ok(byte) => Ok(Some(byte)),
            Err(error) if error.kind() == ErrorKind::UnexpectedEof => Ok(None),
            Err(error) => Err(error),
        }
    }
}

impl<T: Read> Iterator for SysExReader<T> {
    type Item = Result<Vec<u8>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_message().transpose()
    }
}
