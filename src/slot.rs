//! Patch slots of the Juno-106 memory.
//!
//! The synth stores 128 patches in two banks of eight groups of eight. A slot
//! is labelled with the bank letter, the group and the number, for example
//! `A11` for the first patch and `B88` for the last.

use std::fmt::{Display, Formatter};
use std::io::{Error, ErrorKind};
use std::str::FromStr;

use strum_macros::{EnumIter, FromRepr};

use crate::PATCH_COUNT;

#[derive(Clone, Copy, Debug, EnumIter, Eq, FromRepr, Hash, Ord, PartialEq, PartialOrd)]
#[repr(u8)]
pub enum Bank {
    // The discriminants are the position of the bank in a full dump.
    A = 0,
    B = 1,
}

impl Bank {
    pub fn letter(&self) -> char {
        match self {
            Bank::A => 'A',
            Bank::B => 'B',
        }
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'A' => Some(Bank::A),
            'B' => Some(Bank::B),
            _ => None,
        }
    }
}

/// Position of a patch, such as `A11` or `B88`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SlotCode {
    pub bank: Bank,

    /// Group within the bank, 1 to 8.
    pub group: u8,

    /// Patch within the group, 1 to 8.
    pub number: u8,
}

impl SlotCode {
    /// Groups per bank and patches per group.
    pub const SIDE: u8 = 8;

    pub fn new(bank: Bank, group: u8, number: u8) -> Result<Self, Error> {
        if !(1..=Self::SIDE).contains(&group) || !(1..=Self::SIDE).contains(&number) {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("Slot {}{group}{number} is out of range", bank.letter()),
            ));
        }
        Ok(Self {
            bank,
            group,
            number,
        })
    }

    /// Slot for an ordinal from 0 (`A11`) to 127 (`B88`).
    pub fn from_index(index: usize) -> Option<Self> {
        if index >= PATCH_COUNT {
            return None;
        }
        let side = Self::SIDE as usize;
        let bank = Bank::from_repr((index / (side * side)) as u8)?;
        let within = index % (side * side);
        Some(Self {
            bank,
            group: (within / side) as u8 + 1,
            number: (within % side) as u8 + 1,
        })
    }

    pub fn index(&self) -> usize {
        let side = Self::SIDE as usize;
        self.bank as usize * side * side
            + (self.group as usize - 1) * side
            + (self.number as usize - 1)
    }

    /// Every slot in dump order, `A11` through `B88`.
    pub fn all() -> impl Iterator<Item = SlotCode> {
        (0..PATCH_COUNT).filter_map(SlotCode::from_index)
    }

    /// Name used when nothing could be recovered for the slot.
    pub fn placeholder_name(&self) -> String {
        format!("{self} Unknown")
    }
}

impl Display for SlotCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.bank.letter(), self.group, self.number)
    }
}

impl FromStr for SlotCode {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::new(ErrorKind::InvalidInput, format!("Invalid slot code {text:?}"));
        let mut chars = text.chars();
        let bank = chars.next().and_then(Bank::from_letter).ok_or_else(invalid)?;
        let group = chars.next().and_then(|c| c.to_digit(10)).ok_or_else(invalid)?;
        let number = chars.next().and_then(|c| c.to_digit(10)).ok_or_else(invalid)?;
        if chars.next().is_some() {
            return Err(invalid());
        }
        SlotCode::new(bank, group as u8, number as u8)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn all_in_dump_order() {
        let codes: Vec<String> = SlotCode::all().map(|slot| slot.to_string()).collect();
        assert_eq!(codes.len(), PATCH_COUNT);
        assert_eq!(codes[0], "A11");
        assert_eq!(codes[7], "A18");
        assert_eq!(codes[8], "A21");
        assert_eq!(codes[63], "A88");
        assert_eq!(codes[64], "B11");
        assert_eq!(codes[127], "B88");
    }

    #[test]
    fn index() {
        for index in 0..PATCH_COUNT {
            let slot = SlotCode::from_index(index).unwrap();
            assert_eq!(slot.index(), index);
        }
        assert!(SlotCode::from_index(PATCH_COUNT).is_none());
    }

    #[test]
    fn parse() {
        let slot: SlotCode = "B27".parse().unwrap();
        assert_eq!(slot.bank, Bank::B);
        assert_eq!(slot.group, 2);
        assert_eq!(slot.number, 7);
        assert_eq!(slot.index(), 64 + 8 + 6);

        assert!("C11".parse::<SlotCode>().is_err());
        assert!("A19".parse::<SlotCode>().is_err());
        assert!("A01".parse::<SlotCode>().is_err());
        assert!("A111".parse::<SlotCode>().is_err());
        assert!("A1".parse::<SlotCode>().is_err());
    }

    #[test]
    fn placeholder_name() {
        let slot = SlotCode::from_index(9).unwrap();
        assert_eq!(slot.placeholder_name(), "A22 Unknown");
    }
}
