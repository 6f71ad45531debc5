//! The two switch bytes that follow the sixteen sliders in a patch.
//!
//! Each bit, or small group of bits, is an independent setting. The position
//! of every setting is described once in [`SwitchField::layout`] and both
//! decoding and encoding go through that table.
//!
//! | Byte | Bits | Setting |
//! |------|------|---------|
//! | 1    | 0    | DCO range 16' |
//! | 1    | 1    | DCO range 8' |
//! | 1    | 3    | Pulse wave |
//! | 1    | 4    | Saw wave |
//! | 1    | 5    | Chorus off |
//! | 1    | 6    | Chorus mode I, clear for mode II |
//! | 2    | 0    | PWM mode |
//! | 2    | 1    | VCA mode |
//! | 2    | 2    | VCF envelope polarity |
//! | 2    | 3-4  | HPF step, stored inverted |

use std::fmt::{Display, Formatter};

use strum_macros::{EnumIter, FromRepr};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SwitchByte {
    First,
    Second,
}

/// Location of a setting within one of the switch bytes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BitField {
    pub byte: SwitchByte,
    pub shift: u8,
    pub width: u8,
}

impl BitField {
    const fn new(byte: SwitchByte, shift: u8, width: u8) -> Self {
        Self { byte, shift, width }
    }

    pub const fn mask(&self) -> u8 {
        ((1u16 << self.width) - 1) as u8
    }

    pub fn get(&self, switch1: u8, switch2: u8) -> u8 {
        let byte = match self.byte {
            SwitchByte::First => switch1,
            SwitchByte::Second => switch2,
        };
        (byte >> self.shift) & self.mask()
    }

    pub fn is_set(&self, switch1: u8, switch2: u8) -> bool {
        self.get(switch1, switch2) != 0
    }

    /// Replace the bits of the field. Bits outside of the field are kept.
    pub fn put(&self, switch1: &mut u8, switch2: &mut u8, value: u8) {
        let byte = match self.byte {
            SwitchByte::First => switch1,
            SwitchByte::Second => switch2,
        };
        let mask = self.mask() << self.shift;
        *byte = (*byte & !mask) | ((value << self.shift) & mask);
    }
}

#[derive(Clone, Copy, Debug, EnumIter, Eq, PartialEq)]
pub enum SwitchField {
    Range16,
    Range8,
    Pulse,
    Saw,
    ChorusOff,
    ChorusMode,
    PwmMode,
    VcaMode,
    VcfPolarity,
    HpfFreq,
}

impl SwitchField {
    pub const fn layout(&self) -> BitField {
        use SwitchByte::*;
        use SwitchField::*;
        match self {
            Range16 => BitField::new(First, 0, 1),
            Range8 => BitField::new(First, 1, 1),
            Pulse => BitField::new(First, 3, 1),
            Saw => BitField::new(First, 4, 1),
            ChorusOff => BitField::new(First, 5, 1),
            ChorusMode => BitField::new(First, 6, 1),
            PwmMode => BitField::new(Second, 0, 1),
            VcaMode => BitField::new(Second, 1, 1),
            VcfPolarity => BitField::new(Second, 2, 1),
            HpfFreq => BitField::new(Second, 3, 2),
        }
    }
}

/// Footage of the oscillator.
#[derive(Clone, Copy, Debug, Default, EnumIter, Eq, FromRepr, PartialEq)]
#[repr(u8)]
pub enum DcoRange {
    // The discriminants are the values used in the attribute state.
    Feet16 = 0,
    #[default]
    Feet8 = 1,
    Feet4 = 2,
}

/// Range bits in priority order. The first set bit wins, so a byte with both
/// range bits set is 16'. With neither set the range is 4'.
const DCO_RANGE_PRIORITY: [(SwitchField, DcoRange); 2] = [
    (SwitchField::Range16, DcoRange::Feet16),
    (SwitchField::Range8, DcoRange::Feet8),
];

impl DcoRange {
    pub fn decode(switch1: u8) -> Self {
        DCO_RANGE_PRIORITY
            .iter()
            .find(|(field, _)| field.layout().is_set(switch1, 0))
            .map(|(_, range)| *range)
            .unwrap_or(DcoRange::Feet4)
    }

    pub fn id(&self) -> u8 {
        *self as u8
    }
}

impl Display for DcoRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            DcoRange::Feet16 => "16'",
            DcoRange::Feet8 => "8'",
            DcoRange::Feet4 => "4'",
        };
        f.write_str(msg)
    }
}

#[derive(Clone, Copy, Debug, Default, EnumIter, Eq, PartialEq)]
pub enum Chorus {
    #[default]
    Off,
    One,
    Two,
}

impl Chorus {
    pub fn decode(switch1: u8) -> Self {
        if SwitchField::ChorusOff.layout().is_set(switch1, 0) {
            Chorus::Off
        } else if SwitchField::ChorusMode.layout().is_set(switch1, 0) {
            Chorus::One
        } else {
            Chorus::Two
        }
    }

    pub fn is_enabled(&self) -> bool {
        *self != Chorus::Off
    }
}

impl Display for Chorus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            Chorus::Off => "Off",
            Chorus::One => "I",
            Chorus::Two => "II",
        };
        f.write_str(msg)
    }
}

/// Step of the high-pass filter slider, 0 to 3.
///
/// The hardware stores the step inverted: a field value of 0 is step 3 and a
/// field value of 3 is step 0.
#[derive(Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
pub struct HpfStep(u8);

impl HpfStep {
    pub const MAX: u8 = 3;

    pub fn from_field(field: u8) -> Self {
        Self(Self::MAX - (field & Self::MAX))
    }

    pub fn field(&self) -> u8 {
        Self::MAX - self.0
    }

    pub fn step(&self) -> u8 {
        self.0
    }
}

/// The settings carried by the two switch bytes.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Switches {
    pub range: DcoRange,
    pub pulse: bool,
    pub saw: bool,
    pub chorus: Chorus,
    pub pwm_mode: bool,
    pub vca_mode: bool,
    pub vcf_polarity: bool,
    pub hpf: HpfStep,
}

impl Switches {
    pub fn decode(switch1: u8, switch2: u8) -> Self {
        let flag = |field: SwitchField| field.layout().is_set(switch1, switch2);
        Self {
            range: DcoRange::decode(switch1),
            pulse: flag(SwitchField::Pulse),
            saw: flag(SwitchField::Saw),
            chorus: Chorus::decode(switch1),
            pwm_mode: flag(SwitchField::PwmMode),
            vca_mode: flag(SwitchField::VcaMode),
            vcf_polarity: flag(SwitchField::VcfPolarity),
            hpf: HpfStep::from_field(SwitchField::HpfFreq.layout().get(switch1, switch2)),
        }
    }

    /// The two switch bytes. Bits without a meaning are left clear.
    pub fn encode(&self) -> (u8, u8) {
        let mut switch1 = 0;
        let mut switch2 = 0;
        let mut put = |field: SwitchField, value: u8| {
            field.layout().put(&mut switch1, &mut switch2, value)
        };

        match self.range {
            DcoRange::Feet16 => put(SwitchField::Range16, 1),
            DcoRange::Feet8 => put(SwitchField::Range8, 1),
            DcoRange::Feet4 => {}
        }
        put(SwitchField::Pulse, self.pulse as u8);
        put(SwitchField::Saw, self.saw as u8);
        match self.chorus {
            Chorus::Off => put(SwitchField::ChorusOff, 1),
            Chorus::One => put(SwitchField::ChorusMode, 1),
            Chorus::Two => {}
        }
        put(SwitchField::PwmMode, self.pwm_mode as u8);
        put(SwitchField::VcaMode, self.vca_mode as u8);
        put(SwitchField::VcfPolarity, self.vcf_polarity as u8);
        put(SwitchField::HpfFreq, self.hpf.field());

        (switch1, switch2)
    }
}
