use std::fmt::{Display, Formatter};

use log::debug;
use strum_macros::{EnumIter, FromRepr};

use crate::slot::SlotCode;
use crate::switches::Switches;
use crate::{PARAMETER_COUNT, PATCH_DATA_LENGTH};

/// The sixteen slider parameters in the order they are stored.
#[derive(Clone, Copy, Debug, EnumIter, Eq, FromRepr, Hash, PartialEq)]
#[repr(usize)]
pub enum Parameter {
    // The discriminants correspond to the position in the patch data.
    LfoRate = 0,
    LfoDelay,
    LfoToDco,
    PulseWidth,
    Noise,
    VcfFrequency,
    Resonance,
    EnvelopeAmount,
    LfoToVcf,
    KeyboardTracking,
    VcaLevel,
    Attack,
    Decay,
    Sustain,
    Release,
    SubOscillator,
}

impl Parameter {
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Attribute name in the parameter state.
    pub fn key(&self) -> &'static str {
        use Parameter::*;
        match self {
            LfoRate => "lfoRate",
            LfoDelay => "lfoDelay",
            LfoToDco => "lfoToDCO",
            PulseWidth => "pwm",
            Noise => "noise",
            VcfFrequency => "vcfFreq",
            Resonance => "resonance",
            EnvelopeAmount => "envAmount",
            LfoToVcf => "lfoToVCF",
            KeyboardTracking => "kybdTracking",
            VcaLevel => "vcaLevel",
            Attack => "attack",
            Decay => "decay",
            Sustain => "sustain",
            Release => "release",
            SubOscillator => "subOsc",
        }
    }
}

impl Display for Parameter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use Parameter::*;
        let msg = match self {
            LfoRate => "LFO rate",
            LfoDelay => "LFO delay",
            LfoToDco => "LFO to DCO",
            PulseWidth => "Pulse width",
            Noise => "Noise",
            VcfFrequency => "VCF frequency",
            Resonance => "Resonance",
            EnvelopeAmount => "Envelope amount",
            LfoToVcf => "LFO to VCF",
            KeyboardTracking => "Keyboard tracking",
            VcaLevel => "VCA level",
            Attack => "Attack",
            Decay => "Decay",
            Sustain => "Sustain",
            Release => "Release",
            SubOscillator => "Sub oscillator",
        };
        f.write_str(msg)
    }
}

/// One recovered patch.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PatchRecord {
    /// Usually a slot code followed by a description, such as "A11 Brass 1".
    pub name: String,

    /// Seven bit slider values in [`Parameter`] order.
    pub parameters: [u8; PARAMETER_COUNT],

    pub switch1: u8,
    pub switch2: u8,

    /// Set when the source ran out before the patch data was complete. The
    /// missing bytes are zero.
    pub incomplete: bool,
}

impl PatchRecord {
    /// The largest value of a slider.
    pub const PARAMETER_MAX: u8 = 0x7f;

    /// Create a record from the sixteen parameters followed by the two switch
    /// bytes. Parameters are limited to seven bits.
    pub fn from_block(name: impl Into<String>, block: &[u8; PATCH_DATA_LENGTH]) -> Self {
        let name = name.into();
        let mut parameters = [0; PARAMETER_COUNT];
        for (index, (parameter, byte)) in parameters.iter_mut().zip(block).enumerate() {
            if *byte > Self::PARAMETER_MAX {
                debug!("Patch {name:?} parameter {index} of {byte:#x} exceeds seven bits");
            }
            *parameter = byte & Self::PARAMETER_MAX;
        }
        Self {
            name,
            parameters,
            switch1: block[PARAMETER_COUNT],
            switch2: block[PARAMETER_COUNT + 1],
            incomplete: false,
        }
    }

    /// Create a record from however many bytes are available, zero filling
    /// the rest. The record is marked incomplete when bytes are missing.
    pub fn from_partial(name: impl Into<String>, bytes: &[u8]) -> Self {
        let mut block = [0; PATCH_DATA_LENGTH];
        let available = bytes.len().min(PATCH_DATA_LENGTH);
        block[..available].copy_from_slice(&bytes[..available]);
        Self {
            incomplete: available < PATCH_DATA_LENGTH,
            ..Self::from_block(name, &block)
        }
    }

    /// An all zero record for a slot that has no data.
    pub fn placeholder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            incomplete: true,
            ..Default::default()
        }
    }

    pub fn parameter(&self, parameter: Parameter) -> u8 {
        self.parameters[parameter.index()]
    }

    /// The eighteen bytes as stored by the synth.
    pub fn block(&self) -> [u8; PATCH_DATA_LENGTH] {
        let mut block = [0; PATCH_DATA_LENGTH];
        block[..PARAMETER_COUNT].copy_from_slice(&self.parameters);
        block[PARAMETER_COUNT] = self.switch1;
        block[PARAMETER_COUNT + 1] = self.switch2;
        block
    }

    pub fn switches(&self) -> Switches {
        Switches::decode(self.switch1, self.switch2)
    }

    /// The slot the name starts with, if any.
    pub fn slot_code(&self) -> Option<SlotCode> {
        self.name.get(..3).and_then(|code| code.parse().ok())
    }
}

#[cfg(test)]
mod test {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn parameter_order() {
        let parameters: Vec<Parameter> = Parameter::iter().collect();
        assert_eq!(parameters.len(), PARAMETER_COUNT);
        for (index, parameter) in parameters.iter().enumerate() {
            assert_eq!(parameter.index(), index);
            assert_eq!(Parameter::from_repr(index), Some(*parameter));
        }
        assert_eq!(parameters[0], Parameter::LfoRate);
        assert_eq!(parameters[15], Parameter::SubOscillator);
    }

    #[test]
    fn from_block() {
        let mut block = [0u8; PATCH_DATA_LENGTH];
        for (index, byte) in block.iter_mut().enumerate() {
            *byte = index as u8;
        }
        block[3] = 0xff;
        block[16] = 0x32;
        block[17] = 0x88;

        let record = PatchRecord::from_block("A11 Brass", &block);
        assert_eq!(record.name, "A11 Brass");
        assert_eq!(record.parameter(Parameter::LfoDelay), 1);
        assert_eq!(record.parameter(Parameter::PulseWidth), 0x7f);
        assert_eq!(record.parameter(Parameter::SubOscillator), 15);
        assert_eq!(record.switch1, 0x32);
        assert_eq!(record.switch2, 0x88, "switch bytes are kept whole");
        assert!(!record.incomplete);
        assert_eq!(record.block()[17], 0x88);
    }

    #[test]
    fn from_partial() {
        let record = PatchRecord::from_partial("A12", &[1, 2, 3]);
        assert!(record.incomplete);
        assert_eq!(&record.block()[..4], &[1, 2, 3, 0]);
        assert_eq!(record.switch1, 0);

        let record = PatchRecord::from_partial("A13", &[5; 20]);
        assert!(!record.incomplete);
        assert_eq!(record.block(), [5; PATCH_DATA_LENGTH]);
    }

    #[test]
    fn slot_code() {
        assert_eq!(
            PatchRecord::placeholder("B27 Organ").slot_code(),
            Some("B27".parse().unwrap())
        );
        assert_eq!(PatchRecord::placeholder("Empty").slot_code(), None);
        assert_eq!(PatchRecord::placeholder("").slot_code(), None);
    }
}
