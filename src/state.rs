//! Normalized view of a patch.
//!
//! The parameter state is a single self-closing element with one attribute per
//! setting, for example:
//!
//! ```text
//! <Parameters lfoRate="0.15748031" ... hpfFreq="2" />
//! ```

use std::fmt::{Display, Formatter};

use strum::IntoEnumIterator;
use uom::si::f64::Ratio;
use uom::si::ratio::ratio;

use crate::patch::{Parameter, PatchRecord};
use crate::switches::{Chorus, Switches};
use crate::PARAMETER_COUNT;

const STATE_ELEMENT: &str = "Parameters";

/// Digits after the decimal point of normalized values.
const STATE_PRECISION: usize = 8;

#[derive(Clone, Debug, PartialEq)]
pub struct PatchState {
    /// Slider positions from zero to one, in [`Parameter`] order.
    pub values: [Ratio; PARAMETER_COUNT],
    pub switches: Switches,
}

impl PatchState {
    pub fn value(&self, parameter: Parameter) -> Ratio {
        self.values[parameter.index()]
    }

    /// Attribute names and values in the order they are written.
    pub fn attributes(&self) -> Vec<(&'static str, String)> {
        let flag = |on: bool| String::from(if on { "1" } else { "0" });
        let switches = &self.switches;

        let mut attributes: Vec<(&'static str, String)> = Parameter::iter()
            .map(|parameter| {
                let value = self.value(parameter).get::<ratio>();
                (parameter.key(), format!("{value:.STATE_PRECISION$}"))
            })
            .collect();
        attributes.extend([
            ("dcoRange", switches.range.id().to_string()),
            ("pulseOn", flag(switches.pulse)),
            ("sawOn", flag(switches.saw)),
            ("chorus1", flag(switches.chorus == Chorus::One)),
            ("chorus2", flag(switches.chorus == Chorus::Two)),
            ("pwmMode", flag(switches.pwm_mode)),
            ("vcaMode", flag(switches.vca_mode)),
            ("vcfPolarity", flag(switches.vcf_polarity)),
            ("hpfFreq", switches.hpf.step().to_string()),
        ]);
        attributes
    }
}

impl From<&PatchRecord> for PatchState {
    fn from(record: &PatchRecord) -> Self {
        let values = record.parameters.map(|value| {
            Ratio::new::<ratio>(value as f64 / PatchRecord::PARAMETER_MAX as f64)
        });
        Self {
            values,
            switches: record.switches(),
        }
    }
}

impl Display for PatchState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{STATE_ELEMENT}")?;
        for (key, value) in self.attributes() {
            write!(f, " {key}=\"{value}\"")?;
        }
        f.write_str(" />")
    }
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;

    use crate::switches::DcoRange;
    use crate::PATCH_DATA_LENGTH;

    use super::*;

    fn record(parameters: [u8; PARAMETER_COUNT], switch1: u8, switch2: u8) -> PatchRecord {
        let mut block = [0; PATCH_DATA_LENGTH];
        block[..PARAMETER_COUNT].copy_from_slice(&parameters);
        block[16] = switch1;
        block[17] = switch2;
        PatchRecord::from_block("A11", &block)
    }

    #[test]
    fn normalized_values() {
        let mut parameters = [0; PARAMETER_COUNT];
        parameters[Parameter::VcfFrequency.index()] = 127;
        parameters[Parameter::Resonance.index()] = 20;
        let state = PatchState::from(&record(parameters, 0, 0));
        assert_relative_eq!(state.value(Parameter::VcfFrequency).get::<ratio>(), 1.0);
        assert_relative_eq!(
            state.value(Parameter::Resonance).get::<ratio>(),
            20.0 / 127.0
        );
        assert_eq!(state.value(Parameter::LfoRate).get::<ratio>(), 0.0);
    }

    #[test]
    fn attribute_order() {
        let state = PatchState::from(&record([0; PARAMETER_COUNT], 0, 0));
        let keys: Vec<&str> = state.attributes().iter().map(|(key, _)| *key).collect();
        assert_eq!(keys.len(), PARAMETER_COUNT + 9);
        assert_eq!(keys[0], "lfoRate");
        assert_eq!(keys[15], "subOsc");
        assert_eq!(keys[16], "dcoRange");
        assert_eq!(keys[24], "hpfFreq");
    }

    #[test]
    fn switch_attributes() {
        let state = PatchState::from(&record([0; PARAMETER_COUNT], 0x32, 0x08));
        assert_eq!(state.switches.range, DcoRange::Feet8);
        let attributes = state.attributes();
        let get = |key: &str| {
            attributes
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.as_str())
                .unwrap()
        };
        assert_eq!(get("dcoRange"), "1");
        assert_eq!(get("pulseOn"), "0");
        assert_eq!(get("sawOn"), "1");
        assert_eq!(get("chorus1"), "0");
        assert_eq!(get("chorus2"), "0");
        assert_eq!(get("hpfFreq"), "2");
    }

    #[test]
    fn display() {
        let mut parameters = [0; PARAMETER_COUNT];
        parameters[0] = 127;
        let text = PatchState::from(&record(parameters, 0x40, 0x18)).to_string();
        assert!(text.starts_with("<Parameters lfoRate=\"1.00000000\" lfoDelay=\"0.00000000\""));
        assert!(text.contains(" dcoRange=\"2\""));
        assert!(text.contains(" chorus1=\"1\" chorus2=\"0\""));
        assert!(text.ends_with(" hpfFreq=\"0\" />"));
    }
}
