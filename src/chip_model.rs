//! SID chip model selection
//!
//! The 6581 and 8580 share the oscillator design but differ in their combined
//! waveform crosstalk, DAC ladder, output latching and a handful of timing
//! constants. All model-dependent numbers live here.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::SidError;

/// SID chip model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChipModel {
    /// Original NMOS SID (1982)
    #[default]
    #[serde(alias = "6581")]
    Mos6581,
    /// HMOS-II revision (1987)
    #[serde(alias = "8580")]
    Mos8580,
}

/// Common C64 system clock frequencies in Hz
pub mod clock {
    /// PAL C64 (~985 kHz)
    pub const PAL: u32 = 985_248;
    /// NTSC C64 (~1.02 MHz)
    pub const NTSC: u32 = 1_022_727;
}

impl ChipModel {
    /// Both supported models, in selector order
    pub const ALL: [ChipModel; 2] = [ChipModel::Mos6581, ChipModel::Mos8580];

    /// Table slot for this model
    #[inline]
    pub(crate) const fn index(self) -> usize {
        match self {
            ChipModel::Mos6581 => 0,
            ChipModel::Mos8580 => 1,
        }
    }

    /// Cycles with TEST held before the noise shift register resets to all ones
    pub const fn shift_register_reset_cycles(self) -> i32 {
        match self {
            ChipModel::Mos6581 => 35_000,
            ChipModel::Mos8580 => 2_519_864,
        }
    }

    /// Cycles the DAC input keeps its last value after the waveform is deselected
    pub const fn floating_output_ttl_cycles(self) -> i32 {
        match self {
            ChipModel::Mos6581 => 182_000,
            ChipModel::Mos8580 => 4_400_000,
        }
    }

    /// DAC value the voice output is centred around
    pub const fn wave_zero(self) -> i32 {
        match self {
            ChipModel::Mos6581 => 0x380,
            ChipModel::Mos8580 => 0x800,
        }
    }

    /// Noise + pulse combination correction
    ///
    /// Selecting noise and pulse together drives the shared output lines
    /// against each other. The 6581 only lets a pattern through when the top
    /// nibble is fully set; the 8580 pulls each bit down by its neighbour.
    #[inline]
    pub fn noise_pulse(self, output: u16) -> u16 {
        match self {
            ChipModel::Mos6581 => {
                if output < 0xf00 {
                    0
                } else {
                    output & (output << 1) & (output << 2) & 0xfff
                }
            }
            ChipModel::Mos8580 => {
                if output < 0xfc0 {
                    output & (output << 1) & 0xfff
                } else {
                    0xfc0
                }
            }
        }
    }
}

impl TryFrom<u8> for ChipModel {
    type Error = SidError;

    /// Numeric selector as used by plugin hosts: 0 = 6581, 1 = 8580
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ChipModel::Mos6581),
            1 => Ok(ChipModel::Mos8580),
            other => Err(SidError::UnknownChipModel(other)),
        }
    }
}

impl FromStr for ChipModel {
    type Err = SidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "6581" | "mos6581" => Ok(ChipModel::Mos6581),
            "8580" | "mos8580" => Ok(ChipModel::Mos8580),
            _ => Err(SidError::UnknownChipModelName(s.to_string())),
        }
    }
}

impl fmt::Display for ChipModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChipModel::Mos6581 => write!(f, "MOS 6581"),
            ChipModel::Mos8580 => write!(f, "MOS 8580"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_conversion() {
        assert_eq!(ChipModel::try_from(0).unwrap(), ChipModel::Mos6581);
        assert_eq!(ChipModel::try_from(1).unwrap(), ChipModel::Mos8580);
        assert!(matches!(
            ChipModel::try_from(2),
            Err(SidError::UnknownChipModel(2))
        ));
    }

    #[test]
    fn test_name_parsing() {
        assert_eq!("6581".parse::<ChipModel>().unwrap(), ChipModel::Mos6581);
        assert_eq!(" MOS8580 ".parse::<ChipModel>().unwrap(), ChipModel::Mos8580);
        assert!("6582".parse::<ChipModel>().is_err());
    }

    #[test]
    fn test_noise_pulse_6581() {
        assert_eq!(ChipModel::Mos6581.noise_pulse(0xff0), 0xfc0);
        assert_eq!(ChipModel::Mos6581.noise_pulse(0xef0), 0);
        assert_eq!(ChipModel::Mos6581.noise_pulse(0), 0);
    }

    #[test]
    fn test_noise_pulse_8580() {
        assert_eq!(ChipModel::Mos8580.noise_pulse(0xff0), 0xfc0);
        assert_eq!(ChipModel::Mos8580.noise_pulse(0xaa0), 0);
        assert_eq!(ChipModel::Mos8580.noise_pulse(0x6f0), 0x4e0);
    }

    #[test]
    fn test_model_constants() {
        assert_eq!(ChipModel::Mos6581.wave_zero(), 0x380);
        assert_eq!(ChipModel::Mos8580.wave_zero(), 0x800);
        assert!(
            ChipModel::Mos8580.shift_register_reset_cycles()
                > ChipModel::Mos6581.shift_register_reset_cycles()
        );
        assert_eq!(ChipModel::default(), ChipModel::Mos6581);
    }
}
