//! Oscillator ring configuration

use serde::{Deserialize, Serialize};

use crate::chip_model::{clock, ChipModel};
use crate::{Result, SidError};

/// How [`SyncRing::advance`](crate::SyncRing::advance) spends a span of cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplingMethod {
    /// Clock every cycle (noise pipeline, comparator delay, write-back)
    #[default]
    Exact,
    /// Delta clocking between sync edges; cheaper, slightly less exact
    Fast,
}

/// Ring configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SidConfig {
    /// Chip model of all three voices
    pub chip_model: ChipModel,

    /// System clock in Hz, used for Hz -> FREQ conversion
    pub clock_frequency: u32,

    /// Clocking discipline for multi-cycle advances
    pub sampling: SamplingMethod,
}

impl SidConfig {
    /// PAL C64 configuration
    pub fn pal(chip_model: ChipModel) -> Self {
        SidConfig {
            chip_model,
            clock_frequency: clock::PAL,
            sampling: SamplingMethod::Exact,
        }
    }

    /// NTSC C64 configuration
    pub fn ntsc(chip_model: ChipModel) -> Self {
        SidConfig {
            chip_model,
            clock_frequency: clock::NTSC,
            sampling: SamplingMethod::Exact,
        }
    }

    /// Builder: clocking discipline
    pub fn with_sampling(mut self, sampling: SamplingMethod) -> Self {
        self.sampling = sampling;
        self
    }

    /// Check the configuration for values the ring cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.clock_frequency == 0 {
            return Err(SidError::ConfigError(
                "clock_frequency must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SidConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for SidConfig {
    fn default() -> Self {
        Self::pal(ChipModel::Mos6581)
    }
}
