//! MOS 6581/8580 SID waveform generator emulation
//!
//! A cycle-accurate emulation of the oscillator stage of the Commodore SID.
//! Each voice owns a 24-bit phase accumulator, a 23-bit noise LFSR and a view
//! into the per-model combined-waveform and DAC tables. Three voices are
//! wired into a hard-sync / ring-modulation ring by [`SyncRing`].
//!
//! # Features
//! - Single-cycle clocking with the noise shift pipeline and comparator delay
//! - Delta (multi-cycle) clocking for fast-forwarding
//! - Combined waveforms, noise write-back and the 8580 tri/saw output latch
//! - R-2R DAC non-linearity for both chip models
//! - Floating DAC input decay and the shift register reset countdown
//! - Serializable configuration and state snapshots
//!
//! Envelope, filter and register-address decoding of a full chip are not part
//! of this crate; the owning chip model drives the ring and mixes its output.
//!
//! # Quick start
//! ```no_run
//! use sidosc::{ChipModel, SyncRing, VoiceRegister};
//!
//! let mut ring = SyncRing::new(ChipModel::Mos6581);
//! ring.write_register(0, VoiceRegister::FreqLo, 0x44);
//! ring.write_register(0, VoiceRegister::FreqHi, 0x1d); // 440 Hz at PAL clock
//! ring.write_register(0, VoiceRegister::Control, 0x21); // sawtooth + gate
//!
//! for _ in 0..1000 {
//!     ring.clock();
//! }
//! let mixed = ring.mixed_output();
//! let osc3 = ring.read_osc3();
//! # let _ = (mixed, osc3);
//! ```
//!
//! ## Building from configuration
//! ```no_run
//! use sidosc::{SidConfig, SyncRing};
//!
//! let cfg = SidConfig::from_json(r#"{ "chip_model": "mos8580", "sampling": "fast" }"#)?;
//! let mut ring = SyncRing::from_config(&cfg)?;
//! ring.set_frequency_hz(0, 440.0);
//! ring.advance(22);
//! # Ok::<(), sidosc::SidError>(())
//! ```

#![warn(missing_docs)]

pub mod chip_model; // 6581 / 8580 selection and model constants
pub mod config; // Ring configuration (serde)
pub mod ring; // Three-voice sync ring
pub mod wave; // Waveform generator domain

/// Error types for SID oscillator construction and configuration
///
/// The clocking hot path never fails; errors only arise when selecting a chip
/// model or loading a configuration.
#[derive(thiserror::Error, Debug)]
pub enum SidError {
    /// Numeric chip model selector outside 0 (6581) / 1 (8580)
    #[error("Unknown chip model selector: {0}")]
    UnknownChipModel(u8),

    /// Chip model name that is neither a 6581 nor an 8580 spelling
    #[error("Unknown chip model name: {0:?}")]
    UnknownChipModelName(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Configuration or snapshot could not be (de)serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for SID oscillator operations
pub type Result<T> = std::result::Result<T, SidError>;

// Public API exports
pub use chip_model::{clock, ChipModel};
pub use config::{SamplingMethod, SidConfig};
pub use ring::{SyncRing, SYNC_DEST, SYNC_SOURCE};
pub use wave::{
    frequency_register, pulse_width_register, ControlFlags, VoiceRegister, Waveform,
    WaveformGenerator, WaveformState,
};
