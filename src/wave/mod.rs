//! SID oscillator domain
//!
//! Waveform generation for a single SID voice: phase accumulator, noise
//! LFSR, combined-waveform lookup and the oscillator DAC.
//!
//! Implementation:
//! - `generator` - the per-voice oscillator
//! - `noise` - 23-bit noise shift register with its pipeline
//! - `tables` - per-model waveform tables (generated once)
//! - `dac` - per-model R-2R DAC tables (generated once)

pub mod dac;
pub mod generator;
pub mod noise;
pub mod registers;
pub mod state;
pub mod tables;

// Re-export public API
pub use dac::{dac_table, DacTable};
pub use generator::{frequency_register, pulse_width_register, WaveformGenerator};
pub use noise::{NoiseShiftRegister, SHIFT_REGISTER_RESET};
pub use registers::{ControlFlags, VoiceRegister, Waveform};
pub use state::WaveformState;
pub use tables::{wave_tables, WaveTable, WaveTables};
