//! Flat, serializable generator state

use serde::{Deserialize, Serialize};

/// Every mutable field of a [`WaveformGenerator`](super::WaveformGenerator)
///
/// The chip model is not part of the state; restoring into a generator of a
/// different model keeps that generator's tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WaveformState {
    /// 24-bit phase accumulator
    pub accumulator: u32,
    /// 16-bit frequency register
    pub freq: u16,
    /// 12-bit pulse width register
    pub pw: u16,
    /// Control register (gate bit not tracked)
    pub control: u8,
    /// Accumulator MSB went 0 -> 1 on the last clock
    pub msb_rising: bool,
    /// 23-bit noise shift register
    pub shift_register: u32,
    /// TEST-held reset countdown
    pub shift_register_reset: i32,
    /// Noise shift pipeline countdown
    pub shift_pipeline: i32,
    /// Pulse comparator output (0x000 or 0xfff)
    pub pulse_output: u16,
    /// 12-bit DAC input
    pub waveform_output: u16,
    /// 12-bit value readable through OSC3
    pub osc3: u16,
    /// 8580 triangle/sawtooth output latch
    pub tri_saw_pipeline: u16,
    /// Cycles until the floating DAC input decays to zero
    pub floating_output_ttl: i32,
}
