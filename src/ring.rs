//! Three-voice oscillator sync ring
//!
//! The SID wires its three oscillators in a fixed ring: each voice can be
//! hard-synced and ring-modulated by the previous one.
//!
//! ```text
//! voice 2 --> voice 0 --> voice 1 --> voice 2
//! ```
//!
//! The ring owns the generators in an array and passes neighbours to them by
//! index, so a cycle is always: clock all three, synchronize all three, then
//! compute each output.
//!
//! # Examples
//!
//! ```
//! use sidosc::{ChipModel, SyncRing, VoiceRegister};
//!
//! let mut ring = SyncRing::new(ChipModel::Mos8580);
//!
//! // Voice 2 drives hard sync of voice 0
//! ring.set_frequency_hz(2, 220.0);
//! ring.set_frequency_hz(0, 587.0);
//! ring.write_register(0, VoiceRegister::Control, 0x22); // sawtooth + sync
//!
//! ring.advance(20_000);
//! assert!(ring.voice(0).accumulator() < 0x100_0000);
//! ```

use crate::chip_model::ChipModel;
use crate::config::{SamplingMethod, SidConfig};
use crate::Result;
use crate::wave::{
    frequency_register, pulse_width_register, VoiceRegister, WaveformGenerator, WaveformState,
};

/// Voice whose MSB syncs / ring-modulates voice `i`
///
/// `SYNC_SOURCE[0] == 2`: voice 2 drives voice 0.
pub const SYNC_SOURCE: [usize; 3] = [2, 0, 1];

/// Voice that voice `i` syncs
///
/// The inverse of [`SYNC_SOURCE`]: `SYNC_DEST[2] == 0`, so voice 2 syncs
/// voice 0 (not the other way round).
pub const SYNC_DEST: [usize; 3] = [1, 2, 0];

const ACCUMULATOR_MSB: u32 = 0x80_0000;

/// Three waveform generators wired for hard sync and ring modulation
#[derive(Debug, Clone)]
pub struct SyncRing {
    voices: [WaveformGenerator; 3],
    config: SidConfig,
}

impl SyncRing {
    /// Create a PAL ring of `model` voices
    pub fn new(model: ChipModel) -> Self {
        Self::build(&SidConfig::pal(model))
    }

    /// Create a ring from a configuration
    ///
    /// # Errors
    ///
    /// Returns [`SidError::ConfigError`](crate::SidError::ConfigError) if the
    /// configuration fails [`SidConfig::validate`].
    pub fn from_config(config: &SidConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: &SidConfig) -> Self {
        log::debug!(
            "sync ring: {} at {} Hz, {:?} sampling",
            config.chip_model,
            config.clock_frequency,
            config.sampling
        );
        let model = config.chip_model;
        Self {
            voices: [
                WaveformGenerator::new(model),
                WaveformGenerator::new(model),
                WaveformGenerator::new(model),
            ],
            config: *config,
        }
    }

    /// Chip model of all voices
    pub fn model(&self) -> ChipModel {
        self.config.chip_model
    }

    /// Active configuration
    pub fn config(&self) -> &SidConfig {
        &self.config
    }

    /// Borrow a voice
    ///
    /// # Panics
    ///
    /// Panics if `voice` is not 0, 1 or 2.
    pub fn voice(&self, voice: usize) -> &WaveformGenerator {
        &self.voices[voice]
    }

    /// Mutably borrow a voice
    ///
    /// # Panics
    ///
    /// Panics if `voice` is not 0, 1 or 2.
    pub fn voice_mut(&mut self, voice: usize) -> &mut WaveformGenerator {
        &mut self.voices[voice]
    }

    /// Reset every voice (accumulators are kept)
    pub fn reset(&mut self) {
        for voice in &mut self.voices {
            voice.reset();
        }
    }

    /// Write a voice register
    ///
    /// Envelope registers are accepted and ignored.
    ///
    /// # Panics
    ///
    /// Panics if `voice` is not 0, 1 or 2.
    pub fn write_register(&mut self, voice: usize, register: VoiceRegister, value: u8) {
        log::trace!("voice {} {} <- {:#04x}", voice, register, value);

        let generator = &mut self.voices[voice];
        match register {
            VoiceRegister::FreqLo => generator.write_freq_lo(value),
            VoiceRegister::FreqHi => generator.write_freq_hi(value),
            VoiceRegister::PwLo => generator.write_pw_lo(value),
            VoiceRegister::PwHi => generator.write_pw_hi(value),
            VoiceRegister::Control => {
                generator.write_control(value);
                if !generator.waveform().is_empty() {
                    self.refresh_output(voice);
                }
            }
            VoiceRegister::AttackDecay | VoiceRegister::SustainRelease => {}
        }
    }

    /// Program a voice frequency in Hz for the configured clock
    pub fn set_frequency_hz(&mut self, voice: usize, hz: f64) {
        let freq = frequency_register(hz, self.config.clock_frequency);
        self.write_register(voice, VoiceRegister::FreqLo, freq as u8);
        self.write_register(voice, VoiceRegister::FreqHi, (freq >> 8) as u8);
    }

    /// Program a voice pulse width as a duty cycle in percent
    pub fn set_pulse_width_percent(&mut self, voice: usize, percent: f64) {
        let pw = pulse_width_register(percent);
        self.write_register(voice, VoiceRegister::PwLo, pw as u8);
        self.write_register(voice, VoiceRegister::PwHi, (pw >> 8) as u8);
    }

    /// OSC3 register (voice 2 output, upper 8 bits)
    pub fn read_osc3(&self) -> u8 {
        self.voices[2].read_osc()
    }

    fn refresh_output(&mut self, voice: usize) {
        let [v0, v1, v2] = &mut self.voices;
        match voice {
            0 => v0.set_waveform_output(v2),
            1 => v1.set_waveform_output(v0),
            _ => v2.set_waveform_output(v1),
        }
    }

    // ------------------------------------------------------------------
    // Cycle phases
    // ------------------------------------------------------------------

    /// Clock all accumulators one cycle
    #[inline]
    pub fn clock_oscillators(&mut self) {
        for voice in &mut self.voices {
            voice.clock();
        }
    }

    /// Apply hard sync around the ring
    ///
    /// Only valid after all three voices were clocked for the cycle.
    #[inline]
    pub fn synchronize(&mut self) {
        let [v0, v1, v2] = &mut self.voices;
        v0.synchronize(v2, v1);
        v1.synchronize(v0, v2);
        v2.synchronize(v1, v0);
    }

    /// Compute every voice output for the current cycle
    #[inline]
    pub fn update_outputs(&mut self) {
        let [v0, v1, v2] = &mut self.voices;
        v0.set_waveform_output(v2);
        v1.set_waveform_output(v0);
        v2.set_waveform_output(v1);
    }

    /// One full cycle: clock, synchronize, output
    #[inline]
    pub fn clock(&mut self) {
        self.clock_oscillators();
        self.synchronize();
        self.update_outputs();
    }

    /// Cycles until the next MSB toggle of any voice that drives a sync
    fn cycles_to_sync_edge(&self, limit: u32) -> u32 {
        let mut step = limit;
        for (index, voice) in self.voices.iter().enumerate() {
            let freq = voice.frequency() as u32;
            if freq == 0 || !self.voices[SYNC_DEST[index]].sync() {
                continue;
            }

            let accumulator = voice.accumulator();
            let target = if accumulator & ACCUMULATOR_MSB != 0 {
                0x100_0000
            } else {
                ACCUMULATOR_MSB
            };
            step = step.min((target - accumulator).div_ceil(freq));
        }
        step
    }

    /// Advance `delta_t` cycles with delta clocking
    ///
    /// The span is split at every MSB toggle of a voice driving hard sync, so
    /// accumulators and sync resets land on the same cycles as with single
    /// cycle clocking. Outputs are computed once at the end.
    pub fn clock_delta(&mut self, delta_t: u32) {
        let mut remaining = delta_t;
        while remaining != 0 {
            let step = self.cycles_to_sync_edge(remaining);
            for voice in &mut self.voices {
                voice.clock_delta(step);
            }
            self.synchronize();
            remaining -= step;
        }

        let [v0, v1, v2] = &mut self.voices;
        v0.set_waveform_output_delta(delta_t, v2);
        v1.set_waveform_output_delta(delta_t, v0);
        v2.set_waveform_output_delta(delta_t, v1);
    }

    /// Advance `cycles` cycles using the configured sampling method
    pub fn advance(&mut self, cycles: u32) {
        if cycles == 0 {
            return;
        }
        match self.config.sampling {
            SamplingMethod::Exact => {
                for _ in 0..cycles {
                    self.clock();
                }
            }
            SamplingMethod::Fast => self.clock_delta(cycles),
        }
    }

    // ------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------

    /// DAC output of each voice
    pub fn outputs(&self) -> [u16; 3] {
        [
            self.voices[0].output(),
            self.voices[1].output(),
            self.voices[2].output(),
        ]
    }

    /// Sum of the voice outputs centred around the model's DAC zero level
    pub fn mixed_output(&self) -> i32 {
        let zero = self.model().wave_zero();
        self.voices
            .iter()
            .map(|voice| voice.output() as i32 - zero)
            .sum()
    }

    // ------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------

    /// Capture all three voices
    pub fn snapshot(&self) -> [WaveformState; 3] {
        [
            self.voices[0].snapshot(),
            self.voices[1].snapshot(),
            self.voices[2].snapshot(),
        ]
    }

    /// Restore all three voices
    pub fn restore(&mut self, states: &[WaveformState; 3]) {
        for (voice, state) in self.voices.iter_mut().zip(states) {
            voice.restore(state);
        }
    }
}

impl Default for SyncRing {
    fn default() -> Self {
        Self::build(&SidConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topology_is_a_ring() {
        for voice in 0..3 {
            assert_eq!(SYNC_DEST[SYNC_SOURCE[voice]], voice);
            assert_ne!(SYNC_SOURCE[voice], voice);
        }
    }

    #[test]
    fn test_silent_ring_mix() {
        let ring = SyncRing::new(ChipModel::Mos6581);
        assert_eq!(ring.outputs(), [0, 0, 0]);
        assert_eq!(ring.mixed_output(), -3 * 0x380);
    }

    #[test]
    fn test_control_write_refreshes_output() {
        let mut ring = SyncRing::new(ChipModel::Mos6581);
        ring.voice_mut(1).set_accumulator(0x456000);
        ring.write_register(1, VoiceRegister::Control, 0x20);
        assert_eq!(ring.voice(1).waveform_output(), 0x456);
    }

    #[test]
    fn test_envelope_registers_are_ignored() {
        let mut ring = SyncRing::new(ChipModel::Mos8580);
        let before = ring.snapshot();
        ring.write_register(0, VoiceRegister::AttackDecay, 0xff);
        ring.write_register(0, VoiceRegister::SustainRelease, 0xff);
        assert_eq!(ring.snapshot(), before);
    }

    #[test]
    fn test_read_osc3_uses_voice_2() {
        let mut ring = SyncRing::new(ChipModel::Mos6581);
        ring.voice_mut(2).set_accumulator(0xab0000);
        ring.write_register(2, VoiceRegister::Control, 0x20);
        assert_eq!(ring.read_osc3(), 0xab);
    }

    #[test]
    fn test_frequency_in_hz() {
        let mut ring = SyncRing::new(ChipModel::Mos6581);
        ring.set_frequency_hz(0, 440.0);
        assert_eq!(ring.voice(0).frequency(), 7492);
        ring.set_pulse_width_percent(0, 25.0);
        assert_eq!(ring.voice(0).pulse_width(), 1024);
    }

    #[test]
    fn test_from_config_rejects_zero_clock() {
        let config = SidConfig {
            clock_frequency: 0,
            ..SidConfig::ntsc(ChipModel::Mos8580)
        };
        assert!(matches!(
            SyncRing::from_config(&config),
            Err(crate::SidError::ConfigError(_))
        ));

        let ring = SyncRing::from_config(&SidConfig::ntsc(ChipModel::Mos8580)).unwrap();
        assert_eq!(ring.config().clock_frequency, crate::clock::NTSC);
        assert_eq!(ring.model(), ChipModel::Mos8580);
    }

    #[test]
    fn test_sync_edge_step() {
        let mut ring = SyncRing::new(ChipModel::Mos6581);
        ring.write_register(2, VoiceRegister::FreqLo, 0x10);
        ring.voice_mut(2).set_accumulator(0x7fff00);
        // Nothing synced yet
        assert_eq!(ring.cycles_to_sync_edge(1000), 1000);

        ring.write_register(0, VoiceRegister::Control, 0x02);
        assert_eq!(ring.cycles_to_sync_edge(1000), 16);
    }
}
