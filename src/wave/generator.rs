//! SID waveform generator
//!
//! One voice oscillator: a 24-bit phase accumulator advanced by the 16-bit
//! frequency register on every cycle, feeding the waveform tables, the noise
//! shift register and the pulse comparator.
//!
//! Frequency and pulse width relate to the output as
//!
//! ```text
//! Fout  = Fn * Fclk / 2^24 Hz
//! PWout = PWn / 40.95 %
//! ```
//!
//! A generator reads two things from its neighbours in the ring: the sync
//! source accumulator (ring modulation) and the sync source `msb_rising` flag
//! (sync suppression). Those are passed in explicitly by the owner.

use std::fmt;

use super::dac::{dac_table, DacTable};
use super::noise::NoiseShiftRegister;
use super::registers::{ControlFlags, Waveform};
use super::state::WaveformState;
use super::tables::{wave_tables, WaveTables};
use crate::chip_model::ChipModel;

const ACCUMULATOR_MASK: u32 = 0xff_ffff;
const ACCUMULATOR_MSB: u32 = 0x80_0000;
/// Accumulator bit that clocks the noise shift register
const NOISE_CLOCK_BIT: u32 = 0x08_0000;
const OUTPUT_MASK: u16 = 0xfff;

/// Clamp an unsigned cycle count into the signed countdown domain
#[inline]
fn cycles(delta_t: u32) -> i32 {
    i32::try_from(delta_t).unwrap_or(i32::MAX)
}

/// Convert a frequency in Hz to a FREQ register value for `clock_frequency`
///
/// The fractional part is truncated. Values that do not fit 16 bits
/// saturate at 0xffff.
pub fn frequency_register(hz: f64, clock_frequency: u32) -> u16 {
    if clock_frequency == 0 || !hz.is_finite() || hz <= 0.0 {
        return 0;
    }
    let value = (hz * 16_777_216.0 / clock_frequency as f64).trunc();
    if value > u16::MAX as f64 {
        log::warn!(
            "{:.1} Hz exceeds the oscillator range at {} Hz clock, saturating",
            hz,
            clock_frequency
        );
        return u16::MAX;
    }
    value as u16
}

/// Convert a duty cycle in percent to a 12-bit PW register value
pub fn pulse_width_register(percent: f64) -> u16 {
    (percent * 40.95).round().clamp(0.0, 4095.0) as u16
}

/// Cycle-accurate SID oscillator
#[derive(Clone)]
pub struct WaveformGenerator {
    model: ChipModel,
    wave: &'static WaveTables,
    dac: &'static DacTable,

    accumulator: u32,
    freq: u32,
    pw: u32,

    waveform: Waveform,
    test: bool,
    ring_mod: bool,
    sync: bool,
    /// Accumulator MSB substituted by the sync source MSB (ring modulation)
    ring_msb_mask: u32,
    msb_rising: bool,

    noise: NoiseShiftRegister,

    /// Pulse comparator, one cycle behind the accumulator
    pulse_output: u16,
    waveform_output: u16,
    osc3: u16,
    tri_saw_pipeline: u16,
    floating_output_ttl: i32,
}

impl WaveformGenerator {
    /// Create a generator for `model`
    pub fn new(model: ChipModel) -> Self {
        let mut generator = Self {
            model,
            wave: wave_tables(model),
            dac: dac_table(model),
            accumulator: 0,
            freq: 0,
            pw: 0,
            waveform: Waveform::empty(),
            test: false,
            ring_mod: false,
            sync: false,
            ring_msb_mask: 0,
            msb_rising: false,
            noise: NoiseShiftRegister::new(),
            pulse_output: OUTPUT_MASK,
            waveform_output: 0,
            osc3: 0,
            tri_saw_pipeline: 0x555,
            floating_output_ttl: 0,
        };
        generator.reset();
        generator
    }

    /// Chip model fixed at construction
    pub fn model(&self) -> ChipModel {
        self.model
    }

    /// Reset registers and internal state
    ///
    /// The accumulator is not affected, matching the chip.
    pub fn reset(&mut self) {
        self.freq = 0;
        self.pw = 0;
        self.msb_rising = false;
        self.waveform = Waveform::empty();
        self.test = false;
        self.ring_mod = false;
        self.sync = false;
        self.ring_msb_mask = 0;
        self.pulse_output = OUTPUT_MASK;

        self.noise.reset();
        self.noise.flush_pipeline();

        self.waveform_output = 0;
        self.osc3 = 0;
        self.tri_saw_pipeline = 0x555;
        self.floating_output_ttl = 0;
    }

    // ------------------------------------------------------------------
    // Register interface
    // ------------------------------------------------------------------

    /// FREQ_LO
    pub fn write_freq_lo(&mut self, value: u8) {
        self.freq = (self.freq & 0xff00) | value as u32;
    }

    /// FREQ_HI
    pub fn write_freq_hi(&mut self, value: u8) {
        self.freq = ((value as u32) << 8) | (self.freq & 0x00ff);
    }

    /// PW_LO, takes effect on the comparator immediately
    pub fn write_pw_lo(&mut self, value: u8) {
        self.pw = (self.pw & 0xf00) | value as u32;
        self.update_pulse_output();
    }

    /// PW_HI (low nibble), takes effect on the comparator immediately
    pub fn write_pw_hi(&mut self, value: u8) {
        self.pw = (((value as u32) << 8) & 0xf00) | (self.pw & 0x0ff);
        self.update_pulse_output();
    }

    /// Control register
    ///
    /// Applies TEST edges and arms the floating output decay. When the new
    /// waveform is non-zero the owner must refresh the output through
    /// [`set_waveform_output`](Self::set_waveform_output), since that needs
    /// the sync source.
    pub fn write_control(&mut self, value: u8) {
        let control = ControlFlags::from_register(value);
        let waveform_prev = self.waveform;
        let test_next = control.contains(ControlFlags::TEST);

        self.waveform = control.waveform();
        self.ring_mod = control.contains(ControlFlags::RING_MOD);
        self.sync = control.contains(ControlFlags::SYNC);
        self.ring_msb_mask = if self.ring_mod && !self.waveform.contains(Waveform::SAWTOOTH) {
            ACCUMULATOR_MSB
        } else {
            0
        };

        if !self.test && test_next {
            self.accumulator = 0;
            self.noise.flush_pipeline();
            self.noise
                .schedule_reset(self.model.shift_register_reset_cycles());
            self.pulse_output = OUTPUT_MASK;
        } else if self.test && !test_next {
            self.noise.release_test();
        }
        self.test = test_next;

        if self.waveform.is_empty() && !waveform_prev.is_empty() {
            self.floating_output_ttl = self.model.floating_output_ttl_cycles();
        }
    }

    /// OSC3 register: upper 8 bits of the oscillator output
    #[inline]
    pub fn read_osc(&self) -> u8 {
        (self.osc3 >> 4) as u8
    }

    // ------------------------------------------------------------------
    // Clocking
    // ------------------------------------------------------------------

    /// Advance one cycle
    #[inline]
    pub fn clock(&mut self) {
        if self.test {
            self.noise.count_down_reset();
            self.pulse_output = OUTPUT_MASK;
            return;
        }

        let accumulator_next = (self.accumulator + self.freq) & ACCUMULATOR_MASK;
        let bits_set = !self.accumulator & accumulator_next;
        self.accumulator = accumulator_next;
        self.msb_rising = bits_set & ACCUMULATOR_MSB != 0;

        if bits_set & NOISE_CLOCK_BIT != 0 {
            self.noise.arm_pipeline();
        } else {
            self.noise.step_pipeline();
        }
    }

    /// Advance `delta_t` cycles at once
    ///
    /// The noise register is shifted once per rising edge of bit 19 inside the
    /// span, without the two-cycle pipeline, and the pulse comparator is
    /// updated directly. The accumulator ends up exactly where `delta_t`
    /// single cycles would put it.
    pub fn clock_delta(&mut self, delta_t: u32) {
        if self.test {
            self.noise.count_down_reset_by(cycles(delta_t));
            self.pulse_output = OUTPUT_MASK;
            return;
        }

        let mut delta_accumulator = delta_t.wrapping_mul(self.freq);
        let accumulator_next = self.accumulator.wrapping_add(delta_accumulator) & ACCUMULATOR_MASK;
        let bits_set = !self.accumulator & accumulator_next;
        self.accumulator = accumulator_next;
        self.msb_rising = bits_set & ACCUMULATOR_MSB != 0;

        // Walk back from the new accumulator one bit-19 period at a time
        let mut shift_period: u32 = 0x10_0000;
        while delta_accumulator != 0 {
            if delta_accumulator < shift_period {
                shift_period = delta_accumulator;
                let before = self.accumulator.wrapping_sub(shift_period) & NOISE_CLOCK_BIT != 0;
                let now = self.accumulator & NOISE_CLOCK_BIT != 0;
                if shift_period <= NOISE_CLOCK_BIT {
                    // Only a 0 -> 1 flip counts
                    if before || !now {
                        break;
                    }
                } else if before && !now {
                    break;
                }
            }

            self.noise.clock();
            delta_accumulator -= shift_period;
        }

        self.update_pulse_output();
    }

    /// Hard sync of `dest` (the voice this one syncs)
    ///
    /// Must run after every generator in the ring has been clocked. A rising
    /// MSB resets the destination accumulator unless this voice is itself
    /// being synced on the same cycle.
    #[inline]
    pub fn synchronize(&self, sync_source: &Self, dest: &mut Self) {
        if self.msb_rising && dest.sync && !(self.sync && sync_source.msb_rising) {
            dest.accumulator = 0;
        }
    }

    // ------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------

    #[inline]
    fn table_index(&self, sync_source: &Self) -> usize {
        let ring = !sync_source.accumulator & self.ring_msb_mask;
        (((self.accumulator ^ ring) >> 12) & 0xfff) as usize
    }

    #[inline]
    fn pulse_mask(&self) -> u16 {
        if self.waveform.contains(Waveform::PULSE) {
            self.pulse_output
        } else {
            OUTPUT_MASK
        }
    }

    #[inline]
    fn noise_mask(&self) -> u16 {
        if self.waveform.contains(Waveform::NOISE) {
            self.noise.output()
        } else {
            OUTPUT_MASK
        }
    }

    #[inline]
    fn update_pulse_output(&mut self) {
        self.pulse_output = if (self.accumulator >> 12) >= self.pw {
            OUTPUT_MASK
        } else {
            0
        };
    }

    /// 6581: sawtooth combined with anything else drags the accumulator MSB
    #[inline]
    fn pull_down_msb(&mut self) {
        if self.model == ChipModel::Mos6581
            && self.waveform.contains(Waveform::SAWTOOTH)
            && self
                .waveform
                .intersects(Waveform::TRIANGLE | Waveform::PULSE | Waveform::NOISE)
        {
            self.accumulator &= ((self.waveform_output as u32) << 12) | 0x7f_ffff;
        }
    }

    /// Compute the DAC input for the current cycle
    pub fn set_waveform_output(&mut self, sync_source: &Self) {
        if !self.waveform.is_empty() {
            let index = self.table_index(sync_source);
            let table_value = self.wave.get(self.waveform.bits())[index];
            let pulse_mask = self.pulse_mask();
            let noise_mask = self.noise_mask();

            let mut output = table_value & pulse_mask & noise_mask;
            if self.waveform.contains(Waveform::NOISE | Waveform::PULSE) {
                output = self.model.noise_pulse(output);
            }
            self.waveform_output = output;

            // 8580 latches triangle/sawtooth one cycle before OSC3 sees it
            if self.model == ChipModel::Mos8580
                && self
                    .waveform
                    .intersects(Waveform::TRIANGLE | Waveform::SAWTOOTH)
            {
                self.osc3 = self.tri_saw_pipeline & pulse_mask & noise_mask;
                self.tri_saw_pipeline = table_value;
            } else {
                self.osc3 = output;
            }

            self.pull_down_msb();

            if self.waveform.is_noise_combined() && !self.test && self.noise.pipeline() != 1 {
                self.noise.write_back(self.waveform_output);
            }
        } else if self.floating_output_ttl != 0 {
            self.floating_output_ttl -= 1;
            if self.floating_output_ttl == 0 {
                self.waveform_output = 0;
                self.osc3 = 0;
            }
        }

        self.update_pulse_output();
    }

    /// Compute the DAC input after a [`clock_delta`](Self::clock_delta) span
    pub fn set_waveform_output_delta(&mut self, delta_t: u32, sync_source: &Self) {
        if !self.waveform.is_empty() {
            let index = self.table_index(sync_source);
            self.waveform_output =
                self.wave.get(self.waveform.bits())[index] & self.pulse_mask() & self.noise_mask();
            self.osc3 = self.waveform_output;

            self.pull_down_msb();

            if self.waveform.is_noise_combined() && !self.test {
                self.noise.write_back(self.waveform_output);
            }
        } else if self.floating_output_ttl != 0 {
            self.floating_output_ttl -= cycles(delta_t);
            if self.floating_output_ttl <= 0 {
                self.floating_output_ttl = 0;
                self.waveform_output = 0;
                self.osc3 = 0;
            }
        }
    }

    /// DAC output for the current waveform output
    #[inline]
    pub fn output(&self) -> u16 {
        self.dac[self.waveform_output as usize]
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    /// 24-bit phase accumulator
    #[inline]
    pub fn accumulator(&self) -> u32 {
        self.accumulator
    }

    /// Overwrite the accumulator (masked to 24 bits)
    pub fn set_accumulator(&mut self, value: u32) {
        self.accumulator = value & ACCUMULATOR_MASK;
    }

    /// 16-bit frequency register
    pub fn frequency(&self) -> u16 {
        self.freq as u16
    }

    /// 12-bit pulse width register
    pub fn pulse_width(&self) -> u16 {
        self.pw as u16
    }

    /// Selected waveform
    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// TEST bit
    pub fn test(&self) -> bool {
        self.test
    }

    /// RING MOD bit
    pub fn ring_mod(&self) -> bool {
        self.ring_mod
    }

    /// SYNC bit
    pub fn sync(&self) -> bool {
        self.sync
    }

    /// Accumulator MSB went 0 -> 1 on the last clock
    #[inline]
    pub fn msb_rising(&self) -> bool {
        self.msb_rising
    }

    /// Noise shift register
    pub fn noise(&self) -> &NoiseShiftRegister {
        &self.noise
    }

    /// Pulse comparator output (0x000 or 0xfff)
    pub fn pulse_output(&self) -> u16 {
        self.pulse_output
    }

    /// 12-bit DAC input
    #[inline]
    pub fn waveform_output(&self) -> u16 {
        self.waveform_output
    }

    /// Full 12-bit OSC3 value
    pub fn osc3(&self) -> u16 {
        self.osc3
    }

    /// Remaining floating DAC input cycles
    pub fn floating_output_ttl(&self) -> i32 {
        self.floating_output_ttl
    }

    // ------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------

    fn control_bits(&self) -> u8 {
        let mut control = ControlFlags::from_bits_truncate(self.waveform.bits() << 4);
        control.set(ControlFlags::TEST, self.test);
        control.set(ControlFlags::RING_MOD, self.ring_mod);
        control.set(ControlFlags::SYNC, self.sync);
        control.bits()
    }

    /// Capture the complete mutable state
    pub fn snapshot(&self) -> WaveformState {
        WaveformState {
            accumulator: self.accumulator,
            freq: self.freq as u16,
            pw: self.pw as u16,
            control: self.control_bits(),
            msb_rising: self.msb_rising,
            shift_register: self.noise.value(),
            shift_register_reset: self.noise.reset_countdown(),
            shift_pipeline: self.noise.pipeline(),
            pulse_output: self.pulse_output,
            waveform_output: self.waveform_output,
            osc3: self.osc3,
            tri_saw_pipeline: self.tri_saw_pipeline,
            floating_output_ttl: self.floating_output_ttl,
        }
    }

    /// Restore a captured state without triggering register side effects
    pub fn restore(&mut self, state: &WaveformState) {
        let control = ControlFlags::from_register(state.control);
        self.accumulator = state.accumulator & ACCUMULATOR_MASK;
        self.freq = state.freq as u32;
        self.pw = (state.pw & OUTPUT_MASK) as u32;
        self.waveform = control.waveform();
        self.test = control.contains(ControlFlags::TEST);
        self.ring_mod = control.contains(ControlFlags::RING_MOD);
        self.sync = control.contains(ControlFlags::SYNC);
        self.ring_msb_mask = if self.ring_mod && !self.waveform.contains(Waveform::SAWTOOTH) {
            ACCUMULATOR_MSB
        } else {
            0
        };
        self.msb_rising = state.msb_rising;
        self.noise.restore(
            state.shift_register,
            state.shift_register_reset,
            state.shift_pipeline,
        );
        self.pulse_output = if state.pulse_output != 0 { OUTPUT_MASK } else { 0 };
        self.waveform_output = state.waveform_output & OUTPUT_MASK;
        self.osc3 = state.osc3 & OUTPUT_MASK;
        self.tri_saw_pipeline = state.tri_saw_pipeline & OUTPUT_MASK;
        self.floating_output_ttl = state.floating_output_ttl.max(0);
    }
}

impl Default for WaveformGenerator {
    fn default() -> Self {
        Self::new(ChipModel::default())
    }
}

impl fmt::Debug for WaveformGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaveformGenerator")
            .field("model", &self.model)
            .field("accumulator", &format_args!("{:#08x}", self.accumulator))
            .field("freq", &format_args!("{:#06x}", self.freq))
            .field("pw", &format_args!("{:#05x}", self.pw))
            .field("waveform", &self.waveform)
            .field("test", &self.test)
            .field("ring_mod", &self.ring_mod)
            .field("sync", &self.sync)
            .field("shift_register", &format_args!("{:#08x}", self.noise.value()))
            .field("waveform_output", &format_args!("{:#05x}", self.waveform_output))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_freq(model: ChipModel, freq: u16) -> WaveformGenerator {
        let mut generator = WaveformGenerator::new(model);
        generator.write_freq_lo(freq as u8);
        generator.write_freq_hi((freq >> 8) as u8);
        generator
    }

    #[test]
    fn test_initial_state() {
        let generator = WaveformGenerator::new(ChipModel::Mos6581);
        assert_eq!(generator.accumulator(), 0);
        assert_eq!(generator.noise().value(), 0x7fffff);
        assert_eq!(generator.waveform_output(), 0);
        assert_eq!(generator.osc3(), 0);
        assert_eq!(generator.pulse_output(), 0xfff);
        assert_eq!(generator.read_osc(), 0);
    }

    #[test]
    fn test_register_writes() {
        let mut generator = WaveformGenerator::new(ChipModel::Mos8580);
        generator.write_freq_lo(0x34);
        generator.write_freq_hi(0x12);
        generator.write_pw_lo(0xff);
        generator.write_pw_hi(0xf8);
        assert_eq!(generator.frequency(), 0x1234);
        assert_eq!(generator.pulse_width(), 0x8ff);
    }

    #[test]
    fn test_accumulator_wraps() {
        let mut generator = with_freq(ChipModel::Mos6581, 0x1000);
        let mut rises = 0;
        for _ in 0..4096 {
            generator.clock();
            if generator.msb_rising() {
                rises += 1;
            }
        }
        assert_eq!(generator.accumulator(), 0);
        assert_eq!(rises, 1);
    }

    #[test]
    fn test_delta_matches_single_cycles() {
        let mut single = with_freq(ChipModel::Mos6581, 0x2345);
        let mut delta = single.clone();
        single.set_accumulator(0x123456);
        delta.set_accumulator(0x123456);

        for _ in 0..1000 {
            single.clock();
        }
        delta.clock_delta(1000);
        assert_eq!(single.accumulator(), delta.accumulator());
    }

    #[test]
    fn test_test_bit_freezes_accumulator() {
        let mut generator = with_freq(ChipModel::Mos6581, 0x4000);
        for _ in 0..10 {
            generator.clock();
        }
        assert_ne!(generator.accumulator(), 0);

        generator.write_control(0x08);
        assert_eq!(generator.accumulator(), 0);
        assert_eq!(
            generator.noise().reset_countdown(),
            ChipModel::Mos6581.shift_register_reset_cycles()
        );
        for _ in 0..100 {
            generator.clock();
            assert_eq!(generator.accumulator(), 0);
            assert_eq!(generator.pulse_output(), 0xfff);
        }

        // Release completes a half shift
        generator.write_control(0x00);
        assert_eq!(generator.noise().value(), 0x7ffffe);
    }

    #[test]
    fn test_test_bit_resets_shift_register_after_countdown() {
        let mut generator = WaveformGenerator::new(ChipModel::Mos6581);
        let state = WaveformState {
            shift_register: 0x123456,
            ..generator.snapshot()
        };
        generator.restore(&state);
        generator.write_control(0x08);
        for _ in 0..34_999 {
            generator.clock();
        }
        assert_eq!(generator.noise().value(), 0x123456);
        generator.clock();
        assert_eq!(generator.noise().value(), 0x7fffff);
    }

    #[test]
    fn test_pulse_comparator_lags_one_cycle() {
        let source = WaveformGenerator::new(ChipModel::Mos6581);
        let mut generator = with_freq(ChipModel::Mos6581, 0x100);
        generator.write_pw_hi(0x08);
        generator.write_control(0x40);
        generator.set_accumulator(0x7fff00);
        generator.set_waveform_output(&source);
        assert_eq!(generator.pulse_output(), 0);

        // Accumulator crosses PW; output still reflects the old comparator
        generator.clock();
        assert_eq!(generator.accumulator(), 0x800000);
        generator.set_waveform_output(&source);
        assert_eq!(generator.waveform_output(), 0);
        assert_eq!(generator.pulse_output(), 0xfff);

        generator.clock();
        generator.set_waveform_output(&source);
        assert_eq!(generator.waveform_output(), 0xfff);
    }

    #[test]
    fn test_sawtooth_follows_accumulator() {
        for model in ChipModel::ALL {
            let source = WaveformGenerator::new(model);
            let mut generator = with_freq(model, 0x1234);
            generator.write_control(0x20);
            for _ in 0..5000 {
                generator.clock();
                generator.set_waveform_output(&source);
                assert_eq!(
                    generator.waveform_output() as u32,
                    generator.accumulator() >> 12
                );
            }
        }
    }

    #[test]
    fn test_8580_tri_saw_latch() {
        let source = WaveformGenerator::new(ChipModel::Mos8580);
        let mut generator = WaveformGenerator::new(ChipModel::Mos8580);
        generator.write_control(0x20);
        generator.set_accumulator(0xabc000);
        generator.set_waveform_output(&source);
        assert_eq!(generator.waveform_output(), 0xabc);
        assert_eq!(generator.osc3(), 0x555);

        generator.set_accumulator(0x123000);
        generator.set_waveform_output(&source);
        assert_eq!(generator.osc3(), 0xabc);
        assert_eq!(generator.read_osc(), 0xab);
    }

    #[test]
    fn test_6581_sawtooth_combination_pulls_msb_low() {
        let source = WaveformGenerator::new(ChipModel::Mos6581);
        let mut generator = WaveformGenerator::new(ChipModel::Mos6581);
        generator.write_control(0x30);
        generator.set_accumulator(0x900000);
        generator.set_waveform_output(&source);
        assert_eq!(generator.accumulator() & 0x800000, 0);

        let source = WaveformGenerator::new(ChipModel::Mos8580);
        let mut generator = WaveformGenerator::new(ChipModel::Mos8580);
        generator.write_control(0x30);
        generator.set_accumulator(0x900000);
        generator.set_waveform_output(&source);
        assert_eq!(generator.accumulator(), 0x900000);
    }

    #[test]
    fn test_ring_mod_flips_triangle_with_source_msb() {
        let mut source = WaveformGenerator::new(ChipModel::Mos6581);
        let mut generator = WaveformGenerator::new(ChipModel::Mos6581);
        generator.write_control(0x14);
        generator.set_accumulator(0x200000);

        source.set_accumulator(0x800000);
        generator.set_waveform_output(&source);
        assert_eq!(generator.waveform_output(), 0x400);

        source.set_accumulator(0x000000);
        generator.set_waveform_output(&source);
        assert_eq!(generator.waveform_output(), 0xbfe);
    }

    #[test]
    fn test_noise_combination_writes_back() {
        let source = WaveformGenerator::new(ChipModel::Mos6581);
        let mut generator = WaveformGenerator::new(ChipModel::Mos6581);
        generator.write_control(0xa0);
        generator.set_waveform_output(&source);
        assert_eq!(generator.waveform_output(), 0);
        assert_eq!(generator.noise().value(), 0x6bb5da);
        assert_eq!(generator.noise().output(), 0);
    }

    #[test]
    fn test_floating_output_decay() {
        let source = WaveformGenerator::new(ChipModel::Mos6581);
        let mut generator = WaveformGenerator::new(ChipModel::Mos6581);
        generator.write_control(0x20);
        generator.set_accumulator(0x800000);
        generator.set_waveform_output(&source);
        assert_eq!(generator.waveform_output(), 0x800);

        generator.write_control(0x00);
        let ttl = ChipModel::Mos6581.floating_output_ttl_cycles();
        assert_eq!(generator.floating_output_ttl(), ttl);
        for _ in 0..ttl - 1 {
            generator.set_waveform_output(&source);
        }
        assert_eq!(generator.waveform_output(), 0x800);
        generator.set_waveform_output(&source);
        assert_eq!(generator.waveform_output(), 0);
        assert_eq!(generator.osc3(), 0);
    }

    #[test]
    fn test_floating_output_delta_clamps() {
        let source = WaveformGenerator::new(ChipModel::Mos8580);
        let mut generator = WaveformGenerator::new(ChipModel::Mos8580);
        generator.write_control(0x20);
        generator.set_accumulator(0x400000);
        generator.set_waveform_output_delta(1, &source);
        generator.write_control(0x00);

        generator.set_waveform_output_delta(4_000_000, &source);
        assert_eq!(generator.waveform_output(), 0x400);
        generator.set_waveform_output_delta(1_000_000, &source);
        assert_eq!(generator.floating_output_ttl(), 0);
        assert_eq!(generator.waveform_output(), 0);
    }

    #[test]
    fn test_reset_keeps_accumulator() {
        let mut generator = with_freq(ChipModel::Mos6581, 0x1111);
        generator.write_control(0x41);
        generator.clock();
        let accumulator = generator.accumulator();
        generator.reset();
        assert_eq!(generator.accumulator(), accumulator);
        assert_eq!(generator.frequency(), 0);
        assert!(generator.waveform().is_empty());
        assert_eq!(generator.noise().value(), 0x7fffff);
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let source = WaveformGenerator::new(ChipModel::Mos6581);
        let mut generator = with_freq(ChipModel::Mos6581, 0x3333);
        generator.write_pw_hi(0x07);
        generator.write_control(0x56);
        for _ in 0..777 {
            generator.clock();
            generator.set_waveform_output(&source);
        }

        let json = serde_json::to_string(&generator.snapshot()).unwrap();
        let state: WaveformState = serde_json::from_str(&json).unwrap();
        let mut restored = WaveformGenerator::new(ChipModel::Mos6581);
        restored.restore(&state);
        assert_eq!(restored.snapshot(), generator.snapshot());

        for _ in 0..100 {
            generator.clock();
            generator.set_waveform_output(&source);
            restored.clock();
            restored.set_waveform_output(&source);
            assert_eq!(restored.waveform_output(), generator.waveform_output());
        }
    }

    #[test]
    fn test_noise_pulse_crosstalk() {
        for model in ChipModel::ALL {
            let source = WaveformGenerator::new(model);
            let mut generator = WaveformGenerator::new(model);
            // Noise output 0xff0, pulse high: both models settle on 0xfc0
            generator.write_control(0xc0);
            generator.set_waveform_output(&source);
            assert_eq!(generator.waveform_output(), 0xfc0, "{}", model);
            assert_eq!(generator.osc3(), 0xfc0, "{}", model);
            assert_eq!(generator.read_osc(), 0xfc, "{}", model);
        }
    }

    #[test]
    fn test_noise_pulse_low_pulse_is_silent() {
        for model in ChipModel::ALL {
            let source = WaveformGenerator::new(model);
            let mut generator = WaveformGenerator::new(model);
            generator.write_pw_hi(0x08);
            generator.write_control(0xc0);
            generator.set_waveform_output(&source);
            assert_eq!(generator.waveform_output(), 0, "{}", model);
        }
    }

    #[test]
    fn test_8580_tri_saw_latch_with_noise_mask() {
        let source = WaveformGenerator::new(ChipModel::Mos8580);
        let mut generator = WaveformGenerator::new(ChipModel::Mos8580);
        generator.write_control(0x90);
        generator.set_waveform_output(&source);
        // Triangle at index 0 is silent, the latch still holds 0x555
        assert_eq!(generator.waveform_output(), 0);
        assert_eq!(generator.osc3(), 0x555 & 0xff0);

        generator.set_waveform_output(&source);
        assert_eq!(generator.osc3(), 0);
    }

    #[test]
    fn test_frequency_helpers() {
        // 7492.504 truncates
        assert_eq!(frequency_register(440.0, crate::clock::PAL), 7492);
        assert_eq!(frequency_register(0.0, crate::clock::PAL), 0);
        assert_eq!(frequency_register(10_000.0, crate::clock::PAL), 0xffff);
        assert_eq!(pulse_width_register(25.0), 1024);
        assert_eq!(pulse_width_register(150.0), 4095);
    }
}
