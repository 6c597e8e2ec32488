//! Noise shift register
//!
//! 23-bit Fibonacci LFSR with taps at bits 22 and 17. The shift is triggered
//! by a rising edge on accumulator bit 19, but the chip latches the clock in
//! two phases so the register actually shifts two cycles after the edge.
//! Eight register bits are wired to the top eight oscillator output lines.

/// Register value after reset and at power on
pub const SHIFT_REGISTER_RESET: u32 = 0x7f_ffff;

const SHIFT_REGISTER_MASK: u32 = 0x7f_ffff;

/// Register bits that drive output bits 11..4 (and receive write-back)
const OUTPUT_TAPS: u32 =
    (1 << 20) | (1 << 18) | (1 << 14) | (1 << 11) | (1 << 9) | (1 << 5) | (1 << 2) | (1 << 0);

/// Noise LFSR with the shift pipeline and the TEST-held reset countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoiseShiftRegister {
    value: u32,
    /// Cycles until TEST-held reset, 0 when inactive
    reset_countdown: i32,
    /// Cycles until a latched shift happens, 0 when idle
    pipeline: i32,
    output: u16,
}

impl NoiseShiftRegister {
    /// Create a register in its reset state (all ones)
    pub fn new() -> Self {
        let mut sr = Self {
            value: SHIFT_REGISTER_RESET,
            reset_countdown: 0,
            pipeline: 0,
            output: 0,
        };
        sr.update_output();
        sr
    }

    /// Current 23-bit register value
    #[inline]
    pub fn value(&self) -> u32 {
        self.value
    }

    /// 12-bit noise output (bits 3..0 always clear)
    #[inline]
    pub fn output(&self) -> u16 {
        self.output
    }

    /// Remaining cycles of the TEST-held reset countdown
    #[inline]
    pub fn reset_countdown(&self) -> i32 {
        self.reset_countdown
    }

    /// Remaining cycles of the shift pipeline
    #[inline]
    pub fn pipeline(&self) -> i32 {
        self.pipeline
    }

    /// Shift once
    #[inline]
    pub fn clock(&mut self) {
        let bit0 = ((self.value >> 22) ^ (self.value >> 17)) & 1;
        self.value = ((self.value << 1) | bit0) & SHIFT_REGISTER_MASK;
        self.update_output();
    }

    /// Reset to all ones and cancel the reset countdown
    pub fn reset(&mut self) {
        self.value = SHIFT_REGISTER_RESET;
        self.reset_countdown = 0;
        self.update_output();
    }

    /// Latch a shift: it takes effect two cycles later
    #[inline]
    pub(crate) fn arm_pipeline(&mut self) {
        self.pipeline = 2;
    }

    /// Advance the shift pipeline by one cycle
    #[inline]
    pub(crate) fn step_pipeline(&mut self) {
        if self.pipeline != 0 {
            self.pipeline -= 1;
            if self.pipeline == 0 {
                self.clock();
            }
        }
    }

    /// Drop any latched shift
    #[inline]
    pub(crate) fn flush_pipeline(&mut self) {
        self.pipeline = 0;
    }

    /// Start the countdown to an automatic reset while TEST is held
    pub(crate) fn schedule_reset(&mut self, cycles: i32) {
        self.reset_countdown = cycles;
    }

    /// One TEST-held cycle of the reset countdown
    #[inline]
    pub(crate) fn count_down_reset(&mut self) {
        if self.reset_countdown != 0 {
            self.reset_countdown -= 1;
            if self.reset_countdown == 0 {
                self.reset();
            }
        }
    }

    /// `delta_t` TEST-held cycles of the reset countdown
    #[inline]
    pub(crate) fn count_down_reset_by(&mut self, delta_t: i32) {
        if self.reset_countdown != 0 {
            self.reset_countdown -= delta_t;
            if self.reset_countdown <= 0 {
                self.reset();
            }
        }
    }

    /// Half shift completed when TEST is released
    ///
    /// The feedback path is held inverted while TEST is set, so the bit
    /// shifted in is the complement of bit 17 alone.
    pub(crate) fn release_test(&mut self) {
        let bit0 = (!self.value >> 17) & 1;
        self.value = ((self.value << 1) | bit0) & SHIFT_REGISTER_MASK;
        self.update_output();
    }

    /// Combined-waveform write-back
    ///
    /// When noise is selected together with another waveform, the output
    /// lines pull the tapped register bits low. Bits cleared this way stay
    /// cleared until the register is reset.
    #[inline]
    pub(crate) fn write_back(&mut self, waveform_output: u16) {
        let wo = waveform_output as u32;
        self.value &= !OUTPUT_TAPS
            | ((wo & 0x800) << 9)
            | ((wo & 0x400) << 8)
            | ((wo & 0x200) << 5)
            | ((wo & 0x100) << 3)
            | ((wo & 0x080) << 2)
            | ((wo & 0x040) >> 1)
            | ((wo & 0x020) >> 3)
            | ((wo & 0x010) >> 4);
        self.output &= waveform_output;
    }

    /// Restore raw fields, masking each to its width
    pub(crate) fn restore(&mut self, value: u32, reset_countdown: i32, pipeline: i32) {
        self.value = value & SHIFT_REGISTER_MASK;
        self.reset_countdown = reset_countdown.max(0);
        self.pipeline = pipeline.clamp(0, 2);
        self.update_output();
    }

    #[inline]
    fn update_output(&mut self) {
        let sr = self.value;
        self.output = (((sr & 0x100000) >> 9)
            | ((sr & 0x040000) >> 8)
            | ((sr & 0x004000) >> 5)
            | ((sr & 0x000800) >> 3)
            | ((sr & 0x000200) >> 2)
            | ((sr & 0x000020) << 1)
            | ((sr & 0x000004) << 3)
            | ((sr & 0x000001) << 4)) as u16;
    }
}

impl Default for NoiseShiftRegister {
    fn default() -> Self {
        Self::new()
    }
}
