//! Voice register definitions
//!
//! Each SID voice exposes seven write-only registers. The oscillator uses the
//! first five; attack/decay and sustain/release belong to the envelope
//! generator and are decoded here only so callers can route them.

use std::fmt;

use bitflags::bitflags;

/// Per-voice register offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoiceRegister {
    /// Frequency (low byte) - offset 0
    FreqLo = 0x00,
    /// Frequency (high byte) - offset 1
    FreqHi = 0x01,
    /// Pulse width (low byte) - offset 2
    PwLo = 0x02,
    /// Pulse width (high nibble) - offset 3
    PwHi = 0x03,
    /// Control: waveform select, TEST, RING MOD, SYNC, GATE - offset 4
    Control = 0x04,
    /// Envelope attack/decay - offset 5
    AttackDecay = 0x05,
    /// Envelope sustain/release - offset 6
    SustainRelease = 0x06,
}

impl VoiceRegister {
    /// Convert a voice-relative offset (0-6)
    pub fn from_offset(offset: u8) -> Option<Self> {
        match offset {
            0x00 => Some(VoiceRegister::FreqLo),
            0x01 => Some(VoiceRegister::FreqHi),
            0x02 => Some(VoiceRegister::PwLo),
            0x03 => Some(VoiceRegister::PwHi),
            0x04 => Some(VoiceRegister::Control),
            0x05 => Some(VoiceRegister::AttackDecay),
            0x06 => Some(VoiceRegister::SustainRelease),
            _ => None,
        }
    }

    /// Voice-relative offset
    pub fn offset(&self) -> u8 {
        *self as u8
    }

    /// Whether the oscillator latches this register
    pub fn is_oscillator_register(&self) -> bool {
        self.offset() <= VoiceRegister::Control.offset()
    }
}

impl fmt::Display for VoiceRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoiceRegister::FreqLo => write!(f, "FREQ_LO"),
            VoiceRegister::FreqHi => write!(f, "FREQ_HI"),
            VoiceRegister::PwLo => write!(f, "PW_LO"),
            VoiceRegister::PwHi => write!(f, "PW_HI"),
            VoiceRegister::Control => write!(f, "CONTROL"),
            VoiceRegister::AttackDecay => write!(f, "ATTACK_DECAY"),
            VoiceRegister::SustainRelease => write!(f, "SUSTAIN_RELEASE"),
        }
    }
}

bitflags! {
    /// Control register bitflags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ControlFlags: u8 {
        /// Envelope gate (ignored by the oscillator)
        const GATE = 0x01;
        /// Hard sync to the sync source
        const SYNC = 0x02;
        /// Ring modulate triangle with the sync source MSB
        const RING_MOD = 0x04;
        /// Reset and hold the accumulator
        const TEST = 0x08;
        /// Triangle waveform
        const TRIANGLE = 0x10;
        /// Sawtooth waveform
        const SAWTOOTH = 0x20;
        /// Pulse waveform
        const PULSE = 0x40;
        /// Noise waveform
        const NOISE = 0x80;
    }
}

bitflags! {
    /// Waveform selector (control register high nibble)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Waveform: u8 {
        /// Triangle
        const TRIANGLE = 0x1;
        /// Sawtooth
        const SAWTOOTH = 0x2;
        /// Pulse
        const PULSE = 0x4;
        /// Noise
        const NOISE = 0x8;
    }
}

impl ControlFlags {
    /// Create control flags from raw register value
    pub fn from_register(value: u8) -> Self {
        ControlFlags::from_bits_truncate(value)
    }

    /// Selected waveform nibble
    pub fn waveform(&self) -> Waveform {
        Waveform::from_bits_truncate(self.bits() >> 4)
    }
}

impl Waveform {
    /// Noise combined with at least one other waveform
    #[inline]
    pub fn is_noise_combined(&self) -> bool {
        self.bits() > Waveform::NOISE.bits()
    }
}
