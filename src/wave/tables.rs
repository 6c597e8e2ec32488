//! Waveform lookup tables
//!
//! Each chip model has eight 4096-entry tables indexed by `waveform & 7` and
//! the upper 12 bits of the (ring-modulated) accumulator:
//!
//! | slot | selection               | content                               |
//! |------|-------------------------|---------------------------------------|
//! | 0    | none / noise            | all ones (mask only)                  |
//! | 1    | triangle                | folded accumulator                    |
//! | 2    | sawtooth                | accumulator                           |
//! | 3    | sawtooth + triangle     | combined                              |
//! | 4    | pulse                   | all ones (pulse masks the output)     |
//! | 5    | pulse + triangle        | combined                              |
//! | 6    | pulse + sawtooth        | combined                              |
//! | 7    | pulse + sawtooth + tri  | combined                              |
//!
//! Combined waveforms on the real chip come from the selected waveform
//! outputs shorting the shared DAC input lines. They are generated from a
//! parametric model: each output bit is pulled towards the average of its
//! neighbours (weighted by distance), with the pulse line acting as an extra
//! strong input, and the result is thresholded against a per-model bias.

use std::sync::OnceLock;

use crate::chip_model::ChipModel;

/// One waveform table: 12-bit accumulator index -> 12-bit output
pub type WaveTable = [u16; 4096];

/// Parameters fitted to sampled chip output
#[derive(Debug, Clone, Copy)]
struct CombinedWaveformConfig {
    bias: f32,
    pulse_strength: f32,
    top_bit: f32,
    distance: f32,
    st_mix: f32,
}

impl CombinedWaveformConfig {
    const fn new(bias: f32, pulse_strength: f32, top_bit: f32, distance: f32, st_mix: f32) -> Self {
        Self {
            bias,
            pulse_strength,
            top_bit,
            distance,
            st_mix,
        }
    }
}

/// Per model: sawtooth+triangle, pulse+triangle, pulse+sawtooth, all three
const COMBINED_CONFIG: [[CombinedWaveformConfig; 4]; 2] = [
    // 6581
    [
        CombinedWaveformConfig::new(0.880815, 0.0, 0.0, 0.3279614, 0.5999545),
        CombinedWaveformConfig::new(0.8924618, 2.014781, 1.003332, 0.02992322, 0.0),
        CombinedWaveformConfig::new(0.8646501, 1.712586, 1.137704, 0.02845423, 0.0),
        CombinedWaveformConfig::new(0.9527834, 1.794777, 0.0, 0.09806272, 0.7752482),
    ],
    // 8580
    [
        CombinedWaveformConfig::new(0.9781665, 0.0, 0.9899469, 8.087667, 0.8226412),
        CombinedWaveformConfig::new(0.9097769, 2.039997, 0.9584096, 0.1765447, 0.0),
        CombinedWaveformConfig::new(0.9231212, 2.084788, 0.9493895, 0.1712518, 0.0),
        CombinedWaveformConfig::new(0.9845552, 1.415612, 0.9703883, 3.68829, 0.8265008),
    ],
];

fn combined_value(config: &CombinedWaveformConfig, waveform: usize, index: usize) -> u16 {
    let mut o = [0.0f32; 12];
    for (bit, level) in o.iter_mut().enumerate() {
        if index & (1 << bit) != 0 {
            *level = 1.0;
        }
    }

    if waveform & 3 == 1 {
        // Triangle: shift left, fold on the top bit
        let fold = index & 0x800 != 0;
        for bit in (1..12).rev() {
            o[bit] = if fold { 1.0 - o[bit - 1] } else { o[bit - 1] };
        }
        o[0] = 0.0;
    } else if waveform & 3 == 3 {
        // Sawtooth + triangle: each bit bleeds into the next one up
        o[0] *= config.st_mix;
        for bit in 1..12 {
            o[bit] = o[bit - 1] * (1.0 - config.st_mix) + o[bit] * config.st_mix;
        }
    }

    if waveform & 2 != 0 {
        o[11] *= config.top_bit;
    }

    if waveform == 3 || waveform > 4 {
        let mut distance = [0.0f32; 25];
        for (slot, weight) in distance.iter_mut().enumerate() {
            let offset = (slot as f32 - 12.0).abs();
            *weight = 1.0 / (1.0 + offset * offset * config.distance);
        }

        let mut pulled = [0.0f32; 12];
        for (bit, out) in pulled.iter_mut().enumerate() {
            let mut avg = 0.0f32;
            let mut n = 0.0f32;
            for (other, level) in o.iter().enumerate() {
                let weight = distance[bit + 12 - other];
                avg += level * weight;
                n += weight;
            }
            if waveform > 4 {
                let weight = distance[bit];
                avg += config.pulse_strength * weight;
                n += weight;
            }
            *out = (o[bit] + avg / n) * 0.5;
        }
        o = pulled;
    }

    o.iter()
        .enumerate()
        .filter(|(_, level)| **level > config.bias)
        .fold(0u16, |acc, (bit, _)| acc | (1 << bit))
}

/// The eight waveform tables of one chip model
pub struct WaveTables {
    tables: Box<[WaveTable]>,
}

impl WaveTables {
    fn new(model: ChipModel) -> Self {
        let mut tables = vec![[0u16; 4096]; 8].into_boxed_slice();

        for index in 0..4096 {
            let triangle = if index & 0x800 != 0 {
                (!index << 1) & 0xffe
            } else {
                (index << 1) & 0xffe
            };

            tables[0][index] = 0xfff;
            tables[1][index] = triangle as u16;
            tables[2][index] = index as u16;
            tables[4][index] = 0xfff;
        }

        let configs = &COMBINED_CONFIG[model.index()];
        for (config, waveform) in configs.iter().zip([3usize, 5, 6, 7]) {
            for index in 0..4096 {
                tables[waveform][index] = combined_value(config, waveform, index);
            }
        }

        log::debug!("generated {} waveform tables", model);
        Self { tables }
    }

    /// Table for the waveform selector (only the low three bits are used)
    #[inline]
    pub fn get(&self, waveform: u8) -> &WaveTable {
        &self.tables[(waveform & 7) as usize]
    }
}

static WAVE_TABLES: OnceLock<[WaveTables; 2]> = OnceLock::new();

/// Shared waveform tables for `model`
pub fn wave_tables(model: ChipModel) -> &'static WaveTables {
    let tables = WAVE_TABLES.get_or_init(|| ChipModel::ALL.map(WaveTables::new));
    &tables[model.index()]
}
