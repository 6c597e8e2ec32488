//! Oscillator DAC model
//!
//! The 12-bit oscillator DAC is an R-2R ladder. On the 6581 the 2R/R ratio is
//! about 2.20 and the ladder has no termination resistor, so the weight of
//! each bit is slightly off and the transfer curve has non-monotonic steps at
//! major carries (0x7ff -> 0x800 drops). The 8580 ladder is matched and
//! terminated and is very close to linear.
//!
//! Tables are generated once per model and shared by every voice.

use std::sync::OnceLock;

use crate::chip_model::ChipModel;

/// DAC transfer table: 12-bit code -> output level (0..=4095)
pub type DacTable = [u16; 4096];

const DAC_BITS: usize = 12;

/// Open circuit stand-in for the missing termination resistor
const R_INFINITY: f64 = 1e6;

impl ChipModel {
    const fn r2r_ratio(self) -> f64 {
        match self {
            ChipModel::Mos6581 => 2.20,
            ChipModel::Mos8580 => 2.00,
        }
    }

    const fn dac_terminated(self) -> bool {
        matches!(self, ChipModel::Mos8580)
    }
}

/// Voltage seen at the ladder output when only `set_bit` is driven high
fn bit_voltage(set_bit: usize, r2: f64, terminated: bool) -> f64 {
    let r = 1.0;
    let mut vn = 1.0;
    let mut rn = if terminated { r2 } else { R_INFINITY };

    // Tail resistance below the driven bit
    for _ in 0..set_bit {
        rn = if rn == R_INFINITY {
            r + r2
        } else {
            r + r2 * rn / (r2 + rn)
        };
    }

    // Source transformation at the driven bit
    if rn == R_INFINITY {
        rn = r2;
    } else {
        rn = r2 * rn / (r2 + rn);
        vn = vn * rn / r2;
    }

    // Walk up the ladder towards the output
    for _ in (set_bit + 1)..DAC_BITS {
        rn += r;
        let i = vn / rn;
        rn = r2 * rn / (r2 + rn);
        vn = rn * i;
    }

    vn
}

fn build_dac_table(model: ChipModel) -> Box<DacTable> {
    let r2 = model.r2r_ratio();
    let terminated = model.dac_terminated();

    let mut weights = [0.0f64; DAC_BITS];
    for (bit, weight) in weights.iter_mut().enumerate() {
        *weight = bit_voltage(bit, r2, terminated);
    }

    let scale = ((1 << DAC_BITS) - 1) as f64;
    let mut table = Box::new([0u16; 4096]);
    for (code, slot) in table.iter_mut().enumerate() {
        // Superposition of every set bit
        let vo: f64 = weights
            .iter()
            .enumerate()
            .filter(|(bit, _)| code & (1 << bit) != 0)
            .map(|(_, w)| w)
            .sum();
        *slot = (scale * vo + 0.5) as u16;
    }

    log::debug!("generated {} oscillator DAC table", model);
    table
}

static DAC_TABLES: OnceLock<[Box<DacTable>; 2]> = OnceLock::new();

/// Shared DAC table for `model`
pub fn dac_table(model: ChipModel) -> &'static DacTable {
    let tables = DAC_TABLES.get_or_init(|| ChipModel::ALL.map(build_dac_table));
    &tables[model.index()]
}
