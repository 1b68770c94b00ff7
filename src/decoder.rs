//! Spectral symbol decoder
//!
//! The transmitter keys one reference tone plus groups of four data tones,
//! each held at one of four amplitude levels. Decoding is scale-invariant:
//! the decision thresholds are fractions of the reference bin's squared
//! magnitude, so absolute volume drops out. With the reference at amplitude
//! `A`, the band edges sit at `A/6`, `A/2` and `5A/6` — squared, that is
//! `E_r/36`, `E_r/4` and `25*E_r/36` — giving four roughly equal-width
//! amplitude bands of two bits each.

use crate::config::ReceiverConfig;
use crate::fixed::square;
use crate::BINS_PER_SYMBOL;

/// A transformed buffer viewed as interleaved `(re, im)` frequency bins.
#[derive(Debug, Clone, Copy)]
pub struct Spectrum<'a> {
    bins: &'a [i16],
}

impl<'a> Spectrum<'a> {
    pub fn new(bins: &'a [i16]) -> Self {
        debug_assert!(bins.len() % 2 == 0);
        Self { bins }
    }

    pub fn bin_count(&self) -> usize {
        self.bins.len() / 2
    }

    /// Squared magnitude `re^2 + im^2` of one bin; at most `2^31`, so it
    /// always fits the `u32`.
    pub fn energy(&self, bin: usize) -> u32 {
        let re = self.bins[2 * bin];
        let im = self.bins[2 * bin + 1];
        square(re) + square(im)
    }
}

/// Maps bin energies to symbol bytes using the configured bin layout.
#[derive(Debug, Clone)]
pub struct SpectrumDecoder {
    reference_bin: usize,
    first_data_bin: usize,
    bin_stride: usize,
    symbol_count: usize,
}

impl SpectrumDecoder {
    pub fn new(config: &ReceiverConfig) -> Self {
        Self {
            reference_bin: config.reference_bin,
            first_data_bin: config.first_data_bin,
            bin_stride: config.bin_stride,
            symbol_count: config.symbol_count,
        }
    }

    /// Decode one symbol byte per configured bin group, in increasing
    /// frequency order.
    ///
    /// A silent reference (`E_r == 0`) collapses all three limits to zero, so
    /// every energetic bin reads as the top band. That decode is garbage but
    /// deterministic, and the frame checksum throws it away downstream.
    pub fn decode(&self, spectrum: &Spectrum<'_>) -> Vec<u8> {
        let reference = spectrum.energy(self.reference_bin);
        let limit1 = reference / 36;
        let limit2 = reference / 4;
        // widen: 25 * E_r can exceed u32 when the reference saturates
        let limit3 = (25 * reference as u64 / 36) as u32;

        (0..self.symbol_count)
            .map(|index| {
                let first = self.first_data_bin + index * self.bin_stride;
                decode_group(spectrum, first, limit1, limit2, limit3)
            })
            .collect()
    }
}

/// Classify four consecutive bins into two bits each, most significant bin
/// group first. Energies exactly on a limit fall into the lower band.
fn decode_group(spectrum: &Spectrum<'_>, first: usize, limit1: u32, limit2: u32, limit3: u32) -> u8 {
    let mut value = 0u8;
    for bin in first..first + BINS_PER_SYMBOL {
        let energy = spectrum.energy(bin);
        let band = if energy > limit3 {
            3
        } else if energy > limit2 {
            2
        } else if energy > limit1 {
            1
        } else {
            0
        };
        value = (value << 2) | band;
    }
    value
}
