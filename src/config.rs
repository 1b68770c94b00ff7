use crate::error::{ReceiverError, Result};
use crate::{
    ADC_MIDPOINT, BINS_PER_SYMBOL, BIN_STRIDE, CHECKSUM_POLYNOMIAL, DEFAULT_BUFFER_LEN,
    FIRST_DATA_BIN, REFERENCE_BIN, SYMBOL_COUNT,
};

/// Build-time constants of the link, gathered in one place.
///
/// Every component takes what it needs from here at construction; nothing is
/// recomputed at runtime. The sample shift is derived, not stored: the
/// transform accumulates up to `buffer_len` terms, so samples must be scaled
/// such that `9 + shift + log2(buffer_len) == 15` to fill the signed 16-bit
/// range without overflow. [`ReceiverConfig::shift_offset`] boosts quiet
/// inputs beyond that bound at the cost of clipping risk.
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// Samples per acquisition buffer; must be a power of two.
    pub buffer_len: usize,
    /// Extra left shift on top of the derived no-overflow shift.
    pub shift_offset: i8,
    /// Raw converter reading treated as zero amplitude.
    pub adc_midpoint: u16,
    /// Deviation from midpoint below which a sample counts as silence.
    pub silence_threshold: u16,
    /// Deviation from midpoint at or above which a burst has started.
    pub burst_threshold: u16,
    /// Consecutive quiet ticks required before arming for a burst.
    pub silence_ticks: u32,
    /// Ticks skipped after burst onset before capture begins.
    pub guard_ticks: u32,
    /// CRC-8 polynomial, normal representation.
    pub checksum_polynomial: u8,
    /// Spectrum bin whose energy anchors the decision thresholds.
    pub reference_bin: usize,
    /// First bin of the first symbol group.
    pub first_data_bin: usize,
    /// Distance between the first bins of consecutive symbol groups.
    pub bin_stride: usize,
    /// Symbol bytes per frame, checksum trailer included.
    pub symbol_count: usize,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            buffer_len: DEFAULT_BUFFER_LEN,
            shift_offset: 4,
            adc_midpoint: ADC_MIDPOINT,
            silence_threshold: 8,
            burst_threshold: 96,
            silence_ticks: 64,
            guard_ticks: 16,
            checksum_polynomial: CHECKSUM_POLYNOMIAL,
            reference_bin: REFERENCE_BIN,
            first_data_bin: FIRST_DATA_BIN,
            bin_stride: BIN_STRIDE,
            symbol_count: SYMBOL_COUNT,
        }
    }
}

impl ReceiverConfig {
    /// Validate and return the configuration, consuming style for chaining.
    pub fn validated(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.buffer_len < 2 || !self.buffer_len.is_power_of_two() {
            return Err(ReceiverError::BufferLenNotPowerOfTwo(self.buffer_len));
        }
        if self.silence_threshold >= self.burst_threshold {
            return Err(ReceiverError::InvalidConfig(format!(
                "silence threshold {} must be below burst threshold {}",
                self.silence_threshold, self.burst_threshold
            )));
        }
        if self.silence_ticks == 0 || self.guard_ticks == 0 {
            return Err(ReceiverError::InvalidConfig(
                "silence and guard countdowns must be at least one tick".into(),
            ));
        }
        if self.symbol_count == 0 {
            return Err(ReceiverError::InvalidConfig(
                "at least one symbol per frame".into(),
            ));
        }
        if self.bin_stride == 0 {
            return Err(ReceiverError::InvalidConfig(
                "bin stride must be nonzero".into(),
            ));
        }
        let bins = self.spectrum_bins();
        if self.reference_bin >= bins {
            return Err(ReceiverError::BinLayoutOutOfRange {
                last_bin: self.reference_bin + 1,
                bins,
            });
        }
        let last_bin = self.first_data_bin + self.bin_stride * (self.symbol_count - 1)
            + BINS_PER_SYMBOL;
        if last_bin > bins {
            return Err(ReceiverError::BinLayoutOutOfRange { last_bin, bins });
        }
        Ok(())
    }

    /// Shift applied to midpoint-offset samples; negative means right shift.
    ///
    /// Derived from `9 + shift + log2(buffer_len) == 15`, plus the configured
    /// volume-boost offset.
    pub fn sample_shift(&self) -> i8 {
        let log2_len = self.buffer_len.trailing_zeros() as i8;
        (6 - log2_len) + self.shift_offset
    }

    /// Complex bins produced by the transform: half the buffer length.
    pub fn spectrum_bins(&self) -> usize {
        self.buffer_len / 2
    }
}
