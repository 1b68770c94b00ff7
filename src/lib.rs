//! Acoustic data link receiver core
//!
//! Audio-frequency tones encode quantized digits; this crate turns a stream of
//! raw analog readings into checksum-validated frames. The pipeline is the
//! classic interrupt-driven shape: a tick-rate acquisition side (signal
//! squelch state machine plus a double-buffered sample writer) hands full
//! buffers to a main-loop side that runs an in-place frequency transform,
//! quantizes bin energies into symbols and forwards frames whose trailing
//! CRC-8 matches. The transform itself and the physical I/O are external
//! collaborators behind the [`SpectrumTransform`] and [`FrameSink`] seams.

pub mod acquisition;
pub mod buffer;
pub mod checksum;
pub mod config;
pub mod decoder;
pub mod error;
pub mod fixed;
pub mod framing;
pub mod pipeline;

pub use acquisition::{Acquirer, SignalState};
pub use buffer::{BufferPair, BufferReader, ReadyBuffer, SampleWriter};
pub use config::ReceiverConfig;
pub use decoder::{Spectrum, SpectrumDecoder};
pub use error::{ReceiverError, Result};
pub use framing::FrameValidator;
pub use pipeline::{FrameSink, OutputMode, Receiver, SpectrumTransform, WriteSink};

// Observed link configuration
pub const DEFAULT_BUFFER_LEN: usize = 64;
pub const ADC_MIDPOINT: u16 = 512; // midpoint of the 10-bit converter range
pub const CHECKSUM_POLYNOMIAL: u8 = 0xCF;

// Spectrum layout: one reference tone, then symbol groups of 4 bins each,
// groups spaced BIN_STRIDE apart so adjacent symbols do not share bins
pub const REFERENCE_BIN: usize = 1;
pub const FIRST_DATA_BIN: usize = 3;
pub const BIN_STRIDE: usize = 5;
pub const BINS_PER_SYMBOL: usize = 4;
pub const SYMBOL_COUNT: usize = 6;
