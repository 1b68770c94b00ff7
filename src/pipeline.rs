//! Receiver main loop
//!
//! Composes the consumer side of the pipeline: block on a published buffer,
//! run the external in-place transform, decode symbols, validate the frame
//! and forward the payload. The transform and the output channel stay behind
//! traits — on hardware they are the fixed-point FFT and the serial port, in
//! tests a closure and a vector.

use crate::buffer::BufferReader;
use crate::config::ReceiverConfig;
use crate::decoder::{Spectrum, SpectrumDecoder};
use crate::framing::FrameValidator;
use crate::BINS_PER_SYMBOL;
use log::{trace, warn};
use std::io;

/// External frequency transform: same-length in-place, interleaved
/// `(re, im)` output, deterministic, no error path.
pub trait SpectrumTransform {
    fn transform(&mut self, buffer: &mut [i16]);
}

impl<F: FnMut(&mut [i16])> SpectrumTransform for F {
    fn transform(&mut self, buffer: &mut [i16]) {
        self(buffer)
    }
}

/// Output channel for validated payloads (or diagnostic dumps).
pub trait FrameSink {
    fn emit(&mut self, bytes: &[u8]);
}

impl<F: FnMut(&[u8])> FrameSink for F {
    fn emit(&mut self, bytes: &[u8]) {
        self(bytes)
    }
}

/// Adapts any [`io::Write`] into a sink. The link has no flow control and no
/// error channel upstream, so write failures are logged and dropped.
pub struct WriteSink<W: io::Write>(pub W);

impl<W: io::Write> FrameSink for WriteSink<W> {
    fn emit(&mut self, bytes: &[u8]) {
        if let Err(err) = self.0.write_all(bytes) {
            warn!("output channel write failed: {}", err);
        }
    }
}

/// What the main loop forwards to the sink.
///
/// The diagnostic modes replay the historical firmware variants that dumped
/// intermediate data instead of frames; `Frames` is the real behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Validated frame payloads only.
    #[default]
    Frames,
    /// The whole transformed buffer, big-endian `i16` words.
    RawSpectrum,
    /// Per-symbol-group bin energies, big-endian `u32` words.
    BinEnergies,
}

/// The main-loop half of the receiver.
pub struct Receiver<T, S> {
    reader: BufferReader,
    transform: T,
    sink: S,
    decoder: SpectrumDecoder,
    validator: FrameValidator,
    layout: GroupLayout,
    mode: OutputMode,
}

/// Bin-group walk for the diagnostic energy dump.
struct GroupLayout {
    first_data_bin: usize,
    bin_stride: usize,
    symbol_count: usize,
}

impl<T: SpectrumTransform, S: FrameSink> Receiver<T, S> {
    pub fn new(config: &ReceiverConfig, reader: BufferReader, transform: T, sink: S) -> Self {
        Self {
            reader,
            transform,
            sink,
            decoder: SpectrumDecoder::new(config),
            validator: FrameValidator::new(config),
            layout: GroupLayout {
                first_data_bin: config.first_data_bin,
                bin_stride: config.bin_stride,
                symbol_count: config.symbol_count,
            },
            mode: OutputMode::Frames,
        }
    }

    pub fn with_mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    /// Block until a buffer is published, process it, forward any output.
    ///
    /// Returns whether anything was emitted; in `Frames` mode that means a
    /// frame passed validation.
    pub fn run_once(&mut self) -> bool {
        let mut buffer = self.reader.wait_take();
        self.transform.transform(&mut buffer);
        let emitted = process(
            &buffer,
            &self.decoder,
            &self.validator,
            &self.layout,
            self.mode,
            &mut self.sink,
        );
        trace!("buffer processed, emitted: {}", emitted);
        emitted
    }

    /// Non-blocking variant: `None` when no buffer is pending.
    pub fn poll_once(&mut self) -> Option<bool> {
        let mut buffer = self.reader.try_take()?;
        self.transform.transform(&mut buffer);
        Some(process(
            &buffer,
            &self.decoder,
            &self.validator,
            &self.layout,
            self.mode,
            &mut self.sink,
        ))
    }

    /// Process buffers forever. Never returns; silence in, silence out.
    pub fn run(&mut self) {
        loop {
            self.run_once();
        }
    }
}

fn process<S: FrameSink>(
    spectrum_data: &[i16],
    decoder: &SpectrumDecoder,
    validator: &FrameValidator,
    layout: &GroupLayout,
    mode: OutputMode,
    sink: &mut S,
) -> bool {
    let spectrum = Spectrum::new(spectrum_data);
    match mode {
        OutputMode::Frames => {
            let symbols = decoder.decode(&spectrum);
            match validator.validate(&symbols) {
                Some(payload) => {
                    sink.emit(payload);
                    true
                }
                None => false,
            }
        }
        OutputMode::RawSpectrum => {
            let mut dump = Vec::with_capacity(spectrum_data.len() * 2);
            for &word in spectrum_data {
                dump.extend_from_slice(&word.to_be_bytes());
            }
            sink.emit(&dump);
            true
        }
        OutputMode::BinEnergies => {
            let mut dump = Vec::with_capacity(layout.symbol_count * BINS_PER_SYMBOL * 4);
            for group in 0..layout.symbol_count {
                let first = layout.first_data_bin + group * layout.bin_stride;
                for bin in first..first + BINS_PER_SYMBOL {
                    dump.extend_from_slice(&spectrum.energy(bin).to_be_bytes());
                }
            }
            sink.emit(&dump);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BufferPair;
    use crate::checksum::crc8_remainder;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Representative per-band tone amplitudes, comfortably inside each band
    /// for a reference amplitude of 60 (limits 100 / 900 / 2500).
    const BAND_AMPLITUDE: [i16; 4] = [0, 25, 45, 70];

    /// Build the interleaved spectrum a transmitter would produce for the
    /// given frame bytes, under the default bin layout.
    fn spectrum_for_frame(config: &ReceiverConfig, frame: &[u8]) -> Vec<i16> {
        let mut data = vec![0i16; config.buffer_len];
        data[2 * config.reference_bin] = 60;
        for (index, &byte) in frame.iter().enumerate() {
            let first = config.first_data_bin + index * config.bin_stride;
            for offset in 0..BINS_PER_SYMBOL {
                let band = (byte >> (2 * (BINS_PER_SYMBOL - 1 - offset))) & 0b11;
                data[2 * (first + offset)] = BAND_AMPLITUDE[band as usize];
            }
        }
        data
    }

    fn capture_sink() -> (Rc<RefCell<Vec<Vec<u8>>>>, impl FnMut(&[u8])) {
        let emitted = Rc::new(RefCell::new(Vec::new()));
        let handle = Rc::clone(&emitted);
        (emitted, move |bytes: &[u8]| {
            handle.borrow_mut().push(bytes.to_vec())
        })
    }

    #[test]
    fn test_valid_frame_reaches_sink() {
        let config = ReceiverConfig::default().validated().unwrap();
        let payload = [0x1B, 0x00, 0xC4, 0x3F, 0x91];
        let mut frame = payload.to_vec();
        frame.push(crc8_remainder(&payload, config.checksum_polynomial));
        let spectrum = spectrum_for_frame(&config, &frame);

        let (mut writer, reader) = BufferPair::new(config.buffer_len);
        assert!(writer.publish());

        let transform = move |buffer: &mut [i16]| buffer.copy_from_slice(&spectrum);
        let (emitted, sink) = capture_sink();
        let mut receiver = Receiver::new(&config, reader, transform, sink);

        assert_eq!(receiver.poll_once(), Some(true));
        assert_eq!(emitted.borrow().as_slice(), &[payload.to_vec()]);
    }

    #[test]
    fn test_corrupt_frame_is_silent() {
        let config = ReceiverConfig::default().validated().unwrap();
        let payload = [0x1B, 0x00, 0xC4, 0x3F, 0x91];
        // trailer guaranteed not to match
        let bad_trailer = crc8_remainder(&payload, config.checksum_polynomial) ^ 0xFF;
        let mut frame = payload.to_vec();
        frame.push(bad_trailer);
        let spectrum = spectrum_for_frame(&config, &frame);

        let (mut writer, reader) = BufferPair::new(config.buffer_len);
        assert!(writer.publish());

        let transform = move |buffer: &mut [i16]| buffer.copy_from_slice(&spectrum);
        let (emitted, sink) = capture_sink();
        let mut receiver = Receiver::new(&config, reader, transform, sink);

        assert_eq!(receiver.poll_once(), Some(false));
        assert!(emitted.borrow().is_empty());
    }

    #[test]
    fn test_poll_once_without_pending_buffer() {
        let config = ReceiverConfig::default().validated().unwrap();
        let (_writer, reader) = BufferPair::new(config.buffer_len);
        let (_emitted, sink) = capture_sink();
        let mut receiver = Receiver::new(&config, reader, |_: &mut [i16]| {}, sink);
        assert_eq!(receiver.poll_once(), None);
    }

    #[test]
    fn test_raw_spectrum_mode_dumps_words() {
        let config = ReceiverConfig::default().validated().unwrap();
        let (mut writer, reader) = BufferPair::new(config.buffer_len);
        for cursor in 0..config.buffer_len {
            writer.write(cursor, cursor as i16 - 3);
        }
        assert!(writer.publish());

        let (emitted, sink) = capture_sink();
        let mut receiver = Receiver::new(&config, reader, |_: &mut [i16]| {}, sink)
            .with_mode(OutputMode::RawSpectrum);
        assert_eq!(receiver.poll_once(), Some(true));

        let dump = emitted.borrow();
        assert_eq!(dump.len(), 1);
        assert_eq!(dump[0].len(), config.buffer_len * 2);
        assert_eq!(&dump[0][..4], &[0xFF, 0xFD, 0xFF, 0xFE]);
    }

    #[test]
    fn test_bin_energies_mode_dumps_groups() {
        let config = ReceiverConfig::default().validated().unwrap();
        let spectrum = spectrum_for_frame(&config, &[0xC0, 0, 0, 0, 0, 0]);

        let (mut writer, reader) = BufferPair::new(config.buffer_len);
        assert!(writer.publish());

        let transform = move |buffer: &mut [i16]| buffer.copy_from_slice(&spectrum);
        let (emitted, sink) = capture_sink();
        let mut receiver =
            Receiver::new(&config, reader, transform, sink).with_mode(OutputMode::BinEnergies);
        assert_eq!(receiver.poll_once(), Some(true));

        let dump = emitted.borrow();
        assert_eq!(dump[0].len(), config.symbol_count * BINS_PER_SYMBOL * 4);
        // first bin of group 0 carries band 3 (amplitude 70 => energy 4900)
        assert_eq!(&dump[0][..4], &4900u32.to_be_bytes());
        assert_eq!(&dump[0][4..8], &0u32.to_be_bytes());
    }

    #[test]
    fn test_write_sink_collects_payload_bytes() {
        let mut sink = WriteSink(Vec::new());
        sink.emit(&[1, 2, 3]);
        sink.emit(&[4]);
        assert_eq!(sink.0, vec![1, 2, 3, 4]);
    }
}
