//! Tick-driven sample acquisition and burst gating
//!
//! [`Acquirer::tick`] runs once per converter reading, in interrupt context
//! on real hardware, so its body is O(1), branch-light and allocation-free.
//! Outside a capture it feeds the raw reading to the signal-presence state
//! machine; during a capture it scales the reading and stores it through the
//! [`SampleWriter`](crate::buffer::SampleWriter).
//!
//! Gating: a burst is only armed after a debounced stretch of silence, and a
//! fixed guard interval is skipped after onset so the transient attack never
//! lands in the capture window.

use crate::buffer::SampleWriter;
use crate::config::ReceiverConfig;
use log::{debug, trace};

/// Where the acquirer is in the silence / burst / capture cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalState {
    /// Waiting for the noise floor: counts down consecutive quiet ticks.
    SearchingSilence,
    /// Armed; a single loud sample starts the burst.
    SearchingBurstStart,
    /// Burst started; skipping the onset transient.
    Guard,
    /// Filling the active buffer, one sample per tick.
    Capturing,
}

/// Owns the per-tick side of the pipeline: state machine, cursor and the
/// producer half of the buffer pair.
pub struct Acquirer {
    writer: SampleWriter,
    state: SignalState,
    countdown: u32,
    cursor: usize,
    midpoint: i32,
    silence_threshold: i32,
    burst_threshold: i32,
    silence_ticks: u32,
    guard_ticks: u32,
    shift: i8,
}

impl Acquirer {
    pub fn new(config: &ReceiverConfig, writer: SampleWriter) -> Self {
        Self {
            writer,
            state: SignalState::SearchingSilence,
            countdown: config.silence_ticks,
            cursor: 0,
            midpoint: config.adc_midpoint as i32,
            silence_threshold: config.silence_threshold as i32,
            burst_threshold: config.burst_threshold as i32,
            silence_ticks: config.silence_ticks,
            guard_ticks: config.guard_ticks,
            shift: config.sample_shift(),
        }
    }

    pub fn state(&self) -> SignalState {
        self.state
    }

    /// Samples written into the active buffer so far.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Process one raw converter reading.
    pub fn tick(&mut self, raw: u16) {
        match self.state {
            SignalState::SearchingSilence => {
                if self.deviation(raw) < self.silence_threshold {
                    self.countdown -= 1;
                    if self.countdown == 0 {
                        trace!("noise floor settled, armed for burst");
                        self.state = SignalState::SearchingBurstStart;
                    }
                } else {
                    // any loud sample restarts the debounce
                    self.countdown = self.silence_ticks;
                }
            }
            SignalState::SearchingBurstStart => {
                if self.deviation(raw) >= self.burst_threshold {
                    trace!("burst onset, guarding {} ticks", self.guard_ticks);
                    self.state = SignalState::Guard;
                    self.countdown = self.guard_ticks;
                }
            }
            SignalState::Guard => {
                self.countdown -= 1;
                if self.countdown == 0 {
                    self.cursor = 0;
                    self.state = SignalState::Capturing;
                }
            }
            SignalState::Capturing => {
                if self.cursor < self.writer.len() {
                    let sample = scale_sample(raw, self.midpoint, self.shift);
                    self.writer.write(self.cursor, sample);
                    self.cursor += 1;
                } else {
                    // buffer full: this tick carries no sample, never writes
                    // out of bounds, and hands the buffer to the main loop
                    if !self.writer.publish() {
                        debug!("consumer still busy, burst dropped");
                    }
                    self.cursor = 0;
                    self.countdown = self.silence_ticks;
                    self.state = SignalState::SearchingSilence;
                }
            }
        }
    }

    #[inline]
    fn deviation(&self, raw: u16) -> i32 {
        (raw as i32 - self.midpoint).abs()
    }
}

/// Offset a raw reading around the midpoint and apply the configured shift.
///
/// A positive shift boosts quiet inputs toward the full signed 16-bit range;
/// with a nonzero shift offset the result can clip, which the original
/// design accepts in exchange for headroom on faint signals.
#[inline]
fn scale_sample(raw: u16, midpoint: i32, shift: i8) -> i16 {
    let offset = raw as i32 - midpoint;
    let scaled = if shift >= 0 {
        offset << shift
    } else {
        offset >> -shift
    };
    scaled as i16
}
