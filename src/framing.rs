//! Frame validation
//!
//! A frame is the decoded symbol bytes with the last byte as the CRC-8
//! trailer. Validation either yields the payload or nothing; a mismatched
//! frame is dropped without a trace beyond a debug line, and the next burst
//! is decoded with no memory of the failure.

use crate::checksum::crc8_remainder;
use crate::config::ReceiverConfig;
use log::debug;

#[derive(Debug, Clone)]
pub struct FrameValidator {
    polynomial: u8,
}

impl FrameValidator {
    pub fn new(config: &ReceiverConfig) -> Self {
        Self {
            polynomial: config.checksum_polynomial,
        }
    }

    /// Check the trailer and return the payload on a match.
    ///
    /// The payload is every byte the checksum covered. Frames shorter than
    /// payload-plus-trailer cannot be valid.
    pub fn validate<'a>(&self, frame: &'a [u8]) -> Option<&'a [u8]> {
        if frame.len() < 2 {
            return None;
        }
        let (trailer, payload) = frame.split_last()?;
        let computed = crc8_remainder(payload, self.polynomial);
        if computed == *trailer {
            Some(payload)
        } else {
            debug!(
                "frame discarded: checksum {:02X} != trailer {:02X}",
                computed, trailer
            );
            None
        }
    }
}
