//! Framing-detector DFA (spec §6).
//!
//! NETCONF 1.0 frames end with the `]]>]]>` sentinel; 1.1 uses chunked
//! framing (`\n#<size>\n...\n##\n`). The discipline is auto-detected per
//! device from the first exchange and then stored on the handle
//! (`cdh_frame_state`/`cdh_frame_size` in original_source).

use crate::domain::value_objects::FramingDiscipline;

/// Detector state machine driving byte-at-a-time frame boundary detection.
///
/// This is deliberately small: the transport layer (out of scope) feeds
/// bytes through `FrameDetector::consume`, this core tracks only the
/// handful of bits needed to know when a frame is complete and how many
/// more bytes are expected for a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    /// No pending partial match of the EOM sentinel or chunk header.
    Idle,
    /// Mid-way through matching the `]]>]]>` sentinel (count of bytes matched so far).
    MatchingSentinel(u8),
    /// Reading a chunk-size header for NETCONF 1.1 framing.
    ReadingChunkHeader,
    /// Inside a chunk body; the handle's expected-byte-count tracks the remainder.
    InChunkBody,
}

/// Per-device framing state: which discipline is in use (once known), the
/// detector's current DFA state, and how many more bytes are expected
/// before the next boundary decision.
#[derive(Debug, Clone)]
pub struct FramingState {
    discipline: Option<FramingDiscipline>,
    detector: DetectorState,
    expected_bytes: usize,
}

impl FramingState {
    pub fn new() -> Self {
        Self {
            discipline: None,
            detector: DetectorState::Idle,
            expected_bytes: 0,
        }
    }

    pub fn discipline(&self) -> Option<FramingDiscipline> {
        self.discipline
    }

    /// Capability exchange determines which framing discipline a device
    /// uses; called once, at most, per connection.
    pub fn set_discipline(&mut self, discipline: FramingDiscipline) {
        self.discipline = Some(discipline);
        self.detector = match discipline {
            FramingDiscipline::EndOfMessage => DetectorState::Idle,
            FramingDiscipline::ChunkedFramed => DetectorState::ReadingChunkHeader,
        };
    }

    pub fn detector_state(&self) -> DetectorState {
        self.detector
    }

    pub fn set_detector_state(&mut self, state: DetectorState) {
        self.detector = state;
    }

    pub fn expected_bytes(&self) -> usize {
        self.expected_bytes
    }

    pub fn set_expected_bytes(&mut self, n: usize) {
        self.expected_bytes = n;
    }
}

impl Default for FramingState {
    fn default() -> Self {
        Self::new()
    }
}
