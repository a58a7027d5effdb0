use crate::config::ModemConfig;
use crate::error::{ModemError, Result};
use crate::frame;
use log::debug;
use std::time::Duration;

/// One frequency-set event on the output timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSegment {
    pub frequency_hz: f32,
    /// Offset from the moment the schedule is handed to the emitter.
    pub start: Duration,
}

/// A complete transmission plan: start bit, data bits, stop instant.
///
/// Fully determined before any sound is produced; there is no
/// mid-transmission re-scheduling. Segments are strictly increasing in
/// time by construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ToneSchedule {
    pub segments: Vec<ToneSegment>,
    pub stop: Duration,
}

impl ToneSchedule {
    /// Wall time from hand-off to the end of the last bit slot.
    pub fn duration(&self) -> Duration {
        self.stop
    }
}

/// Maps a text message to a tone schedule. Actual sound production is
/// delegated to a [`crate::ToneEmitter`].
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    config: ModemConfig,
}

impl Encoder {
    pub fn new(config: ModemConfig) -> Self {
        Self { config }
    }

    /// Build the frame schedule for `message`.
    ///
    /// The first segment is the start bit at the high carrier, beginning
    /// after the guard delay so the output path has settled. Data bit `i`
    /// follows at `guard_delay + (i + 1) * bit_duration`, high carrier
    /// for 1 and low for 0, and the stop lands one slot after the last
    /// bit. Messages should be 7-bit ASCII; other characters are
    /// truncated to their low 8 bits (see [`frame::message_bits`]).
    pub fn encode(&self, message: &str) -> Result<ToneSchedule> {
        if message.is_empty() {
            return Err(ModemError::EmptyMessage);
        }

        let bits = frame::message_bits(message);
        let t0 = self.config.guard_delay;

        let mut segments = Vec::with_capacity(bits.len() + 1);
        segments.push(ToneSegment {
            frequency_hz: self.config.high_freq_hz,
            start: t0,
        });

        for (i, &bit) in bits.iter().enumerate() {
            let frequency_hz = if bit {
                self.config.high_freq_hz
            } else {
                self.config.low_freq_hz
            };
            segments.push(ToneSegment {
                frequency_hz,
                start: t0 + self.config.bit_duration * (i as u32 + 1),
            });
        }

        let stop = t0 + self.config.bit_duration * (bits.len() as u32 + 1);
        debug!(
            "encoded {} bits into {} tone segments, {:?} on air",
            bits.len(),
            segments.len(),
            stop
        );

        Ok(ToneSchedule { segments, stop })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_count_is_bits_plus_start() {
        let encoder = Encoder::default();
        for message in ["A", "hi", "0123456789"] {
            let schedule = encoder.encode(message).unwrap();
            assert_eq!(schedule.segments.len(), 8 * message.len() + 1);
        }
    }

    #[test]
    fn test_first_segment_is_start_bit() {
        let config = ModemConfig::default();
        let schedule = Encoder::new(config.clone()).encode("x").unwrap();
        let first = schedule.segments[0];
        assert_eq!(first.frequency_hz, config.high_freq_hz);
        assert_eq!(first.start, config.guard_delay);
    }

    #[test]
    fn test_schedule_is_monotonic() {
        let schedule = Encoder::default().encode("monotonic").unwrap();
        for pair in schedule.segments.windows(2) {
            assert!(pair[0].start < pair[1].start);
        }
        assert!(schedule.stop > schedule.segments.last().unwrap().start);
    }

    #[test]
    fn test_bit_frequencies_match_message() {
        // 'A' = 01000001: bits 1 and 7 ride the high carrier
        let config = ModemConfig::default();
        let schedule = Encoder::new(config.clone()).encode("A").unwrap();
        let data = &schedule.segments[1..];
        for (i, segment) in data.iter().enumerate() {
            let expected = if i == 1 || i == 7 {
                config.high_freq_hz
            } else {
                config.low_freq_hz
            };
            assert_eq!(segment.frequency_hz, expected, "bit {}", i);
        }
    }

    #[test]
    fn test_stop_one_slot_after_last_bit() {
        let config = ModemConfig::default();
        let schedule = Encoder::new(config.clone()).encode("ab").unwrap();
        let expected = config.guard_delay + config.bit_duration * 17;
        assert_eq!(schedule.stop, expected);
        assert_eq!(schedule.duration(), expected);
    }

    #[test]
    fn test_empty_message_rejected() {
        assert!(matches!(
            Encoder::default().encode(""),
            Err(ModemError::EmptyMessage)
        ));
    }
}
