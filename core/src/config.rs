use crate::error::{ModemError, Result};
use std::time::Duration;

/// Shortest guard delay the encoder will accept before the start bit
/// (the output path needs time to stabilize after scheduling).
pub const MIN_GUARD_DELAY: Duration = Duration::from_millis(100);

/// Protocol parameters for the acoustic link.
///
/// The frequency and timing fields are the wire contract: both ends must
/// agree on them or nothing decodes. The threshold fields were tuned
/// empirically on the 0-255 energy scale of typical byte-frequency-data
/// probes; they are exposed here rather than hard-coded so they can be
/// re-tuned per device against recorded microphone traces.
#[derive(Debug, Clone, PartialEq)]
pub struct ModemConfig {
    /// Tone representing bit 0
    pub low_freq_hz: f32,
    /// Tone representing bit 1 and the start bit
    pub high_freq_hz: f32,
    /// Time slot per bit
    pub bit_duration: Duration,
    /// Lead-in before the start bit, at least [`MIN_GUARD_DELAY`]
    pub guard_delay: Duration,
    /// Minimum high-tone energy to qualify as a start bit
    pub noise_floor: u8,
    /// Required high-over-low margin for start bit detection
    pub start_diff: u8,
    /// Required energy margin to classify a data bit
    pub bit_diff: u8,
    /// Energy below which both tones count as absent (end of frame)
    pub silence_floor: u8,
    /// Ambient energy above which the channel counts as occupied
    pub interference_floor: u8,
    /// Extra time past the scheduled stop before the transmitting flag drops
    pub tx_release_margin: Duration,
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            low_freq_hz: 19_000.0,
            high_freq_hz: 19_500.0,
            bit_duration: Duration::from_millis(300),
            guard_delay: MIN_GUARD_DELAY,
            noise_floor: 30,
            start_diff: 15,
            bit_diff: 20,
            silence_floor: 50,
            interference_floor: 40,
            tx_release_margin: Duration::from_millis(500),
        }
    }
}

impl ModemConfig {
    pub fn validate(&self) -> Result<()> {
        if self.bit_duration.is_zero() {
            return Err(ModemError::InvalidConfig(
                "bit duration must be non-zero".into(),
            ));
        }
        if self.guard_delay < MIN_GUARD_DELAY {
            return Err(ModemError::InvalidConfig(format!(
                "guard delay must be at least {} ms",
                MIN_GUARD_DELAY.as_millis()
            )));
        }
        if self.low_freq_hz <= 0.0 || self.high_freq_hz <= 0.0 {
            return Err(ModemError::InvalidConfig(
                "carrier frequencies must be positive".into(),
            ));
        }
        if self.low_freq_hz == self.high_freq_hz {
            return Err(ModemError::InvalidConfig(
                "carrier frequencies must differ".into(),
            ));
        }
        Ok(())
    }
}
