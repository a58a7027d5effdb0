use crate::capability::ChannelSample;
use crate::config::ModemConfig;

/// Verdict of the pre-transmission channel check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelAssessment {
    /// Nothing meaningful on the air; safe to transmit.
    Clear,
    /// This device is mid-way through receiving a frame.
    Busy,
    /// The channel already carries ultrasonic energy.
    Interference,
}

/// Gate that every send attempt passes through immediately before
/// scheduling, to avoid talking over an in-progress transmission.
#[derive(Debug, Clone, Default)]
pub struct ChannelGuard {
    config: ModemConfig,
}

impl ChannelGuard {
    pub fn new(config: ModemConfig) -> Self {
        Self { config }
    }

    /// Classify the channel from one spectrum sample. `reading_active`
    /// is this device's own receive state; a frame mid-flight locally
    /// wins over any energy reading.
    pub fn assess(&self, sample: ChannelSample, reading_active: bool) -> ChannelAssessment {
        if reading_active {
            return ChannelAssessment::Busy;
        }
        let floor = self.config.interference_floor;
        if sample.low > floor || sample.high > floor {
            return ChannelAssessment::Interference;
        }
        ChannelAssessment::Clear
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_channel_is_clear() {
        let guard = ChannelGuard::default();
        let sample = ChannelSample { low: 5, high: 5 };
        assert_eq!(guard.assess(sample, false), ChannelAssessment::Clear);
    }

    #[test]
    fn test_local_reading_wins_over_energy() {
        let guard = ChannelGuard::default();
        let sample = ChannelSample { low: 0, high: 0 };
        assert_eq!(guard.assess(sample, true), ChannelAssessment::Busy);
    }

    #[test]
    fn test_high_energy_is_interference() {
        let guard = ChannelGuard::default();
        let sample = ChannelSample { low: 5, high: 45 };
        assert_eq!(guard.assess(sample, false), ChannelAssessment::Interference);
    }

    #[test]
    fn test_either_bin_can_trigger_interference() {
        let guard = ChannelGuard::default();
        let sample = ChannelSample { low: 45, high: 5 };
        assert_eq!(guard.assess(sample, false), ChannelAssessment::Interference);
    }

    #[test]
    fn test_energy_at_floor_is_still_clear() {
        let guard = ChannelGuard::default();
        let floor = ModemConfig::default().interference_floor;
        let sample = ChannelSample {
            low: floor,
            high: floor,
        };
        assert_eq!(guard.assess(sample, false), ChannelAssessment::Clear);
    }
}
