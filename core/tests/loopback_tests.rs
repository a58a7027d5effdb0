//! End-to-end loopback: a tone schedule played over a simulated air
//! channel, received by the polling decoder at a display-refresh tick.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use sonichat_core::{
    ChannelAssessment, ChannelSample, Decoder, Encoder, LinkFlags, Listener, ModemConfig, Result,
    SpectrumProbe, ToneSchedule,
};
use std::sync::Arc;
use std::time::Duration;

/// Ideal noiseless channel: whichever carrier the schedule holds at the
/// queried instant reads as strong energy in its bin, silence elsewhere.
struct AirProbe {
    schedule: ToneSchedule,
    high_freq_hz: f32,
}

impl AirProbe {
    fn new(schedule: ToneSchedule, config: &ModemConfig) -> Self {
        Self {
            schedule,
            high_freq_hz: config.high_freq_hz,
        }
    }

    fn carrier_at(&self, at: Duration) -> Option<f32> {
        if at >= self.schedule.stop {
            return None;
        }
        let mut active = None;
        for segment in &self.schedule.segments {
            if segment.start <= at {
                active = Some(segment.frequency_hz);
            } else {
                break;
            }
        }
        active
    }
}

impl SpectrumProbe for AirProbe {
    fn sample(&mut self, at: Duration) -> Result<ChannelSample> {
        Ok(match self.carrier_at(at) {
            Some(freq) if freq == self.high_freq_hz => ChannelSample { low: 4, high: 200 },
            Some(_) => ChannelSample { low: 200, high: 4 },
            None => ChannelSample { low: 0, high: 0 },
        })
    }
}

/// Adds Gaussian jitter to the ideal channel's energy readings.
struct NoisyProbe {
    inner: AirProbe,
    rng: StdRng,
    noise: Normal<f32>,
}

impl SpectrumProbe for NoisyProbe {
    fn sample(&mut self, at: Duration) -> Result<ChannelSample> {
        let clean = self.inner.sample(at)?;
        let mut perturb = |value: u8| {
            (value as f32 + self.noise.sample(&mut self.rng)).clamp(0.0, 255.0) as u8
        };
        Ok(ChannelSample {
            low: perturb(clean.low),
            high: perturb(clean.high),
        })
    }
}

#[derive(Default)]
struct Collector {
    decoded: Vec<String>,
}

impl Listener for Collector {
    fn on_decoded(&mut self, text: &str) {
        self.decoded.push(text.to_string());
    }

    fn on_channel_rejected(&mut self, _reason: ChannelAssessment) {}
}

/// Poll the decoder at ~60 Hz from before the transmission until well
/// past its end, returning what was heard plus the discard count.
fn run_receiver<P: SpectrumProbe>(probe: P, on_air_until: Duration) -> (Vec<String>, u64) {
    let mut decoder = Decoder::new(
        ModemConfig::default(),
        probe,
        Collector::default(),
        Arc::new(LinkFlags::default()),
    )
    .unwrap();
    decoder.start();

    let tick = Duration::from_millis(16);
    let end = on_air_until + Duration::from_secs(1);
    let mut now = Duration::ZERO;
    while now <= end {
        decoder.poll(now).unwrap();
        now += tick;
    }
    let discarded = decoder.discarded_frames();
    (
        std::mem::take(&mut decoder.listener_mut().decoded),
        discarded,
    )
}

fn transmit(message: &str) -> (ToneSchedule, ModemConfig) {
    let config = ModemConfig::default();
    let schedule = Encoder::new(config.clone()).encode(message).unwrap();
    (schedule, config)
}

#[test]
fn test_loopback_single_character() {
    let (schedule, config) = transmit("A");
    let stop = schedule.stop;
    let (decoded, discarded) = run_receiver(AirProbe::new(schedule, &config), stop);

    assert_eq!(decoded, vec!["A".to_string()]);
    assert_eq!(discarded, 0);
}

#[test]
fn test_loopback_all_lengths_up_to_ten() {
    let full = "The modem!";
    for len in 1..=full.len() {
        let message = &full[..len];
        let (schedule, config) = transmit(message);
        let stop = schedule.stop;
        let (decoded, discarded) = run_receiver(AirProbe::new(schedule, &config), stop);

        assert_eq!(
            decoded,
            vec![message.to_string()],
            "round trip failed for {:?}",
            message
        );
        assert_eq!(discarded, 0, "spurious discards for {:?}", message);
    }
}

#[test]
fn test_loopback_punctuation_and_digits() {
    for message in ["~!@# $%^&", "0123456789", "}`_"] {
        let (schedule, config) = transmit(message);
        let stop = schedule.stop;
        let (decoded, _) = run_receiver(AirProbe::new(schedule, &config), stop);
        assert_eq!(decoded, vec![message.to_string()]);
    }
}

#[test]
fn test_loopback_survives_energy_jitter() {
    let (schedule, config) = transmit("jitter ok");
    let stop = schedule.stop;
    let probe = NoisyProbe {
        inner: AirProbe::new(schedule, &config),
        rng: StdRng::seed_from_u64(0xC0FFEE),
        noise: Normal::new(0.0, 6.0).unwrap(),
    };
    let (decoded, discarded) = run_receiver(probe, stop);

    assert_eq!(decoded, vec!["jitter ok".to_string()]);
    assert_eq!(discarded, 0);
}

#[test]
fn test_silent_channel_hears_nothing() {
    struct SilentProbe;
    impl SpectrumProbe for SilentProbe {
        fn sample(&mut self, _at: Duration) -> Result<ChannelSample> {
            Ok(ChannelSample { low: 0, high: 0 })
        }
    }

    let (decoded, discarded) = run_receiver(SilentProbe, Duration::from_secs(3));
    assert!(decoded.is_empty());
    assert_eq!(discarded, 0);
}

#[test]
fn test_back_to_back_frames_decode_separately() {
    // Two transmissions with a gap of silence between them; the decoder
    // must return to Listening after the first and catch the second.
    struct TwoFrameProbe {
        first: AirProbe,
        second: AirProbe,
        second_offset: Duration,
    }

    impl SpectrumProbe for TwoFrameProbe {
        fn sample(&mut self, at: Duration) -> Result<ChannelSample> {
            if at >= self.second_offset {
                self.second.sample(at - self.second_offset)
            } else {
                self.first.sample(at)
            }
        }
    }

    let (first, config) = transmit("one");
    let (second, _) = transmit("two");
    let gap = Duration::from_secs(2);
    let second_offset = first.stop + gap;
    let on_air_until = second_offset + second.stop;

    let probe = TwoFrameProbe {
        first: AirProbe::new(first, &config),
        second: AirProbe::new(second, &config),
        second_offset,
    };
    let (decoded, discarded) = run_receiver(probe, on_air_until);

    assert_eq!(decoded, vec!["one".to_string(), "two".to_string()]);
    assert_eq!(discarded, 0);
}
