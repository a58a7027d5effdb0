//! WAV-file implementations of the modem's audio capabilities.
//!
//! [`WavEmitter`] renders a tone schedule into a phase-continuous sine
//! recording, and [`WavProbe`] plays one back as a spectrum source by
//! measuring Goertzel power at the two carrier bins. Together they stand
//! in for a speaker and a microphone, so two machines can exchange
//! messages through recorded audio (or one machine can loop back).

use hound::{SampleFormat, WavSpec};
use log::debug;
use sonichat_core::{ChannelSample, ModemError, SpectrumProbe, ToneEmitter, ToneSchedule};
use std::f32::consts::{PI, TAU};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const SAMPLE_RATE: u32 = 48_000;

/// Output level, headroom below clipping
const TONE_AMPLITUDE: f32 = 0.5;

/// Goertzel analysis window (~21 ms at 48 kHz), short enough to sit
/// inside one bit slot with room to spare
const PROBE_WINDOW: usize = 1024;

/// Maps normalized tone magnitude onto the 0-255 energy scale; a clean
/// full-level carrier reads around 200
const ENERGY_SCALE: f32 = 400.0;

#[derive(Debug, Error)]
pub enum WaveError {
    #[error("Unsupported bit depth: {0}")]
    UnsupportedBitDepth(u16),

    #[error(transparent)]
    Wav(#[from] hound::Error),
}

/// Renders scheduled tone segments into a mono 16-bit WAV file.
///
/// Emission is fire-and-forget like a real oscillator: the whole file is
/// written during the `schedule` call and nothing can retract it.
pub struct WavEmitter {
    path: PathBuf,
    sample_rate: u32,
}

impl WavEmitter {
    pub fn new(path: PathBuf, sample_rate: u32) -> Self {
        Self { path, sample_rate }
    }
}

impl ToneEmitter for WavEmitter {
    fn schedule(&mut self, schedule: &ToneSchedule) -> sonichat_core::Result<()> {
        let samples = render_schedule(schedule, self.sample_rate);
        debug!(
            "rendered {} samples to {}",
            samples.len(),
            self.path.display()
        );
        write_wav(&self.path, &samples, self.sample_rate)
            .map_err(|e| ModemError::CapabilityUnavailable(e.to_string()))
    }
}

/// The carrier the schedule holds at `at`: the most recent segment that
/// has started, none before the first segment or past the stop.
fn active_frequency(schedule: &ToneSchedule, at: Duration) -> Option<f32> {
    if at >= schedule.stop {
        return None;
    }
    let mut active = None;
    for segment in &schedule.segments {
        if segment.start <= at {
            active = Some(segment.frequency_hz);
        } else {
            break;
        }
    }
    active
}

/// Synthesize the schedule as one phase-continuous sine sweep. Phase
/// carries across frequency switches, so bit boundaries produce no
/// clicks for the analyser to smear.
pub fn render_schedule(schedule: &ToneSchedule, sample_rate: u32) -> Vec<f32> {
    let total = (schedule.stop.as_secs_f64() * sample_rate as f64).ceil() as usize;
    let mut samples = vec![0.0f32; total];
    let mut phase = 0.0f32;

    for (i, sample) in samples.iter_mut().enumerate() {
        let at = Duration::from_secs_f64(i as f64 / sample_rate as f64);
        if let Some(freq) = active_frequency(schedule, at) {
            phase = (phase + TAU * freq / sample_rate as f32) % TAU;
            *sample = phase.sin() * TONE_AMPLITUDE;
        }
    }
    samples
}

pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<(), WaveError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in samples {
        let clamped = sample.clamp(-1.0, 1.0);
        writer.write_sample((clamped * 32767.0) as i16)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Read a WAV into mono f32 samples. Multi-channel files keep only the
/// first channel.
pub fn read_wav(path: &Path) -> Result<(Vec<f32>, u32), WaveError> {
    let file = File::open(path).map_err(hound::Error::IoError)?;
    let mut reader = hound::WavReader::new(file)?;
    let spec = reader.spec();

    let all: Vec<f32> = match spec.bits_per_sample {
        16 => reader
            .samples::<i16>()
            .collect::<Result<Vec<i16>, _>>()?
            .into_iter()
            .map(|s| s as f32 / 32768.0)
            .collect(),
        32 => reader.samples::<f32>().collect::<Result<Vec<f32>, _>>()?,
        other => return Err(WaveError::UnsupportedBitDepth(other)),
    };

    let mono: Vec<f32> = if spec.channels > 1 {
        all.into_iter().step_by(spec.channels as usize).collect()
    } else {
        all
    };
    Ok((mono, spec.sample_rate))
}

/// Goertzel power at `freq`, evaluated at the nearest analysis bin.
fn goertzel(samples: &[f32], sample_rate: f32, freq: f32) -> f32 {
    let n = samples.len();
    let k = (0.5 + (n as f32 * freq / sample_rate)) as usize;
    let omega = 2.0 * PI * k as f32 / n as f32;
    let coeff = 2.0 * omega.cos();

    let mut q1 = 0.0;
    let mut q2 = 0.0;
    for &sample in samples {
        let q0 = coeff * q1 - q2 + sample;
        q2 = q1;
        q1 = q0;
    }

    let real = q1 - q2 * omega.cos();
    let imag = q2 * omega.sin();
    real * real + imag * imag
}

fn bin_energy(window: &[f32], sample_rate: f32, freq: f32) -> u8 {
    let power = goertzel(window, sample_rate, freq);
    let magnitude = 2.0 * power.sqrt() / window.len() as f32;
    (magnitude * ENERGY_SCALE).min(255.0) as u8
}

/// Spectrum probe over a recorded transmission. Each poll analyses a
/// short window centered on the queried instant; anything past the end
/// of the recording reads as silence.
pub struct WavProbe {
    samples: Vec<f32>,
    sample_rate: u32,
    low_hz: f32,
    high_hz: f32,
}

impl WavProbe {
    pub fn new(samples: Vec<f32>, sample_rate: u32, low_hz: f32, high_hz: f32) -> Self {
        Self {
            samples,
            sample_rate,
            low_hz,
            high_hz,
        }
    }
}

impl SpectrumProbe for WavProbe {
    fn sample(&mut self, at: Duration) -> sonichat_core::Result<ChannelSample> {
        let center = (at.as_secs_f64() * self.sample_rate as f64) as usize;
        let start = center.saturating_sub(PROBE_WINDOW / 2);
        let end = (start + PROBE_WINDOW).min(self.samples.len());
        if start >= end {
            return Ok(ChannelSample { low: 0, high: 0 });
        }

        let window = &self.samples[start..end];
        Ok(ChannelSample {
            low: bin_energy(window, self.sample_rate as f32, self.low_hz),
            high: bin_energy(window, self.sample_rate as f32, self.high_hz),
        })
    }
}
