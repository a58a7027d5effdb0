//! Capability traits the modem core consumes.
//!
//! The core never touches audio hardware or computes spectra itself.
//! A host wires in a [`SpectrumProbe`] (e.g. an FFT analyser over a live
//! microphone, or a WAV file under test) and a [`ToneEmitter`] (e.g. an
//! oscillator on an audio output), and registers a [`Listener`] for
//! decoded messages and send rejections.

use crate::encoder::ToneSchedule;
use crate::error::Result;
use crate::guard::ChannelAssessment;
use std::time::Duration;

/// Instantaneous energy at the two carrier bins, on the probe's 0-255
/// scale. Never persisted; consumed by the poll that read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSample {
    /// Energy at the low carrier (bit 0)
    pub low: u8,
    /// Energy at the high carrier (bit 1 / start bit)
    pub high: u8,
}

/// Source of live spectrum readings.
///
/// Implementations must refresh at least once per bit duration, covering
/// each carrier frequency plus its adjacent bins.
pub trait SpectrumProbe {
    /// Read the channel at session-relative instant `at`.
    ///
    /// The timestamp exists so that file- or simulation-backed probes can
    /// be driven deterministically; live-microphone implementations are
    /// free to ignore it and return the latest analyser frame.
    fn sample(&mut self, at: Duration) -> Result<ChannelSample>;
}

/// Sink for a fully determined tone schedule.
///
/// Scheduling is fire-and-forget: once accepted, the transmission runs
/// to completion on the emitter's own timeline with no further calls
/// from the core. Offsets in the schedule are relative to the moment of
/// the `schedule` call.
pub trait ToneEmitter {
    fn schedule(&mut self, schedule: &ToneSchedule) -> Result<()>;
}

/// Host-side callbacks. The chat surface registers one of these instead
/// of owning any modem logic.
pub trait Listener {
    /// One completed, non-empty decoded frame.
    fn on_decoded(&mut self, text: &str);

    /// A send attempt was blocked before anything reached the air.
    /// `reason` is always `Busy` or `Interference`.
    fn on_channel_rejected(&mut self, reason: ChannelAssessment);
}
