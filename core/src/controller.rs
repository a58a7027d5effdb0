use crate::capability::{Listener, SpectrumProbe, ToneEmitter};
use crate::config::ModemConfig;
use crate::encoder::Encoder;
use crate::error::Result;
use crate::guard::{ChannelAssessment, ChannelGuard};
use log::{debug, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// The two booleans the send and receive paths share.
///
/// Single-writer each: the controller writes `transmitting`, the decoder
/// writes `reading`; everyone else only reads. Atomics so a transmitter
/// and receiver may live on different threads.
#[derive(Debug, Default)]
pub struct LinkFlags {
    transmitting: AtomicBool,
    reading: AtomicBool,
}

impl LinkFlags {
    /// A frame of ours is still on the air (or inside the release margin).
    pub fn is_transmitting(&self) -> bool {
        self.transmitting.load(Ordering::Acquire)
    }

    /// The decoder is mid-way through a frame.
    pub fn is_reading(&self) -> bool {
        self.reading.load(Ordering::Acquire)
    }

    pub(crate) fn set_transmitting(&self, value: bool) {
        self.transmitting.store(value, Ordering::Release);
    }

    pub(crate) fn set_reading(&self, value: bool) {
        self.reading.store(value, Ordering::Release);
    }
}

/// Result of a send attempt that did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Scheduled; the channel is spoken for until `clear_at`.
    Sent { clear_at: Duration },
    /// The guard refused; nothing reached the air and a retry is fine.
    Rejected(ChannelAssessment),
}

/// Transmit side of the link.
///
/// Owns the encoder, the pre-send [`ChannelGuard`] and the shared
/// [`LinkFlags`], replacing the ad-hoc mutable flags a UI would
/// otherwise thread around. Once a schedule is handed to the emitter it
/// runs to completion; there is no cancellation of an in-flight
/// transmission, only the timed release of the transmitting flag.
pub struct ModemController<P, E, L> {
    config: ModemConfig,
    encoder: Encoder,
    guard: ChannelGuard,
    probe: P,
    emitter: E,
    listener: L,
    flags: Arc<LinkFlags>,
    tx_release_at: Option<Duration>,
}

impl<P: SpectrumProbe, E: ToneEmitter, L: Listener> ModemController<P, E, L> {
    pub fn new(config: ModemConfig, probe: P, emitter: E, listener: L) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            encoder: Encoder::new(config.clone()),
            guard: ChannelGuard::new(config.clone()),
            config,
            probe,
            emitter,
            listener,
            flags: Arc::new(LinkFlags::default()),
            tx_release_at: None,
        })
    }

    /// Shared flag handle for wiring a [`crate::Decoder`] to this link.
    pub fn flags(&self) -> Arc<LinkFlags> {
        Arc::clone(&self.flags)
    }

    /// Attempt to transmit `message` at session time `now`.
    ///
    /// The guard runs immediately before scheduling: a busy or
    /// interfered channel rejects the attempt, fires
    /// [`Listener::on_channel_rejected`], and leaves the air untouched.
    /// On a clear channel the whole schedule is handed to the emitter in
    /// one call and the transmitting flag goes up until
    /// [`ModemController::tick`] releases it.
    pub fn send(&mut self, message: &str, now: Duration) -> Result<SendOutcome> {
        let sample = self.probe.sample(now)?;
        let verdict = self.guard.assess(sample, self.flags.is_reading());
        if verdict != ChannelAssessment::Clear {
            info!("send rejected: {:?}", verdict);
            self.listener.on_channel_rejected(verdict);
            return Ok(SendOutcome::Rejected(verdict));
        }

        let schedule = self.encoder.encode(message)?;
        self.emitter.schedule(&schedule)?;

        let clear_at = now + schedule.stop + self.config.tx_release_margin;
        self.flags.set_transmitting(true);
        self.tx_release_at = Some(clear_at);
        info!(
            "transmitting {} segments, channel held until {:?}",
            schedule.segments.len(),
            clear_at
        );
        Ok(SendOutcome::Sent { clear_at })
    }

    /// Drop the transmitting flag once the scheduled frame plus release
    /// margin has left the air. Call from the same loop that polls the
    /// decoder.
    pub fn tick(&mut self, now: Duration) {
        if let Some(release_at) = self.tx_release_at {
            if now >= release_at {
                self.flags.set_transmitting(false);
                self.tx_release_at = None;
                debug!("transmit window released at {:?}", now);
            }
        }
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }
}
