use crate::capability::{Listener, SpectrumProbe};
use crate::config::ModemConfig;
use crate::controller::LinkFlags;
use crate::error::Result;
use crate::frame;
use log::{debug, info};
use std::mem;
use std::sync::Arc;
use std::time::Duration;

/// Receiver-side modem state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModemState {
    /// Receiver not active.
    Idle,
    /// Watching every poll for a start bit.
    Listening,
    /// Sampling data bits at the fixed cadence.
    Reading,
}

/// Polling FSK receiver.
///
/// The decoder owns no clock and spawns no tasks. The host drives it by
/// calling [`Decoder::poll`] with a session-relative timestamp, at least
/// once per bit duration while listening (a display-refresh tick is
/// plenty), and must never block between polls. At most one reading
/// session is in flight per decoder; its progress lives in an internal
/// bit buffer that is cleared the instant the frame terminates.
pub struct Decoder<P: SpectrumProbe, L: Listener> {
    config: ModemConfig,
    probe: P,
    listener: L,
    flags: Arc<LinkFlags>,
    state: ModemState,
    bits: Vec<bool>,
    next_sample_at: Duration,
    discarded_frames: u64,
}

impl<P: SpectrumProbe, L: Listener> Decoder<P, L> {
    /// `flags` is the link shared with the send path; pass
    /// [`crate::ModemController::flags`] when both run on one device, or
    /// a fresh `Arc<LinkFlags>` for a receive-only session.
    pub fn new(config: ModemConfig, probe: P, listener: L, flags: Arc<LinkFlags>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            probe,
            listener,
            flags,
            state: ModemState::Idle,
            bits: Vec::new(),
            next_sample_at: Duration::ZERO,
            discarded_frames: 0,
        })
    }

    pub fn state(&self) -> ModemState {
        self.state
    }

    /// Frames that terminated with bits buffered but produced no text:
    /// a bit count that was not a multiple of 8, or every byte outside
    /// the printable range. Dropping them is normal operation; the
    /// counter exists for observability.
    pub fn discarded_frames(&self) -> u64 {
        self.discarded_frames
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    /// Activate the receiver. Idle becomes Listening; Listening then
    /// persists for the life of the session.
    pub fn start(&mut self) {
        if self.state == ModemState::Idle {
            self.state = ModemState::Listening;
            info!("receiver active, listening for start bit");
        }
    }

    /// Deactivate the receiver: any pending sample deadline is dropped,
    /// a half-read frame is abandoned without emission, and the state
    /// returns to Idle.
    pub fn stop(&mut self) {
        self.state = ModemState::Idle;
        self.bits.clear();
        self.flags.set_reading(false);
        debug!("receiver stopped");
    }

    /// Advance the state machine to session time `now`.
    ///
    /// Cheap when nothing is due; errors only when the probe itself
    /// fails, which ends the session's usefulness (the caller should
    /// stop rather than keep polling a dead capability).
    pub fn poll(&mut self, now: Duration) -> Result<()> {
        match self.state {
            ModemState::Idle => Ok(()),
            ModemState::Listening => self.watch_for_start(now),
            ModemState::Reading => self.read_next_bit(now),
        }
    }

    fn watch_for_start(&mut self, now: Duration) -> Result<()> {
        // Our own carrier would read as a start bit; skip the poll and
        // retry on the next tick rather than count it as a detection.
        if self.flags.is_transmitting() {
            return Ok(());
        }

        let sample = self.probe.sample(now)?;
        let low = sample.low as u16;
        let high = sample.high as u16;
        if high > self.config.noise_floor as u16 && high > low + self.config.start_diff as u16 {
            debug!(
                "start bit at {:?} (low={}, high={})",
                now, sample.low, sample.high
            );
            self.bits.clear();
            self.flags.set_reading(true);
            self.state = ModemState::Reading;
            // The extra half slot skips the remainder of the start bit
            // and centers every later sample mid-bit.
            self.next_sample_at = now + self.config.bit_duration + self.config.bit_duration / 2;
        }
        Ok(())
    }

    fn read_next_bit(&mut self, now: Duration) -> Result<()> {
        if now < self.next_sample_at {
            return Ok(());
        }
        let due = self.next_sample_at;

        let sample = self.probe.sample(now)?;
        let low = sample.low as u16;
        let high = sample.high as u16;

        let silence = self.config.silence_floor as u16;
        if low < silence && high < silence {
            debug!("silence at {:?}, frame ends", now);
            self.finish_frame();
            return Ok(());
        }

        let margin = self.config.bit_diff as u16;
        if high > low + margin {
            self.bits.push(true);
        } else if low > high + margin {
            self.bits.push(false);
        } else {
            // Too close to call. The ambiguous sample is discarded and
            // the frame closed on the bits read so far.
            debug!(
                "ambiguous sample at {:?} (low={}, high={}), frame ends",
                now, sample.low, sample.high
            );
            self.finish_frame();
            return Ok(());
        }

        // Anchor the cadence to the deadline, not the poll time, so a
        // late poll does not push every later sample off its slot.
        self.next_sample_at = due + self.config.bit_duration;
        Ok(())
    }

    fn finish_frame(&mut self) {
        self.state = ModemState::Listening;
        self.flags.set_reading(false);

        let bits = mem::take(&mut self.bits);
        if bits.is_empty() {
            return;
        }
        match frame::assemble_text(&bits) {
            Some(text) if !text.is_empty() => {
                info!("decoded {} chars from {} bits", text.len(), bits.len());
                self.listener.on_decoded(&text);
            }
            _ => {
                self.discarded_frames += 1;
                debug!("discarded frame of {} bits", bits.len());
            }
        }
    }
}
