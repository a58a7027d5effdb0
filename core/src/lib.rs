//! Ultrasonic FSK modem for short text messages
//!
//! Moves printable-ASCII text between nearby devices over near-ultrasonic
//! sound (19 kHz band) with no network connection. One frame per message:
//! a high-tone start bit followed by 8 bits per character at a fixed
//! cadence, classified by comparing the energy at the two carrier bins.
//!
//! Audio hardware and spectrum analysis stay outside this crate; callers
//! plug them in through the [`SpectrumProbe`] and [`ToneEmitter`] traits.
//! The channel is half-duplex, unacknowledged and best-effort by design:
//! no FEC, no retransmission, malformed frames are silently dropped.

pub mod capability;
pub mod config;
pub mod controller;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod frame;
pub mod guard;

pub use capability::{ChannelSample, Listener, SpectrumProbe, ToneEmitter};
pub use config::ModemConfig;
pub use controller::{LinkFlags, ModemController, SendOutcome};
pub use decoder::{Decoder, ModemState};
pub use encoder::{Encoder, ToneSchedule, ToneSegment};
pub use error::{ModemError, Result};
pub use guard::{ChannelAssessment, ChannelGuard};
