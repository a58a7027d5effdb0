mod wave;

use clap::{Parser, Subcommand};
use serde::Serialize;
use sonichat_core::{
    ChannelAssessment, ChannelSample, Decoder, Encoder, LinkFlags, Listener, ModemConfig,
    ModemController, SendOutcome, SpectrumProbe,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use wave::{WavEmitter, WavProbe};

#[derive(Parser)]
#[command(name = "sonichat")]
#[command(about = "Ultrasonic FSK text messaging through recorded audio")]
struct Cli {
    /// Bit slot length in milliseconds (both ends must agree)
    #[arg(long, global = true, default_value_t = 300)]
    bit_ms: u64,

    /// Frequency carrying bit 0, in Hz
    #[arg(long, global = true, default_value_t = 19_000.0)]
    low_hz: f32,

    /// Frequency carrying bit 1 and the start bit, in Hz
    #[arg(long, global = true, default_value_t = 19_500.0)]
    high_hz: f32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a message into a WAV transmission
    Send {
        /// Message text (printable ASCII)
        text: String,

        /// Output WAV file
        #[arg(value_name = "OUTPUT.WAV")]
        output: PathBuf,
    },

    /// Decode messages from a WAV recording
    Recv {
        /// Input WAV file
        #[arg(value_name = "INPUT.WAV")]
        input: PathBuf,
    },

    /// Print the tone schedule for a message as JSON
    Schedule {
        /// Message text (printable ASCII)
        text: String,
    },
}

/// A WAV file is not a live channel, so the pre-send probe reads silence.
struct QuietProbe;

impl SpectrumProbe for QuietProbe {
    fn sample(&mut self, _at: Duration) -> sonichat_core::Result<ChannelSample> {
        Ok(ChannelSample { low: 0, high: 0 })
    }
}

/// Prints modem events to stdout; the whole "chat surface" of this tool.
struct StatusListener;

impl Listener for StatusListener {
    fn on_decoded(&mut self, text: &str) {
        println!("<- {}", text);
    }

    fn on_channel_rejected(&mut self, reason: ChannelAssessment) {
        println!("Send rejected: {:?}", reason);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let config = ModemConfig {
        bit_duration: Duration::from_millis(cli.bit_ms),
        low_freq_hz: cli.low_hz,
        high_freq_hz: cli.high_hz,
        ..Default::default()
    };
    config.validate()?;

    match cli.command {
        Commands::Send { text, output } => send_command(&text, &output, config)?,
        Commands::Recv { input } => recv_command(&input, config)?,
        Commands::Schedule { text } => schedule_command(&text, config)?,
    }
    Ok(())
}

fn send_command(
    text: &str,
    output: &Path,
    config: ModemConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let release_margin = config.tx_release_margin;
    let emitter = WavEmitter::new(output.to_path_buf(), wave::SAMPLE_RATE);
    let mut controller = ModemController::new(config, QuietProbe, emitter, StatusListener)?;

    match controller.send(text, Duration::ZERO)? {
        SendOutcome::Sent { clear_at } => {
            let on_air = clear_at - release_margin;
            println!(
                "Wrote {} ({:.1} s on air)",
                output.display(),
                on_air.as_secs_f64()
            );
        }
        SendOutcome::Rejected(reason) => {
            println!("Nothing written: channel {:?}", reason);
        }
    }
    Ok(())
}

fn recv_command(input: &Path, config: ModemConfig) -> Result<(), Box<dyn std::error::Error>> {
    let (samples, sample_rate) = wave::read_wav(input)?;
    let total = Duration::from_secs_f64(samples.len() as f64 / sample_rate as f64);
    println!(
        "Listening through {} ({:.1} s at {} Hz)",
        input.display(),
        total.as_secs_f64(),
        sample_rate
    );

    let probe = WavProbe::new(samples, sample_rate, config.low_freq_hz, config.high_freq_hz);
    let mut decoder = Decoder::new(config, probe, StatusListener, Arc::new(LinkFlags::default()))?;
    decoder.start();

    // Simulated display-refresh tick, well under one bit duration
    let tick = Duration::from_millis(16);
    let end = total + Duration::from_secs(1);
    let mut now = Duration::ZERO;
    while now <= end {
        decoder.poll(now)?;
        now += tick;
    }

    if decoder.discarded_frames() > 0 {
        println!("{} malformed frame(s) dropped", decoder.discarded_frames());
    }
    decoder.stop();
    Ok(())
}

#[derive(Serialize)]
struct SegmentJson {
    frequency_hz: f32,
    start_secs: f64,
}

#[derive(Serialize)]
struct ScheduleJson {
    segments: Vec<SegmentJson>,
    stop_secs: f64,
}

fn schedule_command(text: &str, config: ModemConfig) -> Result<(), Box<dyn std::error::Error>> {
    let schedule = Encoder::new(config).encode(text)?;
    let json = ScheduleJson {
        segments: schedule
            .segments
            .iter()
            .map(|s| SegmentJson {
                frequency_hz: s.frequency_hz,
                start_secs: s.start.as_secs_f64(),
            })
            .collect(),
        stop_secs: schedule.stop.as_secs_f64(),
    };
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
