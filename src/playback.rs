//! Audio playback over rodio.
//!
//! `PlaybackHandle` wraps one output stream + sink pair; the app owns at most
//! one handle at a time and replaces it wholesale whenever a new audio
//! reference arrives. `analyze` runs ahead of playback to produce the
//! waveform peaks and total duration the UI renders.

use anyhow::{Context, Result};
use rodio::{Decoder, OutputStream, Sink, Source};
use std::io::Cursor;
use std::time::Duration;
use tracing::{debug, info};

/// Number of peak buckets rendered as waveform bars.
pub const WAVEFORM_BARS: usize = 320;

/// Decoded audio ready to hand to a playback handle.
#[derive(Debug, Clone)]
pub struct LoadedAudio {
    pub bytes: Vec<u8>,
    pub peaks: Vec<f32>,
    pub duration: Duration,
}

/// Decode the downloaded bytes once to derive waveform peaks and duration.
pub fn analyze(bytes: Vec<u8>) -> Result<LoadedAudio> {
    let decoder = Decoder::new(Cursor::new(bytes.clone())).context("Decoding audio")?;
    let channels = decoder.channels().max(1) as usize;
    let sample_rate = decoder.sample_rate().max(1);
    let declared = decoder.total_duration();

    let samples: Vec<i16> = decoder.collect();
    let frames = samples.len() / channels;
    let duration = declared.unwrap_or_else(|| {
        Duration::from_secs_f64(frames as f64 / sample_rate as f64)
    });
    let peaks = peak_buckets(&samples, channels, WAVEFORM_BARS);

    debug!(
        frames,
        channels,
        sample_rate,
        duration_ms = duration.as_millis(),
        "Analyzed audio"
    );
    Ok(LoadedAudio {
        bytes,
        peaks,
        duration,
    })
}

/// Downsample interleaved samples into per-bucket peak amplitudes in 0..=1.
fn peak_buckets(samples: &[i16], channels: usize, buckets: usize) -> Vec<f32> {
    let channels = channels.max(1);
    let frames = samples.len() / channels;
    if frames == 0 || buckets == 0 {
        return Vec::new();
    }
    let buckets = buckets.min(frames);
    let per_bucket = frames.div_ceil(buckets);

    let mut peaks = Vec::with_capacity(buckets);
    for bucket in samples.chunks(per_bucket * channels) {
        let peak = bucket
            .iter()
            .map(|sample| (*sample as i32).unsigned_abs())
            .max()
            .unwrap_or(0);
        peaks.push((peak as f32 / i16::MAX as f32).min(1.0));
    }
    peaks
}

/// One live playback engine instance bound to a single piece of audio.
pub struct PlaybackHandle {
    _stream: OutputStream,
    sink: Sink,
}

impl PlaybackHandle {
    /// Open the default output device, queue the audio, and start playing.
    pub fn start(bytes: &[u8], volume: f32) -> Result<Self> {
        let (_stream, handle) = OutputStream::try_default().context("Opening audio output")?;
        let sink = Sink::try_new(&handle).context("Creating sink")?;
        let source = Decoder::new(Cursor::new(bytes.to_vec())).context("Decoding audio")?;
        sink.set_volume(volume);
        sink.append(source);
        sink.play();
        info!(size = bytes.len(), volume, "Started playback");
        Ok(Self { _stream, sink })
    }

    pub fn play(&self) {
        debug!("Resuming playback");
        self.sink.play();
    }

    pub fn pause(&self) {
        debug!("Pausing playback");
        self.sink.pause();
    }

    pub fn is_paused(&self) -> bool {
        self.sink.is_paused()
    }

    /// True once the sink has drained its queued source.
    pub fn is_finished(&self) -> bool {
        self.sink.empty()
    }

    pub fn set_volume(&self, volume: f32) {
        self.sink.set_volume(volume);
    }

    pub fn stop(self) {
        self.sink.stop();
        // stream dropped automatically
    }
}
