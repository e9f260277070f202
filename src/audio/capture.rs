use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::level::LevelMeter;
use crate::error::{Error, Result};

/// Fixed capture parameters for the transcription pipeline.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Target sample rate (the backend expects 16kHz)
    pub sample_rate: u32,
    /// Target channel count (1 = mono)
    pub channels: u16,
    /// Length of each emitted chunk in milliseconds
    pub chunk_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
            chunk_ms: 1000,
        }
    }
}

/// Output of the capture unit.
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    /// One encoded audio chunk (16-bit little-endian PCM). Never empty.
    Chunk(Vec<u8>),
    /// Device-level failure during active capture; reported at most once.
    Error(String),
}

/// Wrapper for cpal::Stream to make it Send.
///
/// SAFETY: the stream is only touched through the exclusively-owned
/// `MicCapture` handle, so it never sees concurrent access.
struct SendableStream(cpal::Stream);

unsafe impl Send for SendableStream {}

/// Exclusive handle to one live microphone stream.
///
/// At most one exists per session. Emits one PCM chunk per `chunk_ms` on
/// the channel returned by [`MicCapture::start`] and keeps a rolling
/// sample window for [`MicCapture::level`].
pub struct MicCapture {
    stream: Option<SendableStream>,
    ticker: Option<JoinHandle<()>>,
    level: Arc<LevelMeter>,
}

impl MicCapture {
    /// Acquires exclusive microphone access and starts chunk emission.
    ///
    /// Fails with [`Error::DeviceUnavailable`] when no input device exists
    /// or no usable stream configuration can be opened; failure never
    /// leaves a partially-open stream behind.
    pub async fn start(config: CaptureConfig) -> Result<(Self, mpsc::Receiver<CaptureEvent>)> {
        let (event_tx, event_rx) = mpsc::channel(8);
        let level = Arc::new(LevelMeter::new());
        let pending: Arc<Mutex<Vec<i16>>> = Arc::new(Mutex::new(Vec::new()));
        let chunk_ms = config.chunk_ms;

        // Device probing and stream setup can block; keep them off the
        // async worker threads.
        let stream = {
            let pending = Arc::clone(&pending);
            let level = Arc::clone(&level);
            let event_tx = event_tx.clone();
            tokio::task::spawn_blocking(move || open_stream(&config, pending, level, event_tx))
                .await
                .map_err(|e| Error::Capture(e.to_string()))??
        };

        let ticker = tokio::spawn(emit_chunks(
            Duration::from_millis(chunk_ms.max(1)),
            pending,
            event_tx,
        ));

        Ok((
            Self {
                stream: Some(stream),
                ticker: Some(ticker),
                level,
            },
            event_rx,
        ))
    }

    /// Current input level on a 0-100 scale.
    pub fn level(&self) -> f32 {
        self.level.level()
    }

    pub fn is_capturing(&self) -> bool {
        self.stream.is_some()
    }

    /// Releases the device and stops chunk emission. Idempotent; also runs
    /// on drop so no exit path can leak the microphone.
    pub fn stop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
        if let Some(stream) = self.stream.take() {
            let _ = stream.0.pause();
            // Dropping the stream releases the device and clears the OS
            // microphone-in-use indicator.
            drop(stream);
            info!("microphone capture stopped");
        }
    }
}

impl Drop for MicCapture {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Drains accumulated samples into one chunk per tick. Ticks with no
/// samples emit nothing.
async fn emit_chunks(
    period: Duration,
    pending: Arc<Mutex<Vec<i16>>>,
    event_tx: mpsc::Sender<CaptureEvent>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    interval.tick().await; // skip the immediate first tick

    loop {
        interval.tick().await;

        let samples: Vec<i16> = {
            let Ok(mut pending) = pending.lock() else {
                return;
            };
            std::mem::take(&mut *pending)
        };
        if samples.is_empty() {
            continue;
        }

        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        if event_tx.send(CaptureEvent::Chunk(bytes)).await.is_err() {
            return;
        }
    }
}

/// Builds and starts the input stream.
///
/// Tries in order: i16 at the target config (PipeWire/PulseAudio convert
/// transparently), f32 at the target config, then the device's native
/// config with software channel mixing and decimation.
fn open_stream(
    config: &CaptureConfig,
    pending: Arc<Mutex<Vec<i16>>>,
    level: Arc<LevelMeter>,
    event_tx: mpsc::Sender<CaptureEvent>,
) -> Result<SendableStream> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| Error::DeviceUnavailable("no input device available".to_string()))?;
    let device_name = device.name().unwrap_or_else(|_| "unknown".to_string());

    let preferred = cpal::StreamConfig {
        channels: config.channels,
        sample_rate: cpal::SampleRate(config.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let reported = Arc::new(AtomicBool::new(false));

    {
        let pending = Arc::clone(&pending);
        let level = Arc::clone(&level);
        if let Ok(stream) = device.build_input_stream(
            &preferred,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                if let Ok(mut buf) = pending.lock() {
                    buf.extend_from_slice(data);
                }
                level.push_i16(data);
            },
            device_error_cb(event_tx.clone(), Arc::clone(&reported)),
            None,
        ) {
            return play(stream, &device_name);
        }
    }

    {
        let pending = Arc::clone(&pending);
        let level = Arc::clone(&level);
        if let Ok(stream) = device.build_input_stream(
            &preferred,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let converted: Vec<i16> = data
                    .iter()
                    .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                    .collect();
                if let Ok(mut buf) = pending.lock() {
                    buf.extend_from_slice(&converted);
                }
                level.push_i16(&converted);
            },
            device_error_cb(event_tx.clone(), Arc::clone(&reported)),
            None,
        ) {
            return play(stream, &device_name);
        }
    }

    // Native-config fallback: capture at the device's own rate and layout,
    // then mix and decimate in software.
    let native = device
        .default_input_config()
        .map_err(|e| Error::DeviceUnavailable(format!("no usable input config: {e}")))?;
    let native_rate = native.sample_rate().0;
    let native_channels = native.channels() as usize;
    let target_rate = config.sample_rate;
    let stream_config: cpal::StreamConfig = native.clone().into();

    info!(
        "capturing at native format ({}ch/{}Hz/{:?}), converting in software",
        native_channels,
        native_rate,
        native.sample_format()
    );

    let stream = match native.sample_format() {
        cpal::SampleFormat::I16 => {
            let pending = Arc::clone(&pending);
            let level = Arc::clone(&level);
            device.build_input_stream(
                &stream_config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let mono = mix_to_mono(data, native_channels);
                    let converted = downsample(&mono, native_rate, target_rate);
                    if let Ok(mut buf) = pending.lock() {
                        buf.extend_from_slice(&converted);
                    }
                    level.push_i16(&converted);
                },
                device_error_cb(event_tx, reported),
                None,
            )
        }
        cpal::SampleFormat::F32 => {
            let pending = Arc::clone(&pending);
            let level = Arc::clone(&level);
            device.build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let pcm: Vec<i16> = data
                        .iter()
                        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                        .collect();
                    let mono = mix_to_mono(&pcm, native_channels);
                    let converted = downsample(&mono, native_rate, target_rate);
                    if let Ok(mut buf) = pending.lock() {
                        buf.extend_from_slice(&converted);
                    }
                    level.push_i16(&converted);
                },
                device_error_cb(event_tx, reported),
                None,
            )
        }
        format => {
            return Err(Error::DeviceUnavailable(format!(
                "unsupported native sample format: {format:?}"
            )))
        }
    }
    .map_err(|e| Error::DeviceUnavailable(format!("failed to open input stream: {e}")))?;

    play(stream, &device_name)
}

fn play(stream: cpal::Stream, device_name: &str) -> Result<SendableStream> {
    stream
        .play()
        .map_err(|e| Error::DeviceUnavailable(format!("failed to start input stream: {e}")))?;
    info!("microphone capture started on {}", device_name);
    Ok(SendableStream(stream))
}

/// Error callback shared by every stream attempt; the first device error
/// wins, later ones are dropped.
fn device_error_cb(
    event_tx: mpsc::Sender<CaptureEvent>,
    reported: Arc<AtomicBool>,
) -> impl FnMut(cpal::StreamError) + Send + 'static {
    move |err| {
        if !reported.swap(true, Ordering::SeqCst) {
            warn!("audio device error: {}", err);
            let _ = event_tx.try_send(CaptureEvent::Error(err.to_string()));
        }
    }
}

/// Mixes interleaved multi-channel samples to mono by summing channels
/// (no division, to preserve volume), clamped to the i16 range.
fn mix_to_mono(samples: &[i16], channels: usize) -> Vec<i16> {
    if channels <= 1 {
        return samples.to_vec();
    }
    samples
        .chunks_exact(channels)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            sum.clamp(i16::MIN as i32, i16::MAX as i32) as i16
        })
        .collect()
}

/// Decimates to the target rate by taking every Nth sample. Upsampling is
/// never attempted; a source slower than the target passes through.
fn downsample(samples: &[i16], source_rate: u32, target_rate: u32) -> Vec<i16> {
    if source_rate == target_rate {
        return samples.to_vec();
    }
    let ratio = source_rate / target_rate;
    if ratio <= 1 {
        return samples.to_vec();
    }
    samples.iter().step_by(ratio as usize).copied().collect()
}
