use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

use super::config::SessionConfig;
use super::state::{ConnectionPhase, Followup, SessionEvent, SessionState};
use super::stats::TranscriptSegment;
use crate::audio::{CaptureEvent, MicCapture};
use crate::endpoints::Endpoints;
use crate::error::Result;
use crate::rest::{ApiClient, TranscriptionResult};
use crate::transport::{ServerEvent, StreamConfig, TransportEvent, WsTransport};

const LEVEL_TICK: Duration = Duration::from_millis(100);

type SharedState = Arc<Mutex<SessionState>>;
type SharedCapture = Arc<Mutex<Option<MicCapture>>>;
type SharedTransport = Arc<Mutex<Option<WsTransport>>>;

/// A live listening session: owns the microphone pipeline and the
/// streaming transport, folds their events into one [`SessionState`]
/// snapshot, and exposes the command surface the dashboard drives.
///
/// At most one capture handle and one transport handle are live at any
/// time; every exit path releases both.
pub struct SpeechSession {
    config: SessionConfig,
    stream_url: String,
    api: ApiClient,

    state: SharedState,
    capture: SharedCapture,
    transport: SharedTransport,

    /// Pump/level tasks for the current session
    tasks: Mutex<Vec<JoinHandle<()>>>,

    /// Transcription updates accumulated across the session
    history: Arc<Mutex<Vec<TranscriptSegment>>>,

    /// Bumped by every start/stop; in-flight acquisitions compare against
    /// it and release themselves when they lost the race
    epoch: AtomicU64,
}

impl SpeechSession {
    /// Creates a session against the build profile's endpoint set.
    pub fn new(config: SessionConfig) -> Result<Self> {
        Self::with_endpoints(config, Endpoints::from_environment())
    }

    pub fn with_endpoints(config: SessionConfig, endpoints: Endpoints) -> Result<Self> {
        let api = ApiClient::new(&endpoints.api_base)?;
        Ok(Self {
            config,
            stream_url: endpoints.stream_url,
            api,
            state: Arc::new(Mutex::new(SessionState::default())),
            capture: Arc::new(Mutex::new(None)),
            transport: Arc::new(Mutex::new(None)),
            tasks: Mutex::new(Vec::new()),
            history: Arc::new(Mutex::new(Vec::new())),
            epoch: AtomicU64::new(0),
        })
    }

    /// Current state snapshot for renderers.
    pub async fn snapshot(&self) -> SessionState {
        self.state.lock().await.clone()
    }

    /// Transcription updates accumulated so far.
    pub async fn transcript_history(&self) -> Vec<TranscriptSegment> {
        self.history.lock().await.clone()
    }

    /// Client for the auxiliary REST endpoints.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Opens the streaming transport and the microphone and wires them
    /// together. No-op when already connecting or listening. Any failure
    /// releases whatever was partially acquired, records it in
    /// `last_error`, and returns the session to idle.
    pub async fn start_listening(&self) -> Result<()> {
        // The epoch bump happens under the state lock so a concurrent stop
        // is strictly ordered against this start.
        let epoch = {
            let mut state = self.state.lock().await;
            if matches!(
                state.phase,
                ConnectionPhase::Connecting | ConnectionPhase::Listening
            ) {
                return Ok(());
            }
            state.phase = ConnectionPhase::Connecting;
            state.transcript.clear();
            state.confidence = 0.0;
            state.last_error = None;
            self.epoch.fetch_add(1, Ordering::SeqCst) + 1
        };

        let stream_config = StreamConfig {
            language: self.config.language.clone(),
            participants: self.config.participants.clone(),
        };

        info!("starting listening session ({})", self.config.language);

        let (transport, transport_events) =
            match WsTransport::connect(&self.stream_url, &stream_config).await {
                Ok(pair) => pair,
                Err(e) => {
                    self.abort_start(epoch, e.to_string()).await;
                    return Err(e);
                }
            };

        if self.stale(epoch) {
            // A stop arrived while the connection was opening; release the
            // fresh handle instead of activating it.
            transport.disconnect().await;
            return Ok(());
        }

        let (capture, capture_events) = match MicCapture::start(self.config.capture.clone()).await
        {
            Ok(pair) => pair,
            Err(e) => {
                transport.disconnect().await;
                self.abort_start(epoch, e.to_string()).await;
                return Err(e);
            }
        };

        if self.stale(epoch) {
            let mut capture = capture;
            capture.stop();
            transport.disconnect().await;
            return Ok(());
        }

        *self.transport.lock().await = Some(transport);
        *self.capture.lock().await = Some(capture);

        let mut tasks = self.tasks.lock().await;
        tasks.retain(|task| !task.is_finished());
        tasks.push(tokio::spawn(pump_audio(
            capture_events,
            Arc::clone(&self.state),
            Arc::clone(&self.capture),
            Arc::clone(&self.transport),
        )));
        tasks.push(tokio::spawn(pump_events(
            transport_events,
            Arc::clone(&self.state),
            Arc::clone(&self.capture),
            Arc::clone(&self.transport),
            Arc::clone(&self.history),
        )));
        tasks.push(tokio::spawn(sample_levels(
            Arc::clone(&self.state),
            Arc::clone(&self.capture),
            Arc::clone(&self.transport),
        )));

        Ok(())
    }

    /// Releases the capture handle, then the transport handle, and returns
    /// to idle. Idempotent; keeps the last transcript and error visible.
    pub async fn stop_listening(&self) {
        {
            let mut state = self.state.lock().await;
            if state.phase == ConnectionPhase::Idle {
                return; // no handles exist when idle
            }
            state.phase = ConnectionPhase::Stopping;
            // Invalidate any acquisition still in flight.
            self.epoch.fetch_add(1, Ordering::SeqCst);
        }

        for task in self.tasks.lock().await.drain(..) {
            task.abort();
        }

        release_handles(&self.capture, &self.transport).await;

        let mut state = self.state.lock().await;
        state.phase = ConnectionPhase::Idle;
        state.session_id = None;
        state.audio_level = 0.0;

        info!("listening session stopped");
    }

    /// Transcribes a pre-recorded file through the one-shot endpoint.
    ///
    /// Independent of the streaming lifecycle: success overwrites the
    /// transcript exactly as a live update would; failure records
    /// `last_error` without touching the connection phase. Safe to call
    /// while a live session is running.
    pub async fn upload_file(
        &self,
        path: &Path,
        language: Option<&str>,
    ) -> Result<TranscriptionResult> {
        self.state.lock().await.last_error = None;

        let language = language.unwrap_or(&self.config.language);
        match self.api.upload_audio(path, language).await {
            Ok(result) => {
                let mut state = self.state.lock().await;
                state.transcript = result.transcription.clone();
                state.confidence = result.confidence;
                Ok(result)
            }
            Err(e) => {
                let message = e.to_string();
                warn!("file upload failed: {}", message);
                self.state.lock().await.last_error = Some(message);
                Err(e)
            }
        }
    }

    /// Dismisses the current transcript, confidence and error. Never
    /// changes the connection phase.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.transcript.clear();
        state.confidence = 0.0;
        state.last_error = None;
    }

    fn stale(&self, epoch: u64) -> bool {
        self.epoch.load(Ordering::SeqCst) != epoch
    }

    /// Records a start failure unless a concurrent stop already won.
    async fn abort_start(&self, epoch: u64, message: String) {
        if self.stale(epoch) {
            return;
        }
        error!("failed to start listening: {}", message);
        let mut state = self.state.lock().await;
        state.last_error = Some(message);
        state.phase = ConnectionPhase::Idle;
        state.session_id = None;
        state.audio_level = 0.0;
    }
}

impl Drop for SpeechSession {
    fn drop(&mut self) {
        // Backstop for consumers that drop the session without stopping:
        // the pump tasks hold the handle Arcs, so they must die for the
        // Drop impls on MicCapture and WsTransport to run.
        if let Ok(mut tasks) = self.tasks.try_lock() {
            for task in tasks.drain(..) {
                task.abort();
            }
        }
    }
}

/// Applies one event to the state and performs the required teardown.
/// Each call runs to completion before the next event is handled.
async fn dispatch(
    state: &SharedState,
    capture: &SharedCapture,
    transport: &SharedTransport,
    event: SessionEvent,
) {
    let followup = state.lock().await.apply(event);
    if followup == Followup::ReleaseHandles {
        release_handles(capture, transport).await;
    }
}

/// Capture first, transport second, so no chunk is produced against a
/// closing channel.
async fn release_handles(capture: &SharedCapture, transport: &SharedTransport) {
    if let Some(mut capture) = capture.lock().await.take() {
        capture.stop();
    }
    if let Some(transport) = transport.lock().await.take() {
        transport.disconnect().await;
    }
}

/// Forwards capture output to the transport. A device error tears the
/// session down; the loop ends when the capture handle goes away.
async fn pump_audio(
    mut events: mpsc::Receiver<CaptureEvent>,
    state: SharedState,
    capture: SharedCapture,
    transport: SharedTransport,
) {
    while let Some(event) = events.recv().await {
        match event {
            CaptureEvent::Chunk(bytes) => {
                if bytes.is_empty() {
                    continue;
                }
                if let Some(transport) = transport.lock().await.as_ref() {
                    transport.send_audio(bytes);
                }
            }
            CaptureEvent::Error(message) => {
                error!("capture device failed: {}", message);
                dispatch(
                    &state,
                    &capture,
                    &transport,
                    SessionEvent::CaptureFailed(message),
                )
                .await;
                return;
            }
        }
    }
}

/// Delivers transport events into the state machine in arrival order.
async fn pump_events(
    mut events: mpsc::UnboundedReceiver<TransportEvent>,
    state: SharedState,
    capture: SharedCapture,
    transport: SharedTransport,
    history: Arc<Mutex<Vec<TranscriptSegment>>>,
) {
    while let Some(event) = events.recv().await {
        let event = match event {
            TransportEvent::Server(server) => {
                if let ServerEvent::Transcription {
                    text,
                    confidence,
                    is_final,
                } = &server
                {
                    if !text.is_empty() {
                        history.lock().await.push(TranscriptSegment {
                            text: text.clone(),
                            timestamp: Utc::now(),
                            confidence: *confidence,
                            is_final: is_final.unwrap_or(false),
                        });
                    }
                }
                SessionEvent::Server(server)
            }
            TransportEvent::Failed(message) => {
                error!("streaming transport failed: {}", message);
                SessionEvent::TransportFailed(message)
            }
        };
        dispatch(&state, &capture, &transport, event).await;
    }
}

/// Republishes the input level every 100ms; only listening sessions show
/// it. Ends as soon as the capture handle goes away.
async fn sample_levels(state: SharedState, capture: SharedCapture, transport: SharedTransport) {
    let mut tick = interval(LEVEL_TICK);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tick.tick().await;

        let level = match capture.lock().await.as_ref() {
            Some(capture) => capture.level(),
            None => return,
        };

        dispatch(&state, &capture, &transport, SessionEvent::Level(level)).await;
    }
}
