use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{info, warn};

use super::messages::{ServerEvent, StreamConfig};
use crate::error::{Error, Result};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

const MAX_RECONNECT_ATTEMPTS: u32 = 5;
const RECONNECT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Delay before reconnect attempt `attempt` (1-based): linear backoff.
fn reconnect_delay(attempt: u32) -> Duration {
    RECONNECT_BASE_DELAY * attempt
}

/// Event delivered to the transport consumer, in arrival order.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// Parsed structured event from the backend.
    Server(ServerEvent),
    /// The channel closed and the reconnect budget is exhausted. Terminal
    /// until the caller explicitly restarts.
    Failed(String),
}

enum Command {
    Audio(Vec<u8>),
    Shutdown,
}

enum PumpExit {
    Shutdown,
    ConnectionLost(String),
}

/// Exclusive handle to one live streaming connection.
///
/// Owns the socket task and its reconnection timer. Dropping the handle
/// tears the connection down; `disconnect` does the same but waits for the
/// socket to close cleanly.
pub struct WsTransport {
    cmd_tx: mpsc::Sender<Command>,
    open: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl WsTransport {
    /// Opens the connection and sends the configuration frame as the first
    /// payload. Resolves only once the channel reports open; rejects on
    /// immediate failure without spawning anything.
    pub async fn connect(
        url: &str,
        config: &StreamConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<TransportEvent>)> {
        let stream = open_stream(url, config).await?;

        info!("streaming transport connected to {}", url);

        let (cmd_tx, cmd_rx) = mpsc::channel(64);
        // Unbounded so a slow consumer can never wedge the socket task
        // mid-shutdown; inbound events stay in arrival order.
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let open = Arc::new(AtomicBool::new(true));

        let task = tokio::spawn(run_connection(
            stream,
            url.to_string(),
            config.clone(),
            cmd_rx,
            event_tx,
            Arc::clone(&open),
        ));

        Ok((
            Self {
                cmd_tx,
                open,
                task: Some(task),
            },
            event_rx,
        ))
    }

    /// Transmits one binary audio frame if the channel is currently open;
    /// otherwise a silent no-op. Audio produced during a reconnect gap is
    /// dropped, not queued.
    pub fn send_audio(&self, chunk: Vec<u8>) {
        if chunk.is_empty() || !self.is_open() {
            return;
        }
        let _ = self.cmd_tx.try_send(Command::Audio(chunk));
    }

    /// Pure state query.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Closes the channel and suppresses any in-flight reconnect attempt.
    pub async fn disconnect(mut self) {
        let _ = self.cmd_tx.send(Command::Shutdown).await;
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        self.open.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Opens the socket and sends the configuration message. This is the full
/// connect sequence; reconnects re-run it from scratch.
async fn open_stream(url: &str, config: &StreamConfig) -> Result<WsStream> {
    let (mut stream, _response) = connect_async(url)
        .await
        .map_err(|e| Error::ConnectionFailure(e.to_string()))?;

    let payload = serde_json::to_string(config)?;
    stream
        .send(Message::Text(payload))
        .await
        .map_err(|e| Error::ConnectionFailure(e.to_string()))?;

    Ok(stream)
}

async fn run_connection(
    mut stream: WsStream,
    url: String,
    config: StreamConfig,
    mut cmd_rx: mpsc::Receiver<Command>,
    event_tx: mpsc::UnboundedSender<TransportEvent>,
    open: Arc<AtomicBool>,
) {
    'connection: loop {
        let (mut sink, mut source) = stream.split();
        open.store(true, Ordering::SeqCst);

        let exit = pump(&mut sink, &mut source, &mut cmd_rx, &event_tx).await;
        open.store(false, Ordering::SeqCst);

        let reason = match exit {
            PumpExit::Shutdown => {
                let _ = sink.close().await;
                info!("streaming transport disconnected");
                return;
            }
            PumpExit::ConnectionLost(reason) => reason,
        };

        warn!("streaming connection lost: {}", reason);

        // Attempt counter lives here so a successful open resets it.
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            if attempt > MAX_RECONNECT_ATTEMPTS {
                let _ = event_tx.send(TransportEvent::Failed(format!(
                    "connection lost ({}); gave up after {} reconnect attempts",
                    reason, MAX_RECONNECT_ATTEMPTS
                )));
                return;
            }

            if backoff(attempt, &mut cmd_rx).await {
                return; // disconnected mid-backoff
            }

            match open_stream(&url, &config).await {
                Ok(s) => {
                    info!("reconnected on attempt {}", attempt);
                    stream = s;
                    continue 'connection;
                }
                Err(e) => {
                    warn!(
                        "reconnect attempt {}/{} failed: {}",
                        attempt, MAX_RECONNECT_ATTEMPTS, e
                    );
                }
            }
        }
    }
}

/// Runs one open connection until it is shut down or lost. Each inbound
/// frame is handled to completion before the next is read.
async fn pump(
    sink: &mut WsSink,
    source: &mut WsSource,
    cmd_rx: &mut mpsc::Receiver<Command>,
    event_tx: &mpsc::UnboundedSender<TransportEvent>,
) -> PumpExit {
    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => match cmd {
                Some(Command::Audio(bytes)) => {
                    if let Err(e) = sink.send(Message::Binary(bytes)).await {
                        return PumpExit::ConnectionLost(e.to_string());
                    }
                }
                Some(Command::Shutdown) | None => return PumpExit::Shutdown,
            },
            frame = source.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<ServerEvent>(&text) {
                        Ok(event) => {
                            if event_tx.send(TransportEvent::Server(event)).is_err() {
                                return PumpExit::Shutdown;
                            }
                        }
                        // A single corrupt frame must not take down the session.
                        Err(e) => warn!("discarding malformed server frame: {}", e),
                    }
                }
                Some(Ok(Message::Close(_))) => {
                    return PumpExit::ConnectionLost("closed by server".to_string());
                }
                Some(Ok(_)) => {} // ping/pong/binary: nothing to deliver
                Some(Err(e)) => return PumpExit::ConnectionLost(e.to_string()),
                None => return PumpExit::ConnectionLost("stream ended".to_string()),
            },
        }
    }
}

/// Waits out the backoff before a reconnect attempt. Returns true when a
/// shutdown request arrives during the wait, which cancels the reconnect.
async fn backoff(attempt: u32, cmd_rx: &mut mpsc::Receiver<Command>) -> bool {
    let delay = reconnect_delay(attempt);
    info!(
        "reconnect attempt {}/{} in {}ms",
        attempt,
        MAX_RECONNECT_ATTEMPTS,
        delay.as_millis()
    );

    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            _ = &mut sleep => return false,
            cmd = cmd_rx.recv() => match cmd {
                // Audio produced while the channel is down is dropped here
                // rather than queued; the gap is a known data-loss point.
                Some(Command::Audio(_)) => continue,
                Some(Command::Shutdown) | None => return true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_schedule_is_linear() {
        let delays: Vec<u64> = (1..=MAX_RECONNECT_ATTEMPTS)
            .map(|n| reconnect_delay(n).as_millis() as u64)
            .collect();
        assert_eq!(delays, vec![1000, 2000, 3000, 4000, 5000]);
    }
}
