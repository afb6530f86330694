//! The card IO task.
//!
//! One spawned Tokio task exclusively owns the transport and the
//! [`ReplyDecoder`]; command dispatches and byte arrivals are processed
//! strictly in order on that task, so no decode pass can ever observe a
//! half-appended chunk or race a dispatch-triggered reset.
//!
//! The task also runs the response watchdog: a deadline armed when a
//! command is written and disarmed by the first received byte, whatever it
//! decodes to. A missed deadline is reported as a
//! [`CardEvent::ResponseTimeout`], not an error -- whether to re-send is
//! the consumer's policy.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use railscope_core::error::{Error, Result};
use railscope_core::events::CardEvent;
use railscope_core::helpers::format_hex;
use railscope_core::transport::Transport;
use railscope_core::types::CommandKind;

use crate::decode::{Reply, ReplyDecoder};
use crate::wire;

/// Configuration for the IO task.
pub(crate) struct IoConfig {
    /// Response deadline after the start-stream command.
    pub stream_timeout: Duration,
    /// Response deadline after the power query.
    pub power_timeout: Duration,
}

impl Default for IoConfig {
    fn default() -> Self {
        IoConfig {
            stream_timeout: Duration::from_secs(4),
            power_timeout: Duration::from_millis(2500),
        }
    }
}

impl IoConfig {
    fn timeout_for(&self, kind: CommandKind) -> Duration {
        match kind {
            CommandKind::SampleStream => self.stream_timeout,
            CommandKind::PowerQuery => self.power_timeout,
        }
    }
}

/// A request sent from the [`Card`](crate::Card) facade to the IO task.
pub(crate) enum Request {
    /// Dispatch a command: arm the decoder, write the bytes, arm the
    /// watchdog. Replies are delivered as broadcast events, not here.
    Dispatch {
        kind: CommandKind,
        reply: oneshot::Sender<Result<()>>,
    },
    /// Graceful shutdown; returns the transport for test recovery.
    Shutdown {
        reply: oneshot::Sender<Box<dyn Transport>>,
    },
}

/// Handle to the IO task. Stored inside `Card`.
pub(crate) struct CardIo {
    pub cmd_tx: mpsc::Sender<Request>,
    pub cancel: CancellationToken,
    pub task: JoinHandle<()>,
}

impl CardIo {
    /// Dispatch a command and await the write outcome.
    pub async fn dispatch(&self, kind: CommandKind) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(Request::Dispatch {
                kind,
                reply: reply_tx,
            })
            .await
            .map_err(|_| Error::NotConnected)?;
        reply_rx.await.map_err(|_| Error::NotConnected)?
    }

    /// Shut down the IO task and recover the transport.
    pub async fn shutdown(self) -> Result<Box<dyn Transport>> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let _ = self
            .cmd_tx
            .send(Request::Shutdown { reply: reply_tx })
            .await;
        match reply_rx.await {
            Ok(transport) => {
                let _ = self.task.await;
                Ok(transport)
            }
            Err(_) => {
                // The loop never took the request; make sure it stops.
                self.cancel.cancel();
                let _ = self.task.await;
                Err(Error::NotConnected)
            }
        }
    }
}

/// Spawn the IO task. Returns the handle for dispatching commands.
pub(crate) fn spawn_io_task(
    transport: Box<dyn Transport>,
    config: IoConfig,
    event_tx: broadcast::Sender<CardEvent>,
) -> CardIo {
    let (cmd_tx, cmd_rx) = mpsc::channel::<Request>(8);
    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();

    let task = tokio::spawn(io_loop(transport, config, event_tx, cmd_rx, cancel_clone));

    CardIo {
        cmd_tx,
        cancel,
        task,
    }
}

/// The main IO loop. Runs as a spawned Tokio task.
///
/// Uses `tokio::select! { biased; }` to prioritize:
/// 1. Cancellation
/// 2. Command dispatch
/// 3. The response watchdog
/// 4. Reading reply bytes
async fn io_loop(
    mut transport: Box<dyn Transport>,
    config: IoConfig,
    event_tx: broadcast::Sender<CardEvent>,
    mut cmd_rx: mpsc::Receiver<Request>,
    cancel: CancellationToken,
) {
    let mut decoder = ReplyDecoder::new();
    // Watchdog deadline; armed per dispatch, disarmed by any received byte.
    let mut deadline: Option<(Instant, CommandKind)> = None;

    loop {
        let wake = deadline.map(|(at, _)| at);

        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                debug!("card IO task cancelled");
                break;
            }

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(Request::Dispatch { kind, reply }) => {
                        // Arm the decoder before the command leaves the
                        // host, so the reply lands in a clean window.
                        decoder.dispatch(kind);
                        let bytes = wire::encode_command(kind);
                        debug!(%kind, bytes = %format_hex(&bytes), "sending command");
                        let result = transport.send(&bytes).await;
                        match &result {
                            Ok(()) => {
                                deadline = Some((Instant::now() + config.timeout_for(kind), kind));
                            }
                            Err(e) => warn!(%kind, error = %e, "command send failed"),
                        }
                        let _ = reply.send(result);
                    }
                    Some(Request::Shutdown { reply }) => {
                        debug!("card IO task shutdown requested");
                        let _ = reply.send(transport);
                        return;
                    }
                    None => {
                        debug!("all command senders dropped, exiting IO task");
                        break;
                    }
                }
            }

            _ = tokio::time::sleep_until(wake.unwrap_or_else(Instant::now)), if wake.is_some() => {
                if let Some((_, kind)) = deadline.take() {
                    warn!(%kind, "no response from card before deadline");
                    let _ = event_tx.send(CardEvent::ResponseTimeout { kind });
                }
            }

            // Idle: read reply bytes in short slices so commands and
            // cancellation stay responsive.
            _ = async {
                let mut buf = [0u8; 256];
                match transport.receive(&mut buf, Duration::from_millis(100)).await {
                    Ok(n) if n > 0 => {
                        // Any bytes disarm the watchdog, whatever they
                        // decode to.
                        deadline = None;
                        match decoder.on_bytes(&buf[..n]) {
                            Ok(replies) => {
                                for reply in replies {
                                    publish(&event_tx, reply);
                                }
                            }
                            Err(e) => warn!(error = %e, "decode pass failed"),
                        }
                    }
                    Ok(_) | Err(Error::Timeout) => {
                        // No data this slice; yield briefly so the loop
                        // can check for commands or cancellation.
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                    Err(e) => {
                        warn!(error = %e, "transport receive failed");
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            } => {}
        }
    }
}

/// Fan a decoded reply out to subscribers as events.
fn publish(event_tx: &broadcast::Sender<CardEvent>, reply: Reply) {
    match reply {
        Reply::Samples(samples) => {
            for sample in samples {
                let _ = event_tx.send(CardEvent::StreamSample {
                    index: sample.index,
                    value: sample.value,
                });
            }
        }
        Reply::StreamComplete => {
            let _ = event_tx.send(CardEvent::StreamComplete);
        }
        Reply::Power(rails) => {
            let _ = event_tx.send(CardEvent::PowerReading(rails));
        }
    }
}
