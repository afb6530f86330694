//! The `Card` facade: the application-facing handle to one connected card.

use tokio::sync::broadcast;
use tracing::debug;

use railscope_core::error::Result;
use railscope_core::events::CardEvent;
use railscope_core::transport::Transport;
use railscope_core::types::CommandKind;

use crate::io::{spawn_io_task, CardIo, IoConfig};

/// Capacity of the event broadcast channel.
///
/// At 921600 baud the stream peaks around 15k samples/s; a consumer that
/// stalls for longer than this buffer covers will see `Lagged` on its
/// receiver rather than stalling the IO task.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// A connected acquisition card.
///
/// Construct via [`CardBuilder`](crate::CardBuilder). All replies are
/// delivered through the broadcast channel returned by
/// [`subscribe`](Self::subscribe); the command methods only report whether
/// the command bytes were written.
///
/// # Example
///
/// ```no_run
/// use railscope_card::CardBuilder;
/// use railscope_core::CardEvent;
///
/// # async fn example() -> railscope_core::Result<()> {
/// let card = CardBuilder::new().serial_port("/dev/ttyUSB0").build().await?;
///
/// let mut events = card.subscribe();
/// card.start_stream().await?;
/// while let Ok(event) = events.recv().await {
///     match event {
///         CardEvent::StreamSample { index, value } => println!("{index}: {value:.4}"),
///         CardEvent::StreamComplete => break,
///         _ => {}
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct Card {
    io: CardIo,
    event_tx: broadcast::Sender<CardEvent>,
}

impl Card {
    pub(crate) fn new(transport: Box<dyn Transport>, config: IoConfig) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let io = spawn_io_task(transport, config, event_tx.clone());
        debug!("card session started");
        Card { io, event_tx }
    }

    /// Start the live sample stream.
    ///
    /// Discards any exchange in progress, then writes `FF 0A FF`. Samples
    /// arrive as [`CardEvent::StreamSample`] until the card sends its
    /// terminator ([`CardEvent::StreamComplete`]).
    pub async fn start_stream(&self) -> Result<()> {
        self.io.dispatch(CommandKind::SampleStream).await
    }

    /// Request one power-rail reading.
    ///
    /// Discards any exchange in progress, then writes `47 01 46`. The
    /// reading arrives as [`CardEvent::PowerReading`].
    pub async fn query_power(&self) -> Result<()> {
        self.io.dispatch(CommandKind::PowerQuery).await
    }

    /// Subscribe to decoded card events.
    ///
    /// Subscribe before dispatching a command; events emitted with no
    /// subscriber are dropped.
    pub fn subscribe(&self) -> broadcast::Receiver<CardEvent> {
        self.event_tx.subscribe()
    }

    /// Shut down the IO task and close the transport.
    pub async fn close(self) -> Result<()> {
        let mut transport = self.io.shutdown().await?;
        transport.close().await
    }
}
