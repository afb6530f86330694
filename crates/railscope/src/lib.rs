//! # railscope -- bench diagnostics for the acquisition card
//!
//! `railscope` is an asynchronous Rust library for exercising a data
//! acquisition card over its serial link. It drives the card's two
//! diagnostic commands -- the live sample stream and the power-rail
//! query -- and delivers decoded, scaled readings as typed events.
//!
//! ## Quick Start
//!
//! ```no_run
//! use railscope::{CardBuilder, CardEvent};
//!
//! #[tokio::main]
//! async fn main() -> railscope::Result<()> {
//!     let card = CardBuilder::new()
//!         .serial_port("/dev/ttyUSB0")
//!         .build()
//!         .await?;
//!
//!     let mut events = card.subscribe();
//!     card.query_power().await?;
//!
//!     if let Ok(CardEvent::PowerReading(rails)) = events.recv().await {
//!         println!("{rails}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized as a workspace of focused crates:
//!
//! | Crate                    | Purpose                                      |
//! |--------------------------|----------------------------------------------|
//! | `railscope-core`         | `Transport` trait, events, types, errors     |
//! | `railscope-transport`    | Serial transport and port discovery          |
//! | `railscope-card`         | Wire protocol, reply decoder, IO task        |
//! | `railscope-test-harness` | `MockTransport` for deterministic testing    |
//! | **`railscope`**          | This facade crate -- re-exports everything   |
//!
//! ## Events
//!
//! All replies are delivered through a broadcast channel. Subscribe before
//! dispatching a command:
//!
//! ```no_run
//! use railscope::{Card, CardEvent};
//! # async fn example(card: &Card) -> railscope::Result<()> {
//! let mut events = card.subscribe();
//! card.start_stream().await?;
//! loop {
//!     match events.recv().await {
//!         Ok(CardEvent::StreamSample { index, value }) => println!("{index}: {value:.4}"),
//!         Ok(CardEvent::StreamComplete) => break,
//!         Ok(event) => println!("{event:?}"),
//!         Err(_) => break,
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub use railscope_core::*;

pub use railscope_card::{Card, CardBuilder};

/// Reply decoding: frame accumulator and the per-command decoders.
pub use railscope_card::decode;

/// Wire-level protocol vocabulary: commands, checksum, scaling.
pub use railscope_card::wire;

pub use railscope_transport::{available_ports, SerialTransport, DEFAULT_BAUD};
