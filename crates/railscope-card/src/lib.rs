//! railscope-card: driver for the acquisition card's serial protocol.
//!
//! The card speaks a small binary protocol with two host commands and two
//! reply framings:
//!
//! - **Sample stream** -- `FF 0A FF` starts an open-ended run of 6-byte
//!   sample frames (three big-endian u16 each), closed by the `FF DD FF`
//!   terminator.
//! - **Power query** -- `47 01` + XOR trailer requests one 17-byte
//!   checksummed frame carrying seven rail voltages.
//!
//! Module layout:
//!
//! - [`wire`] -- protocol constants, checksum, command encoders, scaling
//! - [`decode`] -- the reply decoder: frame accumulator plus one decoder
//!   per command context
//! - [`card`] / [`builder`] -- the [`Card`] facade and its builder; the
//!   IO task that owns transport and decoder lives in a private module
//!   behind them

pub mod builder;
pub mod card;
pub mod decode;
mod io;
pub mod wire;

pub use builder::CardBuilder;
pub use card::Card;
pub use decode::{FrameAccumulator, Reply, ReplyDecoder};
