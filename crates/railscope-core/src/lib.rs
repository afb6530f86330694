//! railscope-core: Core traits, types, and error definitions for railscope.
//!
//! This crate defines the abstractions shared by the transport layer, the
//! card driver, and consuming applications. Nothing here touches a serial
//! port or a wire format; it is the vocabulary the rest of the workspace
//! speaks.
//!
//! # Key types
//!
//! - [`Transport`] -- byte-level communication channel to the card
//! - [`CardEvent`] -- decoded messages delivered to the application
//! - [`CommandKind`] -- which of the two card commands is in flight
//! - [`Error`] / [`Result`] -- error handling

pub mod error;
pub mod events;
pub mod helpers;
pub mod transport;
pub mod types;

// Re-export key types at crate root for ergonomic `use railscope_core::*`.
pub use error::{Error, Result};
pub use events::CardEvent;
pub use helpers::{format_hex, format_volts};
pub use transport::Transport;
pub use types::{CommandKind, PowerRails, ScaledSample};
