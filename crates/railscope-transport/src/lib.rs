//! railscope-transport: transport implementations for railscope.
//!
//! Provides [`SerialTransport`], the production link to the card, and
//! [`available_ports`] for the port-selection UI/CLI.

pub mod serial;

pub use serial::{available_ports, SerialTransport, DEFAULT_BAUD};
