//! railscope-test-harness: deterministic transports for testing.
//!
//! Provides [`MockTransport`], an in-memory [`Transport`]
//! implementation with pre-loaded request/response expectations and
//! explicit control over reply chunk boundaries.
//!
//! [`Transport`]: railscope_core::transport::Transport

pub mod mock_serial;

pub use mock_serial::MockTransport;
