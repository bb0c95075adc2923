//! Transport abstraction for receiving raw event payloads.
//!
//! This module provides a trait-based abstraction over the transports that
//! feed the engine (a tailed file, a TCP stream, an in-process channel, or a
//! Kafka subscription). All of them are pulled through the same
//! non-blocking [`Transport::next`] call.

mod channel;
mod file;
#[cfg(feature = "kafka")]
mod kafka;
mod stream;

pub use channel::ChannelTransport;
pub use file::FileTail;
#[cfg(feature = "kafka")]
pub use kafka::KafkaTransport;
pub use stream::StreamTransport;

use std::fmt::Debug;

use crate::error::TransportError;

/// Result of one non-blocking pull.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Poll {
    /// One raw payload, framing already removed.
    Payload(Vec<u8>),
    /// Nothing available right now; more may arrive later.
    Pending,
    /// The transport has finished and will never yield again.
    End,
}

/// A source of raw payloads.
///
/// Implementations must not block: when no payload is ready they return
/// [`Poll::Pending`] and the caller decides how long to wait before
/// pulling again.
///
/// # Example
///
/// ```
/// use streamchart::source::{ChannelTransport, Poll, Transport};
///
/// let (tx, mut transport) = ChannelTransport::create("demo", 16);
/// tx.try_send(br#"{"category":"saw"}"#.to_vec()).unwrap();
///
/// assert!(matches!(transport.next(), Ok(Poll::Payload(_))));
/// assert!(matches!(transport.next(), Ok(Poll::Pending)));
/// drop(tx);
/// assert!(matches!(transport.next(), Ok(Poll::End)));
/// ```
pub trait Transport: Send + Debug {
    /// Pull the next payload, if any.
    fn next(&mut self) -> Result<Poll, TransportError>;

    /// Release the underlying resources. Further pulls return `End`.
    fn close(&mut self);

    /// Returns a human-readable description of the source.
    ///
    /// Used for display in the TUI header and in logs.
    fn description(&self) -> &str;
}
