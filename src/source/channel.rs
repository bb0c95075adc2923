//! Channel-based transport.
//!
//! Receives payloads through a tokio mpsc channel. This is the in-process
//! stand-in for a queue subscription: a producer task (a message bus
//! bridge, a test, an embedding application) pushes payloads and the engine
//! pulls them.

use tokio::sync::mpsc;

use super::{Poll, Transport};
use crate::error::TransportError;

/// A transport that receives payloads via a channel.
///
/// The stream ends once every sender has been dropped and the buffered
/// payloads are drained.
#[derive(Debug)]
pub struct ChannelTransport {
    receiver: mpsc::Receiver<Vec<u8>>,
    description: String,
    closed: bool,
}

impl ChannelTransport {
    /// Create a new channel transport.
    ///
    /// # Arguments
    ///
    /// * `receiver` - The receiving end of an mpsc channel
    /// * `source_description` - Where payloads come from
    ///   (e.g., "kafka://localhost:9092/buzzline-topic")
    pub fn new(receiver: mpsc::Receiver<Vec<u8>>, source_description: &str) -> Self {
        Self {
            receiver,
            description: format!("channel: {}", source_description),
            closed: false,
        }
    }

    /// Create a channel pair for sending payloads to a ChannelTransport.
    ///
    /// Returns (sender, transport); `buffer` bounds the number of payloads
    /// in flight.
    pub fn create(source_description: &str, buffer: usize) -> (mpsc::Sender<Vec<u8>>, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (tx, Self::new(rx, source_description))
    }
}

impl Transport for ChannelTransport {
    fn next(&mut self) -> Result<Poll, TransportError> {
        if self.closed {
            return Ok(Poll::End);
        }
        match self.receiver.try_recv() {
            Ok(payload) => Ok(Poll::Payload(payload)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(Poll::Pending),
            Err(mpsc::error::TryRecvError::Disconnected) => Ok(Poll::End),
        }
    }

    fn close(&mut self) {
        self.receiver.close();
        self.closed = true;
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_transport_poll() {
        let (tx, mut transport) = ChannelTransport::create("test", 4);

        assert_eq!(transport.next().unwrap(), Poll::Pending);

        tx.try_send(b"one".to_vec()).unwrap();
        tx.try_send(b"two".to_vec()).unwrap();
        assert_eq!(transport.next().unwrap(), Poll::Payload(b"one".to_vec()));
        assert_eq!(transport.next().unwrap(), Poll::Payload(b"two".to_vec()));
        assert_eq!(transport.next().unwrap(), Poll::Pending);
    }

    #[test]
    fn test_buffered_payloads_drain_before_end() {
        let (tx, mut transport) = ChannelTransport::create("test", 4);
        tx.try_send(b"last".to_vec()).unwrap();
        drop(tx);

        assert_eq!(transport.next().unwrap(), Poll::Payload(b"last".to_vec()));
        assert_eq!(transport.next().unwrap(), Poll::End);
    }

    #[test]
    fn test_close_rejects_senders() {
        let (tx, mut transport) = ChannelTransport::create("test", 4);
        transport.close();
        assert!(tx.try_send(b"late".to_vec()).is_err());
        assert_eq!(transport.next().unwrap(), Poll::End);
        assert_eq!(transport.description(), "channel: test");
    }
}
