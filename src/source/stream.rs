//! Stream-based transport.
//!
//! Receives newline-delimited payloads from an async byte stream, such as
//! a TCP connection.

use std::io;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

use super::{Poll, Transport};
use crate::error::TransportError;

/// What the background reader hands over.
type Line = Result<Vec<u8>, io::Error>;

/// A transport that reads lines from an async stream.
///
/// A background task reads the stream and forwards each non-blank line;
/// [`Transport::next`] picks them up without blocking. Unlike a file tail,
/// the remote end going away is a failure: EOF surfaces as
/// [`TransportError::Closed`] and read errors as [`TransportError::Io`].
///
/// Must be created inside a tokio runtime.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use streamchart::source::StreamTransport;
///
/// # tokio_test::block_on(async {
/// let data = b"{\"category\":\"a\"}\n";
/// let transport = StreamTransport::spawn(Cursor::new(data.to_vec()), "example");
/// # });
/// ```
#[derive(Debug)]
pub struct StreamTransport {
    receiver: mpsc::Receiver<Line>,
    description: String,
    task: tokio::task::JoinHandle<()>,
    closed: bool,
}

impl StreamTransport {
    /// Spawn a background task that reads from the given async reader.
    pub fn spawn<R>(reader: R, description: &str) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<Line>(256);
        let desc = description.to_string();

        let task = tokio::spawn(async move {
            let mut reader = BufReader::new(reader);
            let mut line = Vec::new();

            loop {
                line.clear();
                match reader.read_until(b'\n', &mut line).await {
                    Ok(0) => {
                        debug!(source = %desc, "stream reached EOF");
                        break;
                    }
                    Ok(_) => {
                        while matches!(line.last(), Some(b'\n' | b'\r')) {
                            line.pop();
                        }
                        if line.iter().all(u8::is_ascii_whitespace) {
                            continue;
                        }
                        if tx.send(Ok(line.clone())).await.is_err() {
                            // Receiver dropped
                            break;
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(e)).await;
                        break;
                    }
                }
            }
        });

        Self {
            receiver: rx,
            description: format!("stream: {}", description),
            task,
            closed: false,
        }
    }

    /// Connect to a TCP endpoint and stream from it.
    pub async fn connect(addr: &str) -> Result<Self, TransportError> {
        let stream = tokio::net::TcpStream::connect(addr)
            .await
            .map_err(|e| TransportError::io(format!("tcp://{addr}"), e))?;
        Ok(Self::spawn(stream, &format!("tcp://{addr}")))
    }
}

impl Transport for StreamTransport {
    fn next(&mut self) -> Result<Poll, TransportError> {
        if self.closed {
            return Ok(Poll::End);
        }
        match self.receiver.try_recv() {
            Ok(Ok(line)) => Ok(Poll::Payload(line)),
            Ok(Err(e)) => Err(TransportError::io(self.description.clone(), e)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(Poll::Pending),
            Err(mpsc::error::TryRecvError::Disconnected) => {
                Err(TransportError::Closed(self.description.clone()))
            }
        }
    }

    fn close(&mut self) {
        self.task.abort();
        self.receiver.close();
        self.closed = true;
    }

    fn description(&self) -> &str {
        &self.description
    }
}
