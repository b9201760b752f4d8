//! Adapter between a connection's outbound half and the room's
//! [`ClientStream`] capability.

use std::io;

use bytes::Bytes;
use seatcast_room::ClientStream;
use tokio::sync::mpsc;

/// A [`ClientStream`] over an unbounded channel.
///
/// The room worker's `write` pushes the payload into the channel and
/// returns immediately; a per-connection writer task drains the
/// receiving half onto the socket. A slow or dead socket therefore
/// never stalls a room's fan-out — once the receiver is gone, writes
/// fail with `BrokenPipe` and the room logs and skips the seat.
pub struct ChannelClient {
    tx: mpsc::UnboundedSender<Bytes>,
}

impl ChannelClient {
    /// Creates the client and the receiving half the writer task
    /// drains.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Bytes>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ClientStream for ChannelClient {
    fn write(&mut self, payload: Bytes) -> io::Result<usize> {
        let len = payload.len();
        self.tx.send(payload).map_err(|_| {
            io::Error::new(io::ErrorKind::BrokenPipe, "subscriber disconnected")
        })?;
        Ok(len)
    }

    fn flush(&mut self) {
        // Every write is already a complete frame in the channel.
    }
}
