//! The client capability a room fans broadcasts out to.

use std::io;

use bytes::Bytes;

/// A sink bound to one seat, supplied by the transport layer.
///
/// The room treats payloads as opaque byte sequences: no chunking, no
/// decoding, no framing. `payload` is a [`Bytes`] handle so fanning the
/// same buffer out to every seat clones a refcount, not the data.
///
/// Implementations must not block the caller: the room worker invokes
/// `write` for every occupied seat in turn, and one slow client must
/// never delay delivery to the rest. The transport satisfies this by
/// handing the room an unbounded channel whose far end is drained by a
/// per-connection writer task.
pub trait ClientStream: Send + 'static {
    /// Writes one payload to the client, returning the number of bytes
    /// accepted.
    fn write(&mut self, payload: Bytes) -> io::Result<usize>;

    /// Flushes buffered data towards the client.
    fn flush(&mut self);
}
