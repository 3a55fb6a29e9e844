//! Delivery of decrypted messages to the consumer.
//!
//! Every handle owns the producing end of a bounded queue. A full queue is
//! backpressure: the handle does not advance its sequence number until the
//! message is enqueued, so the same position is polled again.

use tokio::sync::mpsc;
pub use tokio::sync::mpsc::error::TryRecvError;

use crate::error::HandleError;

/// One decrypted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    /// Log position this message was published at
    pub seqno: u64,
    /// Decrypted message body
    pub plaintext: Vec<u8>,
}

/// Consumer end of a handle's update queue.
///
/// Updates arrive in strictly increasing sequence number order with no gaps.
/// Dropping this (or calling [`Updates::close`]) makes further deliveries
/// report [`crate::ReplyOutcome::Closed`].
///
/// A consumer that serves many handles from one task must drain every queue
/// promptly. Otherwise one stalled queue blocks
/// [`crate::Handle::on_response`] for its handle, and through it the shared
/// reply path.
#[derive(Debug)]
pub struct Updates {
    rx: mpsc::Receiver<Update>,
}

impl Updates {
    /// Wait for the next update.
    ///
    /// Returns `None` once the handle is dropped and the queue drained.
    pub async fn recv(&mut self) -> Option<Update> {
        self.rx.recv().await
    }

    /// Take the next update if one is queued.
    pub fn try_recv(&mut self) -> Result<Update, TryRecvError> {
        self.rx.try_recv()
    }

    /// Blocking variant of [`Updates::recv`] for synchronous consumers.
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous runtime.
    pub fn blocking_recv(&mut self) -> Option<Update> {
        self.rx.blocking_recv()
    }

    /// Stop accepting new updates. Already queued updates stay readable.
    pub fn close(&mut self) {
        self.rx.close();
    }
}

/// Create a bounded update queue.
///
/// # Errors
///
/// - `InvalidConfig`: `capacity` is zero
pub(crate) fn channel(capacity: usize) -> Result<(mpsc::Sender<Update>, Updates), HandleError> {
    if capacity == 0 {
        return Err(HandleError::InvalidConfig {
            reason: "update queue capacity must be at least 1".to_string(),
        });
    }

    let (tx, rx) = mpsc::channel(capacity);
    Ok((tx, Updates { rx }))
}
