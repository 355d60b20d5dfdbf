//! Bounded, interruptible FIFO shared by the walk thread and the search workers.
//!
//! [`BoundedChannel`] owns both ends of a `crossbeam_channel::bounded` queue so that any holder can
//! both `put` and `take` (workers republish the sentinel into the same channel they drain). Every
//! blocking call is selected together with a [`CancelToken`], so a cancelled run unblocks waiting
//! threads instead of leaving them parked forever.

use crossbeam_channel::{Receiver, Select, Sender, bounded};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Failures of a channel operation. None of them leave the buffer partially mutated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChannelError {
    /// The shared [`CancelToken`] fired before or while the caller was waiting.
    #[error("channel operation interrupted by cancellation")]
    Interrupted,
    /// Every handle on the other side is gone. Cannot happen while a [`BoundedChannel`] is alive,
    /// since each handle keeps both ends open.
    #[error("channel disconnected")]
    Disconnected,
    #[error("channel capacity must be at least 1")]
    ZeroCapacity,
}

/// Cooperative cancellation shared by every blocking operation of a pipeline run.
///
/// Cancelling drops the only sender of an internal signal channel; every `Select` waiting on the
/// receiving side then wakes with a disconnect, which is how blocked `put`/`take` calls notice.
#[derive(Clone, Debug)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    trigger: Arc<Mutex<Option<Sender<()>>>>,
    signal: Receiver<()>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, rx) = bounded::<()>(0);
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            trigger: Arc::new(Mutex::new(Some(tx))),
            signal: rx,
        }
    }

    /// Fire the token. Idempotent; wakes every operation currently blocked on it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        let sender = self
            .trigger
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        drop(sender);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub(crate) fn signal(&self) -> &Receiver<()> {
        &self.signal
    }
}

/// Fixed-capacity FIFO with blocking `put`/`take`. Clones are handles on the same buffer.
#[derive(Debug)]
pub struct BoundedChannel<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
    capacity: usize,
    cancel: CancelToken,
}

impl<T> Clone for BoundedChannel<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            rx: self.rx.clone(),
            capacity: self.capacity,
            cancel: self.cancel.clone(),
        }
    }
}

impl<T> BoundedChannel<T> {
    /// Create a channel holding at most `capacity` items. A zero capacity is rejected: the
    /// sentinel protocol needs room to park the republished token.
    pub fn new(capacity: usize, cancel: CancelToken) -> Result<Self, ChannelError> {
        if capacity == 0 {
            return Err(ChannelError::ZeroCapacity);
        }
        let (tx, rx) = bounded(capacity);
        Ok(Self {
            tx,
            rx,
            capacity,
            cancel,
        })
    }

    /// Append `item` at the tail, suspending while the buffer is full.
    ///
    /// On [`ChannelError::Interrupted`] the item was not enqueued and is dropped.
    pub fn put(&self, item: T) -> Result<(), ChannelError> {
        if self.cancel.is_cancelled() {
            return Err(ChannelError::Interrupted);
        }
        let mut sel = Select::new();
        let send_idx = sel.send(&self.tx);
        let cancel_idx = sel.recv(self.cancel.signal());
        let oper = sel.select();
        match oper.index() {
            i if i == send_idx => oper
                .send(&self.tx, item)
                .map_err(|_| ChannelError::Disconnected),
            i if i == cancel_idx => {
                let _ = oper.recv(self.cancel.signal());
                Err(ChannelError::Interrupted)
            }
            _ => unreachable!("select returned an operation that was never registered"),
        }
    }

    /// Remove and return the head item, suspending while the buffer is empty.
    pub fn take(&self) -> Result<T, ChannelError> {
        if self.cancel.is_cancelled() {
            return Err(ChannelError::Interrupted);
        }
        let mut sel = Select::new();
        let recv_idx = sel.recv(&self.rx);
        let cancel_idx = sel.recv(self.cancel.signal());
        let oper = sel.select();
        match oper.index() {
            i if i == recv_idx => oper.recv(&self.rx).map_err(|_| ChannelError::Disconnected),
            i if i == cancel_idx => {
                let _ = oper.recv(self.cancel.signal());
                Err(ChannelError::Interrupted)
            }
            _ => unreachable!("select returned an operation that was never registered"),
        }
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.tx.is_full()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }
}
