//! Live fan-out of ingested samples to stream subscribers
//!
//! Delivery is best-effort and at-most-once. A subscriber that falls more
//! than [`FEED_CAPACITY`] samples behind skips the ones it missed.
//! [`RumBroadcaster::close`] ends every open feed so streaming responses
//! can finish during shutdown.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::models::RumSample;

pub const FEED_CAPACITY: usize = 256;

/// Registry of live subscribers
#[derive(Clone)]
pub struct RumBroadcaster {
    tx: broadcast::Sender<RumSample>,
    subscribers: Arc<AtomicUsize>,
    closed: Arc<watch::Sender<bool>>,
}

impl RumBroadcaster {
    pub fn new() -> Self {
        Self::with_capacity(FEED_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        let (closed, _) = watch::channel(false);
        Self {
            tx,
            subscribers: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(closed),
        }
    }

    /// Register a subscriber; dropping the feed unregisters it
    pub fn subscribe(&self) -> RumFeed {
        let count = self.subscribers.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(subscribers = count, "Stream subscriber connected");
        RumFeed {
            rx: self.tx.subscribe(),
            subscribers: self.subscribers.clone(),
            closed: self.closed.subscribe(),
        }
    }

    /// Deliver to every current subscriber; returns how many received it
    pub fn publish(&self, sample: RumSample) -> usize {
        // Err only means nobody is listening
        self.tx.send(sample).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.load(Ordering::SeqCst)
    }

    /// End every current and future feed
    pub fn close(&self) {
        if !self.closed.send_replace(true) {
            debug!(subscribers = self.subscriber_count(), "Closing live feed");
        }
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }
}

impl Default for RumBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// One subscriber's view of the live feed
pub struct RumFeed {
    rx: broadcast::Receiver<RumSample>,
    subscribers: Arc<AtomicUsize>,
    closed: watch::Receiver<bool>,
}

impl RumFeed {
    /// Next published sample, or `None` once the broadcaster is closed or gone
    pub async fn next(&mut self) -> Option<RumSample> {
        loop {
            if *self.closed.borrow_and_update() {
                return None;
            }
            tokio::select! {
                changed = self.closed.changed() => {
                    if changed.is_err() {
                        return None;
                    }
                }
                received = self.rx.recv() => match received {
                    Ok(sample) => return Some(sample),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Stream subscriber lagged; skipping samples");
                    }
                    Err(RecvError::Closed) => return None,
                },
            }
        }
    }
}

impl Drop for RumFeed {
    fn drop(&mut self) {
        let remaining = self.subscribers.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        debug!(subscribers = remaining, "Stream subscriber disconnected");
    }
}
