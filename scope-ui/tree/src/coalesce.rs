use std::time::{Duration, Instant};

#[derive(Debug)]
struct Pending<T> {
    value: T,
    deadline: Instant,
}

/// Trailing-edge coalescing of scroll-into-view requests.
///
/// The first request opens a window of fixed length; requests arriving
/// inside it replace the pending value. When the window closes, the latest
/// value is released once. Nothing is queued.
#[derive(Debug)]
pub struct ScrollCoalescer<T> {
    interval: Duration,
    pending: Option<Pending<T>>,
}

impl<T> ScrollCoalescer<T> {
    /// Create a coalescer releasing requests after `interval`.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending: None,
        }
    }

    /// Length of the coalescing window.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Change the window length for requests recorded from now on.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Whether a request is waiting for its window to close.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Record a request; a pending one is overwritten.
    pub fn push(&mut self, value: T, now: Instant) {
        match self.pending.as_mut() {
            Some(pending) => {
                log::debug!("tree scroll request superseded");
                pending.value = value;
            },
            None => {
                self.pending = Some(Pending {
                    value,
                    deadline: now + self.interval,
                });
            },
        }
    }

    /// Release the latest request once its window has closed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let deadline = self.pending.as_ref()?.deadline;
        if now < deadline {
            return None;
        }

        self.pending.take().map(|pending| pending.value)
    }

    /// Drop any pending request.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
