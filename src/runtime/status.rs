use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::watch;

/// "Translation in flight" flag shared by concurrent calls
///
/// Counts active calls rather than locking them out; the flag is true while
/// at least one call is running.
#[derive(Debug)]
pub struct InFlightStatus {
    active: AtomicUsize,
    sender: watch::Sender<bool>,
}

impl Default for InFlightStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl InFlightStatus {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            active: AtomicUsize::new(0),
            sender,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst) > 0
    }

    /// Receiver that observes every change of the flag
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }

    /// Mark a call as running until the guard drops
    pub fn enter(&self) -> InFlightGuard<'_> {
        self.active.fetch_add(1, Ordering::SeqCst);
        self.publish();
        InFlightGuard { status: self }
    }

    fn publish(&self) {
        // Read the counter under the channel lock so the last publisher wins
        self.sender.send_if_modified(|flag| {
            let now = self.active.load(Ordering::SeqCst) > 0;
            if *flag == now {
                false
            } else {
                *flag = now;
                true
            }
        });
    }
}

/// Clears its share of the in-flight flag on drop, including on cancellation
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    status: &'a InFlightStatus,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.status.active.fetch_sub(1, Ordering::SeqCst);
        self.status.publish();
    }
}
