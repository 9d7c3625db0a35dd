//!
//! Discard results of superseded computations.
//!
//! A caller that recomputes RTMR3 every time an input changes may have several
//! computations in flight, which can complete in any order. Each computation
//! takes a [Ticket] when it starts, and its result is only published if no
//! other computation was started since.
//!
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::rtmr3::{compute, Rtmr3Inputs};

/// Identifies one computation. Tickets are ordered by start time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Holds the result of the most recently started computation.
///
/// ```
/// use rtmr3_replay::session::ComputeSession;
///
/// let session = ComputeSession::new();
/// let slow = session.begin();
/// let fast = session.begin();
/// assert!(session.finish(fast, "new"));
/// // The first computation was superseded, its result is dropped
/// assert!(!session.finish(slow, "old"));
/// assert_eq!(session.latest(), Some("new"));
/// ```
#[derive(Debug)]
pub struct ComputeSession<T> {
    issued: AtomicU64,
    // Ticket of the published value, and the value
    latest: Mutex<Option<(Ticket, T)>>,
}

impl<T> Default for ComputeSession<T> {
    fn default() -> Self {
        Self {
            issued: AtomicU64::new(0),
            latest: Mutex::new(None),
        }
    }
}

impl<T: Clone> ComputeSession<T> {
    /// Create an empty session
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new computation, superseding all the ones in flight
    pub fn begin(&self) -> Ticket {
        Ticket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// True if no computation was started after this one
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.issued.load(Ordering::SeqCst) == ticket.0
    }

    /// Publish the result of a computation. Returns false, and drops the
    /// value, if the computation was superseded.
    pub fn finish(&self, ticket: Ticket, value: T) -> bool {
        let mut latest = self.latest.lock().unwrap_or_else(|e| e.into_inner());
        if !self.is_current(ticket) {
            log::debug!("dropping result of superseded computation {ticket:?}");
            return false;
        }
        if matches!(&*latest, Some((t, _)) if *t > ticket) {
            return false;
        }
        *latest = Some((ticket, value));
        true
    }

    /// Result of the latest computation that completed without being
    /// superseded
    pub fn latest(&self) -> Option<T> {
        let latest = self.latest.lock().unwrap_or_else(|e| e.into_inner());
        latest.as_ref().map(|(_, v)| v.clone())
    }

    /// Run one computation within the session. Returns the result if it was
    /// published.
    pub fn run<F: FnOnce() -> T>(&self, f: F) -> Option<T> {
        let ticket = self.begin();
        let value = f();
        if self.finish(ticket, value.clone()) {
            Some(value)
        } else {
            None
        }
    }
}

impl ComputeSession<String> {
    /// Compute RTMR3 for new inputs. Returns None if another computation was
    /// started in the meantime.
    pub fn submit(&self, inputs: &Rtmr3Inputs) -> Option<String> {
        self.run(|| compute(inputs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::thread;

    use crate::rtmr3::ComposeInput;

    #[test]
    fn test_tickets() {
        let session = ComputeSession::<u32>::new();
        assert_eq!(session.latest(), None);

        let t1 = session.begin();
        assert!(session.is_current(t1));
        let t2 = session.begin();
        assert!(t2 > t1);
        assert!(!session.is_current(t1));
        assert!(session.is_current(t2));

        assert!(!session.finish(t1, 1));
        assert_eq!(session.latest(), None);
        assert!(session.finish(t2, 2));
        assert_eq!(session.latest(), Some(2));

        assert_eq!(session.run(|| 3), Some(3));
        assert_eq!(session.latest(), Some(3));
    }

    #[test]
    fn test_out_of_order() {
        let session = Arc::new(ComputeSession::<String>::new());
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        // A slow computation, which completes after a newer one
        let s = Arc::clone(&session);
        let slow = thread::spawn(move || {
            s.run(|| {
                started_tx.send(()).unwrap();
                release_rx.recv().unwrap();
                "slow".to_string()
            })
        });

        started_rx.recv().unwrap();
        assert_eq!(session.run(|| "fast".to_string()), Some("fast".to_string()));
        release_tx.send(()).unwrap();

        assert_eq!(slow.join().unwrap(), None);
        assert_eq!(session.latest(), Some("fast".to_string()));
    }

    #[test]
    fn test_submit() {
        let session = ComputeSession::new();
        let zero = "00".repeat(48);
        let mut inputs = Rtmr3Inputs {
            rootfs_hash: zero.clone(),
            app_id: zero.clone(),
            compose: ComposeInput::Manifest(r#"{"a":1}"#.to_string()),
            ca_cert_hash: zero.clone(),
            instance_id: zero,
        };
        let rtmr3 = session.submit(&inputs).unwrap();
        assert_eq!(rtmr3.len(), 96);

        // Missing input publishes the empty value
        inputs.app_id.clear();
        assert_eq!(session.submit(&inputs), Some(String::new()));
        assert_eq!(session.latest(), Some(String::new()));
    }
}
