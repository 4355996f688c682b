//! In-process registry for interactive edit sessions.
//!
//! A host that ships an image to an external editor parks the request here:
//! it registers a pending session under its own id, blocks on
//! [`SessionRegistry::wait`], and some other thread later settles the
//! session with a result image or a cancellation.  A session is settled at
//! most once, and its entry disappears as soon as the waiter is done with
//! it, whatever the outcome.

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::surface_utils::image_surface::ImageSurface;

/// How waiting on a session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    /// The editor committed a result before the deadline.
    Resolved(ImageSurface),

    /// Nobody settled the session in time.
    TimedOut,

    /// The editor discarded the session.
    Cancelled,
}

enum SessionState {
    Pending,
    Resolved(ImageSurface),
    Cancelled,

    /// The waiter consumed the outcome, or gave up on the deadline.
    Taken,
}

struct SessionEntry {
    state: Mutex<SessionState>,
    signal: Condvar,
}

impl SessionEntry {
    fn pending() -> Arc<SessionEntry> {
        Arc::new(SessionEntry {
            state: Mutex::new(SessionState::Pending),
            signal: Condvar::new(),
        })
    }

    /// Applies a Pending → settled transition; the first one wins.
    fn settle(&self, settled: SessionState) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        match *state {
            SessionState::Pending => {
                *state = settled;
                self.signal.notify_all();
                true
            }
            _ => false,
        }
    }
}

/// Registry of in-flight edit sessions, keyed by a caller-chosen id.
#[derive(Default)]
pub struct SessionRegistry {
    entries: Mutex<HashMap<String, Arc<SessionEntry>>>,
}

impl SessionRegistry {
    pub fn new() -> SessionRegistry {
        SessionRegistry::default()
    }

    /// Registers a fresh pending session under `id`.
    ///
    /// A stale session under the same id is replaced; its waiter, if any,
    /// keeps its own entry and times out on its own schedule.
    pub fn begin(&self, id: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(id.to_string(), SessionEntry::pending());

        relight_log!("(session {} pending)", id);
    }

    /// Settles a pending session with its result image.
    ///
    /// Returns false if the id is unknown or the session is already settled.
    pub fn resolve(&self, id: &str, image: ImageSurface) -> bool {
        let settled = self.settle(id, SessionState::Resolved(image));
        if settled {
            relight_log!("(session {} resolved)", id);
        }

        settled
    }

    /// Settles a pending session as cancelled.
    ///
    /// Returns false if the id is unknown or the session is already settled.
    pub fn cancel(&self, id: &str) -> bool {
        let settled = self.settle(id, SessionState::Cancelled);
        if settled {
            relight_log!("(session {} cancelled)", id);
        }

        settled
    }

    fn settle(&self, id: &str, state: SessionState) -> bool {
        let entry = {
            let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            entries.get(id).cloned()
        };

        match entry {
            Some(entry) => entry.settle(state),
            None => false,
        }
    }

    /// Blocks until the session under `id` settles or the timeout elapses.
    ///
    /// The entry is removed on the way out, so an id can be reused for the
    /// next round trip.  Waiting on an unknown id times out immediately.
    pub fn wait(&self, id: &str, timeout: Duration) -> SessionOutcome {
        let entry = {
            let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            entries.get(id).cloned()
        };

        let entry = match entry {
            Some(entry) => entry,
            None => return SessionOutcome::TimedOut,
        };

        let deadline = Instant::now() + timeout;
        let mut state = entry.state.lock().unwrap_or_else(PoisonError::into_inner);

        while matches!(*state, SessionState::Pending) {
            let now = Instant::now();
            if now >= deadline {
                break;
            }

            let (guard, _) = entry
                .signal
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            state = guard;
        }

        // Taken stays behind so that a resolve or cancel racing with the
        // removal below reports failure instead of settling a finished
        // session.  A run into the deadline consumes the entry the same way.
        let outcome = match std::mem::replace(&mut *state, SessionState::Taken) {
            SessionState::Resolved(image) => SessionOutcome::Resolved(image),
            SessionState::Cancelled => SessionOutcome::Cancelled,
            SessionState::Pending | SessionState::Taken => SessionOutcome::TimedOut,
        };

        drop(state);
        self.remove(id, &entry);

        relight_log!(
            "(session {} finished: {})",
            id,
            match outcome {
                SessionOutcome::Resolved(_) => "resolved",
                SessionOutcome::TimedOut => "timed out",
                SessionOutcome::Cancelled => "cancelled",
            }
        );

        outcome
    }

    /// Removes `id` unless a newer session already took the slot over.
    fn remove(&self, id: &str, entry: &Arc<SessionEntry>) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(current) = entries.get(id) {
            if Arc::ptr_eq(current, entry) {
                entries.remove(id);
            }
        }
    }

    /// Whether a session under `id` is currently registered.
    pub fn contains(&self, id: &str) -> bool {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.contains_key(id)
    }
}
