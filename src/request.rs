//! Latest-request-wins bookkeeping for background recomputes.
//!
//! ```text
//!            issue()              complete(token)
//!   Idle ───────────► Computing(t) ──────────────► Ready
//!                        │   ▲                       │
//!                        └───┘ issue() supersedes t  │ issue()
//!                                                    ▼
//!                                              Computing(t+1)
//! ```

/// Identifies one requested recompute. Later requests get larger tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(pub u64);

/// Where the most recent request stands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ComputeState {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// A recompute is in flight; only this token may commit.
    Computing(RequestToken),
    /// The latest request has committed its result.
    Ready,
}

#[derive(Clone, Debug, Default)]
pub struct RequestTracker {
    next: u64,
    state: ComputeState,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ComputeState {
        self.state
    }

    /// Starts a new request, superseding any in flight.
    pub fn issue(&mut self) -> RequestToken {
        let token = RequestToken(self.next);
        self.next += 1;
        self.state = ComputeState::Computing(token);
        token
    }

    /// Whether `token` is the one currently allowed to commit.
    pub fn is_current(&self, token: RequestToken) -> bool {
        self.state == ComputeState::Computing(token)
    }

    /// Marks `token` done. Returns `false`, changing nothing, if it was superseded.
    pub fn complete(&mut self, token: RequestToken) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.state = ComputeState::Ready;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle() {
        assert_eq!(RequestTracker::new().state(), ComputeState::Idle);
    }

    #[test]
    fn latest_request_wins() {
        let mut tracker = RequestTracker::new();
        let first = tracker.issue();
        let second = tracker.issue();
        assert!(second > first);
        assert!(!tracker.complete(first));
        assert_eq!(tracker.state(), ComputeState::Computing(second));
        assert!(tracker.complete(second));
        assert_eq!(tracker.state(), ComputeState::Ready);
    }

    #[test]
    fn completing_twice_is_rejected() {
        let mut tracker = RequestTracker::new();
        let token = tracker.issue();
        assert!(tracker.complete(token));
        assert!(!tracker.complete(token));
    }
}
