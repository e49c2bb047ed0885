//! One-shot deferred actions on the simulation clock
//!
//! The session polls the set with the current time; anything due is handed
//! back exactly once. Cancelling (one timer, or all of them when a session is
//! torn down) guarantees the action never comes back.

/// Handle for cancelling a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
struct Pending<K> {
    id: TimerId,
    due_ms: u64,
    kind: K,
}

/// A small set of pending one-shot timers
#[derive(Debug, Clone)]
pub struct Timers<K> {
    pending: Vec<Pending<K>>,
    next_id: u64,
}

impl<K> Default for Timers<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Timers<K> {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            next_id: 1,
        }
    }

    /// Fire `kind` once the clock reaches `due_ms`
    pub fn schedule(&mut self, due_ms: u64, kind: K) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending { id, due_ms, kind });
        id
    }

    /// Returns true if the timer was still pending
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.id != id);
        self.pending.len() != before
    }

    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.pending.len();
        self.pending.clear();
        cancelled
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.iter().any(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Remove and return everything due at `now_ms`, earliest first
    /// (ties in scheduling order)
    pub fn poll(&mut self, now_ms: u64) -> Vec<K> {
        let mut due = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].due_ms <= now_ms {
                due.push(self.pending.remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by_key(|p| (p.due_ms, p.id.0));
        due.into_iter().map(|p| p.kind).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_when_due() {
        let mut timers = Timers::new();
        timers.schedule(100, "a");
        assert!(timers.poll(99).is_empty());
        assert_eq!(timers.poll(100), vec!["a"]);
        assert!(timers.poll(500).is_empty());
        assert!(timers.is_empty());
    }

    #[test]
    fn test_cancel() {
        let mut timers = Timers::new();
        let a = timers.schedule(100, "a");
        let b = timers.schedule(50, "b");
        assert!(timers.cancel(a));
        assert!(!timers.cancel(a));
        assert!(!timers.is_pending(a));
        assert!(timers.is_pending(b));
        assert_eq!(timers.poll(1000), vec!["b"]);
    }

    #[test]
    fn test_cancel_all() {
        let mut timers = Timers::new();
        timers.schedule(10, 1);
        timers.schedule(20, 2);
        assert_eq!(timers.cancel_all(), 2);
        assert!(timers.poll(u64::MAX).is_empty());
    }

    #[test]
    fn test_poll_orders_by_due_time() {
        let mut timers = Timers::new();
        timers.schedule(30, "late");
        timers.schedule(10, "early");
        timers.schedule(10, "early-second");
        assert_eq!(timers.poll(30), vec!["early", "early-second", "late"]);
    }
}
