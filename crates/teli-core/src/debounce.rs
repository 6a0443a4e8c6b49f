use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

/// Token identifying one armed debounce window
pub type Generation = u64;

/// Session-side half of a debounce: decides whether a timer that fired is
/// still the latest one. Arming again supersedes whatever was pending, so a
/// timer that slipped past cancellation is ignored when it reports in.
#[derive(Debug, Clone)]
pub struct DebounceGate {
    delay: Duration,
    issued: Generation,
    pending: Option<Generation>,
}

impl DebounceGate {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            issued: 0,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Start a new quiet period, replacing any pending one
    pub fn arm(&mut self) -> Generation {
        self.issued += 1;
        self.pending = Some(self.issued);
        self.issued
    }

    /// Drop the pending period. Returns whether one was pending.
    pub fn disarm(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// A timer fired. True only for the most recently armed generation, and
    /// only once.
    pub fn fire(&mut self, generation: Generation) -> bool {
        if self.pending == Some(generation) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Numbers outgoing requests so that only the response to the latest one is
/// applied, whatever order responses arrive in.
#[derive(Debug, Clone, Default)]
pub struct RequestSequence {
    latest: u64,
}

impl RequestSequence {
    pub fn next(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    /// Make every outstanding request stale without issuing a new one
    pub fn invalidate(&mut self) {
        self.latest += 1;
    }

    pub fn is_latest(&self, seq: u64) -> bool {
        seq == self.latest
    }
}

/// A scheduled timer that can be called off
pub trait TimerHandle {
    fn cancel(self);
}

/// Driver-side half of a debounce: at most one live timer per key.
///
/// Replacing a slot cancels the timer it held, so handles never accumulate.
pub struct TimerSlots<K, H: TimerHandle> {
    slots: HashMap<K, H>,
}

impl<K: Eq + Hash, H: TimerHandle> TimerSlots<K, H> {
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }

    pub fn replace(&mut self, key: K, handle: H) {
        if let Some(previous) = self.slots.insert(key, handle) {
            previous.cancel();
        }
    }

    pub fn cancel(&mut self, key: &K) -> bool {
        match self.slots.remove(key) {
            Some(handle) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    /// Forget a timer that already fired
    pub fn release(&mut self, key: &K) {
        self.slots.remove(key);
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn cancel_all(&mut self) {
        for (_, handle) in self.slots.drain() {
            handle.cancel();
        }
    }
}

impl<K: Eq + Hash, H: TimerHandle> Default for TimerSlots<K, H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "runtime")]
impl TimerHandle for tokio::task::JoinHandle<()> {
    fn cancel(self) {
        self.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recorded(u32, Rc<RefCell<Vec<u32>>>);

    impl TimerHandle for Recorded {
        fn cancel(self) {
            self.1.borrow_mut().push(self.0);
        }
    }

    #[test]
    fn test_later_arm_supersedes_earlier() {
        let mut gate = DebounceGate::new(Duration::from_millis(400));
        let first = gate.arm();
        let second = gate.arm();
        assert!(!gate.fire(first));
        assert!(gate.fire(second));
        assert!(!gate.fire(second), "a generation fires at most once");
    }

    #[test]
    fn test_disarm_blocks_pending_timer() {
        let mut gate = DebounceGate::new(Duration::from_millis(400));
        let generation = gate.arm();
        assert!(gate.disarm());
        assert!(!gate.fire(generation));
        assert!(!gate.disarm());
    }

    #[test]
    fn test_sequence_keeps_only_latest() {
        let mut seq = RequestSequence::default();
        let a = seq.next();
        let b = seq.next();
        assert!(!seq.is_latest(a));
        assert!(seq.is_latest(b));
        seq.invalidate();
        assert!(!seq.is_latest(b));
    }

    #[test]
    fn test_slots_cancel_replaced_handles() {
        let cancelled = Rc::new(RefCell::new(Vec::new()));
        let mut slots = TimerSlots::new();
        slots.replace("overlay", Recorded(1, cancelled.clone()));
        slots.replace("overlay", Recorded(2, cancelled.clone()));
        slots.replace("row-3", Recorded(3, cancelled.clone()));
        assert_eq!(*cancelled.borrow(), vec![1]);
        assert_eq!(slots.len(), 2);

        slots.release(&"overlay");
        assert!(!slots.cancel(&"overlay"));
        assert!(slots.cancel(&"row-3"));
        assert_eq!(*cancelled.borrow(), vec![1, 3]);
        assert!(slots.is_empty());
    }
}
