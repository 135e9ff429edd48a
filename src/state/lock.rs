use std::sync::atomic::{AtomicBool, Ordering};

/// Re-entrancy lock for host actions. A second action that arrives while one is
/// being applied is dropped, not queued.
#[derive(Debug, Default)]
pub struct ActionLock {
    busy: AtomicBool,
}

/// Releases the lock on drop
#[derive(Debug)]
pub struct ActionGuard<'a> {
    lock: &'a ActionLock,
}

impl ActionLock {
    pub fn try_acquire(&self) -> Option<ActionGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ActionGuard { lock: self })
    }

    pub fn is_held(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for ActionGuard<'_> {
    fn drop(&mut self) {
        self.lock.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_fails_until_release() {
        let lock = ActionLock::default();
        let guard = lock.try_acquire();
        assert!(guard.is_some());
        assert!(lock.is_held());
        assert!(lock.try_acquire().is_none());

        drop(guard);
        assert!(!lock.is_held());
        assert!(lock.try_acquire().is_some());
    }
}
