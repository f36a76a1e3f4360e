use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// A blocking, non-reentrant flag lock: one holder per aggregate id.
pub struct Lock {
    state: Mutex<bool>,
    wake: Condvar,
}

impl Default for Lock {
    fn default() -> Self {
        Self::new()
    }
}

impl Lock {
    pub fn new() -> Self {
        Lock {
            state: Mutex::new(false),
            wake: Condvar::new(),
        }
    }

    // The guarded value is a plain bool, so a poisoned mutex still holds a
    // meaningful state.
    fn state(&self) -> MutexGuard<'_, bool> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn lock(&self) {
        let mut locked = self.state();
        while *locked {
            locked = self
                .wake
                .wait(locked)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *locked = true;
    }

    pub fn unlock(&self) {
        let mut locked = self.state();
        if *locked {
            *locked = false;
            self.wake.notify_one();
        }
    }

    pub fn is_locked(&self) -> bool {
        *self.state()
    }
}
