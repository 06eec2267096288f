//! Counting admission gate around a class of external processes.

use parking_lot::{Condvar, Mutex};

/// Bounds how many invocations of one kind of tool run at once.
///
/// Workers acquire a permit immediately before spawning the tool and the
/// permit is released when dropped, whatever the outcome.
#[derive(Debug)]
pub struct AdmissionGate {
    name: String,
    capacity: usize,
    in_use: Mutex<usize>,
    released: Condvar,
}

impl AdmissionGate {
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            capacity: capacity.max(1),
            in_use: Mutex::new(0),
            released: Condvar::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn in_use(&self) -> usize {
        *self.in_use.lock()
    }

    /// Block until a slot is free.
    pub fn acquire(&self) -> GatePermit<'_> {
        let mut in_use = self.in_use.lock();
        while *in_use >= self.capacity {
            self.released.wait(&mut in_use);
        }
        *in_use += 1;
        GatePermit { gate: self }
    }

    fn release(&self) {
        let mut in_use = self.in_use.lock();
        *in_use = in_use.saturating_sub(1);
        self.released.notify_one();
    }
}

/// A held slot of an [`AdmissionGate`].
#[derive(Debug)]
pub struct GatePermit<'a> {
    gate: &'a AdmissionGate,
}

impl Drop for GatePermit<'_> {
    fn drop(&mut self) {
        self.gate.release();
    }
}
