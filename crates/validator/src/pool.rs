//! Free-list of per-call scratch buffers

use std::collections::HashSet;

use parking_lot::Mutex;

use crate::error::FieldError;

/// Reusable allocations for one validation call.
#[derive(Default)]
pub(crate) struct Scratch {
    pub(crate) errors: Vec<FieldError>,
    /// Structural paths selected by a partial or except call.
    pub(crate) selection: HashSet<String>,
    /// Buffer for building a field's structural path before filtering.
    pub(crate) path: String,
}

impl Scratch {
    fn reset(&mut self) {
        self.errors.clear();
        self.selection.clear();
        self.path.clear();
    }
}

pub(crate) struct ScratchPool {
    free: Mutex<Vec<Scratch>>,
    capacity: usize,
}

impl ScratchPool {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            free: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
        }
    }

    pub(crate) fn take(&self) -> Scratch {
        self.free.lock().pop().unwrap_or_default()
    }

    /// Returns a scratch to the pool; dropped when the pool is full.
    pub(crate) fn give(&self, mut scratch: Scratch) {
        scratch.reset();
        let mut free = self.free.lock();
        if free.len() < self.capacity {
            free.push(scratch);
        }
    }

    #[cfg(test)]
    pub(crate) fn idle(&self) -> usize {
        self.free.lock().len()
    }
}
