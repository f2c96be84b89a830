//! Per-location rolling windows of recent readings.
//!
//! [`SequenceWindow`] is a fixed-capacity FIFO. [`WindowStore`] keeps one
//! window per station location, each behind its own mutex: appends for the
//! same location are serialized, different locations never contend beyond the
//! brief map lookup.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, RwLock};

use hydrowatch_core::{LocationKey, Reading};

/// The most recent `capacity` readings for one location, oldest first.
#[derive(Debug, Clone)]
pub struct SequenceWindow {
    capacity: usize,
    readings: VecDeque<Reading>,
}

impl SequenceWindow {
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 1, "window capacity must be at least 1");
        Self {
            capacity,
            readings: VecDeque::with_capacity(capacity),
        }
    }

    /// Push a reading, evicting the oldest one once the window is full.
    pub fn append(&mut self, reading: Reading) {
        if self.readings.len() == self.capacity {
            self.readings.pop_front();
        }
        self.readings.push_back(reading);
    }

    /// Readings oldest to newest.
    pub fn snapshot(&self) -> Vec<Reading> {
        self.readings.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.readings.len() == self.capacity
    }
}

/// Windows keyed by station location.
#[derive(Debug)]
pub struct WindowStore {
    capacity: usize,
    windows: RwLock<HashMap<LocationKey, Arc<Mutex<SequenceWindow>>>>,
}

impl WindowStore {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 1, "window capacity must be at least 1");
        Self {
            capacity,
            windows: RwLock::new(HashMap::new()),
        }
    }

    /// Append a reading to its location's window and return the window's
    /// contents as of this append.
    ///
    /// The snapshot is taken inside the same critical section as the append,
    /// so concurrent ingests for one location each see a consistent window.
    pub fn append(&self, reading: Reading) -> Vec<Reading> {
        let window = self.window_for(reading.location());
        let mut window = window.lock().expect("window lock poisoned");
        window.append(reading);
        window.snapshot()
    }

    /// Current contents for a location, if any reading has been seen.
    pub fn snapshot(&self, location: &LocationKey) -> Option<Vec<Reading>> {
        let windows = self.windows.read().expect("window map lock poisoned");
        windows
            .get(location)
            .map(|w| w.lock().expect("window lock poisoned").snapshot())
    }

    /// Number of tracked locations.
    pub fn locations(&self) -> usize {
        self.windows.read().expect("window map lock poisoned").len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn window_for(&self, location: LocationKey) -> Arc<Mutex<SequenceWindow>> {
        if let Some(w) = self
            .windows
            .read()
            .expect("window map lock poisoned")
            .get(&location)
        {
            return Arc::clone(w);
        }
        let mut windows = self.windows.write().expect("window map lock poisoned");
        Arc::clone(
            windows
                .entry(location)
                .or_insert_with(|| Arc::new(Mutex::new(SequenceWindow::new(self.capacity)))),
        )
    }
}
