//! Bounded sample history (ring discipline).
//! Oldest samples are evicted at capacity; the first eviction logs a warning
//! and sends one [`RecorderNotice::CapacityReached`] to listeners.

use std::collections::VecDeque;
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::config::RecorderConfig;
use crate::systems::sdk::{Issuer, PendulumState, PushAction, Sample, SampleAction};

/// One mutator, any number of snapshot readers.
pub type SharedRecorder = Arc<Mutex<Recorder>>;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RecorderNotice {
    /// Buffer is full and started evicting; sent once per fill.
    CapacityReached { capacity: usize, time: f64 },
}

pub struct Recorder {
    buf: VecDeque<Sample>,
    capacity: usize,
    recording: bool,
    warned: bool,
    evicted: u64,
    tx: Sender<RecorderNotice>,
    rx: Receiver<RecorderNotice>,
}

impl Recorder {
    pub fn new(cfg: RecorderConfig) -> Self {
        Self::with_capacity(cfg.capacity)
    }

    /// Capacity is at least one sample.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, rx) = unbounded();
        Self {
            buf: VecDeque::with_capacity(capacity.min(RecorderConfig::DEFAULT_CAPACITY)),
            capacity,
            recording: false,
            warned: false,
            evicted: 0,
            tx,
            rx,
        }
    }

    pub fn into_shared(self) -> SharedRecorder {
        Arc::new(Mutex::new(self))
    }

    pub fn notices(&self) -> Receiver<RecorderNotice> {
        self.rx.clone()
    }

    pub fn start_recording(&mut self) {
        if !self.recording {
            self.recording = true;
            info!(len = self.buf.len(), "recording started");
        }
    }

    /// Stop appending; history is kept.
    pub fn stop_recording(&mut self) {
        if self.recording {
            self.recording = false;
            info!(len = self.buf.len(), "recording stopped");
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Append one sample. Returns false when not recording.
    pub fn record_snapshot(&mut self, state: PendulumState, action: Option<SampleAction>) -> bool {
        if !self.recording {
            return false;
        }
        if self.buf.len() >= self.capacity {
            self.buf.pop_front();
            self.evicted += 1;
            if !self.warned {
                self.warned = true;
                warn!(capacity = self.capacity, time = state.time, "recorder at capacity, evicting oldest samples");
                let _ = self.tx.send(RecorderNotice::CapacityReached {
                    capacity: self.capacity,
                    time: state.time,
                });
            }
        }
        self.buf.push_back(Sample { state, action });
        true
    }

    pub fn record_push(&mut self, state: PendulumState, push: PushAction, issuer: Issuer) -> bool {
        self.record_snapshot(state, Some(SampleAction { push, issuer }))
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples dropped since the last `clear`.
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    pub fn capacity_warned(&self) -> bool {
        self.warned
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.buf.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.buf.iter()
    }

    /// Owned copy of the history, oldest first.
    pub fn snapshot(&self) -> Vec<Sample> {
        self.buf.iter().copied().collect()
    }

    /// Drop all history and re-arm the capacity warning.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.warned = false;
        self.evicted = 0;
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new(RecorderConfig::default())
    }
}
