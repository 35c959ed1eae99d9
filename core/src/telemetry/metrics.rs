use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Frame and rep counters for one processing call.
pub struct PipelineCounters {
    inner: Mutex<CounterSnapshot>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    pub frames_processed: usize,
    pub frames_skipped: usize,
    pub reps_completed: usize,
}

impl PipelineCounters {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(CounterSnapshot::default()),
        }
    }

    pub fn record_processed(&self) {
        if let Ok(mut counters) = self.inner.lock() {
            counters.frames_processed += 1;
        }
    }

    /// A frame dropped because the pose source failed on it.
    pub fn record_skipped(&self) {
        if let Ok(mut counters) = self.inner.lock() {
            counters.frames_skipped += 1;
        }
    }

    pub fn record_rep(&self) {
        if let Ok(mut counters) = self.inner.lock() {
            counters.reps_completed += 1;
        }
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        self.inner
            .lock()
            .map(|counters| *counters)
            .unwrap_or_default()
    }
}

impl Default for PipelineCounters {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let counters = PipelineCounters::new();
        counters.record_processed();
        counters.record_processed();
        counters.record_skipped();
        counters.record_rep();
        assert_eq!(
            counters.snapshot(),
            CounterSnapshot {
                frames_processed: 2,
                frames_skipped: 1,
                reps_completed: 1,
            }
        );
    }
}
