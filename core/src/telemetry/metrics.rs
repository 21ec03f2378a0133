use std::sync::Mutex;

/// Running counters across load and extraction passes.
pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metrics {
    pub passes: usize,
    pub scanned: usize,
    pub matched: usize,
    pub rejected: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics::default()),
        }
    }

    pub fn record_pass(&self, scanned: usize, matched: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.passes += 1;
            metrics.scanned += scanned;
            metrics.matched += matched;
        }
    }

    pub fn record_rejected(&self, count: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.rejected += count;
        }
    }

    pub fn snapshot(&self) -> Metrics {
        self.inner
            .lock()
            .map(|metrics| *metrics)
            .unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let recorder = MetricsRecorder::new();
        recorder.record_pass(10, 3);
        recorder.record_pass(10, 5);
        recorder.record_rejected(2);
        let snapshot = recorder.snapshot();
        assert_eq!(snapshot.passes, 2);
        assert_eq!(snapshot.scanned, 20);
        assert_eq!(snapshot.matched, 8);
        assert_eq!(snapshot.rejected, 2);
    }
}
