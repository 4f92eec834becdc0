//! Throttled progress reporting.

use std::time::{Duration, Instant};

/// Callback invoked with `(percent, message)` as a scan advances.
pub type ProgressFn<'a> = dyn Fn(u8, &str) + Send + Sync + 'a;

/// Minimum wall-clock gap between two callback invocations.
const MIN_INTERVAL: Duration = Duration::from_millis(100);

/// Minimum percentage change between two callback invocations.
const MIN_DELTA: u8 = 1;

/// Rate-limits progress callbacks.
///
/// An update is forwarded only when both the wall-clock interval and the
/// percentage delta since the last emission are large enough, so a fast
/// walk over thousands of small files cannot flood the caller. Reported
/// percentages are monotonic; [`finish`](Self::finish) bypasses throttling
/// so completion always observes 100.
pub struct ProgressReporter<'a> {
    callback: Option<&'a ProgressFn<'a>>,
    min_interval: Duration,
    min_delta: u8,
    last_emit: Option<Instant>,
    last_percent: u8,
}

impl<'a> ProgressReporter<'a> {
    /// Wrap an optional callback with the default throttle.
    pub fn new(callback: Option<&'a ProgressFn<'a>>) -> Self {
        Self {
            callback,
            min_interval: MIN_INTERVAL,
            min_delta: MIN_DELTA,
            last_emit: None,
            last_percent: 0,
        }
    }

    /// Override the throttle thresholds.
    pub fn with_throttle(mut self, min_interval: Duration, min_delta: u8) -> Self {
        self.min_interval = min_interval;
        self.min_delta = min_delta;
        self
    }

    /// Offer an update; it is forwarded only if the throttle allows.
    pub fn report(&mut self, percent: u8, message: &str) {
        let Some(callback) = self.callback else {
            return;
        };
        let percent = percent.max(self.last_percent);

        if let Some(last) = self.last_emit {
            let moved_enough = percent.saturating_sub(self.last_percent) >= self.min_delta;
            if !moved_enough || last.elapsed() < self.min_interval {
                return;
            }
        }
        callback(percent, message);
        self.last_emit = Some(Instant::now());
        self.last_percent = percent;
    }

    /// Emit 100% unconditionally.
    pub fn finish(&mut self, message: &str) {
        if let Some(callback) = self.callback {
            callback(100, message);
        }
        self.last_emit = Some(Instant::now());
        self.last_percent = 100;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn collect(calls: &Mutex<Vec<u8>>) -> impl Fn(u8, &str) + Send + Sync + '_ {
        move |pct, _| calls.lock().unwrap().push(pct)
    }

    #[test]
    fn small_deltas_are_suppressed() {
        let calls = Mutex::new(Vec::new());
        let cb = collect(&calls);
        let mut reporter =
            ProgressReporter::new(Some(&cb)).with_throttle(Duration::ZERO, 10);

        reporter.report(5, "a");
        reporter.report(9, "b");
        reporter.report(15, "c");
        reporter.report(16, "d");
        assert_eq!(*calls.lock().unwrap(), vec![5, 15]);
    }

    #[test]
    fn interval_gates_even_large_deltas() {
        let calls = Mutex::new(Vec::new());
        let cb = collect(&calls);
        let mut reporter =
            ProgressReporter::new(Some(&cb)).with_throttle(Duration::from_secs(3600), 1);

        reporter.report(10, "a");
        reporter.report(90, "b");
        assert_eq!(*calls.lock().unwrap(), vec![10]);
    }

    #[test]
    fn percent_never_goes_backwards() {
        let calls = Mutex::new(Vec::new());
        let cb = collect(&calls);
        let mut reporter =
            ProgressReporter::new(Some(&cb)).with_throttle(Duration::ZERO, 1);

        reporter.report(40, "a");
        reporter.report(20, "b");
        reporter.report(41, "c");
        assert_eq!(*calls.lock().unwrap(), vec![40, 41]);
    }

    #[test]
    fn finish_always_emits_completion() {
        let calls = Mutex::new(Vec::new());
        let cb = collect(&calls);
        let mut reporter =
            ProgressReporter::new(Some(&cb)).with_throttle(Duration::from_secs(3600), 99);

        reporter.report(10, "a");
        reporter.finish("done");
        assert_eq!(*calls.lock().unwrap(), vec![10, 100]);
    }

    #[test]
    fn absent_callback_is_a_no_op() {
        let mut reporter = ProgressReporter::new(None);
        reporter.report(50, "a");
        reporter.finish("done");
    }
}
