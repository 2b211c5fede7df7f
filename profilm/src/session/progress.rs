use std::time::Instant;

/// A point-in-time snapshot of render progress.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Progress {
    /// Frames produced so far.
    pub frames_done: u64,
    /// Frames requested in total.
    pub frames_total: u64,
    /// Wall-clock seconds since the pass started.
    pub elapsed_secs: f64,
    /// Frames per wall-clock second so far.
    pub effective_fps: f64,
    /// Completion in percent, `0..=100`.
    pub percent: f64,
    /// Estimated seconds remaining at the current rate.
    pub eta_secs: f64,
}

impl Progress {
    /// Derive a snapshot from raw counters.
    pub fn compute(frames_done: u64, frames_total: u64, elapsed_secs: f64) -> Self {
        let effective_fps = if elapsed_secs > 0.0 {
            frames_done as f64 / elapsed_secs
        } else {
            0.0
        };
        let percent = if frames_total > 0 {
            frames_done as f64 / frames_total as f64 * 100.0
        } else {
            100.0
        };
        let remaining = frames_total.saturating_sub(frames_done);
        let eta_secs = if effective_fps > 0.0 {
            remaining as f64 / effective_fps
        } else {
            0.0
        };
        Self { frames_done, frames_total, elapsed_secs, effective_fps, percent, eta_secs }
    }
}

/// Emits a [`Progress`] snapshot every `every` frames and at completion.
///
/// `every == 0` disables reporting entirely.
pub struct ProgressReporter {
    total: u64,
    every: u64,
    started: Instant,
}

impl ProgressReporter {
    /// Start the clock for a pass of `total` frames.
    pub fn new(total: u64, every: u64) -> Self {
        Self { total, every, started: Instant::now() }
    }

    /// Report `done` frames produced; returns a snapshot on reporting ticks.
    pub fn tick(&self, done: u64) -> Option<Progress> {
        if self.every == 0 {
            return None;
        }
        if done == self.total || done.is_multiple_of(self.every) {
            Some(Progress::compute(done, self.total, self.started.elapsed().as_secs_f64()))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compute_derives_rate_percent_and_eta() {
        let p = Progress::compute(50, 100, 2.0);
        assert_eq!(p.effective_fps, 25.0);
        assert_eq!(p.percent, 50.0);
        assert_eq!(p.eta_secs, 2.0);
    }

    #[test]
    fn compute_handles_zero_elapsed_and_zero_total() {
        let p = Progress::compute(0, 0, 0.0);
        assert_eq!(p.effective_fps, 0.0);
        assert_eq!(p.percent, 100.0);
        assert_eq!(p.eta_secs, 0.0);
    }

    #[test]
    fn reporter_ticks_on_multiples_and_at_completion() {
        let r = ProgressReporter::new(10, 4);
        let ticks: Vec<u64> = (1..=10).filter(|&d| r.tick(d).is_some()).collect();
        assert_eq!(ticks, [4, 8, 10]);
    }

    #[test]
    fn zero_interval_never_reports() {
        let r = ProgressReporter::new(10, 0);
        assert!((1..=10).all(|d| r.tick(d).is_none()));
    }
}
