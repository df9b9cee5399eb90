use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Frames between two printed profiling reports.
pub const REPORT_INTERVAL: usize = 120;

/// Cumulative time and call count for one named section.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SectionTiming {
    pub total: Duration,
    pub calls: u32,
}

impl SectionTiming {
    pub fn mean(&self) -> Duration {
        if self.calls == 0 {
            Duration::ZERO
        } else {
            self.total / self.calls
        }
    }
}

/// Simple scoped profiler recording cumulative time per section.
#[derive(Default)]
pub struct Profiler {
    pub timings: HashMap<&'static str, SectionTiming>,
}

impl Profiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, name: &'static str, elapsed: Duration) {
        let entry = self.timings.entry(name).or_default();
        entry.total += elapsed;
        entry.calls += 1;
    }

    pub fn finish(&mut self, guard: &ProfilerGuard) {
        self.record(guard.name, guard.start.elapsed());
    }

    /// Sections ordered by total time, slowest first.
    pub fn report_sorted(&self) -> Vec<(&'static str, SectionTiming)> {
        let mut v: Vec<_> = self.timings.iter().map(|(n, t)| (*n, *t)).collect();
        v.sort_by(|a, b| b.1.total.cmp(&a.1.total).then(a.0.cmp(b.0)));
        v
    }

    pub fn clear(&mut self) {
        self.timings.clear();
    }

    pub fn print_and_clear(&mut self) {
        for (name, t) in self.report_sorted() {
            println!("{:<20} {:>12?} {:>8} calls  {:>10?} avg", name, t.total, t.calls, t.mean());
        }
        self.clear();
    }

    /// Print and reset once every `REPORT_INTERVAL` frames.
    pub fn print_and_clear_every(&mut self, frame: usize) {
        if frame > 0 && frame % REPORT_INTERVAL == 0 {
            println!("--- profile @ frame {frame} ---");
            self.print_and_clear();
        }
    }
}

pub struct ProfilerGuard {
    name: &'static str,
    start: Instant,
}

/// Start a profiling section. Returns a guard that will update the global
/// profiler when dropped.
pub fn start(name: &'static str) -> ProfilerGuard {
    ProfilerGuard { name, start: Instant::now() }
}

#[cfg(feature = "profiling")]
impl Drop for ProfilerGuard {
    fn drop(&mut self) {
        crate::PROFILER.lock().finish(self);
    }
}

/// Macro helper to profile a scope only when the `profiling` feature is enabled.
#[macro_export]
macro_rules! profile_scope {
    ($name:expr) => {
        #[cfg(feature = "profiling")]
        let _guard = $crate::profiler::start($name);
    };
}
