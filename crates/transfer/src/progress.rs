use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const DEFAULT_WINDOW: Duration = Duration::from_secs(10);
const DEFAULT_CAPACITY: usize = 100;

/// Transfer rate over a sliding time window.
///
/// Each observation stores the running byte total, so the rate is the
/// difference between the newest and oldest points in the window divided
/// by the time between them. Observations arrive when a part finishes;
/// the window should span several part durations to give a stable figure.
pub struct SpeedCalculator {
    window: Duration,
    capacity: usize,
    state: Mutex<Window>,
}

#[derive(Default)]
struct Window {
    total: u64,
    points: VecDeque<(Instant, u64)>,
}

impl Default for SpeedCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW, DEFAULT_CAPACITY)
    }
}

impl SpeedCalculator {
    /// A calculator looking back `window`, keeping at most `capacity`
    /// observations (never fewer than two).
    pub fn new(window: Duration, capacity: usize) -> Self {
        Self {
            window,
            capacity: capacity.max(2),
            state: Mutex::new(Window::default()),
        }
    }

    /// Records `bytes` completed just now.
    pub fn record(&self, bytes: u64) {
        self.record_at(bytes, Instant::now());
    }

    fn record_at(&self, bytes: u64, at: Instant) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.total = state.total.saturating_add(bytes);
        let total = state.total;
        state.points.push_back((at, total));

        while state.points.len() > self.capacity {
            state.points.pop_front();
        }
        while let Some(&(oldest, _)) = state.points.front() {
            if at.saturating_duration_since(oldest) <= self.window {
                break;
            }
            state.points.pop_front();
        }
    }

    /// Bytes per second across the window, or 0.0 without two distinct
    /// observation times.
    pub fn rate(&self) -> f64 {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let (Some(&(t0, b0)), Some(&(t1, b1))) = (state.points.front(), state.points.back())
        else {
            return 0.0;
        };
        let span = t1.saturating_duration_since(t0).as_secs_f64();
        if span == 0.0 {
            return 0.0;
        }
        (b1 - b0) as f64 / span
    }

    /// Time left for `remaining_bytes` at the current rate.
    pub fn eta(&self, remaining_bytes: u64) -> Option<Duration> {
        match self.rate() {
            rate if rate > 0.0 => Some(Duration::from_secs_f64(remaining_bytes as f64 / rate)),
            _ => None,
        }
    }

    /// Forgets every observation, typically when a new file starts.
    pub fn clear(&self) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = Window::default();
    }
}
