//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Time (input cadence is measured in wall-clock milliseconds)

use std::cell::Cell;
use std::rc::Rc;

/// Millisecond clock used to measure the interval between inputs
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Monotonic native clock
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: std::time::Instant,
}

#[cfg(not(target_arch = "wasm32"))]
impl Default for SystemClock {
    fn default() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// `performance.now()` when available, `Date.now()` otherwise
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserClock;

#[cfg(target_arch = "wasm32")]
impl Clock for BrowserClock {
    fn now_ms(&self) -> f64 {
        web_sys::window()
            .and_then(|w| w.performance())
            .map(|p| p.now())
            .unwrap_or_else(js_sys::Date::now)
    }
}

/// Hand-advanced clock for tests and headless runs. Clones share the time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: f64) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

/// Default clock for the current target
#[cfg(not(target_arch = "wasm32"))]
pub fn default_clock() -> Box<dyn Clock> {
    Box::new(SystemClock::default())
}

#[cfg(target_arch = "wasm32")]
pub fn default_clock() -> Box<dyn Clock> {
    Box::new(BrowserClock)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared() {
        let clock = ManualClock::new(100.0);
        let handle = clock.clone();
        handle.advance(16.5);
        assert_eq!(clock.now_ms(), 116.5);
        handle.set(0.0);
        assert_eq!(clock.now_ms(), 0.0);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_system_clock_monotonic() {
        let clock = SystemClock::default();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
    }
}
