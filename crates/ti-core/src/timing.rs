//! Lightweight performance timing utilities.
//!
//! This module provides simple timing infrastructure for measuring
//! where runtime is being spent. Can be enabled/disabled via environment
//! variable or programmatically.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

static ENABLED: AtomicBool = AtomicBool::new(false);

/// Enable performance timing globally.
pub fn enable_timing() {
    ENABLED.store(true, Ordering::Relaxed);
}

/// Disable performance timing globally.
pub fn disable_timing() {
    ENABLED.store(false, Ordering::Relaxed);
}

/// Check if timing is enabled.
pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed) || std::env::var("TI_TIMING").is_ok()
}

/// A simple timer that measures elapsed time.
pub struct Timer {
    label: &'static str,
    start: Instant,
    enabled: bool,
}

impl Timer {
    /// Create and start a new timer with the given label.
    pub fn start(label: &'static str) -> Self {
        Self {
            label,
            start: Instant::now(),
            enabled: is_enabled(),
        }
    }

    /// Stop the timer and return elapsed time in seconds.
    /// If timing is disabled, returns None.
    pub fn stop(self) -> Option<f64> {
        if self.enabled {
            Some(self.start.elapsed().as_secs_f64())
        } else {
            None
        }
    }

    /// Stop the timer and add the elapsed time to `acc` if enabled.
    pub fn stop_into(self, acc: &AccumulatingTimer) {
        if let Some(elapsed) = self.stop() {
            acc.record(elapsed);
        }
    }

    /// Stop the timer and print the result if enabled.
    pub fn stop_and_print(self) {
        let label = self.label;
        if let Some(elapsed) = self.stop() {
            println!("[TIMING] {}: {:.3}s", label, elapsed);
        }
    }
}

/// Accumulating timer for tracking total time across multiple calls.
pub struct AccumulatingTimer {
    total_ns: AtomicU64,
    count: AtomicU64,
}

impl Default for AccumulatingTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl AccumulatingTimer {
    /// Create a new accumulating timer.
    pub const fn new() -> Self {
        Self {
            total_ns: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Record a timing measurement.
    pub fn record(&self, duration_s: f64) {
        let nanos = (duration_s * 1e9) as u64;
        self.total_ns.fetch_add(nanos, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total time spent (in seconds).
    pub fn total_seconds(&self) -> f64 {
        self.total_ns.load(Ordering::Relaxed) as f64 / 1e9
    }

    /// Get number of calls.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Get average time per call (in seconds).
    pub fn average_seconds(&self) -> f64 {
        let count = self.count();
        if count > 0 {
            self.total_seconds() / count as f64
        } else {
            0.0
        }
    }

    /// Reset the timer.
    pub fn reset(&self) {
        self.total_ns.store(0, Ordering::Relaxed);
        self.count.store(0, Ordering::Relaxed);
    }
}

/// Per-stage timers for the QCQP reduction pipeline.
pub mod solver_timing {
    use super::AccumulatingTimer;

    /// Translation to the minimum-norm feasible point
    pub static TRANSLATE: AccumulatingTimer = AccumulatingTimer::new();
    /// Null-space basis construction and rotation
    pub static KERNEL: AccumulatingTimer = AccumulatingTimer::new();
    /// Thermal eigendecomposition and scaling
    pub static DIAGONALIZE: AccumulatingTimer = AccumulatingTimer::new();
    /// Schur reduction of the objective
    pub static SCHUR: AccumulatingTimer = AccumulatingTimer::new();
    /// Secular root bracketing and bisection
    pub static SECULAR: AccumulatingTimer = AccumulatingTimer::new();
    /// Candidate reconstruction and selection
    pub static BACKMAP: AccumulatingTimer = AccumulatingTimer::new();

    fn all() -> [(&'static str, &'static AccumulatingTimer); 6] {
        [
            ("translate", &TRANSLATE),
            ("kernel", &KERNEL),
            ("diagonalize", &DIAGONALIZE),
            ("schur", &SCHUR),
            ("secular", &SECULAR),
            ("backmap", &BACKMAP),
        ]
    }

    /// Reset all solver stage timers.
    pub fn reset_all() {
        for (_, timer) in all() {
            timer.reset();
        }
    }

    /// Print solver stage breakdown.
    pub fn print_summary() {
        use super::is_enabled;
        if !is_enabled() {
            return;
        }

        println!("\n=== Solver Stage Breakdown ===");
        let mut total = 0.0;
        for (label, timer) in all() {
            let count = timer.count();
            if count > 0 {
                println!(
                    "{:<14} {} calls, {:.3}s total, {:.4}ms avg",
                    format!("{label}:"),
                    count,
                    timer.total_seconds(),
                    timer.average_seconds() * 1000.0
                );
                total += timer.total_seconds();
            }
        }
        if total > 0.0 {
            println!("TOTAL stages:  {:.3}s", total);
        }
        println!("==============================\n");
    }
}

/// Performance statistics collector.
#[derive(Debug, Clone, Default)]
pub struct PerfStats {
    pub load_time_s: f64,
    pub assemble_time_s: f64,
    pub analysis_time_s: f64,
    pub lines_solved: usize,
    pub save_time_s: f64,
}

impl PerfStats {
    /// Print a formatted summary of the statistics.
    pub fn print_summary(&self) {
        if !is_enabled() {
            return;
        }

        println!("\n=== Performance Summary ===");

        if self.load_time_s > 0.0 {
            println!("Case load time:      {:.3}s", self.load_time_s);
        }

        if self.assemble_time_s > 0.0 {
            println!("Assembly time:       {:.3}s", self.assemble_time_s);
        }

        if self.analysis_time_s > 0.0 {
            println!("Analysis total:      {:.3}s", self.analysis_time_s);
            if self.lines_solved > 0 {
                println!("  Lines:             {}", self.lines_solved);
                println!(
                    "  Avg line time:     {:.4}s",
                    self.analysis_time_s / self.lines_solved as f64
                );
            }
        }

        if self.save_time_s > 0.0 {
            println!("Run save time:       {:.3}s", self.save_time_s);
        }

        println!("==========================\n");

        solver_timing::print_summary();
    }
}
