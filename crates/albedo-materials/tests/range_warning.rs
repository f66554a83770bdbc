//! Integration test: out-of-range queries are reported through `log`.
//!
//! Installs a capturing logger for this test binary and checks that ice and
//! water warn exactly when a query leaves the tabulated range, while dust
//! clamps without a warning.

use std::sync::Mutex;
use std::thread::{self, ThreadId};

use log::{Level, LevelFilter, Log, Metadata, Record};

use albedo_materials::RefractiveIndexEngine;

// ─────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────

/// Keeps every warning together with the thread that emitted it.
struct CaptureLogger {
    warnings: Mutex<Vec<(ThreadId, String)>>,
}

impl Log for CaptureLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Warn
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            if let Ok(mut warnings) = self.warnings.lock() {
                warnings.push((thread::current().id(), record.args().to_string()));
            }
        }
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger {
    warnings: Mutex::new(Vec::new()),
};

fn install_logger() {
    // Only the first call installs; later calls are no-ops.
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Warn);
    }
}

/// Warnings emitted so far by the current thread.
fn warnings() -> Vec<String> {
    let me = thread::current().id();
    LOGGER
        .warnings
        .lock()
        .unwrap()
        .iter()
        .filter(|(id, _)| *id == me)
        .map(|(_, msg)| msg.clone())
        .collect()
}

// ─────────────────────────────────────────────────────────────
// Warnings
// ─────────────────────────────────────────────────────────────

#[test]
fn test_warning_only_outside_tabulated_range() {
    install_logger();
    let engine = RefractiveIndexEngine::embedded();
    engine.warm_up().unwrap();

    let inside = engine.compute_slice(&[0.5, 1.0, 10.0], "water", "um").unwrap();
    assert!(!inside.out_of_range);
    let native = engine.compute_slice(&[], "ice", "um").unwrap();
    assert!(!native.out_of_range);
    assert!(warnings().is_empty(), "unexpected warnings: {:?}", warnings());

    let outside = engine.compute_slice(&[0.5, 1.0e4], "water", "um").unwrap();
    assert!(outside.out_of_range);
    let logged = warnings();
    assert_eq!(logged.len(), 1, "{:?}", logged);
    assert!(logged[0].starts_with("water:"), "{}", logged[0]);
    assert!(logged[0].contains("outside tabulated range"), "{}", logged[0]);

    // One warning per query, however many wavelengths are out of range.
    let snow = engine.compute_slice(&[0.01, 0.02, 1.0e5], "snow", "um").unwrap();
    assert!(snow.out_of_range);
    let logged = warnings();
    assert_eq!(logged.len(), 2, "{:?}", logged);
    assert!(logged[1].starts_with("ice:"), "{}", logged[1]);

    // Dust clamps silently.
    let dust = engine.compute_slice(&[0.05, 20.0], "dust", "um").unwrap();
    assert!(!dust.out_of_range);
    assert_eq!(warnings().len(), 2);
}
