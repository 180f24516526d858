#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared CLI utilities for the geoscrub toolchain.
//!
//! Provides an `indicatif`-backed [`BuildProgress`] for gazetteer builds,
//! plus [`init_logger`] which sets up `indicatif-log-bridge` so that
//! `log::info!` and friends are suspended while progress bars redraw.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use geoscrub_gazetteer::BuildProgress;
use indicatif::{ProgressBar, ProgressStyle};

pub use indicatif::MultiProgress;

/// Renders each build phase as its own bar: a spinner while the phase
/// size is unknown, a bar with percentage and ETA otherwise.
pub struct IndicatifProgress {
    multi: MultiProgress,
    current: Mutex<Option<ProgressBar>>,
}

impl IndicatifProgress {
    /// Creates a progress reporter drawing into `multi`.
    #[must_use]
    pub fn build_bars(multi: &MultiProgress) -> Arc<dyn BuildProgress> {
        Arc::new(Self {
            multi: multi.clone(),
            current: Mutex::new(None),
        })
    }

    fn spinner(&self, name: &str) -> ProgressBar {
        let bar = self.multi.add(ProgressBar::new_spinner());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg} {pos}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(name.to_string());
        bar
    }

    fn bar(&self, name: &str, total: u64) -> ProgressBar {
        let bar = self.multi.add(ProgressBar::new(total));
        bar.set_style(
            ProgressStyle::with_template(
                "  {msg} {wide_bar:.cyan/dim} {pos}/{len} {percent}% [{eta}]",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
        );
        bar.set_message(name.to_string());
        bar
    }

    fn with_current(&self, f: impl FnOnce(&mut Option<ProgressBar>)) {
        let mut guard = self
            .current
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut guard);
    }
}

impl BuildProgress for IndicatifProgress {
    fn phase(&self, name: &str, total: Option<u64>) {
        let next = match total {
            Some(total) => self.bar(name, total),
            None => self.spinner(name),
        };
        self.with_current(|current| {
            if let Some(previous) = current.replace(next) {
                previous.finish();
            }
        });
    }

    fn inc(&self, delta: u64) {
        self.with_current(|current| {
            if let Some(bar) = current {
                bar.inc(delta);
            }
        });
    }

    fn finish(&self, summary: String) {
        self.with_current(|current| {
            if let Some(bar) = current.take() {
                bar.finish_with_message(summary);
            }
        });
    }
}

/// Initializes the global logger wrapped in `indicatif-log-bridge` so that
/// `log::info!` and friends are suspended while progress bars redraw.
///
/// Returns the [`MultiProgress`] that all progress bars must be added to.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok(); // already set in tests

    log::set_max_level(level);

    multi
}
