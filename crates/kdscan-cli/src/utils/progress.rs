use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use kdscan::engine::progress::{Progress, ProgressCallback, SweepTally, TrialStatus};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

const SPINNER_TICK_MS: u64 = 80;

/// Renders sweep progress events as a spinner per stage and a bar per Kd sweep.
#[derive(Clone)]
pub struct CliProgressHandler {
    pb: Arc<Mutex<ProgressBar>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        Self::with_draw_target(ProgressDrawTarget::stderr())
    }

    /// A handler that tracks state without drawing, for quiet runs.
    pub fn hidden() -> Self {
        Self::with_draw_target(ProgressDrawTarget::hidden())
    }

    fn with_draw_target(target: ProgressDrawTarget) -> Self {
        let pb = ProgressBar::new(0)
            .with_style(Self::spinner_style())
            .with_message("Initializing...");
        pb.set_draw_target(target);
        pb.disable_steady_tick();
        pb.finish_and_clear();

        Self {
            pb: Arc::new(Mutex::new(pb)),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let pb_clone = self.pb.clone();

        Box::new(move |progress: Progress| {
            let Ok(pb_guard) = pb_clone.lock() else {
                warn!("Progress bar mutex was poisoned. Cannot update progress.");
                return;
            };

            match progress {
                Progress::StageStart { name } => {
                    pb_guard.reset();
                    pb_guard.set_length(0);
                    pb_guard.set_style(Self::spinner_style());
                    pb_guard.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                    pb_guard.set_message(name);
                }
                Progress::StageFinish => {
                    pb_guard.disable_steady_tick();
                    pb_guard.finish_with_message("✓ Done");
                }
                Progress::SweepStart { label, trials } => {
                    pb_guard.disable_steady_tick();
                    pb_guard.reset();
                    pb_guard.set_length(trials);
                    pb_guard.set_position(0);
                    pb_guard.set_style(Self::bar_style());
                    pb_guard.set_message(label);
                }
                Progress::TrialFinished(status) => {
                    if matches!(status, TrialStatus::Dropped | TrialStatus::FitFailed) {
                        debug!(?status, "Kd trial produced no chi-squared.");
                    }
                    pb_guard.inc(1);
                }
                Progress::SweepFinish { label, tally } => {
                    let length = pb_guard.length().unwrap_or(0);
                    if pb_guard.position() < length {
                        pb_guard.set_position(length);
                    }
                    pb_guard.finish_with_message(Self::summary(&label, &tally));
                }
            }
        })
    }

    /// One-line outcome of a concentration's Kd sweep.
    fn summary(label: &str, tally: &SweepTally) -> String {
        let mut text = format!("{}: {}/{} scored", label, tally.scored, tally.total());
        if tally.fit_failed > 0 {
            text.push_str(&format!(", {} fit failures", tally.fit_failed));
        }
        if tally.dropped > 0 {
            text.push_str(&format!(", {} unphysical", tally.dropped));
        }
        if tally.skipped > 0 {
            text.push_str(&format!(", {} cancelled", tally.skipped));
        }
        if tally.errored > 0 {
            text.push_str(&format!(", {} errors", tally.errored));
        }
        text
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template("{msg:<24} [{bar:40.cyan/blue}] {pos}/{len} Kd ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .with_key(
                "eta",
                |state: &ProgressState, w: &mut dyn std::fmt::Write| {
                    let _ = write!(w, "{:.1}s", state.eta().as_secs_f64());
                },
            )
            .progress_chars("##-")
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}
