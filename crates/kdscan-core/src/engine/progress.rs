/// How a single Kd trial ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialStatus {
    /// The fit engine returned a chi-squared.
    Scored,
    /// The equilibrium was solved but the fit failed.
    FitFailed,
    /// No physical equilibrium at this Kd.
    Dropped,
    /// Not run because the sweep was cancelled.
    Skipped,
    /// The trial hit an error that aborts the sweep.
    Errored,
}

/// Running totals of one concentration's Kd sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepTally {
    pub scored: usize,
    pub fit_failed: usize,
    pub dropped: usize,
    pub skipped: usize,
    pub errored: usize,
}

impl SweepTally {
    pub fn record(&mut self, status: TrialStatus) {
        match status {
            TrialStatus::Scored => self.scored += 1,
            TrialStatus::FitFailed => self.fit_failed += 1,
            TrialStatus::Dropped => self.dropped += 1,
            TrialStatus::Skipped => self.skipped += 1,
            TrialStatus::Errored => self.errored += 1,
        }
    }

    /// Trials that actually ran.
    pub fn completed(&self) -> usize {
        self.scored + self.fit_failed + self.dropped + self.errored
    }

    pub fn total(&self) -> usize {
        self.completed() + self.skipped
    }
}

impl FromIterator<TrialStatus> for SweepTally {
    fn from_iter<I: IntoIterator<Item = TrialStatus>>(iter: I) -> Self {
        let mut tally = Self::default();
        iter.into_iter().for_each(|status| tally.record(status));
        tally
    }
}

/// Events emitted while a sweep workflow runs.
///
/// Stage events bracket the preparation and analysis steps. Every
/// concentration's Kd sweep emits one `SweepStart`, one `TrialFinished` per
/// grid point and a closing `SweepFinish`, also when the sweep fails.
#[derive(Debug, Clone)]
pub enum Progress {
    StageStart { name: String },
    StageFinish,

    SweepStart { label: String, trials: u64 },
    TrialFinished(TrialStatus),
    SweepFinish { label: String, tally: SweepTally },
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}
