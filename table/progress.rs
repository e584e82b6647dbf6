use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::sync::Mutex;

/// Stages that report incremental progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProgressStage {
    Records,
    Files,
    Rows,
}

impl ProgressStage {
    pub fn describe(self) -> &'static str {
        match self {
            Self::Records => "Processing records",
            Self::Files => "Processing VCF files",
            Self::Rows => "Writing rows",
        }
    }
}

impl fmt::Display for ProgressStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Observer for reporting progress. Called from worker threads, hence `Sync`.
pub trait ProgressObserver: Sync {
    fn on_stage_start(&self, stage: ProgressStage, total: usize) {
        let _ = (stage, total);
    }
    fn on_stage_advance(&self, stage: ProgressStage, processed: usize) {
        let _ = (stage, processed);
    }
    fn on_stage_finish(&self, stage: ProgressStage) {
        let _ = stage;
    }
}

#[derive(Default)]
pub struct NoopProgress;

impl ProgressObserver for NoopProgress {}

/// Draws one terminal progress bar per stage on stderr.
#[derive(Default)]
pub struct ConsoleProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn current(&self) -> Option<ProgressBar> {
        self.bar.lock().ok().and_then(|guard| guard.clone())
    }
}

impl ProgressObserver for ConsoleProgress {
    fn on_stage_start(&self, stage: ProgressStage, total: usize) {
        let style = ProgressStyle::with_template(
            "> {msg:<22} [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ");
        let bar = ProgressBar::new(total as u64);
        bar.set_style(style);
        bar.set_message(stage.describe());
        if let Ok(mut guard) = self.bar.lock() {
            *guard = Some(bar);
        }
    }

    fn on_stage_advance(&self, _stage: ProgressStage, processed: usize) {
        if let Some(bar) = self.current() {
            bar.inc(processed as u64);
        }
    }

    fn on_stage_finish(&self, _stage: ProgressStage) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(bar) = guard.take() {
                bar.finish();
            }
        }
    }
}

/// Picks the console observer when `show` is set, the silent one otherwise.
pub fn observer(show: bool) -> Box<dyn ProgressObserver> {
    if show {
        Box::new(ConsoleProgress::new())
    } else {
        Box::new(NoopProgress)
    }
}
