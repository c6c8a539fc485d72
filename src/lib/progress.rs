//! Progress indicator for the per-pod metrics walk

use indicatif::{ProgressBar, ProgressStyle};

/// Ticks once per pod processed. Draws to stderr and never touches the
/// report written to stdout.
pub struct PodProgress {
    pb: ProgressBar,
}

impl PodProgress {
    pub fn new(visible: bool) -> Self {
        if !visible {
            return Self::hidden();
        }

        let pb = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {pos}/{len}")
        {
            pb.set_style(style.progress_chars("█▓▒░ "));
        }
        Self { pb }
    }

    pub fn hidden() -> Self {
        Self {
            pb: ProgressBar::hidden(),
        }
    }

    pub fn start(&self, pods: u64) {
        self.pb.set_length(pods);
        self.pb.set_position(0);
    }

    pub fn tick(&self, pod: &str) {
        self.pb.set_message(pod.to_string());
        self.pb.inc(1);
    }

    /// Run `f` with the bar cleared so log lines are not overdrawn
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        self.pb.suspend(f)
    }

    pub fn position(&self) -> u64 {
        self.pb.position()
    }

    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_progress_still_counts() {
        let progress = PodProgress::hidden();
        progress.start(3);
        progress.tick("a");
        progress.tick("b");
        assert_eq!(progress.position(), 2);
        progress.finish();
    }
}
