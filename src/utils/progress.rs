use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner that counts records as a stream is consumed
///
/// A silent reporter does nothing, so callers never branch on `--quiet`.
pub struct ProgressReporter {
    progress_bar: Option<ProgressBar>,
}

impl ProgressReporter {
    pub fn new_spinner(message: &str, silent: bool) -> Self {
        if silent {
            return Self::silent();
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} [{elapsed_precise}] {human_pos} records ({per_sec})")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self {
            progress_bar: Some(pb),
        }
    }

    pub fn silent() -> Self {
        Self { progress_bar: None }
    }

    pub fn increment(&self, delta: u64) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(delta);
        }
    }

    pub fn finish_with_message(&self, message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_with_message(message.to_string());
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if let Some(ref pb) = self.progress_bar {
            if !pb.is_finished() {
                pb.finish_and_clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_reporter_has_no_bar() {
        let progress = ProgressReporter::new_spinner("Reading", true);
        progress.increment(10);
        progress.finish_with_message("done");
        assert!(progress.progress_bar.is_none());
    }

    #[test]
    fn test_spinner_counts_records() {
        let progress = ProgressReporter::new_spinner("Reading", false);
        progress.increment(3);
        progress.increment(4);
        let position = progress.progress_bar.as_ref().map(|pb| pb.position());
        assert_eq!(position, Some(7));
        progress.finish_with_message("done");
    }
}
