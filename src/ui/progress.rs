use crate::ui::output::stderr_palette;
use indicatif::{HumanDuration, ProgressBar};
use owo_colors::OwoColorize;
use std::time::{Duration, Instant};

/// Spinner shown while waiting on the store. It draws to stderr and is
/// hidden when stderr is not a terminal.
pub struct Spinner {
    pb: ProgressBar,
    started: Instant,
}

impl Spinner {
    pub fn new(message: &str) -> Self {
        let pb = if console::Term::stderr().is_term() {
            let pb = ProgressBar::new_spinner();
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        } else {
            ProgressBar::hidden()
        };
        pb.set_message(message.to_string());
        Self {
            pb,
            started: Instant::now(),
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.pb.is_hidden()
    }

    pub fn finish_with_message(&self, msg: &str) {
        let elapsed = format!("({})", HumanDuration(self.started.elapsed()));
        self.pb
            .finish_with_message(format!("{} {}", msg, elapsed.style(stderr_palette().muted.clone())));
    }

    pub fn finish_and_clear(&self) {
        self.pb.finish_and_clear();
    }
}
