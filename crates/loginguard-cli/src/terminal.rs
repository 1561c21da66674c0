//! Terminal renditions of the page's display targets.

use std::time::Duration;

use loginguard_core::intro::{flow_line_offsets, IntroPhase, IntroStage};
use loginguard_core::presenter::{countdown_label, warning_label};
use loginguard_core::{Notice, Notifier, Presenter};

/// Prints display changes to stdout. With `quiet`, countdown updates after
/// the first are suppressed so one-shot commands stay readable.
pub struct TerminalPresenter {
    quiet: bool,
    countdown_shown: bool,
}

impl TerminalPresenter {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            countdown_shown: false,
        }
    }
}

impl Presenter for TerminalPresenter {
    fn show_locked(&mut self, remaining: Duration) {
        if self.quiet && self.countdown_shown {
            return;
        }
        self.countdown_shown = true;
        println!("[locked] {}", countdown_label(remaining.as_secs()));
    }

    fn show_unlocked(&mut self) {
        self.countdown_shown = false;
        println!("[unlocked] login form enabled");
    }

    fn show_warning(&mut self, attempts: u32) {
        println!("[warning] {}", warning_label(attempts));
    }

    fn hide_warning(&mut self) {}
}

/// Blocking notices go to stderr.
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&mut self, notice: &Notice) {
        eprintln!("(!) {}", notice.message());
    }
}

pub struct TerminalStage;

impl IntroStage for TerminalStage {
    fn enter(&mut self, phase: IntroPhase) {
        match phase {
            IntroPhase::Entering => {
                println!("  TELCOWARE");
                for offset in flow_line_offsets() {
                    let width = (offset / 5) as usize;
                    println!("  {}>", "-".repeat(width));
                }
            }
            IntroPhase::Exiting => println!("  ..."),
            IntroPhase::Removed => println!(),
        }
    }
}
