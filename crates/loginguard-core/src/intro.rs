//! One-time intro sequence: played at most once per browsing session.

use std::time::Duration;

use crate::storage::KeyValueStore;

/// Session storage key marking the intro as already shown.
pub const INTRO_SHOWN_KEY: &str = "intro_animation_shown";

/// Time the overlay stays up before it starts to leave.
pub const HOLD: Duration = Duration::from_millis(1200);
/// Fade-out before the overlay is removed.
pub const FADE_OUT: Duration = Duration::from_millis(300);

/// Number of data-flow lines drawn across the overlay.
pub const FLOW_LINES: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntroPhase {
    /// Overlay mounted, page content blurred.
    Entering,
    /// Overlay fading, blur lifted.
    Exiting,
    /// Overlay gone.
    Removed,
}

/// Sink for phase changes (a DOM overlay, a terminal banner, ...).
pub trait IntroStage {
    fn enter(&mut self, phase: IntroPhase);
}

/// Phases with their offsets from the start of the sequence.
pub fn timeline() -> [(Duration, IntroPhase); 3] {
    [
        (Duration::ZERO, IntroPhase::Entering),
        (HOLD, IntroPhase::Exiting),
        (HOLD + FADE_OUT, IntroPhase::Removed),
    ]
}

/// Vertical position of each flow line, in percent from the top.
pub fn flow_line_offsets() -> [u32; FLOW_LINES] {
    std::array::from_fn(|i| 20 + 15 * i as u32)
}

/// Decides whether this session still gets the intro.
pub struct IntroGate<S: KeyValueStore> {
    session: S,
}

impl<S: KeyValueStore> IntroGate<S> {
    pub fn new(session: S) -> Self {
        Self { session }
    }

    /// True exactly once per session; the first caller marks it shown.
    ///
    /// If session storage cannot be read the intro is skipped rather than
    /// risk replaying it on every page.
    pub fn claim(&mut self) -> bool {
        match self.session.get(INTRO_SHOWN_KEY) {
            Ok(Some(_)) => false,
            Ok(None) => {
                if let Err(e) = self.session.set(INTRO_SHOWN_KEY, "true") {
                    tracing::warn!(error = %e, "could not mark intro as shown");
                }
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "session storage unreadable; skipping intro");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_claim_once_per_session() {
        let session = MemoryStore::new();
        let mut gate = IntroGate::new(session.clone());
        assert!(gate.claim());
        assert!(!gate.claim());

        // A new page load in the same session.
        let mut again = IntroGate::new(session.clone());
        assert!(!again.claim());
        assert_eq!(
            session.get(INTRO_SHOWN_KEY).unwrap().as_deref(),
            Some("true")
        );

        // A fresh session.
        assert!(IntroGate::new(MemoryStore::new()).claim());
    }

    #[test]
    fn test_timeline_offsets() {
        let t = timeline();
        assert_eq!(t[1], (Duration::from_millis(1200), IntroPhase::Exiting));
        assert_eq!(t[2], (Duration::from_millis(1500), IntroPhase::Removed));
    }

    #[test]
    fn test_flow_lines() {
        assert_eq!(flow_line_offsets(), [20, 35, 50, 65, 80, 95]);
    }
}
