use loginguard_core::intro::{timeline, IntroGate, IntroStage};
use loginguard_core::KeyValueStore;

/// Play the intro if this session has not seen it yet.
///
/// Returns whether it played. Phases are delivered to `stage` at their
/// timeline offsets.
pub async fn play_intro<S: KeyValueStore>(gate: &mut IntroGate<S>, stage: &mut dyn IntroStage) -> bool {
    if !gate.claim() {
        tracing::debug!("intro already shown this session");
        return false;
    }

    let start = tokio::time::Instant::now();
    for (offset, phase) in timeline() {
        tokio::time::sleep_until(start + offset).await;
        tracing::trace!(?phase, "intro phase");
        stage.enter(phase);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use loginguard_core::intro::IntroPhase;
    use loginguard_core::MemoryStore;
    use std::time::Duration;
    use tokio::time::Instant;

    #[derive(Default)]
    struct Recorded(Vec<(Duration, IntroPhase)>, Option<Instant>);

    impl IntroStage for Recorded {
        fn enter(&mut self, phase: IntroPhase) {
            let start = *self.1.get_or_insert_with(Instant::now);
            self.0.push((start.elapsed(), phase));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_plays_once_with_timing() {
        let session = MemoryStore::new();
        let mut gate = IntroGate::new(session.clone());
        let mut stage = Recorded::default();

        assert!(play_intro(&mut gate, &mut stage).await);
        assert_eq!(
            stage.0,
            vec![
                (Duration::ZERO, IntroPhase::Entering),
                (Duration::from_millis(1200), IntroPhase::Exiting),
                (Duration::from_millis(1500), IntroPhase::Removed),
            ]
        );

        let mut again = IntroGate::new(session);
        let mut stage = Recorded::default();
        assert!(!play_intro(&mut again, &mut stage).await);
        assert!(stage.0.is_empty());
    }
}
