use std::time::Duration;

/// Upper bound shown next to the failure count.
pub const MAX_ATTEMPTS_DISPLAY: u32 = 5;

/// Display surface the throttle updates as it changes state.
///
/// Implementations must tolerate missing targets (a page without a
/// countdown element, say) by skipping that update.
pub trait Presenter {
    /// Disable the form and show the countdown.
    fn show_locked(&mut self, remaining: Duration);
    /// Re-enable the form and hide the countdown.
    fn show_unlocked(&mut self);
    fn show_warning(&mut self, attempts: u32);
    fn hide_warning(&mut self);
}

/// A page with none of the display targets.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn show_locked(&mut self, _remaining: Duration) {}
    fn show_unlocked(&mut self) {}
    fn show_warning(&mut self, _attempts: u32) {}
    fn hide_warning(&mut self) {}
}

/// `M:SS` with zero-padded seconds.
pub fn format_countdown(remaining_secs: u64) -> String {
    format!("{}:{:02}", remaining_secs / 60, remaining_secs % 60)
}

pub fn countdown_label(remaining_secs: u64) -> String {
    format!("잠금 해제까지: {}", format_countdown(remaining_secs))
}

pub fn warning_label(attempts: u32) -> String {
    format!("로그인 실패: {attempts}회 (최대 {MAX_ATTEMPTS_DISPLAY}회)")
}

/// Whole seconds left, rounded up so a 59.2 s remainder reads as 1:00.
pub fn ceil_secs(remaining: Duration) -> u64 {
    let millis = remaining.as_millis() as u64;
    millis.div_ceil(1000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_countdown_pads_seconds() {
        assert_eq!(format_countdown(300), "5:00");
        assert_eq!(format_countdown(65), "1:05");
        assert_eq!(format_countdown(9), "0:09");
        assert_eq!(format_countdown(0), "0:00");
    }

    #[test]
    fn test_labels() {
        assert_eq!(countdown_label(61), "잠금 해제까지: 1:01");
        assert_eq!(warning_label(3), "로그인 실패: 3회 (최대 5회)");
    }

    #[test]
    fn test_ceil_secs() {
        assert_eq!(ceil_secs(Duration::from_millis(59_200)), 60);
        assert_eq!(ceil_secs(Duration::from_millis(60_000)), 60);
        assert_eq!(ceil_secs(Duration::from_millis(1)), 1);
        assert_eq!(ceil_secs(Duration::ZERO), 0);
    }
}
