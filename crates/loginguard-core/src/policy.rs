use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

/// Failure count at which the short lockout starts.
pub const SHORT_THRESHOLD: u32 = 3;
/// Failure count at which the long lockout starts.
pub const LONG_THRESHOLD: u32 = 5;
pub const SHORT_LOCKOUT: Duration = Duration::from_secs(60);
pub const LONG_LOCKOUT: Duration = Duration::from_secs(300);

/// Maps the consecutive-failure count to a new lockout, if any.
///
/// `active_remaining` is the time left on the lockout in force when the
/// failure was recorded (None while unlocked). Returning `Some` replaces
/// whatever deadline is in force.
pub trait LockoutPolicy {
    fn lockout_for(&self, attempts: u32, active_remaining: Option<Duration>) -> Option<Duration>;
}

/// Re-arms on every failure whose count is 3, 4 or 5, even while locked,
/// overwriting the current deadline. A 4th failure recorded during a
/// 5-minute lockout would therefore shorten it to 1 minute.
#[derive(Debug, Default, Clone, Copy)]
pub struct RearmPolicy;

impl LockoutPolicy for RearmPolicy {
    fn lockout_for(&self, attempts: u32, _active_remaining: Option<Duration>) -> Option<Duration> {
        match attempts {
            LONG_THRESHOLD => Some(LONG_LOCKOUT),
            n if (SHORT_THRESHOLD..LONG_THRESHOLD).contains(&n) => Some(SHORT_LOCKOUT),
            _ => None,
        }
    }
}

/// Arms only on the edge into a threshold (count reaching exactly 3 or 5)
/// and never replaces an active lockout with a shorter one.
#[derive(Debug, Default, Clone, Copy)]
pub struct EdgePolicy;

impl LockoutPolicy for EdgePolicy {
    fn lockout_for(&self, attempts: u32, active_remaining: Option<Duration>) -> Option<Duration> {
        let duration = match attempts {
            SHORT_THRESHOLD => SHORT_LOCKOUT,
            LONG_THRESHOLD => LONG_LOCKOUT,
            _ => return None,
        };
        match active_remaining {
            Some(remaining) if remaining >= duration => None,
            _ => Some(duration),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    #[default]
    Rearm,
    Edge,
}

impl PolicyKind {
    pub fn build(self) -> Box<dyn LockoutPolicy> {
        match self {
            PolicyKind::Rearm => Box::new(RearmPolicy),
            PolicyKind::Edge => Box::new(EdgePolicy),
        }
    }
}

impl FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rearm" => Ok(PolicyKind::Rearm),
            "edge" => Ok(PolicyKind::Edge),
            other => Err(format!("unknown lockout policy '{other}' (expected rearm|edge)")),
        }
    }
}
