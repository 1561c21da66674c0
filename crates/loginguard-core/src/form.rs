//! Login form controller: the one owner of a page's [`LoginThrottle`].

use crate::notice::Notice;
use crate::throttle::LoginThrottle;

/// A form submission that can be cancelled before it is sent.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SubmitEvent {
    default_prevented: bool,
}

impl SubmitEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Field values at submit time. `None` means the page has no such field.
#[derive(Debug, Default, Clone, Copy)]
pub struct Credentials<'a> {
    pub userid: Option<&'a str>,
    pub password: Option<&'a str>,
}

impl<'a> Credentials<'a> {
    pub fn new(userid: &'a str, password: &'a str) -> Self {
        Self {
            userid: Some(userid),
            password: Some(password),
        }
    }

    /// False only when both fields exist and either is blank. A page
    /// lacking the fields is not checked.
    pub fn is_complete(&self) -> bool {
        match (self.userid, self.password) {
            (Some(id), Some(pw)) => !id.trim().is_empty() && !pw.trim().is_empty(),
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The request may go out.
    Allowed,
    Locked,
    MissingCredentials,
}

/// Result of the external authentication check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Accepted,
    Rejected,
}

pub struct LoginForm {
    throttle: LoginThrottle,
}

impl LoginForm {
    /// Take ownership of the page's throttle and restore its persisted state.
    pub fn load(mut throttle: LoginThrottle) -> Self {
        throttle.restore();
        Self { throttle }
    }

    /// Run before any network request. Lock state is checked first; the
    /// blank-field check applies only when unlocked.
    pub fn on_submit(&mut self, event: &mut SubmitEvent, credentials: Credentials<'_>) -> SubmitOutcome {
        if !self.throttle.guard_submit(event) {
            return SubmitOutcome::Locked;
        }
        if !credentials.is_complete() {
            event.prevent_default();
            tracing::debug!("submission rejected: blank id or password");
            self.throttle.notify(&Notice::MissingCredentials);
            return SubmitOutcome::MissingCredentials;
        }
        SubmitOutcome::Allowed
    }

    pub fn on_auth_result(&mut self, outcome: AuthOutcome) {
        match outcome {
            AuthOutcome::Accepted => self.throttle.record_success(),
            AuthOutcome::Rejected => self.throttle.record_failure(),
        }
    }

    pub fn throttle(&self) -> &LoginThrottle {
        &self.throttle
    }

    pub fn throttle_mut(&mut self) -> &mut LoginThrottle {
        &mut self.throttle
    }
}
