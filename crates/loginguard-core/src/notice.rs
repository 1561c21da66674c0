use std::fmt;
use std::time::Duration;

/// User-visible blocking notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A new lockout was armed by the failure that brought the counter to `attempts`.
    Lockout { attempts: u32, duration: Duration },
    /// A submission was cancelled because the form is locked.
    SubmitBlocked,
    /// A submission was cancelled because the id or password was blank.
    MissingCredentials,
}

impl Notice {
    pub fn message(&self) -> String {
        match self {
            Notice::Lockout { attempts, duration } => format!(
                "로그인 실패가 {attempts}회 누적되어 {}분간 로그인이 제한됩니다.",
                duration.as_secs() / 60
            ),
            Notice::SubmitBlocked => {
                "로그인이 일시적으로 제한되었습니다. 잠시 후 다시 시도해주세요.".to_string()
            }
            Notice::MissingCredentials => "ID와 비밀번호를 모두 입력해주세요.".to_string(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

pub trait Notifier {
    fn notify(&mut self, notice: &Notice);
}

/// Notifier for hosts with no blocking dialog; notices go to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, notice: &Notice) {
        tracing::info!(notice = ?notice, "{}", notice.message());
    }
}
