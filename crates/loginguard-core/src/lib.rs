//! loginguard-core: client-side login-attempt throttling and the small
//! page behaviours that ship alongside it.
//!
//! The centre of the crate is [`LoginThrottle`], a state machine that counts
//! consecutive failed logins and enforces a temporary lockout window that
//! survives page reloads through durable key-value storage. Everything it
//! touches outside itself goes through a seam so the machine can be driven
//! deterministically in tests:
//!
//! - [`KeyValueStore`]: origin-scoped durable storage
//! - [`Clock`]: epoch milliseconds
//! - [`Scheduler`]: repeating countdown timers
//! - [`Presenter`] / [`Notifier`]: display updates and blocking notices
//! - [`LockoutPolicy`]: failure count to lockout duration
//!
//! This is advisory UI only: clearing client storage defeats it.

pub mod clock;
pub mod form;
pub mod intro;
pub mod nav;
pub mod notice;
pub mod password;
pub mod policy;
pub mod presenter;
pub mod scheduler;
pub mod storage;
pub mod throttle;

pub use clock::{Clock, ManualClock, SystemClock};
pub use form::{AuthOutcome, Credentials, LoginForm, SubmitEvent, SubmitOutcome};
pub use notice::{LogNotifier, Notice, Notifier};
pub use policy::{EdgePolicy, LockoutPolicy, PolicyKind, RearmPolicy};
pub use presenter::{NullPresenter, Presenter};
pub use scheduler::{ManualScheduler, Scheduler, TimerId};
pub use storage::{KeyValueStore, MemoryStore, StorageError};
pub use throttle::{LockState, LoginThrottle, ATTEMPTS_KEY, LOCKOUT_KEY};
