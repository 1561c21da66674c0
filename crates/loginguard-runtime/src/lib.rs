//! loginguard-runtime: concrete hosts for the core seams.
//!
//! - [`SqliteStore`]: durable, namespaced key-value storage
//! - [`TokioScheduler`] and [`run_countdown`]: repeating timers on tokio
//! - [`Config`]: TOML file plus `LOGINGUARD_*` environment overrides
//! - [`NavClient`]: sibling-service discovery over HTTP
//! - [`play_intro`]: walks the intro timeline

pub mod config;
pub mod intro;
pub mod nav_client;
pub mod store;
pub mod timer;

pub use config::{Config, ConfigError};
pub use intro::play_intro;
pub use nav_client::{NavClient, NavError};
pub use store::{SqliteStore, StoreError, LOCAL_NAMESPACE};
pub use timer::{run_countdown, TokioScheduler};
