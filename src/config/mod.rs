//! Configuration management for logtally
//!
//! Settings are layered with figment. The embedded `default-config.toml` is the
//! base; user config, repository config, an explicit `--config` file,
//! `LOGTALLY_*` environment variables and command-line flags are merged on top
//! in that order. Consumers pull typed sections out with
//! [`LogtallyConfig::section`].

mod core;
mod formats;

pub use self::core::LogtallyConfig;
pub use formats::ConfigFormat;
