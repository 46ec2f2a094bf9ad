//! Infrastructure layer — concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution,
//! filesystem access, configuration persistence, and the CLI-backed stack
//! output source. Imports from `crate::domain` and
//! `crate::application::ports` are allowed; `crate::context` is not.

pub mod aws;
pub mod backend;
pub mod command_runner;
pub mod config;
pub mod fs;
pub mod passphrase;

#[allow(unused_imports)]
pub use aws::{CliIdentitySource, EnvSessionLoader};
#[allow(unused_imports)]
pub use backend::CliStackBackend;
#[allow(unused_imports)]
pub use command_runner::{DEFAULT_CMD_TIMEOUT, TokioCommandRunner};
#[allow(unused_imports)]
pub use config::YamlConfigStore;
#[allow(unused_imports)]
pub use passphrase::EnvPassphraseLoader;
