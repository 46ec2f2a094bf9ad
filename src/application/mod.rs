//! Application layer — port trait definitions and resolution services.
//!
//! This module depends only on `crate::domain` — never on `crate::infra`
//! or `crate::context`.

pub mod ports;
pub mod promise;
pub mod services;

#[allow(unused_imports)]
pub use ports::{
    CommandRunner, CommandSpec, ConfigStore, IdentitySource, PassphraseLoader, ProjectSource,
    SessionLoader, StackProject,
};
#[allow(unused_imports)]
pub use promise::Promise;
