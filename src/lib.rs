//! Deployment context and credential resolution for Pulumi-backed cloud
//! infrastructure.
//!
//! The crate centers on [`DeployContext`], one per process/run: it snapshots
//! the environment, caches AWS sessions and their identities per
//! (account, region), resolves secrets passphrases through cascading scope
//! defaults, and fetches the outputs of already-deployed stacks — either
//! synchronously or as [`Promise`]s composable with a deferred-evaluation
//! host.
//!
//! ```no_run
//! use stratus::{DeployContext, PassphraseScope};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let ctx = DeployContext::new()?;
//! let session = ctx.session(None, Some("us-east-1")).await?;
//! let account = ctx.account_id(&session).await?;
//! let passphrase = ctx
//!     .passphrase(&PassphraseScope::for_backend("https://api.pulumi.com"), None)
//!     .await?;
//! let outputs = ctx.stack_outputs(Some("aws-env"), Some("dev"), false)?;
//! let vpc_id = outputs.require("vpc_id").get().await?;
//! # let _ = (account, passphrase, vpc_id);
//! # Ok(())
//! # }
//! ```

#![cfg_attr(test, allow(clippy::expect_used))]

pub mod application;
pub mod context;
pub mod domain;
pub mod infra;

pub use application::ports;
pub use application::promise::Promise;
pub use application::services::outputs::{StackOutputs, fetch_stack_outputs};
pub use application::services::passphrase::PassphraseResolver;
pub use application::services::sessions::SessionRegistry;
pub use context::{ContextBuilder, DeployContext};
pub use domain::config::ContextConfig;
pub use domain::error::{OutputError, PassphraseError, SessionError, ToolError};
pub use domain::identity::AwsIdentity;
pub use domain::outputs::{OutputMap, SyncStackOutputs};
pub use domain::scope::PassphraseScope;
pub use domain::session::{AwsSession, SessionKey};
